//! Relay eligibility: which `To` addresses are GitHub reply addresses.

use regex::Regex;
use tracing::debug;

use crate::message::{ParsedMessage, bare_address};

/// Matches `reply+<token>@<relay subdomain>` bare addresses; the token is
/// ASCII letters, digits and underscores.
#[derive(Debug, Clone)]
pub struct RecipientFilter {
    regex: Regex,
}

impl RecipientFilter {
    /// Compile the filter for a relay subdomain.
    pub fn new(reply_subdomain: &str) -> Self {
        let pattern = format!(
            r"^\s*reply\+[A-Za-z0-9_]+@{}\s*$",
            regex::escape(reply_subdomain)
        );
        let regex = Regex::new(&pattern).expect("escaped subdomain is a valid pattern");
        Self { regex }
    }

    /// Does this bare address belong to the relay?
    pub fn is_eligible(&self, address: &str) -> bool {
        self.regex.is_match(address)
    }

    /// Original `To` values whose bare address is eligible, in message order.
    pub fn eligible_recipients(&self, message: &ParsedMessage) -> Vec<String> {
        message
            .header_all("To")
            .filter(|value| {
                let eligible = bare_address(value).is_some_and(|addr| self.is_eligible(&addr));
                debug!(to = %value, eligible, "Classified recipient");
                eligible
            })
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUBDOMAIN: &str = "reply.github.priv.mycompany.net";

    fn filter() -> RecipientFilter {
        RecipientFilter::new(SUBDOMAIN)
    }

    fn message_with_to(to: &[&str]) -> ParsedMessage {
        let mut raw = String::from("From: alice@x.com\r\n");
        for value in to {
            raw.push_str(&format!("To: {value}\r\n"));
        }
        raw.push_str("Date: Mon, 01 Jan 2024 00:00:00 +0000\r\n\r\nbody\r\n");
        ParsedMessage::parse(raw.as_bytes()).unwrap()
    }

    #[test]
    fn reply_address_matches() {
        assert!(filter().is_eligible("reply+abc123@reply.github.priv.mycompany.net"));
        assert!(filter().is_eligible("reply+A_b_9@reply.github.priv.mycompany.net"));
    }

    #[test]
    fn surrounding_whitespace_tolerated() {
        assert!(filter().is_eligible("  reply+abc123@reply.github.priv.mycompany.net \t"));
    }

    #[test]
    fn token_is_required() {
        assert!(!filter().is_eligible("reply+@reply.github.priv.mycompany.net"));
        assert!(!filter().is_eligible("reply@reply.github.priv.mycompany.net"));
    }

    #[test]
    fn token_must_be_word_characters() {
        assert!(!filter().is_eligible("reply+abc-123@reply.github.priv.mycompany.net"));
    }

    #[test]
    fn token_is_ascii_only() {
        assert!(!filter().is_eligible("reply+café@reply.github.priv.mycompany.net"));
        assert!(!filter().is_eligible("reply+токен@reply.github.priv.mycompany.net"));
    }

    #[test]
    fn other_domains_rejected() {
        assert!(!filter().is_eligible("reply+abc123@github.com"));
        assert!(!filter().is_eligible("reply+abc123@reply.github.priv.mycompany.net.evil.com"));
        assert!(!filter().is_eligible("reply+abc123@replyxgithubxprivxmycompanyxnet"));
    }

    #[test]
    fn local_part_must_start_with_reply() {
        assert!(!filter().is_eligible("noreply+abc123@reply.github.priv.mycompany.net"));
    }

    #[test]
    fn matching_is_case_sensitive() {
        assert!(!filter().is_eligible("REPLY+abc123@reply.github.priv.mycompany.net"));
    }

    #[test]
    fn eligible_keeps_original_values_in_order() {
        let msg = message_with_to(&[
            "GitHub <reply+first@reply.github.priv.mycompany.net>",
            "someone-else@other.com",
            "reply+second@reply.github.priv.mycompany.net",
        ]);
        assert_eq!(
            filter().eligible_recipients(&msg),
            vec![
                "GitHub <reply+first@reply.github.priv.mycompany.net>".to_string(),
                "reply+second@reply.github.priv.mycompany.net".to_string(),
            ]
        );
    }

    #[test]
    fn no_match_yields_empty_list() {
        let msg = message_with_to(&["someone-else@other.com"]);
        assert!(filter().eligible_recipients(&msg).is_empty());
    }

    #[test]
    fn no_to_header_yields_empty_list() {
        let msg = message_with_to(&[]);
        assert!(filter().eligible_recipients(&msg).is_empty());
    }
}
