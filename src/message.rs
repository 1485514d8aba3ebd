//! Message reader: raw bytes from stdin to a header-indexed view.
//!
//! Header values are kept as they appear in the message (unfolded and
//! trimmed, but not decoded) because the classifier must hand the original
//! `To` values downstream. `mail-parser` locates the header fields; the
//! typed accessors (`From`, `Date`, `In-Reply-To`) decode on demand.

use std::io::Read;
use std::sync::LazyLock;

use lettre::message::Mailboxes;
use mail_parser::MessageParser;
use regex::Regex;

use crate::error::{MdaError, ParseError};

/// Matches the `<...>` part of an address or message identifier.
static ANGLE_ADDR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<([^<>]*)>").expect("valid angle-address pattern"));

/// Read the whole message from `input` until end of stream.
pub fn read_raw<R: Read>(mut input: R) -> Result<Vec<u8>, MdaError> {
    let mut raw = Vec::new();
    input
        .read_to_end(&mut raw)
        .map_err(|e| MdaError::io("<stdin>", e))?;
    Ok(raw)
}

/// One header field as it appeared in the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderField {
    pub name: String,
    /// Unfolded, trimmed, undecoded value.
    pub value: String,
}

/// Structured view over a raw message.
#[derive(Debug, Clone)]
pub struct ParsedMessage {
    headers: Vec<HeaderField>,
    body: Vec<u8>,
    /// `Date` as understood by mail-parser's lenient date parser.
    lenient_date: Option<i64>,
}

impl ParsedMessage {
    /// Parse raw message bytes.
    pub fn parse(raw: &[u8]) -> Result<Self, ParseError> {
        if raw.iter().all(u8::is_ascii_whitespace) {
            return Err(ParseError::Empty);
        }
        let body_start = body_offset(raw).ok_or(ParseError::NoHeaderSeparator)?;

        let message = MessageParser::default()
            .parse(raw)
            .ok_or(ParseError::NoHeaders)?;

        let headers: Vec<HeaderField> = message
            .headers()
            .iter()
            .map(|h| {
                let start = h.offset_start() as usize;
                let end = (h.offset_end() as usize).min(raw.len());
                HeaderField {
                    name: h.name().to_string(),
                    value: unfold(&String::from_utf8_lossy(&raw[start.min(end)..end])),
                }
            })
            .collect();

        if headers.is_empty() {
            return Err(ParseError::NoHeaders);
        }

        Ok(Self {
            headers,
            body: raw[body_start..].to_vec(),
            lenient_date: message.date().map(|d| d.to_timestamp()),
        })
    }

    /// All header fields, in message order.
    pub fn headers(&self) -> &[HeaderField] {
        &self.headers
    }

    /// First value of the named header (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.header_all(name).next()
    }

    /// Every value of the named header (case-insensitive), in message order.
    pub fn header_all<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> {
        self.headers
            .iter()
            .filter(move |h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Bare address of the `From` header.
    pub fn from_address(&self) -> Result<String, ParseError> {
        let value = self.header("From").ok_or(ParseError::MissingHeader("From"))?;
        bare_address(value).ok_or_else(|| ParseError::InvalidHeader {
            header: "From",
            value: value.to_string(),
        })
    }

    /// `Date` header as UTC seconds since the Unix epoch.
    pub fn date_epoch(&self) -> Result<i64, ParseError> {
        let value = self.header("Date").ok_or(ParseError::MissingHeader("Date"))?;
        chrono::DateTime::parse_from_rfc2822(value)
            .map(|d| d.timestamp())
            .ok()
            .or(self.lenient_date)
            .ok_or_else(|| ParseError::InvalidHeader {
                header: "Date",
                value: value.to_string(),
            })
    }

    /// Message identifier this message replies to, without angle brackets.
    ///
    /// `Some` whenever the header is present: values with no recognisable
    /// identifier come back trimmed but otherwise as written, possibly empty.
    pub fn in_reply_to(&self) -> Option<String> {
        self.header("In-Reply-To")
            .map(|value| bare_address(value).unwrap_or_else(|| value.trim().to_string()))
    }
}

/// Extract the bare `local@domain` address from a header value.
///
/// Accepts plain addresses, `Name <addr>` forms and address lists (the
/// first mailbox wins). Falls back to the bracketed part, then to the whole
/// value when it contains no whitespace.
pub fn bare_address(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(mailboxes) = value.parse::<Mailboxes>()
        && let Some(first) = mailboxes.iter().next()
    {
        return Some(first.email.to_string());
    }
    if let Some(caps) = ANGLE_ADDR.captures(value) {
        let inner = caps[1].trim();
        return (!inner.is_empty()).then(|| inner.to_string());
    }
    (!value.contains(char::is_whitespace)).then(|| value.to_string())
}

/// Everything before the `@` (the whole string if there is none).
pub fn local_part(address: &str) -> &str {
    address.split('@').next().unwrap_or(address)
}

/// Offset of the first body byte, just past the blank line ending the headers.
fn body_offset(raw: &[u8]) -> Option<usize> {
    raw.iter().enumerate().find_map(|(i, &b)| {
        if b != b'\n' {
            return None;
        }
        match &raw[i + 1..] {
            [b'\n', ..] => Some(i + 2),
            [b'\r', b'\n', ..] => Some(i + 3),
            _ => None,
        }
    })
}

/// Undo RFC 5322 folding and trim surrounding whitespace.
fn unfold(value: &str) -> String {
    value
        .split(['\r', '\n'])
        .filter(|part| !part.is_empty())
        .collect::<String>()
        .trim()
        .to_string()
}
