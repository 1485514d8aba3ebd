//! Forwarder: hands eligible messages to the upstream SMTP relay.
//!
//! The SMTP client sits behind the [`Relay`] trait; [`SmtpRelay`] is the
//! lettre-backed implementation used in production.

use std::fmt;

use lettre::address::{Address, Envelope};
use lettre::{SmtpTransport, Transport};
use tracing::{error, info};

use crate::error::TransportError;
use crate::message::bare_address;

/// Where a stored message ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// At least one recipient matched and the relay accepted the message.
    Processed,
    /// No recipient matched; nothing was sent.
    Ignored,
}

impl Outcome {
    /// Name of the holding directory for this outcome.
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Processed => "processed",
            Self::Ignored => "ignored",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// An SMTP submission endpoint.
pub trait Relay {
    /// Host name used in log lines and errors.
    fn host(&self) -> &str;

    /// Submit one envelope.
    ///
    /// `sender` and `recipients` are header values as they appeared in the
    /// message; `payload` is the complete original message.
    fn send(&self, sender: &str, recipients: &[String], payload: &[u8]) -> Result<(), TransportError>;
}

/// Plain, unauthenticated SMTP relay.
#[derive(Debug, Clone)]
pub struct SmtpRelay {
    host: String,
    port: u16,
}

impl SmtpRelay {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl Relay for SmtpRelay {
    fn host(&self) -> &str {
        &self.host
    }

    fn send(&self, sender: &str, recipients: &[String], payload: &[u8]) -> Result<(), TransportError> {
        let envelope = build_envelope(sender, recipients)?;

        // Plain SMTP, no credentials.
        let transport = SmtpTransport::builder_dangerous(&self.host)
            .port(self.port)
            .build();

        transport
            .send_raw(&envelope, &crlf_line_endings(payload))
            .map_err(|e| TransportError::SendFailed {
                host: format!("{}:{}", self.host, self.port),
                reason: e.to_string(),
            })?;
        Ok(())
    }
}

/// Rewrite bare `\n` line endings as `\r\n` for the DATA phase.
///
/// The SMTP codec only dot-stuffs lines that follow a CRLF, so LF-only
/// input has to be normalized first. Existing CRLF pairs are kept as is.
pub fn crlf_line_endings(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + payload.len() / 32);
    let mut prev = 0u8;
    for &b in payload {
        if b == b'\n' && prev != b'\r' {
            out.push(b'\r');
        }
        out.push(b);
        prev = b;
    }
    out
}

/// Build the SMTP envelope from `From` and `To` header values.
pub fn build_envelope(sender: &str, recipients: &[String]) -> Result<Envelope, TransportError> {
    let from = parse_envelope_address(sender)?;
    let to = recipients
        .iter()
        .map(|r| parse_envelope_address(r))
        .collect::<Result<Vec<_>, _>>()?;
    Envelope::new(Some(from), to).map_err(|e| TransportError::Envelope(e.to_string()))
}

fn parse_envelope_address(value: &str) -> Result<Address, TransportError> {
    let bare = bare_address(value).ok_or_else(|| TransportError::InvalidAddress {
        value: value.to_string(),
        reason: "no address found".into(),
    })?;
    bare.parse().map_err(|e: lettre::address::AddressError| TransportError::InvalidAddress {
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// Forward a message to the relay if anything is eligible.
///
/// An empty recipient list never touches the network and yields
/// [`Outcome::Ignored`].
pub fn forward<R: Relay + ?Sized>(
    relay: &R,
    sender: &str,
    recipients: &[String],
    payload: &[u8],
) -> Result<Outcome, TransportError> {
    if recipients.is_empty() {
        info!("No relay recipients, skipping SMTP");
        return Ok(Outcome::Ignored);
    }

    info!(
        recipients = ?recipients,
        host = relay.host(),
        "Forwarding message"
    );
    if let Err(e) = relay.send(sender, recipients, payload) {
        error!(
            recipients = ?recipients,
            host = relay.host(),
            error = %e,
            "SMTP send failed"
        );
        return Err(e);
    }
    info!(host = relay.host(), "SMTP send successful");
    Ok(Outcome::Processed)
}
