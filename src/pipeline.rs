//! One delivery attempt, start to finish.
//!
//! `READ_AND_STORE → CLASSIFY_AND_FORWARD → FILE`, each stage in its own
//! span. Any stage error ends the attempt; nothing is retried here. A
//! transport failure leaves the stored file in `incoming/` so the message
//! can be inspected or re-delivered.

use std::io::Read;
use std::path::PathBuf;

use tracing::{error, info, info_span};

use crate::classify::RecipientFilter;
use crate::config::MdaConfig;
use crate::error::Result;
use crate::message::{ParsedMessage, read_raw};
use crate::relay::{Outcome, Relay, SmtpRelay, forward};
use crate::store::{Mailstore, message_filename};

/// State carried from stage to stage.
#[derive(Debug, Clone)]
pub struct Delivery {
    /// Bytes exactly as received.
    pub raw: Vec<u8>,
    pub message: ParsedMessage,
    pub filename: String,
    /// Original `To` values eligible for the relay.
    pub recipients: Vec<String>,
    /// Set once the message has left `incoming/`.
    pub outcome: Option<Outcome>,
    /// Where the message currently lives.
    pub path: PathBuf,
}

/// The delivery pipeline: store, filter and relay.
pub struct Pipeline<R: Relay> {
    store: Mailstore,
    filter: RecipientFilter,
    relay: R,
}

impl Pipeline<SmtpRelay> {
    /// Build the production pipeline from configuration.
    pub fn from_config(config: &MdaConfig) -> Self {
        Self::new(
            Mailstore::new(&config.base_dir),
            RecipientFilter::new(&config.reply_subdomain),
            SmtpRelay::new(&config.smtp_host, config.smtp_port),
        )
    }
}

impl<R: Relay> Pipeline<R> {
    pub fn new(store: Mailstore, filter: RecipientFilter, relay: R) -> Self {
        Self {
            store,
            filter,
            relay,
        }
    }

    pub fn store(&self) -> &Mailstore {
        &self.store
    }

    pub fn relay(&self) -> &R {
        &self.relay
    }

    /// Create the holding directories.
    pub fn bootstrap(&self) -> Result<()> {
        self.store.ensure_dirs()
    }

    /// Run one message through every stage.
    pub fn run<I: Read>(&self, input: I) -> Result<Delivery> {
        let mut delivery = self.read_and_store(input).inspect_err(|e| {
            error!(error = %e, "Failed to read and store message");
        })?;
        let outcome = self.classify_and_forward(&mut delivery)?;
        self.file(&mut delivery, outcome)?;
        Ok(delivery)
    }

    /// Read the message, name it, and write it to `incoming/`.
    pub fn read_and_store<I: Read>(&self, input: I) -> Result<Delivery> {
        let _span = info_span!("read_and_store").entered();

        let raw = read_raw(input)?;
        let message = ParsedMessage::parse(&raw)?;
        let filename = message_filename(&message)?;
        let path = self.store.store_incoming(&filename, &raw)?;

        Ok(Delivery {
            raw,
            message,
            filename,
            recipients: Vec::new(),
            outcome: None,
            path,
        })
    }

    /// Pick relay recipients and forward to the relay if there are any.
    pub fn classify_and_forward(&self, delivery: &mut Delivery) -> Result<Outcome> {
        let _span = info_span!("classify_and_forward", filename = %delivery.filename).entered();

        delivery.recipients = self.filter.eligible_recipients(&delivery.message);
        let sender = delivery.message.header("From").unwrap_or_default();
        let outcome = forward(&self.relay, sender, &delivery.recipients, &delivery.raw)
            .inspect_err(|_| {
                error!(path = %delivery.path.display(), "Leaving message in incoming");
            })?;
        Ok(outcome)
    }

    /// Move the stored file to the directory for `outcome`.
    pub fn file(&self, delivery: &mut Delivery, outcome: Outcome) -> Result<()> {
        let _span = info_span!("file", filename = %delivery.filename).entered();

        delivery.path = self.store.file(&delivery.filename, outcome)?;
        delivery.outcome = Some(outcome);
        info!(path = %delivery.path.display(), outcome = %outcome, "Delivery complete");
        Ok(())
    }
}
