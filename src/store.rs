//! File-backed holding area for raw messages.
//!
//! The base directory contains three holding directories:
//! - `incoming/`: written on arrival, before any forwarding
//! - `processed/`: forwarded to the relay
//! - `ignored/`: nothing to forward
//!
//! A stored message lives in exactly one of them at a time and moves out of
//! `incoming/` at most once.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{error, info};

use crate::error::{MdaError, ParseError};
use crate::message::{ParsedMessage, local_part};
use crate::relay::Outcome;

/// Well-known holding directory names.
pub mod dirs {
    pub const INCOMING: &str = "incoming";
    pub const PROCESSED: &str = "processed";
    pub const IGNORED: &str = "ignored";
}

const HOLDING_DIRS: &[&str] = &[dirs::INCOMING, dirs::PROCESSED, dirs::IGNORED];

/// Name a stored message after its metadata.
///
/// `<in-reply-to local part>-<from local part>-<epoch>` for replies,
/// `<from local part>-<epoch>` otherwise. Any `In-Reply-To` header, even an
/// empty or unbracketed one, selects the reply form. Slashes and whitespace
/// in a segment become underscores.
pub fn message_filename(message: &ParsedMessage) -> Result<String, ParseError> {
    let from = message.from_address()?;
    let epoch = message.date_epoch()?;
    let from_local = sanitize(local_part(&from));

    Ok(match message.in_reply_to() {
        Some(id) => {
            let thread = sanitize(local_part(&id));
            format!("{thread}-{from_local}-{epoch}")
        }
        None => format!("{from_local}-{epoch}"),
    })
}

/// Keep a filename segment inside its directory and free of spaces.
fn sanitize(segment: &str) -> String {
    segment.replace(|c: char| matches!(c, '/' | '\\' | '\0') || c.is_whitespace(), "_")
}

/// The three holding directories under one base path.
#[derive(Debug, Clone)]
pub struct Mailstore {
    base_path: PathBuf,
}

impl Mailstore {
    /// Create a mail store rooted at `base_path`.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Path of a holding directory.
    pub fn dir(&self, name: &str) -> PathBuf {
        self.base_path.join(name)
    }

    /// Path of a stored message in a holding directory.
    pub fn path_of(&self, dir: &str, filename: &str) -> PathBuf {
        self.dir(dir).join(filename)
    }

    /// Ensure all holding directories exist.
    pub fn ensure_dirs(&self) -> Result<(), MdaError> {
        for name in HOLDING_DIRS {
            let path = self.dir(name);
            fs::create_dir_all(&path).map_err(|e| MdaError::io(&path, e))?;
        }
        Ok(())
    }

    /// Write raw bytes to `incoming/<filename>`, replacing any existing file.
    pub fn store_incoming(&self, filename: &str, raw: &[u8]) -> Result<PathBuf, MdaError> {
        let path = self.path_of(dirs::INCOMING, filename);
        info!(path = %path.display(), "Writing raw message");
        fs::write(&path, raw).map_err(|e| {
            error!(path = %path.display(), error = %e, "Failed to write raw message");
            MdaError::io(&path, e)
        })?;
        Ok(path)
    }

    /// Move `incoming/<filename>` into the directory for `outcome`.
    pub fn file(&self, filename: &str, outcome: Outcome) -> Result<PathBuf, MdaError> {
        let src = self.path_of(dirs::INCOMING, filename);
        let dst = self.path_of(outcome.dir_name(), filename);
        info!(filename, outcome = %outcome, "Moving incoming message");
        fs::rename(&src, &dst).map_err(|e| {
            error!(
                src = %src.display(),
                dst = %dst.display(),
                error = %e,
                "Failed to move message"
            );
            MdaError::io(&src, e)
        })?;
        Ok(dst)
    }
}
