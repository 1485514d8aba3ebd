//! GitHub mail delivery agent.
//!
//! Reads one message from stdin, keeps a raw copy on disk, and relays
//! replies addressed to GitHub Enterprise reply addresses to its SMTP host.

pub mod classify;
pub mod config;
pub mod error;
pub mod logging;
pub mod message;
pub mod pipeline;
pub mod relay;
pub mod store;
