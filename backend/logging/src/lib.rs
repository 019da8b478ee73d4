//! Structured logging for Bridgewire.
//!
//! Console plus rolling JSON file output, redaction of peer identifiers,
//! and a structured log of media transfer outcomes.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{EventLogger, TransferEvent, TransferLogEntry, TransferOutcome};
pub use logger::init_logger;
pub use redact::redact_sensitive_data;
