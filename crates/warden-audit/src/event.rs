//! Audit event and exported log types.
//!
//! `AuditEvent` wraps one `LogEntry` with the hashes that make tampering
//! detectable. `AuditLog` is a sealed snapshot of the whole chain.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use warden_contracts::audit::LogEntry;

/// A single link in the SHA-256 hash chain.
///
/// Modifying any field of `entry` invalidates `this_hash` and every later
/// `prev_hash`, which `verify_chain` detects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub entry: LogEntry,

    /// Hash (hex) of the previous event, or `GENESIS_HASH` for the first.
    pub prev_hash: String,

    /// Hash (hex) over (entry id, prev_hash, canonical JSON of entry).
    pub this_hash: String,
}

impl AuditEvent {
    /// The `prev_hash` of the first event in every chain: 64 hex zeros.
    pub const GENESIS_HASH: &'static str =
        "0000000000000000000000000000000000000000000000000000000000000000";
}

/// A sealed snapshot of an audit log.
///
/// `terminal_hash` is the `this_hash` of the last event and commits to the
/// entire chain up to the moment of export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLog {
    /// All events in chain order (id 0 first).
    pub events: Vec<AuditEvent>,

    /// Wall-clock time (UTC) the snapshot was taken.
    pub exported_at: DateTime<Utc>,

    /// Empty string if the log is empty.
    pub terminal_hash: String,
}

impl AuditLog {
    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.events.iter().map(|e| &e.entry)
    }
}
