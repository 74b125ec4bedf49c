//! Hash-chain primitives: hashing and chain integrity verification.
//!
//! Hash input layout (bytes, in order):
//!   1. entry id as 8-byte little-endian
//!   2. prev_hash as UTF-8 bytes (64 ASCII hex chars)
//!   3. canonical JSON of the entry (serde_json, no pretty-printing)
//!
//! The entry JSON carries the run id, phase, timestamp and payload, so every
//! field an auditor reads is committed to.

use sha2::{Digest, Sha256};

use warden_contracts::{
    audit::LogEntry,
    error::{WardenError, WardenResult},
};

use crate::event::AuditEvent;

/// Compute the SHA-256 hash of one entry linked to `prev_hash`.
///
/// Returns a lowercase 64-character hex string.
pub fn hash_entry(entry: &LogEntry, prev_hash: &str) -> WardenResult<String> {
    let entry_json = serde_json::to_vec(entry).map_err(|e| WardenError::AuditWriteFailed {
        reason: format!("log entry {} is not serializable: {}", entry.id, e),
    })?;

    let mut hasher = Sha256::new();
    hasher.update(entry.id.to_le_bytes());
    hasher.update(prev_hash.as_bytes());
    hasher.update(&entry_json);

    Ok(hex::encode(hasher.finalize()))
}

/// Verify the integrity of a hash chain.
///
/// Returns `true` when every event links to its predecessor (or to
/// `GENESIS_HASH` for the first) and every stored hash matches the value
/// recomputed from the event's entry. An empty chain is valid.
pub fn verify_chain(events: &[AuditEvent]) -> bool {
    let mut expected_prev = AuditEvent::GENESIS_HASH.to_string();

    for event in events {
        if event.prev_hash != expected_prev {
            return false;
        }

        match hash_entry(&event.entry, &event.prev_hash) {
            Ok(recomputed) if recomputed == event.this_hash => {}
            _ => return false,
        }

        expected_prev = event.this_hash.clone();
    }

    true
}
