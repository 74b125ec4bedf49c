//! In-memory implementation of `AuditSink`.
//!
//! `InMemoryAuditLog` keeps every event in a `Vec` behind a `Mutex`. Ids are
//! assigned under the same lock that appends, so concurrent runs sharing one
//! log always get unique, strictly increasing ids and a single linear chain.
//!
//! Use `export_log()` to obtain a sealed `AuditLog`, and `verify_integrity()`
//! at any time to confirm the chain has not been tampered with in memory.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tracing::{debug, info};

use warden_contracts::{
    agent::RunId,
    audit::{LogDraft, LogEntry},
    error::{WardenError, WardenResult},
};
use warden_core::traits::AuditSink;

use crate::{
    chain::{hash_entry, verify_chain},
    event::{AuditEvent, AuditLog},
};

// ── Internal mutable state ────────────────────────────────────────────────────

pub(crate) struct InMemoryState {
    /// All events appended so far, in append order.
    pub(crate) events: Vec<AuditEvent>,

    /// The id the next entry receives (starts at 0).
    pub(crate) next_id: u64,

    /// The `this_hash` of the last event, or `GENESIS_HASH` before any.
    pub(crate) last_hash: String,
}

// ── Public log ────────────────────────────────────────────────────────────────

/// An in-memory, append-only audit log backed by a SHA-256 hash chain.
///
/// Cloning is cheap and every clone observes the same chain, so one clone can
/// be injected into the orchestrator while another is kept for inspection.
#[derive(Clone)]
pub struct InMemoryAuditLog {
    pub(crate) state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        let state = InMemoryState {
            events: Vec::new(),
            next_id: 0,
            last_hash: AuditEvent::GENESIS_HASH.to_string(),
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Every entry, in append order.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.read().events.iter().map(|e| e.entry.clone()).collect()
    }

    /// The entries of one run, in append order.
    pub fn entries_for_run(&self, run_id: RunId) -> Vec<LogEntry> {
        self.read()
            .events
            .iter()
            .filter(|e| e.entry.run_id == run_id)
            .map(|e| e.entry.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.read().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().events.is_empty()
    }

    /// Export a sealed `AuditLog` containing every event appended so far.
    pub fn export_log(&self) -> AuditLog {
        let state = self.read();
        let terminal_hash = state
            .events
            .last()
            .map(|e| e.this_hash.clone())
            .unwrap_or_default();

        info!(
            event_count = state.events.len(),
            terminal_hash = %terminal_hash,
            "audit log exported"
        );

        AuditLog {
            events: state.events.clone(),
            exported_at: Utc::now(),
            terminal_hash,
        }
    }

    /// Check prev-hash linkage and hash correctness of every event.
    pub fn verify_integrity(&self) -> bool {
        verify_chain(&self.read().events)
    }

    /// Readers tolerate a poisoned lock: appends only mutate state after the
    /// hash is computed, so the chain is never left half-written.
    fn read(&self) -> MutexGuard<'_, InMemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for InMemoryAuditLog {
    fn default() -> Self {
        Self::new()
    }
}

// ── AuditSink impl ────────────────────────────────────────────────────────────

impl AuditSink for InMemoryAuditLog {
    /// Seal `draft` with the next id and the current time, link it into the
    /// chain, and return the stored entry.
    ///
    /// Returns `Err(AuditWriteFailed)` if the lock is poisoned or the entry
    /// cannot be hashed; the chain is unchanged in either case.
    fn append(&self, draft: LogDraft) -> WardenResult<LogEntry> {
        let mut state = self.state.lock().map_err(|e| WardenError::AuditWriteFailed {
            reason: format!("audit state lock poisoned: {}", e),
        })?;

        let entry = LogEntry::from_draft(state.next_id, Utc::now(), draft);
        let prev_hash = state.last_hash.clone();
        let this_hash = hash_entry(&entry, &prev_hash)?;

        debug!(
            id = entry.id,
            run_id = %entry.run_id,
            entry_type = %entry.entry_type,
            this_hash = %this_hash,
            "audit event appended"
        );

        state.events.push(AuditEvent {
            entry: entry.clone(),
            prev_hash,
            this_hash: this_hash.clone(),
        });
        state.next_id += 1;
        state.last_hash = this_hash;

        Ok(entry)
    }
}
