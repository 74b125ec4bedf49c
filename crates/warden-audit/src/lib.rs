//! # warden-audit
//!
//! Append-only, SHA-256 hash-chained audit log for the WARDEN runtime.
//!
//! ## Overview
//!
//! Every entry the orchestrator appends is wrapped in an `AuditEvent` that
//! links to the previous event via its SHA-256 hash. Tampering with any
//! stored entry breaks the chain and is detected by `verify_chain`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use warden_audit::InMemoryAuditLog;
//!
//! let audit = InMemoryAuditLog::new();
//! let orchestrator = Orchestrator::new(/* ... */, Arc::new(audit.clone()));
//!
//! assert!(audit.verify_integrity());
//! let log = audit.export_log();
//! ```

pub mod chain;
pub mod event;
pub mod memory;

pub use chain::{hash_entry, verify_chain};
pub use event::{AuditEvent, AuditLog};
pub use memory::InMemoryAuditLog;

// ── Tests ─────────────────────────────────────────────────────────────────────
