//! Task-management reference scenarios.
//!
//! Each scenario wires the bundled catalog to real WARDEN components (tool
//! registry, subset validator, hash-chained audit log, orchestrator) with a
//! scripted model and a recording executor, and demonstrates one enforcement
//! pattern.

pub mod confirmed_run;
pub mod hallucinated_tool;
pub mod invalid_output;
pub mod permission_block;

use warden_audit::InMemoryAuditLog;
use warden_contracts::{audit::LogEntry, tool::ToolCall};

pub(crate) fn print_calls(calls: &[ToolCall]) {
    for call in calls {
        match (call.block_reason(), call.error()) {
            (Some(reason), _) => {
                println!("    {:<16} {:<9} {}", call.tool_name, call.status(), reason)
            }
            (None, Some(error)) => {
                println!("    {:<16} {:<9} failed: {}", call.tool_name, call.status(), error)
            }
            (None, None) => println!("    {:<16} {}", call.tool_name, call.status()),
        }
    }
}

pub(crate) fn print_log(entries: &[LogEntry]) {
    for entry in entries {
        println!(
            "    #{:<3} {:<9} {:<10} {}",
            entry.id, entry.phase, entry.entry_type, entry.message
        );
    }
}

pub(crate) fn print_integrity(audit: &InMemoryAuditLog) {
    let log = audit.export_log();
    println!(
        "  Audit chain integrity:  {} ({} event(s))",
        if audit.verify_integrity() { "VERIFIED" } else { "FAILED" },
        log.events.len()
    );
}
