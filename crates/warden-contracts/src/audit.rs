//! Audit log entry types.
//!
//! The orchestrator hands a `LogDraft` to its audit sink; the sink assigns the
//! id and timestamp and returns the stored `LogEntry`. Entries are never
//! edited or removed once appended.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{agent::RunId, run::RunPhase};

/// What kind of decision an entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogEntryType {
    Plan,
    ToolCall,
    Validation,
    Execution,
    Error,
    Blocked,
}

impl std::fmt::Display for LogEntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LogEntryType::Plan => "plan",
            LogEntryType::ToolCall => "tool_call",
            LogEntryType::Validation => "validation",
            LogEntryType::Execution => "execution",
            LogEntryType::Error => "error",
            LogEntryType::Blocked => "blocked",
        };
        f.pad(s)
    }
}

/// An entry before the sink has assigned its id and timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogDraft {
    pub run_id: RunId,
    pub phase: RunPhase,
    pub model_id: String,
    pub agent_name: String,
    pub entry_type: LogEntryType,
    pub message: String,
    pub data: Option<Value>,
}

/// One immutable audit entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Unique and strictly increasing within the sink that assigned it.
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    pub run_id: RunId,
    pub phase: RunPhase,
    pub model_id: String,
    pub agent_name: String,
    #[serde(rename = "type")]
    pub entry_type: LogEntryType,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl LogEntry {
    /// Seal a draft with the id and timestamp assigned by a sink.
    pub fn from_draft(id: u64, timestamp: DateTime<Utc>, draft: LogDraft) -> Self {
        Self {
            id,
            timestamp,
            run_id: draft.run_id,
            phase: draft.phase,
            model_id: draft.model_id,
            agent_name: draft.agent_name,
            entry_type: draft.entry_type,
            message: draft.message,
            data: draft.data,
        }
    }
}
