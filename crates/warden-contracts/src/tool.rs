//! Tool definitions, proposed calls, and the tool-call state machine.
//!
//! A `ToolCall` moves through a strictly monotonic lifecycle:
//!
//!   pending → approved → executed
//!   pending → rejected
//!
//! `rejected` and `executed` are terminal. Every transition method refuses an
//! illegal move with `WardenError::StateMachine`, so no code path can take a
//! call from `pending` straight to `executed` or resurrect a rejected call.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    error::{WardenError, WardenResult},
    permission::{format_permissions, Permission, PermissionSet},
    schema::{json_type_name, JsonSchema, ValidationIssue},
};

/// A side-effecting tool the engine can authorize.
///
/// Definitions are created once from static configuration and never mutated.
/// The tool registry is the single authority on which tools exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique key, e.g. "updateTask".
    pub name: String,
    /// Human-readable summary shown to model providers.
    pub description: String,
    /// Schema the call arguments must satisfy.
    pub parameter_schema: JsonSchema,
    /// Every permission an agent must hold to see or invoke this tool.
    #[serde(default)]
    pub required_permissions: PermissionSet,
}

/// A tool invocation exactly as a model provider proposed it.
///
/// Proposals carry no status. The orchestrator turns each one into a
/// `pending` `ToolCall` and is the only party that classifies it.
///
/// Arguments are kept exactly as proposed. A proposal whose arguments are not
/// a JSON object is still a proposal; classification blocks it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposedToolCall {
    pub tool_name: String,
    #[serde(default = "empty_arguments")]
    pub arguments: Value,
}

impl ProposedToolCall {
    pub fn new(tool_name: impl Into<String>, arguments: Value) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments,
        }
    }
}

fn empty_arguments() -> Value {
    Value::Object(Map::new())
}

/// Lifecycle status of a tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCallStatus {
    Pending,
    Approved,
    Rejected,
    Executed,
}

impl ToolCallStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ToolCallStatus::Rejected | ToolCallStatus::Executed)
    }
}

impl fmt::Display for ToolCallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ToolCallStatus::Pending => "pending",
            ToolCallStatus::Approved => "approved",
            ToolCallStatus::Rejected => "rejected",
            ToolCallStatus::Executed => "executed",
        };
        f.pad(s)
    }
}

/// Why a proposed tool call was refused.
///
/// Blocking is a routine outcome, reported as data on the call and in the
/// audit log, never raised as an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlockReason {
    /// The tool does not exist in the registry (covers invented tools).
    NotInRegistry { tool: String },
    /// The tool exists but is not on the agent's allow-list.
    NotAllowlisted { tool: String },
    /// The agent lacks one or more of the tool's required permissions.
    MissingPermissions { missing: Vec<Permission> },
    /// The call arguments do not satisfy the tool's parameter schema.
    InvalidArguments { errors: Vec<ValidationIssue> },
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockReason::NotInRegistry { tool } => {
                write!(f, "Tool '{tool}' not found in registry")
            }
            BlockReason::NotAllowlisted { tool } => {
                write!(f, "Tool '{tool}' is not in the agent's allowed tools")
            }
            BlockReason::MissingPermissions { missing } => {
                write!(f, "Agent lacks permissions: {}", format_permissions(missing))
            }
            BlockReason::InvalidArguments { errors } => {
                let rendered: Vec<String> = errors.iter().map(ToString::to_string).collect();
                write!(f, "Invalid arguments: {}", rendered.join("; "))
            }
        }
    }
}

/// One tool call inside a run, owned by that run's orchestrator invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolCall {
    pub tool_name: String,
    pub arguments: Value,
    status: ToolCallStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    block_reason: Option<BlockReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ToolCall {
    /// A fresh `pending` call built from a provider proposal.
    pub fn pending(proposal: ProposedToolCall) -> Self {
        Self {
            tool_name: proposal.tool_name,
            arguments: proposal.arguments,
            status: ToolCallStatus::Pending,
            result: None,
            block_reason: None,
            error: None,
        }
    }

    pub fn status(&self) -> ToolCallStatus {
        self.status
    }

    /// The executor's result, present only once the call is `executed`.
    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    pub fn block_reason(&self) -> Option<&BlockReason> {
        self.block_reason.as_ref()
    }

    /// The executor failure message, if an approved call failed to run.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The named arguments, or `None` when the proposal did not send an
    /// object.
    pub fn argument_map(&self) -> Option<&Map<String, Value>> {
        self.arguments.as_object()
    }

    /// The structural issue with the arguments' shape, if they are not a JSON
    /// object. Reported at the root path `$`.
    pub fn argument_shape_issue(&self) -> Option<ValidationIssue> {
        if self.arguments.is_object() {
            return None;
        }
        Some(ValidationIssue {
            path: "$".to_string(),
            message: format!("expected object, got {}", json_type_name(&self.arguments)),
        })
    }

    /// `pending → approved`.
    pub fn approve(&mut self) -> WardenResult<()> {
        self.transition(ToolCallStatus::Pending, ToolCallStatus::Approved)
    }

    /// `pending → rejected`, recording the reason.
    pub fn reject(&mut self, reason: BlockReason) -> WardenResult<()> {
        self.transition(ToolCallStatus::Pending, ToolCallStatus::Rejected)?;
        self.block_reason = Some(reason);
        Ok(())
    }

    /// `approved → executed`, attaching the executor's result.
    pub fn mark_executed(&mut self, result: Value) -> WardenResult<()> {
        self.transition(ToolCallStatus::Approved, ToolCallStatus::Executed)?;
        self.result = Some(result);
        Ok(())
    }

    /// Record an executor failure. The call stays `approved`: its side effect
    /// never completed, so it must not be reported as `executed`.
    pub fn record_failure(&mut self, message: impl Into<String>) -> WardenResult<()> {
        if self.status != ToolCallStatus::Approved {
            return Err(WardenError::StateMachine {
                reason: format!(
                    "cannot record an execution failure on tool call '{}' in status {}",
                    self.tool_name, self.status
                ),
            });
        }
        self.error = Some(message.into());
        Ok(())
    }

    fn transition(&mut self, from: ToolCallStatus, to: ToolCallStatus) -> WardenResult<()> {
        if self.status != from {
            return Err(WardenError::StateMachine {
                reason: format!(
                    "illegal transition {} -> {} for tool call '{}'",
                    self.status, to, self.tool_name
                ),
            });
        }
        self.status = to;
        Ok(())
    }
}
