//! Core trait definitions for the WARDEN orchestration pipeline.
//!
//! These traits define the complete trust boundary:
//!
//! - `ModelProvider`:    untrusted proposer (one per model backend)
//! - `ToolExecutor`:     side-effecting sink (only ever sees approved calls)
//! - `ToolAccessPolicy`: trusted gate (visibility and enforcement)
//! - `SchemaValidator`:  trusted checker (structural validation)
//! - `AuditSink`:        trusted recorder (append-only)
//!
//! The orchestrator wires them together in the correct order. The executor is
//! never called for a call that the access policy has not approved, and never
//! before the Execution-phase re-validation passes.

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde_json::Value;

use warden_contracts::{
    audit::{LogDraft, LogEntry},
    error::WardenResult,
    permission::PermissionSet,
    run::{ProviderOutput, ProviderRequest},
    schema::{JsonSchema, ValidationResult},
    tool::{BlockReason, ToolCall, ToolDefinition},
};

/// A generative-model backend that proposes data and tool calls.
///
/// Implementations are **untrusted**. The orchestrator treats every backend
/// identically through this one method; no vendor-specific logic exists above
/// this boundary.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Produce a structured proposal for `request`.
    ///
    /// This is the only suspension point of the Discussion phase. Errors are
    /// fatal to the Discussion invocation.
    async fn generate_structured_output(&self, request: &ProviderRequest)
        -> WardenResult<ProviderOutput>;
}

/// Performs the business logic behind a tool call.
///
/// The orchestrator only calls this for calls in `approved` status, one at a
/// time, in approval order. A returned error is isolated to that call.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(&self, call: &ToolCall) -> WardenResult<Value>;
}

/// The tool registry seen through its two checks.
///
/// Implementations are **trusted**, deterministic and side-effect free; they
/// only read immutable state and must be safe to call from concurrent runs.
pub trait ToolAccessPolicy: Send + Sync {
    /// Visibility: the registry tools the agent may be shown, in registry order.
    fn permitted_tools(
        &self,
        allowed_names: &BTreeSet<String>,
        granted: &PermissionSet,
    ) -> Vec<ToolDefinition>;

    /// Enforcement: `None` if the agent may invoke `tool_name`, otherwise why not.
    ///
    /// Re-checked independently of visibility, since a model may propose a
    /// tool it was never shown.
    fn check_access(
        &self,
        tool_name: &str,
        allowed_names: &BTreeSet<String>,
        granted: &PermissionSet,
    ) -> Option<BlockReason>;

    /// Look up a tool definition by name.
    fn tool(&self, name: &str) -> Option<&ToolDefinition>;
}

/// Structural validation of untrusted data against a configured schema.
///
/// Must be non-fail-fast: the returned result lists every violation found.
pub trait SchemaValidator: Send + Sync {
    fn validate(&self, value: &Value, schema: &JsonSchema) -> ValidationResult;
}

/// The append-only audit trail.
///
/// The sink assigns each entry its id and timestamp atomically. Entries are
/// never modified or removed. A failed append is fatal to the current phase.
pub trait AuditSink: Send + Sync {
    fn append(&self, draft: LogDraft) -> WardenResult<LogEntry>;
}
