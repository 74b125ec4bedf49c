//! Error types for the WARDEN orchestration engine.
//!
//! Only configuration, provider, audit and state-machine failures are errors.
//! Blocked tool calls and schema violations are ordinary data carried in the
//! run results.

use thiserror::Error;

/// The unified error type for WARDEN.
#[derive(Debug, Error)]
pub enum WardenError {
    /// The run request names an agent that is not configured.
    #[error("unknown agent '{name}'")]
    UnknownAgent { name: String },

    /// No model provider is registered for the effective model id.
    #[error("no model provider registered for model '{model_id}'")]
    UnknownModel { model_id: String },

    /// An agent references an output schema that is not configured.
    #[error("unknown output schema '{name}'")]
    UnknownSchema { name: String },

    /// Static configuration is missing, malformed or inconsistent.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// The model provider failed to produce a structured result.
    #[error("model provider '{model_id}' failed: {reason}")]
    Provider { model_id: String, reason: String },

    /// The model provider did not answer within the configured timeout.
    #[error("model provider '{model_id}' timed out after {timeout_ms} ms")]
    ProviderTimeout { model_id: String, timeout_ms: u64 },

    /// A single approved tool call failed in the tool executor.
    #[error("tool '{tool}' failed: {reason}")]
    ToolExecution { tool: String, reason: String },

    /// The audit sink could not record an entry.
    ///
    /// Treated as fatal: a decision that cannot be audited cannot proceed.
    #[error("audit write failed: {reason}")]
    AuditWriteFailed { reason: String },

    /// A tool call was asked to make an illegal status transition.
    #[error("state machine error: {reason}")]
    StateMachine { reason: String },
}

impl WardenError {
    /// True for errors that stem from static configuration rather than from
    /// anything that happened during the run.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            WardenError::UnknownAgent { .. }
                | WardenError::UnknownModel { .. }
                | WardenError::UnknownSchema { .. }
                | WardenError::ConfigError { .. }
        )
    }
}

/// Convenience alias used throughout the WARDEN crates.
pub type WardenResult<T> = Result<T, WardenError>;
