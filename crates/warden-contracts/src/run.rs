//! Run requests, provider payloads, and structured results.
//!
//! `ProviderRequest` and `ProviderOutput` are the two halves of the model
//! provider boundary. `StructuredResult` is what the orchestrator builds from
//! a provider's output; from then on only its calls' statuses change.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    schema::JsonSchema,
    tool::{ProposedToolCall, ToolCall, ToolCallStatus, ToolDefinition},
};

/// A request to run an agent against some user input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRequest {
    /// Name of the `AgentConfig` to run.
    pub agent_name: String,
    /// Free-form user input, passed to the provider as the user prompt.
    pub user_input: String,
    /// Overrides the agent's default model when set.
    #[serde(default)]
    pub model_id: Option<String>,
}

impl RunRequest {
    pub fn new(agent_name: impl Into<String>, user_input: impl Into<String>) -> Self {
        Self {
            agent_name: agent_name.into(),
            user_input: user_input.into(),
            model_id: None,
        }
    }

    /// Run against `model_id` instead of the agent's default (builder style).
    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }
}

/// Everything a model provider receives for one generation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    /// Only the tools the agent is permitted to call.
    pub tools: Vec<ToolDefinition>,
    pub output_schema: JsonSchema,
}

/// A provider's normalized answer: proposed data and proposed tool calls.
///
/// Nothing in here is trusted. Data is validated and every call is classified
/// before anything can execute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderOutput {
    pub success: bool,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub tool_calls: Vec<ProposedToolCall>,
    #[serde(default)]
    pub reasoning: Option<String>,
    #[serde(default)]
    pub raw_output: Option<String>,
}

/// The structured result of a Discussion phase.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructuredResult {
    pub success: bool,
    pub data: Value,
    /// In proposal order; classification and execution preserve this order.
    pub tool_calls: Vec<ToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_output: Option<String>,
}

impl StructuredResult {
    /// Wrap a provider output, turning every proposal into a `pending` call.
    pub fn from_provider(output: ProviderOutput) -> Self {
        Self {
            success: output.success,
            data: output.data,
            tool_calls: output.tool_calls.into_iter().map(ToolCall::pending).collect(),
            reasoning: output.reasoning,
            raw_output: output.raw_output,
        }
    }

    /// Calls that passed authorization, including those already executed.
    pub fn approved_calls(&self) -> impl Iterator<Item = &ToolCall> {
        self.tool_calls.iter().filter(|c| {
            matches!(c.status(), ToolCallStatus::Approved | ToolCallStatus::Executed)
        })
    }

    pub fn blocked_calls(&self) -> impl Iterator<Item = &ToolCall> {
        self.tool_calls
            .iter()
            .filter(|c| c.status() == ToolCallStatus::Rejected)
    }

    pub fn executed_calls(&self) -> impl Iterator<Item = &ToolCall> {
        self.tool_calls
            .iter()
            .filter(|c| c.status() == ToolCallStatus::Executed)
    }
}

/// The two phases of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Discussion,
    Execution,
}

impl std::fmt::Display for RunPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunPhase::Discussion => f.pad("discussion"),
            RunPhase::Execution => f.pad("execution"),
        }
    }
}

/// Where a run stands in the orchestration state machine.
///
///   Discussion → AwaitingConfirmation → Execution → Completed | Aborted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Discussion,
    AwaitingConfirmation,
    Execution,
    /// Execution ran; individual calls may still have failed.
    Completed,
    /// Execution-phase re-validation failed; nothing was executed.
    Aborted,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Completed | RunState::Aborted)
    }
}
