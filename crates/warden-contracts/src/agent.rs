//! Agent configuration and run identity.
//!
//! Agents are static: each `AgentConfig` is loaded at startup and read-only
//! for the lifetime of the process. The only per-run identity is `RunId`.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::permission::PermissionSet;

/// Static configuration for one agent.
///
/// Example in TOML:
/// ```toml
/// [[agents]]
/// name = "task-manager"
/// model_id = "gpt-4o"
/// instructions = "You maintain the team's task board."
/// allowed_tools = ["listTasks", "updateTask"]
/// output_schema_name = "TaskUpdate"
/// permissions = ["read:tasks", "write:tasks"]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Unique key used by run requests.
    pub name: String,
    /// Default model identifier; a run request may override it.
    pub model_id: String,
    /// System prompt handed to the model provider.
    pub instructions: String,
    /// Tool names this agent may ever be shown or invoke.
    #[serde(default)]
    pub allowed_tools: BTreeSet<String>,
    /// Name of the schema the agent's structured output must satisfy.
    pub output_schema_name: String,
    /// Permissions granted to this agent.
    #[serde(default)]
    pub permissions: PermissionSet,
}

/// Unique identifier for one run (one Discussion and at most one Execution).
///
/// Appears on every audit entry the run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub uuid::Uuid);

impl RunId {
    /// Create a new, unique run ID.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
