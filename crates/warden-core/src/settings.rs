//! Orchestrator runtime settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunables for the orchestrator, loadable from the `[orchestrator]` table of
/// a catalog file. Every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorSettings {
    /// Upper bound on one model provider call. A timeout is a provider failure.
    pub provider_timeout_ms: u64,
    /// Validate each otherwise permitted call's arguments against the tool's
    /// parameter schema, blocking calls that do not conform.
    pub validate_arguments: bool,
}

impl OrchestratorSettings {
    pub const DEFAULT_PROVIDER_TIMEOUT_MS: u64 = 30_000;

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider_timeout_ms)
    }
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            provider_timeout_ms: Self::DEFAULT_PROVIDER_TIMEOUT_MS,
            validate_arguments: true,
        }
    }
}
