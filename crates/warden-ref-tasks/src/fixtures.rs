//! Scripted collaborators and the wired-up reference deployment.
//!
//! `ScriptedProvider` stands in for a model vendor: it returns one configured
//! proposal and counts how often it was asked. `RecordingExecutor` stands in
//! for the task tracker: it answers from `mock_data` and records every call it
//! receives, so a scenario can prove what did and did not execute.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use warden_audit::InMemoryAuditLog;
use warden_contracts::{
    error::{WardenError, WardenResult},
    run::{ProviderOutput, ProviderRequest},
    tool::ToolCall,
};
use warden_core::{
    directory::ProviderTable,
    orchestrator::Orchestrator,
    traits::{ModelProvider, ToolExecutor},
};
use warden_policy::catalog::Catalog;
use warden_verify::SubsetValidator;

use crate::{mock_data, TASKS_CATALOG};

// ── ScriptedProvider ──────────────────────────────────────────────────────────

/// A `ModelProvider` that always answers with the same proposal.
pub struct ScriptedProvider {
    answer: Result<ProviderOutput, String>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(output: ProviderOutput) -> Self {
        Self {
            answer: Ok(output),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A provider whose every call fails with `reason`.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            answer: Err(reason.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn invocations(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    /// Every request received, in order.
    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    async fn generate_structured_output(
        &self,
        request: &ProviderRequest,
    ) -> WardenResult<ProviderOutput> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        debug!(tools = request.tools.len(), "scripted provider invoked");

        self.answer.clone().map_err(|reason| WardenError::Provider {
            model_id: "scripted".to_string(),
            reason,
        })
    }
}

// ── RecordingExecutor ─────────────────────────────────────────────────────────

/// A `ToolExecutor` backed by the mock task board.
#[derive(Default)]
pub struct RecordingExecutor {
    invoked: Mutex<Vec<String>>,
    failing: BTreeSet<String>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call to `tool_name` fail (builder style).
    pub fn fail_on(mut self, tool_name: impl Into<String>) -> Self {
        self.failing.insert(tool_name.into());
        self
    }

    /// Tool names in the order they were executed.
    pub fn invocations(&self) -> Vec<String> {
        self.invoked.lock().map(|i| i.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ToolExecutor for RecordingExecutor {
    async fn execute(&self, call: &ToolCall) -> WardenResult<Value> {
        if let Ok(mut invoked) = self.invoked.lock() {
            invoked.push(call.tool_name.clone());
        }

        if self.failing.contains(&call.tool_name) {
            return Err(WardenError::ToolExecution {
                tool: call.tool_name.clone(),
                reason: "task tracker returned 503 Service Unavailable".to_string(),
            });
        }

        let arguments = call.argument_map().ok_or_else(|| WardenError::ToolExecution {
            tool: call.tool_name.clone(),
            reason: "arguments are not an object".to_string(),
        })?;
        mock_data::handle(&call.tool_name, arguments).ok_or_else(|| {
            WardenError::ToolExecution {
                tool: call.tool_name.clone(),
                reason: "no handler on the task board".to_string(),
            }
        })
    }
}

// ── Deployment ────────────────────────────────────────────────────────────────

/// The reference catalog wired to real policy, validation, and audit
/// components, with scripted model and tool backends.
pub struct Deployment {
    pub orchestrator: Orchestrator,
    pub audit: InMemoryAuditLog,
    pub provider: Arc<ScriptedProvider>,
    pub executor: Arc<RecordingExecutor>,
}

impl Deployment {
    /// Load the bundled catalog and serve every agent's model from `provider`.
    pub fn new(provider: ScriptedProvider, executor: RecordingExecutor) -> WardenResult<Self> {
        let catalog = Catalog::from_toml_str(TASKS_CATALOG)?;
        let (registry, agents, schemas, settings) = catalog.into_parts();

        let provider = Arc::new(provider);
        let executor = Arc::new(executor);

        let mut providers = ProviderTable::new();
        for agent in agents.all() {
            providers.register(agent.model_id.clone(), provider.clone());
        }

        let audit = InMemoryAuditLog::new();
        let orchestrator = Orchestrator::new(
            Arc::new(registry),
            Arc::new(SubsetValidator::new()),
            Arc::new(agents),
            Arc::new(schemas),
            providers,
            executor.clone(),
            Arc::new(audit.clone()),
        )
        .with_settings(settings);

        Ok(Self {
            orchestrator,
            audit,
            provider,
            executor,
        })
    }
}
