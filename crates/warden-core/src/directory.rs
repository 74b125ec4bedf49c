//! Immutable lookup tables the orchestrator resolves runs against.
//!
//! All three are built once at startup and shared behind `Arc`; nothing here
//! offers mutation after construction.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::debug;

use warden_contracts::{
    agent::AgentConfig,
    error::{WardenError, WardenResult},
    schema::JsonSchema,
};

use crate::traits::ModelProvider;

/// Agent configurations keyed by name.
#[derive(Debug, Clone, Default)]
pub struct AgentDirectory {
    agents: BTreeMap<String, AgentConfig>,
}

impl AgentDirectory {
    /// Build the directory, refusing duplicate agent names.
    pub fn new(agents: impl IntoIterator<Item = AgentConfig>) -> WardenResult<Self> {
        let mut map = BTreeMap::new();
        for agent in agents {
            if map.contains_key(&agent.name) {
                return Err(WardenError::ConfigError {
                    reason: format!("duplicate agent name '{}'", agent.name),
                });
            }
            map.insert(agent.name.clone(), agent);
        }
        Ok(Self { agents: map })
    }

    pub fn get(&self, name: &str) -> Option<&AgentConfig> {
        self.agents.get(name)
    }

    /// All agents, ordered by name.
    pub fn all(&self) -> impl Iterator<Item = &AgentConfig> {
        self.agents.values()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

/// Named output schemas (e.g. "TaskUpdate").
#[derive(Debug, Clone, Default)]
pub struct SchemaCatalog {
    schemas: BTreeMap<String, JsonSchema>,
}

impl SchemaCatalog {
    pub fn new(schemas: BTreeMap<String, JsonSchema>) -> Self {
        Self { schemas }
    }

    pub fn get(&self, name: &str) -> Option<&JsonSchema> {
        self.schemas.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &JsonSchema)> {
        self.schemas.iter()
    }
}

/// Model providers keyed by model identifier.
///
/// Several model ids may share one provider instance (e.g. every model of a
/// vendor served by the same adapter).
#[derive(Clone, Default)]
pub struct ProviderTable {
    providers: HashMap<String, Arc<dyn ModelProvider>>,
}

impl ProviderTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `provider` for `model_id`. Registering the same id twice
    /// replaces the previous provider.
    pub fn register(&mut self, model_id: impl Into<String>, provider: Arc<dyn ModelProvider>) {
        let model_id = model_id.into();
        debug!(model_id = %model_id, "registering model provider");
        self.providers.insert(model_id, provider);
    }

    /// Builder-style `register`.
    pub fn with(mut self, model_id: impl Into<String>, provider: Arc<dyn ModelProvider>) -> Self {
        self.register(model_id, provider);
        self
    }

    pub fn get(&self, model_id: &str) -> Option<Arc<dyn ModelProvider>> {
        self.providers.get(model_id).cloned()
    }

    /// Registered model ids, sorted.
    pub fn model_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

impl std::fmt::Debug for ProviderTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderTable")
            .field("model_ids", &self.model_ids())
            .finish()
    }
}
