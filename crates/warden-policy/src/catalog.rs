//! TOML catalog: tools, output schemas, agents, and orchestrator settings.
//!
//! A `CatalogConfig` is deserialized from TOML and then checked as a whole
//! before a `Catalog` is handed out. Every problem is a `ConfigError`; a
//! catalog that loads is internally consistent.
//!
//! Example in TOML:
//! ```toml
//! permissions = ["read:tasks", "write:tasks"]
//!
//! [orchestrator]
//! provider_timeout_ms = 30000
//!
//! [[tools]]
//! name = "updateTask"
//! description = "Update a task's fields"
//! required_permissions = ["write:tasks"]
//! [tools.parameter_schema]
//! type = "object"
//! required = ["taskId"]
//!
//! [schemas.TaskUpdate]
//! type = "object"
//!
//! [[agents]]
//! name = "task-manager"
//! model_id = "gpt-4o"
//! instructions = "Keep the board tidy."
//! allowed_tools = ["updateTask"]
//! output_schema_name = "TaskUpdate"
//! permissions = ["read:tasks", "write:tasks"]
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info, warn};

use warden_contracts::{
    agent::AgentConfig,
    error::{WardenError, WardenResult},
    permission::{format_permissions, PermissionSet},
    schema::JsonSchema,
    tool::ToolDefinition,
};
use warden_core::{
    directory::{AgentDirectory, SchemaCatalog},
    settings::OrchestratorSettings,
    traits::ToolAccessPolicy,
};
use warden_verify::check_schema;

use crate::registry::ToolRegistry;

/// The raw shape of a catalog file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogConfig {
    /// Closed set of permission tokens. When present, every token a tool
    /// requires or an agent holds must be declared here.
    #[serde(default)]
    pub permissions: Option<PermissionSet>,

    #[serde(default)]
    pub orchestrator: OrchestratorSettings,

    #[serde(default)]
    pub tools: Vec<ToolDefinition>,

    #[serde(default)]
    pub schemas: BTreeMap<String, JsonSchema>,

    #[serde(default)]
    pub agents: Vec<AgentConfig>,
}

/// A loaded, consistency-checked catalog.
#[derive(Debug, Clone)]
pub struct Catalog {
    registry: ToolRegistry,
    agents: AgentDirectory,
    schemas: SchemaCatalog,
    settings: OrchestratorSettings,
}

impl Catalog {
    /// Parse `s` as TOML and build a `Catalog`.
    ///
    /// Returns `WardenError::ConfigError` if the TOML is malformed, does not
    /// match `CatalogConfig`, or fails a consistency check.
    pub fn from_toml_str(s: &str) -> WardenResult<Self> {
        let config: CatalogConfig = toml::from_str(s).map_err(|e| WardenError::ConfigError {
            reason: format!("failed to parse catalog TOML: {}", e),
        })?;
        Self::from_config(config)
    }

    /// Read the file at `path` and parse it as a TOML catalog.
    pub fn from_file(path: &Path) -> WardenResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| WardenError::ConfigError {
            reason: format!("failed to read catalog file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Check `config` and build the lookup tables it describes.
    pub fn from_config(config: CatalogConfig) -> WardenResult<Self> {
        if config.orchestrator.provider_timeout_ms == 0 {
            return Err(config_error("orchestrator.provider_timeout_ms must be positive"));
        }

        // ── Schemas are well-formed ──────────────────────────────────────────
        for (name, schema) in &config.schemas {
            ensure_well_formed(&format!("schema '{name}'"), schema)?;
        }
        for tool in &config.tools {
            ensure_well_formed(
                &format!("parameter schema of tool '{}'", tool.name),
                &tool.parameter_schema,
            )?;
        }

        // ── Permission tokens are declared ───────────────────────────────────
        if let Some(declared) = &config.permissions {
            for tool in &config.tools {
                let undeclared = tool.required_permissions.missing_from(declared);
                if !undeclared.is_empty() {
                    return Err(config_error(format!(
                        "tool '{}' requires undeclared permissions {}",
                        tool.name,
                        format_permissions(&undeclared)
                    )));
                }
            }
            for agent in &config.agents {
                let undeclared = agent.permissions.missing_from(declared);
                if !undeclared.is_empty() {
                    return Err(config_error(format!(
                        "agent '{}' holds undeclared permissions {}",
                        agent.name,
                        format_permissions(&undeclared)
                    )));
                }
            }
        }

        // ── Agents reference known schemas ───────────────────────────────────
        for agent in &config.agents {
            if !config.schemas.contains_key(&agent.output_schema_name) {
                return Err(config_error(format!(
                    "agent '{}' names unknown output schema '{}'",
                    agent.name, agent.output_schema_name
                )));
            }
        }

        let registry = ToolRegistry::new(config.tools)?;

        // An allow-listed name with no registry entry is legal but can never
        // be invoked; it is worth a warning.
        for agent in &config.agents {
            for name in &agent.allowed_tools {
                if !registry.contains(name) {
                    warn!(agent = %agent.name, tool = %name, "allow-listed tool is not registered");
                }
            }
        }

        let agents = AgentDirectory::new(config.agents)?;
        let schemas = SchemaCatalog::new(config.schemas);

        info!(
            tools = registry.len(),
            agents = agents.len(),
            "catalog loaded"
        );

        Ok(Self {
            registry,
            agents,
            schemas,
            settings: config.orchestrator,
        })
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn agents(&self) -> &AgentDirectory {
        &self.agents
    }

    pub fn schemas(&self) -> &SchemaCatalog {
        &self.schemas
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// The tools `agent_name` would be shown in a Discussion, in registry order.
    pub fn visible_tools(&self, agent_name: &str) -> WardenResult<Vec<ToolDefinition>> {
        let agent = self
            .agents
            .get(agent_name)
            .ok_or_else(|| WardenError::UnknownAgent {
                name: agent_name.to_string(),
            })?;
        let tools = self
            .registry
            .permitted_tools(&agent.allowed_tools, &agent.permissions);
        debug!(agent = %agent_name, visible = tools.len(), "computed visible tools");
        Ok(tools)
    }

    /// Split the catalog into the pieces an `Orchestrator` is built from.
    pub fn into_parts(self) -> (ToolRegistry, AgentDirectory, SchemaCatalog, OrchestratorSettings) {
        (self.registry, self.agents, self.schemas, self.settings)
    }
}

fn ensure_well_formed(label: &str, schema: &JsonSchema) -> WardenResult<()> {
    let issues = check_schema(schema);
    if issues.is_empty() {
        return Ok(());
    }
    let rendered: Vec<String> = issues.iter().map(ToString::to_string).collect();
    Err(config_error(format!("{label} is malformed: {}", rendered.join("; "))))
}

fn config_error(reason: impl Into<String>) -> WardenError {
    WardenError::ConfigError {
        reason: reason.into(),
    }
}
