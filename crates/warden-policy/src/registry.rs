//! The tool registry and its permission validator.
//!
//! `ToolRegistry` implements the `ToolAccessPolicy` trait from warden-core.
//! It answers two questions, both pure functions of immutable state:
//!
//! 1. **Visibility**: which tools may an agent be shown?
//!    Every registered tool that is allow-listed AND whose required
//!    permissions the agent holds, in registry order.
//! 2. **Enforcement**: may an agent invoke this tool? First match wins:
//!    a. not registered         → `NotInRegistry`
//!    b. not on the allow-list  → `NotAllowlisted`
//!    c. missing permissions    → `MissingPermissions`
//!    d. otherwise              → allowed
//!
//! The registry check runs first so an invented tool is always reported as
//! not-in-registry, whatever the agent's configuration.

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use warden_contracts::{
    error::{WardenError, WardenResult},
    permission::PermissionSet,
    tool::{BlockReason, ToolDefinition},
};
use warden_core::traits::ToolAccessPolicy;

/// The single authority on which tools exist.
///
/// ```rust,ignore
/// use warden_policy::registry::ToolRegistry;
///
/// let registry = ToolRegistry::new(vec![list_tasks, update_task])?;
/// let visible = registry.permitted_tools(&agent.allowed_tools, &agent.permissions);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    /// Registration order, which is also visibility order.
    tools: Vec<ToolDefinition>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Build a registry, refusing duplicate tool names.
    pub fn new(tools: impl IntoIterator<Item = ToolDefinition>) -> WardenResult<Self> {
        let mut registry = Self::default();
        for tool in tools {
            if registry.index.contains_key(&tool.name) {
                return Err(WardenError::ConfigError {
                    reason: format!("duplicate tool name '{}'", tool.name),
                });
            }
            registry.index.insert(tool.name.clone(), registry.tools.len());
            registry.tools.push(tool);
        }
        Ok(registry)
    }

    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Every registered tool, in registration order.
    pub fn tools(&self) -> &[ToolDefinition] {
        &self.tools
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl ToolAccessPolicy for ToolRegistry {
    fn permitted_tools(
        &self,
        allowed_names: &BTreeSet<String>,
        granted: &PermissionSet,
    ) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .filter(|tool| {
                allowed_names.contains(&tool.name) && tool.required_permissions.is_subset(granted)
            })
            .cloned()
            .collect()
    }

    fn check_access(
        &self,
        tool_name: &str,
        allowed_names: &BTreeSet<String>,
        granted: &PermissionSet,
    ) -> Option<BlockReason> {
        let Some(tool) = self.get(tool_name) else {
            debug!(tool = %tool_name, "tool not in registry");
            return Some(BlockReason::NotInRegistry {
                tool: tool_name.to_string(),
            });
        };

        if !allowed_names.contains(tool_name) {
            debug!(tool = %tool_name, "tool not on agent allow-list");
            return Some(BlockReason::NotAllowlisted {
                tool: tool_name.to_string(),
            });
        }

        let missing = tool.required_permissions.missing_from(granted);
        if !missing.is_empty() {
            debug!(tool = %tool_name, missing = missing.len(), "agent lacks required permissions");
            return Some(BlockReason::MissingPermissions { missing });
        }

        None
    }

    fn tool(&self, name: &str) -> Option<&ToolDefinition> {
        self.get(name)
    }
}
