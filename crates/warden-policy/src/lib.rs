//! # warden-policy
//!
//! Tool registry, permission validator, and TOML catalog loading for the
//! WARDEN runtime.
//!
//! [`registry::ToolRegistry`] implements the
//! [`warden_core::traits::ToolAccessPolicy`] trait. [`catalog::Catalog`]
//! loads a registry together with the agents, output schemas, and
//! orchestrator settings that go with it.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use warden_policy::catalog::Catalog;
//!
//! let catalog = Catalog::from_file(Path::new("catalog/tasks.toml"))?;
//! let (registry, agents, schemas, settings) = catalog.into_parts();
//! ```

pub mod catalog;
pub mod registry;

pub use catalog::{Catalog, CatalogConfig};
pub use registry::ToolRegistry;

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use warden_contracts::{
        error::WardenError,
        permission::{Permission, PermissionSet},
        schema::JsonSchema,
        tool::{BlockReason, ToolDefinition},
    };
    use warden_core::traits::ToolAccessPolicy;

    use super::catalog::Catalog;
    use super::registry::ToolRegistry;

    // ── Helpers ──────────────────────────────────────────────────────────────

    fn tool(name: &str, perms: &[&str]) -> ToolDefinition {
        ToolDefinition {
            name: name.to_string(),
            description: format!("{name} tool"),
            parameter_schema: JsonSchema::object(),
            required_permissions: perms.iter().copied().collect(),
        }
    }

    fn registry() -> ToolRegistry {
        ToolRegistry::new(vec![
            tool("listTasks", &["read:tasks"]),
            tool("getTask", &["read:tasks"]),
            tool("updateTask", &["write:tasks"]),
            tool("archiveTask", &["read:tasks", "write:tasks"]),
            tool("ping", &[]),
        ])
        .unwrap()
    }

    fn names(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn perms(list: &[&str]) -> PermissionSet {
        list.iter().copied().collect()
    }

    const CATALOG: &str = r#"
        permissions = ["read:tasks", "write:tasks"]

        [orchestrator]
        provider_timeout_ms = 5000

        [[tools]]
        name = "listTasks"
        description = "List tasks"
        required_permissions = ["read:tasks"]
        [tools.parameter_schema]
        type = "object"

        [[tools]]
        name = "updateTask"
        description = "Update a task"
        required_permissions = ["write:tasks"]
        [tools.parameter_schema]
        type = "object"
        required = ["taskId"]
        [tools.parameter_schema.properties.taskId]
        type = "string"

        [schemas.TaskUpdate]
        type = "object"
        required = ["taskId"]
        additionalProperties = false
        [schemas.TaskUpdate.properties.taskId]
        type = "string"

        [[agents]]
        name = "task-analyst"
        model_id = "claude-sonnet"
        instructions = "Analyse the board."
        allowed_tools = ["listTasks", "updateTask"]
        output_schema_name = "TaskUpdate"
        permissions = ["read:tasks"]
    "#;

    // ── Visibility ───────────────────────────────────────────────────────────

    /// Visible = allow-listed AND fully permitted, in registry order.
    #[test]
    fn test_permitted_tools_filters_and_keeps_order() {
        let visible = registry().permitted_tools(
            &names(&["updateTask", "getTask", "listTasks", "archiveTask"]),
            &perms(&["read:tasks"]),
        );
        let visible: Vec<&str> = visible.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(visible, vec!["listTasks", "getTask"]);
    }

    /// A tool with no required permissions only needs the allow-list.
    #[test]
    fn test_permissionless_tool_needs_allowlist() {
        let reg = registry();
        assert!(reg.permitted_tools(&names(&[]), &perms(&[])).is_empty());
        assert_eq!(reg.permitted_tools(&names(&["ping"]), &perms(&[])).len(), 1);
    }

    /// Partial permissions are not enough.
    #[test]
    fn test_partial_permissions_hide_tool() {
        let visible =
            registry().permitted_tools(&names(&["archiveTask"]), &perms(&["write:tasks"]));
        assert!(visible.is_empty());
    }

    // ── Enforcement ──────────────────────────────────────────────────────────

    #[test]
    fn test_check_access_allows_permitted_tool() {
        let reason = registry().check_access(
            "listTasks",
            &names(&["listTasks"]),
            &perms(&["read:tasks"]),
        );
        assert_eq!(reason, None);
    }

    /// Unknown tools are not-in-registry regardless of agent configuration.
    #[test]
    fn test_unknown_tool_is_not_in_registry() {
        let reg = registry();
        for allowed in [names(&[]), names(&["dropDatabase"])] {
            match reg.check_access("dropDatabase", &allowed, &perms(&["write:tasks"])) {
                Some(BlockReason::NotInRegistry { tool }) => assert_eq!(tool, "dropDatabase"),
                other => panic!("expected NotInRegistry, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_registered_but_not_allowlisted() {
        let reason = registry().check_access(
            "getTask",
            &names(&["listTasks"]),
            &perms(&["read:tasks"]),
        );
        assert!(matches!(reason, Some(BlockReason::NotAllowlisted { .. })));
    }

    /// Allow-listed but under-permissioned reports exactly the missing tokens.
    #[test]
    fn test_missing_permissions_listed() {
        let reason = registry()
            .check_access("archiveTask", &names(&["archiveTask"]), &perms(&["read:tasks"]))
            .unwrap();
        match &reason {
            BlockReason::MissingPermissions { missing } => {
                assert_eq!(missing, &vec![Permission::new("write:tasks")]);
            }
            other => panic!("expected MissingPermissions, got {:?}", other),
        }
        assert_eq!(reason.to_string(), "Agent lacks permissions: [write:tasks]");
    }

    /// Visibility and enforcement agree for every registered tool.
    #[test]
    fn test_visibility_matches_enforcement() {
        let reg = registry();
        let allowed = names(&["listTasks", "updateTask", "archiveTask", "ping"]);
        let granted = perms(&["read:tasks"]);
        let visible: BTreeSet<String> = reg
            .permitted_tools(&allowed, &granted)
            .into_iter()
            .map(|t| t.name)
            .collect();

        for t in reg.tools() {
            let allowed_now = reg.check_access(&t.name, &allowed, &granted).is_none();
            assert_eq!(allowed_now, visible.contains(&t.name), "disagreement on {}", t.name);
        }
    }

    #[test]
    fn test_duplicate_tool_rejected() {
        match ToolRegistry::new(vec![tool("a", &[]), tool("a", &[])]) {
            Err(WardenError::ConfigError { reason }) => assert!(reason.contains("duplicate")),
            other => panic!("expected ConfigError, got {:?}", other),
        }
    }

    // ── Catalog loading ──────────────────────────────────────────────────────

    #[test]
    fn test_catalog_loads() {
        let catalog = Catalog::from_toml_str(CATALOG).unwrap();

        assert_eq!(catalog.registry().len(), 2);
        assert_eq!(catalog.settings().provider_timeout_ms, 5000);
        assert!(catalog.settings().validate_arguments);
        assert!(catalog.schemas().contains("TaskUpdate"));

        let visible = catalog.visible_tools("task-analyst").unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].name, "listTasks");
    }

    #[test]
    fn test_visible_tools_unknown_agent() {
        let catalog = Catalog::from_toml_str(CATALOG).unwrap();
        assert!(matches!(
            catalog.visible_tools("ghost"),
            Err(WardenError::UnknownAgent { .. })
        ));
    }

    fn expect_config_error(toml: &str, needle: &str) {
        match Catalog::from_toml_str(toml) {
            Err(WardenError::ConfigError { reason }) => {
                assert!(reason.contains(needle), "expected '{needle}' in reason, got: {reason}");
            }
            other => panic!("expected ConfigError, got {:?}", other),
        }
    }

    #[test]
    fn test_toml_parse_error() {
        expect_config_error("[[tools]\nname = ", "failed to parse catalog TOML");
    }

    #[test]
    fn test_unknown_schema_keyword_rejected() {
        let toml = CATALOG.replace("additionalProperties = false", "minLength = 3");
        expect_config_error(&toml, "failed to parse catalog TOML");
    }

    #[test]
    fn test_undeclared_permission_rejected() {
        let toml = CATALOG.replace(
            r#"permissions = ["read:tasks"]"#,
            r#"permissions = ["read:tasks", "admin"]"#,
        );
        expect_config_error(&toml, "undeclared permissions [admin]");
    }

    #[test]
    fn test_unknown_output_schema_rejected() {
        let toml = CATALOG.replace(
            r#"output_schema_name = "TaskUpdate""#,
            r#"output_schema_name = "Nope""#,
        );
        expect_config_error(&toml, "unknown output schema 'Nope'");
    }

    #[test]
    fn test_misplaced_keyword_rejected() {
        let toml = format!(
            "{CATALOG}\n[schemas.Bad]\ntype = \"number\"\nenum = [\"1\"]\n"
        );
        expect_config_error(&toml, "schema 'Bad' is malformed");
    }

    #[test]
    fn test_duplicate_agent_rejected() {
        let agent_block = &CATALOG[CATALOG.find("[[agents]]").unwrap()..];
        let toml = format!("{CATALOG}\n{agent_block}");
        expect_config_error(&toml, "duplicate agent name 'task-analyst'");
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let toml = CATALOG.replace("provider_timeout_ms = 5000", "provider_timeout_ms = 0");
        expect_config_error(&toml, "provider_timeout_ms");
    }

    #[test]
    fn test_from_file_missing() {
        match Catalog::from_file(std::path::Path::new("/nonexistent/catalog.toml")) {
            Err(WardenError::ConfigError { reason }) => {
                assert!(reason.contains("failed to read catalog file"));
            }
            other => panic!("expected ConfigError, got {:?}", other),
        }
    }
}
