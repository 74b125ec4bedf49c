//! Structural validator for the WARDEN JSON Schema subset.
//!
//! `SubsetValidator` implements the `SchemaValidator` trait from `warden-core`.
//! Validation is a recursive descent over the schema tree that never stops at
//! the first failure: every violation is collected, each tagged with the path
//! of the offending value (`$`, `$.key`, `$.list[3]`).
//!
//! Supported keywords are exactly those `JsonSchema` declares: `type`,
//! `properties`, `required`, `additionalProperties`, `items`, `enum` and the
//! inert `description`. Anything else is refused when the schema is parsed,
//! and `check_schema` refuses keywords attached to the wrong node type, so a
//! constraint can never be silently ignored.

use serde_json::Value;
use tracing::{debug, warn};

use warden_contracts::schema::{
    json_type_name, JsonSchema, SchemaType, ValidationIssue, ValidationResult,
};
use warden_core::traits::SchemaValidator;

/// Root path every validation starts from.
pub const ROOT_PATH: &str = "$";

/// The WARDEN schema validator. Stateless; one instance can serve every run.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubsetValidator;

impl SubsetValidator {
    pub fn new() -> Self {
        Self
    }
}

impl SchemaValidator for SubsetValidator {
    fn validate(&self, value: &Value, schema: &JsonSchema) -> ValidationResult {
        let result = validate(value, schema);
        if result.valid {
            debug!(schema_type = %schema.schema_type, "value conforms to schema");
        } else {
            warn!(
                error_count = result.errors.len(),
                first = %result.errors[0],
                "value does not conform to schema"
            );
        }
        result
    }
}

/// Validate `value` against `schema`, rooted at `$`.
pub fn validate(value: &Value, schema: &JsonSchema) -> ValidationResult {
    let mut issues = Vec::new();
    validate_at(value, schema, ROOT_PATH, &mut issues);
    ValidationResult::from_issues(issues)
}

/// Validate `value` against `schema` at `path`, appending every violation.
pub fn validate_at(
    value: &Value,
    schema: &JsonSchema,
    path: &str,
    issues: &mut Vec<ValidationIssue>,
) {
    match schema.schema_type {
        SchemaType::Object => {
            let Some(members) = value.as_object() else {
                issues.push(type_mismatch(path, SchemaType::Object, value));
                return;
            };

            for name in &schema.required {
                if !members.contains_key(name) {
                    issues.push(issue(member_path(path, name), "required field missing"));
                }
            }

            if let Some(properties) = &schema.properties {
                for (name, child) in properties {
                    if let Some(member) = members.get(name) {
                        validate_at(member, child, &member_path(path, name), issues);
                    }
                }
            }

            if schema.additional_properties == Some(false) {
                let declared = schema.properties.as_ref();
                for name in members.keys() {
                    if !declared.is_some_and(|p| p.contains_key(name)) {
                        issues.push(issue(member_path(path, name), "unexpected property"));
                    }
                }
            }
        }

        SchemaType::Array => {
            let Some(elements) = value.as_array() else {
                issues.push(type_mismatch(path, SchemaType::Array, value));
                return;
            };
            if let Some(items) = &schema.items {
                for (i, element) in elements.iter().enumerate() {
                    validate_at(element, items, &format!("{path}[{i}]"), issues);
                }
            }
        }

        SchemaType::String => {
            let Some(s) = value.as_str() else {
                issues.push(type_mismatch(path, SchemaType::String, value));
                return;
            };
            if let Some(allowed) = &schema.enum_values {
                if !allowed.iter().any(|a| a == s) {
                    issues.push(issue(
                        path.to_string(),
                        format!("must be one of [{}]", allowed.join(", ")),
                    ));
                }
            }
        }

        SchemaType::Number => {
            if !value.is_number() {
                issues.push(type_mismatch(path, SchemaType::Number, value));
            }
        }

        SchemaType::Boolean => {
            if !value.is_boolean() {
                issues.push(type_mismatch(path, SchemaType::Boolean, value));
            }
        }
    }
}

/// Check that every keyword of `schema` applies to its node type.
///
/// Returns one issue per misplaced keyword, with the path of the schema node
/// it sits on. Catalog loading refuses any schema with issues.
pub fn check_schema(schema: &JsonSchema) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    check_node(schema, ROOT_PATH, &mut issues);
    issues
}

fn check_node(schema: &JsonSchema, path: &str, issues: &mut Vec<ValidationIssue>) {
    let kind = schema.schema_type;

    if kind != SchemaType::Object {
        if schema.properties.is_some() {
            issues.push(misplaced(path, "properties", kind));
        }
        if !schema.required.is_empty() {
            issues.push(misplaced(path, "required", kind));
        }
        if schema.additional_properties.is_some() {
            issues.push(misplaced(path, "additionalProperties", kind));
        }
    }
    if kind != SchemaType::Array && schema.items.is_some() {
        issues.push(misplaced(path, "items", kind));
    }
    if kind != SchemaType::String && schema.enum_values.is_some() {
        issues.push(misplaced(path, "enum", kind));
    }
    if schema.enum_values.as_ref().is_some_and(Vec::is_empty) {
        issues.push(issue(path.to_string(), "enum must list at least one value"));
    }

    if let Some(properties) = &schema.properties {
        for (name, child) in properties {
            check_node(child, &member_path(path, name), issues);
        }
    }
    if let Some(items) = &schema.items {
        check_node(items, &format!("{path}[]"), issues);
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn member_path(path: &str, name: &str) -> String {
    format!("{path}.{name}")
}

fn issue(path: String, message: impl Into<String>) -> ValidationIssue {
    ValidationIssue {
        path,
        message: message.into(),
    }
}

fn type_mismatch(path: &str, expected: SchemaType, value: &Value) -> ValidationIssue {
    issue(
        path.to_string(),
        format!("expected {expected}, got {}", json_type_name(value)),
    )
}

fn misplaced(path: &str, keyword: &str, kind: SchemaType) -> ValidationIssue {
    issue(
        path.to_string(),
        format!("keyword '{keyword}' does not apply to type {kind}"),
    )
}
