use crate::errors::{ErrorCode, McpError};
use crate::services::settings::ToolTier;
use crate::utils::suggest::suggest;
use jsonschema::error::{TypeKind, ValidationErrorKind};
use jsonschema::JSONSchema;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Tools exposed by the trimmed-down helper deployment.
pub const HELPER_TOOLS: &[&str] = &["query_api"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDef {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

static TOOL_CATALOG: Lazy<Vec<ToolDef>> = Lazy::new(|| {
    let raw = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/tool_catalog.json"));
    serde_json::from_str(raw).expect("tool_catalog.json must be valid JSON")
});

static TOOL_VALIDATORS: Lazy<HashMap<String, JSONSchema>> = Lazy::new(|| {
    TOOL_CATALOG
        .iter()
        .filter_map(|tool| {
            JSONSchema::compile(&tool.input_schema)
                .ok()
                .map(|schema| (tool.name.clone(), schema))
        })
        .collect()
});

pub fn tool_catalog() -> &'static [ToolDef] {
    &TOOL_CATALOG
}

pub fn tool_by_name(name: &str) -> Option<&'static ToolDef> {
    TOOL_CATALOG.iter().find(|tool| tool.name == name)
}

pub fn tool_in_tier(name: &str, tier: ToolTier) -> bool {
    match tier {
        ToolTier::Full => tool_by_name(name).is_some(),
        ToolTier::Helper => HELPER_TOOLS.contains(&name),
    }
}

pub fn list_tools(tier: ToolTier) -> Vec<ToolDef> {
    TOOL_CATALOG
        .iter()
        .filter(|tool| tool_in_tier(&tool.name, tier))
        .cloned()
        .collect()
}

pub fn validate_tool_args(tool_name: &str, args: &Value) -> Result<(), McpError> {
    let (Some(tool), Some(schema)) = (tool_by_name(tool_name), TOOL_VALIDATORS.get(tool_name))
    else {
        return Ok(());
    };
    if let Err(errors) = schema.validate(args) {
        let message = format_schema_errors(tool_name, errors, &tool.input_schema);
        return Err(McpError::new(ErrorCode::InvalidParams, message));
    }
    Ok(())
}

fn format_schema_errors(
    tool_name: &str,
    errors: jsonschema::ErrorIterator,
    schema: &Value,
) -> String {
    let known_fields: Vec<String> = schema
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| props.keys().cloned().collect())
        .unwrap_or_default();
    let mut lines = vec![format!("Invalid arguments for {}", tool_name)];
    let mut did_you_mean = Vec::new();

    for err in errors.take(10) {
        let location = err.instance_path.to_string();
        let location = if location.is_empty() {
            "(root)".to_string()
        } else {
            location
        };
        match &err.kind {
            ValidationErrorKind::AdditionalProperties { unexpected } => {
                for field in unexpected {
                    lines.push(format!("- {}: unknown field '{}'", location, field));
                    if let Some(best) = suggest(field, &known_fields, 1).into_iter().next() {
                        did_you_mean.push(format!("'{}' -> '{}'", field, best));
                    }
                }
            }
            ValidationErrorKind::Required { property } => {
                let name = property
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| property.to_string());
                lines.push(format!("- {}: missing required field '{}'", location, name));
            }
            ValidationErrorKind::Type { kind } => {
                lines.push(format!("- {}: expected {}", location, format_type_kind(kind)));
            }
            _ => lines.push(format!("- {}: {}", location, err)),
        }
    }
    if !did_you_mean.is_empty() {
        lines.push(format!("Did you mean: {}", did_you_mean.join(", ")));
    }
    lines.join("\n")
}

fn format_type_kind(kind: &TypeKind) -> String {
    match kind {
        TypeKind::Single(primitive) => primitive.to_string(),
        TypeKind::Multiple(types) => {
            let list: Vec<String> = (*types).into_iter().map(|t| t.to_string()).collect();
            list.join(" | ")
        }
    }
}
