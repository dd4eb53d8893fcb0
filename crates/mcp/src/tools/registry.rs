// MCP tool trait, registry, and schema helpers

use crate::error::ToolError;
use crate::protocol::{CallToolResult, ToolAnnotations, ToolSchema};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

pub type ToolResult = Result<CallToolResult, ToolError>;

/// Tool executor trait
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool schema for MCP
    fn schema(&self) -> ToolSchema;

    /// Execute the tool with given arguments
    async fn execute(&self, arguments: serde_json::Value) -> ToolResult;

    /// Whether the tool changes data in Monarch
    fn access(&self) -> ToolAccess {
        ToolAccess::ReadOnly
    }
}

/// What a tool is allowed to do upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolAccess {
    /// Queries only
    ReadOnly,
    /// Creates or edits Monarch data
    Write,
}

/// Tool registry for managing available tools
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    /// Register a tool
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let schema = tool.schema();
        self.tools.insert(schema.name.clone(), tool);
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// List all tool schemas, sorted by name
    pub fn list_schemas(&self) -> Vec<ToolSchema> {
        self.tools
            .values()
            .map(|t| {
                let mut schema = t.schema();
                schema.annotations = Some(ToolAnnotations {
                    read_only_hint: t.access() == ToolAccess::ReadOnly,
                });
                schema
            })
            .collect()
    }

    /// Check if a tool exists
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Run a tool. Failures come back as `isError` results, never as `Err`.
    pub async fn call(&self, name: &str, arguments: serde_json::Value) -> CallToolResult {
        let Some(tool) = self.get(name) else {
            warn!(tool = name, "Unknown tool requested");
            return ToolError::UnknownTool(name.to_string()).into_call_result(name);
        };

        info!(tool = name, "Calling tool");
        match tool.execute(arguments).await {
            Ok(result) => result,
            Err(e) => {
                warn!(tool = name, kind = e.kind(), error = %e, "Tool call failed");
                e.into_call_result(name)
            }
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Arguments for tools that take none.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct NoArgs {}

/// Decode tool arguments; a missing/null argument object counts as `{}`.
pub(crate) fn parse_args<T: DeserializeOwned>(arguments: serde_json::Value) -> Result<T, ToolError> {
    let arguments = if arguments.is_null() {
        serde_json::json!({})
    } else {
        arguments
    };
    serde_json::from_value(arguments).map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

/// Successful result holding pretty-printed JSON.
pub(crate) fn json_result(value: &serde_json::Value) -> ToolResult {
    Ok(CallToolResult::text(serde_json::to_string_pretty(value)?))
}

/// Accept either a single id or a list of ids.
pub(crate) fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::One(id)) => vec![id],
        Some(OneOrMany::Many(ids)) => ids,
        None => Vec::new(),
    })
}

// Helper functions for creating tool schemas

pub fn json_schema_object(properties: serde_json::Value, required: Vec<&str>) -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false
    })
}

pub fn json_schema_string(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "string",
        "description": description
    })
}

pub fn json_schema_date(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "string",
        "format": "date",
        "description": format!("{} (YYYY-MM-DD)", description)
    })
}

pub fn json_schema_number(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "number",
        "description": description
    })
}

pub fn json_schema_integer(description: &str, default: u32) -> serde_json::Value {
    serde_json::json!({
        "type": "integer",
        "minimum": 0,
        "description": description,
        "default": default
    })
}

pub fn json_schema_boolean(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "boolean",
        "description": description
    })
}

pub fn json_schema_array(items: serde_json::Value, description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "array",
        "items": items,
        "description": description
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoTool;

    #[async_trait::async_trait]
    impl Tool for EchoTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema::new("echo", "Echo arguments", json_schema_object(json!({}), vec![]))
        }

        async fn execute(&self, arguments: serde_json::Value) -> ToolResult {
            if arguments.get("fail").is_some() {
                return Err(ToolError::InvalidArguments("fail requested".into()));
            }
            json_result(&arguments)
        }
    }

    #[derive(Debug, Deserialize)]
    struct IdArgs {
        #[serde(default, deserialize_with = "one_or_many")]
        ids: Vec<String>,
    }

    #[tokio::test]
    async fn test_registry_call() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));

        assert!(registry.contains("echo"));
        assert_eq!(registry.len(), 1);
        let schemas = registry.list_schemas();
        assert!(schemas[0].annotations.as_ref().unwrap().read_only_hint);

        let ok = registry.call("echo", json!({"a": 1})).await;
        assert!(ok.is_error.is_none());
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&ok.text_content()).unwrap(),
            json!({"a": 1})
        );

        let failed = registry.call("echo", json!({"fail": true})).await;
        assert_eq!(failed.is_error, Some(true));
        assert!(failed.text_content().contains("invalid_arguments"));

        let unknown = registry.call("missing", json!({})).await;
        assert_eq!(unknown.is_error, Some(true));
        assert!(unknown.text_content().contains("unknown_tool"));
    }

    #[test]
    fn test_parse_args_null_is_empty_object() {
        let _: NoArgs = parse_args(serde_json::Value::Null).unwrap();
        assert!(parse_args::<NoArgs>(json!({"extra": 1})).is_err());
    }

    #[test]
    fn test_one_or_many() {
        let args: IdArgs = parse_args(json!({"ids": "a"})).unwrap();
        assert_eq!(args.ids, vec!["a".to_string()]);

        let args: IdArgs = parse_args(json!({"ids": ["a", "b"]})).unwrap();
        assert_eq!(args.ids.len(), 2);

        let args: IdArgs = parse_args(json!({})).unwrap();
        assert!(args.ids.is_empty());

        let args: IdArgs = parse_args(json!({"ids": null})).unwrap();
        assert!(args.ids.is_empty());

        assert!(parse_args::<IdArgs>(json!({"ids": 5})).is_err());
    }

    #[test]
    fn test_object_schema_is_closed() {
        let schema = json_schema_object(json!({"x": json_schema_string("x")}), vec!["x"]);
        assert_eq!(schema["additionalProperties"], false);
        assert_eq!(schema["required"], json!(["x"]));
    }
}
