//! Tool-call failures and their structured rendering.

use crate::protocol::CallToolResult;
use monarch_client::MonarchError;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Arguments did not match the tool's schema.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// The Monarch API call failed.
    #[error(transparent)]
    Upstream(#[from] MonarchError),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Result could not be serialized.
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ToolError {
    /// Stable machine-readable category.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidArguments(_) => "invalid_arguments",
            Self::Upstream(MonarchError::Authentication(_))
            | Self::Upstream(MonarchError::MfaRequired)
            | Self::Upstream(MonarchError::NotAuthenticated) => "authentication",
            Self::Upstream(MonarchError::GraphQl { .. }) => "upstream_graphql",
            Self::Upstream(MonarchError::Http(_)) => "network",
            Self::Upstream(MonarchError::InvalidInput(_)) => "invalid_arguments",
            Self::Upstream(_) => "upstream",
            Self::UnknownTool(_) => "unknown_tool",
            Self::Serialization(_) => "serialization",
        }
    }

    /// Render as an `isError` tool result carrying a JSON error object.
    pub fn into_call_result(self, tool: &str) -> CallToolResult {
        let payload = json!({
            "error": {
                "tool": tool,
                "kind": self.kind(),
                "message": self.to_string(),
            }
        });
        let text = serde_json::to_string_pretty(&payload)
            .unwrap_or_else(|_| format!("Error executing {}: {}", tool, self));
        CallToolResult::error(text)
    }
}
