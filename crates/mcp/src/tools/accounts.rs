// Account tools

use crate::error::ToolError;
use crate::protocol::ToolSchema;
use crate::tools::registry::{json_result, one_or_many, parse_args, NoArgs, ToolResult};
use crate::tools::{json_schema_array, json_schema_object, Tool, ToolAccess};
use monarch_client::MonarchClient;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

/// Tool to list linked accounts
pub struct GetAccountsTool {
    client: Arc<MonarchClient>,
}

impl GetAccountsTool {
    pub fn new(client: Arc<MonarchClient>) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Tool for GetAccountsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new(
            "get_accounts",
            "Retrieve all linked financial accounts with balances",
            json_schema_object(json!({}), vec![]),
        )
    }

    async fn execute(&self, arguments: Value) -> ToolResult {
        let _: NoArgs = parse_args(arguments)?;
        let accounts = self.client.accounts().list().await?;
        json_result(&accounts)
    }
}

/// Tool to request a fresh sync from the institutions
pub struct RefreshAccountsTool {
    client: Arc<MonarchClient>,
}

impl RefreshAccountsTool {
    pub fn new(client: Arc<MonarchClient>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RefreshAccountsArgs {
    #[serde(default, deserialize_with = "one_or_many")]
    account_ids: Vec<String>,
}

#[async_trait::async_trait]
impl Tool for RefreshAccountsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new(
            "refresh_accounts",
            "Request an account data refresh from the financial institutions. Refreshes every account when account_ids is omitted.",
            json_schema_object(
                json!({
                    "account_ids": json_schema_array(
                        json!({"type": "string"}),
                        "Accounts to refresh (default: all accounts)"
                    )
                }),
                vec![],
            ),
        )
    }

    async fn execute(&self, arguments: Value) -> ToolResult {
        let args: RefreshAccountsArgs = parse_args(arguments)?;

        let mut account_ids: Vec<String> = args
            .account_ids
            .into_iter()
            .filter(|id| !id.is_empty())
            .collect();
        if account_ids.is_empty() {
            account_ids = self.client.accounts().ids().await?;
        }
        if account_ids.is_empty() {
            return Err(ToolError::InvalidArguments(
                "no accounts available to refresh".to_string(),
            ));
        }

        info!(count = account_ids.len(), "Requesting account refresh");
        let result = self.client.accounts().refresh(&account_ids).await?;
        json_result(&result)
    }

    fn access(&self) -> ToolAccess {
        ToolAccess::Write
    }
}
