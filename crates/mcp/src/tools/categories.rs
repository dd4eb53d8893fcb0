// Category tools

use crate::protocol::ToolSchema;
use crate::tools::registry::{json_result, parse_args, NoArgs, ToolResult};
use crate::tools::{json_schema_object, Tool};
use monarch_client::MonarchClient;
use serde_json::{json, Value};
use std::sync::Arc;

/// Tool to list transaction categories
pub struct GetTransactionCategoriesTool {
    client: Arc<MonarchClient>,
}

impl GetTransactionCategoriesTool {
    pub fn new(client: Arc<MonarchClient>) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Tool for GetTransactionCategoriesTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new(
            "get_transaction_categories",
            "List all transaction categories with their groups",
            json_schema_object(json!({}), vec![]),
        )
    }

    async fn execute(&self, arguments: Value) -> ToolResult {
        let _: NoArgs = parse_args(arguments)?;
        let categories = self.client.categories().list().await?;
        json_result(&categories)
    }
}
