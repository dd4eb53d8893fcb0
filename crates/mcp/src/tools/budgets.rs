// Budget tools

use crate::protocol::ToolSchema;
use crate::tools::registry::{json_result, parse_args, ToolResult};
use crate::tools::{json_schema_date, json_schema_object, Tool};
use chrono::NaiveDate;
use monarch_client::{BudgetQuery, MonarchClient};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

/// Tool to read budgets and category spending
pub struct GetBudgetsTool {
    client: Arc<MonarchClient>,
}

impl GetBudgetsTool {
    pub fn new(client: Arc<MonarchClient>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GetBudgetsArgs {
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
}

#[async_trait::async_trait]
impl Tool for GetBudgetsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new(
            "get_budgets",
            "Retrieve budget plans and actuals with category names. Defaults to last month through next month.",
            json_schema_object(
                json!({
                    "start_date": json_schema_date("Start date; requires end_date"),
                    "end_date": json_schema_date("End date; requires start_date")
                }),
                vec![],
            ),
        )
    }

    async fn execute(&self, arguments: Value) -> ToolResult {
        let args: GetBudgetsArgs = parse_args(arguments)?;
        let query = BudgetQuery {
            start_date: args.start_date,
            end_date: args.end_date,
        };

        let budgets = self.client.budgets().get(&query).await?;
        json_result(&budgets)
    }
}
