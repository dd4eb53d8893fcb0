// Read-only insight tools: goals, cashflow, investments, net worth

use crate::protocol::ToolSchema;
use crate::tools::registry::{json_result, parse_args, NoArgs, ToolResult};
use crate::tools::{
    json_schema_date, json_schema_integer, json_schema_object, json_schema_string, Tool,
};
use chrono::NaiveDate;
use monarch_client::{CashflowQuery, MonarchClient, NetWorthQuery};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

/// Tool to list savings goals
pub struct GetGoalsTool {
    client: Arc<MonarchClient>,
}

impl GetGoalsTool {
    pub fn new(client: Arc<MonarchClient>) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Tool for GetGoalsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new(
            "get_goals",
            "Retrieve financial goals and their progress",
            json_schema_object(json!({}), vec![]),
        )
    }

    async fn execute(&self, arguments: Value) -> ToolResult {
        let _: NoArgs = parse_args(arguments)?;
        let goals = self.client.goals().list().await?;
        json_result(&goals)
    }
}

/// Tool to summarize income and expenses
pub struct GetCashflowTool {
    client: Arc<MonarchClient>,
}

impl GetCashflowTool {
    pub fn new(client: Arc<MonarchClient>) -> Self {
        Self { client }
    }
}

fn default_limit() -> u32 {
    100
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GetCashflowArgs {
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    #[serde(default = "default_limit")]
    limit: u32,
}

#[async_trait::async_trait]
impl Tool for GetCashflowTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new(
            "get_cashflow",
            "Income and expense totals grouped by category, category group and merchant. Defaults to the current month.",
            json_schema_object(
                json!({
                    "start_date": json_schema_date("Start date; requires end_date"),
                    "end_date": json_schema_date("End date; requires start_date"),
                    "limit": json_schema_integer("Maximum number of rows per grouping", 100)
                }),
                vec![],
            ),
        )
    }

    async fn execute(&self, arguments: Value) -> ToolResult {
        let args: GetCashflowArgs = parse_args(arguments)?;
        let query = CashflowQuery {
            start_date: args.start_date,
            end_date: args.end_date,
            limit: args.limit,
        };

        let cashflow = self.client.cashflow().get(&query).await?;
        json_result(&cashflow)
    }
}

/// Tool to read investment holdings
pub struct GetInvestmentsTool {
    client: Arc<MonarchClient>,
}

impl GetInvestmentsTool {
    pub fn new(client: Arc<MonarchClient>) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Tool for GetInvestmentsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new(
            "get_investments",
            "Retrieve investment holdings and portfolio performance",
            json_schema_object(json!({}), vec![]),
        )
    }

    async fn execute(&self, arguments: Value) -> ToolResult {
        let _: NoArgs = parse_args(arguments)?;
        let portfolio = self.client.investments().portfolio().await?;
        json_result(&portfolio)
    }
}

/// Tool to read net worth history
pub struct GetNetWorthTool {
    client: Arc<MonarchClient>,
}

impl GetNetWorthTool {
    pub fn new(client: Arc<MonarchClient>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GetNetWorthArgs {
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    account_type: Option<String>,
}

#[async_trait::async_trait]
impl Tool for GetNetWorthTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new(
            "get_net_worth",
            "Net worth snapshots over time, optionally limited to one account type",
            json_schema_object(
                json!({
                    "start_date": json_schema_date("First snapshot date"),
                    "end_date": json_schema_date("Last snapshot date"),
                    "account_type": json_schema_string("Restrict to an account type (for example 'brokerage')")
                }),
                vec![],
            ),
        )
    }

    async fn execute(&self, arguments: Value) -> ToolResult {
        let args: GetNetWorthArgs = parse_args(arguments)?;
        let query = NetWorthQuery {
            start_date: args.start_date,
            end_date: args.end_date,
            account_type: args.account_type,
        };

        let snapshots = self.client.net_worth().snapshots(&query).await?;
        json_result(&snapshots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cashflow_args_default_limit() {
        let args: GetCashflowArgs = parse_args(json!({})).unwrap();
        assert_eq!(args.limit, 100);
        assert!(args.start_date.is_none());
    }

    #[test]
    fn test_net_worth_args() {
        let args: GetNetWorthArgs = parse_args(json!({
            "start_date": "2024-01-01",
            "account_type": "brokerage"
        }))
        .unwrap();
        assert_eq!(args.start_date, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert!(args.end_date.is_none());
        assert_eq!(args.account_type.as_deref(), Some("brokerage"));
    }

    #[test]
    fn test_no_arg_tools_reject_arguments() {
        assert!(parse_args::<NoArgs>(json!({"limit": 5})).is_err());
    }
}
