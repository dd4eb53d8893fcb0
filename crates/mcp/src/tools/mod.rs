pub mod accounts;
pub mod budgets;
pub mod categories;
pub mod insights;
pub mod transactions;
mod registry;

pub use accounts::{GetAccountsTool, RefreshAccountsTool};
pub use budgets::GetBudgetsTool;
pub use categories::GetTransactionCategoriesTool;
pub use insights::{GetCashflowTool, GetGoalsTool, GetInvestmentsTool, GetNetWorthTool};
pub use registry::{
    json_schema_array, json_schema_boolean, json_schema_date, json_schema_integer,
    json_schema_number, json_schema_object, json_schema_string, Tool, ToolAccess, ToolRegistry,
    ToolResult,
};
pub use transactions::{CreateTransactionTool, GetTransactionsTool, UpdateTransactionTool};

use monarch_client::MonarchClient;
use std::sync::Arc;

/// Registry holding every Monarch tool, all sharing one client.
pub fn monarch_registry(client: Arc<MonarchClient>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    // Read-only
    registry.register(Arc::new(GetAccountsTool::new(client.clone())));
    registry.register(Arc::new(GetTransactionsTool::new(client.clone())));
    registry.register(Arc::new(GetTransactionCategoriesTool::new(client.clone())));
    registry.register(Arc::new(GetBudgetsTool::new(client.clone())));
    registry.register(Arc::new(GetCashflowTool::new(client.clone())));
    registry.register(Arc::new(GetGoalsTool::new(client.clone())));
    registry.register(Arc::new(GetInvestmentsTool::new(client.clone())));
    registry.register(Arc::new(GetNetWorthTool::new(client.clone())));

    // Writes
    registry.register(Arc::new(CreateTransactionTool::new(client.clone())));
    registry.register(Arc::new(UpdateTransactionTool::new(client.clone())));
    registry.register(Arc::new(RefreshAccountsTool::new(client)));

    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monarch_registry_lists_all_tools() {
        let client = Arc::new(MonarchClient::builder().token("t").build().unwrap());
        let registry = monarch_registry(client);

        let names: Vec<String> = registry.list_schemas().into_iter().map(|s| s.name).collect();
        assert_eq!(
            names,
            vec![
                "create_transaction",
                "get_accounts",
                "get_budgets",
                "get_cashflow",
                "get_goals",
                "get_investments",
                "get_net_worth",
                "get_transaction_categories",
                "get_transactions",
                "refresh_accounts",
                "update_transaction",
            ]
        );
    }

    #[test]
    fn test_write_tools_are_not_read_only() {
        let client = Arc::new(MonarchClient::builder().token("t").build().unwrap());
        let registry = monarch_registry(client);

        for schema in registry.list_schemas() {
            let read_only = schema.annotations.unwrap().read_only_hint;
            let is_write = matches!(
                schema.name.as_str(),
                "create_transaction" | "update_transaction" | "refresh_accounts"
            );
            assert_eq!(read_only, !is_write, "{}", schema.name);
            assert_eq!(schema.input_schema["type"], "object");
        }
    }
}
