// Transaction tools: query with post-fetch filters, create, update

use crate::error::ToolError;
use crate::protocol::ToolSchema;
use crate::tools::registry::{json_result, one_or_many, parse_args, ToolResult};
use crate::tools::{
    json_schema_array, json_schema_boolean, json_schema_date, json_schema_integer,
    json_schema_number, json_schema_object, json_schema_string, Tool, ToolAccess,
};
use chrono::NaiveDate;
use monarch_client::{MonarchClient, NewTransaction, TransactionQuery, TransactionUpdate};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

/// Payload key holding the household's transaction rules.
const RULES_FIELD: &str = "transactionRules";

fn default_limit() -> u32 {
    100
}

/// Tool to list transactions
pub struct GetTransactionsTool {
    client: Arc<MonarchClient>,
}

impl GetTransactionsTool {
    pub fn new(client: Arc<MonarchClient>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GetTransactionsArgs {
    #[serde(default = "default_limit")]
    limit: u32,
    #[serde(default)]
    offset: u32,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    search: Option<String>,
    account_id: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    account_ids: Vec<String>,
    category_id: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    category_ids: Vec<String>,
    tag_id: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    tag_ids: Vec<String>,
    has_attachments: Option<bool>,
    has_notes: Option<bool>,
    hidden: Option<bool>,
    is_split: Option<bool>,
    is_recurring: Option<bool>,
    imported_from_mint: Option<bool>,
    synced_from_institution: Option<bool>,
    merchant_id: Option<String>,
    amount_min: Option<f64>,
    amount_max: Option<f64>,
    #[serde(default)]
    include_transaction_rules: bool,
}

impl GetTransactionsArgs {
    fn query(&self) -> TransactionQuery {
        TransactionQuery {
            limit: self.limit,
            offset: self.offset,
            start_date: self.start_date,
            end_date: self.end_date,
            search: self.search.clone(),
            account_ids: merge_id_filters(&self.account_ids, self.account_id.as_deref()),
            category_ids: merge_id_filters(&self.category_ids, self.category_id.as_deref()),
            tag_ids: merge_id_filters(&self.tag_ids, self.tag_id.as_deref()),
            has_attachments: self.has_attachments,
            has_notes: self.has_notes,
            hidden: self.hidden,
            is_split: self.is_split,
            is_recurring: self.is_recurring,
            imported_from_mint: self.imported_from_mint,
            synced_from_institution: self.synced_from_institution,
        }
    }

    fn post_filter(&self) -> PostFilter {
        PostFilter {
            merchant_id: self.merchant_id.clone(),
            amount_min: self.amount_min,
            amount_max: self.amount_max,
        }
    }
}

/// Union of the plural list and the singular id: plural entries first,
/// empty strings dropped, first occurrence wins.
pub fn merge_id_filters(plural: &[String], singular: Option<&str>) -> Vec<String> {
    let mut merged: Vec<String> = Vec::new();
    for id in plural.iter().map(String::as_str).chain(singular) {
        if !id.is_empty() && !merged.iter().any(|m| m == id) {
            merged.push(id.to_string());
        }
    }
    merged
}

/// In-process filters applied to an already fetched page.
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    pub merchant_id: Option<String>,
    pub amount_min: Option<f64>,
    pub amount_max: Option<f64>,
}

impl PostFilter {
    pub fn is_active(&self) -> bool {
        self.merchant_id.is_some() || self.amount_min.is_some() || self.amount_max.is_some()
    }

    /// Whether a single transaction record passes. Records missing the
    /// filtered field never match.
    pub fn matches(&self, record: &Value) -> bool {
        if let Some(ref merchant_id) = self.merchant_id {
            if record["merchant"]["id"].as_str() != Some(merchant_id.as_str()) {
                return false;
            }
        }

        if self.amount_min.is_none() && self.amount_max.is_none() {
            return true;
        }

        let Some(amount) = record["amount"].as_f64() else {
            return false;
        };
        self.amount_min.map_or(true, |min| amount >= min)
            && self.amount_max.map_or(true, |max| amount <= max)
    }
}

/// Mutable access to the `allTransactions.results` list, if present.
fn results_mut(payload: &mut Value) -> Option<&mut Vec<Value>> {
    payload
        .get_mut("allTransactions")?
        .get_mut("results")?
        .as_array_mut()
}

/// Shape a raw `GetTransactionsList` payload for the caller.
pub fn shape_transactions(
    payload: &mut Value,
    filter: &PostFilter,
    limit: usize,
    include_rules: bool,
) {
    if !include_rules {
        if let Some(object) = payload.as_object_mut() {
            object.remove(RULES_FIELD);
        }
    }

    let Some(results) = results_mut(payload) else {
        return;
    };

    let matched = filter.is_active().then(|| {
        results.retain(|record| filter.matches(record));
        results.len()
    });
    results.truncate(limit);

    if !include_rules {
        for record in results.iter_mut() {
            if let Some(object) = record.as_object_mut() {
                object.remove(RULES_FIELD);
            }
        }
    }

    // The upstream count covers the unfiltered query, so report what matched on this page.
    if let Some(matched) = matched {
        if let Some(total) = payload.pointer_mut("/allTransactions/totalCount") {
            *total = Value::from(matched);
        }
    }
}

#[async_trait::async_trait]
impl Tool for GetTransactionsTool {
    fn schema(&self) -> ToolSchema {
        let ids = json!({"type": "string"});
        ToolSchema::new(
            "get_transactions",
            "Fetch transactions with optional filtering. Merchant and amount filters are applied to the fetched page.",
            json_schema_object(
                json!({
                    "limit": json_schema_integer("Maximum number of transactions to return", 100),
                    "offset": json_schema_integer("Number of transactions to skip", 0),
                    "start_date": json_schema_date("Start date, inclusive; requires end_date"),
                    "end_date": json_schema_date("End date, inclusive; requires start_date"),
                    "search": json_schema_string("Filter by merchant/transaction text (for example, 'YouTube TV')"),
                    "account_id": json_schema_string("Filter by specific account ID"),
                    "account_ids": json_schema_array(ids.clone(), "Filter by one or more account IDs"),
                    "category_id": json_schema_string("Filter by specific category ID"),
                    "category_ids": json_schema_array(ids.clone(), "Filter by one or more category IDs"),
                    "tag_id": json_schema_string("Filter by specific tag ID"),
                    "tag_ids": json_schema_array(ids, "Filter by one or more tag IDs"),
                    "has_attachments": json_schema_boolean("Only transactions with (true) or without (false) attachments"),
                    "has_notes": json_schema_boolean("Only transactions with (true) or without (false) notes"),
                    "hidden": json_schema_boolean("Only transactions hidden from reports (true) or visible (false)"),
                    "is_split": json_schema_boolean("Only split (true) or unsplit (false) transactions"),
                    "is_recurring": json_schema_boolean("Only recurring (true) or non-recurring (false) transactions"),
                    "imported_from_mint": json_schema_boolean("Only transactions imported from Mint"),
                    "synced_from_institution": json_schema_boolean("Only transactions synced from a financial institution"),
                    "merchant_id": json_schema_string("Keep only transactions whose merchant has this ID"),
                    "amount_min": json_schema_number("Keep only transactions with amount >= this value (expenses are negative)"),
                    "amount_max": json_schema_number("Keep only transactions with amount <= this value (expenses are negative)"),
                    "include_transaction_rules": {
                        "type": "boolean",
                        "description": "Include transactionRules in response payload (default false to reduce output size)",
                        "default": false
                    }
                }),
                vec![],
            ),
        )
    }

    async fn execute(&self, arguments: Value) -> ToolResult {
        let args: GetTransactionsArgs = parse_args(arguments)?;

        let mut payload = self.client.transactions().list(&args.query()).await?;
        shape_transactions(
            &mut payload,
            &args.post_filter(),
            args.limit as usize,
            args.include_transaction_rules,
        );

        json_result(&payload)
    }
}

/// Tool to create a manual transaction
pub struct CreateTransactionTool {
    client: Arc<MonarchClient>,
}

impl CreateTransactionTool {
    pub fn new(client: Arc<MonarchClient>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CreateTransactionArgs {
    amount: f64,
    description: String,
    account_id: String,
    date: NaiveDate,
    category_id: Option<String>,
    notes: Option<String>,
    #[serde(default)]
    update_balance: bool,
}

#[async_trait::async_trait]
impl Tool for CreateTransactionTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new(
            "create_transaction",
            "Create a new manual transaction",
            json_schema_object(
                json!({
                    "amount": json_schema_number("Transaction amount (negative for expenses)"),
                    "description": json_schema_string("Transaction description, used as the merchant name"),
                    "account_id": json_schema_string("Account ID for the transaction"),
                    "date": json_schema_date("Transaction date"),
                    "category_id": json_schema_string("Category ID for the transaction"),
                    "notes": json_schema_string("Optional notes for the transaction"),
                    "update_balance": json_schema_boolean("Adjust the account balance by this amount (default false)")
                }),
                vec!["amount", "description", "account_id", "date"],
            ),
        )
    }

    async fn execute(&self, arguments: Value) -> ToolResult {
        let args: CreateTransactionArgs = parse_args(arguments)?;

        if args.description.trim().is_empty() {
            return Err(ToolError::InvalidArguments(
                "description must not be empty".to_string(),
            ));
        }

        let transaction = NewTransaction {
            date: args.date,
            account_id: args.account_id,
            amount: args.amount,
            merchant_name: args.description,
            category_id: args.category_id,
            notes: args.notes,
            update_balance: args.update_balance,
        };

        let result = self.client.transactions().create(&transaction).await?;
        json_result(&result)
    }

    fn access(&self) -> ToolAccess {
        ToolAccess::Write
    }
}

/// Tool to edit an existing transaction
pub struct UpdateTransactionTool {
    client: Arc<MonarchClient>,
}

impl UpdateTransactionTool {
    pub fn new(client: Arc<MonarchClient>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct UpdateTransactionArgs {
    transaction_id: String,
    amount: Option<f64>,
    description: Option<String>,
    category_id: Option<String>,
    date: Option<NaiveDate>,
    notes: Option<String>,
    hidden: Option<bool>,
}

#[async_trait::async_trait]
impl Tool for UpdateTransactionTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new(
            "update_transaction",
            "Update an existing transaction; omitted fields are left unchanged",
            json_schema_object(
                json!({
                    "transaction_id": json_schema_string("ID of the transaction to update"),
                    "amount": json_schema_number("New transaction amount"),
                    "description": json_schema_string("New merchant name"),
                    "category_id": json_schema_string("New category ID"),
                    "date": json_schema_date("New transaction date"),
                    "notes": json_schema_string("New notes for the transaction"),
                    "hidden": json_schema_boolean("Hide the transaction from reports")
                }),
                vec!["transaction_id"],
            ),
        )
    }

    async fn execute(&self, arguments: Value) -> ToolResult {
        let args: UpdateTransactionArgs = parse_args(arguments)?;

        let update = TransactionUpdate {
            transaction_id: args.transaction_id,
            amount: args.amount,
            merchant_name: args.description,
            category_id: args.category_id,
            date: args.date,
            notes: args.notes,
            hidden: args.hidden,
        };

        let result = self.client.transactions().update(&update).await?;
        json_result(&result)
    }

    fn access(&self) -> ToolAccess {
        ToolAccess::Write
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn sample_payload() -> Value {
        json!({
            "allTransactions": {
                "totalCount": 4,
                "results": [
                    {"id": "t1", "amount": -15.0, "merchant": {"id": "m1"}, "transactionRules": [1]},
                    {"id": "t2", "amount": -120.5, "merchant": {"id": "m2"}},
                    {"id": "t3", "amount": 2500.0, "merchant": {"id": "m1"}},
                    {"id": "t4", "amount": -40.0, "merchant": null}
                ]
            },
            "transactionRules": [{"id": "r1"}, {"id": "r2"}]
        })
    }

    fn result_ids(payload: &Value) -> Vec<&str> {
        payload["allTransactions"]["results"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["id"].as_str().unwrap())
            .collect()
    }

    #[test]
    fn test_singular_equals_single_element_plural() {
        assert_eq!(merge_id_filters(&[], Some("a1")), merge_id_filters(&ids(&["a1"]), None));
        assert_eq!(merge_id_filters(&[], Some("a1")), ids(&["a1"]));
    }

    #[test]
    fn test_merge_is_deduplicated_union() {
        assert_eq!(
            merge_id_filters(&ids(&["a", "b", "a", ""]), Some("c")),
            ids(&["a", "b", "c"])
        );
        assert_eq!(merge_id_filters(&ids(&["a", "b"]), Some("a")), ids(&["a", "b"]));
        assert!(merge_id_filters(&[], Some("")).is_empty());
        assert!(merge_id_filters(&[], None).is_empty());
    }

    #[test]
    fn test_args_fold_singular_ids_into_query() {
        let args: GetTransactionsArgs = parse_args(json!({
            "account_id": "a1",
            "category_ids": ["c1"],
            "category_id": "c2",
            "tag_ids": "t1"
        }))
        .unwrap();
        let query = args.query();

        assert_eq!(query.account_ids, ids(&["a1"]));
        assert_eq!(query.category_ids, ids(&["c1", "c2"]));
        assert_eq!(query.tag_ids, ids(&["t1"]));
        assert_eq!(query.limit, 100);
        assert_eq!(query.offset, 0);
        assert!(!args.include_transaction_rules);
    }

    #[test]
    fn test_args_reject_bad_types() {
        assert!(parse_args::<GetTransactionsArgs>(json!({"limit": -1})).is_err());
        assert!(parse_args::<GetTransactionsArgs>(json!({"start_date": "01/02/2024"})).is_err());
        assert!(parse_args::<GetTransactionsArgs>(json!({"unknown": true})).is_err());
    }

    #[test]
    fn test_merchant_filter() {
        let mut payload = sample_payload();
        let filter = PostFilter {
            merchant_id: Some("m1".to_string()),
            ..Default::default()
        };
        shape_transactions(&mut payload, &filter, 100, false);

        assert_eq!(result_ids(&payload), vec!["t1", "t3"]);
        for record in payload["allTransactions"]["results"].as_array().unwrap() {
            assert_eq!(record["merchant"]["id"], "m1");
        }
    }

    #[test]
    fn test_amount_range_is_inclusive() {
        let mut payload = sample_payload();
        let filter = PostFilter {
            amount_min: Some(-120.5),
            amount_max: Some(-15.0),
            ..Default::default()
        };
        shape_transactions(&mut payload, &filter, 100, false);

        assert_eq!(result_ids(&payload), vec!["t1", "t2", "t4"]);
        for record in payload["allTransactions"]["results"].as_array().unwrap() {
            let amount = record["amount"].as_f64().unwrap();
            assert!((-120.5..=-15.0).contains(&amount));
        }
    }

    #[test]
    fn test_total_count_follows_post_filter() {
        let mut payload = sample_payload();
        let filter = PostFilter {
            merchant_id: Some("m1".to_string()),
            ..Default::default()
        };
        shape_transactions(&mut payload, &filter, 1, false);

        assert_eq!(result_ids(&payload), vec!["t1"]);
        assert_eq!(payload["allTransactions"]["totalCount"], 2);

        let mut unfiltered = sample_payload();
        shape_transactions(&mut unfiltered, &PostFilter::default(), 1, false);
        assert_eq!(unfiltered["allTransactions"]["totalCount"], 4);
    }

    #[test]
    fn test_open_ended_amount_bound() {
        let mut payload = sample_payload();
        let filter = PostFilter {
            amount_min: Some(0.0),
            ..Default::default()
        };
        shape_transactions(&mut payload, &filter, 100, true);
        assert_eq!(result_ids(&payload), vec!["t3"]);
    }

    #[test]
    fn test_rules_stripped_by_default() {
        let mut payload = sample_payload();
        shape_transactions(&mut payload, &PostFilter::default(), 100, false);

        assert!(payload.get("transactionRules").is_none());
        for record in payload["allTransactions"]["results"].as_array().unwrap() {
            assert!(record.get("transactionRules").is_none());
        }
        assert_eq!(result_ids(&payload).len(), 4);
    }

    #[test]
    fn test_rules_kept_when_requested() {
        let original = sample_payload();
        let mut payload = original.clone();
        shape_transactions(&mut payload, &PostFilter::default(), 100, true);

        assert_eq!(payload, original);
    }

    #[test]
    fn test_limit_caps_results() {
        let mut payload = sample_payload();
        shape_transactions(&mut payload, &PostFilter::default(), 2, true);
        assert_eq!(result_ids(&payload), vec!["t1", "t2"]);
    }

    #[test]
    fn test_shape_tolerates_unexpected_payload() {
        let mut payload = json!({"something": "else", "transactionRules": []});
        shape_transactions(&mut payload, &PostFilter::default(), 10, false);
        assert_eq!(payload, json!({"something": "else"}));
    }

    #[test]
    fn test_create_args_require_fields() {
        assert!(parse_args::<CreateTransactionArgs>(json!({"amount": 1.0})).is_err());
        let args: CreateTransactionArgs = parse_args(json!({
            "amount": -4.5,
            "description": "Coffee",
            "account_id": "a1",
            "date": "2024-03-01"
        }))
        .unwrap();
        assert!(!args.update_balance);
        assert_eq!(args.date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }
}
