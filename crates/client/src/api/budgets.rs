//! Budgets API.
//!
//! Uses a trimmed budget query that leaves out the top-level fields Monarch
//! currently fails on, then merges category and group names from the
//! categories query into the per-category rows. When the trimmed query
//! fails, the full planning query is tried before giving up.

use super::{date_range, month_end, month_start};
use crate::client::MonarchClient;
use crate::error::{MonarchError, MonarchResult};
use chrono::NaiveDate;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use tracing::{debug, warn};

const GET_BUDGET_DATA_LITE: &str = r#"
query GetBudgetDataLite($startDate: Date!, $endDate: Date!) {
  budgetData(startMonth: $startDate, endMonth: $endDate) {
    monthlyAmountsByCategory {
      category {
        id
        __typename
      }
      monthlyAmounts {
        ...BudgetMonthlyAmountFields
        plannedSetAsideAmount
        __typename
      }
      __typename
    }
    monthlyAmountsByCategoryGroup {
      categoryGroup {
        id
        __typename
      }
      monthlyAmounts {
        ...BudgetMonthlyAmountFields
        __typename
      }
      __typename
    }
    monthlyAmountsForFlexExpense {
      budgetVariability
      monthlyAmounts {
        ...BudgetMonthlyAmountFields
        __typename
      }
      __typename
    }
    totalsByMonth {
      month
      totalIncome {
        ...BudgetTotalFields
      }
      totalExpenses {
        ...BudgetTotalFields
      }
      totalFixedExpenses {
        ...BudgetTotalFields
      }
      totalNonMonthlyExpenses {
        ...BudgetTotalFields
      }
      totalFlexibleExpenses {
        ...BudgetTotalFields
      }
      __typename
    }
    __typename
  }
}

fragment BudgetMonthlyAmountFields on BudgetMonthlyAmounts {
  month
  plannedCashFlowAmount
  actualAmount
  remainingAmount
  previousMonthRolloverAmount
  rolloverType
}

fragment BudgetTotalFields on BudgetTotals {
  plannedAmount
  actualAmount
  remainingAmount
  previousMonthRolloverAmount
  __typename
}
"#;

/// Full planning query, tried when the lite query fails.
const GET_JOINT_PLANNING_DATA: &str = r#"
query Common_GetJointPlanningData($startDate: Date!, $endDate: Date!) {
  budgetSystem
  budgetData(startMonth: $startDate, endMonth: $endDate) {
    monthlyAmountsByCategory {
      category {
        id
        name
        __typename
      }
      monthlyAmounts {
        ...BudgetMonthlyAmountFields
        __typename
      }
      __typename
    }
    monthlyAmountsByCategoryGroup {
      categoryGroup {
        id
        name
        __typename
      }
      monthlyAmounts {
        ...BudgetMonthlyAmountFields
        __typename
      }
      __typename
    }
    monthlyAmountsForFlexExpense {
      budgetVariability
      monthlyAmounts {
        ...BudgetMonthlyAmountFields
        __typename
      }
      __typename
    }
    totalsByMonth {
      month
      totalIncome {
        ...BudgetTotalFields
      }
      totalExpenses {
        ...BudgetTotalFields
      }
      totalFixedExpenses {
        ...BudgetTotalFields
      }
      totalNonMonthlyExpenses {
        ...BudgetTotalFields
      }
      totalFlexibleExpenses {
        ...BudgetTotalFields
      }
      __typename
    }
    __typename
  }
  categoryGroups {
    id
    name
    order
    type
    budgetVariability
    groupLevelBudgetingEnabled
    categories {
      id
      name
      icon
      order
      budgetVariability
      excludeFromBudget
      isSystemCategory
      __typename
    }
    __typename
  }
  goalsV2 {
    id
    name
    archivedAt
    completedAt
    priority
    __typename
  }
}

fragment BudgetMonthlyAmountFields on BudgetMonthlyAmounts {
  month
  plannedCashFlowAmount
  actualAmount
  remainingAmount
  previousMonthRolloverAmount
  rolloverType
}

fragment BudgetTotalFields on BudgetTotals {
  plannedAmount
  actualAmount
  remainingAmount
  previousMonthRolloverAmount
  __typename
}
"#;

/// Monarch's answer when an account has never set up a budget.
const NO_BUDGET_MARKER: &str = "Something went wrong while processing: None";

/// Month range for [`BudgetsApi::get`].
#[derive(Debug, Clone, Default)]
pub struct BudgetQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl BudgetQuery {
    /// Explicit range, defaulting to the start of last month through the end
    /// of next month.
    pub fn resolve(&self, today: NaiveDate) -> MonarchResult<(NaiveDate, NaiveDate)> {
        match date_range(self.start_date, self.end_date)? {
            Some(range) => Ok(range),
            None => Ok((month_start(today, -1)?, month_end(today, 1)?)),
        }
    }
}

/// Budgets API.
pub struct BudgetsApi<'a> {
    client: &'a MonarchClient,
}

impl<'a> BudgetsApi<'a> {
    pub(crate) fn new(client: &'a MonarchClient) -> Self {
        Self { client }
    }

    /// Planned and actual amounts per category, group and month.
    pub async fn get(&self, query: &BudgetQuery) -> MonarchResult<Value> {
        let today = chrono::Local::now().date_naive();
        let (start, end) = query.resolve(today)?;
        let variables = json!({ "startDate": start, "endDate": end });

        let lite_error = match self
            .client
            .http
            .graphql::<Value>("GetBudgetDataLite", GET_BUDGET_DATA_LITE, &variables)
            .await
        {
            Ok(payload) => return Ok(self.enriched(payload, start, end).await),
            Err(e) => e,
        };

        warn!(error = %lite_error, "Lite budget query failed, trying full planning query");
        match self
            .client
            .http
            .graphql::<Value>("Common_GetJointPlanningData", GET_JOINT_PLANNING_DATA, &variables)
            .await
        {
            Ok(payload) => Ok(payload),
            Err(full_error) if is_no_budget(&lite_error) && is_no_budget(&full_error) => {
                debug!("No budget configured for this household");
                Ok(json!({
                    "budgets": [],
                    "message": "No budgets configured in your Monarch Money account"
                }))
            }
            Err(full_error) => Err(full_error),
        }
    }

    /// Lite payload with category names merged in.
    async fn enriched(&self, payload: Value, start: NaiveDate, end: NaiveDate) -> Value {
        let mut budget_data = payload
            .get("budgetData")
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()));

        match self.client.categories().list().await {
            Ok(categories) => enrich_budget_data(&mut budget_data, &categories),
            Err(e) => warn!(error = %e, "Category lookup failed, returning budget without names"),
        }

        json!({
            "startDate": start,
            "endDate": end,
            "budgetData": budget_data,
            "source": "GetBudgetDataLite",
        })
    }
}

fn is_no_budget(error: &MonarchError) -> bool {
    error.to_string().contains(NO_BUDGET_MARKER)
}

/// Merge category/group names into budget rows that only carry ids.
fn enrich_budget_data(budget_data: &mut Value, categories: &Value) {
    let mut categories_by_id: HashMap<&str, Value> = HashMap::new();
    let mut groups_by_id: HashMap<&str, Value> = HashMap::new();

    for category in categories["categories"].as_array().into_iter().flatten() {
        let group = &category["group"];
        let group_meta = json!({
            "id": group["id"],
            "name": group["name"],
            "type": group["type"],
        });

        if let Some(id) = category["id"].as_str() {
            categories_by_id.insert(
                id,
                json!({ "name": category["name"], "group": group_meta }),
            );
        }
        if let Some(group_id) = group["id"].as_str() {
            groups_by_id.entry(group_id).or_insert_with(|| {
                json!({ "name": group["name"], "type": group["type"] })
            });
        }
    }

    merge_meta(budget_data, "monthlyAmountsByCategory", "category", &categories_by_id);
    merge_meta(
        budget_data,
        "monthlyAmountsByCategoryGroup",
        "categoryGroup",
        &groups_by_id,
    );
}

fn merge_meta(budget_data: &mut Value, rows_key: &str, ref_key: &str, meta: &HashMap<&str, Value>) {
    let Some(rows) = budget_data.get_mut(rows_key).and_then(Value::as_array_mut) else {
        return;
    };

    for row in rows {
        let Some(reference) = row.get_mut(ref_key).and_then(Value::as_object_mut) else {
            continue;
        };
        let Some(extra) = reference
            .get("id")
            .and_then(Value::as_str)
            .and_then(|id| meta.get(id))
            .and_then(Value::as_object)
        else {
            continue;
        };
        for (key, value) in extra {
            reference.insert(key.clone(), value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryConfig;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_default_range_spans_three_months() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let (start, end) = BudgetQuery::default().resolve(today).unwrap();
        assert_eq!(start.to_string(), "2023-12-01");
        assert_eq!(end.to_string(), "2024-02-29");
    }

    #[test]
    fn test_default_range_year_end() {
        let today = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let (start, end) = BudgetQuery::default().resolve(today).unwrap();
        assert_eq!(start.to_string(), "2024-11-01");
        assert_eq!(end.to_string(), "2025-01-31");
    }

    #[test]
    fn test_enrich_budget_data() {
        let categories = json!({
            "categories": [
                {"id": "c1", "name": "Groceries", "group": {"id": "g1", "name": "Food", "type": "expense"}},
                {"id": "c2", "name": "Dining", "group": {"id": "g1", "name": "Food", "type": "expense"}}
            ]
        });
        let mut data = json!({
            "monthlyAmountsByCategory": [
                {"category": {"id": "c1", "__typename": "Category"}, "monthlyAmounts": []},
                {"category": {"id": "unknown"}, "monthlyAmounts": []}
            ],
            "monthlyAmountsByCategoryGroup": [
                {"categoryGroup": {"id": "g1"}, "monthlyAmounts": []}
            ]
        });

        enrich_budget_data(&mut data, &categories);

        let first = &data["monthlyAmountsByCategory"][0]["category"];
        assert_eq!(first["name"], "Groceries");
        assert_eq!(first["group"]["name"], "Food");
        assert_eq!(first["__typename"], "Category");

        let unknown = &data["monthlyAmountsByCategory"][1]["category"];
        assert!(unknown.get("name").is_none());

        let group = &data["monthlyAmountsByCategoryGroup"][0]["categoryGroup"];
        assert_eq!(group["name"], "Food");
        assert_eq!(group["type"], "expense");
    }

    fn client(server: &MockServer) -> MonarchClient {
        MonarchClient::builder()
            .base_url(server.uri())
            .token("t")
            .retry_config(RetryConfig::no_retry())
            .build()
            .unwrap()
    }

    async fn mock_operation(server: &MockServer, operation: &str, response: ResponseTemplate) {
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .and(body_partial_json(json!({ "operationName": operation })))
            .respond_with(response)
            .mount(server)
            .await;
    }

    fn graphql_error(message: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "data": null,
            "errors": [{ "message": message }]
        }))
    }

    #[tokio::test]
    async fn test_lite_query_is_enriched() {
        let server = MockServer::start().await;
        mock_operation(
            &server,
            "GetBudgetDataLite",
            ResponseTemplate::new(200).set_body_json(json!({"data": {"budgetData": {
                "monthlyAmountsByCategory": [{"category": {"id": "c1"}, "monthlyAmounts": []}]
            }}})),
        )
        .await;
        mock_operation(
            &server,
            "GetCategories",
            ResponseTemplate::new(200).set_body_json(json!({"data": {"categories": [
                {"id": "c1", "name": "Rent", "group": {"id": "g1", "name": "Housing", "type": "expense"}}
            ]}})),
        )
        .await;

        let query = BudgetQuery {
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            end_date: NaiveDate::from_ymd_opt(2024, 3, 31),
        };
        let budgets = client(&server).budgets().get(&query).await.unwrap();

        assert_eq!(budgets["source"], "GetBudgetDataLite");
        assert_eq!(budgets["startDate"], "2024-01-01");
        assert_eq!(
            budgets["budgetData"]["monthlyAmountsByCategory"][0]["category"]["name"],
            "Rent"
        );
    }

    #[tokio::test]
    async fn test_falls_back_to_full_query() {
        let server = MockServer::start().await;
        mock_operation(&server, "GetBudgetDataLite", graphql_error("Cannot query field")).await;
        let full = json!({"budgetSystem": "category", "budgetData": {"totalsByMonth": []}});
        mock_operation(
            &server,
            "Common_GetJointPlanningData",
            ResponseTemplate::new(200).set_body_json(json!({"data": full.clone()})),
        )
        .await;

        let budgets = client(&server)
            .budgets()
            .get(&BudgetQuery::default())
            .await
            .unwrap();
        assert_eq!(budgets, full);
    }

    #[tokio::test]
    async fn test_no_budget_needs_both_queries_to_report_it() {
        let server = MockServer::start().await;
        mock_operation(&server, "GetBudgetDataLite", graphql_error(NO_BUDGET_MARKER)).await;
        mock_operation(&server, "Common_GetJointPlanningData", graphql_error(NO_BUDGET_MARKER))
            .await;

        let budgets = client(&server)
            .budgets()
            .get(&BudgetQuery::default())
            .await
            .unwrap();
        assert_eq!(budgets["budgets"], json!([]));
        assert_eq!(
            budgets["message"],
            "No budgets configured in your Monarch Money account"
        );
    }

    #[tokio::test]
    async fn test_full_query_error_is_returned() {
        let server = MockServer::start().await;
        mock_operation(&server, "GetBudgetDataLite", graphql_error(NO_BUDGET_MARKER)).await;
        mock_operation(
            &server,
            "Common_GetJointPlanningData",
            ResponseTemplate::new(500).set_body_string("boom"),
        )
        .await;

        let err = client(&server)
            .budgets()
            .get(&BudgetQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, MonarchError::Api { status: 500, .. }));
    }

    #[test]
    fn test_enrich_tolerates_missing_sections() {
        let mut data = json!({});
        enrich_budget_data(&mut data, &json!({"categories": []}));
        assert_eq!(data, json!({}));
    }
}
