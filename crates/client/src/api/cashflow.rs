//! Cashflow API.

use super::{date_range, month_end, month_start};
use crate::client::MonarchClient;
use crate::error::MonarchResult;
use chrono::NaiveDate;
use serde_json::{json, Value};

const GET_CASHFLOW_PAGE: &str = r#"
query Web_GetCashFlowPage($filters: TransactionFilterInput) {
  byCategory: aggregates(filters: $filters, groupBy: ["category"]) {
    groupBy {
      category {
        id
        name
        group {
          id
          type
          __typename
        }
        __typename
      }
      __typename
    }
    summary {
      sum
      __typename
    }
    __typename
  }
  byCategoryGroup: aggregates(filters: $filters, groupBy: ["categoryGroup"]) {
    groupBy {
      categoryGroup {
        id
        name
        type
        __typename
      }
      __typename
    }
    summary {
      sum
      __typename
    }
    __typename
  }
  byMerchant: aggregates(filters: $filters, groupBy: ["merchant"]) {
    groupBy {
      merchant {
        id
        name
        logoUrl
        __typename
      }
      __typename
    }
    summary {
      sumIncome
      sumExpense
      __typename
    }
    __typename
  }
  summary: aggregates(filters: $filters, fillEmptyValues: true) {
    summary {
      sumIncome
      sumExpense
      savings
      savingsRate
      __typename
    }
    __typename
  }
}
"#;

/// Date range and size for [`CashflowApi::get`]. Without dates the current
/// calendar month is used.
#[derive(Debug, Clone)]
pub struct CashflowQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub limit: u32,
}

impl Default for CashflowQuery {
    fn default() -> Self {
        Self {
            start_date: None,
            end_date: None,
            limit: 100,
        }
    }
}

impl CashflowQuery {
    /// Explicit range, defaulting to the month containing `today`.
    pub fn resolve(&self, today: NaiveDate) -> MonarchResult<(NaiveDate, NaiveDate)> {
        match date_range(self.start_date, self.end_date)? {
            Some(range) => Ok(range),
            None => Ok((month_start(today, 0)?, month_end(today, 0)?)),
        }
    }

    fn variables(&self, today: NaiveDate) -> MonarchResult<Value> {
        let (start, end) = self.resolve(today)?;
        Ok(json!({
            "limit": self.limit,
            "orderBy": "date",
            "filters": {
                "search": "",
                "categories": [],
                "accounts": [],
                "tags": [],
                "startDate": start,
                "endDate": end,
            }
        }))
    }
}

pub struct CashflowApi<'a> {
    client: &'a MonarchClient,
}

impl<'a> CashflowApi<'a> {
    pub(crate) fn new(client: &'a MonarchClient) -> Self {
        Self { client }
    }

    /// Income, expense and savings aggregates for a date range.
    pub async fn get(&self, query: &CashflowQuery) -> MonarchResult<Value> {
        let today = chrono::Local::now().date_naive();
        let variables = query.variables(today)?;
        self.client
            .http
            .graphql("Web_GetCashFlowPage", GET_CASHFLOW_PAGE, &variables)
            .await
    }
}
