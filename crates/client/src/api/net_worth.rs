//! Net worth history API.

use crate::client::MonarchClient;
use crate::error::MonarchResult;
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{json, Value};

const GET_AGGREGATE_SNAPSHOTS: &str = r#"
query GetAggregateSnapshots($filters: AggregateSnapshotFilters) {
  aggregateSnapshots(filters: $filters) {
    date
    balance
    __typename
  }
}
"#;

/// Optional bounds for [`NetWorthApi::snapshots`].
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetWorthQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_type: Option<String>,
}

pub struct NetWorthApi<'a> {
    client: &'a MonarchClient,
}

impl<'a> NetWorthApi<'a> {
    pub(crate) fn new(client: &'a MonarchClient) -> Self {
        Self { client }
    }

    /// Daily aggregate balance across accounts included in net worth.
    pub async fn snapshots(&self, query: &NetWorthQuery) -> MonarchResult<Value> {
        self.client
            .http
            .graphql(
                "GetAggregateSnapshots",
                GET_AGGREGATE_SNAPSHOTS,
                &json!({ "filters": query }),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filters_skip_unset_fields() {
        assert_eq!(serde_json::to_value(NetWorthQuery::default()).unwrap(), json!({}));

        let query = NetWorthQuery {
            start_date: NaiveDate::from_ymd_opt(2023, 1, 1),
            account_type: Some("brokerage".to_string()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(query).unwrap(),
            json!({"startDate": "2023-01-01", "accountType": "brokerage"})
        );
    }
}
