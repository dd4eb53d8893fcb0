//! Savings goals API.

use crate::client::MonarchClient;
use crate::error::MonarchResult;
use serde_json::{json, Value};

const GET_GOALS: &str = r#"
query GetGoals {
  goalsV2 {
    id
    name
    priority
    type
    objective
    archivedAt
    completedAt
    targetDate
    targetAmount
    startingAmount
    currentBalance
    completionPercent
    accountAllocations {
      id
      amount
      currentAmount
      account {
        id
        displayName
        __typename
      }
      __typename
    }
    __typename
  }
}
"#;

pub struct GoalsApi<'a> {
    client: &'a MonarchClient,
}

impl<'a> GoalsApi<'a> {
    pub(crate) fn new(client: &'a MonarchClient) -> Self {
        Self { client }
    }

    /// List savings goals and their account allocations.
    pub async fn list(&self) -> MonarchResult<Value> {
        self.client
            .http
            .graphql("GetGoals", GET_GOALS, &json!({}))
            .await
    }
}
