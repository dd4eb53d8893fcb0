//! Accounts API.

use super::PAYLOAD_ERROR_FRAGMENT;
use crate::client::MonarchClient;
use crate::error::MonarchResult;
use serde_json::{json, Value};

const GET_ACCOUNTS: &str = r#"
query GetAccounts {
  accounts {
    ...AccountFields
    __typename
  }
  householdPreferences {
    id
    accountGroupOrder
    __typename
  }
}

fragment AccountFields on Account {
  id
  displayName
  syncDisabled
  deactivatedAt
  isHidden
  isAsset
  mask
  createdAt
  updatedAt
  displayLastUpdatedAt
  currentBalance
  displayBalance
  includeInNetWorth
  hideFromList
  hideTransactionsFromReports
  includeBalanceInNetWorth
  includeInGoalBalance
  dataProvider
  dataProviderAccountId
  isManual
  transactionsCount
  holdingsCount
  manualInvestmentsTrackingMethod
  order
  logoUrl
  type {
    name
    display
    __typename
  }
  subtype {
    name
    display
    __typename
  }
  credential {
    id
    updateRequired
    disconnectedFromDataProviderAt
    dataProvider
    institution {
      id
      plaidInstitutionId
      name
      status
      __typename
    }
    __typename
  }
  institution {
    id
    name
    primaryColor
    url
    __typename
  }
  __typename
}
"#;

const FORCE_REFRESH_ACCOUNTS: &str = r#"
mutation Common_ForceRefreshAccountsMutation($input: ForceRefreshAccountsInput!) {
  forceRefreshAccounts(input: $input) {
    success
    errors {
      ...PayloadErrorFields
      __typename
    }
    __typename
  }
}
"#;

/// Accounts API for listing and refreshing linked accounts.
pub struct AccountsApi<'a> {
    client: &'a MonarchClient,
}

impl<'a> AccountsApi<'a> {
    pub(crate) fn new(client: &'a MonarchClient) -> Self {
        Self { client }
    }

    /// List all linked accounts.
    pub async fn list(&self) -> MonarchResult<Value> {
        self.client
            .http
            .graphql("GetAccounts", GET_ACCOUNTS, &json!({}))
            .await
    }

    /// Ids of every account returned by [`list`](Self::list).
    pub async fn ids(&self) -> MonarchResult<Vec<String>> {
        Ok(account_ids(&self.list().await?))
    }

    /// Ask Monarch to re-sync the given accounts with their institutions.
    pub async fn refresh(&self, account_ids: &[String]) -> MonarchResult<Value> {
        let query = format!("{}{}", FORCE_REFRESH_ACCOUNTS, PAYLOAD_ERROR_FRAGMENT);
        let variables = json!({ "input": { "accountIds": account_ids } });
        self.client
            .http
            .graphql("Common_ForceRefreshAccountsMutation", &query, &variables)
            .await
    }
}

fn account_ids(payload: &Value) -> Vec<String> {
    payload["accounts"]
        .as_array()
        .map(|accounts| {
            accounts
                .iter()
                .filter_map(|a| a["id"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_ids() {
        let payload = json!({
            "accounts": [{"id": "1"}, {"id": "2"}, {"displayName": "no id"}]
        });
        assert_eq!(account_ids(&payload), vec!["1".to_string(), "2".to_string()]);
        assert!(account_ids(&json!({})).is_empty());
    }
}
