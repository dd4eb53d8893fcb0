//! Transactions API.

use super::{date_range, PAYLOAD_ERROR_FRAGMENT};
use crate::client::MonarchClient;
use crate::error::MonarchResult;
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{json, Value};

const GET_TRANSACTIONS_LIST: &str = r#"
query GetTransactionsList($offset: Int, $limit: Int, $filters: TransactionFilterInput, $orderBy: TransactionOrdering) {
  allTransactions(filters: $filters) {
    totalCount
    results(offset: $offset, limit: $limit, orderBy: $orderBy) {
      id
      ...TransactionOverviewFields
      __typename
    }
    __typename
  }
  transactionRules {
    id
    __typename
  }
}

fragment TransactionOverviewFields on Transaction {
  id
  amount
  pending
  date
  hideFromReports
  plaidName
  notes
  isRecurring
  reviewStatus
  needsReview
  isSplitTransaction
  createdAt
  updatedAt
  attachments {
    id
    extension
    filename
    originalAssetUrl
    publicId
    sizeBytes
    __typename
  }
  category {
    id
    name
    __typename
  }
  merchant {
    id
    name
    transactionsCount
    __typename
  }
  account {
    id
    displayName
    __typename
  }
  tags {
    id
    name
    color
    order
    __typename
  }
  __typename
}
"#;

const CREATE_TRANSACTION: &str = r#"
mutation Common_CreateTransactionMutation($input: CreateTransactionMutationInput!) {
  createTransaction(input: $input) {
    errors {
      ...PayloadErrorFields
      __typename
    }
    transaction {
      id
      __typename
    }
    __typename
  }
}
"#;

const UPDATE_TRANSACTION: &str = r#"
mutation Web_TransactionDrawerUpdateTransaction($input: UpdateTransactionMutationInput!) {
  updateTransaction(input: $input) {
    transaction {
      id
      amount
      pending
      date
      hideFromReports
      needsReview
      notes
      category {
        id
        name
        __typename
      }
      merchant {
        id
        name
        __typename
      }
      __typename
    }
    errors {
      ...PayloadErrorFields
      __typename
    }
    __typename
  }
}
"#;

/// Filters and paging for [`TransactionsApi::list`].
#[derive(Debug, Clone)]
pub struct TransactionQuery {
    pub limit: u32,
    pub offset: u32,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub search: Option<String>,
    pub account_ids: Vec<String>,
    pub category_ids: Vec<String>,
    pub tag_ids: Vec<String>,
    pub has_attachments: Option<bool>,
    pub has_notes: Option<bool>,
    pub hidden: Option<bool>,
    pub is_split: Option<bool>,
    pub is_recurring: Option<bool>,
    pub imported_from_mint: Option<bool>,
    pub synced_from_institution: Option<bool>,
}

impl Default for TransactionQuery {
    fn default() -> Self {
        Self {
            limit: 100,
            offset: 0,
            start_date: None,
            end_date: None,
            search: None,
            account_ids: Vec::new(),
            category_ids: Vec::new(),
            tag_ids: Vec::new(),
            has_attachments: None,
            has_notes: None,
            hidden: None,
            is_split: None,
            is_recurring: None,
            imported_from_mint: None,
            synced_from_institution: None,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TransactionFilters<'a> {
    search: &'a str,
    categories: &'a [String],
    accounts: &'a [String],
    tags: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    has_attachments: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    has_notes: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hide_from_reports: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_split: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_recurring: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    imported_from_mint: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    synced_from_institution: Option<bool>,
}

impl TransactionQuery {
    /// GraphQL variables for `GetTransactionsList`.
    pub fn variables(&self) -> MonarchResult<Value> {
        let range = date_range(self.start_date, self.end_date)?;

        let filters = TransactionFilters {
            search: self.search.as_deref().unwrap_or(""),
            categories: &self.category_ids,
            accounts: &self.account_ids,
            tags: &self.tag_ids,
            start_date: range.map(|(start, _)| start),
            end_date: range.map(|(_, end)| end),
            has_attachments: self.has_attachments,
            has_notes: self.has_notes,
            hide_from_reports: self.hidden,
            is_split: self.is_split,
            is_recurring: self.is_recurring,
            imported_from_mint: self.imported_from_mint,
            synced_from_institution: self.synced_from_institution,
        };

        Ok(json!({
            "offset": self.offset,
            "limit": self.limit,
            "orderBy": "date",
            "filters": filters,
        }))
    }
}

/// A manual transaction to create.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub date: NaiveDate,
    pub account_id: String,
    pub amount: f64,
    pub merchant_name: String,
    pub category_id: Option<String>,
    pub notes: Option<String>,
    pub update_balance: bool,
}

impl NewTransaction {
    fn variables(&self) -> Value {
        json!({
            "input": {
                "date": self.date,
                "accountId": self.account_id,
                "amount": round_cents(self.amount),
                "merchantName": self.merchant_name,
                "categoryId": self.category_id,
                "notes": self.notes.as_deref().unwrap_or(""),
                "shouldUpdateBalance": self.update_balance,
            }
        })
    }
}

/// Fields to change on an existing transaction. `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct TransactionUpdate {
    pub transaction_id: String,
    pub amount: Option<f64>,
    pub merchant_name: Option<String>,
    pub category_id: Option<String>,
    pub date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub hidden: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateTransactionInput<'a> {
    id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hide_from_reports: Option<bool>,
}

impl TransactionUpdate {
    fn variables(&self) -> Value {
        let input = UpdateTransactionInput {
            id: &self.transaction_id,
            category: self.category_id.as_deref(),
            name: self.merchant_name.as_deref(),
            amount: self.amount.map(round_cents),
            date: self.date,
            notes: self.notes.as_deref(),
            hide_from_reports: self.hidden,
        };
        json!({ "input": input })
    }
}

fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Transactions API for querying and editing transactions.
pub struct TransactionsApi<'a> {
    client: &'a MonarchClient,
}

impl<'a> TransactionsApi<'a> {
    pub(crate) fn new(client: &'a MonarchClient) -> Self {
        Self { client }
    }

    /// Fetch a page of transactions.
    pub async fn list(&self, query: &TransactionQuery) -> MonarchResult<Value> {
        let variables = query.variables()?;
        self.client
            .http
            .graphql("GetTransactionsList", GET_TRANSACTIONS_LIST, &variables)
            .await
    }

    /// Create a manual transaction.
    pub async fn create(&self, transaction: &NewTransaction) -> MonarchResult<Value> {
        let query = format!("{}{}", CREATE_TRANSACTION, PAYLOAD_ERROR_FRAGMENT);
        self.client
            .http
            .graphql(
                "Common_CreateTransactionMutation",
                &query,
                &transaction.variables(),
            )
            .await
    }

    /// Update fields of an existing transaction.
    pub async fn update(&self, update: &TransactionUpdate) -> MonarchResult<Value> {
        let query = format!("{}{}", UPDATE_TRANSACTION, PAYLOAD_ERROR_FRAGMENT);
        self.client
            .http
            .graphql(
                "Web_TransactionDrawerUpdateTransaction",
                &query,
                &update.variables(),
            )
            .await
    }
}
