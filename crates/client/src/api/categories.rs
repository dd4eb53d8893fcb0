//! Transaction categories API.

use crate::client::MonarchClient;
use crate::error::MonarchResult;
use serde_json::{json, Value};

const GET_CATEGORIES: &str = r#"
query GetCategories {
  categories {
    ...CategoryFields
    __typename
  }
}

fragment CategoryFields on Category {
  id
  order
  name
  icon
  systemCategory
  isSystemCategory
  isDisabled
  updatedAt
  createdAt
  group {
    id
    name
    type
    __typename
  }
  __typename
}
"#;

/// Categories API.
pub struct CategoriesApi<'a> {
    client: &'a MonarchClient,
}

impl<'a> CategoriesApi<'a> {
    pub(crate) fn new(client: &'a MonarchClient) -> Self {
        Self { client }
    }

    /// List every transaction category with its group.
    pub async fn list(&self) -> MonarchResult<Value> {
        self.client
            .http
            .graphql("GetCategories", GET_CATEGORIES, &json!({}))
            .await
    }
}
