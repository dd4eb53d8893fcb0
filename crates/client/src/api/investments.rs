//! Investments API.

use crate::client::MonarchClient;
use crate::error::MonarchResult;
use serde_json::{json, Value};

const GET_PORTFOLIO: &str = r#"
query Web_GetPortfolio($portfolioInput: PortfolioInput) {
  portfolio(input: $portfolioInput) {
    performance {
      totalValue
      totalBasis
      totalChangePercent
      totalChangeDollars
      oneDayChangePercent
      historicalChart {
        date
        returnPercent
        __typename
      }
      __typename
    }
    aggregateHoldings {
      edges {
        node {
          id
          quantity
          basis
          totalValue
          securityPriceChangeDollars
          securityPriceChangePercent
          lastSyncedAt
          holdings {
            id
            type
            typeDisplay
            name
            ticker
            closingPrice
            closingPriceUpdatedAt
            quantity
            value
            isManual
            account {
              id
              displayName
              __typename
            }
            __typename
          }
          security {
            id
            name
            type
            typeDisplay
            ticker
            currentPrice
            currentPriceUpdatedAt
            closingPrice
            oneDayChangePercent
            oneDayChangeDollars
            __typename
          }
          __typename
        }
        __typename
      }
      __typename
    }
    __typename
  }
}
"#;

/// Investments API.
pub struct InvestmentsApi<'a> {
    client: &'a MonarchClient,
}

impl<'a> InvestmentsApi<'a> {
    pub(crate) fn new(client: &'a MonarchClient) -> Self {
        Self { client }
    }

    /// Portfolio performance and holdings aggregated across accounts.
    pub async fn portfolio(&self) -> MonarchResult<Value> {
        self.client
            .http
            .graphql(
                "Web_GetPortfolio",
                GET_PORTFOLIO,
                &json!({ "portfolioInput": {} }),
            )
            .await
    }
}
