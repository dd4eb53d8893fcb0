//! GraphQL operations grouped by domain area.
//!
//! Every call returns the `data` member of the GraphQL response as an opaque
//! [`serde_json::Value`]; payload shapes are owned by Monarch.

pub mod accounts;
pub mod budgets;
pub mod cashflow;
pub mod categories;
pub mod goals;
pub mod investments;
pub mod net_worth;
pub mod transactions;

pub use accounts::AccountsApi;
pub use budgets::{BudgetQuery, BudgetsApi};
pub use cashflow::{CashflowApi, CashflowQuery};
pub use categories::CategoriesApi;
pub use goals::GoalsApi;
pub use investments::InvestmentsApi;
pub use net_worth::{NetWorthApi, NetWorthQuery};
pub use transactions::{NewTransaction, TransactionQuery, TransactionUpdate, TransactionsApi};

use crate::error::{MonarchError, MonarchResult};
use chrono::{Datelike, Months, NaiveDate};

/// Shared error-payload fragment for mutations.
pub(crate) const PAYLOAD_ERROR_FRAGMENT: &str = r#"
fragment PayloadErrorFields on PayloadError {
  fieldErrors {
    field
    messages
    __typename
  }
  message
  code
  __typename
}
"#;

/// Accept either both ends of a range or neither.
pub(crate) fn date_range(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> MonarchResult<Option<(NaiveDate, NaiveDate)>> {
    match (start, end) {
        (Some(start), Some(end)) => Ok(Some((start, end))),
        (None, None) => Ok(None),
        _ => Err(MonarchError::InvalidInput(
            "You must specify both start_date and end_date, not just one of them".to_string(),
        )),
    }
}

/// First day of the month `offset` months away from `date`'s month.
pub(crate) fn month_start(date: NaiveDate, offset: i32) -> MonarchResult<NaiveDate> {
    let first = date
        .with_day(1)
        .ok_or_else(|| out_of_range(date))?;
    let months = Months::new(offset.unsigned_abs());
    let shifted = if offset >= 0 {
        first.checked_add_months(months)
    } else {
        first.checked_sub_months(months)
    };
    shifted.ok_or_else(|| out_of_range(date))
}

/// Last day of the month `offset` months away from `date`'s month.
pub(crate) fn month_end(date: NaiveDate, offset: i32) -> MonarchResult<NaiveDate> {
    month_start(date, offset + 1)?
        .pred_opt()
        .ok_or_else(|| out_of_range(date))
}

fn out_of_range(date: NaiveDate) -> MonarchError {
    MonarchError::InvalidInput(format!("date {} is out of range", date))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_date_range_requires_both_ends() {
        assert!(date_range(Some(d(2024, 1, 1)), None).is_err());
        assert!(date_range(None, Some(d(2024, 1, 31))).is_err());
        assert_eq!(date_range(None, None).unwrap(), None);
        assert_eq!(
            date_range(Some(d(2024, 1, 1)), Some(d(2024, 1, 31))).unwrap(),
            Some((d(2024, 1, 1), d(2024, 1, 31)))
        );
    }

    #[test]
    fn test_month_boundaries() {
        assert_eq!(month_start(d(2024, 3, 15), 0).unwrap(), d(2024, 3, 1));
        assert_eq!(month_start(d(2024, 1, 15), -1).unwrap(), d(2023, 12, 1));
        assert_eq!(month_end(d(2024, 1, 15), 1).unwrap(), d(2024, 2, 29));
        assert_eq!(month_end(d(2024, 12, 2), 1).unwrap(), d(2025, 1, 31));
        assert_eq!(month_end(d(2023, 11, 30), 0).unwrap(), d(2023, 11, 30));
    }
}
