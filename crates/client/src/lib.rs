//! # Monarch client
//!
//! Async client for the Monarch Money personal-finance API.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use monarch_client::{Credentials, MonarchClient, MonarchResult, SessionStore};
//!
//! #[tokio::main]
//! async fn main() -> MonarchResult<()> {
//!     let store = SessionStore::new("/tmp/monarch");
//!     let anonymous = MonarchClient::builder().build()?;
//!
//!     // Log in and cache the session token
//!     let creds = Credentials::new("me@example.com", "secret");
//!     let client = anonymous.login(&creds).await?;
//!     if let Some(token) = client.token() {
//!         store.save(token)?;
//!     }
//!
//!     let accounts = client.accounts().list().await?;
//!     println!("{}", serde_json::to_string_pretty(&accounts)?);
//!
//!     Ok(())
//! }
//! ```
//!
//! Payloads are returned as [`serde_json::Value`]; their shape is defined by
//! Monarch's GraphQL schema.

pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod session;
pub mod transport;

pub use api::{
    BudgetQuery, CashflowQuery, NetWorthQuery, NewTransaction, TransactionQuery,
    TransactionUpdate,
};
pub use auth::{Credentials, MfaSecret};
pub use client::{MonarchClient, MonarchClientBuilder};
pub use config::{ClientConfig, RetryConfig, DEFAULT_BASE_URL};
pub use error::{MonarchError, MonarchResult};
pub use session::SessionStore;
