//! Transport layer for the Monarch client.

pub mod http;

pub use http::HttpTransport;
