//! Model Context Protocol server for Monarch Money.
//!
//! Exposes accounts, transactions, budgets and related data from the
//! `monarch-client` crate as MCP tools over stdio.

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod protocol;
pub mod server;
pub mod tools;

pub use server::McpServer;
