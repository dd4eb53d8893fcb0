// Command-line and environment configuration

use anyhow::{bail, Result};
use clap::Parser;
use monarch_client::{Credentials, MfaSecret, DEFAULT_BASE_URL};
use std::path::PathBuf;

/// Directory name used under the user cache dir for the saved session.
const SESSION_DIR_NAME: &str = "monarch-mcp";

#[derive(Parser, Debug, Clone)]
#[command(name = "monarch-mcp")]
#[command(about = "MCP server exposing Monarch Money accounts, transactions and budgets", long_about = None)]
pub struct Args {
    /// Monarch account email
    #[arg(long, env = "MONARCH_EMAIL")]
    pub email: Option<String>,

    /// Monarch account password
    #[arg(long, env = "MONARCH_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Base32 TOTP seed used to answer the MFA challenge
    #[arg(long, env = "MONARCH_MFA_SECRET", hide_env_values = true)]
    pub mfa_secret: Option<String>,

    /// Ignore any saved session and log in again
    #[arg(
        long,
        env = "MONARCH_FORCE_LOGIN",
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    pub force_login: bool,

    /// Monarch API root
    #[arg(long, env = "MONARCH_API_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub api_base_url: String,

    /// Where the session token is cached
    #[arg(long, env = "MONARCH_SESSION_DIR")]
    pub session_dir: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr
    #[arg(
        long,
        env = "MONARCH_LOG_JSON",
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    pub log_json: bool,
}

/// Resolved runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub credentials: Credentials,
    pub force_login: bool,
    pub api_base_url: String,
    pub session_dir: PathBuf,
}

impl Settings {
    pub fn from_args(args: Args) -> Result<Self> {
        let email = non_empty(args.email).map(|e| e.trim().to_string());
        let password = non_empty(args.password);
        let (Some(email), Some(password)) = (email, password) else {
            bail!("MONARCH_EMAIL and MONARCH_PASSWORD must be set");
        };

        let mut credentials = Credentials::new(email, password);
        if let Some(raw) = non_empty(args.mfa_secret) {
            match MfaSecret::parse(&raw) {
                Some(secret) => credentials = credentials.with_mfa_secret(secret),
                None => tracing::warn!("MONARCH_MFA_SECRET is not valid base32, ignoring it"),
            }
        }

        Ok(Self {
            credentials,
            force_login: args.force_login,
            api_base_url: args.api_base_url.trim_end_matches('/').to_string(),
            session_dir: args.session_dir.unwrap_or_else(default_session_dir),
        })
    }
}

/// `<user cache dir>/monarch-mcp`, falling back to the working directory.
pub fn default_session_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(SESSION_DIR_NAME)
}

/// Drop blank values; the kept value is returned unmodified.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
