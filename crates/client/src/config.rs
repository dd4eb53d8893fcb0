//! Client settings: API root, session token, timeouts and retry policy.

use std::time::Duration;
use url::Url;

/// Production API host.
pub const DEFAULT_BASE_URL: &str = "https://api.monarch.com";

/// User agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = concat!("monarch-client/", env!("CARGO_PKG_VERSION"));

/// Gateway and rate-limit statuses. A plain 500 from Monarch is a resolver
/// failure and is not retried.
pub const RETRYABLE_STATUSES: [u16; 4] = [429, 502, 503, 504];

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: Url,
    /// `Authorization: Token ...` value once logged in.
    pub token: Option<String>,
    /// Per-request timeout, covering connect through body.
    pub timeout: Duration,
    pub retry_config: RetryConfig,
    pub user_agent: String,
}

impl ClientConfig {
    /// Unauthenticated settings against `base_url`.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            token: None,
            timeout: DEFAULT_TIMEOUT,
            retry_config: RetryConfig::default(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// How transient failures are retried.
///
/// Delays double from `initial_backoff` and never exceed `max_backoff`.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Attempts after the first one.
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub retry_statuses: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(5),
            retry_statuses: RETRYABLE_STATUSES.to_vec(),
        }
    }
}

impl RetryConfig {
    /// Fail on the first error.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Delay before retry number `attempt` (zero based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }

    pub fn retries_status(&self, status: u16) -> bool {
        self.retry_statuses.contains(&status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_points_at_monarch() {
        let config = ClientConfig::new(Url::parse(DEFAULT_BASE_URL).unwrap());

        assert_eq!(config.base_url.as_str(), "https://api.monarch.com/");
        assert_eq!(config.base_url.join("/graphql").unwrap().path(), "/graphql");
        assert!(config.token.is_none());
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn test_only_gateway_and_rate_limit_statuses_retry() {
        let config = RetryConfig::default();

        for status in [429, 502, 503, 504] {
            assert!(config.retries_status(status), "{}", status);
        }
        // Resolver failures, bad credentials and MFA challenges are final.
        for status in [400, 401, 403, 404, 500] {
            assert!(!config.retries_status(status), "{}", status);
        }
    }

    #[test]
    fn test_backoff_doubles_up_to_cap() {
        let config = RetryConfig::default();
        let delays: Vec<u128> = (0..6).map(|a| config.backoff(a).as_millis()).collect();

        assert_eq!(delays, vec![250, 500, 1000, 2000, 4000, 5000]);
        assert_eq!(config.backoff(40), Duration::from_secs(5));
        assert_eq!(config.backoff(u32::MAX), Duration::from_secs(5));
    }

    #[test]
    fn test_no_retry_keeps_status_list() {
        let config = RetryConfig::no_retry();

        assert_eq!(config.max_retries, 0);
        assert_eq!(config.retry_statuses, RETRYABLE_STATUSES.to_vec());
        assert_eq!(RetryConfig::default().max_retries, 2);
    }
}
