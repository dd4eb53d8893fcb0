//! Main client for the Monarch API.

use crate::api::*;
use crate::auth::{Credentials, LoginRequest};
use crate::config::{ClientConfig, RetryConfig, DEFAULT_BASE_URL, DEFAULT_USER_AGENT};
use crate::error::{MonarchError, MonarchResult};
use crate::transport::HttpTransport;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use url::Url;

/// Client for the Monarch Money API.
///
/// A client either carries a session token or it does not; logging in
/// returns a new, authenticated client rather than mutating this one.
#[derive(Clone)]
pub struct MonarchClient {
    config: Arc<ClientConfig>,
    pub(crate) http: HttpTransport,
}

impl fmt::Debug for MonarchClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MonarchClient")
            .field("base_url", &self.config.base_url.as_str())
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

impl MonarchClient {
    /// Create a new client builder.
    pub fn builder() -> MonarchClientBuilder {
        MonarchClientBuilder::new()
    }

    fn from_config(config: ClientConfig) -> MonarchResult<Self> {
        let config = Arc::new(config);
        let http = HttpTransport::new(config.clone())?;

        Ok(Self { config, http })
    }

    /// Session token, if this client is authenticated.
    pub fn token(&self) -> Option<&str> {
        self.config.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.config.token.is_some()
    }

    pub fn base_url(&self) -> &Url {
        &self.config.base_url
    }

    /// Copy of this client carrying `token`.
    pub fn with_token(&self, token: impl Into<String>) -> MonarchResult<Self> {
        let mut config = (*self.config).clone();
        config.token = Some(token.into());
        Self::from_config(config)
    }

    /// Log in with a password and, when configured, a TOTP code derived from
    /// the credentials' MFA secret.
    pub async fn login(&self, credentials: &Credentials) -> MonarchResult<Self> {
        let totp = match credentials.mfa_secret {
            Some(ref secret) => Some(secret.current_code()?),
            None => None,
        };
        self.login_with_code(credentials, totp).await
    }

    /// Log in with an explicitly supplied one-time code.
    pub async fn login_with_code(
        &self,
        credentials: &Credentials,
        code: Option<String>,
    ) -> MonarchResult<Self> {
        let request = LoginRequest::new(credentials, code);
        let response = self.http.login(&request).await?;
        info!(mfa = request.totp.is_some(), "Logged in to Monarch");
        self.with_token(response.token)
    }

    /// Get the accounts API.
    pub fn accounts(&self) -> AccountsApi<'_> {
        AccountsApi::new(self)
    }

    /// Get the transactions API.
    pub fn transactions(&self) -> TransactionsApi<'_> {
        TransactionsApi::new(self)
    }

    /// Get the categories API.
    pub fn categories(&self) -> CategoriesApi<'_> {
        CategoriesApi::new(self)
    }

    /// Get the budgets API.
    pub fn budgets(&self) -> BudgetsApi<'_> {
        BudgetsApi::new(self)
    }

    /// Get the goals API.
    pub fn goals(&self) -> GoalsApi<'_> {
        GoalsApi::new(self)
    }

    /// Get the cashflow API.
    pub fn cashflow(&self) -> CashflowApi<'_> {
        CashflowApi::new(self)
    }

    /// Get the investments API.
    pub fn investments(&self) -> InvestmentsApi<'_> {
        InvestmentsApi::new(self)
    }

    /// Get the net worth API.
    pub fn net_worth(&self) -> NetWorthApi<'_> {
        NetWorthApi::new(self)
    }
}

/// Builder for creating a MonarchClient.
pub struct MonarchClientBuilder {
    base_url: String,
    token: Option<String>,
    timeout: Duration,
    retry_config: RetryConfig,
    user_agent: String,
}

impl MonarchClientBuilder {
    /// Create a new builder pointed at the production API.
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            timeout: Duration::from_secs(30),
            retry_config: RetryConfig::default(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// Set the API base URL. Trailing slashes are ignored.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Start from an existing session token.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry configuration.
    pub fn retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Build the client.
    pub fn build(self) -> MonarchResult<MonarchClient> {
        if self.base_url.is_empty() {
            return Err(MonarchError::Config("base_url is required".to_string()));
        }

        let base_url = Url::parse(&self.base_url)?;

        let config = ClientConfig {
            base_url,
            token: self.token,
            timeout: self.timeout,
            retry_config: self.retry_config,
            user_agent: self.user_agent,
        };

        MonarchClient::from_config(config)
    }
}

impl Default for MonarchClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MfaSecret;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> MonarchClient {
        MonarchClient::builder()
            .base_url(server.uri())
            .retry_config(RetryConfig::no_retry())
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_defaults() {
        let client = MonarchClient::builder().build().unwrap();
        assert_eq!(client.base_url().as_str(), "https://api.monarch.com/");
        assert!(!client.is_authenticated());
    }

    #[test]
    fn test_builder_trims_trailing_slash() {
        let client = MonarchClient::builder()
            .base_url("https://example.test/")
            .token("tok")
            .build()
            .unwrap();
        assert_eq!(client.base_url().as_str(), "https://example.test/");
        assert_eq!(client.token(), Some("tok"));
    }

    #[test]
    fn test_builder_rejects_bad_url() {
        assert!(MonarchClient::builder().base_url("not a url").build().is_err());
        assert!(MonarchClient::builder().base_url("").build().is_err());
    }

    #[tokio::test]
    async fn test_login_returns_authenticated_client() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/login/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "fresh"})))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/graphql"))
            .and(header("Authorization", "Token fresh"))
            .and(body_partial_json(json!({"operationName": "GetAccounts"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"data": {"accounts": []}})),
            )
            .mount(&server)
            .await;

        let anonymous = client_for(&server);
        let secret = MfaSecret::parse("GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ").unwrap();
        let creds = Credentials::new("me@example.com", "pw").with_mfa_secret(secret);

        let client = anonymous.login(&creds).await.unwrap();
        assert_eq!(client.token(), Some("fresh"));
        assert!(!anonymous.is_authenticated());

        let accounts = client.accounts().list().await.unwrap();
        assert_eq!(accounts, json!({"accounts": []}));
    }

    #[test]
    fn test_debug_hides_token() {
        let client = MonarchClient::builder().token("secret-token").build().unwrap();
        let debug = format!("{:?}", client);
        assert!(debug.contains("authenticated: true"));
        assert!(!debug.contains("secret-token"));
    }

    #[tokio::test]
    async fn test_read_only_queries_pass_payload_through() {
        let server = MockServer::start().await;
        let payloads = [
            ("GetCategories", json!({"categories": [{"id": "c1", "name": "Rent"}]})),
            ("GetGoals", json!({"goalsV2": [{"id": "g1", "name": "Emergency fund"}]})),
            ("Web_GetPortfolio", json!({"portfolio": {"aggregateHoldings": {"edges": []}}})),
        ];
        for (operation, data) in &payloads {
            Mock::given(method("POST"))
                .and(path("/graphql"))
                .and(body_partial_json(json!({"operationName": operation})))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": data})))
                .expect(1)
                .mount(&server)
                .await;
        }

        let client = client_for(&server).with_token("tok").unwrap();
        assert_eq!(client.categories().list().await.unwrap(), payloads[0].1);
        assert_eq!(client.goals().list().await.unwrap(), payloads[1].1);
        assert_eq!(client.investments().portfolio().await.unwrap(), payloads[2].1);
    }

    #[tokio::test]
    async fn test_unauthenticated_query_fails_fast() {
        let client = MonarchClient::builder()
            .base_url("http://127.0.0.1:9")
            .build()
            .unwrap();
        let err = client.goals().list().await.unwrap_err();
        assert!(matches!(err, MonarchError::NotAuthenticated));
    }
}
