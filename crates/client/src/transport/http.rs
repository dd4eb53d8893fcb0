//! HTTP transport layer for the Monarch client.

use crate::auth::{LoginRequest, LoginResponse};
use crate::config::ClientConfig;
use crate::error::{MonarchError, MonarchResult};
use reqwest::{header, Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

const LOGIN_PATH: &str = "/auth/login/";
const GRAPHQL_PATH: &str = "/graphql";

/// GraphQL request envelope.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GraphQlRequest<'a> {
    operation_name: &'a str,
    query: &'a str,
    variables: &'a serde_json::Value,
}

/// GraphQL response envelope.
#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct GraphQlErrorEntry {
    message: String,
}

/// HTTP transport for making API requests.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    config: Arc<ClientConfig>,
}

impl HttpTransport {
    /// Create a new HTTP transport with the given configuration.
    pub fn new(config: Arc<ClientConfig>) -> MonarchResult<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::HeaderName::from_static("client-platform"),
            header::HeaderValue::from_static("web"),
        );
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        if let Some(ref token) = config.token {
            let mut value = header::HeaderValue::from_str(&format!("Token {}", token))
                .map_err(|_| MonarchError::Config("Invalid session token format".to_string()))?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()?;

        Ok(Self { client, config })
    }

    /// Build a URL for the given path.
    fn build_url(&self, path: &str) -> MonarchResult<url::Url> {
        Ok(self.config.base_url.join(path)?)
    }

    /// Execute a request with retries.
    async fn execute_with_retry(&self, request_builder: RequestBuilder) -> MonarchResult<Response> {
        let retry_config = &self.config.retry_config;
        let mut attempts = 0;

        loop {
            let request = request_builder
                .try_clone()
                .ok_or_else(|| MonarchError::Config("Request cannot be cloned".to_string()))?;

            match request.send().await {
                Ok(response) => {
                    let status = response.status().as_u16();

                    if response.status().is_success() {
                        return Ok(response);
                    }

                    if attempts < retry_config.max_retries
                        && retry_config.retries_status(status)
                    {
                        let backoff = retry_config.backoff(attempts);
                        warn!(
                            status = status,
                            attempt = attempts + 1,
                            backoff_ms = backoff.as_millis(),
                            "Request failed, retrying"
                        );
                        tokio::time::sleep(backoff).await;
                        attempts += 1;
                        continue;
                    }

                    let body = response.text().await.unwrap_or_default();
                    return Err(MonarchError::from_response(status, &body));
                }
                Err(e) => {
                    let err = MonarchError::from(e);
                    if attempts < retry_config.max_retries && err.is_retryable() {
                        let backoff = retry_config.backoff(attempts);
                        warn!(
                            error = %err,
                            attempt = attempts + 1,
                            backoff_ms = backoff.as_millis(),
                            "Request could not be sent, retrying"
                        );
                        tokio::time::sleep(backoff).await;
                        attempts += 1;
                        continue;
                    }
                    return Err(err);
                }
            }
        }
    }

    /// Exchange credentials for a session token.
    ///
    /// A 403 means the account wants a one-time code. It maps to
    /// [`MonarchError::MfaRequired`] when the request carried none, and to an
    /// authentication failure when the supplied code was rejected.
    pub async fn login(&self, request: &LoginRequest) -> MonarchResult<LoginResponse> {
        let url = self.build_url(LOGIN_PATH)?;
        debug!(url = %url, mfa = request.totp.is_some(), "POST login");

        match self
            .execute_with_retry(self.client.post(url).json(request))
            .await
        {
            Ok(response) => Ok(response.json().await?),
            Err(MonarchError::Api { status: 403, .. }) if request.totp.is_none() => {
                Err(MonarchError::MfaRequired)
            }
            Err(MonarchError::Api { status, message }) if (400..500).contains(&status) => {
                Err(MonarchError::Authentication(message))
            }
            Err(e) => Err(e),
        }
    }

    /// Run a GraphQL operation and return its `data` member.
    pub async fn graphql<T: DeserializeOwned>(
        &self,
        operation: &str,
        query: &str,
        variables: &serde_json::Value,
    ) -> MonarchResult<T> {
        if self.config.token.is_none() {
            return Err(MonarchError::NotAuthenticated);
        }

        let url = self.build_url(GRAPHQL_PATH)?;
        debug!(url = %url, operation = operation, "GraphQL request");

        let body = GraphQlRequest {
            operation_name: operation,
            query,
            variables,
        };

        let response = match self
            .execute_with_retry(self.client.post(url).json(&body))
            .await
        {
            Ok(response) => response,
            Err(MonarchError::Api { status: 401, message }) => {
                return Err(MonarchError::Authentication(message))
            }
            Err(e) => return Err(e),
        };

        let envelope: GraphQlResponse<T> = response.json().await?;

        if !envelope.errors.is_empty() {
            return Err(MonarchError::GraphQl {
                operation: operation.to_string(),
                messages: envelope.errors.into_iter().map(|e| e.message).collect(),
            });
        }

        envelope.data.ok_or_else(|| MonarchError::GraphQl {
            operation: operation.to_string(),
            messages: vec!["response contained no data".to_string()],
        })
    }
}
