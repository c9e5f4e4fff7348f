use converge::IntervalStrategy;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use super::common::{ApiErrorDetails, ApiErrorResponse, ApiResponse};
use super::error::ApiError;

/// Proxmox API client
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.inner.base_url)
            .finish_non_exhaustive()
    }
}

struct ClientInner {
    http_client: reqwest::Client,
    base_url: String,
    auth_header: String,
    retry_config: RetryConfig,
}

/// Transport-level retry of single requests
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub backoff: IntervalStrategy,
    pub timeout: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: IntervalStrategy::exponential(
                Duration::from_millis(100),
                Duration::from_secs(10),
            ),
            timeout: Duration::from_secs(30),
        }
    }
}

impl RetryConfig {
    /// Single attempt per request; retries are left to the caller
    pub fn no_retries() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }
}

impl Client {
    /// Create a new API client with default configuration
    pub fn new(endpoint: &str, api_token: &str, insecure: bool) -> Result<Self, ApiError> {
        Self::with_config(endpoint, api_token, insecure, RetryConfig::default())
    }

    /// Create a new API client with custom retry configuration
    pub fn with_config(
        endpoint: &str,
        api_token: &str,
        insecure: bool,
        retry_config: RetryConfig,
    ) -> Result<Self, ApiError> {
        retry_config.backoff.validate()?;

        let http_client = reqwest::Client::builder()
            .danger_accept_invalid_certs(insecure)
            .timeout(retry_config.timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;

        let base_url = endpoint.trim_end_matches('/').to_string();
        let auth_header = format!("PVEAPIToken={}", api_token);

        Ok(Self {
            inner: Arc::new(ClientInner {
                http_client,
                base_url,
                auth_header,
                retry_config,
            }),
        })
    }

    /// Same connection and credentials, one attempt per request. For
    /// callers that retry whole operations themselves.
    pub fn without_retries(&self) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                http_client: self.inner.http_client.clone(),
                base_url: self.inner.base_url.clone(),
                auth_header: self.inner.auth_header.clone(),
                retry_config: RetryConfig {
                    max_retries: 0,
                    ..self.inner.retry_config.clone()
                },
            }),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Execute a GET request with retry logic
    pub async fn get<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T, ApiError> {
        self.execute_with_retry(
            || async {
                let url = format!("{}{}", self.inner.base_url, path);

                tracing::debug!("GET request to: {}", url);

                self.inner
                    .http_client
                    .get(&url)
                    .header(AUTHORIZATION, &self.inner.auth_header)
                    .send()
                    .await
            },
            path,
        )
        .await
    }

    /// Execute a POST request with retry logic
    pub async fn post<T: for<'de> Deserialize<'de>, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.execute_with_retry(
            || async {
                let url = format!("{}{}", self.inner.base_url, path);

                tracing::debug!("POST request to: {}", url);

                self.inner
                    .http_client
                    .post(&url)
                    .header(AUTHORIZATION, &self.inner.auth_header)
                    .json(body)
                    .send()
                    .await
            },
            path,
        )
        .await
    }

    /// Execute a DELETE request with retry logic
    pub async fn delete<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T, ApiError> {
        self.execute_with_retry(
            || async {
                let url = format!("{}{}", self.inner.base_url, path);

                tracing::debug!("DELETE request to: {}", url);

                self.inner
                    .http_client
                    .delete(&url)
                    .header(AUTHORIZATION, &self.inner.auth_header)
                    .send()
                    .await
            },
            path,
        )
        .await
    }

    /// Nodes API operations
    pub fn nodes(&self) -> crate::api::nodes::NodesApi<'_> {
        crate::api::nodes::NodesApi::new(self)
    }

    /// Execute request with retry logic
    async fn execute_with_retry<F, Fut, T>(&self, request_fn: F, path: &str) -> Result<T, ApiError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<reqwest::Response, reqwest::Error>>,
        T: for<'de> Deserialize<'de>,
    {
        let retry_config = &self.inner.retry_config;
        let mut attempt = 0;
        let mut last_error = None;

        while attempt <= retry_config.max_retries {
            if attempt > 0 {
                let backoff = self.backoff(attempt);
                tracing::debug!(
                    "Retrying request to {} after {:?} (attempt {})",
                    path,
                    backoff,
                    attempt
                );
                tokio::time::sleep(backoff).await;
            }

            match request_fn().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return self.parse_success_response(response).await;
                    }

                    if status == reqwest::StatusCode::UNAUTHORIZED {
                        return Err(ApiError::AuthError);
                    }

                    if status == reqwest::StatusCode::NOT_FOUND {
                        return Err(ApiError::NotFound(path.to_string()));
                    }

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        last_error = Some(ApiError::RateLimited);
                    } else if status.is_server_error() {
                        // Missing guests and nodes are reported as 500
                        let text = response.text().await.unwrap_or_default();
                        if is_missing_resource(&text) {
                            return Err(ApiError::NotFound(path.to_string()));
                        }
                        tracing::debug!("Server error {} from {}: {}", status, path, text);
                        last_error = Some(ApiError::ServiceUnavailable);
                    } else {
                        return self.handle_error_response(response).await;
                    }
                }
                Err(e) => {
                    if e.is_timeout() {
                        last_error = Some(ApiError::Timeout(retry_config.timeout.as_secs()));
                    } else if e.is_connect() || e.is_request() {
                        last_error = Some(ApiError::ServiceUnavailable);
                    } else {
                        return Err(ApiError::RequestError(e));
                    }
                }
            }

            attempt += 1;
        }

        Err(last_error.unwrap_or(ApiError::ServiceUnavailable))
    }

    fn backoff(&self, attempt: u32) -> Duration {
        self.inner
            .retry_config
            .backoff
            .next(attempt, &mut rand::thread_rng())
    }

    /// Parse successful response
    async fn parse_success_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let text = response.text().await?;
        tracing::debug!("API response body: {}", text);

        match serde_json::from_str::<ApiResponse<T>>(&text) {
            Ok(wrapper) => Ok(wrapper.data),
            Err(_) => match serde_json::from_str::<T>(&text) {
                Ok(data) => Ok(data),
                Err(e) => {
                    tracing::error!("Failed to deserialize response: {}, body: {}", e, text);
                    Err(ApiError::ParseError(format!(
                        "Failed to parse response: {}",
                        e
                    )))
                }
            },
        }
    }

    /// Handle error response
    async fn handle_error_response<T>(&self, response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        let details = serde_json::from_str::<ApiErrorResponse>(&text)
            .ok()
            .map(|err_resp| {
                Box::new(ApiErrorDetails {
                    message: err_resp.message,
                    field_errors: err_resp.errors,
                })
            });

        Err(ApiError::ApiError {
            status,
            message: text,
            details,
        })
    }
}

fn is_missing_resource(body: &str) -> bool {
    body.contains("does not exist") || body.contains("not found")
}
