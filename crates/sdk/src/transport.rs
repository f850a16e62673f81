//! HTTP transport layer for the Toolbus SDK.

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use reqwest::{header, Client, Response};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// HTTP transport that applies the client's retry and timeout policy.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    config: Arc<ClientConfig>,
}

impl HttpTransport {
    /// Create a new HTTP transport with the given configuration.
    ///
    /// The underlying client carries no global timeout; unary attempts are
    /// bounded per request so that streaming bodies can outlive the per
    /// attempt budget.
    pub fn new(config: Arc<ClientConfig>) -> ClientResult<Self> {
        let client = Client::builder().build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.server_url.as_str().trim_end_matches('/'),
            path
        )
    }

    /// Execute a POST with retries and exponential backoff.
    ///
    /// Up to `retries` attempts total; only retryable failures consume the
    /// ladder, and the last observed error surfaces after exhaustion.
    pub async fn post_with_retry<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let url = self.endpoint(path);
        let attempts = self.config.retries.max(1);
        let mut last_error = None;

        for attempt in 0..attempts {
            debug!(url = %url, attempt = attempt + 1, "POST request");
            match self.try_post(&url, body).await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    let retryable = err.is_retryable();
                    last_error = Some(err);
                    if !retryable {
                        break;
                    }
                    if attempt + 1 < attempts {
                        let backoff = self.config.retry.backoff_for_attempt(attempt);
                        warn!(
                            url = %url,
                            attempt = attempt + 1,
                            backoff_ms = backoff.as_millis() as u64,
                            "Request failed, retrying"
                        );
                        tokio::time::sleep(backoff).await;
                    }
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| ClientError::Config("retries must be at least 1".to_string())))
    }

    async fn try_post<T: DeserializeOwned, B: Serialize>(
        &self,
        url: &str,
        body: &B,
    ) -> ClientResult<T> {
        let response = self
            .client
            .post(url)
            .timeout(self.config.timeout)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::from_response(status.as_u16(), &body));
        }

        Ok(response.json().await?)
    }

    /// Open a streaming POST and hand back the response once headers arrive.
    ///
    /// The timeout bounds connection and headers only; the body may stream
    /// for longer. Not retried: a stream is not restartable.
    pub async fn post_stream<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<Response> {
        let url = self.endpoint(path);
        debug!(url = %url, "streaming POST request");

        let send = self
            .client
            .post(&url)
            .header(header::ACCEPT, "application/x-ndjson")
            .json(body)
            .send();

        let response = match tokio::time::timeout(self.config.timeout, send).await {
            Ok(result) => result?,
            Err(_) => return Err(ClientError::Timeout),
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::from_response(status.as_u16(), &body));
        }

        Ok(response)
    }
}
