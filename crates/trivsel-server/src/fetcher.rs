//! Upstream HTTP GET with per-attempt timeout, bounded retry and backoff.
//!
//! 2xx and 4xx responses are returned to the caller as-is; 4xx is terminal
//! and never retried. 5xx, timeouts and transport errors are retried until
//! the [`RetryPolicy`] budget is spent, then the last error propagates.

use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::backoff::RetryPolicy;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("request failed with status {0}")]
    Status(u16),
}

impl FetchError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

/// Status and body of a completed upstream call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl UpstreamResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }
}

/// One raw GET against the network. Swapped for a scripted double in tests.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &str, headers: &[(String, String)])
        -> Result<UpstreamResponse, FetchError>;
}

/// Production transport backed by a pooled reqwest client.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(user_agent: &str) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|err| FetchError::Transport(format!("failed to create HTTP client: {err}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> Result<UpstreamResponse, FetchError> {
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request
            .send()
            .await
            .map_err(|err| FetchError::Transport(err.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|err| FetchError::Transport(format!("failed to read body: {err}")))?;

        Ok(UpstreamResponse::new(status, body.to_vec()))
    }
}

pub struct RetryingFetcher {
    transport: Arc<dyn HttpTransport>,
    policy: RetryPolicy,
    user_agent: String,
}

impl RetryingFetcher {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        policy: RetryPolicy,
        user_agent: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            policy,
            user_agent: user_agent.into(),
        }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// GET `url` with the configured policy and default headers.
    pub async fn fetch(&self, url: &str) -> Result<UpstreamResponse, FetchError> {
        self.fetch_with(url, &[], self.policy).await
    }

    /// GET `url` with extra headers and an explicit policy.
    ///
    /// The configured User-Agent is sent unless `headers` overrides it.
    pub async fn fetch_with(
        &self,
        url: &str,
        headers: &[(String, String)],
        policy: RetryPolicy,
    ) -> Result<UpstreamResponse, FetchError> {
        let mut final_headers = Vec::with_capacity(headers.len() + 1);
        if !headers
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case("user-agent"))
        {
            final_headers.push(("User-Agent".to_string(), self.user_agent.clone()));
        }
        final_headers.extend_from_slice(headers);

        let mut attempt = 0u32;
        loop {
            if attempt > 0 {
                let delay = policy.delay_before(attempt);
                tracing::warn!(
                    url = %url,
                    attempt,
                    max_retries = policy.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    "Retrying upstream fetch"
                );
                tokio::time::sleep(delay).await;
            }

            let outcome =
                match tokio::time::timeout(policy.timeout, self.transport.get(url, &final_headers))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(FetchError::Timeout(policy.timeout)),
                };

            let err = match outcome {
                Ok(response) if response.is_success() || response.is_client_error() => {
                    return Ok(response);
                }
                Ok(response) => FetchError::Status(response.status),
                Err(err) => err,
            };

            tracing::error!(
                url = %url,
                attempt = attempt + 1,
                error = %err,
                is_timeout = err.is_timeout(),
                "Fetch error"
            );

            if attempt >= policy.max_retries {
                return Err(err);
            }
            attempt += 1;
        }
    }
}
