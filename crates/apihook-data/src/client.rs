//! Default HTTP request executor.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{FetchError, NormalizedResponse, RequestDescriptor, RequestExecutor};

/// Configuration for [`HttpExecutor`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Total request timeout in milliseconds. `None` waits indefinitely.
    pub timeout_ms: Option<u64>,
    /// `User-Agent` sent with every request.
    pub user_agent: Option<String>,
    /// Headers sent with every request; per-request headers win.
    pub default_headers: BTreeMap<String, String>,
}

impl ExecutorConfig {
    /// Set the total timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// Set the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Add a default header.
    pub fn with_default_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(key.into(), value.into());
        self
    }

    /// Timeout as a duration.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// Request executor backed by `reqwest`.
///
/// Sends `url + endpoint` with the descriptor's method, headers and body,
/// decodes the body as JSON and folds every failure into a
/// [`NormalizedResponse`].
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    client: reqwest::Client,
    config: ExecutorConfig,
}

impl Default for HttpExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpExecutor {
    /// Create an executor with default settings.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            config: ExecutorConfig::default(),
        }
    }

    /// Create an executor from configuration.
    pub fn with_config(config: ExecutorConfig) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }
        let client = builder
            .build()
            .map_err(|e| FetchError::RequestError(e.to_string()))?;
        Ok(Self { client, config })
    }

    /// Wrap an existing client.
    pub fn with_client(client: reqwest::Client, config: ExecutorConfig) -> Self {
        Self { client, config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    async fn send(&self, request: &RequestDescriptor) -> Result<NormalizedResponse, FetchError> {
        let url = request.full_url();

        let outgoing = request.outgoing_headers();
        let mut headers = self.config.default_headers.clone();
        headers.retain(|name, _| !outgoing.keys().any(|key| key.eq_ignore_ascii_case(name)));
        headers.extend(outgoing);

        let mut builder = self
            .client
            .request(request.method.to_http(), &url)
            .headers(header_map(&headers)?);
        if let Some(bytes) = request.body_bytes()? {
            builder = builder.body(bytes);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await?;

        let data = if bytes.iter().all(u8::is_ascii_whitespace) {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).map_err(|e| FetchError::ParseError(e.to_string()))?
        };

        Ok(NormalizedResponse::new(status, data))
    }
}

#[async_trait]
impl RequestExecutor for HttpExecutor {
    async fn execute(&self, request: RequestDescriptor) -> NormalizedResponse {
        match self.send(&request).await {
            Ok(response) => {
                tracing::debug!(
                    method = %request.method,
                    url = %request.full_url(),
                    status = ?response.status_code,
                    "request completed"
                );
                response
            }
            Err(e) => {
                tracing::warn!(
                    method = %request.method,
                    url = %request.full_url(),
                    error = %e,
                    "request failed"
                );
                NormalizedResponse::from_error(&e)
            }
        }
    }
}

fn header_map(headers: &BTreeMap<String, String>) -> Result<HeaderMap, FetchError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let invalid = |reason: String| FetchError::InvalidHeader {
            name: name.clone(),
            reason,
        };
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| invalid(e.to_string()))?;
        let header_value = HeaderValue::from_str(value).map_err(|e| invalid(e.to_string()))?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}
