use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

/// One JSON POST to a gateway
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub url: String,
    /// Extra headers (auth, sandbox flags). `Content-Type` is always JSON.
    pub headers: Vec<(String, String)>,
    pub body: Value,
    pub timeout: Duration,
}

impl TransportRequest {
    pub fn new(url: impl Into<String>, body: Value, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            body,
            timeout,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Transport-level failure, before classification
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    /// No response received: timeout, DNS failure, connection refused
    #[error("{0}")]
    Network(String),

    /// Response received with a non-success HTTP status
    #[error("HTTP {status}")]
    Status { status: u16, body: Value },

    /// Response received but the body is not JSON
    #[error("invalid response body (HTTP {status}): {message}")]
    Decode { status: u16, message: String },
}

/// Seam between gateway drivers and the HTTP client
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// POST `request.body` as JSON and return the parsed JSON body of a
    /// successful response
    async fn post_json(&self, request: TransportRequest) -> Result<Value, TransportError>;
}

/// reqwest-backed transport
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post_json(&self, request: TransportRequest) -> Result<Value, TransportError> {
        let mut builder = self
            .client
            .post(&request.url)
            .timeout(request.timeout)
            .header("Accept", "application/json")
            .json(&request.body);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Network(format!(
                    "timeout after {}ms ({})",
                    request.timeout.as_millis(),
                    e
                ))
            } else if e.is_connect() {
                TransportError::Network(format!("connection failed ({})", e))
            } else {
                TransportError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| TransportError::Network(format!("failed to read response: {}", e)))?;

        if status.is_success() {
            serde_json::from_str(&text).map_err(|e| TransportError::Decode {
                status: status.as_u16(),
                message: e.to_string(),
            })
        } else {
            let body = if text.trim().is_empty() {
                Value::Null
            } else {
                serde_json::from_str(&text).unwrap_or(Value::String(text))
            };
            Err(TransportError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }
}
