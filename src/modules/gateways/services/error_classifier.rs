//! Collapses gateway-specific failures into `{code, message, type}`.
//!
//! Each gateway ships a static code table. Codes are looked up by their
//! stringified form, so a gateway that sometimes sends `-9` and sometimes
//! `"-9"` resolves to the same entry. A known code is a `payment` error; an
//! unknown one is an `api` error since we cannot tell what the gateway meant.

use serde_json::Value;

use super::transport::TransportError;
use crate::modules::gateways::models::{ErrorKind, FieldViolation, GatewayFailure};

/// Synthetic code for failures where no response was received
pub const NETWORK_ERROR_CODE: &str = "NETWORK_ERROR";

/// Synthetic code for responses that cannot be interpreted
pub const INVALID_RESPONSE_CODE: &str = "INVALID_RESPONSE";

/// Static code -> message table of one gateway
#[derive(Debug)]
pub struct ErrorTable {
    gateway: &'static str,
    entries: &'static [(&'static str, &'static str)],
}

/// Failure indicator extracted from a gateway response body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    pub code: String,
    /// Message the gateway sent along, if any
    pub message: Option<String>,
    pub validations: Vec<FieldViolation>,
}

impl ProviderError {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: None,
            validations: Vec::new(),
        }
    }

    pub fn with_message(mut self, message: Option<String>) -> Self {
        self.message = message.filter(|m| !m.trim().is_empty());
        self
    }

    pub fn with_validations(mut self, validations: Vec<FieldViolation>) -> Self {
        self.validations = validations;
        self
    }
}

impl ErrorTable {
    pub const fn new(
        gateway: &'static str,
        entries: &'static [(&'static str, &'static str)],
    ) -> Self {
        Self { gateway, entries }
    }

    pub fn gateway(&self) -> &'static str {
        self.gateway
    }

    pub fn lookup(&self, code: &str) -> Option<&'static str> {
        let code = code.trim();
        self.entries
            .iter()
            .find(|(key, _)| *key == code)
            .map(|(_, message)| *message)
    }

    /// Classify a failure indicator the gateway reported
    pub fn classify(&self, error: ProviderError) -> GatewayFailure {
        let failure = match self.lookup(&error.code) {
            Some(message) => GatewayFailure::new(ErrorKind::Payment, error.code, message),
            None => {
                let mut message = format!(
                    "Unexpected response from {} (status {})",
                    self.gateway, error.code
                );
                if let Some(raw) = &error.message {
                    message.push_str(": ");
                    message.push_str(raw);
                }
                GatewayFailure::new(ErrorKind::Api, error.code, message)
            }
        };
        failure.with_validations(error.validations)
    }

    /// Classify a transport failure.
    ///
    /// `extract` pulls the gateway's own failure indicator out of an error
    /// response body; without one the HTTP status is used as the code.
    pub fn classify_transport(
        &self,
        error: TransportError,
        extract: fn(&Value) -> Option<ProviderError>,
    ) -> GatewayFailure {
        match error {
            TransportError::Network(message) => network_failure(&message),
            TransportError::Status { status, body } => {
                let provider = extract(&body).unwrap_or_else(|| {
                    ProviderError::new(status.to_string()).with_message(Some(format!(
                        "HTTP {}",
                        status
                    )))
                });
                self.classify(provider)
            }
            TransportError::Decode { status, message } => self.invalid_response(format!(
                "unreadable body (HTTP {}): {}",
                status, message
            )),
        }
    }

    /// A 2xx response whose shape does not match what success requires
    pub fn invalid_response(&self, detail: impl AsRef<str>) -> GatewayFailure {
        GatewayFailure::new(
            ErrorKind::Api,
            INVALID_RESPONSE_CODE,
            format!(
                "Unexpected response from {}: {}",
                self.gateway,
                detail.as_ref()
            ),
        )
    }
}

pub fn network_failure(message: &str) -> GatewayFailure {
    GatewayFailure::new(
        ErrorKind::Network,
        NETWORK_ERROR_CODE,
        format!("Network error: {}", message),
    )
}

/// Stringify a numeric or string code
pub fn code_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

pub fn code_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn str_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn u64_field(value: &Value, key: &str) -> Option<u64> {
    match value.get(key)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
