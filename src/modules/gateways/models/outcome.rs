use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Origin of a gateway failure
///
/// Only `Network` failures are safe to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// No response was received (timeout, DNS, connection refused)
    Network,
    /// The gateway answered with something unexpected
    Api,
    /// The gateway declared the transaction itself failed
    Payment,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Network => write!(f, "network"),
            ErrorKind::Api => write!(f, "api"),
            ErrorKind::Payment => write!(f, "payment"),
        }
    }
}

/// Field-level validation message reported by a gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

/// Normalized gateway failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayFailure {
    /// Stable code: the gateway's own code stringified, or a synthetic one
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validations: Vec<FieldViolation>,
    #[serde(rename = "type")]
    pub kind: ErrorKind,
}

impl GatewayFailure {
    pub fn new(kind: ErrorKind, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            validations: Vec::new(),
            kind,
        }
    }

    pub fn with_validations(mut self, validations: Vec<FieldViolation>) -> Self {
        self.validations = validations;
        self
    }

    pub fn is_retryable(&self) -> bool {
        self.kind == ErrorKind::Network
    }
}

impl fmt::Display for GatewayFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error {}: {}", self.kind, self.code, self.message)
    }
}

/// Normalized result of a gateway operation
///
/// Exactly one of success data or failure is present. Serializes to the
/// `{ "isError", "data", "error" }` shape with the unused side set to `null`.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayOutcome<T> {
    Success(T),
    Failed(GatewayFailure),
}

impl<T> GatewayOutcome<T> {
    pub fn is_error(&self) -> bool {
        matches!(self, GatewayOutcome::Failed(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            GatewayOutcome::Success(data) => Some(data),
            GatewayOutcome::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&GatewayFailure> {
        match self {
            GatewayOutcome::Success(_) => None,
            GatewayOutcome::Failed(failure) => Some(failure),
        }
    }

    pub fn into_result(self) -> std::result::Result<T, GatewayFailure> {
        match self {
            GatewayOutcome::Success(data) => Ok(data),
            GatewayOutcome::Failed(failure) => Err(failure),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> GatewayOutcome<U> {
        match self {
            GatewayOutcome::Success(data) => GatewayOutcome::Success(f(data)),
            GatewayOutcome::Failed(failure) => GatewayOutcome::Failed(failure),
        }
    }
}

impl<T> From<GatewayFailure> for GatewayOutcome<T> {
    fn from(failure: GatewayFailure) -> Self {
        GatewayOutcome::Failed(failure)
    }
}

impl<T: Serialize> Serialize for GatewayOutcome<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("GatewayOutcome", 3)?;
        state.serialize_field("isError", &self.is_error())?;
        state.serialize_field("data", &self.data())?;
        state.serialize_field("error", &self.error())?;
        state.end()
    }
}
