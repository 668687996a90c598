/// Crate-wide Result type for local failures
pub type Result<T> = std::result::Result<T, AppError>;

/// Errors raised synchronously to the caller, before any network call.
///
/// These indicate programmer or operator mistakes (bad input, missing
/// credentials). Failures that originate from a gateway call are never
/// returned as `AppError`; they are captured in a `GatewayOutcome` instead.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Missing or invalid caller input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Missing credential, signing key or invalid configuration value
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Operation or endpoint the gateway does not offer
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Unknown gateway name
    #[error("Not found: {0}")]
    NotFound(String),
}

// Helper functions for common error scenarios
impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        AppError::Configuration(msg.into())
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        AppError::Unsupported(msg.into())
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        AppError::NotFound(resource.into())
    }
}
