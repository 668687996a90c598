use crate::core::{AppError, Result};
use crate::modules::gateways::models::{
    GatewayOutcome, InquiryRequest, PaymentInitiated, PaymentInquiry, PaymentRequest,
    PaymentVerified, VerifyRequest,
};
use async_trait::async_trait;
use tracing::{info, warn};

/// Uniform contract every payment gateway driver implements
///
/// `Err` is reserved for local mistakes detected before any network call
/// (invalid input, missing credentials, unsupported operation). Anything that
/// happens on the wire is reported through [`GatewayOutcome`].
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a payment and return the payment page URL
    async fn request(
        &self,
        input: PaymentRequest,
        sandbox: bool,
    ) -> Result<GatewayOutcome<PaymentInitiated>>;

    /// Confirm a payment after the payer returns to the callback URL
    async fn verify(
        &self,
        input: VerifyRequest,
        sandbox: bool,
    ) -> Result<GatewayOutcome<PaymentVerified>>;

    /// Look up a transaction status. Idempotent.
    async fn inquiry(
        &self,
        _input: InquiryRequest,
        _sandbox: bool,
    ) -> Result<GatewayOutcome<PaymentInquiry>> {
        Err(AppError::unsupported(format!(
            "{} does not support inquiry",
            self.name()
        )))
    }

    /// Get gateway name
    fn name(&self) -> &str;

    fn supports_inquiry(&self) -> bool {
        false
    }
}

/// Fail with a validation error when a required text field is missing or
/// blank
pub(crate) fn require_text<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::validation(format!("{} is required", field)))
}

pub(crate) fn require_amount(amount: u64, minimum: u64) -> Result<u64> {
    if amount == 0 {
        return Err(AppError::validation("amount is required"));
    }
    if amount < minimum {
        return Err(AppError::validation(format!(
            "amount must be at least {}",
            minimum
        )));
    }
    Ok(amount)
}

/// Log the normalized outcome of a gateway call
pub(crate) fn trace_outcome<T>(gateway: &str, operation: &str, outcome: &GatewayOutcome<T>) {
    match outcome {
        GatewayOutcome::Success(_) => {
            info!(gateway = %gateway, operation = %operation, "Gateway call succeeded");
        }
        GatewayOutcome::Failed(failure) => {
            warn!(
                gateway = %gateway,
                operation = %operation,
                kind = %failure.kind,
                code = %failure.code,
                error = %failure.message,
                "Gateway call failed"
            );
        }
    }
}
