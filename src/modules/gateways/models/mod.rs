pub mod gateway_config;
pub mod outcome;
pub mod transaction;

pub use gateway_config::{
    normalize_custom_domain, GatewayConfig, GatewayConfigBuilder, DEFAULT_TIMEOUT,
};
pub use outcome::{ErrorKind, FieldViolation, GatewayFailure, GatewayOutcome};
pub use transaction::{
    Currency, InquiryRequest, PayerInfo, PaymentInitiated, PaymentInquiry, PaymentRequest,
    PaymentVerified, VerifyRequest,
};
