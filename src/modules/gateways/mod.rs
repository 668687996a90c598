pub mod models;
pub mod services;

pub use models::{
    Currency, ErrorKind, FieldViolation, GatewayConfig, GatewayConfigBuilder, GatewayFailure,
    GatewayOutcome, InquiryRequest, PayerInfo, PaymentInitiated, PaymentInquiry, PaymentRequest,
    PaymentVerified, VerifyRequest,
};
pub use services::{
    Endpoint, GatewayInfo, GatewayKind, GatewayUrls, GatewayService, HttpTransport, IdPayGateway,
    PayStarGateway, PaymentGateway, ReqwestTransport, TransportError, TransportRequest,
    ZarinpalGateway, ZibalGateway,
};
