pub mod error_classifier;
pub mod gateway_service;
pub mod gateway_trait;
pub mod idpay;
pub mod paystar;
pub mod signature;
pub mod transport;
pub mod url_resolver;
pub mod zarinpal;
pub mod zibal;

pub use error_classifier::{ErrorTable, ProviderError, INVALID_RESPONSE_CODE, NETWORK_ERROR_CODE};
pub use gateway_service::{GatewayInfo, GatewayKind, GatewayService};
pub use gateway_trait::PaymentGateway;
pub use idpay::IdPayGateway;
pub use paystar::PayStarGateway;
pub use transport::{HttpTransport, ReqwestTransport, TransportError, TransportRequest};
pub use url_resolver::{Endpoint, GatewayUrls};
pub use zarinpal::ZarinpalGateway;
pub use zibal::ZibalGateway;
