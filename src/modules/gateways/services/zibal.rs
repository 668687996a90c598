use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::error_classifier::{
    code_as_i64, code_to_string, str_field, u64_field, ErrorTable, ProviderError,
};
use super::gateway_trait::{require_amount, require_text, trace_outcome, PaymentGateway};
use super::transport::{HttpTransport, ReqwestTransport, TransportError, TransportRequest};
use super::url_resolver::{Endpoint, EndpointUrl, GatewayUrls, PageStyle, PaymentPage};
use crate::core::Result;
use crate::modules::gateways::models::{
    GatewayConfig, GatewayFailure, GatewayOutcome, PaymentInitiated, PaymentRequest,
    PaymentVerified, VerifyRequest,
};

const NAME: &str = "zibal";

const SUCCESS_RESULT: i64 = 100;

/// Merchant id Zibal accepts for sandbox transactions
pub const SANDBOX_MERCHANT: &str = "zibal";

pub static ZIBAL_URLS: GatewayUrls = GatewayUrls {
    gateway: NAME,
    create: EndpointUrl::same("https://gateway.zibal.ir/v1/request"),
    verify: EndpointUrl::same("https://gateway.zibal.ir/v1/verify"),
    inquiry: None,
    payment_page: PaymentPage {
        url: EndpointUrl::same("https://gateway.zibal.ir/start"),
        style: PageStyle::Path,
    },
};

/// https://help.zibal.ir/IPG/API/#requestResultCode
pub static ZIBAL_ERRORS: ErrorTable = ErrorTable::new(
    NAME,
    &[
        ("102", "Merchant not found"),
        ("103", "Merchant is not active"),
        ("104", "Invalid merchant"),
        ("105", "Amount must be greater than 1,000 Rials"),
        ("106", "callbackUrl is invalid (must start with http or https)"),
        ("113", "Amount exceeds the transaction limit"),
        ("201", "Transaction already verified"),
        ("202", "Order was not paid or the payment failed"),
        ("203", "Invalid trackId"),
    ],
);

/// Zibal payment gateway client
///
/// Authenticates with `merchant` in the request body. Sandbox transactions
/// use the fixed merchant `zibal` on the production host.
pub struct ZibalGateway {
    config: GatewayConfig,
    transport: Arc<dyn HttpTransport>,
}

impl ZibalGateway {
    pub fn new(config: GatewayConfig) -> Self {
        Self::with_transport(config, Arc::new(ReqwestTransport::new()))
    }

    pub fn with_transport(config: GatewayConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self { config, transport }
    }

    fn merchant<'a>(&'a self, override_token: Option<&'a str>, sandbox: bool) -> Result<&'a str> {
        if sandbox {
            return Ok(SANDBOX_MERCHANT);
        }
        self.config.resolve_token(override_token)
    }

    fn url(&self, endpoint: Endpoint, sandbox: bool) -> Result<String> {
        let url = ZIBAL_URLS.resolve(endpoint, sandbox, self.config.custom_domain())?;
        debug!(gateway = NAME, endpoint = %endpoint, url = %url, "Resolved endpoint");
        Ok(url)
    }

    async fn post(&self, url: String, body: Value) -> std::result::Result<Value, TransportError> {
        self.transport
            .post_json(TransportRequest::new(url, body, self.config.timeout()))
            .await
    }
}

#[async_trait]
impl PaymentGateway for ZibalGateway {
    async fn request(
        &self,
        input: PaymentRequest,
        sandbox: bool,
    ) -> Result<GatewayOutcome<PaymentInitiated>> {
        let amount = require_amount(input.amount, 1)?;
        let callback_url = require_text(Some(input.callback_url.as_str()), "callback_url")?;
        let merchant = self.merchant(input.merchant_id.as_deref(), sandbox)?;

        let mut body = json!({
            "merchant": merchant,
            "amount": amount,
            "callbackUrl": callback_url,
        });
        if let Some(description) = &input.description {
            body["description"] = json!(description);
        }
        if let Some(order_id) = &input.order_id {
            body["orderId"] = json!(order_id);
        }
        if let Some(mobile) = &input.payer.mobile {
            body["mobile"] = json!(mobile);
        }

        let url = self.url(Endpoint::Create, sandbox)?;
        info!(gateway = NAME, amount, sandbox, "Creating payment");

        let outcome = match self.post(url, body).await {
            Ok(response) => match check_result(&response) {
                Err(failure) => failure.into(),
                Ok(()) => match str_field(&response, "trackId") {
                    Some(track_id) => GatewayOutcome::Success(PaymentInitiated {
                        redirect_url: ZIBAL_URLS.payment_page_url(&track_id, sandbox),
                        reference: track_id,
                        order_id: input.order_id.clone(),
                        amount: Some(amount),
                        fee: None,
                        raw: response,
                    }),
                    None => ZIBAL_ERRORS
                        .invalid_response("success without trackId")
                        .into(),
                },
            },
            Err(e) => ZIBAL_ERRORS.classify_transport(e, extract_error).into(),
        };
        trace_outcome(NAME, "request", &outcome);
        Ok(outcome)
    }

    async fn verify(
        &self,
        input: VerifyRequest,
        sandbox: bool,
    ) -> Result<GatewayOutcome<PaymentVerified>> {
        let track_id = require_text(Some(input.reference.as_str()), "trackId")?;
        let merchant = self.merchant(input.merchant_id.as_deref(), sandbox)?;

        // trackId is numeric on the wire
        let track_id_value = track_id
            .parse::<u64>()
            .map(Value::from)
            .unwrap_or_else(|_| json!(track_id));
        let body = json!({
            "merchant": merchant,
            "trackId": track_id_value,
        });

        let url = self.url(Endpoint::Verify, sandbox)?;
        info!(gateway = NAME, reference = %track_id, sandbox, "Verifying payment");

        let outcome = match self.post(url, body).await {
            Ok(response) => match check_result(&response) {
                Err(failure) => failure.into(),
                Ok(()) => GatewayOutcome::Success(PaymentVerified {
                    reference: track_id.to_string(),
                    amount: u64_field(&response, "amount"),
                    card_number: str_field(&response, "cardNumber"),
                    card_hash: None,
                    bank_reference: str_field(&response, "refNumber"),
                    order_id: str_field(&response, "orderId"),
                    paid_at: str_field(&response, "paidAt"),
                    raw: response,
                }),
            },
            Err(e) => ZIBAL_ERRORS.classify_transport(e, extract_error).into(),
        };
        trace_outcome(NAME, "verify", &outcome);
        Ok(outcome)
    }

    fn name(&self) -> &str {
        NAME
    }
}

/// Zibal signals success with `result == 100`, whatever the HTTP status
fn check_result(body: &Value) -> std::result::Result<(), GatewayFailure> {
    if body.get("result").and_then(code_as_i64) == Some(SUCCESS_RESULT) {
        return Ok(());
    }
    Err(match extract_error(body) {
        Some(error) => ZIBAL_ERRORS.classify(error),
        None => ZIBAL_ERRORS.invalid_response("missing result"),
    })
}

fn extract_error(body: &Value) -> Option<ProviderError> {
    let code = body.get("result").and_then(code_to_string)?;
    Some(ProviderError::new(code).with_message(str_field(body, "message")))
}
