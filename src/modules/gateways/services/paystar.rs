use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::error_classifier::{
    code_as_i64, code_to_string, str_field, u64_field, ErrorTable, ProviderError,
};
use super::gateway_trait::{require_amount, require_text, trace_outcome, PaymentGateway};
use super::signature;
use super::transport::{HttpTransport, ReqwestTransport, TransportError, TransportRequest};
use super::url_resolver::{Endpoint, EndpointUrl, GatewayUrls, PageStyle, PaymentPage};
use crate::core::Result;
use crate::modules::gateways::models::{
    GatewayConfig, GatewayFailure, GatewayOutcome, InquiryRequest, PaymentInitiated,
    PaymentInquiry, PaymentRequest, PaymentVerified, VerifyRequest,
};

const NAME: &str = "paystar";

/// PayStar rejects payments below this amount (Rials)
pub const MIN_AMOUNT: u64 = 5000;

pub static PAYSTAR_URLS: GatewayUrls = GatewayUrls {
    gateway: NAME,
    create: EndpointUrl::same("https://core.paystar.ir/api/pardakht/create"),
    verify: EndpointUrl::same("https://core.paystar.ir/api/pardakht/verify"),
    inquiry: Some(EndpointUrl::same("https://core.paystar.ir/api/pardakht/inquiry")),
    payment_page: PaymentPage {
        url: EndpointUrl::same("https://core.paystar.ir/api/pardakht/payment?token="),
        style: PageStyle::Query,
    },
};

/// https://docs.paystar.ir/docs/tutorial-basics/IPG-payment-helper/
pub static PAYSTAR_ERRORS: ErrorTable = ErrorTable::new(
    NAME,
    &[
        ("-1", "Invalid request (input parameter error)"),
        ("-2", "Gateway is not active"),
        ("-3", "Duplicate token"),
        ("-4", "Amount exceeds the gateway limit"),
        ("-5", "Invalid ref_num"),
        ("-6", "Transaction already verified"),
        ("-7", "Invalid parameters sent"),
        ("-8", "Transaction cannot be verified"),
        ("-9", "Transaction was not verified"),
        ("-16", "Insufficient balance in the gateway fee wallet"),
        ("-98", "Transaction failed"),
        ("-99", "Transaction failed"),
    ],
);

/// PayStar payment gateway client
///
/// Authenticates with `Authorization: Bearer <gateway_id>` and signs create
/// and verify calls with HMAC-SHA512 over the configured sign key.
pub struct PayStarGateway {
    config: GatewayConfig,
    transport: Arc<dyn HttpTransport>,
}

impl PayStarGateway {
    pub fn new(config: GatewayConfig) -> Self {
        Self::with_transport(config, Arc::new(ReqwestTransport::new()))
    }

    pub fn with_transport(config: GatewayConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self { config, transport }
    }

    fn build_request(
        &self,
        endpoint: Endpoint,
        sandbox: bool,
        gateway_id: &str,
        body: Value,
    ) -> Result<TransportRequest> {
        let url = PAYSTAR_URLS.resolve(endpoint, sandbox, self.config.custom_domain())?;
        debug!(gateway = NAME, endpoint = %endpoint, url = %url, "Resolved endpoint");

        Ok(TransportRequest::new(url, body, self.config.timeout())
            .header("Authorization", format!("Bearer {}", gateway_id)))
    }

    async fn post(&self, request: TransportRequest) -> std::result::Result<Value, TransportError> {
        self.transport.post_json(request).await
    }
}

#[async_trait]
impl PaymentGateway for PayStarGateway {
    async fn request(
        &self,
        input: PaymentRequest,
        sandbox: bool,
    ) -> Result<GatewayOutcome<PaymentInitiated>> {
        let amount = require_amount(input.amount, MIN_AMOUNT)?;
        let order_id = require_text(input.order_id.as_deref(), "order_id")?;
        let callback = require_text(Some(input.callback_url.as_str()), "callback_url")?;
        let gateway_id = self.config.resolve_token(input.merchant_id.as_deref())?;
        let sign = signature::sign(
            &signature::create_message(amount, order_id, callback),
            self.config.sign_key(),
        )?;

        let mut body = json!({
            "amount": amount,
            "order_id": order_id,
            "callback": callback,
            "sign": sign,
        });
        if let Some(name) = &input.payer.name {
            body["name"] = json!(name);
        }
        if let Some(mobile) = &input.payer.mobile {
            body["phone"] = json!(mobile);
        }
        if let Some(email) = &input.payer.email {
            body["mail"] = json!(email);
        }
        if let Some(description) = &input.description {
            body["description"] = json!(description);
        }

        let request = self.build_request(Endpoint::Create, sandbox, gateway_id, body)?;
        info!(gateway = NAME, order_id = %order_id, amount, sandbox, "Creating payment");

        let outcome = match self.post(request).await {
            Ok(response) => match success_data(&response) {
                Err(failure) => failure.into(),
                Ok(data) => match (str_field(data, "ref_num"), str_field(data, "token")) {
                    (Some(ref_num), Some(token)) => GatewayOutcome::Success(PaymentInitiated {
                        reference: ref_num,
                        redirect_url: PAYSTAR_URLS.payment_page_url(&token, sandbox),
                        order_id: str_field(data, "order_id")
                            .or_else(|| Some(order_id.to_string())),
                        amount: u64_field(data, "payment_amount").or(Some(amount)),
                        fee: None,
                        raw: data.clone(),
                    }),
                    _ => PAYSTAR_ERRORS
                        .invalid_response("success without data.ref_num or data.token")
                        .into(),
                },
            },
            Err(e) => PAYSTAR_ERRORS.classify_transport(e, extract_error).into(),
        };
        trace_outcome(NAME, "request", &outcome);
        Ok(outcome)
    }

    async fn verify(
        &self,
        input: VerifyRequest,
        sandbox: bool,
    ) -> Result<GatewayOutcome<PaymentVerified>> {
        let ref_num = require_text(Some(input.reference.as_str()), "ref_num")?;
        let amount = require_amount(input.amount.unwrap_or(0), 1)?;
        let card_number = require_text(input.card_number.as_deref(), "card_number")?;
        let tracking_code = require_text(input.tracking_code.as_deref(), "tracking_code")?;
        let gateway_id = self.config.resolve_token(input.merchant_id.as_deref())?;
        let sign = signature::sign(
            &signature::verify_message(amount, ref_num, card_number, tracking_code),
            self.config.sign_key(),
        )?;

        let body = json!({
            "ref_num": ref_num,
            "amount": amount,
            "sign": sign,
        });
        let request = self.build_request(Endpoint::Verify, sandbox, gateway_id, body)?;
        info!(gateway = NAME, reference = %ref_num, amount, sandbox, "Verifying payment");

        let outcome = match self.post(request).await {
            Ok(response) => match success_data(&response) {
                Err(failure) => failure.into(),
                Ok(data) => GatewayOutcome::Success(PaymentVerified {
                    reference: str_field(data, "ref_num").unwrap_or_else(|| ref_num.to_string()),
                    amount: u64_field(data, "price").or(Some(amount)),
                    card_number: str_field(data, "card_number"),
                    card_hash: None,
                    bank_reference: Some(tracking_code.to_string()),
                    order_id: input.order_id.clone(),
                    paid_at: None,
                    raw: data.clone(),
                }),
            },
            Err(e) => PAYSTAR_ERRORS.classify_transport(e, extract_error).into(),
        };
        trace_outcome(NAME, "verify", &outcome);
        Ok(outcome)
    }

    async fn inquiry(
        &self,
        input: InquiryRequest,
        sandbox: bool,
    ) -> Result<GatewayOutcome<PaymentInquiry>> {
        let ref_num = require_text(Some(input.reference.as_str()), "ref_num")?;
        let gateway_id = self.config.resolve_token(input.merchant_id.as_deref())?;

        let body = json!({ "ref_num": ref_num });
        let request = self.build_request(Endpoint::Inquiry, sandbox, gateway_id, body)?;
        info!(gateway = NAME, reference = %ref_num, sandbox, "Inquiring payment");

        let outcome = match self.post(request).await {
            Ok(response) => match success_data(&response) {
                Err(failure) => failure.into(),
                Ok(data) => match str_field(data, "status") {
                    Some(status) => GatewayOutcome::Success(PaymentInquiry {
                        reference: str_field(data, "ref_num")
                            .unwrap_or_else(|| ref_num.to_string()),
                        status,
                        amount: u64_field(data, "payment_amount"),
                        order_id: str_field(data, "order_id"),
                        card_number: str_field(data, "card_number"),
                        tracking_code: str_field(data, "tracking_code"),
                        paid_at: str_field(data, "payment_date"),
                        raw: data.clone(),
                    }),
                    None => PAYSTAR_ERRORS
                        .invalid_response("inquiry without data.status")
                        .into(),
                },
            },
            Err(e) => PAYSTAR_ERRORS.classify_transport(e, extract_error).into(),
        };
        trace_outcome(NAME, "inquiry", &outcome);
        Ok(outcome)
    }

    fn name(&self) -> &str {
        NAME
    }

    fn supports_inquiry(&self) -> bool {
        true
    }
}

/// `status` is `1` (sometimes `"ok"`) on success
fn is_success(status: &Value) -> bool {
    code_as_i64(status) == Some(1)
        || status
            .as_str()
            .is_some_and(|s| s.trim().eq_ignore_ascii_case("ok"))
}

/// `data` of a reply whose `status` is an explicit success sentinel. Every
/// other status, including `null`, booleans and blanks, is a failure.
fn success_data(body: &Value) -> std::result::Result<&Value, GatewayFailure> {
    let Some(status) = body.get("status") else {
        return Err(PAYSTAR_ERRORS.invalid_response("missing status"));
    };
    if is_success(status) {
        return Ok(body.get("data").unwrap_or(&Value::Null));
    }
    Err(match extract_error(body) {
        Some(error) => PAYSTAR_ERRORS.classify(error),
        None => PAYSTAR_ERRORS.invalid_response(format!("unrecognized status {}", status)),
    })
}

fn extract_error(body: &Value) -> Option<ProviderError> {
    let status = body.get("status")?;
    if is_success(status) {
        return None;
    }
    Some(ProviderError::new(code_to_string(status)?).with_message(str_field(body, "message")))
}
