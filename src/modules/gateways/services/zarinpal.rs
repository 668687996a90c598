use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use super::error_classifier::{
    code_as_i64, code_to_string, str_field, u64_field, ErrorTable, ProviderError,
};
use super::gateway_trait::{require_amount, require_text, trace_outcome, PaymentGateway};
use super::transport::{HttpTransport, ReqwestTransport, TransportError, TransportRequest};
use super::url_resolver::{Endpoint, EndpointUrl, GatewayUrls, PageStyle, PaymentPage};
use crate::core::Result;
use crate::modules::gateways::models::{
    FieldViolation, GatewayConfig, GatewayFailure, GatewayOutcome, PaymentInitiated,
    PaymentRequest, PaymentVerified, VerifyRequest,
};

const NAME: &str = "zarinpal";

/// `data.code` of a successful request or verify
const SUCCESS_CODE: i64 = 100;

pub static ZARINPAL_URLS: GatewayUrls = GatewayUrls {
    gateway: NAME,
    create: EndpointUrl::new(
        "https://api.zarinpal.com/pg/v4/payment/request.json",
        "https://sandbox.zarinpal.com/pg/v4/payment/request.json",
    ),
    verify: EndpointUrl::new(
        "https://api.zarinpal.com/pg/v4/payment/verify.json",
        "https://sandbox.zarinpal.com/pg/v4/payment/verify.json",
    ),
    inquiry: None,
    payment_page: PaymentPage {
        url: EndpointUrl::new(
            "https://www.zarinpal.com/pg/StartPay",
            "https://sandbox.zarinpal.com/pg/StartPay/",
        ),
        style: PageStyle::Path,
    },
};

/// https://www.zarinpal.com/docs/paymentGateway/errorList.html
pub static ZARINPAL_ERRORS: ErrorTable = ErrorTable::new(
    NAME,
    &[
        ("-9", "Validation error in request parameters"),
        ("-10", "Terminal IP or merchant code is not valid"),
        ("-11", "Merchant code is not active"),
        ("-12", "Too many attempts, please try again later"),
        ("-15", "Terminal has been suspended"),
        ("-16", "Terminal user level is not acceptable"),
        ("-17", "Terminal user is restricted to blue level"),
        ("-30", "Terminal does not allow floating wages"),
        ("-31", "Default bank account is not set for the terminal"),
        ("-32", "Wages exceed the total amount"),
        ("-33", "Floating wage percentages are not valid"),
        ("-34", "Wages exceed the maximum allowed"),
        ("-35", "Number of wage recipients exceeds the limit"),
        ("-36", "Minimum amount for floating wages is 10,000 Rials"),
        ("-37", "One or more wage IBANs are inactive"),
        ("-38", "IBAN is not registered with the central bank"),
        ("-39", "Wages error, the transaction was cancelled"),
        ("-40", "Invalid extra parameters"),
        ("-41", "Maximum amount is 100,000,000 Tomans"),
        ("-50", "Paid amount differs from the verify amount"),
        ("-51", "Payment failed"),
        ("-52", "Unexpected error, contact gateway support"),
        ("-53", "Authority does not belong to this merchant"),
        ("-54", "Invalid authority"),
        ("-55", "Transaction not found"),
        ("101", "Transaction already verified"),
    ],
);

/// ZarinPal payment gateway client (v4 REST API)
///
/// Authenticates with `merchant_id` in the request body.
pub struct ZarinpalGateway {
    config: GatewayConfig,
    transport: Arc<dyn HttpTransport>,
}

impl ZarinpalGateway {
    pub fn new(config: GatewayConfig) -> Self {
        Self::with_transport(config, Arc::new(ReqwestTransport::new()))
    }

    pub fn with_transport(config: GatewayConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self { config, transport }
    }

    fn url(&self, endpoint: Endpoint, sandbox: bool) -> Result<String> {
        let url = ZARINPAL_URLS.resolve(endpoint, sandbox, self.config.custom_domain())?;
        debug!(gateway = NAME, endpoint = %endpoint, url = %url, "Resolved endpoint");
        Ok(url)
    }

    async fn post(&self, url: String, body: Value) -> std::result::Result<Value, TransportError> {
        self.transport
            .post_json(TransportRequest::new(url, body, self.config.timeout()))
            .await
    }

    fn parse_request(&self, body: Value, sandbox: bool) -> GatewayOutcome<PaymentInitiated> {
        let data = match success_data(&body) {
            Ok(data) => data,
            Err(failure) => return GatewayOutcome::Failed(failure),
        };

        let Some(authority) = str_field(data, "authority") else {
            return ZARINPAL_ERRORS
                .invalid_response("success without data.authority")
                .into();
        };

        GatewayOutcome::Success(PaymentInitiated {
            redirect_url: ZARINPAL_URLS.payment_page_url(&authority, sandbox),
            reference: authority,
            order_id: None,
            amount: None,
            fee: u64_field(data, "fee"),
            raw: data.clone(),
        })
    }

    fn parse_verify(&self, body: Value, input: &VerifyRequest) -> GatewayOutcome<PaymentVerified> {
        let data = match success_data(&body) {
            Ok(data) => data,
            Err(failure) => return GatewayOutcome::Failed(failure),
        };

        GatewayOutcome::Success(PaymentVerified {
            reference: input.reference.clone(),
            amount: input.amount,
            card_number: str_field(data, "card_pan"),
            card_hash: str_field(data, "card_hash"),
            bank_reference: str_field(data, "ref_id"),
            order_id: None,
            paid_at: None,
            raw: data.clone(),
        })
    }
}

#[async_trait]
impl PaymentGateway for ZarinpalGateway {
    async fn request(
        &self,
        input: PaymentRequest,
        sandbox: bool,
    ) -> Result<GatewayOutcome<PaymentInitiated>> {
        let amount = require_amount(input.amount, 1)?;
        let callback_url = require_text(Some(input.callback_url.as_str()), "callback_url")?;
        let description = require_text(input.description.as_deref(), "description")?;
        let merchant_id = self.config.resolve_token(input.merchant_id.as_deref())?;

        let mut body = json!({
            "merchant_id": merchant_id,
            "amount": amount,
            "callback_url": callback_url,
            "description": description,
        });
        if let Some(currency) = input.currency {
            body["currency"] = json!(currency);
        }

        let mut metadata = Map::new();
        if let Some(mobile) = &input.payer.mobile {
            metadata.insert("mobile".to_string(), json!(mobile));
        }
        if let Some(email) = &input.payer.email {
            metadata.insert("email".to_string(), json!(email));
        }
        if let Some(order_id) = &input.order_id {
            metadata.insert("order_id".to_string(), json!(order_id));
        }
        if !metadata.is_empty() {
            body["metadata"] = Value::Object(metadata);
        }

        let url = self.url(Endpoint::Create, sandbox)?;
        info!(gateway = NAME, amount, sandbox, "Creating payment");

        let outcome = match self.post(url, body).await {
            Ok(response) => self.parse_request(response, sandbox),
            Err(e) => ZARINPAL_ERRORS.classify_transport(e, extract_error).into(),
        };
        trace_outcome(NAME, "request", &outcome);
        Ok(outcome)
    }

    async fn verify(
        &self,
        input: VerifyRequest,
        sandbox: bool,
    ) -> Result<GatewayOutcome<PaymentVerified>> {
        let authority = require_text(Some(input.reference.as_str()), "authority")?;
        let amount = require_amount(input.amount.unwrap_or(0), 1)?;
        let merchant_id = self.config.resolve_token(input.merchant_id.as_deref())?;

        let body = json!({
            "merchant_id": merchant_id,
            "amount": amount,
            "authority": authority,
        });

        let url = self.url(Endpoint::Verify, sandbox)?;
        info!(gateway = NAME, reference = %authority, amount, sandbox, "Verifying payment");

        let outcome = match self.post(url, body).await {
            Ok(response) => self.parse_verify(response, &input),
            Err(e) => ZARINPAL_ERRORS.classify_transport(e, extract_error).into(),
        };
        trace_outcome(NAME, "verify", &outcome);
        Ok(outcome)
    }

    fn name(&self) -> &str {
        NAME
    }
}

/// Return `data` when the body reports success, the classified failure
/// otherwise
fn success_data(body: &Value) -> std::result::Result<&Value, GatewayFailure> {
    if let Some(error) = extract_error(body) {
        return Err(ZARINPAL_ERRORS.classify(error));
    }

    let data = body.get("data").unwrap_or(&Value::Null);
    match data.get("code").and_then(code_as_i64) {
        Some(SUCCESS_CODE) => Ok(data),
        Some(code) => Err(ZARINPAL_ERRORS.classify(
            ProviderError::new(code.to_string()).with_message(str_field(data, "message")),
        )),
        None => Err(ZARINPAL_ERRORS.invalid_response("missing data.code")),
    }
}

/// ZarinPal reports failures in an `errors` object; on success `errors` is an
/// empty array
fn extract_error(body: &Value) -> Option<ProviderError> {
    let errors = body.get("errors").filter(|e| e.is_object())?;
    let code = errors.get("code")?;
    if code_as_i64(code).map_or(true, |c| c >= 0) {
        return None;
    }

    Some(
        ProviderError::new(code_to_string(code)?)
            .with_message(str_field(errors, "message"))
            .with_validations(flatten_validations(errors.get("validations"))),
    )
}

/// Validations arrive either as `[{"amount": "..."}]` or as
/// `{"amount": ["..."]}`
fn flatten_validations(value: Option<&Value>) -> Vec<FieldViolation> {
    fn push_entries(map: &Map<String, Value>, out: &mut Vec<FieldViolation>) {
        if let (Some(Value::String(field)), Some(Value::String(message))) =
            (map.get("field"), map.get("message"))
        {
            out.push(FieldViolation {
                field: field.clone(),
                message: message.clone(),
            });
            return;
        }
        for (field, message) in map {
            let message = match message {
                Value::String(s) => s.clone(),
                Value::Array(items) => items
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join("; "),
                other => other.to_string(),
            };
            out.push(FieldViolation {
                field: field.clone(),
                message,
            });
        }
    }

    let mut out = Vec::new();
    match value {
        Some(Value::Array(items)) => {
            for item in items {
                if let Value::Object(map) = item {
                    push_entries(map, &mut out);
                }
            }
        }
        Some(Value::Object(map)) => push_entries(map, &mut out),
        _ => {}
    }
    out
}
