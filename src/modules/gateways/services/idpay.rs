use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::error_classifier::{code_to_string, str_field, u64_field, ErrorTable, ProviderError};
use super::gateway_trait::{require_amount, require_text, trace_outcome, PaymentGateway};
use super::transport::{HttpTransport, ReqwestTransport, TransportError, TransportRequest};
use super::url_resolver::{Endpoint, EndpointUrl, GatewayUrls, PageStyle, PaymentPage};
use crate::core::Result;
use crate::modules::gateways::models::{
    GatewayConfig, GatewayOutcome, InquiryRequest, PaymentInitiated, PaymentInquiry,
    PaymentRequest, PaymentVerified, VerifyRequest,
};

const NAME: &str = "idpay";

pub static IDPAY_URLS: GatewayUrls = GatewayUrls {
    gateway: NAME,
    create: EndpointUrl::same("https://api.idpay.ir/v1.1/payment"),
    verify: EndpointUrl::same("https://api.idpay.ir/v1.1/payment/verify"),
    inquiry: Some(EndpointUrl::same("https://api.idpay.ir/v1.1/payment/inquiry")),
    payment_page: PaymentPage {
        url: EndpointUrl::new("https://idpay.ir/p/ws", "https://idpay.ir/p/ws-sandbox"),
        style: PageStyle::Path,
    },
};

/// https://idpay.ir/web-service/v1.1/#ad39f18522
pub static IDPAY_ERRORS: ErrorTable = ErrorTable::new(
    NAME,
    &[
        ("11", "User is blocked"),
        ("12", "API key not found"),
        ("13", "Request IP does not match the registered IP"),
        ("14", "Web service is pending approval or not approved"),
        ("21", "Bank account for the web service is not approved"),
        ("31", "Transaction id is required"),
        ("32", "Order id is required"),
        ("33", "Amount is required"),
        ("34", "Amount is below the minimum"),
        ("35", "Amount is above the maximum"),
        ("36", "Amount exceeds the allowed limit"),
        ("37", "Callback URL is required"),
        ("38", "Callback domain does not match the registered address"),
        ("41", "Transaction status filter is not valid"),
        ("42", "Payment date filter is not valid"),
        ("43", "Settlement date filter is not valid"),
        ("51", "Transaction was not created"),
        ("52", "Inquiry returned no result"),
        ("53", "Payment verification is not possible"),
        ("54", "Payment verification period has expired"),
    ],
);

/// IdPay payment gateway client (v1.1)
///
/// Authenticates with the `X-API-KEY` header and selects the sandbox with
/// `X-SANDBOX`.
pub struct IdPayGateway {
    config: GatewayConfig,
    transport: Arc<dyn HttpTransport>,
}

impl IdPayGateway {
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
        api_key: &str,
        body: Value,
    ) -> Result<TransportRequest> {
        let url = IDPAY_URLS.resolve(endpoint, sandbox, self.config.custom_domain())?;
        debug!(gateway = NAME, endpoint = %endpoint, url = %url, "Resolved endpoint");

        Ok(TransportRequest::new(url, body, self.config.timeout())
            .header("X-API-KEY", api_key)
            .header("X-SANDBOX", if sandbox { "1" } else { "0" }))
    }

    async fn post(&self, request: TransportRequest) -> std::result::Result<Value, TransportError> {
        self.transport.post_json(request).await
    }
}

#[async_trait]
impl PaymentGateway for IdPayGateway {
    async fn request(
        &self,
        input: PaymentRequest,
        sandbox: bool,
    ) -> Result<GatewayOutcome<PaymentInitiated>> {
        let order_id = require_text(input.order_id.as_deref(), "order_id")?;
        let amount = require_amount(input.amount, 1)?;
        let description = require_text(input.description.as_deref(), "description")?;
        let callback = require_text(Some(input.callback_url.as_str()), "callback_url")?;
        let api_key = self.config.resolve_token(input.merchant_id.as_deref())?;

        let mut body = json!({
            "order_id": order_id,
            "amount": amount,
            "desc": description,
            "callback": callback,
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

        let request = self.build_request(Endpoint::Create, sandbox, api_key, body)?;
        info!(gateway = NAME, order_id = %order_id, amount, sandbox, "Creating payment");

        let outcome = match self.post(request).await {
            Ok(response) => match extract_error(&response) {
                Some(error) => IDPAY_ERRORS.classify(error).into(),
                None => match str_field(&response, "id") {
                    Some(id) => GatewayOutcome::Success(PaymentInitiated {
                        redirect_url: IDPAY_URLS.payment_page_url(&id, sandbox),
                        reference: id,
                        order_id: Some(order_id.to_string()),
                        amount: Some(amount),
                        fee: None,
                        raw: response,
                    }),
                    None => IDPAY_ERRORS.invalid_response("success without id").into(),
                },
            },
            Err(e) => IDPAY_ERRORS.classify_transport(e, extract_error).into(),
        };
        trace_outcome(NAME, "request", &outcome);
        Ok(outcome)
    }

    async fn verify(
        &self,
        input: VerifyRequest,
        sandbox: bool,
    ) -> Result<GatewayOutcome<PaymentVerified>> {
        let id = require_text(Some(input.reference.as_str()), "id")?;
        let order_id = require_text(input.order_id.as_deref(), "order_id")?;
        let api_key = self.config.resolve_token(input.merchant_id.as_deref())?;

        let body = json!({ "id": id, "order_id": order_id });
        let request = self.build_request(Endpoint::Verify, sandbox, api_key, body)?;
        info!(gateway = NAME, reference = %id, sandbox, "Verifying payment");

        let outcome = match self.post(request).await {
            Ok(response) => match extract_error(&response) {
                Some(error) => IDPAY_ERRORS.classify(error).into(),
                None => GatewayOutcome::Success(verified_from(id, &response)),
            },
            Err(e) => IDPAY_ERRORS.classify_transport(e, extract_error).into(),
        };
        trace_outcome(NAME, "verify", &outcome);
        Ok(outcome)
    }

    async fn inquiry(
        &self,
        input: InquiryRequest,
        sandbox: bool,
    ) -> Result<GatewayOutcome<PaymentInquiry>> {
        let id = require_text(Some(input.reference.as_str()), "id")?;
        let order_id = require_text(input.order_id.as_deref(), "order_id")?;
        let api_key = self.config.resolve_token(input.merchant_id.as_deref())?;

        let body = json!({ "id": id, "order_id": order_id });
        let request = self.build_request(Endpoint::Inquiry, sandbox, api_key, body)?;
        info!(gateway = NAME, reference = %id, sandbox, "Inquiring payment");

        let outcome = match self.post(request).await {
            Ok(response) => match extract_error(&response) {
                Some(error) => IDPAY_ERRORS.classify(error).into(),
                None => match str_field(&response, "status") {
                    Some(status) => {
                        let payment = response.get("payment").unwrap_or(&Value::Null);
                        GatewayOutcome::Success(PaymentInquiry {
                            reference: id.to_string(),
                            status,
                            amount: u64_field(&response, "amount"),
                            order_id: str_field(&response, "order_id"),
                            card_number: str_field(payment, "card_no"),
                            tracking_code: str_field(payment, "track_id"),
                            paid_at: str_field(payment, "date"),
                            raw: response.clone(),
                        })
                    }
                    None => IDPAY_ERRORS
                        .invalid_response("inquiry without status")
                        .into(),
                },
            },
            Err(e) => IDPAY_ERRORS.classify_transport(e, extract_error).into(),
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

fn verified_from(id: &str, response: &Value) -> PaymentVerified {
    let payment = response.get("payment").unwrap_or(&Value::Null);
    PaymentVerified {
        reference: id.to_string(),
        amount: u64_field(response, "amount").or_else(|| u64_field(payment, "amount")),
        card_number: str_field(payment, "card_no"),
        card_hash: str_field(payment, "hashed_card_no"),
        bank_reference: str_field(payment, "track_id"),
        order_id: str_field(response, "order_id"),
        paid_at: str_field(payment, "date"),
        raw: response.clone(),
    }
}

/// IdPay reports failures as `{error_code, error_message}`.
///
/// A `null` or blank `error_code` counts as no error field at all.
fn extract_error(body: &Value) -> Option<ProviderError> {
    let code = body.get("error_code").and_then(code_to_string)?;
    Some(ProviderError::new(code).with_message(str_field(body, "error_message")))
}
