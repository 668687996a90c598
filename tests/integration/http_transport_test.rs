// Drivers over the real reqwest transport against a local HTTP server.
//
// Gateway URLs are fixed HTTPS hosts, so requests go through
// RewriteTransport, which points them at the wiremock server and keeps the
// gateway path.

#[path = "../helpers/mod.rs"]
mod helpers;

use std::time::Duration;

use easypay::gateways::{ErrorKind, GatewayConfig, IdPayGateway, PaymentGateway, ZarinpalGateway};
use helpers::*;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_zarinpal_request_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/pg/v4/payment/request.json"))
        .and(header("Content-Type", "application/json"))
        .and(body_partial_json(json!({ "merchant_id": "merchant", "amount": 20_000 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "code": 100, "message": "Success", "authority": "A0001", "fee": 0 },
            "errors": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = ZarinpalGateway::with_transport(
        config_with_token("merchant"),
        RewriteTransport::new(server.uri()),
    );
    let outcome = gateway.request(payment_request(20_000), false).await.unwrap();

    assert_eq!(
        outcome.data().unwrap().redirect_url,
        "https://www.zarinpal.com/pg/StartPay/A0001"
    );
}

#[tokio::test]
async fn test_idpay_error_status_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1.1/payment"))
        .and(header("X-API-KEY", "key"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error_code": 11,
            "error_message": "user blocked"
        })))
        .mount(&server)
        .await;

    let gateway =
        IdPayGateway::with_transport(config_with_token("key"), RewriteTransport::new(server.uri()));
    let outcome = gateway.request(payment_request(10_000), false).await.unwrap();

    let failure = outcome.error().unwrap();
    assert_eq!(failure.kind, ErrorKind::Payment);
    assert_eq!(failure.code, "11");
}

#[tokio::test]
async fn test_html_error_page_is_api_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let gateway = ZarinpalGateway::with_transport(
        config_with_token("merchant"),
        RewriteTransport::new(server.uri()),
    );
    let outcome = gateway.request(payment_request(20_000), false).await.unwrap();

    let failure = outcome.error().unwrap();
    assert_eq!(failure.kind, ErrorKind::Api);
    assert_eq!(failure.code, "502");
}

#[tokio::test]
async fn test_slow_gateway_times_out_as_network_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "data": { "code": 100 } }))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let config = GatewayConfig::builder()
        .token("merchant")
        .and_then(|b| b.timeout(Duration::from_millis(50)))
        .unwrap()
        .build();
    let gateway = ZarinpalGateway::with_transport(config, RewriteTransport::new(server.uri()));
    let outcome = gateway.request(payment_request(20_000), false).await.unwrap();

    let failure = outcome.error().unwrap();
    assert_eq!(failure.kind, ErrorKind::Network);
    assert!(failure.message.starts_with("Network error:"));
}
