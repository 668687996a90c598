// PayStar driver flow: bearer authentication, signed create/verify bodies,
// status sentinel and inquiry.

#[path = "../helpers/mod.rs"]
mod helpers;

use std::sync::Arc;

use easypay::core::AppError;
use easypay::gateways::{
    ErrorKind, GatewayConfig, InquiryRequest, PayStarGateway, PaymentGateway, VerifyRequest,
};
use helpers::*;
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha512;

const REF_NUM: &str = "BPLNR4gB";
const TOKEN: &str = "ae9e2ed4c1b5d1cf1d1a";

fn gateway(config: GatewayConfig) -> (PayStarGateway, Arc<MockTransport>) {
    let transport = MockTransport::new();
    (
        PayStarGateway::with_transport(config, shared(&transport)),
        transport,
    )
}

fn hmac_hex(message: &str) -> String {
    let mut mac = Hmac::<Sha512>::new_from_slice(SIGN_KEY.as_bytes()).unwrap();
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

fn signed_verify_request() -> VerifyRequest {
    VerifyRequest::new(REF_NUM)
        .with_amount(10_000)
        .with_card_number("610433******1064")
        .with_tracking_code("214553")
}

#[tokio::test]
async fn test_request_is_signed() {
    let (gateway, transport) = gateway(paystar_config());
    transport.push_ok(json!({
        "status": 1,
        "message": "success",
        "data": {
            "token": TOKEN,
            "ref_num": REF_NUM,
            "order_id": "order-1001",
            "payment_amount": 10_000
        }
    }));

    let outcome = gateway.request(payment_request(10_000), false).await.unwrap();

    let initiated = outcome.data().expect("success");
    assert_eq!(initiated.reference, REF_NUM);
    assert_eq!(
        initiated.redirect_url,
        format!("https://core.paystar.ir/api/pardakht/payment?token={}", TOKEN)
    );
    assert_eq!(initiated.amount, Some(10_000));

    let sent = transport.last_request();
    assert_eq!(sent.url, "https://core.paystar.ir/api/pardakht/create");
    assert_eq!(sent.header_value("Authorization"), Some("Bearer gateway-id"));
    assert_eq!(
        sent.body["sign"],
        hmac_hex(&format!("10000#order-1001#{}", CALLBACK_URL))
    );
    assert_eq!(sent.body["name"], "Sara Ahmadi");
    assert_eq!(sent.body["description"], "Order #1001");
}

#[tokio::test]
async fn test_minimum_amount() {
    let (gateway, transport) = gateway(paystar_config());

    let err = gateway
        .request(payment_request(4_999), false)
        .await
        .unwrap_err();

    assert_eq!(err, AppError::validation("amount must be at least 5000"));
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn test_missing_sign_key_fails_before_network() {
    let (gateway, transport) = gateway(config_with_token("gateway-id"));

    let err = gateway
        .request(payment_request(10_000), false)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Configuration(_)));
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn test_ok_status_string_is_success() {
    let (gateway, transport) = gateway(paystar_config());
    transport.push_ok(json!({
        "status": "ok",
        "data": { "token": TOKEN, "ref_num": REF_NUM }
    }));

    let outcome = gateway.request(payment_request(10_000), false).await.unwrap();

    assert!(!outcome.is_error());
}

#[tokio::test]
async fn test_negative_status_is_payment_failure() {
    let (gateway, transport) = gateway(paystar_config());
    transport.push_ok(json!({ "status": -2, "message": "gateway inactive", "data": {} }));

    let outcome = gateway.request(payment_request(10_000), false).await.unwrap();

    let failure = outcome.error().unwrap();
    assert_eq!(failure.kind, ErrorKind::Payment);
    assert_eq!(failure.code, "-2");
    assert_eq!(failure.message, "Gateway is not active");
}

#[tokio::test]
async fn test_unrecognized_status_is_api_failure() {
    for status in [json!(null), json!(true), json!(false), json!("")] {
        let (gateway, transport) = gateway(paystar_config());
        transport.push_ok(json!({
            "status": status,
            "data": { "token": TOKEN, "ref_num": REF_NUM }
        }));

        let outcome = gateway.request(payment_request(10_000), false).await.unwrap();

        let failure = outcome.error().expect("status is not a success sentinel");
        assert_eq!(failure.kind, ErrorKind::Api);
        assert_eq!(failure.code, "INVALID_RESPONSE");
        assert!(outcome.data().is_none());
    }
}

#[tokio::test]
async fn test_verify_signature_covers_callback_fields() {
    let (gateway, transport) = gateway(paystar_config());
    transport.push_ok(json!({
        "status": 1,
        "message": "success",
        "data": { "price": 10_000, "ref_num": REF_NUM, "card_number": "610433******1064" }
    }));

    let outcome = gateway
        .verify(signed_verify_request(), false)
        .await
        .unwrap();

    let verified = outcome.data().unwrap();
    assert_eq!(verified.reference, REF_NUM);
    assert_eq!(verified.amount, Some(10_000));
    assert_eq!(verified.card_number.as_deref(), Some("610433******1064"));

    let sent = transport.last_request();
    assert_eq!(sent.url, "https://core.paystar.ir/api/pardakht/verify");
    assert_eq!(
        sent.body,
        json!({
            "ref_num": REF_NUM,
            "amount": 10_000,
            "sign": hmac_hex(&format!("10000#{}#610433******1064#214553", REF_NUM)),
        })
    );
}

#[tokio::test]
async fn test_verify_requires_callback_fields() {
    let (gateway, transport) = gateway(paystar_config());

    let err = gateway
        .verify(VerifyRequest::new(REF_NUM).with_amount(10_000), false)
        .await
        .unwrap_err();

    assert_eq!(err, AppError::validation("card_number is required"));
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn test_already_verified_in_error_status() {
    let (gateway, transport) = gateway(paystar_config());
    transport.push_status(400, json!({ "status": -6, "message": "already verified" }));

    let outcome = gateway
        .verify(signed_verify_request(), false)
        .await
        .unwrap();

    let failure = outcome.error().unwrap();
    assert_eq!(failure.kind, ErrorKind::Payment);
    assert_eq!(failure.message, "Transaction already verified");
}

#[tokio::test]
async fn test_inquiry_is_unsigned() {
    let (gateway, transport) = gateway(paystar_config());
    transport.push_ok(json!({
        "status": 1,
        "data": {
            "ref_num": REF_NUM,
            "status": "SUCCEED",
            "payment_date": "2024-05-12 10:32:11",
            "payment_amount": 10_000,
            "order_id": "order-1001",
            "ref_id": "r-1",
            "tracking_code": "214553",
            "card_number": "610433******1064",
            "hashed_card_number": "hash"
        }
    }));

    let outcome = gateway
        .inquiry(InquiryRequest::new(REF_NUM), false)
        .await
        .unwrap();

    let inquiry = outcome.data().unwrap();
    assert_eq!(inquiry.status, "SUCCEED");
    assert_eq!(inquiry.amount, Some(10_000));
    assert_eq!(inquiry.tracking_code.as_deref(), Some("214553"));

    let sent = transport.last_request();
    assert_eq!(sent.url, "https://core.paystar.ir/api/pardakht/inquiry");
    assert_eq!(sent.body, json!({ "ref_num": REF_NUM }));
}

#[tokio::test]
async fn test_inquiry_network_failure() {
    let (gateway, transport) = gateway(paystar_config());
    transport.push_network_error("dns error");

    let outcome = gateway
        .inquiry(InquiryRequest::new(REF_NUM), false)
        .await
        .unwrap();

    assert_eq!(outcome.error().unwrap().kind, ErrorKind::Network);
}
