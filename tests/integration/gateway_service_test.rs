// Gateway registry: construction from configuration, routing by name and
// sandbox propagation.

#[path = "../helpers/mod.rs"]
mod helpers;

use easypay::config::Config;
use easypay::core::AppError;
use easypay::gateways::{
    GatewayInfo, GatewayKind, GatewayService, InquiryRequest, VerifyRequest, ZibalGateway,
};
use helpers::*;
use serde_json::json;
use std::sync::Arc;

fn config(vars: &[(&str, &str)]) -> Config {
    let vars: Vec<(String, String)> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Config::from_lookup(move |key| {
        vars.iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    })
    .unwrap()
}

#[test]
fn test_from_config_registers_configured_gateways() {
    let config = config(&[
        ("ZARINPAL_TOKEN", "merchant"),
        ("PAYSTAR_TOKEN", "gateway-id"),
        ("PAYSTAR_SIGN_KEY", SIGN_KEY),
    ]);

    let service =
        GatewayService::from_config_with_transport(&config, shared(&MockTransport::new()))
            .unwrap();

    assert_eq!(
        service.list_gateways(),
        vec![
            GatewayInfo {
                name: "paystar".to_string(),
                supports_inquiry: true
            },
            GatewayInfo {
                name: "zarinpal".to_string(),
                supports_inquiry: false
            },
        ]
    );
    assert!(service.get_gateway("zibal").is_err());
}

#[test]
fn test_from_config_validates() {
    let config = config(&[("PAYSTAR_TOKEN", "gateway-id")]);

    let result = GatewayService::from_config_with_transport(&config, shared(&MockTransport::new()));

    assert!(matches!(result, Err(AppError::Configuration(_))));
}

#[tokio::test]
async fn test_routes_request_by_name_in_sandbox() {
    let transport = MockTransport::new();
    transport.push_ok(json!({ "trackId": 42, "result": 100 }));
    let config = config(&[("ZIBAL_TOKEN", "merchant"), ("PAYMENT_SANDBOX", "true")]);
    let service = GatewayService::from_config_with_transport(&config, shared(&transport)).unwrap();

    let outcome = service
        .request("zibal", payment_request(15_000))
        .await
        .unwrap();

    assert_eq!(outcome.data().unwrap().reference, "42");
    // sandbox swaps in the public test merchant
    assert_eq!(transport.last_request().body["merchant"], "zibal");
}

#[tokio::test]
async fn test_unknown_gateway_is_not_found() {
    let service = GatewayService::new();

    let err = service
        .verify("mellat", VerifyRequest::new("1"))
        .await
        .unwrap_err();

    assert_eq!(err, AppError::not_found("Gateway 'mellat' not found"));
}

#[tokio::test]
async fn test_inquiry_on_gateway_without_inquiry() {
    let transport = MockTransport::new();
    let mut service = GatewayService::new();
    service.register_gateway(Arc::new(ZibalGateway::with_transport(
        config_with_token("merchant"),
        shared(&transport),
    )));

    let err = service
        .inquiry("zibal", InquiryRequest::new("1"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Unsupported(_)));
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn test_drivers_are_shareable_across_tasks() {
    let transport = MockTransport::new();
    for id in 0..4 {
        transport.push_ok(json!({ "trackId": id, "result": 100 }));
    }
    let gateway = GatewayKind::Zibal.build(config_with_token("merchant"), shared(&transport));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let gateway = gateway.clone();
            tokio::spawn(async move { gateway.request(payment_request(15_000), false).await })
        })
        .collect();

    for handle in handles {
        let outcome = handle.await.unwrap().unwrap();
        assert!(!outcome.is_error());
    }
    assert_eq!(transport.call_count(), 4);
}
