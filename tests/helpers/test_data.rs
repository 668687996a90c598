// Fixtures for gateway driver tests

use easypay::gateways::{GatewayConfig, PayerInfo, PaymentRequest, VerifyRequest};

pub const CALLBACK_URL: &str = "https://shop.example.com/payment/callback";
pub const SIGN_KEY: &str = "paystar-test-sign-key";

pub fn config_with_token(token: &str) -> GatewayConfig {
    GatewayConfig::builder()
        .token(token)
        .expect("valid token")
        .build()
}

pub fn paystar_config() -> GatewayConfig {
    GatewayConfig::builder()
        .token("gateway-id")
        .and_then(|b| b.sign_key(SIGN_KEY))
        .expect("valid paystar config")
        .build()
}

pub fn payment_request(amount: u64) -> PaymentRequest {
    PaymentRequest::new(amount, CALLBACK_URL)
        .with_description("Order #1001")
        .with_order_id("order-1001")
        .with_payer(PayerInfo {
            name: Some("Sara Ahmadi".to_string()),
            mobile: Some("09120000000".to_string()),
            email: Some("sara@example.com".to_string()),
        })
}

pub fn verify_request(reference: &str, amount: u64) -> VerifyRequest {
    VerifyRequest::new(reference).with_amount(amount)
}
