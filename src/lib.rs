//! EasyPay payment gateway drivers
//!
//! One async client per Iranian payment gateway (ZarinPal, Zibal, IdPay,
//! PayStar) behind a shared [`gateways::PaymentGateway`] trait. Every remote
//! result is normalized into a [`gateways::GatewayOutcome`] that serializes
//! as `{isError, data, error}`.

pub mod config;
pub mod core;
pub mod modules;

// Re-export commonly used types
pub use modules::gateways;
