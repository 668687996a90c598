use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info};

use super::gateway_trait::PaymentGateway;
use super::idpay::IdPayGateway;
use super::paystar::PayStarGateway;
use super::transport::{HttpTransport, ReqwestTransport};
use super::zarinpal::ZarinpalGateway;
use super::zibal::ZibalGateway;
use crate::config::Config;
use crate::core::{AppError, Result};
use crate::modules::gateways::models::{
    GatewayConfig, GatewayOutcome, InquiryRequest, PaymentInitiated, PaymentInquiry,
    PaymentRequest, PaymentVerified, VerifyRequest,
};

/// Supported payment gateways
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayKind {
    Zarinpal,
    Zibal,
    IdPay,
    PayStar,
}

impl GatewayKind {
    pub const ALL: [GatewayKind; 4] = [
        GatewayKind::Zarinpal,
        GatewayKind::Zibal,
        GatewayKind::IdPay,
        GatewayKind::PayStar,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GatewayKind::Zarinpal => "zarinpal",
            GatewayKind::Zibal => "zibal",
            GatewayKind::IdPay => "idpay",
            GatewayKind::PayStar => "paystar",
        }
    }

    /// Prefix of the environment variables configuring this gateway
    pub fn env_prefix(&self) -> &'static str {
        match self {
            GatewayKind::Zarinpal => "ZARINPAL_",
            GatewayKind::Zibal => "ZIBAL_",
            GatewayKind::IdPay => "IDPAY_",
            GatewayKind::PayStar => "PAYSTAR_",
        }
    }

    /// Construct the driver for this gateway
    pub fn build(
        &self,
        config: GatewayConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> Arc<dyn PaymentGateway> {
        match self {
            GatewayKind::Zarinpal => Arc::new(ZarinpalGateway::with_transport(config, transport)),
            GatewayKind::Zibal => Arc::new(ZibalGateway::with_transport(config, transport)),
            GatewayKind::IdPay => Arc::new(IdPayGateway::with_transport(config, transport)),
            GatewayKind::PayStar => Arc::new(PayStarGateway::with_transport(config, transport)),
        }
    }
}

impl fmt::Display for GatewayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GatewayKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zarinpal" => Ok(GatewayKind::Zarinpal),
            "zibal" => Ok(GatewayKind::Zibal),
            "idpay" => Ok(GatewayKind::IdPay),
            "paystar" => Ok(GatewayKind::PayStar),
            other => Err(AppError::not_found(format!("Gateway '{}' not found", other))),
        }
    }
}

/// Service for managing and routing to payment gateways
pub struct GatewayService {
    gateways: HashMap<String, Arc<dyn PaymentGateway>>,
    sandbox: bool,
}

impl GatewayService {
    pub fn new() -> Self {
        Self {
            gateways: HashMap::new(),
            sandbox: false,
        }
    }

    /// Route every call to the gateways' sandbox environments
    pub fn with_sandbox(mut self, sandbox: bool) -> Self {
        self.sandbox = sandbox;
        self
    }

    pub fn sandbox(&self) -> bool {
        self.sandbox
    }

    /// Build and register every gateway present in `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::from_config_with_transport(config, Arc::new(ReqwestTransport::new()))
    }

    /// Same as [`GatewayService::from_config`], with all drivers sharing
    /// `transport`
    pub fn from_config_with_transport(
        config: &Config,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self> {
        config.validate()?;

        let mut service = Self::new().with_sandbox(config.sandbox);
        for (kind, gateway_config) in &config.gateways {
            service.register_gateway(kind.build(gateway_config.clone(), transport.clone()));
        }

        info!(
            gateways = service.gateways.len(),
            sandbox = config.sandbox,
            "Gateway service initialized"
        );
        Ok(service)
    }

    /// Register a gateway, replacing any previous one with the same name
    pub fn register_gateway(&mut self, gateway: Arc<dyn PaymentGateway>) {
        let name = gateway.name().to_string();
        self.gateways.insert(name, gateway);
    }

    /// Get a gateway by name
    pub fn get_gateway(&self, name: &str) -> Result<Arc<dyn PaymentGateway>> {
        self.gateways
            .get(name)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("Gateway '{}' not found", name)))
    }

    /// Create a payment using the specified gateway
    pub async fn request(
        &self,
        gateway_name: &str,
        input: PaymentRequest,
    ) -> Result<GatewayOutcome<PaymentInitiated>> {
        info!(
            gateway = %gateway_name,
            amount = input.amount,
            order_id = ?input.order_id,
            "Creating payment with gateway"
        );

        let gateway = self.get_gateway(gateway_name)?;
        let outcome = gateway
            .request(input, self.sandbox)
            .await
            .inspect_err(|e| log_rejected(gateway_name, "request", e))?;

        if let GatewayOutcome::Success(initiated) = &outcome {
            info!(
                gateway = %gateway_name,
                reference = %initiated.reference,
                "Payment created successfully"
            );
        }
        Ok(outcome)
    }

    /// Verify a payment using the specified gateway
    pub async fn verify(
        &self,
        gateway_name: &str,
        input: VerifyRequest,
    ) -> Result<GatewayOutcome<PaymentVerified>> {
        info!(
            gateway = %gateway_name,
            reference = %input.reference,
            "Verifying payment with gateway"
        );

        let gateway = self.get_gateway(gateway_name)?;
        gateway
            .verify(input, self.sandbox)
            .await
            .inspect_err(|e| log_rejected(gateway_name, "verify", e))
    }

    /// Inquire a payment using the specified gateway
    pub async fn inquiry(
        &self,
        gateway_name: &str,
        input: InquiryRequest,
    ) -> Result<GatewayOutcome<PaymentInquiry>> {
        info!(
            gateway = %gateway_name,
            reference = %input.reference,
            "Inquiring payment with gateway"
        );

        let gateway = self.get_gateway(gateway_name)?;
        gateway
            .inquiry(input, self.sandbox)
            .await
            .inspect_err(|e| log_rejected(gateway_name, "inquiry", e))
    }

    /// List all registered gateways, sorted by name
    pub fn list_gateways(&self) -> Vec<GatewayInfo> {
        let mut gateways: Vec<GatewayInfo> = self
            .gateways
            .values()
            .map(|gateway| GatewayInfo {
                name: gateway.name().to_string(),
                supports_inquiry: gateway.supports_inquiry(),
            })
            .collect();
        gateways.sort_by(|a, b| a.name.cmp(&b.name));
        gateways
    }
}

impl Default for GatewayService {
    fn default() -> Self {
        Self::new()
    }
}

fn log_rejected(gateway: &str, operation: &str, e: &AppError) {
    error!(
        gateway = %gateway,
        operation = %operation,
        error = %e,
        "Gateway call rejected before sending"
    );
}

/// Gateway information for listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GatewayInfo {
    pub name: String,
    pub supports_inquiry: bool,
}
