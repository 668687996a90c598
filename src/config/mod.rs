use std::collections::BTreeMap;
use std::env;

use crate::core::{AppError, Result};
use crate::modules::gateways::{GatewayConfig, GatewayKind};

pub mod logging;

pub use logging::{LogConfig, LogFormat};

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub log: LogConfig,
    /// Send every call to the gateways' sandbox environments
    pub sandbox: bool,
    /// Gateways with a configured token
    pub gateways: BTreeMap<GatewayKind, GatewayConfig>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let log = LogConfig {
            level: var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            format: var("LOG_FORMAT")
                .map(|v| v.parse::<LogFormat>())
                .transpose()?
                .unwrap_or_default(),
        };

        let sandbox = match var("PAYMENT_SANDBOX") {
            Some(v) => parse_bool(&v).ok_or_else(|| {
                AppError::configuration(format!("Invalid PAYMENT_SANDBOX: {}", v))
            })?,
            None => false,
        };

        let mut gateways = BTreeMap::new();
        for kind in GatewayKind::ALL {
            let prefix = kind.env_prefix();
            let Some(token) = var(&format!("{}TOKEN", prefix)) else {
                continue;
            };

            let mut builder = GatewayConfig::builder().token(token)?;
            if let Some(sign_key) = var(&format!("{}SIGN_KEY", prefix)) {
                builder = builder.sign_key(sign_key)?;
            }
            if let Some(domain) = var(&format!("{}CUSTOM_DOMAIN", prefix)) {
                builder = builder.custom_domain(domain)?;
            }
            if let Some(timeout) = var(&format!("{}TIMEOUT_MS", prefix)) {
                let timeout_ms = timeout.trim().parse::<u64>().map_err(|_| {
                    AppError::configuration(format!("Invalid {}TIMEOUT_MS: {}", prefix, timeout))
                })?;
                builder = builder.timeout_ms(timeout_ms)?;
            }
            gateways.insert(kind, builder.build());
        }

        Ok(Config {
            log,
            sandbox,
            gateways,
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if let Some(paystar) = self.gateways.get(&GatewayKind::PayStar) {
            if paystar.sign_key().is_none() {
                return Err(AppError::configuration(
                    "PAYSTAR_SIGN_KEY must be set when PayStar is configured",
                ));
            }
        }

        Ok(())
    }

    pub fn gateway(&self, kind: GatewayKind) -> Option<&GatewayConfig> {
        self.gateways.get(&kind)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
