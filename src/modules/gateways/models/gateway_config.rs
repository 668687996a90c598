use std::fmt;
use std::time::Duration;

use url::Url;

use crate::core::{AppError, Result};

/// Request timeout used when none is configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Per-driver gateway configuration
///
/// Built once through [`GatewayConfig::builder`] and owned by a single driver
/// instance. Immutable after construction.
#[derive(Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    token: Option<String>,
    sign_key: Option<String>,
    custom_domain: Option<String>,
    timeout: Duration,
}

impl GatewayConfig {
    pub fn builder() -> GatewayConfigBuilder {
        GatewayConfigBuilder::default()
    }

    /// Merchant id, API key or gateway id, depending on the gateway
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// HMAC signing key (PayStar)
    pub fn sign_key(&self) -> Option<&str> {
        self.sign_key.as_deref()
    }

    /// Normalized custom API host, without scheme or trailing slash
    pub fn custom_domain(&self) -> Option<&str> {
        self.custom_domain.as_deref()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Pick the per-call credential override, falling back to the configured
    /// token
    pub fn resolve_token<'a>(&'a self, override_token: Option<&'a str>) -> Result<&'a str> {
        override_token
            .filter(|t| !t.trim().is_empty())
            .or(self.token())
            .ok_or_else(|| {
                AppError::configuration(
                    "gateway token is not set; configure it or pass merchant_id in the request",
                )
            })
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            token: None,
            sign_key: None,
            custom_domain: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

// Credentials never reach log output
impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("sign_key", &self.sign_key.as_ref().map(|_| "<redacted>"))
            .field("custom_domain", &self.custom_domain)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Builder for [`GatewayConfig`]
///
/// Every setter validates its input and fails fast, so a config that builds
/// is always usable.
///
/// ```
/// use easypay::gateways::GatewayConfig;
/// use std::time::Duration;
///
/// # fn main() -> easypay::core::Result<()> {
/// let config = GatewayConfig::builder()
///     .token("merchant-id")?
///     .timeout(Duration::from_secs(15))?
///     .custom_domain("https://api.example.com/")?
///     .build();
/// assert_eq!(config.custom_domain(), Some("api.example.com"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default, Clone)]
pub struct GatewayConfigBuilder {
    config: GatewayConfig,
}

impl GatewayConfigBuilder {
    pub fn token(mut self, token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(AppError::configuration("token must not be empty"));
        }
        self.config.token = Some(token);
        Ok(self)
    }

    pub fn sign_key(mut self, sign_key: impl Into<String>) -> Result<Self> {
        let sign_key = sign_key.into();
        if sign_key.is_empty() {
            return Err(AppError::configuration("sign key must not be empty"));
        }
        self.config.sign_key = Some(sign_key);
        Ok(self)
    }

    pub fn timeout(mut self, timeout: Duration) -> Result<Self> {
        if timeout.is_zero() {
            return Err(AppError::configuration("timeout must be greater than 0"));
        }
        self.config.timeout = timeout;
        Ok(self)
    }

    pub fn timeout_ms(self, timeout_ms: u64) -> Result<Self> {
        self.timeout(Duration::from_millis(timeout_ms))
    }

    /// Host that fronts the gateway API. A leading scheme and trailing slash
    /// are stripped.
    pub fn custom_domain(mut self, domain: impl AsRef<str>) -> Result<Self> {
        self.config.custom_domain = Some(normalize_custom_domain(domain.as_ref())?);
        Ok(self)
    }

    pub fn build(self) -> GatewayConfig {
        self.config
    }
}

/// Reduce an operator-supplied custom domain to `host[:port]`.
///
/// A leading scheme and trailing slashes are stripped. Anything else a URL
/// can carry (userinfo, path, query, fragment) is rejected.
pub fn normalize_custom_domain(domain: &str) -> Result<String> {
    let trimmed = domain.trim();
    let stripped = trimmed
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(trimmed)
        .trim_end_matches('/');

    if stripped.is_empty() {
        return Err(AppError::configuration("custom domain must not be empty"));
    }

    let not_a_host = || {
        AppError::configuration(format!(
            "custom domain must be a bare host, got '{}'",
            domain
        ))
    };
    // the URL parser silently drops tabs and newlines
    if stripped.chars().any(char::is_whitespace) {
        return Err(not_a_host());
    }

    let parsed = Url::parse(&format!("https://{}", stripped)).map_err(|_| not_a_host())?;
    if !parsed.username().is_empty()
        || parsed.password().is_some()
        || parsed.path() != "/"
        || parsed.query().is_some()
        || parsed.fragment().is_some()
    {
        return Err(not_a_host());
    }

    let host = parsed.host_str().ok_or_else(not_a_host)?;
    Ok(match parsed.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}
