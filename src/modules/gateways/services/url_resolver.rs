use std::fmt;

use url::Url;

use crate::core::{AppError, Result};
use crate::modules::gateways::models::normalize_custom_domain;

/// Logical API endpoint of a gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Create,
    Verify,
    Inquiry,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Create => write!(f, "create"),
            Endpoint::Verify => write!(f, "verify"),
            Endpoint::Inquiry => write!(f, "inquiry"),
        }
    }
}

/// Production and sandbox URL of one endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointUrl {
    pub production: &'static str,
    pub sandbox: &'static str,
}

impl EndpointUrl {
    pub const fn new(production: &'static str, sandbox: &'static str) -> Self {
        Self {
            production,
            sandbox,
        }
    }

    /// Gateways that select their sandbox by credential or header use the
    /// production host for both
    pub const fn same(url: &'static str) -> Self {
        Self::new(url, url)
    }

    fn select(&self, sandbox: bool) -> &'static str {
        if sandbox {
            self.sandbox
        } else {
            self.production
        }
    }
}

/// How the reference is attached to the payment page base
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStyle {
    /// `<base>/<reference>`
    Path,
    /// `<base><reference>`, base ends in `?param=`
    Query,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentPage {
    pub url: EndpointUrl,
    pub style: PageStyle,
}

/// Static URL table of one gateway
#[derive(Debug, Clone, Copy)]
pub struct GatewayUrls {
    pub gateway: &'static str,
    pub create: EndpointUrl,
    pub verify: EndpointUrl,
    pub inquiry: Option<EndpointUrl>,
    pub payment_page: PaymentPage,
}

impl GatewayUrls {
    /// Absolute URL of an API endpoint.
    ///
    /// A custom domain replaces the host of the default URL and keeps its
    /// path.
    pub fn resolve(
        &self,
        endpoint: Endpoint,
        sandbox: bool,
        custom_domain: Option<&str>,
    ) -> Result<String> {
        let urls = match endpoint {
            Endpoint::Create => self.create,
            Endpoint::Verify => self.verify,
            Endpoint::Inquiry => self.inquiry.ok_or_else(|| {
                AppError::unsupported(format!("{} has no {} endpoint", self.gateway, endpoint))
            })?,
        };

        let default_url = urls.select(sandbox);
        Ok(match custom_domain {
            Some(domain) => substitute_host(default_url, domain)?,
            None => default_url.to_string(),
        })
    }

    /// Payment page URL for a transaction reference.
    ///
    /// Always on the gateway's own domain, whatever custom domain is
    /// configured.
    pub fn payment_page_url(&self, reference: &str, sandbox: bool) -> String {
        let base = self.payment_page.url.select(sandbox);
        match self.payment_page.style {
            PageStyle::Path => format!(
                "{}/{}",
                base.trim_end_matches('/'),
                reference.trim_start_matches('/')
            ),
            PageStyle::Query => format!("{}{}", base, reference),
        }
    }
}

/// Move `default_url` onto the custom `host[:port]` over https, keeping its
/// path and query
fn substitute_host(default_url: &str, domain: &str) -> Result<String> {
    let domain = normalize_custom_domain(domain)?;
    let invalid = || AppError::configuration(format!("invalid custom domain '{}'", domain));

    let target = Url::parse(&format!("https://{}", domain)).map_err(|_| invalid())?;
    let mut url = Url::parse(default_url).map_err(|e| {
        AppError::configuration(format!("invalid gateway URL '{}': {}", default_url, e))
    })?;

    url.set_scheme("https").map_err(|_| invalid())?;
    url.set_host(target.host_str()).map_err(|_| invalid())?;
    url.set_port(target.port()).map_err(|_| invalid())?;

    Ok(url.to_string())
}
