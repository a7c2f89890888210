//! Configuration types for the cfddns synchronizer
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};

use crate::traits::IpFamily;

/// Cloudflare API v4 base URL
pub const DEFAULT_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default IPv4-only address-echo service
pub const DEFAULT_IPV4_URL: &str = "https://v4.ident.me";

/// Default IPv6-only address-echo service
pub const DEFAULT_IPV6_URL: &str = "https://v6.ident.me";

/// Main sync configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Zone / root domain (e.g. "example.com")
    pub domain: String,

    /// Subdomain label; "" or "@" targets the domain itself
    pub record_label: String,

    /// Address families to reconcile
    #[serde(default = "default_families")]
    pub families: Vec<IpFamily>,

    /// DNS provider configuration
    pub provider: ProviderConfig,

    /// Address discovery configuration
    #[serde(default)]
    pub ip_source: IpSourceConfig,

    /// Per-request HTTP timeout (in seconds)
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
}

impl SyncConfig {
    /// Create a configuration with default families, endpoints and timeout
    pub fn new(
        api_token: impl Into<String>,
        domain: impl Into<String>,
        record_label: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            record_label: record_label.into(),
            families: default_families(),
            provider: ProviderConfig::new(api_token),
            ip_source: IpSourceConfig::default(),
            http_timeout_secs: default_http_timeout_secs(),
        }
    }

    /// Restrict reconciliation to the given families
    pub fn with_families(mut self, families: Vec<IpFamily>) -> Self {
        self.families = families;
        self
    }

    /// Fully-qualified name of the record to keep in sync
    ///
    /// `home` + `example.com` gives `home.example.com`; an empty label or `@`
    /// gives the apex `example.com`.
    pub fn record_name(&self) -> String {
        let label = self.record_label.trim().trim_end_matches('.');
        if label.is_empty() || label == "@" {
            self.domain.clone()
        } else {
            format!("{}.{}", label, self.domain)
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.provider.validate()?;

        if self.domain.is_empty() {
            return Err(crate::Error::config("Domain cannot be empty"));
        }
        validate_domain_name(&self.domain)?;

        let label = self.record_label.trim();
        if !label.is_empty() && label != "@" {
            validate_domain_name(&self.record_name())?;
        }

        if self.families.is_empty() {
            return Err(crate::Error::config(
                "At least one address family (v4, v6) must be enabled",
            ));
        }

        for family in &self.families {
            self.ip_source.validate_url(*family)?;
        }

        if !(1..=300).contains(&self.http_timeout_secs) {
            return Err(crate::Error::config(format!(
                "HTTP timeout must be between 1 and 300 seconds. Got: {}",
                self.http_timeout_secs
            )));
        }

        Ok(())
    }
}

/// DNS provider configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API bearer token
    pub api_token: String,

    /// API base URL
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Perform reads but only log intended updates
    #[serde(default)]
    pub dry_run: bool,
}

// Keeps the token out of logs
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_token", &"<REDACTED>")
            .field("api_base", &self.api_base)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl ProviderConfig {
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            api_base: default_api_base(),
            dry_run: false,
        }
    }

    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.api_token.trim().is_empty() {
            return Err(crate::Error::config("API token cannot be empty"));
        }
        validate_http_url("API base URL", &self.api_base)
    }
}

/// Address-echo endpoints, one per family
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpSourceConfig {
    #[serde(default = "default_ipv4_url")]
    pub ipv4_url: String,
    #[serde(default = "default_ipv6_url")]
    pub ipv6_url: String,
}

impl IpSourceConfig {
    /// Endpoint queried for `family`
    pub fn url(&self, family: IpFamily) -> &str {
        match family {
            IpFamily::V4 => &self.ipv4_url,
            IpFamily::V6 => &self.ipv6_url,
        }
    }

    fn validate_url(&self, family: IpFamily) -> Result<(), crate::Error> {
        validate_http_url(&format!("{} echo URL", family), self.url(family))
    }
}

impl Default for IpSourceConfig {
    fn default() -> Self {
        Self {
            ipv4_url: default_ipv4_url(),
            ipv6_url: default_ipv6_url(),
        }
    }
}

fn default_families() -> Vec<IpFamily> {
    IpFamily::ALL.to_vec()
}

fn default_http_timeout_secs() -> u64 {
    30
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_ipv4_url() -> String {
    DEFAULT_IPV4_URL.to_string()
}

fn default_ipv6_url() -> String {
    DEFAULT_IPV6_URL.to_string()
}

fn validate_http_url(what: &str, url: &str) -> Result<(), crate::Error> {
    if url.is_empty() {
        return Err(crate::Error::config(format!("{} cannot be empty", what)));
    }
    if !url.starts_with("https://") && !url.starts_with("http://") {
        return Err(crate::Error::config(format!(
            "{} must use HTTP or HTTPS scheme. Got: {}",
            what, url
        )));
    }
    Ok(())
}

/// Validate that a string is a valid domain name
///
/// Basic RFC 1035 checks: total length, label length, characters, hyphens.
pub fn validate_domain_name(domain: &str) -> Result<(), crate::Error> {
    if domain.is_empty() {
        return Err(crate::Error::config("Domain name cannot be empty"));
    }

    if domain.len() > 253 {
        return Err(crate::Error::config(format!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        )));
    }

    for label in domain.split('.') {
        if label.is_empty() {
            return Err(crate::Error::config(format!(
                "Domain name has empty label: '{}'",
                domain
            )));
        }

        if label.len() > 63 {
            return Err(crate::Error::config(format!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            )));
        }

        // Underscore allowed for service-style labels
        if !label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(crate::Error::config(format!(
                "Domain label contains invalid characters. Label: '{}'",
                label
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(crate::Error::config(format!(
                "Domain label cannot start or end with hyphen. Label: '{}'",
                label
            )));
        }
    }

    Ok(())
}
