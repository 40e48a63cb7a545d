//! Configuration types for the ImprovMX system
//!
//! This module defines the API client settings and the declared
//! configuration of domain resources.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::model::{AliasSet, Domain};

/// Default ImprovMX API endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.improvmx.com/v3";

/// Environment variable holding the API key
pub const ENV_API_KEY: &str = "IMPROVMX_API_KEY";

/// Environment variable overriding the API endpoint
pub const ENV_BASE_URL: &str = "IMPROVMX_BASE_URL";

/// Settings for the remote API client
#[derive(Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// ImprovMX API key
    /// ⚠️ NEVER log this value
    pub api_key: String,

    /// API base URL, without a trailing slash
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout (in seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

// Custom Debug implementation that hides the API key
impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl ClientConfig {
    /// Create a configuration with defaults for everything but the key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }

    /// Set the API base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the request timeout
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Load configuration from `IMPROVMX_API_KEY` and `IMPROVMX_BASE_URL`
    pub fn from_env() -> Result<Self, crate::Error> {
        let api_key = std::env::var(ENV_API_KEY)
            .map_err(|_| crate::Error::config(format!("{} must be set", ENV_API_KEY)))?;

        let mut config = Self::new(api_key);
        if let Ok(base_url) = std::env::var(ENV_BASE_URL)
            && !base_url.is_empty()
        {
            config = config.with_base_url(base_url);
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.api_key.trim().is_empty() {
            return Err(crate::Error::config("ImprovMX API key cannot be empty"));
        }
        if !self.base_url.starts_with("https://") && !self.base_url.starts_with("http://") {
            return Err(crate::Error::config(format!(
                "API base URL must use HTTP or HTTPS scheme. Got: {}",
                self.base_url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(crate::Error::config("Request timeout must be > 0"));
        }
        Ok(())
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("improvmx-rs/{}", env!("CARGO_PKG_VERSION"))
}

/// Declared configuration of one domain resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainConfig {
    /// Domain name; immutable once created
    pub domain: String,

    /// Email to send the notifications to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_email: Option<String>,

    /// Parent domain displayed for the DNS settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whitelabel: Option<String>,

    /// Endpoint receiving email events as POST requests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook: Option<String>,

    /// Declared aliases; `None` leaves the remote aliases unmanaged
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<AliasSet>,
}

impl DomainConfig {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            ..Self::default()
        }
    }

    /// Set the declared aliases
    pub fn with_aliases(mut self, aliases: AliasSet) -> Self {
        self.alias = Some(aliases);
        self
    }

    /// Set the notification email
    pub fn with_notification_email(mut self, email: impl Into<String>) -> Self {
        self.notification_email = Some(email.into());
        self
    }

    /// Set the webhook URL
    pub fn with_webhook(mut self, webhook: impl Into<String>) -> Self {
        self.webhook = Some(webhook.into());
        self
    }

    /// Build the add/update payload from the writable attributes
    pub fn to_payload(&self) -> Domain {
        Domain {
            domain: self.domain.clone(),
            notification_email: self.notification_email.clone().unwrap_or_default(),
            whitelabel: self.whitelabel.clone().unwrap_or_default(),
            webhook: self.webhook.clone().unwrap_or_default(),
            ..Domain::default()
        }
    }

    /// Declared aliases, empty when the attribute is absent
    pub fn aliases(&self) -> AliasSet {
        self.alias.clone().unwrap_or_default()
    }

    /// Validate the declared attributes
    pub fn validate(&self) -> Result<(), crate::Error> {
        validate_domain_name(&self.domain)?;

        if let Some(aliases) = &self.alias {
            for alias in aliases.iter() {
                if alias.alias.trim().is_empty() {
                    return Err(crate::Error::config(format!(
                        "Domain '{}' declares an alias with an empty local-part",
                        self.domain
                    )));
                }
                if alias.forward.trim().is_empty() {
                    return Err(crate::Error::config(format!(
                        "Alias '{}' of domain '{}' has no forward target",
                        alias.alias, self.domain
                    )));
                }
            }
        }

        if let Some(webhook) = &self.webhook
            && !webhook.is_empty()
            && !webhook.starts_with("https://")
            && !webhook.starts_with("http://")
        {
            return Err(crate::Error::config(format!(
                "Webhook of domain '{}' must use HTTP or HTTPS scheme. Got: {}",
                self.domain, webhook
            )));
        }

        Ok(())
    }
}

/// A declared configuration file: every domain under management
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeclaredConfig {
    #[serde(default)]
    pub domains: Vec<DomainConfig>,
}

impl DeclaredConfig {
    /// Parse a declared configuration from JSON text
    pub fn from_json(text: &str) -> Result<Self, crate::Error> {
        let config: DeclaredConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate every domain and reject repeated domain names
    pub fn validate(&self) -> Result<(), crate::Error> {
        let mut seen = HashSet::new();
        for domain in &self.domains {
            domain.validate()?;
            if !seen.insert(domain.domain.as_str()) {
                return Err(crate::Error::config(format!(
                    "Domain '{}' is declared more than once",
                    domain.domain
                )));
            }
        }
        Ok(())
    }
}

/// Validate that a string is a valid domain name
///
/// Basic RFC 1035 checks: total length, label length, label characters.
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

    if !domain.contains('.') {
        return Err(crate::Error::config(format!(
            "Domain name must be fully qualified. Got: {}",
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

        if !label.chars().all(|c| c.is_alphanumeric() || c == '-') {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Alias;

    #[test]
    fn test_client_config_defaults() {
        let config = ClientConfig::new("key");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout_secs, 30);
        assert!(config.user_agent.starts_with("improvmx-rs/"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_client_config_rejects_empty_key() {
        assert!(ClientConfig::new("  ").validate().is_err());
    }

    #[test]
    fn test_client_config_trims_trailing_slash() {
        let config = ClientConfig::new("key").with_base_url("http://localhost:8080/v3/");
        assert_eq!(config.base_url, "http://localhost:8080/v3");
    }

    #[test]
    fn test_api_key_not_exposed_in_debug() {
        let config = ClientConfig::new("sk_live_secret_12345");
        let debug_str = format!("{:?}", config);
        assert!(!debug_str.contains("sk_live_secret_12345"));
        assert!(debug_str.contains("<REDACTED>"));
    }

    #[test]
    fn test_payload_uses_empty_strings_for_absent_attributes() {
        let config = DomainConfig::new("example.com").with_webhook("https://hooks.example.com");
        let payload = config.to_payload();
        assert_eq!(payload.domain, "example.com");
        assert_eq!(payload.webhook, "https://hooks.example.com");
        assert!(payload.notification_email.is_empty());
        assert!(payload.aliases.is_empty());
    }

    #[test]
    fn test_domain_name_validation() {
        assert!(validate_domain_name("example.com").is_ok());
        assert!(validate_domain_name("mail.example.co.uk").is_ok());
        assert!(validate_domain_name("").is_err());
        assert!(validate_domain_name("localhost").is_err());
        assert!(validate_domain_name("bad..example.com").is_err());
        assert!(validate_domain_name("-bad.example.com").is_err());
        assert!(validate_domain_name("bad_label.example.com").is_err());
    }

    #[test]
    fn test_declared_config_rejects_duplicate_domains() {
        let config = DeclaredConfig {
            domains: vec![DomainConfig::new("example.com"), DomainConfig::new("example.com")],
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_declared_config_rejects_alias_without_forward() {
        let config = DomainConfig::new("example.com")
            .with_aliases([Alias::new("hello", "")].into_iter().collect());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_declared_config_from_json() {
        let config = DeclaredConfig::from_json(
            r#"{
                "domains": [
                    {
                        "domain": "example.com",
                        "notification_email": "ops@example.com",
                        "alias": [
                            {"alias": "hello", "forward": "hello@x.com"},
                            {"alias": "contact", "forward": "contact@x.com"}
                        ]
                    },
                    {"domain": "example.org"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(config.domains.len(), 2);
        assert_eq!(config.domains[0].aliases().len(), 2);
        assert!(config.domains[1].alias.is_none());
    }
}
