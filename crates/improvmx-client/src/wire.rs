//! Response envelopes and request payloads of the ImprovMX API v3

use improvmx_core::model::{Alias, Check, Domain};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fields every response carries
#[derive(Debug, Deserialize)]
pub(crate) struct StatusEnvelope {
    #[serde(default = "default_success")]
    pub success: bool,
}

fn default_success() -> bool {
    true
}

/// Error response body
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub errors: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DomainsEnvelope {
    #[serde(default)]
    pub domains: Vec<Domain>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DomainEnvelope {
    pub domain: Domain,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CheckEnvelope {
    pub records: Check,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AliasesEnvelope {
    #[serde(default)]
    pub aliases: Vec<Alias>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AliasEnvelope {
    pub alias: Alias,
}

/// Body of a domain update
///
/// Every writable attribute is sent; an empty one goes out as `null` so the
/// remote clears it.
#[derive(Debug, Serialize)]
pub(crate) struct DomainUpdatePayload<'a> {
    pub notification_email: Option<&'a str>,
    pub whitelabel: Option<&'a str>,
    pub webhook: Option<&'a str>,
}

impl<'a> From<&'a Domain> for DomainUpdatePayload<'a> {
    fn from(domain: &'a Domain) -> Self {
        let set = |value: &'a String| Some(value.as_str()).filter(|v| !v.is_empty());
        Self {
            notification_email: set(&domain.notification_email),
            whitelabel: set(&domain.whitelabel),
            webhook: set(&domain.webhook),
        }
    }
}

/// Body of an alias creation
#[derive(Debug, Serialize)]
pub(crate) struct AliasPayload<'a> {
    pub alias: &'a str,
    pub forward: &'a str,
}

impl<'a> From<&'a Alias> for AliasPayload<'a> {
    fn from(alias: &'a Alias) -> Self {
        Self {
            alias: &alias.alias,
            forward: &alias.forward,
        }
    }
}

/// Body of an alias update: only the forward target is writable
#[derive(Debug, Serialize)]
pub(crate) struct ForwardPayload<'a> {
    pub forward: &'a str,
}

impl<'a> From<&'a Alias> for ForwardPayload<'a> {
    fn from(alias: &'a Alias) -> Self {
        Self {
            forward: &alias.forward,
        }
    }
}
