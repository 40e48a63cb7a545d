//! Wire model shared by the facade, the reconciliation logic and the client
//!
//! These types mirror the JSON objects exchanged with the ImprovMX API v3.
//! Optional strings are empty rather than absent so that a domain read back
//! from the remote compares cleanly against declared configuration.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A domain under management
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    /// Fully-qualified name, the primary key
    pub domain: String,

    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "std::ops::Not::not")]
    pub active: bool,

    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub display: String,

    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub dkim_selector: String,

    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub notification_email: String,

    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub webhook: String,

    /// Parent domain displayed for the DNS settings
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub whitelabel: String,

    /// Creation timestamp as reported by the remote
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "is_zero")]
    pub added: i64,

    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<Alias>,
}

impl Domain {
    /// Create an empty payload for the given domain name
    pub fn named(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            ..Self::default()
        }
    }
}

fn is_zero(v: &i64) -> bool {
    *v == 0
}

/// The remote sends `null` for unset attributes
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A local-part forwarding rule attached to a domain
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alias {
    /// Local-part, unique within the owning domain
    pub alias: String,

    /// Destination email address or URL
    pub forward: String,

    /// Remote-assigned identifier, zero until the remote has created it
    #[serde(default)]
    pub id: u64,
}

impl Alias {
    pub fn new(alias: impl Into<String>, forward: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            forward: forward.into(),
            id: 0,
        }
    }
}

/// Set of aliases keyed by local-part
///
/// Two aliases are the same element when their local-parts are equal; the
/// forward target and ID are payload. Serialized as a plain list. Parsing a
/// list that repeats a local-part is rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Alias>", into = "Vec<Alias>")]
pub struct AliasSet(BTreeMap<String, Alias>);

impl AliasSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an alias, replacing any alias with the same local-part
    pub fn insert(&mut self, alias: Alias) -> Option<Alias> {
        self.0.insert(alias.alias.clone(), alias)
    }

    pub fn get(&self, local_part: &str) -> Option<&Alias> {
        self.0.get(local_part)
    }

    pub fn contains(&self, local_part: &str) -> bool {
        self.0.contains_key(local_part)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Aliases in local-part order
    pub fn iter(&self) -> impl Iterator<Item = &Alias> {
        self.0.values()
    }

    /// Local-parts in order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// True if both sets hold the same local-parts with the same forward targets
    ///
    /// IDs are ignored: a declared set never carries them.
    pub fn same_targets(&self, other: &AliasSet) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|a| other.get(&a.alias).is_some_and(|b| b.forward == a.forward))
    }
}

impl FromIterator<Alias> for AliasSet {
    fn from_iter<I: IntoIterator<Item = Alias>>(iter: I) -> Self {
        let mut set = AliasSet::new();
        for alias in iter {
            set.insert(alias);
        }
        set
    }
}

impl TryFrom<Vec<Alias>> for AliasSet {
    type Error = String;

    fn try_from(aliases: Vec<Alias>) -> Result<Self, Self::Error> {
        let mut set = AliasSet::new();
        for alias in aliases {
            let local_part = alias.alias.clone();
            if set.insert(alias).is_some() {
                return Err(format!("duplicate alias '{}'", local_part));
            }
        }
        Ok(set)
    }
}

impl From<AliasSet> for Vec<Alias> {
    fn from(set: AliasSet) -> Self {
        set.0.into_values().collect()
    }
}

/// Point-in-time DNS validation result for a domain
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Check {
    #[serde(default, deserialize_with = "null_as_default")]
    pub provider: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub advanced: bool,

    #[serde(default, deserialize_with = "null_as_default")]
    pub mx: Record,

    #[serde(default, deserialize_with = "null_as_default")]
    pub spf: Record,

    #[serde(default, deserialize_with = "null_as_default")]
    pub dmarc: Record,

    #[serde(default, deserialize_with = "null_as_default")]
    pub dkim1: Record,

    #[serde(default, deserialize_with = "null_as_default")]
    pub dkim2: Record,

    #[serde(default, deserialize_with = "null_as_default")]
    pub valid: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<serde_json::Value>,
}

/// One DNS record category within a [`Check`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Values the provider requires, in order
    #[serde(default)]
    pub expected: Option<RecordValues>,

    /// True when the observed values match the expected ones
    #[serde(default, deserialize_with = "null_as_default")]
    pub valid: bool,

    /// Values currently observed in DNS
    #[serde(default)]
    pub values: Option<RecordValues>,
}

impl Record {
    pub fn expected(values: &[&str]) -> Self {
        Self {
            expected: Some(values.iter().copied().collect()),
            ..Self::default()
        }
    }
}

/// Ordered list of record values
///
/// The remote sends a bare string instead of a list when exactly one value
/// is present; both shapes parse to the same list. Always written as a list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RecordValues(pub Vec<String>);

impl RecordValues {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de> Deserialize<'de> for RecordValues {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Shape {
            Many(Vec<String>),
            One(String),
        }

        Ok(match Shape::deserialize(deserializer)? {
            Shape::Many(values) => RecordValues(values),
            Shape::One(value) => RecordValues(vec![value]),
        })
    }
}

impl<'a> FromIterator<&'a str> for RecordValues {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        RecordValues(iter.into_iter().map(str::to_string).collect())
    }
}

/// DNS record type of a projected descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DnsRecordType {
    Mx,
    Txt,
    Cname,
}

impl fmt::Display for DnsRecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DnsRecordType::Mx => "MX",
            DnsRecordType::Txt => "TXT",
            DnsRecordType::Cname => "CNAME",
        };
        f.write_str(s)
    }
}

/// A DNS record the domain owner has to publish
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    #[serde(rename = "type")]
    pub record_type: DnsRecordType,

    /// Name relative to the domain; empty for MX and TXT
    pub name: String,

    pub value: String,
}

/// Filter for listing domains
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainQuery {
    /// Only domains starting with this value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}
