//! Read-only data sources
//!
//! - [`DomainDataSource`]: one domain, aliases as observed remotely
//! - [`CheckDataSource`]: raw DNS check of a domain
//! - [`DnsDataSource`]: DNS records a domain needs
//! - [`DomainsDataSource`]: every domain of the account

pub mod check;
pub mod dns;
pub mod domain;
pub mod domains;

pub use check::{CHECK_DATA_SOURCE, CheckDataSource, CheckState, RecordState};
pub use dns::{DNS_DATA_SOURCE, DnsDataSource, DnsState};
pub use domain::{DOMAIN_DATA_SOURCE, DomainDataSource};
pub use domains::{DOMAINS_DATA_SOURCE, DomainsDataSource, DomainsQuery, DomainsState};
