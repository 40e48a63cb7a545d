//! Managed resources

pub mod domain;

pub use domain::{DOMAIN_RESOURCE, DomainResource, DomainState};
