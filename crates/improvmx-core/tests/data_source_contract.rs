//! Contract Test: Data Sources
//!
//! Read-only lookups must never mutate the remote, and must report the same
//! shapes the domain resource does.

mod common;

use common::*;
use improvmx_core::datasource::domains::domains_checksum;
use improvmx_core::datasource::{
    CheckDataSource, DnsDataSource, DomainDataSource, DomainsDataSource, DomainsQuery,
};
use improvmx_core::model::DnsRecordType;
use improvmx_core::traits::{DataSource, Resource};
use improvmx_core::DomainResource;
use std::sync::Arc;

fn seeded() -> FakeImprovMx {
    let api = FakeImprovMx::new();
    api.seed_domain("example.com", &[("hello", "h@x.com")]);
    api.seed_domain("example.org", &[]);
    api.seed_domain("other.net", &[]);
    api
}

#[tokio::test]
async fn domain_data_source_matches_import() {
    let api = seeded();

    let from_source = DomainDataSource::new(Arc::new(api.clone()))
        .read(&"example.com".to_string(), &token())
        .await
        .unwrap();
    let from_import = DomainResource::new(Arc::new(api.clone()))
        .import("example.com", &token())
        .await
        .unwrap();

    assert_eq!(from_source, from_import);
    assert!(from_source.aliases().contains("hello"));
}

#[tokio::test]
async fn check_data_source_maps_absent_values_to_empty() {
    let api = seeded();

    let state = CheckDataSource::new(Arc::new(api.clone()))
        .read(&"example.com".to_string(), &token())
        .await
        .unwrap();

    assert_eq!(state.domain, "example.com");
    assert_eq!(state.provider_name, "improvmx");
    assert_eq!(state.mx.expected, vec!["mx1.improvmx.com", "mx2.improvmx.com"]);
    assert!(state.mx.values.is_empty());
    assert!(state.dmarc.expected.is_empty());
    assert!(!state.valid);
}

#[tokio::test]
async fn dns_data_source_projects_check() {
    let api = seeded();

    let state = DnsDataSource::new(Arc::new(api.clone()))
        .read(&"example.com".to_string(), &token())
        .await
        .unwrap();

    let types: Vec<DnsRecordType> = state.records.iter().map(|r| r.record_type).collect();
    assert_eq!(
        types,
        vec![
            DnsRecordType::Mx,
            DnsRecordType::Mx,
            DnsRecordType::Txt,
            DnsRecordType::Cname,
            DnsRecordType::Cname,
        ]
    );
    assert!(api.alias_calls().is_empty());
}

#[tokio::test]
async fn domains_data_source_filters_and_checksums() {
    let api = seeded();
    let source = DomainsDataSource::new(Arc::new(api.clone()));

    let all = source.read(&DomainsQuery::default(), &token()).await.unwrap();
    assert_eq!(all.domains.len(), 3);
    assert!(all.domains.iter().all(|d| d.alias.is_none()));
    assert!(all.domains.iter().all(|d| d.dns.len() == 5));
    assert_eq!(
        all.id,
        domains_checksum(&["other.net", "example.org", "example.com"])
    );

    let filtered = source
        .read(
            &DomainsQuery {
                query: Some("example".into()),
            },
            &token(),
        )
        .await
        .unwrap();
    let names: Vec<&str> = filtered.domains.iter().map(|d| d.domain.as_str()).collect();
    assert_eq!(names, vec!["example.com", "example.org"]);
    assert_ne!(filtered.id, all.id);
}

#[tokio::test]
async fn data_source_of_missing_domain_is_not_found() {
    let api = seeded();

    let err = DnsDataSource::new(Arc::new(api.clone()))
        .read(&"missing.com".to_string(), &token())
        .await
        .unwrap_err();

    assert!(err.is_not_found());
}
