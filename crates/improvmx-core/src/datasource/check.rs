//! `improvmx_check` data source
//!
//! Exposes the raw check result: expected and observed values of each
//! record kind plus validity flags.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::cancel::guarded;
use crate::error::Result;
use crate::model::{Check, Record};
use crate::traits::{DataSource, ImprovMxApi};

pub const CHECK_DATA_SOURCE: &str = "improvmx_check";

/// One record kind of a check, with absent value lists flattened to empty
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordState {
    pub expected: Vec<String>,
    pub values: Vec<String>,
    pub valid: bool,
}

impl From<&Record> for RecordState {
    fn from(record: &Record) -> Self {
        let list = |v: &Option<crate::model::RecordValues>| {
            v.as_ref().map(|values| values.0.clone()).unwrap_or_default()
        };
        Self {
            expected: list(&record.expected),
            values: list(&record.values),
            valid: record.valid,
        }
    }
}

/// Output of the check data source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckState {
    pub domain: String,
    pub provider_name: String,
    pub advanced: bool,
    pub valid: bool,
    pub mx: RecordState,
    pub spf: RecordState,
    pub dmarc: RecordState,
    pub dkim1: RecordState,
    pub dkim2: RecordState,
}

impl CheckState {
    pub fn from_check(domain: impl Into<String>, check: &Check) -> Self {
        Self {
            domain: domain.into(),
            provider_name: check.provider.clone(),
            advanced: check.advanced,
            valid: check.valid,
            mx: (&check.mx).into(),
            spf: (&check.spf).into(),
            dmarc: (&check.dmarc).into(),
            dkim1: (&check.dkim1).into(),
            dkim2: (&check.dkim2).into(),
        }
    }
}

/// Runs a DNS check for a domain
#[derive(Clone)]
pub struct CheckDataSource {
    api: Arc<dyn ImprovMxApi>,
}

impl CheckDataSource {
    pub fn new(api: Arc<dyn ImprovMxApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl DataSource for CheckDataSource {
    type Query = String;
    type Output = CheckState;

    fn type_name(&self) -> &'static str {
        CHECK_DATA_SOURCE
    }

    async fn read(&self, name: &String, cancel: &CancellationToken) -> Result<CheckState> {
        let check = guarded(cancel, self.api.check_domain(name)).await?;
        Ok(CheckState::from_check(name.as_str(), &check))
    }
}
