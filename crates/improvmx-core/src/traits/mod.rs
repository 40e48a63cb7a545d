//! Core traits for the ImprovMX system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`ImprovMxApi`]: Typed remote API operations
//! - [`Resource`] / [`DataSource`]: Host-facing lifecycle of managed objects
//! - [`StateStore`]: Persistent state between runs

pub mod api;
pub mod resource;
pub mod state_store;

pub use api::ImprovMxApi;
pub use resource::{DataSource, Resource};
pub use state_store::{StateRecord, StateStore};
