//! Alias reconciliation
//!
//! - [`AliasDiff`]: set difference between declared alias sets, and its application
//! - [`clear_default_aliases`]: removal of the catch-all seeded on new domains

pub mod diff;

pub use diff::{AliasDiff, clear_default_aliases};
