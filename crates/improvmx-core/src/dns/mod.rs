//! DNS projection of a domain check

pub mod projection;

pub use projection::{DKIM1_NAME, DKIM2_NAME, project};
