// # improvmx-core
//
// Core library for managing ImprovMX email-forwarding domains declaratively.
//
// ## Architecture Overview
//
// - **ImprovMxApi**: Trait for the typed remote API (implemented over HTTP by `improvmx-client`)
// - **AliasDiff**: Set difference between the prior and declared alias sets
// - **dns::project**: DNS records a domain needs, derived from its check
// - **DomainResource**: Create/read/update/delete/import of one domain
// - **Data sources**: Read-only views of a domain, its check, its DNS records, the listed domains
// - **StateStore**: Persistent state between runs of the host
//
// ## Design Principles
//
// 1. **Library-First**: The CLI is a thin host over these types
// 2. **Fresh Reads**: Every lifecycle operation ends with a read of the remote
// 3. **No Rollback**: Partial failures are reported, never undone
// 4. **Cancellable**: Every remote call races a `CancellationToken`

pub mod alias;
pub mod cancel;
pub mod config;
pub mod datasource;
pub mod dns;
pub mod error;
pub mod model;
pub mod resource;
pub mod state;
pub mod traits;

// Re-export core types for convenience
pub use alias::AliasDiff;
pub use config::{ClientConfig, DeclaredConfig, DomainConfig};
pub use dns::project;
pub use error::{Diagnostic, Diagnostics, Error, Result};
pub use resource::{DomainResource, DomainState};
pub use state::{FileStateStore, MemoryStateStore};
pub use traits::{DataSource, ImprovMxApi, Resource, StateStore};
