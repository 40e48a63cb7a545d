//! CLI argument parsing
//!
//! Uses clap derive macros; connection settings can also come from the
//! environment.

use clap::{Args, Parser, Subcommand};
use improvmx_core::config::{ClientConfig, DEFAULT_BASE_URL, ENV_API_KEY, ENV_BASE_URL};
use std::path::PathBuf;

/// Environment variable holding the log level
pub const ENV_LOG_LEVEL: &str = "IMPROVMX_LOG_LEVEL";

/// Environment variable overriding the state file path
pub const ENV_STATE: &str = "IMPROVMX_STATE";

/// Declarative management of ImprovMX domains and aliases
#[derive(Debug, Parser)]
#[command(name = "improvmxctl")]
#[command(version)]
#[command(about = "Declarative management of ImprovMX domains and aliases")]
#[command(propagate_version = true)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every command
#[derive(Debug, Args, Clone)]
pub struct GlobalOptions {
    /// ImprovMX API key
    #[arg(long, env = ENV_API_KEY, hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// ImprovMX API base URL
    #[arg(long, env = ENV_BASE_URL, default_value = DEFAULT_BASE_URL, global = true)]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[arg(long = "timeout", default_value_t = 30, global = true)]
    pub timeout_secs: u64,

    /// File holding the last applied state of every managed domain
    #[arg(long, env = ENV_STATE, default_value = "improvmx-state.json", global = true)]
    pub state: PathBuf,
}

impl GlobalOptions {
    /// Build the API client configuration
    pub fn client_config(&self) -> Result<ClientConfig, improvmx_core::Error> {
        let api_key = self.api_key.clone().ok_or_else(|| {
            improvmx_core::Error::config(format!(
                "An API key is required. Pass --api-key or set {}",
                ENV_API_KEY
            ))
        })?;

        let config = ClientConfig::new(api_key)
            .with_base_url(self.base_url.clone())
            .with_timeout_secs(self.timeout_secs);
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create, update and delete domains to match a declared configuration
    Apply {
        /// JSON file of the form {"domains": [...]}
        #[arg(long, short = 'c')]
        config: PathBuf,
    },

    /// Re-read every stored domain and save what the remote reports
    Refresh,

    /// Adopt an existing domain into the state file
    Import {
        domain: String,
    },

    /// Delete one stored domain, or every stored domain
    Destroy {
        domain: Option<String>,
    },

    /// Print a domain as the domain data source reports it
    ShowDomain {
        domain: String,
    },

    /// Print the DNS check of a domain
    Check {
        domain: String,
    },

    /// Print the DNS records a domain needs
    Dns {
        domain: String,
    },

    /// List the active domains of the account
    Domains {
        /// Only domains matching this value
        #[arg(long, short = 'q')]
        query: Option<String>,
    },
}

impl Command {
    /// Whether the command reads or writes the state file
    pub fn uses_state(&self) -> bool {
        matches!(
            self,
            Command::Apply { .. }
                | Command::Refresh
                | Command::Import { .. }
                | Command::Destroy { .. }
        )
    }
}
