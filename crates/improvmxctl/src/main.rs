// # improvmxctl - ImprovMX command-line host
//
// Thin host around improvmx-core. It parses arguments, sets up logging and
// the runtime, wires the HTTP client into the resources and data sources,
// and maps the outcome to an exit code. Reconciliation logic lives in
// improvmx-core.
//
// ## Configuration
//
// - `IMPROVMX_API_KEY`: API key (or `--api-key`)
// - `IMPROVMX_BASE_URL`: API base URL (or `--base-url`)
// - `IMPROVMX_STATE`: state file path (or `--state`)
// - `IMPROVMX_LOG_LEVEL`: trace, debug, info, warn or error
//
// ## Example
//
// ```bash
// export IMPROVMX_API_KEY=sk_...
//
// improvmxctl apply --config domains.json
// improvmxctl dns example.com
// improvmxctl destroy example.com
// ```

mod cli;
mod host;

use clap::Parser;
use cli::{Cli, Command, ENV_LOG_LEVEL};
use host::Host;
use improvmx_client::ImprovMxClient;
use improvmx_core::datasource::{
    CheckDataSource, DnsDataSource, DomainDataSource, DomainsDataSource, DomainsQuery,
};
use improvmx_core::traits::{DataSource, ImprovMxApi, StateStore};
use improvmx_core::{DeclaredConfig, DomainResource, Error, FileStateStore};
use serde::Serialize;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Exit codes
///
/// - 0: Success
/// - 1: Configuration error (bad arguments, config file or API key)
/// - 2: Runtime error (remote failures, cancellation)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CtlExitCode {
    Success = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<CtlExitCode> for ExitCode {
    fn from(code: CtlExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

impl CtlExitCode {
    fn for_error(err: &Error) -> Self {
        match err {
            Error::Config(_) | Error::Authentication(_) => CtlExitCode::ConfigError,
            _ => CtlExitCode::RuntimeError,
        }
    }
}

/// Parse a log level name
fn parse_log_level(value: &str) -> anyhow::Result<Level> {
    match value.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "{} '{}' is not valid. Valid levels: trace, debug, info, warn, error",
            ENV_LOG_LEVEL,
            value
        ),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match std::env::var(ENV_LOG_LEVEL) {
        Ok(value) => match parse_log_level(&value) {
            Ok(level) => level,
            Err(e) => {
                eprintln!("Configuration error: {}", e);
                return CtlExitCode::ConfigError.into();
            }
        },
        Err(_) => Level::INFO,
    };

    // Logs go to stderr so stdout carries only command output
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return CtlExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return CtlExitCode::RuntimeError.into();
        }
    };

    rt.block_on(run(cli)).into()
}

async fn run(cli: Cli) -> CtlExitCode {
    let client = match cli
        .global
        .client_config()
        .and_then(ImprovMxClient::new)
    {
        Ok(client) => client,
        Err(e) => {
            error!("Configuration error: {}", e);
            return CtlExitCode::ConfigError;
        }
    };
    let api: Arc<dyn ImprovMxApi> = Arc::new(client);

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_interrupt(cancel.clone()));

    let result = if cli.command.uses_state() {
        let store = match FileStateStore::new(&cli.global.state).await {
            Ok(store) => store,
            Err(e) => {
                error!(
                    "Failed to open state file {}: {}",
                    cli.global.state.display(),
                    e
                );
                return CtlExitCode::ConfigError;
            }
        };
        let store: Arc<dyn StateStore> = Arc::new(store);
        let host = Host::new(DomainResource::new(api), store);
        run_stateful(&host, cli.command, &cancel).await
    } else {
        run_data_source(api, cli.command, &cancel).await
    };

    match result {
        Ok(()) => CtlExitCode::Success,
        Err(Error::Cancelled) => {
            warn!("Interrupted");
            CtlExitCode::RuntimeError
        }
        Err(e) => {
            error!("{}", e);
            CtlExitCode::for_error(&e)
        }
    }
}

async fn run_stateful(
    host: &Host,
    command: Command,
    cancel: &CancellationToken,
) -> improvmx_core::Result<()> {
    match command {
        Command::Apply { config } => {
            let declared = load_declared(&config).await?;
            let summary = host.apply(&declared, cancel).await?;
            println!("Apply complete: {}", summary);
        }
        Command::Refresh => {
            let summary = host.refresh(cancel).await?;
            println!("Refreshed {} domain(s)", summary.unchanged);
        }
        Command::Import { domain } => {
            host.import(&domain, cancel).await?;
            println!("Imported {}", domain);
        }
        Command::Destroy { domain } => {
            let summary = host.destroy(domain.as_deref(), cancel).await?;
            println!("Destroy complete: {}", summary);
        }
        other => {
            return Err(Error::config(format!(
                "{:?} does not use the state file",
                other
            )));
        }
    }
    Ok(())
}

async fn run_data_source(
    api: Arc<dyn ImprovMxApi>,
    command: Command,
    cancel: &CancellationToken,
) -> improvmx_core::Result<()> {
    match command {
        Command::ShowDomain { domain } => {
            print_json(&DomainDataSource::new(api).read(&domain, cancel).await?)
        }
        Command::Check { domain } => {
            print_json(&CheckDataSource::new(api).read(&domain, cancel).await?)
        }
        Command::Dns { domain } => {
            print_json(&DnsDataSource::new(api).read(&domain, cancel).await?)
        }
        Command::Domains { query } => print_json(
            &DomainsDataSource::new(api)
                .read(&DomainsQuery { query }, cancel)
                .await?,
        ),
        other => Err(Error::config(format!(
            "{:?} needs the state file",
            other
        ))),
    }
}

/// Read and validate a declared configuration file
async fn load_declared(path: &std::path::Path) -> improvmx_core::Result<DeclaredConfig> {
    let text = tokio::fs::read_to_string(path).await.map_err(|e| {
        Error::config(format!("Failed to read {}: {}", path.display(), e))
    })?;
    let declared = DeclaredConfig::from_json(&text).map_err(|e| match e {
        Error::Json(e) => Error::config(format!("Invalid JSON in {}: {}", path.display(), e)),
        other => other,
    })?;
    info!(
        "Loaded {} declared domain(s) from {}",
        declared.domains.len(),
        path.display()
    );
    Ok(declared)
}

fn print_json<T: Serialize>(value: &T) -> improvmx_core::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Cancel in-flight work on CTRL-C
async fn cancel_on_interrupt(cancel: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            warn!("Received interrupt, cancelling");
            cancel.cancel();
        }
        Err(e) => error!("Failed to wait for CTRL-C: {}", e),
    }
}
