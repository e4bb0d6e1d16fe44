//! cli
//!
//! The `cmis` command-line inspector.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Resolve [`ClientConfig`] from file, environment and flags
//! - Install the tracing subscriber
//! - Delegate to command handlers
//!
//! The CLI layer is thin. Every command is a read against the library's
//! [`crate::CmisClient`] and [`crate::Repository`] API.

pub mod args;
pub mod commands;

pub use args::{Cli, Command};

use anyhow::{bail, Context, Result};
use tracing_subscriber::EnvFilter;

use crate::config::ClientConfig;

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    init_tracing(cli.debug);

    let config = resolve_config(&cli)?;
    let runtime = tokio::runtime::Runtime::new().context("failed to start the async runtime")?;
    runtime.block_on(commands::dispatch(cli.command, &config))
}

/// `RUST_LOG` decides the filter unless `--debug` forces `debug`.
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Configuration with command-line flags applied last.
pub fn resolve_config(cli: &Cli) -> Result<ClientConfig> {
    let loaded = match &cli.config {
        Some(path) => {
            if !path.exists() {
                bail!("config file '{}' not found", path.display());
            }
            let explicit = path.display().to_string();
            ClientConfig::load_with(|name| match name {
                "CMIS_CONFIG" => Some(explicit.clone()),
                other => std::env::var(other).ok(),
            })?
        }
        None => ClientConfig::load()?,
    };

    let config = apply_flags(loaded.config, cli);
    config.validate()?;
    Ok(config)
}

fn apply_flags(mut config: ClientConfig, cli: &Cli) -> ClientConfig {
    if let Some(url) = &cli.url {
        config.url = Some(url.clone());
    }
    if let Some(binding) = &cli.binding {
        config.binding = Some(binding.clone());
    }
    if let Some(user) = &cli.user {
        config.username = Some(user.clone());
    }
    if let Some(repository) = &cli.repository {
        config.repository_id = Some(repository.clone());
    }
    config
}
