use crate::config::AppConfig;
use crate::logging::init_logging_with_config;
use crate::runtime_config::RuntimeConfig;
use crate::server::serve;
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

/// Command-line interface for routebind
#[derive(Debug, Parser)]
#[command(name = "routebind", version)]
#[command(about = "Serve the routebind demo application", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Serve the demo application over HTTP
    Serve {
        /// YAML configuration file
        #[arg(short, long, env = "ROUTEBIND_CONFIG")]
        config: Option<PathBuf>,

        /// Listen address; overrides `http.bind`
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Print the demo routing table
    Routes {
        /// YAML configuration file
        #[arg(short, long, env = "ROUTEBIND_CONFIG")]
        config: Option<PathBuf>,
    },
}

/// Parse the process arguments and run the selected command.
///
/// # Errors
///
/// Propagates configuration, registration and server start-up failures.
pub fn run_cli() -> Result<()> {
    run(Cli::parse())
}

/// Run an already parsed command line.
///
/// # Errors
///
/// See [`run_cli`].
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Serve { config, bind } => {
            let config = AppConfig::load_or_default(config.as_deref())?;
            let _log_guard = init_logging_with_config(&config.log_config())?;
            config.warn_insecure_defaults();
            RuntimeConfig::from_env().apply();

            let dispatcher =
                crate::demo::build_app(&config).context("Failed to build demo application")?;
            let addr = bind.unwrap_or_else(|| config.http.bind.clone());
            info!(addr = %addr, "Starting server");

            let handle =
                serve(dispatcher, addr.as_str()).with_context(|| format!("Failed to bind {addr}"))?;
            handle
                .join()
                .map_err(|e| anyhow!("Server coroutine panicked: {e:?}"))?;
            Ok(())
        }
        Commands::Routes { config } => {
            let config = AppConfig::load_or_default(config.as_deref())?;
            let dispatcher =
                crate::demo::build_app(&config).context("Failed to build demo application")?;
            dispatcher.router().dump_routes();
            Ok(())
        }
    }
}
