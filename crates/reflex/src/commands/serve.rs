//! `reflex serve` command implementation.

use std::path::PathBuf;

use clap::Args;
use reflex_config::{CliSettings, Config};
use reflex_server::{run_server, server_config_from_config};
use tracing_subscriber::EnvFilter;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the serve command.
#[derive(Args)]
pub(crate) struct ServeArgs {
    /// Path to configuration file (default: auto-discover reflex.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Folder to watch and serve (overrides config).
    #[arg(short, long)]
    folder: Option<PathBuf>,

    /// Host to bind to (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to (overrides config).
    #[arg(short, long)]
    port: Option<u16>,

    /// Debounce delay in milliseconds (overrides config).
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Enable verbose output (info-level logs).
    #[arg(short, long)]
    verbose: bool,
}

impl ServeArgs {
    /// Execute the serve command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the server fails to start.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        // Build CLI settings from args
        let cli_settings = CliSettings {
            host: self.host,
            port: self.port,
            folder: self.folder,
            delay_ms: self.delay_ms,
        };

        // Load config
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        init_tracing(self.verbose, config.log_level.as_deref());

        // Print startup info
        output.info(&format!(
            "Starting server on {}:{}",
            config.server.host, config.server.port
        ));
        output.info(&format!(
            "Watching: {}",
            config.watch_resolved.folder.display()
        ));
        output.info(&format!(
            "Debounce delay: {}ms",
            config.watch_resolved.delay_ms
        ));

        // Build server config and run
        let server_config = server_config_from_config(&config);
        run_server(server_config).await?;

        output.success("Server stopped");

        Ok(())
    }
}

/// Initialize tracing.
///
/// `--verbose` forces info level; otherwise `RUST_LOG` wins, with the
/// config file's `log_level` as the default when neither is set.
fn init_tracing(verbose: bool, config_level: Option<&str>) {
    let filter = if verbose {
        EnvFilter::new("info")
    } else if std::env::var_os("RUST_LOG").is_some() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(config_level.unwrap_or("warn"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
