//! reflex CLI - live-reload notifier.
//!
//! `serve` watches a folder, serves its contents over HTTP and pushes a
//! reload notification to every connected `/poll` client when a file
//! write inside the folder settles.

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};

use commands::ServeArgs;
use output::Output;

/// reflex - live-reload notifier.
#[derive(Parser)]
#[command(name = "reflex", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch a folder and serve it with live reload notifications.
    Serve(ServeArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    let result = match cli.command {
        Commands::Serve(args) => {
            let rt = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
            rt.block_on(args.execute())
        }
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
