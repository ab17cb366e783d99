//! CapSync CLI
//!
//! Command-line shell for triggering capacity database synchronization.
//!
//! # Commands
//!
//! - `sync` - Synchronize a capacity database out to its read-only replicas

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Capacity database synchronization tools.
#[derive(Parser)]
#[command(name = "capsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Environment host serving cluster resolution (overrides configuration)
    #[arg(global = true, long)]
    environment: Option<String>,

    /// Account identity used for token acquisition (overrides configuration)
    #[arg(global = true, long)]
    account: Option<String>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Synchronize a capacity database out to its read-only replicas
    Sync {
        /// Capacity to synchronize, e.g. `contosocapacity:rw` or
        /// `pbidedicated://westus.pbidedicated.windows.net/contosocapacity:rw`
        instance: String,

        /// Identity of the database to synchronize
        database: String,

        /// Print the full outcome record on success
        #[arg(long)]
        pass_thru: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose { EnvFilter::new("debug") } else { EnvFilter::new("info") };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Sync { instance, database, pass_thru } => {
            commands::sync::run(commands::sync::SyncArgs {
                instance,
                database,
                pass_thru,
                environment: cli.environment,
                account: cli.account,
            })
            .await
        }
    }
}
