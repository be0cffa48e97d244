//! storesync CLI - Database migrations and one-off syncs.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! storesync migrate
//!
//! # Sync one tenant and print the summary
//! storesync sync --tenant 1 --user 42
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `sync` - Run a full sync for one tenant

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use storesync_core::{TenantId, UserId};

mod commands;

#[derive(Parser)]
#[command(name = "storesync")]
#[command(author, version, about = "storesync CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Sync one tenant from its remote store
    Sync {
        /// Tenant ID
        #[arg(short, long)]
        tenant: i32,

        /// ID of the user owning the tenant
        #[arg(short, long)]
        user: i32,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Sync { tenant, user } => {
            commands::sync::run(TenantId::new(tenant), UserId::new(user)).await?;
        }
    }
    Ok(())
}
