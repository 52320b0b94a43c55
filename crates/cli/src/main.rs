//! CourierHub CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations (app schema + session store)
//! ch-cli migrate
//!
//! # Seed the root vendor and its developer account
//! ch-cli seed --vendor-name "Acme Logistics" \
//!     --vendor-email ops@acme.example \
//!     --vendor-address "12 Depot Road" \
//!     --email dev@acme.example --name "Dev Admin"
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "ch-cli")]
#[command(author, version, about = "CourierHub CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the root vendor and a developer account
    Seed {
        /// Root vendor name
        #[arg(long)]
        vendor_name: String,

        /// Root vendor contact email
        #[arg(long)]
        vendor_email: String,

        /// Root vendor address
        #[arg(long)]
        vendor_address: String,

        /// Developer account email
        #[arg(short, long)]
        email: String,

        /// Developer display name
        #[arg(short, long)]
        name: String,

        /// Developer password (generated when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

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
        Commands::Seed {
            vendor_name,
            vendor_email,
            vendor_address,
            email,
            name,
            password,
        } => {
            commands::seed::run(
                &vendor_name,
                &vendor_email,
                &vendor_address,
                &email,
                &name,
                password.as_deref(),
            )
            .await?;
        }
    }
    Ok(())
}
