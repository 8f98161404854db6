//! Reckoning CLI
//!
//! Serves rolling activity counts over HTTP.

use clap::{Parser, Subcommand};
use reckoning::{config::Config, server, VERSION};
use std::net::IpAddr;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "reckoning")]
#[command(version = VERSION)]
#[command(about = "Rolling activity counts for named things", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Address to bind to (overrides RECKONING_HOST)
        #[arg(long)]
        host: Option<IpAddr>,

        /// Port to bind to (overrides RECKONING_PORT)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Show effective configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { host, port } => cmd_serve(host, port).await,
        Commands::Config => cmd_config(),
    }
}

async fn cmd_serve(host: Option<IpAddr>, port: Option<u16>) -> anyhow::Result<()> {
    let config = Config::from_env()?.with_overrides(host, port);

    tracing::info!("Reckoning v{VERSION}");
    let (_addr, shutdown_tx) = server::run((&config).into()).await?;

    tokio::signal::ctrl_c().await?;
    let _ = shutdown_tx.send(());
    tracing::info!("Shutting down");

    Ok(())
}

fn cmd_config() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    println!("Reckoning Configuration");
    println!("=======================");
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);

    Ok(())
}
