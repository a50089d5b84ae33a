//! Cfops CLI
//!
//! Command-line interface for tracking director tasks and toggling
//! deployment jobs around a platform backup.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "cfops")]
#[command(about = "Platform backup operations CLI", long_about = None)]
struct Cli {
    /// Director URL
    #[arg(
        long,
        env = "CFOPS_DIRECTOR_URL",
        default_value = "https://192.168.50.4:25555"
    )]
    director_url: String,

    /// Director username
    #[arg(long, env = "CFOPS_USERNAME", default_value = "admin")]
    username: String,

    /// Director password
    #[arg(long, env = "CFOPS_PASSWORD", hide_env_values = true, default_value = "")]
    password: String,

    /// Accept self-signed director certificates
    #[arg(long, env = "CFOPS_SKIP_TLS_VERIFY")]
    skip_tls_verify: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cfops=info,cfops_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = Config::load(
        cli.director_url,
        cli.username,
        cli.password,
        cli.skip_tls_verify,
    )?;
    debug!("Loaded configuration: {:?}", config);

    handle_command(cli.command, &config).await
}
