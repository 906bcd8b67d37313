//! rflocal CLI - Main Entry Point
//!
//! Triggers crowd-sourced test runs against a locally running web app
//! without deploying it first.

use anyhow::Context;
use clap::{Parser, Subcommand};

use rflocal_cli::client::{ApiClient, DEFAULT_API_URL};
use rflocal_cli::commands::{environment, local, trigger};
use rflocal_cli::output;

const DEFAULT_APP_URL: &str = "https://app.rainforestqa.com";

/// rflocal - test your local app with a remote test crowd
#[derive(Parser)]
#[command(name = "rflocal")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// API token
    #[arg(long, env = "RAINFOREST_API_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    /// API base URL
    #[arg(long, env = "RAINFOREST_API_URL", default_value = DEFAULT_API_URL, global = true)]
    api_url: String,

    /// Web app base URL, used for test editor links
    #[arg(long, env = "RAINFOREST_APP_URL", default_value = DEFAULT_APP_URL, global = true)]
    app_url: String,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run or edit tests against a local app through a tunnel
    #[command(subcommand)]
    Local(local::LocalCommands),

    /// Show the trigger decision for the last commit
    Trigger(trigger::TriggerArgs),

    /// Manage environments
    #[command(subcommand)]
    Environment(environment::EnvironmentCommands),

    /// Show version information
    Version,
}

fn api_client(token: Option<&str>, api_url: &str) -> anyhow::Result<ApiClient> {
    let token = token.context("No API token given. Pass --token or set RAINFOREST_API_TOKEN")?;
    ApiClient::new(api_url, token)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    let client = || api_client(cli.token.as_deref(), &cli.api_url);

    match cli.command {
        Commands::Local(cmd) => local::execute(cmd, client, &cli.app_url, cli.format).await?,
        Commands::Trigger(args) => trigger::execute(args, cli.format).await?,
        Commands::Environment(cmd) => environment::execute(cmd, client()?, cli.format).await?,
        Commands::Version => {
            println!("rflocal v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
