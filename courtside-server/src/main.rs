//! Courtside CLI - NBA teams from an LLM
//!
//! Runs the HTTP service, or asks the model once and prints the result.

#![allow(clippy::print_stdout)] // `ask` writes its result to stdout

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use courtside::{OpenAI, TeamQuery, TeamsService};
use courtside_server::config::{self, ServerConfig};
use courtside_server::{AppState, Result};
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Courtside - NBA team listings from LLM structured output
#[derive(Parser)]
#[command(name = "courtside")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file path
    #[arg(short, long, env = "COURTSIDE_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP service
    Serve(ServeArgs),

    /// Ask the model once and print the teams as JSON
    Ask(AskArgs),
}

/// Arguments for the serve command
#[derive(Args)]
struct ServeArgs {
    /// Bind address (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Bind port (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Model to use (overrides config)
    #[arg(short, long)]
    model: Option<String>,
}

/// Arguments for the ask command
#[derive(Args)]
struct AskArgs {
    /// Only list Eastern Conference teams
    #[arg(long)]
    eastern: bool,

    /// Model to use (overrides config)
    #[arg(short, long)]
    model: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("failed to create tokio runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match rt.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging with the given verbosity level.
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "courtside={level},courtside_server={level},tower_http={},{}",
            if verbosity >= 1 { "debug" } else { "info" },
            if verbosity >= 2 { "debug" } else { "warn" }
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbosity >= 2)
        .init();
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<()> {
    let path = config::config_path(cli.config);
    let config = config::load_config_from(&path).await?.with_env();

    match cli.command {
        Commands::Serve(args) => cmd_serve(args, config).await,
        Commands::Ask(args) => cmd_ask(args, config).await,
    }
}

/// Build the team service from validated configuration.
fn build_service(config: &ServerConfig) -> Result<TeamsService> {
    config::check(config)?;

    let api_key = config::api_key_from_env()?;
    let provider = OpenAI::new(config.openai.client_config(api_key))?;
    let service = TeamsService::new(Arc::new(provider))?.with_policy(config.teams.policy())?;

    tracing::info!(
        model = service.model(),
        base_url = %config.openai.base_url,
        policy = ?config.teams.on_upstream_error,
        "team service ready"
    );
    Ok(service)
}

/// Start the HTTP service.
async fn cmd_serve(args: ServeArgs, mut config: ServerConfig) -> Result<()> {
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(model) = args.model {
        config.openai.model = model;
    }

    let service = build_service(&config)?;
    courtside_server::serve(&config.server, AppState::new(service)).await
}

/// Ask once and print.
async fn cmd_ask(args: AskArgs, mut config: ServerConfig) -> Result<()> {
    if let Some(model) = args.model {
        config.openai.model = model;
    }

    let query = if args.eastern {
        TeamQuery::EasternConference
    } else {
        TeamQuery::All
    };

    let service = build_service(&config)?;
    let teams = service.get_teams(query).await?;

    let json = serde_json::to_string_pretty(&teams).map_err(courtside::Error::from)?;
    println!("{json}");
    Ok(())
}
