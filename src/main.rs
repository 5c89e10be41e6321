//! Entry point for the Incentive Engine binary.
//!
//! `serve` (the default) starts the HTTP API.  `calculate` evaluates a
//! single request file and prints the result, which is handy when
//! checking a policy table before publishing it.  Configuration comes
//! from the environment (see [`incentive_engine::config`]); command line
//! flags override it.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use incentive_engine::config::AppConfig;
use incentive_engine::models::CalculationRequest;
use incentive_engine::policy::{attach_policy, PolicyStore};
use incentive_engine::{api, telemetry, IncentiveEngine};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "incentive-engine",
    about = "Compute research contribution incentives and points",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Calculate awards for a JSON request file and print the result
    Calculate(CalculateArgs),
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
    /// Override the configured policy directory
    #[arg(long)]
    policy_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct CalculateArgs {
    /// Path to a JSON calculation request
    #[arg(long)]
    input: PathBuf,
    /// Resolve the policy from this directory when the request has none
    #[arg(long)]
    policy_dir: Option<PathBuf>,
    /// Pretty-print the JSON result
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err:#}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    match cli.command.unwrap_or_else(|| Command::Serve(ServeArgs::default())) {
        Command::Serve(args) => {
            if let Some(host) = args.host {
                config.server.host = host;
            }
            if let Some(port) = args.port {
                config.server.port = port;
            }
            if let Some(dir) = args.policy_dir {
                config.policy_dir = dir;
            }
            api::serve(&config).await
        }
        Command::Calculate(args) => run_calculate(&config, args),
    }
}

fn run_calculate(config: &AppConfig, args: CalculateArgs) -> Result<()> {
    let data = std::fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let mut request: CalculationRequest = serde_json::from_str(&data)
        .with_context(|| format!("failed to parse {}", args.input.display()))?;

    if let Err(err) = request.roster.validate() {
        warn!(error = %err, "roster failed validation, calculating anyway");
    }
    if request.policy.is_none() {
        let dir = args.policy_dir.as_ref().unwrap_or(&config.policy_dir);
        let store = PolicyStore::from_dir(dir)?;
        if !attach_policy(&mut request, &store) {
            info!(dir = %dir.display(), "no policy applies, every award is zero");
        }
    }

    let engine = IncentiveEngine::new(config.engine);
    let result = engine.calculate(&request.roster, request.policy.as_ref(), &request.publication);
    let output = if args.pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    println!("{output}");
    Ok(())
}
