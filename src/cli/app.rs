//! CLI entry point: parse args, init logging, run the agent, map exit codes.

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::env::CliArgs;
use super::run;

pub async fn run() -> Result<()> {
    let cli = CliArgs::parse();
    init_logging(cli.verbose)?;

    info!("starting axpilot v{}", env!("CARGO_PKG_VERSION"));

    let result = run::execute(&cli).await?;
    let code = result.reason.exit_code();

    println!();
    println!("goal:    {}", cli.goal);
    println!("reason:  {}", result.reason.as_str());
    println!("steps:   {}", result.steps);
    println!("outcome: {}", result.final_observation);

    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

fn init_logging(verbose: bool) -> Result<()> {
    let default_filter = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to init logging: {err}"))?;
    Ok(())
}
