//! Agora Node - Bootstrap binary.
//!
//! Writes a starter configuration, deploys a wired governance system from
//! it, and inspects saved snapshots.

use std::path::PathBuf;

use agora_node::{config::NodeConfig, telemetry, Deployment, StateSnapshot};
use clap::{Parser, Subcommand};
use tracing::info;

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "agora-node")]
#[command(about = "Agora Node - token-weighted governance bootstrap")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Args {
    /// Config file path
    #[arg(short, long, value_name = "FILE", env = "AGORA_CONFIG")]
    config: Option<PathBuf>,

    /// Log level, overrides the config file
    #[arg(short, long)]
    log_level: Option<String>,

    /// Emit JSON logs
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write the default configuration
    InitConfig {
        #[arg(short, long, default_value = "agora.toml")]
        output: PathBuf,
    },
    /// Deploy from the configuration and save a state snapshot
    Deploy {
        /// Snapshot path, defaults to <data_dir>/state.json
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Summarize a saved snapshot
    Inspect {
        snapshot: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => NodeConfig::from_file(path)?,
        None => NodeConfig::default(),
    };
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    if args.json_logs {
        config.logging.format = "json".to_string();
    }
    telemetry::init_from_config(&config.logging)?;

    match args.command {
        Command::InitConfig { output } => {
            NodeConfig::default().to_file(&output)?;
            info!("Wrote default configuration to {:?}", output);
        }
        Command::Deploy { output } => {
            config.validate()?;
            info!("Deploying {}", config.name);
            let deployment = Deployment::bootstrap(&config)?;
            let path = output.unwrap_or_else(|| config.data_dir.join("state.json"));
            deployment.snapshot()?.save(&path)?;
            info!("Snapshot saved to {:?}", path);
        }
        Command::Inspect { snapshot } => {
            let deployment = Deployment::from_snapshot(StateSnapshot::load(&snapshot)?);
            print_summary(&deployment)?;
        }
    }

    Ok(())
}

fn print_summary(deployment: &Deployment) -> anyhow::Result<()> {
    let governor = &deployment.governor;
    println!("block:            {}", deployment.env.block);
    println!("timestamp:        {}", deployment.env.timestamp);
    println!("total supply:     {}", deployment.ledger.total_supply());
    println!("governor:         {}", governor.address());
    println!("  voting delay:   {}", governor.voting_delay());
    println!("  voting period:  {}", governor.voting_period());
    println!("  threshold:      {}", governor.proposal_threshold());
    println!("  quorum:         {}%", governor.quorum_numerator());
    println!("timelock:         {}", deployment.timelock.address());
    println!("  min delay:      {}s", deployment.timelock.min_delay());
    println!("store:            {}", deployment.store);
    println!("  value:          {}", deployment.stored_value()?.retrieve());
    Ok(())
}
