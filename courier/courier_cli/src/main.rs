//! Courier command line interface.
//!
//! Runs small actor topologies on the Courier runtime and prints the outcome
//! as JSON on stdout. Logs go to stderr.

mod commands;
mod config;
mod logging;

use anyhow::Context;
use clap::{Parser, Subcommand};
use courier_core::LogLevel;
use std::path::PathBuf;
use std::process::ExitCode;

use commands::{broadcast, echo, relay, send, timer};
use config::CliConfig;

/// Courier actor runtime command line interface
#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    /// TOML configuration file
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warning, error); overrides the config file
    #[clap(long, global = true)]
    log_level: Option<LogLevel>,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a message to an echo actor and wait for the reply
    Echo(echo::EchoArgs),

    /// Broadcast a message to a group of actors
    Broadcast(broadcast::BroadcastArgs),

    /// Arm a named timer on an actor and report what it delivers
    Timer(timer::TimerArgs),

    /// Forward a worker's result to a collector actor
    Relay(relay::RelayArgs),

    /// Fire-and-forget a message to a named actor
    Send(send::SendArgs),
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = CliConfig::load(cli.config.as_deref()).context("loading configuration")?;
    logging::init(cli.log_level.unwrap_or(config.logging.level));

    let output = match cli.command {
        Commands::Echo(args) => echo::execute(&args, &config)?,
        Commands::Broadcast(args) => broadcast::execute(&args, &config)?,
        Commands::Timer(args) => timer::execute(&args, &config)?,
        Commands::Relay(args) => relay::execute(&args, &config)?,
        Commands::Send(args) => send::execute(&args, &config)?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
