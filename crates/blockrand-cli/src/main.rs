use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use commands::{
    export::{self, ExportArgs},
    log::{self, LogArgs},
    report::{self, ReportArgs},
    session::{self, SessionArgs},
    strata,
};
use config::SessionConfig;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

#[derive(Parser, Debug)]
#[command(name = "blockrand", about = "Stratified block randomization for three-arm trials")]
struct Cli {
    /// YAML session configuration.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Assignment log database, overriding the configuration file.
    #[arg(long, global = true)]
    log: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start an interactive allocation session reading commands from stdin.
    Session(SessionArgs),
    /// Print the persisted assignment log as a table.
    Log(LogArgs),
    /// Export the assignment log as CSV.
    Export(ExportArgs),
    /// Write a static HTML report of the assignment log.
    Report(ReportArgs),
    /// List stratum keys in canonical order.
    Strata,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();
    let cli = Cli::parse();
    let config = SessionConfig::resolve(cli.config.as_deref(), cli.log.as_deref())?;
    match cli.command {
        Command::Session(args) => session::run(&args, &config),
        Command::Log(args) => log::run(&args, &config),
        Command::Export(args) => export::run(&args, &config),
        Command::Report(args) => report::run(&args, &config),
        Command::Strata => strata::run(),
    }
}
