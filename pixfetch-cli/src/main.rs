//! pixfetch CLI - Command-line interface
//!
//! This binary provides a command-line interface to the pixfetch library.

mod commands;
mod error;

use clap::{Parser, Subcommand};
use pixfetch::logging::{default_log_dir, default_log_file, init_logging};
use std::path::PathBuf;

use commands::config::ConfigCommands;
use commands::fetch::FetchArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "pixfetch")]
#[command(version = pixfetch::VERSION)]
#[command(about = "Fetch, decode and cache images", long_about = None)]
struct Cli {
    /// Config file (default: ~/.pixfetch/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch and decode one or more images
    Fetch(FetchArgs),

    /// Manage the configuration file
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        e.exit();
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Fetch(args) => {
            let _logging = init_logging(&default_log_dir(), default_log_file())
                .map_err(|e| CliError::LoggingInit(e.to_string()))?;
            commands::fetch::run(args, cli.config.as_deref())
        }
        Command::Config(command) => commands::config::run(command, cli.config.as_deref()),
    }
}
