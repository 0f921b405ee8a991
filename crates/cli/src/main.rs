//! Criteo bidder CLI.
//!
//! This tool provides commands for:
//! - Validating adapter settings files
//! - Printing the Criteo HTTP request built from a bid request
//! - Printing the bids mapped from a recorded Criteo response

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

mod config;
mod error;
mod map;

use criteo_bidder_common::logging::{init_logger, level_for_verbosity};
use error::CliError;

#[derive(Parser)]
#[command(name = "cbcli")]
#[command(about = "Run the Criteo bidder mappings against local files")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Map a bid request to the Criteo HTTP request
    Request {
        /// Path to the bid request JSON
        #[arg(long, short)]
        input: PathBuf,

        /// Path to the TOML settings file (defaults apply when omitted)
        #[arg(long, short, env = "CRITEO_BIDDER_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Map a Criteo response to bids
    Bids {
        /// Path to the bid request JSON the response answers
        #[arg(long, short)]
        input: PathBuf,

        /// Path to the Criteo response body
        #[arg(long, short)]
        response: PathBuf,

        /// HTTP status the response came with
        #[arg(long, short, default_value_t = 200)]
        status: u16,

        /// Path to the TOML settings file (defaults apply when omitted)
        #[arg(long, short, env = "CRITEO_BIDDER_CONFIG")]
        config: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Validate the adapter settings
    Validate {
        /// Path to the TOML configuration file
        #[arg(long, short)]
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logger(level_for_verbosity(cli.verbose)) {
        eprintln!("Error: {:?}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let verbose = cli.verbose > 0;

    match cli.command {
        Commands::Config { action } => match action {
            ConfigAction::Validate { file } => config::validate(&file, verbose),
        },
        Commands::Request { input, config } => map::request(&input, config.as_deref(), verbose),
        Commands::Bids {
            input,
            response,
            status,
            config,
        } => map::bids(&input, &response, status, config.as_deref(), verbose),
    }
}
