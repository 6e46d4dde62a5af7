//! # Webdav Main Entry Point
//!
//! File: cli/src/main.rs
//!
//! ## Overview
//!
//! This file serves as the main entry point for the `webdav` CLI.
//! It handles:
//! - Command-line argument parsing using Clap
//! - Setting up the logging system based on verbosity flags
//! - Routing execution to the command handler
//!
//! ## Examples
//!
//! ```bash
//! # Serve the current directory
//! webdav
//!
//! # Serve ./public with debug logging
//! webdav -vv create ./public
//! ```
//!
//! Command processing flow:
//! 1. Parse command-line args via Clap (unknown subcommands exit with a usage error)
//! 2. Configure logging based on verbosity level
//! 3. Route to the command handler (`create` when no subcommand is given)
//! 4. Format and display any errors that occur, exiting with status 1
//!
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

mod commands;

/// Banner printed on every start.
const BANNER: &str = "Humusities/Webdav";

/// Defines the top-level command-line arguments structure using Clap's derive macros.
#[derive(Parser, Debug)]
#[command(
    name = "webdav",
    about = "Serve a local directory over WebDAV through Caddy",
    long_about = "Starts Caddy (if its admin API is not already running on :2019) and \
                  configures it to serve a directory over WebDAV on a free port.",
    propagate_version = true,
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// Directory containing the Caddy binary. Defaults to `bin/<platform>` next to this executable.
    #[arg(long, env = "WEBDAV_BIN_DIR", global = true)]
    bin_dir: Option<PathBuf>,
}

/// Enum defining all available top-level commands.
#[derive(Subcommand, Debug)]
enum Commands {
    Create(commands::create::CreateArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    tracing::debug!("Parsed CLI arguments: {:?}", cli);
    eprintln!("\x1b[33m{}\x1b[0m", BANNER);

    let command_result = match cli.command {
        Some(Commands::Create(args)) => commands::create::handle_create(args, cli.bin_dir).await,
        None => commands::create::handle_create(Default::default(), cli.bin_dir).await,
    };

    if let Err(e) = command_result {
        tracing::error!("Command execution failed: {:?}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
