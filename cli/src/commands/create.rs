//! # Webdav Create Command
//!
//! File: cli/src/commands/create.rs
//!
//! ## Overview
//!
//! This module implements `webdav create [PATH]`, which is also what runs when
//! `webdav` is invoked without a subcommand. It serves `PATH` (default: the
//! current directory) over WebDAV, prints the resulting handle as JSON, and
//! keeps serving until the process receives Ctrl+C or SIGTERM.
//!
//! ## Architecture
//!
//! 1. Load and merge configuration (`core::config`), applying `--bin-dir`
//! 2. Call `server::start_with_config` to launch/configure the proxy
//! 3. Print the handle (`host`, `port`, `url`) to stdout
//! 4. Wait for a shutdown signal
//! 5. `shutdown()` the handle: unload the configuration, stop the proxy if we launched it
//!
//! ## Usage
//!
//! ```bash
//! # Serve the current directory
//! webdav
//!
//! # Serve a specific directory with a custom proxy location
//! webdav --bin-dir ~/tools/caddy create ./public
//! ```
//!
use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, error, info};
use webdav::core::{config, error::Result};
use webdav::server;

/// # Create Arguments (`CreateArgs`)
#[derive(Parser, Debug)]
#[command(about = "Serve a directory over WebDAV (default command)")]
pub struct CreateArgs {
    /// Directory to serve. Defaults to the current working directory.
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

impl Default for CreateArgs {
    fn default() -> Self {
        Self {
            path: PathBuf::from("."),
        }
    }
}

/// # Handle Create Command (`handle_create`)
///
/// ## Arguments
///
/// * `args`: The parsed `CreateArgs`.
/// * `bin_dir`: Optional override for the directory containing the proxy binary.
///
/// ## Returns
///
/// * `Result<()>`: `Ok(())` once the server was torn down after a shutdown signal.
///   An `Err` if configuration, startup, or teardown fails.
pub async fn handle_create(args: CreateArgs, bin_dir: Option<PathBuf>) -> Result<()> {
    info!("Handling create command...");
    debug!("Create args: {:?}", args);

    let cfg = config::load_config(bin_dir).context("Failed to load webdav configuration")?;

    // Registered before serving so a signal arriving right after startup is not lost.
    let shutdown = shutdown_signal();

    let handle = server::start_with_config(&args.path, &cfg)
        .await
        .with_context(|| format!("Failed to serve '{}'", args.path.display()))?;

    println!(
        "{}",
        serde_json::to_string_pretty(&handle).context("Failed to format server handle")?
    );
    println!("Serving {}. Press Ctrl+C to stop.", handle.root().display());

    shutdown.await;

    handle
        .shutdown()
        .await
        .context("Failed to tear down WebDAV server")?;
    println!("Server shutdown complete.");
    Ok(())
}

/// # Handle Shutdown Signal (`shutdown_signal`)
///
/// Installs the SIGTERM handler (Unix) immediately and returns a future that
/// resolves when Ctrl+C or SIGTERM is received.
fn shutdown_signal() -> impl std::future::Future<Output = ()> {
    #[cfg(unix)]
    let term = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate());

    async move {
        let ctrl_c = async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Received Ctrl+C, shutting down..."),
                Err(e) => {
                    error!("Failed to install Ctrl+C handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(unix)]
        let terminate = async move {
            match term {
                Ok(mut term) => {
                    term.recv().await;
                    info!("Received SIGTERM, shutting down...");
                }
                Err(e) => {
                    error!(
                        "Failed to install SIGTERM handler: {}. Shutdown on SIGTERM might not work.",
                        e
                    );
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate => {},
        }
    }
}
