//! # Webdav Error Types
//!
//! File: cli/src/core/error.rs
//!
//! ## Overview
//!
//! This module defines the error types used throughout the `webdav` crate.
//! It follows a hybrid approach:
//! - `WebdavError`: A custom error enum using `thiserror` for the failure modes
//!   callers may want to match on (timeouts, admin API rejections, ...)
//! - `Result<T>`: A type alias for `anyhow::Result<T>` so call sites can attach
//!   context with `anyhow::Context`
//!
//! The error kinds cover the orchestration steps:
//! - Port probing (`PortUnavailable`)
//! - Launching the proxy (`ProcessSpawn`, `ProcessStartTimeout`, `ProcessExited`)
//! - Talking to the admin API (`AdminPush`, `AdminUnreachable`, `Serialization`)
//! - Configuration and input validation (`Config`, `Directory`)
//!
//! ## Examples
//!
//! ```rust,ignore
//! match webdav::server::start(root, bin_dir).await {
//!     Ok(handle) => println!("{}", handle.url),
//!     Err(e) if matches!(
//!         e.downcast_ref::<WebdavError>(),
//!         Some(WebdavError::ProcessStartTimeout { .. })
//!     ) => {
//!         eprintln!("Caddy never reported ready");
//!     }
//!     Err(e) => return Err(e),
//! }
//! ```
//!
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Custom error type for the webdav crate.
#[derive(Error, Debug)]
pub enum WebdavError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Directory error: {0}")]
    Directory(String),

    #[error("Port {port} is not available.")]
    PortUnavailable { port: u16 },

    #[error("Failed to spawn proxy executable '{}': {source}", .path.display())]
    ProcessSpawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Proxy did not report ready within {}s.", .timeout.as_secs())]
    ProcessStartTimeout { timeout: Duration },

    #[error("Proxy process exited before its admin endpoint was ready.")]
    ProcessExited,

    #[error("Admin API rejected configuration with status {status}: {body}")]
    AdminPush { status: u16, body: String },

    #[error("Admin API at {url} is unreachable: {source}")]
    AdminUnreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to serialize configuration document: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
}

/// Type alias for Result using anyhow::Error for broad compatibility.
/// Anyhow allows for easy context addition and flexible error handling.
pub type Result<T> = anyhow::Result<T>;
