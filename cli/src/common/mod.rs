//! # Webdav Common Utilities (`common`)
//!
//! File: cli/src/common/mod.rs
//!
//! ## Overview
//!
//! This module is the organizational entry point for the shared utilities the
//! orchestrator (`server`) is built from. Each submodule covers one concern:
//!
//! - **`network`**: Port probing and the HTTP client for the proxy's admin API.
//! - **`process`**: Launching the proxy binary, readiness detection, and owning the child process.
//! - **`system`**: Platform identification and locating the bundled proxy binary.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use crate::common::{network::ports, process::ProxyProcess, system};
//!
//! # async fn run_example(cfg: &crate::core::config::Config) -> crate::core::error::Result<()> {
//! if ports::is_port_available(cfg.admin.port).await? {
//!     let proxy = ProxyProcess::launch(&system::default_executable_dir()?, &cfg.proxy).await?;
//!     proxy.stop().await?;
//! }
//! # Ok(())
//! # }
//! ```
//!

/// Port probing and the admin API client.
pub mod network;
/// Proxy process launch and supervision.
pub mod process;
/// Platform identification and binary lookup.
pub mod system;
