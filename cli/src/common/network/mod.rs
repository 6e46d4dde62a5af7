//! # Webdav Network Utilities Module (`common::network`)
//!
//! File: cli/src/common/network/mod.rs
//!
//! ## Overview
//!
//! Network plumbing used by the orchestrator:
//!
//! - **`ports`**: Single-attempt port probing (is a port free, get any free port).
//! - **`admin`**: HTTP client for the proxy's admin API (`POST /load`).
//!
//! ## Usage
//!
//! ```rust,ignore
//! use crate::common::network::{admin::AdminClient, ports};
//!
//! if ports::is_port_available(2019).await? {
//!     // nobody is serving the admin API yet
//! }
//! let port = ports::free_port().await?;
//! AdminClient::new(&cfg.admin)?.push(&document).await?;
//! ```
//!

/// Client for the proxy's configuration endpoint.
pub mod admin;
/// TCP port availability checks.
pub mod ports;

#[cfg(test)]
pub(crate) mod stub;
