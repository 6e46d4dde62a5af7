//! # Webdav Library
//!
//! File: cli/src/lib.rs
//!
//! ## Overview
//!
//! Serves a local directory over WebDAV through an external Caddy process.
//! The crate does not implement WebDAV itself: it finds free ports, starts the
//! proxy if its admin endpoint is not running yet, and pushes a JSON
//! configuration to the proxy's admin API.
//!
//! ## Architecture
//!
//! - `core`: configuration and error types
//! - `common`: port probing, admin API client, proxy process supervision, platform lookups
//! - `server`: the orchestration entry point (`server::start`) and `ServerHandle`
//!
//! The `webdav` binary (`main.rs`) is a thin front end over `server::start_with_config`.
//!
pub mod common;
pub mod core;
pub mod server;

pub use crate::core::error::{Result, WebdavError};
pub use crate::server::{start, start_with_config, ServerHandle};
