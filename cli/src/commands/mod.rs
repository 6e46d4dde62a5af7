//! # Webdav Command Modules
//!
//! File: cli/src/commands/mod.rs
//!
//! ## Overview
//!
//! Command handlers for the `webdav` binary. Each command defines its own
//! argument struct and an async handler called from `main.rs`.
//!
//! ## Commands
//!
//! - `create`: Serve a directory over WebDAV (also the default when no subcommand is given)
//!

/// Serve a directory over WebDAV until interrupted.
pub mod create;
