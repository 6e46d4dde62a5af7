//! # Webdav Core Infrastructure
//!
//! File: cli/src/core/mod.rs
//!
//! ## Overview
//!
//! Foundational pieces used by every other module:
//! - `config`: Configuration loading, merging, and validation
//! - `error`: Error types and the crate-wide `Result` alias
//!
//! ## Usage
//!
//! ```rust,ignore
//! use crate::core::config; // For loading configuration
//! use crate::core::error::{Result, WebdavError}; // For error handling
//! ```
//!
pub mod config;
pub mod error;
