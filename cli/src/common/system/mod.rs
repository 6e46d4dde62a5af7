//! # Webdav System Utilities Module (`common::system`)
//!
//! File: cli/src/common/system/mod.rs
//!
//! ## Overview
//!
//! Host-system lookups needed to locate the bundled proxy binary. Prebuilt
//! proxy binaries ship in a `bin/<platform>/` tree next to the `webdav`
//! executable, where `<platform>` uses the historical platform identifiers
//! (`linux`, `darwin`, `win32`, ...) so existing bin trees keep working.
//!
//! ```text
//! webdav
//! bin/
//!   linux/caddy
//!   darwin/caddy
//!   win32/caddy.exe
//! ```
//!
use crate::core::error::Result;
use anyhow::Context;
use std::path::{Path, PathBuf};

/// Name of the directory holding the per-platform binaries.
const BIN_DIR_NAME: &str = "bin";

/// # Platform Identifier (`platform_id`)
///
/// Maps `std::env::consts::OS` to the identifier used for the `bin/` subdirectory.
/// Operating systems without a historical alias use the Rust name unchanged.
pub fn platform_id() -> &'static str {
    platform_id_for(std::env::consts::OS)
}

fn platform_id_for(os: &'static str) -> &'static str {
    match os {
        "macos" => "darwin",
        "windows" => "win32",
        other => other,
    }
}

/// File name of an executable on this platform (`caddy` or `caddy.exe`).
pub fn executable_file_name(binary_name: &str) -> String {
    format!("{}{}", binary_name, std::env::consts::EXE_SUFFIX)
}

/// Full path of `binary_name` inside `executable_dir`.
pub fn executable_path(executable_dir: &Path, binary_name: &str) -> PathBuf {
    executable_dir.join(executable_file_name(binary_name))
}

/// # Default Executable Directory (`default_executable_dir`)
///
/// `<directory of the running executable>/bin/<platform>`.
///
/// ## Errors
///
/// Returns an error if the path of the running executable cannot be determined.
pub fn default_executable_dir() -> Result<PathBuf> {
    let current_exe =
        std::env::current_exe().context("Failed to determine path of the running executable")?;
    let base = current_exe
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    Ok(base.join(BIN_DIR_NAME).join(platform_id()))
}
