//! # Webdav Configuration System
//!
//! File: cli/src/core/config.rs
//!
//! ## Overview
//!
//! This module implements the configuration system for webdav, handling loading,
//! merging, validation, and access to configuration data. It combines built-in
//! defaults, user settings, and project-specific overrides.
//!
//! ## Architecture
//!
//! Configuration sources (in order of precedence):
//! 1. Command-line flags (`--bin-dir`, or `WEBDAV_BIN_DIR`), passed to `load_config`
//! 2. Project-specific `.webdav.toml` in the current directory or ancestors
//! 3. User-specific `~/.config/webdav/config.toml` (platform dependent)
//! 4. Default values defined in the code
//!
//! Paths are expanded (`~` to home directory) and the merged result is
//! validated before use.
//!
//! ## Examples
//!
//! ```toml
//! [proxy]
//! bin_dir = "~/tools/caddy"
//! ready_timeout_secs = 15
//!
//! [admin]
//! port = 2019
//! ```
//!
//! ```rust,ignore
//! let cfg = config::load_config(None)?;
//! let bin_dir = cfg.executable_dir()?;
//! let timeout = cfg.proxy.ready_timeout();
//! ```
//!
use crate::common::system;
use crate::core::error::{Result, WebdavError};
use anyhow::{anyhow, Context};
use directories::ProjectDirs;
use serde::Deserialize;
use std::time::Duration;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

/// Represents the main configuration structure, loaded from TOML files.
#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)] // Error if unknown fields are in TOML
pub struct Config {
    #[serde(default)]
    pub proxy: ProxyConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub serve: ServeConfig,
}

/// Settings for launching the external proxy process.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ProxyConfig {
    /// Directory containing the proxy binary (can use ~). Defaults to
    /// `<dir of current executable>/bin/<platform>` when unset.
    #[serde(default)]
    pub bin_dir: Option<String>,
    /// File name of the proxy binary inside `bin_dir`, without platform suffix.
    #[serde(default = "default_binary_name")]
    pub binary_name: String,
    /// Seconds to wait for the readiness marker.
    #[serde(default = "default_ready_timeout_secs")]
    pub ready_timeout_secs: u64,
    /// `msg` value of the log record announcing the admin endpoint.
    #[serde(default = "default_ready_marker")]
    pub ready_marker: String,
}

/// Location of the proxy's admin API.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AdminConfig {
    #[serde(default = "default_admin_host")]
    pub host: String,
    #[serde(default = "default_admin_port")]
    pub port: u16,
}

/// How the served directory is exposed.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServeConfig {
    /// Host name reported in the handle and its URL.
    #[serde(default = "default_serve_host")]
    pub host: String,
    /// Key of the server entry under `apps.http.servers`.
    #[serde(default = "default_server_name")]
    pub server_name: String,
}

fn default_binary_name() -> String {
    "caddy".to_string()
}
fn default_ready_timeout_secs() -> u64 {
    10
}
fn default_ready_marker() -> String {
    "admin endpoint started".to_string()
}
fn default_admin_host() -> String {
    "localhost".to_string()
}
fn default_admin_port() -> u16 {
    2019
}
fn default_serve_host() -> String {
    "localhost".to_string()
}
fn default_server_name() -> String {
    "srv0".to_string()
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            bin_dir: None,
            binary_name: default_binary_name(),
            ready_timeout_secs: default_ready_timeout_secs(),
            ready_marker: default_ready_marker(),
        }
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            host: default_admin_host(),
            port: default_admin_port(),
        }
    }
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            host: default_serve_host(),
            server_name: default_server_name(),
        }
    }
}

impl ProxyConfig {
    pub fn ready_timeout(&self) -> Duration {
        Duration::from_secs(self.ready_timeout_secs)
    }
}

impl AdminConfig {
    /// Full URL of the configuration load endpoint.
    pub fn load_url(&self) -> String {
        format!("http://{}:{}/load", self.host, self.port)
    }

    /// Whether `host` names this machine. The admin port can only be probed
    /// (and the proxy launched) locally, so other hosts are rejected.
    pub fn is_loopback(&self) -> bool {
        let host = self.host.trim().trim_start_matches('[').trim_end_matches(']');
        host.eq_ignore_ascii_case("localhost")
            || host
                .parse::<std::net::IpAddr>()
                .map(|ip| ip.is_loopback())
                .unwrap_or(false)
    }
}

impl Config {
    /// Directory the proxy binary is looked up in.
    ///
    /// Uses `proxy.bin_dir` when configured, otherwise the platform default
    /// next to the running executable (see `common::system::default_executable_dir`).
    pub fn executable_dir(&self) -> Result<PathBuf> {
        match &self.proxy.bin_dir {
            Some(dir) => Ok(PathBuf::from(dir)),
            None => system::default_executable_dir(),
        }
    }

    /// Applies a command-line override of the executable directory.
    pub fn with_bin_dir(mut self, bin_dir: Option<PathBuf>) -> Self {
        if let Some(dir) = bin_dir {
            debug!("Overriding proxy bin_dir with {}", dir.display());
            self.proxy.bin_dir = Some(dir.to_string_lossy().into_owned());
        }
        self
    }
}

const PROJECT_CONFIG_FILENAME: &str = ".webdav.toml";

/// Loads, merges, expands and validates the configuration. `bin_dir` is the
/// command-line override and is validated like a configured value.
pub fn load_config(bin_dir: Option<PathBuf>) -> Result<Config> {
    let user_config = load_user_config()?;
    let project_config = load_project_config()?;
    let mut merged_config =
        merge_configs(user_config.unwrap_or_default(), project_config).with_bin_dir(bin_dir);
    expand_config_paths(&mut merged_config).context("Failed to expand paths in configuration")?;
    validate_config(&merged_config).context("Configuration validation failed")?;
    debug!("Final loaded configuration: {:?}", merged_config);
    Ok(merged_config)
}

fn load_user_config() -> Result<Option<Config>> {
    if let Some(proj_dirs) = ProjectDirs::from("org", "Humusities", "webdav") {
        let config_path = proj_dirs.config_dir().join("config.toml");
        if config_path.exists() {
            info!("Loading user configuration from: {}", config_path.display());
            load_config_from_path(&config_path).map(Some)
        } else {
            debug!(
                "User configuration file not found at {}",
                config_path.display()
            );
            Ok(None)
        }
    } else {
        warn!("Could not determine user config directory.");
        Ok(None)
    }
}

fn load_project_config() -> Result<Option<Config>> {
    let current_dir = std::env::current_dir().context("Failed to get current directory")?;
    if let Some(project_config_path) = find_project_config_path(&current_dir) {
        info!(
            "Loading project configuration from: {}",
            project_config_path.display()
        );
        load_config_from_path(&project_config_path).map(Some)
    } else {
        debug!("No project configuration file (.webdav.toml) found in current directory or ancestors.");
        Ok(None)
    }
}

/// Walks from `start` towards the root looking for `.webdav.toml`,
/// stopping at the first directory that contains `.git`.
fn find_project_config_path(start: &Path) -> Option<PathBuf> {
    let mut path = start;
    loop {
        let project_config = path.join(PROJECT_CONFIG_FILENAME);
        if project_config.is_file() {
            return Some(project_config);
        }
        if path.join(".git").is_dir() {
            debug!(
                "Found .git directory at {}, stopping project config search.",
                path.display()
            );
            return None;
        }
        path = path.parent()?;
    }
}

fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse TOML from file: {}", path.display()))
}

/// Project values win wherever they differ from the built-in default.
fn merge_configs(user: Config, project: Option<Config>) -> Config {
    let project_cfg = match project {
        Some(p) => p,
        None => return user,
    };
    let defaults = Config::default();
    let mut merged = Config::default();

    merged.proxy.bin_dir = project_cfg.proxy.bin_dir.or(user.proxy.bin_dir);
    merged.proxy.binary_name = if project_cfg.proxy.binary_name != defaults.proxy.binary_name {
        project_cfg.proxy.binary_name
    } else {
        user.proxy.binary_name
    };
    merged.proxy.ready_timeout_secs =
        if project_cfg.proxy.ready_timeout_secs != defaults.proxy.ready_timeout_secs {
            project_cfg.proxy.ready_timeout_secs
        } else {
            user.proxy.ready_timeout_secs
        };
    merged.proxy.ready_marker = if project_cfg.proxy.ready_marker != defaults.proxy.ready_marker {
        project_cfg.proxy.ready_marker
    } else {
        user.proxy.ready_marker
    };
    merged.admin.host = if project_cfg.admin.host != defaults.admin.host {
        project_cfg.admin.host
    } else {
        user.admin.host
    };
    merged.admin.port = if project_cfg.admin.port != defaults.admin.port {
        project_cfg.admin.port
    } else {
        user.admin.port
    };
    merged.serve.host = if project_cfg.serve.host != defaults.serve.host {
        project_cfg.serve.host
    } else {
        user.serve.host
    };
    merged.serve.server_name = if project_cfg.serve.server_name != defaults.serve.server_name {
        project_cfg.serve.server_name
    } else {
        user.serve.server_name
    };
    merged
}

fn expand_config_paths(config: &mut Config) -> Result<()> {
    if let Some(dir) = config.proxy.bin_dir.as_mut() {
        *dir = shellexpand::tilde(dir.as_str()).into_owned();
        debug!("Expanded proxy bin_dir: {}", dir);
    }
    Ok(())
}

pub fn validate_config(config: &Config) -> Result<()> {
    debug!("Validating final configuration...");
    if config.admin.port == 0 {
        return Err(anyhow!(WebdavError::Config(
            "admin.port must not be 0.".to_string()
        )));
    }
    if config.admin.host.trim().is_empty() {
        return Err(anyhow!(WebdavError::Config(
            "admin.host must not be empty.".to_string()
        )));
    }
    if !config.admin.is_loopback() {
        return Err(anyhow!(WebdavError::Config(format!(
            "admin.host '{}' is not a loopback address; only a local admin endpoint is supported.",
            config.admin.host
        ))));
    }
    if config.proxy.ready_timeout_secs == 0 {
        return Err(anyhow!(WebdavError::Config(
            "proxy.ready_timeout_secs must be greater than 0.".to_string()
        )));
    }
    if config.proxy.binary_name.trim().is_empty() {
        return Err(anyhow!(WebdavError::Config(
            "proxy.binary_name must not be empty.".to_string()
        )));
    }
    if config.proxy.ready_marker.is_empty() {
        return Err(anyhow!(WebdavError::Config(
            "proxy.ready_marker must not be empty.".to_string()
        )));
    }
    if config.serve.server_name.trim().is_empty() {
        return Err(anyhow!(WebdavError::Config(
            "serve.server_name must not be empty.".to_string()
        )));
    }
    if let Some(dir) = &config.proxy.bin_dir {
        let bin_dir = PathBuf::from(dir);
        if !bin_dir.exists() {
            warn!(
                "Configured proxy bin_dir '{}' does not exist.",
                bin_dir.display()
            );
        } else if !bin_dir.is_dir() {
            return Err(anyhow!(WebdavError::Config(format!(
                "Configured proxy bin_dir '{}' exists but is not a directory.",
                bin_dir.display()
            ))));
        }
    }
    debug!("Configuration validation successful.");
    Ok(())
}
