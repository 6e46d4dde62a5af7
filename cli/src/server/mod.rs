//! # Webdav Server Orchestration (`server`)
//!
//! File: cli/src/server/mod.rs
//!
//! ## Overview
//!
//! The programmatic entry point of the crate. `start` serves a local directory
//! over WebDAV by driving an external Caddy process through its admin API and
//! returns a `ServerHandle` describing where the directory is reachable.
//!
//! ## Architecture
//!
//! `start_with_config` runs strictly in order:
//! 1. Resolve the root directory to an absolute, existing directory
//! 2. Probe the admin port (2019 by default) on loopback; a non-local admin
//!    host is rejected
//! 3. If free, launch the proxy and wait for its readiness marker;
//!    if taken, log a warning and assume a usable admin endpoint is running
//! 4. Probe for any free port to serve on
//! 5. Build the WebDAV route, wrap it under the server name (`srv0`) and push it
//! 6. Return the handle
//!
//! Each push replaces the whole `apps.http.servers` map, so at most one
//! directory is served at a time.
//!
//! ## Examples
//!
//! ```rust,no_run
//! # async fn run() -> anyhow::Result<()> {
//! let handle = webdav::server::start("./public", "./bin/linux").await?;
//! println!("Serving at {}", handle.url);
//! handle.destroy().await?; // unbind the server, keep the proxy running
//! handle.shutdown().await?; // also stops the proxy if `start` launched it
//! # Ok(())
//! # }
//! ```
//!
pub mod caddy_config;

use crate::common::network::{admin::AdminClient, ports};
use crate::common::process::ProxyProcess;
use crate::core::config::Config;
use crate::core::error::{Result, WebdavError};
use anyhow::Context;
use caddy_config::{build_server, build_server_config, CaddyConfig};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// # Server Handle (`ServerHandle`)
///
/// Describes an active served directory. Serializes to `{host, port, url}`.
///
/// Teardown is explicit: `destroy` unloads the configuration and reports the
/// outcome, `shutdown` additionally stops the proxy when this handle launched
/// it. Dropping the handle without `shutdown` still kills a launched proxy.
#[derive(Debug, Serialize)]
pub struct ServerHandle {
    pub host: String,
    pub port: u16,
    pub url: String,
    #[serde(skip)]
    root: PathBuf,
    #[serde(skip)]
    admin: AdminClient,
    #[serde(skip)]
    proxy: Option<ProxyProcess>,
}

impl ServerHandle {
    /// Canonical path of the directory being served.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether `start` launched the proxy process owned by this handle.
    pub fn owns_proxy(&self) -> bool {
        self.proxy.is_some()
    }

    /// # Destroy (`destroy`)
    ///
    /// Pushes an empty configuration document, unbinding every server.
    ///
    /// ## Errors
    ///
    /// Any admin API failure (`AdminPush`, `AdminUnreachable`).
    pub async fn destroy(&self) -> Result<()> {
        info!("Unloading WebDAV server on port {}", self.port);
        self.admin
            .push(&CaddyConfig::empty())
            .await
            .context("Failed to unload WebDAV configuration")
    }

    /// # Shutdown (`shutdown`)
    ///
    /// `destroy`, then stop the proxy if this handle owns it. The proxy is
    /// stopped even when `destroy` fails; the `destroy` error is returned first.
    pub async fn shutdown(mut self) -> Result<()> {
        let unloaded = self.destroy().await;
        if let Some(proxy) = self.proxy.take() {
            let stopped = proxy.stop().await;
            unloaded?;
            return stopped;
        }
        unloaded
    }
}

/// # Start Serving (`start`)
///
/// Serves `root` over WebDAV with default settings, launching the proxy found
/// in `executable_dir` if no admin endpoint is running yet.
pub async fn start(root: impl AsRef<Path>, executable_dir: impl AsRef<Path>) -> Result<ServerHandle> {
    let config = Config::default().with_bin_dir(Some(executable_dir.as_ref().to_path_buf()));
    start_with_config(root, &config).await
}

/// Same as `start`, with every setting taken from `config`.
pub async fn start_with_config(root: impl AsRef<Path>, config: &Config) -> Result<ServerHandle> {
    let root = resolve_root(root.as_ref()).await?;
    if !config.admin.is_loopback() {
        return Err(WebdavError::Config(format!(
            "admin.host '{}' is not a loopback address; only a local admin endpoint is supported.",
            config.admin.host
        ))
        .into());
    }
    let admin = AdminClient::new(&config.admin)?;

    let admin_port = config.admin.port;
    let proxy = if ports::is_port_available(admin_port).await? {
        let executable_dir = config.executable_dir()?;
        let proxy = ProxyProcess::launch(&executable_dir, &config.proxy)
            .await
            .context("Failed to launch proxy")?;
        Some(proxy)
    } else {
        warn!(
            "{} Assuming an admin endpoint is already running, trying anyway...",
            WebdavError::PortUnavailable { port: admin_port }
        );
        None
    };

    let port = ports::free_port().await?;
    debug!("Serving on free port {}", port);

    let servers = BTreeMap::from([(config.serve.server_name.clone(), build_server(&root, port))]);
    // On failure `proxy` is dropped here, which kills a freshly launched child.
    admin
        .push(&build_server_config(servers))
        .await
        .context("Failed to load WebDAV configuration")?;

    let host = config.serve.host.clone();
    let url = format!("http://{}:{}", host, port);
    info!("Serving {} at {}", root.display(), url);

    Ok(ServerHandle {
        host,
        port,
        url,
        root,
        admin,
        proxy,
    })
}

/// Makes `root` absolute and canonical, and checks that it is a directory.
async fn resolve_root(root: &Path) -> Result<PathBuf> {
    let canonical = tokio::fs::canonicalize(root).await.map_err(|e| {
        WebdavError::Directory(format!(
            "'{}' could not be found or accessed: {}",
            root.display(),
            e
        ))
    })?;
    let metadata = tokio::fs::metadata(&canonical)
        .await
        .with_context(|| format!("Failed to get metadata for '{}'", canonical.display()))?;
    if !metadata.is_dir() {
        return Err(WebdavError::Directory(format!(
            "'{}' is not a directory",
            canonical.display()
        ))
        .into());
    }
    debug!("Resolved served directory to {}", canonical.display());
    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::network::stub::StubAdmin;
    use crate::core::config::AdminConfig;
    use tempfile::TempDir;

    /// Config pointing at a stub admin API, so the admin port is taken and no
    /// proxy is launched.
    fn config_for(stub: &StubAdmin) -> Config {
        Config {
            admin: AdminConfig {
                host: "127.0.0.1".to_string(),
                port: stub.port(),
            },
            ..Default::default()
        }
    }

    fn servers_in(body: &serde_json::Value) -> &serde_json::Map<String, serde_json::Value> {
        body["apps"]["http"]["servers"]
            .as_object()
            .expect("servers should be an object")
    }

    #[tokio::test]
    async fn test_start_with_running_admin_pushes_webdav_config() -> Result<()> {
        let stub = StubAdmin::spawn(200).await?;
        let dir = TempDir::new()?;

        let handle = start_with_config(dir.path(), &config_for(&stub)).await?;

        assert!(!handle.owns_proxy());
        assert_eq!(handle.host, "localhost");
        assert_ne!(handle.port, 0);
        assert_eq!(handle.url, format!("http://localhost:{}", handle.port));
        assert_eq!(handle.root(), dir.path().canonicalize()?);

        let pushes = stub.pushes();
        assert_eq!(pushes.len(), 1);
        let servers = servers_in(&pushes[0].body);
        assert_eq!(servers.len(), 1);
        let srv0 = &servers["srv0"];
        assert_eq!(srv0["listen"][0], format!(":{}", handle.port));
        assert_eq!(
            srv0["routes"][0]["handle"][1]["root"],
            &*handle.root().to_string_lossy()
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_handle_serializes_public_fields_only() -> Result<()> {
        let stub = StubAdmin::spawn(200).await?;
        let dir = TempDir::new()?;
        let handle = start_with_config(dir.path(), &config_for(&stub)).await?;

        let value = serde_json::to_value(&handle)?;
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 3);
        assert_eq!(value["port"], handle.port);
        assert_eq!(value["url"], handle.url.as_str());
        Ok(())
    }

    #[tokio::test]
    async fn test_destroy_pushes_empty_config() -> Result<()> {
        let stub = StubAdmin::spawn(200).await?;
        let dir = TempDir::new()?;
        let handle = start_with_config(dir.path(), &config_for(&stub)).await?;

        handle.destroy().await?;

        let pushes = stub.pushes();
        assert_eq!(pushes.len(), 2);
        assert!(servers_in(&pushes[1].body).is_empty());
        handle.shutdown().await
    }

    #[tokio::test]
    async fn test_destroy_failure_is_reported() -> Result<()> {
        let stub = StubAdmin::spawn(200).await?;
        let dir = TempDir::new()?;
        let handle = start_with_config(dir.path(), &config_for(&stub)).await?;

        stub.set_status(500);
        let err = handle.destroy().await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<WebdavError>(),
            Some(WebdavError::AdminPush { status: 500, .. })
        ));
        assert!(handle.shutdown().await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_sequential_starts_keep_one_server() -> Result<()> {
        let stub = StubAdmin::spawn(200).await?;
        let config = config_for(&stub);
        let first_dir = TempDir::new()?;
        let second_dir = TempDir::new()?;

        let first = start_with_config(first_dir.path(), &config).await?;
        first.shutdown().await?;
        let second = start_with_config(second_dir.path(), &config).await?;
        second.shutdown().await?;

        let pushes = stub.pushes();
        assert_eq!(pushes.len(), 4);
        for push in &pushes {
            assert!(servers_in(&push.body).len() <= 1);
        }
        assert!(servers_in(&pushes[1].body).is_empty());
        assert!(servers_in(&pushes[3].body).is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_destroys_from_separate_handles_are_serialized() -> Result<()> {
        let stub = StubAdmin::spawn(200).await?;
        let config = config_for(&stub);
        let first_dir = TempDir::new()?;
        let second_dir = TempDir::new()?;
        let first = start_with_config(first_dir.path(), &config).await?;
        let second = start_with_config(second_dir.path(), &config).await?;

        stub.set_delay(std::time::Duration::from_millis(300));
        let (a, b) = tokio::join!(first.destroy(), second.destroy());
        a?;
        b?;

        assert_eq!(stub.pushes().len(), 4);
        assert_eq!(stub.max_in_flight(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_start_rejects_remote_admin_host() -> Result<()> {
        let dir = TempDir::new()?;
        let config = Config {
            admin: AdminConfig {
                host: "192.0.2.10".to_string(),
                port: 2019,
            },
            ..Default::default()
        };

        let err = start_with_config(dir.path(), &config).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<WebdavError>(),
            Some(WebdavError::Config(_))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_start_rejected_push_propagates() -> Result<()> {
        let stub = StubAdmin::spawn(400).await?;
        let dir = TempDir::new()?;

        let err = start_with_config(dir.path(), &config_for(&stub))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<WebdavError>(),
            Some(WebdavError::AdminPush { status: 400, .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_start_missing_root() -> Result<()> {
        let stub = StubAdmin::spawn(200).await?;
        let dir = TempDir::new()?;

        let err = start_with_config(dir.path().join("missing"), &config_for(&stub))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<WebdavError>(),
            Some(WebdavError::Directory(_))
        ));
        assert!(stub.pushes().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_start_root_is_file() -> Result<()> {
        let stub = StubAdmin::spawn(200).await?;
        let dir = TempDir::new()?;
        let file = dir.path().join("file.txt");
        std::fs::write(&file, "hello")?;

        let err = start_with_config(&file, &config_for(&stub)).await.unwrap_err();
        assert!(err.to_string().contains("is not a directory"));
        Ok(())
    }

    #[cfg(unix)]
    mod launch {
        use super::*;
        use std::os::unix::fs::PermissionsExt;

        fn fake_proxy_dir(script: &str) -> TempDir {
            let dir = TempDir::new().unwrap();
            let path = dir.path().join("caddy");
            std::fs::write(&path, format!("#!/bin/sh\n{script}\n")).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            dir
        }

        async fn config_with_free_admin_port(bin_dir: &Path, timeout_secs: u64) -> Result<Config> {
            let mut config = Config::default().with_bin_dir(Some(bin_dir.to_path_buf()));
            config.admin.host = "127.0.0.1".to_string();
            config.admin.port = ports::free_port().await?;
            config.proxy.ready_timeout_secs = timeout_secs;
            Ok(config)
        }

        /// The fake proxy reports ready but serves no admin API, so the push fails.
        #[tokio::test]
        async fn test_launched_proxy_without_admin_api_fails_push() -> Result<()> {
            let bin = fake_proxy_dir(
                r#"echo '{"msg":"admin endpoint started"}' >&2
exec sleep 30"#,
            );
            let root = TempDir::new()?;
            let config = config_with_free_admin_port(bin.path(), 5).await?;

            let err = start_with_config(root.path(), &config).await.unwrap_err();
            assert!(matches!(
                err.downcast_ref::<WebdavError>(),
                Some(WebdavError::AdminUnreachable { .. })
            ));
            Ok(())
        }

        #[tokio::test]
        async fn test_launched_proxy_never_ready_times_out() -> Result<()> {
            let bin = fake_proxy_dir("exec sleep 30");
            let root = TempDir::new()?;
            let config = config_with_free_admin_port(bin.path(), 1).await?;

            let err = start_with_config(root.path(), &config).await.unwrap_err();
            assert!(matches!(
                err.downcast_ref::<WebdavError>(),
                Some(WebdavError::ProcessStartTimeout { .. })
            ));
            Ok(())
        }
    }
}
