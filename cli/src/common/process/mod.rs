//! # Webdav Proxy Process Supervision (`common::process`)
//!
//! File: cli/src/common/process/mod.rs
//!
//! ## Overview
//!
//! Starts the external proxy binary (`<bin_dir>/caddy run`) and owns the child
//! process for its whole lifetime through `ProxyProcess`.
//!
//! ## Architecture
//!
//! - `ProxyProcess::launch` spawns the binary with stderr piped and waits for the
//!   readiness marker (see `readiness`). On timeout or early exit the child is
//!   killed before the error is returned.
//! - After readiness, a background task keeps draining stderr into `tracing`
//!   at debug level so the child never blocks on a full pipe.
//! - The child is spawned with kill-on-drop, so dropping a `ProxyProcess` on any
//!   exit path (including panics and `?`) terminates it. `stop()` kills and reaps
//!   it explicitly.
//! - No process-wide signal handlers are installed here. The embedding
//!   application decides how termination signals map to `stop()` (the CLI
//!   does this in `commands::create`).
//!
//! ## Usage
//!
//! ```rust,ignore
//! let proxy = ProxyProcess::launch(&bin_dir, &cfg.proxy).await?;
//! // ... push configuration to the admin API ...
//! proxy.stop().await?;
//! ```
//!
pub mod readiness;

use crate::common::system;
use crate::core::config::ProxyConfig;
use crate::core::error::{Result, WebdavError};
use anyhow::{anyhow, Context};
use readiness::{wait_for_ready, Readiness, ReadinessDetector};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, ChildStderr, Command};
use tracing::{debug, info, warn};

/// A running proxy process whose admin endpoint reported ready.
#[derive(Debug)]
pub struct ProxyProcess {
    child: Child,
    path: PathBuf,
}

impl ProxyProcess {
    /// # Launch Proxy (`launch`)
    ///
    /// Spawns `<executable_dir>/<binary_name> run` and waits until the readiness
    /// marker appears on stderr.
    ///
    /// ## Errors
    ///
    /// * `WebdavError::ProcessSpawn` if the binary cannot be started.
    /// * `WebdavError::ProcessStartTimeout` if the marker is not seen within
    ///   `config.ready_timeout()`.
    /// * `WebdavError::ProcessExited` if stderr closes before the marker.
    pub async fn launch(executable_dir: &Path, config: &ProxyConfig) -> Result<Self> {
        let path = system::executable_path(executable_dir, &config.binary_name);
        info!("Launching proxy: {} run", path.display());

        let mut child = Command::new(&path)
            .arg("run")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| WebdavError::ProcessSpawn {
                path: path.clone(),
                source,
            })?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| anyhow!("Proxy stderr was not captured"))?;
        let mut reader = BufReader::new(stderr);
        let mut detector = ReadinessDetector::new(config.ready_marker.as_str());
        let timeout = config.ready_timeout();

        let state = wait_for_ready(&mut reader, &mut detector, timeout).await;
        let process = Self { child, path };

        match state {
            Readiness::Ready => {
                let pid = process.id().unwrap_or_default();
                info!(pid, "Proxy admin endpoint is ready");
                spawn_stderr_drain(reader, pid);
                Ok(process)
            }
            Readiness::TimedOut => {
                warn!(
                    "Proxy did not report ready within {}s, terminating it",
                    timeout.as_secs()
                );
                process.terminate_quietly().await;
                Err(WebdavError::ProcessStartTimeout { timeout }.into())
            }
            Readiness::Exited | Readiness::Waiting => {
                process.terminate_quietly().await;
                Err(WebdavError::ProcessExited.into())
            }
        }
    }

    /// OS process id, if the child has not been reaped yet.
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// # Stop Proxy (`stop`)
    ///
    /// Kills the child (unless it already exited) and waits for it to be reaped.
    pub async fn stop(mut self) -> Result<()> {
        match self.child.try_wait() {
            Ok(Some(status)) => {
                debug!("Proxy already exited with {}", status);
                return Ok(());
            }
            Ok(None) => {}
            Err(e) => debug!("Could not query proxy status: {}", e),
        }
        info!("Stopping proxy {}", self.path.display());
        self.child
            .kill()
            .await
            .with_context(|| format!("Failed to kill proxy process {}", self.path.display()))
    }

    async fn terminate_quietly(self) {
        if let Err(e) = self.stop().await {
            warn!("{:#}", e);
        }
    }
}

/// Forwards the remaining stderr lines to the log until the stream closes.
fn spawn_stderr_drain(reader: BufReader<ChildStderr>, pid: u32) {
    tokio::spawn(drain_lines(reader, pid));
}

async fn drain_lines<R>(mut reader: BufReader<R>, pid: u32)
where
    R: AsyncRead + Unpin,
{
    let mut buf: Vec<u8> = Vec::with_capacity(1024);
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                debug!(pid, "proxy: {}", line.trim_end());
            }
            Err(e) => {
                debug!(pid, error = %e, "Proxy stderr reader exiting due to read error");
                break;
            }
        }
    }
    debug!(pid, "Proxy stderr reader task exiting");
}
