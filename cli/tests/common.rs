//! # Webdav CLI Integration Test Common Helpers
//!
//! File: cli/tests/common.rs
//!
//! ## Overview
//!
//! Shared helpers for the integration test files in `cli/tests/`. Each `.rs`
//! file there is compiled as a separate test crate; this one is included as a
//! module with `mod common;`.
//!

// Allow unused helpers, as different test files use different ones.
#![allow(dead_code)]

pub use assert_cmd::Command;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// # Get Webdav Command (`webdav_cmd`)
///
/// An `assert_cmd::Command` pointing at the compiled `webdav` binary, with
/// `WEBDAV_BIN_DIR` and `RUST_LOG` cleared so the host environment cannot leak
/// into assertions.
///
/// ## Panics
/// Panics if the `webdav` binary cannot be found via `Command::cargo_bin`.
pub fn webdav_cmd() -> Command {
    let mut cmd = Command::cargo_bin("webdav").expect("Failed to find webdav binary for testing");
    cmd.env_remove("WEBDAV_BIN_DIR").env_remove("RUST_LOG");
    cmd
}

/// Writes an executable `caddy` shell script into `dir` (Unix only).
#[cfg(unix)]
pub fn write_fake_proxy(dir: &Path, script: &str) {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join("caddy");
    std::fs::write(&path, format!("#!/bin/sh\n{script}\n")).expect("Failed to write fake proxy");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("Failed to mark fake proxy executable");
}

/// An admin API listening on loopback that accepts and records every `/load` document.
#[derive(Clone)]
pub struct RecordingAdmin {
    pub port: u16,
    documents: Arc<Mutex<Vec<Value>>>,
}

impl RecordingAdmin {
    /// Serves in a task on the current Tokio runtime.
    pub async fn spawn() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind admin listener");
        let port = listener.local_addr().expect("No local address").port();
        let documents = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new()
            .route("/load", post(record_document))
            .with_state(documents.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Self { port, documents }
    }

    pub fn documents(&self) -> Vec<Value> {
        self.documents.lock().unwrap().clone()
    }
}

async fn record_document(
    State(documents): State<Arc<Mutex<Vec<Value>>>>,
    Json(document): Json<Value>,
) -> StatusCode {
    documents.lock().unwrap().push(document);
    StatusCode::OK
}

/// Writes `.webdav.toml` pointing at `admin_port` into `dir`, plus a `.git`
/// marker so the config search stops there.
pub fn write_project_config(dir: &Path, admin_port: u16) {
    std::fs::create_dir_all(dir.join(".git")).expect("Failed to create .git marker");
    std::fs::write(
        dir.join(".webdav.toml"),
        format!("[admin]\nhost = \"127.0.0.1\"\nport = {admin_port}\n"),
    )
    .expect("Failed to write .webdav.toml");
}
