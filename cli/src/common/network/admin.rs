//! # Proxy Admin API Client (`common::network::admin`)
//!
//! File: cli/src/common/network/admin.rs
//!
//! ## Overview
//!
//! Pushes configuration documents to the proxy's admin endpoint
//! (`POST http://localhost:2019/load` by default). The whole live configuration
//! is replaced by each push, so all pushes to the same load URL within this
//! process are serialized with an async mutex, whichever client sends them.
//!
//! A push succeeds only on HTTP 200. There is no retry; the caller decides
//! what a failure means.
//!
use crate::core::config::AdminConfig;
use crate::core::error::{Result, WebdavError};
use anyhow::Context;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Upper bound for a single admin request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Returns the lock shared by every client pushing to `load_url`.
fn push_lock_for(load_url: &str) -> Arc<Mutex<()>> {
    static LOCKS: OnceLock<std::sync::Mutex<HashMap<String, Arc<Mutex<()>>>>> = OnceLock::new();
    let mut locks = LOCKS
        .get_or_init(Default::default)
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    locks.entry(load_url.to_string()).or_default().clone()
}

/// Client for the proxy's `/load` endpoint.
#[derive(Debug, Clone)]
pub struct AdminClient {
    client: Client,
    load_url: String,
    push_lock: Arc<Mutex<()>>,
}

impl AdminClient {
    pub fn new(config: &AdminConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client for the admin API")?;
        let load_url = config.load_url();
        Ok(Self {
            client,
            push_lock: push_lock_for(&load_url),
            load_url,
        })
    }

    pub fn load_url(&self) -> &str {
        &self.load_url
    }

    /// # Push Configuration (`push`)
    ///
    /// Serializes `document` to JSON and POSTs it to the load endpoint with
    /// `Content-Type: application/json` and an explicit `Content-Length`.
    ///
    /// ## Errors
    ///
    /// * `WebdavError::Serialization` if the document cannot be encoded.
    /// * `WebdavError::AdminUnreachable` on transport failure (refused, timeout, ...).
    /// * `WebdavError::AdminPush` if the endpoint answers with anything but 200.
    pub async fn push<T>(&self, document: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let body = serde_json::to_vec(document).map_err(WebdavError::from)?;
        let body_len = body.len();

        let _guard = self.push_lock.lock().await;
        debug!(url = %self.load_url, bytes = body_len, "Pushing configuration to admin API");

        let response = self
            .client
            .post(&self.load_url)
            .header(CONTENT_TYPE, "application/json")
            .header(CONTENT_LENGTH, body_len)
            .body(body)
            .send()
            .await
            .map_err(|source| WebdavError::AdminUnreachable {
                url: self.load_url.clone(),
                source,
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(WebdavError::AdminPush {
                status: status.as_u16(),
                body: body.trim().to_string(),
            }
            .into());
        }

        info!(url = %self.load_url, "Admin API accepted configuration");
        Ok(())
    }
}
