//! In-process stand-in for the proxy's admin API, used by unit tests.
//!
//! Records every document POSTed to `/load` and answers with a configurable
//! status code after an optional delay. Tracks how many requests were being
//! handled at the same time.

use crate::core::error::Result;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicU16, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

#[derive(Debug, Clone)]
pub struct RecordedPush {
    pub content_type: Option<String>,
    pub content_length: Option<usize>,
    pub body: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct StubAdmin {
    port: u16,
    status: Arc<AtomicU16>,
    delay_ms: Arc<AtomicU64>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    pushes: Arc<Mutex<Vec<RecordedPush>>>,
}

impl StubAdmin {
    /// Binds a loopback port and serves `/load` in a background task.
    pub async fn spawn(status: u16) -> Result<Self> {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await?;
        let stub = Self {
            port: listener.local_addr()?.port(),
            status: Arc::new(AtomicU16::new(status)),
            delay_ms: Arc::new(AtomicU64::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
            pushes: Arc::new(Mutex::new(Vec::new())),
        };

        let app = Router::new()
            .route("/load", post(load))
            .with_state(stub.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Ok(stub)
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn set_status(&self, status: u16) {
        self.status.store(status, Ordering::SeqCst);
    }

    /// Holds every subsequent `/load` request for `delay` before answering.
    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Highest number of `/load` requests handled at once so far.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn pushes(&self) -> Vec<RecordedPush> {
        self.pushes.lock().unwrap().clone()
    }
}

async fn load(State(stub): State<StubAdmin>, headers: HeaderMap, body: Bytes) -> StatusCode {
    let header_str = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let push = RecordedPush {
        content_type: header_str(header::CONTENT_TYPE),
        content_length: header_str(header::CONTENT_LENGTH).and_then(|v| v.parse().ok()),
        body: serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null),
    };
    let current = stub.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    stub.max_in_flight.fetch_max(current, Ordering::SeqCst);
    let delay = stub.delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
    stub.pushes.lock().unwrap().push(push);
    stub.in_flight.fetch_sub(1, Ordering::SeqCst);
    StatusCode::from_u16(stub.status.load(Ordering::SeqCst))
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}
