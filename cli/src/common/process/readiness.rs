//! # Proxy Readiness Detection (`common::process::readiness`)
//!
//! File: cli/src/common/process/readiness.rs
//!
//! ## Overview
//!
//! The proxy writes newline-delimited JSON log records to stderr. Once a record
//! with `"msg": "admin endpoint started"` shows up, the admin API accepts
//! configuration.
//!
//! Detection is a small state machine:
//!
//! ```text
//!            marker line
//! Waiting ─────────────────▶ Ready
//!    │  timer fires
//!    ├──────────────────────▶ TimedOut
//!    │  stream closed
//!    └──────────────────────▶ Exited
//! ```
//!
//! One timer is armed when waiting starts and is dropped on the transition to
//! `Ready`. Lines that are not JSON objects, or that carry another `msg`, keep
//! the detector in `Waiting`. Terminal states never change again.
//!
use serde_json::Value;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::trace;

/// State of readiness detection for one launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Waiting,
    Ready,
    TimedOut,
    Exited,
}

#[derive(Debug, Clone)]
pub struct ReadinessDetector {
    marker: String,
    state: Readiness,
}

impl ReadinessDetector {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            state: Readiness::Waiting,
        }
    }

    pub fn state(&self) -> Readiness {
        self.state
    }

    /// Feeds one stderr line (without its newline).
    pub fn observe_line(&mut self, line: &str) -> Readiness {
        if self.state == Readiness::Waiting && is_marker_record(line, &self.marker) {
            self.state = Readiness::Ready;
        }
        self.state
    }

    pub fn time_out(&mut self) -> Readiness {
        if self.state == Readiness::Waiting {
            self.state = Readiness::TimedOut;
        }
        self.state
    }

    pub fn stream_closed(&mut self) -> Readiness {
        if self.state == Readiness::Waiting {
            self.state = Readiness::Exited;
        }
        self.state
    }
}

fn is_marker_record(line: &str, marker: &str) -> bool {
    let line = line.trim();
    if line.is_empty() {
        return false;
    }
    serde_json::from_str::<Value>(line)
        .map(|record| record.get("msg").and_then(Value::as_str) == Some(marker))
        .unwrap_or(false)
}

/// # Wait For Readiness (`wait_for_ready`)
///
/// Reads `reader` line by line until the detector leaves `Waiting`, or
/// `timeout` elapses. Bytes are decoded lossily so non-UTF-8 output cannot
/// abort detection.
pub async fn wait_for_ready<R>(
    reader: &mut R,
    detector: &mut ReadinessDetector,
    timeout: Duration,
) -> Readiness
where
    R: AsyncBufRead + Unpin,
{
    match tokio::time::timeout(timeout, read_until_settled(reader, detector)).await {
        Ok(state) => state,
        Err(_) => detector.time_out(),
    }
}

async fn read_until_settled<R>(reader: &mut R, detector: &mut ReadinessDetector) -> Readiness
where
    R: AsyncBufRead + Unpin,
{
    let mut buf: Vec<u8> = Vec::with_capacity(1024);
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) | Err(_) => return detector.stream_closed(),
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                trace!("proxy stderr: {}", line.trim_end());
                if detector.observe_line(&line) != Readiness::Waiting {
                    return detector.state();
                }
            }
        }
    }
}
