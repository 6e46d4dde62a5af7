//! # Port Probing (`common::network::ports`)
//!
//! File: cli/src/common/network/ports.rs
//!
//! Answers two questions with a single bind attempt each: "is this port free?"
//! and "give me any free port". The probe binds on the IPv4 loopback address,
//! where the proxy's admin endpoint listens by default, and closes the socket
//! again right away.
//!
use crate::core::error::{Result, WebdavError};
use anyhow::Context;
use std::net::Ipv4Addr;
use tokio::net::TcpListener;
use tracing::debug;

/// # Probe Port (`probe`)
///
/// * `Some(port)`: tries to bind exactly that port. Returns `Ok(None)` if the
///   bind fails (the port is treated as in use), otherwise `Ok(Some(port))`.
/// * `None`: binds port 0 and returns the port the OS assigned.
///
/// The listener is dropped before returning, so the port is free again
/// (and may be taken by someone else before the caller uses it).
///
/// ## Errors
///
/// Only if the bound socket cannot report its local address.
pub async fn probe(port: Option<u16>) -> Result<Option<u16>> {
    let requested = port.unwrap_or(0);
    let listener = match TcpListener::bind((Ipv4Addr::LOCALHOST, requested)).await {
        Ok(listener) => listener,
        Err(e) => {
            debug!(port = requested, error = %e, "Port probe bind failed");
            return Ok(None);
        }
    };
    let bound = listener
        .local_addr()
        .context("Failed to read address of probe listener")?
        .port();
    drop(listener);
    debug!(port = bound, "Port probe succeeded");
    Ok(Some(bound))
}

/// Returns `true` if `port` could be bound on loopback just now.
pub async fn is_port_available(port: u16) -> Result<bool> {
    Ok(probe(Some(port)).await?.is_some())
}

/// Asks the OS for an arbitrary free port.
pub async fn free_port() -> Result<u16> {
    probe(None)
        .await?
        .ok_or_else(|| WebdavError::PortUnavailable { port: 0 }.into())
}
