//! Termination signals.

use std::fmt;

use anyhow::Context;
use tracing::info;

/// The signal that asked the process to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    /// SIGINT (Ctrl+C)
    Interrupt,
    /// SIGTERM (kill, container runtimes)
    Terminate,
}

impl fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownSignal::Interrupt => f.write_str("SIGINT"),
            ShutdownSignal::Terminate => f.write_str("SIGTERM"),
        }
    }
}

/// Wait for SIGINT or SIGTERM.
#[cfg(unix)]
pub async fn shutdown_signal() -> anyhow::Result<ShutdownSignal> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate()).context("installing SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("installing SIGINT handler")?;

    let received = tokio::select! {
        _ = sigterm.recv() => ShutdownSignal::Terminate,
        _ = sigint.recv() => ShutdownSignal::Interrupt,
    };
    info!(signal = %received, "received shutdown signal");
    Ok(received)
}

/// Wait for Ctrl+C.
#[cfg(not(unix))]
pub async fn shutdown_signal() -> anyhow::Result<ShutdownSignal> {
    tokio::signal::ctrl_c()
        .await
        .context("installing Ctrl+C handler")?;
    info!(signal = %ShutdownSignal::Interrupt, "received shutdown signal");
    Ok(ShutdownSignal::Interrupt)
}
