//! OS signal handling.
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - SIGHUP and SIGUSR1 trigger a rules reload, not shutdown
//! - Ctrl-C and SIGTERM trigger graceful shutdown

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::reload::ReloadHandle;

/// Resolves on Ctrl-C, or SIGTERM on unix.
pub async fn wait_for_termination() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("Termination signal received");
}

/// Forward SIGHUP and SIGUSR1 to the reload worker until shutdown.
#[cfg(unix)]
pub fn spawn_reload_signals(
    reload: ReloadHandle,
    mut shutdown: broadcast::Receiver<()>,
) -> std::io::Result<JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = signal(SignalKind::hangup())?;
    let mut user1 = signal(SignalKind::user_defined1())?;

    Ok(tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = hangup.recv() => reload.trigger("SIGHUP"),
                _ = user1.recv() => reload.trigger("SIGUSR1"),
                _ = shutdown.recv() => break,
            }
        }
    }))
}

/// Reload signals are unix-only; elsewhere use the admin API or file watching.
#[cfg(not(unix))]
pub fn spawn_reload_signals(
    _reload: ReloadHandle,
    mut shutdown: broadcast::Receiver<()>,
) -> std::io::Result<JoinHandle<()>> {
    Ok(tokio::spawn(async move {
        let _ = shutdown.recv().await;
    }))
}
