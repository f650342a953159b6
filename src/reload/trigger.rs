//! Reload triggers with burst coalescing.

use std::sync::Arc;

use tokio::sync::{broadcast, Notify};
use tokio::task::JoinHandle;

use crate::reload::reloader::Reloader;

/// Cloneable handle used by signal handlers, watchers and the admin API.
#[derive(Debug, Clone)]
pub struct ReloadHandle {
    notify: Arc<Notify>,
}

impl ReloadHandle {
    /// Ask for a reload. Returns immediately.
    ///
    /// If a reload is already running, any number of triggers made meanwhile
    /// result in exactly one more reload after it finishes.
    pub fn trigger(&self, reason: &'static str) {
        tracing::debug!(reason, "Reload requested");
        self.notify.notify_one();
    }
}

/// Start the background task that performs triggered reloads one at a time.
///
/// The task exits when `shutdown` fires or its sender is dropped.
pub fn spawn_reload_worker(
    reloader: Arc<Reloader>,
    mut shutdown: broadcast::Receiver<()>,
) -> (ReloadHandle, JoinHandle<()>) {
    let notify = Arc::new(Notify::new());
    let handle = ReloadHandle {
        notify: notify.clone(),
    };

    let task = tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = notify.notified() => {
                    let reloader = reloader.clone();
                    // Outcome is logged and recorded by the reloader itself.
                    if let Err(e) = tokio::task::spawn_blocking(move || reloader.reload()).await {
                        tracing::error!(error = %e, "Reload task failed");
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Reload worker received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    });

    (handle, task)
}
