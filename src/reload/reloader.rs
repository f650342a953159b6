//! The reload operation: read, parse, translate, swap.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::observability::metrics;
use crate::reload::source::RuleSource;
use crate::routing::{Route, Router};
use crate::rules::{parse_rules, RuleError, Translator};

/// Why a reload was rejected. The previous table stays installed.
#[derive(Debug, thiserror::Error)]
pub enum ReloadError {
    #[error("failed to read rules from {location}: {source}")]
    Source {
        location: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid rules: {0}")]
    Parse(#[from] RuleError),
}

/// Result of a successful reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReloadOutcome {
    /// Number of successful reloads so far, this one included.
    pub generation: u64,
    /// Routes in the newly installed table.
    pub routes: usize,
}

/// Reload bookkeeping reported by the admin API.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReloadStatus {
    pub source: String,
    pub generation: u64,
    pub routes: usize,
    pub attempts: u64,
    pub last_success_unix: Option<u64>,
    pub last_failure_unix: Option<u64>,
    pub last_error: Option<String>,
}

/// Rebuilds the router's table from a rule source.
pub struct Reloader {
    router: Arc<Router>,
    source: Arc<dyn RuleSource>,
    translator: Translator,
    /// Held for the whole reload so concurrent callers run one after another.
    reload_lock: Mutex<()>,
    /// Only locked briefly, never across I/O.
    status: Mutex<ReloadStatus>,
}

impl Reloader {
    pub fn new(router: Arc<Router>, source: Arc<dyn RuleSource>, translator: Translator) -> Self {
        let status = ReloadStatus {
            source: source.location(),
            ..ReloadStatus::default()
        };
        Self {
            router,
            source,
            translator,
            reload_lock: Mutex::new(()),
            status: Mutex::new(status),
        }
    }

    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    fn lock_status(&self) -> MutexGuard<'_, ReloadStatus> {
        self.status.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Snapshot of the reload bookkeeping.
    pub fn status(&self) -> ReloadStatus {
        self.lock_status().clone()
    }

    /// Read and parse the source and, if every rule is valid, swap the table.
    ///
    /// On error nothing is installed and the current table keeps serving.
    /// Blocks on I/O; async callers should use `spawn_blocking`.
    pub fn reload(&self) -> Result<ReloadOutcome, ReloadError> {
        let _serial = self.reload_lock.lock().unwrap_or_else(|e| e.into_inner());
        self.lock_status().attempts += 1;

        match self.load() {
            Ok(routes) => {
                let count = routes.len();
                let previous = self.router.replace(routes);

                let (source, generation) = {
                    let mut status = self.lock_status();
                    status.generation += 1;
                    status.routes = count;
                    status.last_success_unix = Some(unix_now());
                    status.last_error = None;
                    (status.source.clone(), status.generation)
                };

                tracing::info!(
                    source = %source,
                    generation,
                    routes = count,
                    previous_routes = previous.len(),
                    "Routes reloaded"
                );
                metrics::record_reload(true, count);

                Ok(ReloadOutcome {
                    generation,
                    routes: count,
                })
            }
            Err(e) => {
                {
                    let mut status = self.lock_status();
                    status.last_failure_unix = Some(unix_now());
                    status.last_error = Some(e.to_string());
                }

                tracing::error!(
                    source = %self.source.location(),
                    error = %e,
                    "Failed to reload rules. Keeping current routes."
                );
                metrics::record_reload(false, self.router.len());

                Err(e)
            }
        }
    }

    fn load(&self) -> Result<Vec<Route>, ReloadError> {
        let text = self.source.read().map_err(|source| ReloadError::Source {
            location: self.source.location(),
            source,
        })?;
        let rules = parse_rules(&text)?;
        Ok(self.translator.translate_all(&rules))
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
