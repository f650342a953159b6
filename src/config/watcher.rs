//! Rules file watcher for hot reload.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::reload::ReloadHandle;

/// Watches the rules file and fires a reload trigger when it changes.
pub struct RulesWatcher {
    path: PathBuf,
    reload: ReloadHandle,
}

impl RulesWatcher {
    pub fn new(path: &Path, reload: ReloadHandle) -> Self {
        Self {
            path: path.to_path_buf(),
            reload,
        }
    }

    /// Start watching in a background thread.
    ///
    /// Watching stops when the returned watcher is dropped. The parent directory
    /// is watched so editors that replace the file by rename are still seen.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let reload = self.reload.clone();
        let target = self.path.file_name().map(|n| n.to_os_string());

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    let relevant = event.kind.is_modify() || event.kind.is_create();
                    let ours = event
                        .paths
                        .iter()
                        .any(|p| p.file_name().map(|n| n.to_os_string()) == target);
                    if relevant && ours {
                        tracing::info!("Rules file change detected, reloading...");
                        reload.trigger("rules file changed");
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Rules watcher started");
        Ok(watcher)
    }
}
