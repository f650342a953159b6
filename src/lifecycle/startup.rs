//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the route table and perform the initial reload
//! - Start background tasks (reload worker, signal and file triggers, metrics)
//! - Bind listeners and begin accepting traffic
//!
//! # Design Decisions
//! - Subsystems initialize in order, not concurrently
//! - Listeners start last (traffic only when the first table is installed)

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use notify::RecommendedWatcher;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::admin::{serve_admin, AdminState};
use crate::config::watcher::RulesWatcher;
use crate::config::EdgeConfig;
use crate::http::HttpServer;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::spawn_reload_signals;
use crate::net::load_tls_config;
use crate::observability::metrics;
use crate::reload::{spawn_reload_worker, FileSource, ReloadHandle, Reloader};
use crate::routing::Router;
use crate::handlers::UpstreamClient;
use crate::rules::Translator;

/// Error that prevents the edge router from starting.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to load TLS configuration: {0}")]
    Tls(#[source] std::io::Error),
    #[error("failed to install reload signal handlers: {0}")]
    Signals(#[source] std::io::Error),
    #[error("failed to watch rules file: {0}")]
    Watch(#[from] notify::Error),
    #[error("failed to start metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),
}

/// A running edge router.
pub struct EdgeRouter {
    pub router: Arc<Router>,
    pub reloader: Arc<Reloader>,
    pub reload: ReloadHandle,
    /// Address the main listener is bound to.
    pub local_addr: SocketAddr,
    /// Address the admin API is bound to, when enabled.
    pub admin_addr: Option<SocketAddr>,
    tasks: Vec<JoinHandle<()>>,
    _watcher: Option<RecommendedWatcher>,
}

impl EdgeRouter {
    /// Wait for every listener and worker to finish (after shutdown).
    pub async fn wait(self) {
        for task in self.tasks {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Task ended abnormally");
            }
        }
    }
}

async fn bind(address: &str) -> Result<TcpListener, StartupError> {
    TcpListener::bind(address)
        .await
        .map_err(|source| StartupError::Bind {
            address: address.to_string(),
            source,
        })
}

/// Start every subsystem described by `config`. Listeners stop when `shutdown` triggers.
pub async fn start(config: EdgeConfig, shutdown: &Shutdown) -> Result<EdgeRouter, StartupError> {
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // Route table and initial load.
    let router = Arc::new(Router::new());
    let translator = Translator::new(
        UpstreamClient::new(Duration::from_secs(config.upstream.connect_timeout_secs)),
        Duration::from_secs(config.upstream.request_timeout_secs),
    );
    let reloader = Arc::new(Reloader::new(
        router.clone(),
        Arc::new(FileSource::new(&config.rules.path)),
        translator,
    ));
    let initial = {
        let reloader = reloader.clone();
        tokio::task::spawn_blocking(move || reloader.reload()).await
    };
    match initial {
        Ok(Ok(_)) => {}
        Ok(Err(_)) => tracing::warn!(
            "Starting with an empty route table; every request will get 404 until a reload succeeds"
        ),
        Err(e) => tracing::error!(error = %e, "Initial reload task failed"),
    }

    // Reload triggers.
    let mut tasks = Vec::new();
    let (reload, worker) = spawn_reload_worker(reloader.clone(), shutdown.subscribe());
    tasks.push(worker);
    tasks.push(spawn_reload_signals(reload.clone(), shutdown.subscribe()).map_err(StartupError::Signals)?);

    let watcher = if config.rules.watch {
        Some(RulesWatcher::new(&config.rules.path, reload.clone()).run()?)
    } else {
        None
    };

    // Admin API.
    let admin_addr = if config.admin.enabled {
        let listener = bind(&config.admin.bind_address).await?;
        let addr = listener.local_addr().map_err(|source| StartupError::Bind {
            address: config.admin.bind_address.clone(),
            source,
        })?;
        let state = AdminState {
            router: router.clone(),
            reloader: reloader.clone(),
            reload: reload.clone(),
            api_key: Arc::from(config.admin.api_key.as_str()),
        };
        let admin_shutdown = shutdown.subscribe();
        tasks.push(tokio::spawn(async move {
            if let Err(e) = serve_admin(listener, state, admin_shutdown).await {
                tracing::error!(error = %e, "Admin API failed");
            }
        }));
        Some(addr)
    } else {
        None
    };

    // Main listener last.
    let listener = bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr().map_err(|source| StartupError::Bind {
        address: config.listener.bind_address.clone(),
        source,
    })?;
    let server = HttpServer::new(router.clone());
    let server_shutdown = shutdown.subscribe();

    match &config.listener.tls {
        Some(tls) => {
            let tls = load_tls_config(tls).await.map_err(StartupError::Tls)?;
            let std_listener = listener.into_std().map_err(|source| StartupError::Bind {
                address: config.listener.bind_address.clone(),
                source,
            })?;
            tasks.push(tokio::spawn(async move {
                if let Err(e) = server.run_tls(std_listener, tls, server_shutdown).await {
                    tracing::error!(error = %e, "HTTPS server failed");
                }
            }));
        }
        None => {
            tasks.push(tokio::spawn(async move {
                if let Err(e) = server.run(listener, server_shutdown).await {
                    tracing::error!(error = %e, "HTTP server failed");
                }
            }));
        }
    }

    tracing::info!(
        address = %local_addr,
        rules = %config.rules.path.display(),
        routes = router.len(),
        "Edge router started"
    );

    Ok(EdgeRouter {
        router,
        reloader,
        reload,
        local_addr,
        admin_addr,
        tasks,
        _watcher: watcher,
    })
}
