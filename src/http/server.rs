//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum app whose only handler is the route table
//! - Wire up middleware (tracing, request ID)
//! - Serve plain HTTP or HTTPS until shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
};
use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::http::request::{request_id, MakeRequestUuid};
use crate::routing::Router;

/// How long in-flight requests get to finish once shutdown starts (TLS listener).
const TLS_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<Router>,
}

/// HTTP server for the edge router.
pub struct HttpServer {
    app: axum::Router,
}

impl HttpServer {
    /// Create a server dispatching every request through `router`.
    pub fn new(router: Arc<Router>) -> Self {
        let app = Self::build_app(AppState { router });
        Self { app }
    }

    /// Build the Axum app with all middleware layers.
    fn build_app(state: AppState) -> axum::Router {
        axum::Router::new()
            .fallback(dispatch_handler)
            .with_state(state)
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The configured app, for serving it some other way (or in tests).
    pub fn app(&self) -> axum::Router {
        self.app.clone()
    }

    /// Serve plain HTTP until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.app.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server received shutdown signal");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Serve HTTPS on an already bound listener until `shutdown` fires.
    pub async fn run_tls(
        self,
        listener: std::net::TcpListener,
        tls: RustlsConfig,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTPS server starting");

        let handle = axum_server::Handle::new();
        let drain = handle.clone();
        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            tracing::info!("HTTPS server received shutdown signal");
            drain.graceful_shutdown(Some(TLS_DRAIN_TIMEOUT));
        });

        axum_server::from_tcp_rustls(listener, tls)
            .handle(handle)
            .serve(self.app.into_make_service())
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }
}

/// Every request lands here and is handed to the route table.
async fn dispatch_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let request_id = request_id(&request).to_string();
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = state.router.dispatch(request).await;

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        status = %response.status(),
        "Request dispatched"
    );
    response
}
