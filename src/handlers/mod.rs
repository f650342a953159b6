//! Request handlers.
//!
//! # Data Flow
//! ```text
//! Router (first matching route)
//!     → Handler::serve(request)
//!         - static_files.rs (files under a root directory)
//!         - proxy.rs (forward to an upstream, stream the response back)
//!         - status.rs (fixed responses, e.g. 502 for broken rules)
//!     → Response
//! ```
//!
//! # Design Decisions
//! - Handlers never fail: I/O errors become HTTP error responses
//! - Handlers own their timeouts; the router imposes none
//! - Handlers hold no router state and cannot mutate the table

use std::fmt;
use std::future::Future;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use futures_util::future::BoxFuture;

pub mod proxy;
pub mod static_files;
pub mod status;

pub use proxy::{ReverseProxyHandler, UpstreamClient};
pub use static_files::StaticFileHandler;
pub use status::{BadGateway, StatusHandler};

/// Anything that turns a request into a response.
pub trait Handler: Send + Sync + fmt::Debug {
    /// Produce the response for a request routed to this handler.
    fn serve(&self, req: Request<Body>) -> BoxFuture<'_, Response>;
}

/// A handler backed by an async function or closure.
pub struct FnHandler<F> {
    name: &'static str,
    f: F,
}

impl<F> fmt::Debug for FnHandler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FnHandler").field(&self.name).finish()
    }
}

impl<F, Fut> Handler for FnHandler<F>
where
    F: Fn(Request<Body>) -> Fut + Send + Sync,
    Fut: Future<Output = Response> + Send + 'static,
{
    fn serve(&self, req: Request<Body>) -> BoxFuture<'_, Response> {
        Box::pin((self.f)(req))
    }
}

/// Wrap an async function as a [`Handler`]. `name` only shows up in route descriptions.
pub fn handler_fn<F, Fut>(name: &'static str, f: F) -> FnHandler<F>
where
    F: Fn(Request<Body>) -> Fut + Send + Sync,
    Fut: Future<Output = Response> + Send + 'static,
{
    FnHandler { name, f }
}
