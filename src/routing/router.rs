//! Route table and dispatch.
//!
//! # Responsibilities
//! - Hold the ordered route table (index 0 = highest priority)
//! - Dispatch each request to the first matching route, or answer 404
//! - Mutate the table (append, pop, replace, clear) under live traffic
//!
//! # Design Decisions
//! - The table is an immutable `Vec` behind an `ArcSwap`; dispatch takes a
//!   snapshot and never holds a lock while a handler runs
//! - Mutations are serialized by a writer mutex and publish a whole new table,
//!   so every reader sees either the old or the new table, never a mix
//! - A request that already took its snapshot finishes against that table
//! - Strict first-match-wins: no scoring, no re-ordering

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use arc_swap::ArcSwap;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::handlers::Handler;
use crate::observability::metrics;
use crate::routing::matcher::Matcher;
use crate::routing::route::Route;

/// The ordered, concurrency-safe route table.
pub struct Router {
    routes: ArcSwap<Vec<Route>>,
    write_lock: Mutex<()>,
}

/// Introspection view of one installed route.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RouteInfo {
    pub index: usize,
    pub matcher: String,
    pub handler: String,
}

impl Router {
    /// Create an empty router. Every request gets 404 until routes are added.
    pub fn new() -> Self {
        Self::from_routes(Vec::new())
    }

    pub fn from_routes(routes: Vec<Route>) -> Self {
        Self {
            routes: ArcSwap::from_pointee(routes),
            write_lock: Mutex::new(()),
        }
    }

    fn lock_writes(&self) -> MutexGuard<'_, ()> {
        // The guard protects no data, so a poisoned lock is still usable.
        self.write_lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// The current table as an immutable snapshot.
    pub fn snapshot(&self) -> Arc<Vec<Route>> {
        self.routes.load_full()
    }

    /// An independent copy of the current table.
    pub fn routes(&self) -> Vec<Route> {
        self.routes.load_full().as_ref().clone()
    }

    pub fn len(&self) -> usize {
        self.routes.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.load().is_empty()
    }

    /// Append routes at the lowest-priority end. Appending nothing is a no-op.
    pub fn append(&self, routes: impl IntoIterator<Item = Route>) {
        let mut routes = routes.into_iter().peekable();
        if routes.peek().is_none() {
            return;
        }

        let _guard = self.lock_writes();
        let mut next = self.routes();
        next.extend(routes);
        self.routes.store(Arc::new(next));
    }

    pub fn push(&self, route: Route) {
        self.append([route]);
    }

    /// Build a route from `matcher` and `handler`, push it, and return it.
    pub fn add<M, H>(&self, matcher: M, handler: H) -> Route
    where
        M: Matcher + 'static,
        H: Handler + 'static,
    {
        let route = Route::new(matcher, handler);
        self.push(route.clone());
        route
    }

    /// Remove and return the last `n` routes.
    ///
    /// If the table holds fewer than `n` routes nothing is removed and the
    /// result is empty.
    pub fn pop_n(&self, n: usize) -> Vec<Route> {
        let _guard = self.lock_writes();
        let current = self.routes.load_full();
        if n == 0 || n > current.len() {
            return Vec::new();
        }

        let split = current.len() - n;
        let remaining = current[..split].to_vec();
        let popped = current[split..].to_vec();
        self.routes.store(Arc::new(remaining));
        popped
    }

    /// Remove and return the last route, if any.
    pub fn pop(&self) -> Option<Route> {
        self.pop_n(1).pop()
    }

    /// Install `routes` as the whole table and return the previous table.
    pub fn replace(&self, routes: Vec<Route>) -> Vec<Route> {
        let _guard = self.lock_writes();
        let old = self.routes.swap(Arc::new(routes));
        Arc::try_unwrap(old).unwrap_or_else(|shared| shared.as_ref().clone())
    }

    pub fn clear(&self) {
        self.replace(Vec::new());
    }

    /// Describe the installed routes, in priority order.
    pub fn describe(&self) -> Vec<RouteInfo> {
        self.routes
            .load()
            .iter()
            .enumerate()
            .map(|(index, route)| RouteInfo {
                index,
                matcher: format!("{:?}", route.matcher()),
                handler: format!("{:?}", route.handler()),
            })
            .collect()
    }

    /// Find the first route accepting `req` in the current table.
    pub fn lookup(&self, req: &Request<Body>) -> Option<(usize, Route)> {
        let snapshot = self.routes.load();
        snapshot
            .iter()
            .position(|route| route.matches(req))
            .map(|index| (index, snapshot[index].clone()))
    }

    /// Serve `req` with the first matching route, or answer 404.
    ///
    /// Never fails: handlers turn their own errors into responses.
    pub async fn dispatch(&self, req: Request<Body>) -> Response {
        let start = Instant::now();

        let Some((index, route)) = self.lookup(&req) else {
            tracing::debug!(method = %req.method(), uri = %req.uri(), "No route matched");
            metrics::record_dispatch(None, StatusCode::NOT_FOUND, start);
            return (StatusCode::NOT_FOUND, "Not Found").into_response();
        };

        tracing::debug!(route = index, method = %req.method(), uri = %req.uri(), "Route matched");
        let response = route.serve(req).await;
        metrics::record_dispatch(Some(index), response.status(), start);
        response
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.snapshot())
            .finish()
    }
}
