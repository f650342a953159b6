//! A route: one matcher bound to one handler.

use std::fmt;
use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use futures_util::future::BoxFuture;

use crate::handlers::Handler;
use crate::routing::matcher::Matcher;

/// An immutable (matcher, handler) pair.
///
/// Cloning is cheap and clones share the same matcher and handler, so a route
/// can sit in a router table and in a caller's `Vec` at the same time.
/// Equality is identity: two routes are equal when they share both parts.
#[derive(Clone)]
pub struct Route {
    matcher: Arc<dyn Matcher>,
    handler: Arc<dyn Handler>,
}

impl Route {
    pub fn new<M, H>(matcher: M, handler: H) -> Self
    where
        M: Matcher + 'static,
        H: Handler + 'static,
    {
        Self {
            matcher: Arc::new(matcher),
            handler: Arc::new(handler),
        }
    }

    /// Build a route from already shared parts.
    pub fn from_shared(matcher: Arc<dyn Matcher>, handler: Arc<dyn Handler>) -> Self {
        Self { matcher, handler }
    }

    /// Returns true if this route should serve the request.
    pub fn matches(&self, req: &Request<Body>) -> bool {
        self.matcher.matches(req)
    }

    /// Serve the request with this route's handler.
    pub fn serve(&self, req: Request<Body>) -> BoxFuture<'_, Response> {
        self.handler.serve(req)
    }

    pub fn matcher(&self) -> &dyn Matcher {
        self.matcher.as_ref()
    }

    pub fn handler(&self) -> &dyn Handler {
        self.handler.as_ref()
    }
}

impl PartialEq for Route {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.matcher, &other.matcher) && Arc::ptr_eq(&self.handler, &other.handler)
    }
}

impl Eq for Route {}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("matcher", &self.matcher)
            .field("handler", &self.handler)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::{BadGateway, StatusHandler};
    use crate::routing::matcher::{Always, HostMatcher};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_route_delegates() {
        let route = Route::new(HostMatcher::new("foo.com"), BadGateway);
        let req = Request::builder()
            .header("Host", "foo.com")
            .body(Body::empty())
            .unwrap();
        assert!(route.matches(&req));
        assert_eq!(route.serve(req).await.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_route_identity() {
        let a = Route::new(Always, StatusHandler::from_status(StatusCode::OK));
        let b = Route::new(Always, StatusHandler::from_status(StatusCode::OK));
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }
}
