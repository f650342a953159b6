//! Route matching logic.
//!
//! # Responsibilities
//! - Decide whether a route applies to a request
//! - Provide constant matchers (always / never) and host matching
//! - Allow callers to layer their own predicates (method, path, headers)
//!
//! # Design Decisions
//! - Matching is synchronous and side-effect free (no I/O)
//! - Host matching is case-insensitive and ignores any port suffix
//! - Path matching is case-sensitive
//! - No regex in the hot path

use std::fmt;

use axum::body::Body;
use axum::http::{header, Method, Request};

/// Trait for matching requests against conditions.
pub trait Matcher: Send + Sync + fmt::Debug {
    /// Returns true if the request matches this condition.
    fn matches(&self, req: &Request<Body>) -> bool;
}

/// Matches every request. Used for catch-all routes at the end of a table.
#[derive(Debug, Clone, Copy, Default)]
pub struct Always;

impl Matcher for Always {
    fn matches(&self, _req: &Request<Body>) -> bool {
        true
    }
}

/// Matches no request. Disables a route without removing it from the table.
#[derive(Debug, Clone, Copy, Default)]
pub struct Never;

impl Matcher for Never {
    fn matches(&self, _req: &Request<Body>) -> bool {
        false
    }
}

/// Matches the addressed host, with any port suffix stripped.
#[derive(Debug, Clone)]
pub struct HostMatcher {
    expected_host: String,
}

impl HostMatcher {
    /// Create a new host matcher.
    /// The host is normalized to lowercase for case-insensitive matching.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            expected_host: host.into().to_lowercase(),
        }
    }

    /// The host this matcher accepts.
    pub fn host(&self) -> &str {
        &self.expected_host
    }
}

impl Matcher for HostMatcher {
    fn matches(&self, req: &Request<Body>) -> bool {
        request_host(req)
            .map(|h| h.eq_ignore_ascii_case(&self.expected_host))
            .unwrap_or(false)
    }
}

/// Returns the host a request is addressed to, without its port.
///
/// The `Host` header wins; HTTP/2 requests carry the authority in the URI instead.
pub fn request_host(req: &Request<Body>) -> Option<&str> {
    let raw = req
        .headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .or_else(|| req.uri().authority().map(|a| a.as_str()))?;
    Some(strip_port(raw))
}

fn strip_port(authority: &str) -> &str {
    // Drop userinfo if a client sent a full authority.
    let authority = authority.rsplit_once('@').map_or(authority, |(_, h)| h);

    if authority.starts_with('[') {
        // IPv6 literal: keep the brackets, drop anything after them.
        return match authority.find(']') {
            Some(end) => &authority[..=end],
            None => authority,
        };
    }

    match authority.rsplit_once(':') {
        Some((host, port)) if port.chars().all(|c| c.is_ascii_digit()) => host,
        _ => authority,
    }
}

/// Matches the request path prefix.
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Matcher for PathPrefixMatcher {
    fn matches(&self, req: &Request<Body>) -> bool {
        req.uri().path().starts_with(&self.prefix)
    }
}

/// Matches the request method.
#[derive(Debug, Clone)]
pub struct MethodMatcher {
    method: Method,
}

impl MethodMatcher {
    pub fn new(method: Method) -> Self {
        Self { method }
    }
}

impl Matcher for MethodMatcher {
    fn matches(&self, req: &Request<Body>) -> bool {
        req.method() == self.method
    }
}

/// Combines multiple matchers with AND semantics. Empty = always matches.
#[derive(Debug)]
pub struct AllOf {
    matchers: Vec<Box<dyn Matcher>>,
}

impl AllOf {
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Self {
        Self { matchers }
    }
}

impl Matcher for AllOf {
    fn matches(&self, req: &Request<Body>) -> bool {
        self.matchers.iter().all(|m| m.matches(req))
    }
}

/// Combines multiple matchers with OR semantics. Empty = never matches.
#[derive(Debug)]
pub struct AnyOf {
    matchers: Vec<Box<dyn Matcher>>,
}

impl AnyOf {
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Self {
        Self { matchers }
    }
}

impl Matcher for AnyOf {
    fn matches(&self, req: &Request<Body>) -> bool {
        self.matchers.iter().any(|m| m.matches(req))
    }
}

/// A matcher backed by a plain function or closure.
pub struct FnMatcher<F> {
    name: &'static str,
    f: F,
}

impl<F> fmt::Debug for FnMatcher<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FnMatcher").field(&self.name).finish()
    }
}

impl<F> Matcher for FnMatcher<F>
where
    F: Fn(&Request<Body>) -> bool + Send + Sync,
{
    fn matches(&self, req: &Request<Body>) -> bool {
        (self.f)(req)
    }
}

/// Wrap a predicate as a [`Matcher`]. `name` only shows up in route descriptions.
pub fn matcher_fn<F>(name: &'static str, f: F) -> FnMatcher<F>
where
    F: Fn(&Request<Body>) -> bool + Send + Sync,
{
    FnMatcher { name, f }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_host(host: &str) -> Request<Body> {
        Request::builder()
            .header("Host", host)
            .body(Body::default())
            .unwrap()
    }

    #[test]
    fn test_constant_matchers() {
        let req = with_host("example.com");
        assert!(Always.matches(&req));
        assert!(!Never.matches(&req));
    }

    #[test]
    fn test_host_matcher() {
        let matcher = HostMatcher::new("example.com");

        assert!(matcher.matches(&with_host("example.com")));
        assert!(matcher.matches(&with_host("EXAMPLE.COM"))); // Case insensitive
        assert!(matcher.matches(&with_host("example.com:8080")));
        assert!(!matcher.matches(&with_host("other.com")));
        assert!(!matcher.matches(&with_host("example.com.evil")));
    }

    #[test]
    fn test_host_matcher_without_host_header() {
        let matcher = HostMatcher::new("example.com");

        let req = Request::builder()
            .uri("http://example.com:9000/path")
            .body(Body::default())
            .unwrap();
        assert!(matcher.matches(&req));

        let bare = Request::builder().uri("/path").body(Body::default()).unwrap();
        assert!(!matcher.matches(&bare));
    }

    #[test]
    fn test_strip_port() {
        assert_eq!(strip_port("foo.com"), "foo.com");
        assert_eq!(strip_port("foo.com:80"), "foo.com");
        assert_eq!(strip_port("[::1]:8080"), "[::1]");
        assert_eq!(strip_port("[::1]"), "[::1]");
        assert_eq!(strip_port("user@foo.com:1"), "foo.com");
    }

    #[test]
    fn test_path_matcher() {
        let matcher = PathPrefixMatcher::new("/api");

        let req1 = Request::builder()
            .uri("http://example.com/api/v1")
            .body(Body::default())
            .unwrap();
        assert!(matcher.matches(&req1));

        let req2 = Request::builder()
            .uri("http://example.com/images")
            .body(Body::default())
            .unwrap();
        assert!(!matcher.matches(&req2));
    }

    #[test]
    fn test_composites() {
        let post_api = AllOf::new(vec![
            Box::new(MethodMatcher::new(Method::POST)),
            Box::new(PathPrefixMatcher::new("/api")),
        ]);
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/items")
            .body(Body::default())
            .unwrap();
        assert!(post_api.matches(&req));

        let get = Request::builder().uri("/api/items").body(Body::default()).unwrap();
        assert!(!post_api.matches(&get));

        let either = AnyOf::new(vec![Box::new(Never), Box::new(PathPrefixMatcher::new("/api"))]);
        assert!(either.matches(&get));
        assert!(!AnyOf::new(Vec::new()).matches(&get));
        assert!(AllOf::new(Vec::new()).matches(&get));
    }

    #[test]
    fn test_fn_matcher() {
        let has_token = matcher_fn("has-token", |req| req.headers().contains_key("x-token"));
        let req = Request::builder()
            .header("x-token", "abc")
            .body(Body::default())
            .unwrap();
        assert!(has_token.matches(&req));
        assert!(!has_token.matches(&with_host("a")));
        assert_eq!(format!("{:?}", has_token), "FnMatcher(\"has-token\")");
    }
}
