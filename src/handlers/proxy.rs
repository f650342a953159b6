//! Reverse proxying to a single upstream.
//!
//! # Responsibilities
//! - Rewrite the request target's scheme and authority to the upstream's
//! - Forward the request and stream the upstream response back
//! - Map upstream failures to 502 / 504 responses
//!
//! # Design Decisions
//! - Only scheme and authority are rewritten; path, query and Host are kept
//! - Hop-by-hop headers are stripped in both directions
//! - One shared HTTP client (connection pool) for every proxy route
//! - The upstream call is bounded by a per-handler timeout
//! - Upstreams are plain HTTP; `https` targets are rejected at construction

use std::time::Duration;

use axum::body::Body;
use axum::http::uri::{Authority, PathAndQuery, Scheme};
use axum::http::{header, HeaderMap, HeaderName, Request, StatusCode, Uri, Version};
use axum::response::{IntoResponse, Response};
use futures_util::future::BoxFuture;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use url::Url;

use super::Handler;

/// Error returned when a proxy target cannot be used as an upstream.
#[derive(Debug, thiserror::Error)]
pub enum ProxyTargetError {
    #[error("invalid upstream URL: {0}")]
    Parse(#[from] url::ParseError),
    #[error("unsupported upstream scheme `{0}`")]
    UnsupportedScheme(String),
    #[error("upstream URL has no host")]
    MissingHost,
    #[error("invalid upstream authority: {0}")]
    Authority(#[from] axum::http::uri::InvalidUri),
}

/// Pooled HTTP client shared by every proxy handler.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    inner: Client<HttpConnector, Body>,
}

impl UpstreamClient {
    pub fn new(connect_timeout: Duration) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(connect_timeout));
        Self {
            inner: Client::builder(TokioExecutor::new()).build(connector),
        }
    }
}

impl Default for UpstreamClient {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

/// Forwards requests to one upstream and streams the response back.
#[derive(Debug, Clone)]
pub struct ReverseProxyHandler {
    scheme: Scheme,
    authority: Authority,
    client: UpstreamClient,
    timeout: Duration,
}

impl ReverseProxyHandler {
    /// Build a handler for `target`, e.g. `http://upstream:9000`.
    ///
    /// The connector speaks plain HTTP only, so any other scheme is refused.
    pub fn new(
        target: &str,
        client: UpstreamClient,
        timeout: Duration,
    ) -> Result<Self, ProxyTargetError> {
        let url = Url::parse(target)?;
        let scheme = match url.scheme() {
            "http" => Scheme::HTTP,
            other => return Err(ProxyTargetError::UnsupportedScheme(other.to_string())),
        };
        let host = url.host_str().ok_or(ProxyTargetError::MissingHost)?;
        let authority = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };

        Ok(Self {
            scheme,
            authority: authority.parse()?,
            client,
            timeout,
        })
    }

    /// The upstream this handler forwards to, as `scheme://authority`.
    pub fn upstream(&self) -> String {
        format!("{}://{}", self.scheme, self.authority)
    }

    fn rewrite(&self, req: Request<Body>) -> Result<Request<Body>, axum::http::Error> {
        let (mut parts, body) = req.into_parts();
        let original = parts.uri.authority().cloned();

        let mut uri_parts = parts.uri.clone().into_parts();
        uri_parts.scheme = Some(self.scheme.clone());
        uri_parts.authority = Some(self.authority.clone());
        if uri_parts.path_and_query.is_none() {
            uri_parts.path_and_query = Some(PathAndQuery::from_static("/"));
        }
        parts.uri = Uri::from_parts(uri_parts)?;

        // HTTP/2 clients address the site through the URI authority only.
        if !parts.headers.contains_key(header::HOST) {
            if let Some(value) = original
                .as_ref()
                .and_then(|a| header::HeaderValue::from_str(a.as_str()).ok())
            {
                parts.headers.insert(header::HOST, value);
            }
        }
        strip_hop_by_hop(&mut parts.headers);
        parts.version = Version::HTTP_11;

        Ok(Request::from_parts(parts, body))
    }
}

impl Handler for ReverseProxyHandler {
    fn serve(&self, req: Request<Body>) -> BoxFuture<'_, Response> {
        Box::pin(async move {
            let method = req.method().clone();
            let path = req.uri().path().to_string();

            let req = match self.rewrite(req) {
                Ok(req) => req,
                Err(e) => {
                    tracing::warn!(upstream = %self.authority, error = %e, "Failed to rewrite request");
                    return (StatusCode::BAD_GATEWAY, "Bad Gateway").into_response();
                }
            };

            tracing::debug!(
                upstream = %self.authority,
                method = %method,
                path = %path,
                "Forwarding request"
            );

            match tokio::time::timeout(self.timeout, self.client.inner.request(req)).await {
                Ok(Ok(response)) => {
                    let (mut parts, body) = response.into_parts();
                    strip_hop_by_hop(&mut parts.headers);
                    Response::from_parts(parts, Body::new(body))
                }
                Ok(Err(e)) => {
                    tracing::error!(upstream = %self.authority, error = %e, "Upstream error");
                    (StatusCode::BAD_GATEWAY, "Bad Gateway").into_response()
                }
                Err(_) => {
                    tracing::error!(
                        upstream = %self.authority,
                        timeout = ?self.timeout,
                        "Upstream timed out"
                    );
                    (StatusCode::GATEWAY_TIMEOUT, "Gateway Timeout").into_response()
                }
            }
        })
    }
}

const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Remove connection-scoped headers, including any listed in `Connection`.
fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Upstream that answers with its request line and Host header, after `delay`.
    async fn echo_upstream(delay: Duration) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = Vec::new();
                    let mut chunk = [0u8; 1024];
                    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                        match socket.read(&mut chunk).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => buf.extend_from_slice(&chunk[..n]),
                        }
                    }
                    tokio::time::sleep(delay).await;
                    let text = String::from_utf8_lossy(&buf).to_string();
                    let request_line = text.lines().next().unwrap_or_default().to_string();
                    let host = text
                        .lines()
                        .find_map(|l| l.strip_prefix("host: ").or_else(|| l.strip_prefix("Host: ")))
                        .unwrap_or_default()
                        .to_string();
                    let body = format!("{}|{}", request_line, host);
                    let response = format!(
                        "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\nX-Upstream: yes\r\n\r\n{}",
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });
        addr
    }

    fn handler_for(target: &str, timeout: Duration) -> ReverseProxyHandler {
        ReverseProxyHandler::new(target, UpstreamClient::default(), timeout).unwrap()
    }

    #[test]
    fn test_target_parsing() {
        let h = handler_for("http://upstream:9000", Duration::from_secs(1));
        assert_eq!(h.upstream(), "http://upstream:9000");

        let h = handler_for("http://example.com/ignored/path", Duration::from_secs(1));
        assert_eq!(h.upstream(), "http://example.com");

        for bad in ["::not a url::", "upstream:9000", "ftp://files.example"] {
            let res = ReverseProxyHandler::new(bad, UpstreamClient::default(), Duration::from_secs(1));
            assert!(res.is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_https_target_is_unsupported() {
        let err = ReverseProxyHandler::new(
            "https://127.0.0.1:8443",
            UpstreamClient::default(),
            Duration::from_secs(1),
        )
        .unwrap_err();
        assert!(matches!(err, ProxyTargetError::UnsupportedScheme(ref s) if s == "https"));
        assert_eq!(err.to_string(), "unsupported upstream scheme `https`");
    }

    #[test]
    fn test_strip_hop_by_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, "close, x-private".parse().unwrap());
        headers.insert("x-private", "1".parse().unwrap());
        headers.insert(header::TRANSFER_ENCODING, "chunked".parse().unwrap());
        headers.insert(header::ACCEPT, "*/*".parse().unwrap());

        strip_hop_by_hop(&mut headers);
        assert_eq!(headers.len(), 1);
        assert!(headers.contains_key(header::ACCEPT));
    }

    #[tokio::test]
    async fn test_forwards_path_query_and_host() {
        let addr = echo_upstream(Duration::ZERO).await;
        let handler = handler_for(&format!("http://{}", addr), Duration::from_secs(5));

        let req = Request::builder()
            .uri("/api/items?page=2")
            .header("Host", "bar.com")
            .body(Body::empty())
            .unwrap();
        let res = handler.serve(req).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()["x-upstream"], "yes");

        let body = axum::body::to_bytes(res.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"GET /api/items?page=2 HTTP/1.1|bar.com");
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_bad_gateway() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let handler = handler_for(&format!("http://{}", addr), Duration::from_secs(5));
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        let res = handler.serve(req).await;
        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_slow_upstream_times_out() {
        let addr = echo_upstream(Duration::from_secs(2)).await;
        let handler = handler_for(&format!("http://{}", addr), Duration::from_millis(100));

        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        let res = handler.serve(req).await;
        assert_eq!(res.status(), StatusCode::GATEWAY_TIMEOUT);
    }
}
