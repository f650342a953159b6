//! Fixed-status handlers.

use std::borrow::Cow;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use futures_util::future::{self, BoxFuture};

use super::Handler;

/// Always answers with the same status and body.
#[derive(Debug, Clone)]
pub struct StatusHandler {
    status: StatusCode,
    body: Cow<'static, str>,
}

impl StatusHandler {
    pub fn new(status: StatusCode, body: impl Into<Cow<'static, str>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Uses the canonical reason phrase as the body.
    pub fn from_status(status: StatusCode) -> Self {
        Self::new(status, status.canonical_reason().unwrap_or(""))
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl Handler for StatusHandler {
    fn serve(&self, _req: Request<Body>) -> BoxFuture<'_, Response> {
        let res = (self.status, self.body.to_string()).into_response();
        Box::pin(future::ready(res))
    }
}

/// Answers 502 for every request. Installed for rules whose target cannot be used.
#[derive(Debug, Clone, Copy, Default)]
pub struct BadGateway;

impl Handler for BadGateway {
    fn serve(&self, _req: Request<Body>) -> BoxFuture<'_, Response> {
        Box::pin(future::ready(
            (StatusCode::BAD_GATEWAY, "Bad Gateway").into_response(),
        ))
    }
}
