//! Static file serving from a root directory.
//!
//! # Design Decisions
//! - Request paths are resolved under the root only; `..` components are refused (404)
//! - Missing files and a missing root both answer 404
//! - Directory requests serve `index.html` when present

use std::path::{Path, PathBuf};

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use futures_util::future::BoxFuture;
use tower::ServiceExt;
use tower_http::services::ServeDir;

use super::Handler;

/// Serves files below `root`, mapping the request path onto the filesystem.
#[derive(Debug, Clone)]
pub struct StaticFileHandler {
    root: PathBuf,
    service: ServeDir,
}

impl StaticFileHandler {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            service: ServeDir::new(&root),
            root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Handler for StaticFileHandler {
    fn serve(&self, req: Request<Body>) -> BoxFuture<'_, Response> {
        let service = self.service.clone();
        Box::pin(async move {
            tracing::debug!(
                root = %self.root.display(),
                method = %req.method(),
                uri = %req.uri(),
                "Serving static file"
            );

            match service.oneshot(req).await {
                Ok(res) => res.map(Body::new),
                Err(never) => match never {},
            }
        })
    }
}
