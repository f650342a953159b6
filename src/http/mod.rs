//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, HTTP/1.1 and HTTP/2)
//!     → request.rs (assign x-request-id)
//!     → routing::Router::dispatch (first matching route)
//!     → Send response to client (request ID echoed back)
//! ```

pub mod request;
pub mod server;

pub use request::{request_id, MakeRequestUuid, X_REQUEST_ID};
pub use server::HttpServer;
