//! Host-based HTTP edge router.
//!
//! Requests are matched against an ordered, hot-swappable route table; the
//! first matching route's handler produces the response.

pub mod admin;
pub mod config;
pub mod handlers;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod reload;
pub mod routing;
pub mod rules;

pub use config::schema::EdgeConfig;
pub use handlers::Handler;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use reload::Reloader;
pub use routing::{Matcher, Route, Router};
