//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (host, path, headers)
//!     → router.rs (snapshot the table, scan in order)
//!     → matcher.rs (evaluate each route's condition)
//!     → route.rs (first match serves the request)
//!     → Response, or 404 when nothing matched
//!
//! Table updates (reload, admin, embedding code):
//!     Vec<Route>
//!     → Router::replace / append / pop_n / clear
//!     → published atomically for the next snapshot
//! ```
//!
//! # Design Decisions
//! - Priority is table order; callers control it by insertion order
//! - First match wins
//! - Dispatch is lock-free; writers serialize among themselves only

pub mod matcher;
pub mod route;
pub mod router;

pub use matcher::{matcher_fn, Always, HostMatcher, Matcher, Never};
pub use route::Route;
pub use router::{RouteInfo, Router};
