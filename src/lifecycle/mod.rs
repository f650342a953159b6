//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Settings → Router + Reloader → initial reload → reload worker
//!     → signal/file triggers → admin API → listeners
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain connections → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//!     SIGHUP/SIGUSR1 → Trigger rules reload
//! ```
//!
//! # Design Decisions
//! - Ordered startup: settings first, then the table, then listeners
//! - A failed initial reload is not fatal: the server starts with an empty table
//! - Listener bind failures are fatal

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{start, EdgeRouter, StartupError};
