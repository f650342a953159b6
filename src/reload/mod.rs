//! Hot reload of the route table.
//!
//! # Data Flow
//! ```text
//! Trigger (SIGHUP/SIGUSR1, rules file change, POST /admin/reload)
//!     → trigger.rs (ReloadHandle::trigger, bursts coalesce)
//!     → reloader.rs (one reload at a time)
//!         → source.rs (read rules text)
//!         → rules::parse_rules (all-or-nothing)
//!         → rules::Translator (Rule → Route)
//!         → Router::replace (atomic swap)
//! ```
//!
//! # Design Decisions
//! - A failed reload leaves the last good table serving
//! - Triggers arriving during a reload schedule exactly one follow-up reload
//! - Reloads run on the blocking pool; dispatch is never blocked by them

pub mod reloader;
pub mod source;
pub mod trigger;

pub use reloader::{ReloadError, ReloadOutcome, ReloadStatus, Reloader};
pub use source::{FileSource, MemorySource, RuleSource};
pub use trigger::{spawn_reload_worker, ReloadHandle};
