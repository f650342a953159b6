//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! settings file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → EdgeConfig (validated, immutable)
//!
//! rules file (ACTION HOST TARGET lines)
//!     → watcher.rs detects change
//!     → ReloadHandle::trigger
//!     → reload subsystem rebuilds the route table
//! ```
//!
//! # Design Decisions
//! - Settings are read once at startup; only the rules file hot-reloads
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AdminConfig, EdgeConfig, ListenerConfig, ObservabilityConfig, RulesConfig, TlsConfig,
    UpstreamConfig,
};
pub use validation::{validate_config, ValidationError};
