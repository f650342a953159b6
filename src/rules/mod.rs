//! Routing rules: the text format operators write, and its translation to routes.
//!
//! # Data Flow
//! ```text
//! rules text (one rule per line)
//!     → parser.rs (validate every line, build Rule records)
//!     → translate.rs (Rule → Route: host matcher + handler)
//!     → Vec<Route>, in file order, ready for Router::replace
//! ```
//!
//! # Design Decisions
//! - A single malformed line rejects the whole file
//! - Unknown actions are malformed lines, not degraded routes
//! - An unusable forward target degrades that one route to 502

pub mod parser;
pub mod translate;

pub use parser::{parse_rules, Action, Rule, RuleError};
pub use translate::Translator;
