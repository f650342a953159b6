//! Rule line grammar.
//!
//! ```text
//! # comment
//! ACTION HOST TARGET
//! ```
//! `ACTION` is one of `s`, `serve`, `f`, `forward`. `HOST` and `TARGET` are
//! whitespace-free tokens. Blank lines and lines starting with `#` are skipped.
//! Any other line is an error.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static RULE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<action>s|serve|f|forward)\s+(?P<host>\S+)\s+(?P<target>\S+)$")
        .expect("rule pattern is valid")
});

/// What a rule does with matching requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Serve static files from the target directory.
    Serve,
    /// Reverse proxy to the target URL.
    Forward,
}

impl Action {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "s" | "serve" => Some(Action::Serve),
            "f" | "forward" => Some(Action::Forward),
            _ => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Serve => f.write_str("serve"),
            Action::Forward => f.write_str("forward"),
        }
    }
}

/// One parsed configuration rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub action: Action,
    pub host: String,
    pub target: String,
}

/// Error for rules text that does not follow the grammar.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleError {
    #[error("line {line}: malformed rule `{content}`")]
    Malformed { line: usize, content: String },
}

/// Parse one non-comment line. `line` is 1-based and only used for errors.
pub fn parse_rule(line: usize, content: &str) -> Result<Rule, RuleError> {
    let trimmed = content.trim();
    let malformed = || RuleError::Malformed {
        line,
        content: trimmed.to_string(),
    };

    let caps = RULE_RE.captures(trimmed).ok_or_else(malformed)?;
    let action = Action::from_token(&caps["action"]).ok_or_else(malformed)?;

    Ok(Rule {
        action,
        host: caps["host"].to_string(),
        target: caps["target"].to_string(),
    })
}

/// Parse a whole rules document. Fails on the first malformed line.
pub fn parse_rules(text: &str) -> Result<Vec<Rule>, RuleError> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(n, line)| parse_rule(n + 1, line))
        .collect()
}
