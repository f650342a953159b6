//! Where rules text comes from.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// A readable source of rules text.
pub trait RuleSource: Send + Sync + fmt::Debug {
    /// Read the full current rules document.
    fn read(&self) -> std::io::Result<String>;

    /// Human-readable location for logs.
    fn location(&self) -> String;
}

/// Rules stored in a file on disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RuleSource for FileSource {
    fn read(&self) -> std::io::Result<String> {
        std::fs::read_to_string(&self.path)
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// Rules held in memory; clones share the same text.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    text: Arc<Mutex<String>>,
}

impl MemorySource {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Arc::new(Mutex::new(text.into())),
        }
    }

    /// Replace the text seen by the next reload.
    pub fn set(&self, text: impl Into<String>) {
        *self.text.lock().unwrap_or_else(|e| e.into_inner()) = text.into();
    }
}

impl RuleSource for MemorySource {
    fn read(&self) -> std::io::Result<String> {
        Ok(self.text.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn location(&self) -> String {
        "<memory>".to_string()
    }
}
