//! Renderer configuration
//!
//! Loaded from TOML, every field optional:
//!
//! ```toml
//! prop_count = "exact"      # or "not_shrunk"
//! trace_mutations = false
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How the same-node test compares the number of props on old and new nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropCountPolicy {
    /// Old and new prop counts must be equal.
    #[default]
    Exact,
    /// The old node may not carry more props than the new one.
    NotShrunk,
}

impl PropCountPolicy {
    pub fn accepts(self, old_count: usize, new_count: usize) -> bool {
        match self {
            Self::Exact => old_count == new_count,
            Self::NotShrunk => old_count <= new_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub prop_count: PropCountPolicy,
    /// Emit a trace event for every host edit made through an anchor
    pub trace_mutations: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

impl RenderConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    pub fn with_prop_count(mut self, policy: PropCountPolicy) -> Self {
        self.prop_count = policy;
        self
    }

    pub fn with_trace_mutations(mut self, enabled: bool) -> Self {
        self.trace_mutations = enabled;
        self
    }
}
