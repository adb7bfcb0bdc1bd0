//! Transpilation settings.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Error loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Settings shared by all backends. Each backend reads the fields it
/// understands and ignores the rest.
///
/// Example physl.toml:
/// ```toml
/// [transpile]
/// annotate_positions = true   # PhySL: tag names with $line$column
/// indent_width = 2            # Python: spaces per indent level
/// pretty = true               # sexpr: multi-line JSON
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TranspileConfig {
    /// Suffix PhySL primitives and identifiers with `$line$column`. Default: false
    pub annotate_positions: Option<bool>,
    /// Spaces per indentation level in emitted source. Default: 4
    pub indent_width: Option<usize>,
    /// Pretty-print structured output. Default: false
    pub pretty: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    transpile: TranspileConfig,
}

impl TranspileConfig {
    pub fn annotate_positions(&self) -> bool {
        self.annotate_positions.unwrap_or(false)
    }

    pub fn indent_width(&self) -> usize {
        self.indent_width.unwrap_or(4)
    }

    pub fn pretty(&self) -> bool {
        self.pretty.unwrap_or(false)
    }

    /// Parse the `[transpile]` table of a TOML document. A missing table
    /// yields the defaults.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(text)?;
        Ok(file.transpile)
    }

    /// Load from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }
}
