//! TOML configuration for suite runs.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::parser::LenPolicy;

/// Top-level configuration, every section optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// `[paths]`
    pub paths: PathsSection,
    /// `[parser]`
    pub parser: ParserSection,
    /// `[logging]`
    pub logging: LoggingSection,
}

/// The `[paths]` section: roots of the three vector trees.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsSection {
    /// Request (`.req`) files.
    pub request: PathBuf,
    /// Where responses are written.
    pub response: PathBuf,
    /// Known-good responses to compare against.
    pub expected: PathBuf,
}

impl Default for PathsSection {
    fn default() -> Self {
        Self::under(Path::new("test_vectors"))
    }
}

impl PathsSection {
    /// under places request/, response/ and expected/ below `root`.
    pub fn under(root: &Path) -> Self {
        Self {
            request: root.join("request"),
            response: root.join("response"),
            expected: root.join("expected"),
        }
    }
}

/// The `[parser]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ParserSection {
    /// Fail on malformed `Len` lines instead of skipping the record.
    pub strict_len: bool,
}

impl ParserSection {
    /// len_policy maps `strict_len` to a parser policy.
    pub fn len_policy(&self) -> LenPolicy {
        if self.strict_len {
            LenPolicy::Reject
        } else {
            LenPolicy::Skip
        }
    }
}

/// The `[logging]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Default filter when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON lines instead of the human format.
    pub json: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl SuiteConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| Error::Config(format!("failed to parse config: {}", e)))
    }

    /// with_root returns the default configuration with all vector trees
    /// below `root`.
    pub fn with_root(root: &Path) -> Self {
        Self {
            paths: PathsSection::under(root),
            ..Self::default()
        }
    }
}
