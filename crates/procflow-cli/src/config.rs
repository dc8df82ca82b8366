//! Command-line configuration file
//!
//! Optional TOML file; command-line flags override what it sets.
//!
//! ```toml
//! [graph]
//! verbose = false
//!
//! [graph.validation]
//! style_checks = true
//! min_description_len = 10
//!
//! [output]
//! dir = "output"
//! ```

use anyhow::{Context, Result};
use procflow_core::GraphConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File read when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "procflow.toml";

/// Where rendered artifacts go
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Base directory; runs land in `<dir>/<process>/<timestamp>/`
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
        }
    }
}

/// Complete command-line configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Graph and validator settings
    pub graph: GraphConfig,
    /// Output settings
    pub output: OutputConfig,
}

impl CliConfig {
    /// Parse TOML text
    ///
    /// # Errors
    /// Malformed TOML or unknown value types.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid configuration")
    }

    /// Load configuration
    ///
    /// An explicit path must exist. Without one, `procflow.toml` in the
    /// working directory is used when present, defaults otherwise.
    ///
    /// # Errors
    /// Unreadable or malformed file.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.is_file() {
                    debug!("no configuration file, using defaults");
                    return Ok(Self::default());
                }
                default
            }
        };
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config = Self::from_toml_str(&text)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// With verbose validation forced on
    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        if verbose {
            self.graph.verbose = true;
        }
        self
    }

    /// With output directory override
    #[must_use]
    pub fn with_output_dir(mut self, dir: Option<PathBuf>) -> Self {
        if let Some(dir) = dir {
            self.output.dir = dir;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = CliConfig::from_toml_str(
            "[graph.validation]\nstyle_checks = false\n\n[output]\ndir = \"docs\"\n",
        )
        .unwrap();
        assert!(!config.graph.validation.style_checks);
        assert_eq!(config.graph.validation.min_description_len, 10);
        assert_eq!(config.output.dir, PathBuf::from("docs"));
        assert!(!config.graph.verbose);
    }

    #[test]
    fn flags_override_file() {
        let config = CliConfig::default()
            .with_verbose(true)
            .with_output_dir(Some(PathBuf::from("elsewhere")));
        assert!(config.graph.verbose);
        assert_eq!(config.output.dir, PathBuf::from("elsewhere"));

        let unchanged = CliConfig::default().with_output_dir(None);
        assert_eq!(unchanged.output.dir, PathBuf::from("output"));
    }

    #[test]
    fn rejects_wrong_types() {
        assert!(CliConfig::from_toml_str("[graph]\nverbose = \"yes\"\n").is_err());
    }
}
