//! Graph and validator configuration
//!
//! Passed explicitly into [`ProcessGraph`](crate::ProcessGraph) and
//! [`Validator`](crate::Validator) constructors. There is no process-wide
//! mode flag.

use serde::{Deserialize, Serialize};

/// Validation engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Emit warning-level style findings for step and note text
    pub style_checks: bool,
    /// Descriptions shorter than this many characters get a warning
    pub min_description_len: usize,
    /// Shortest acceptable note content, in characters
    pub min_note_len: usize,
    /// Longest acceptable note content, in characters
    pub max_note_len: usize,
}

impl ValidationConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With style checks toggled
    #[inline]
    #[must_use]
    pub fn with_style_checks(mut self, enabled: bool) -> Self {
        self.style_checks = enabled;
        self
    }

    /// With minimum description length
    #[inline]
    #[must_use]
    pub fn with_min_description_len(mut self, len: usize) -> Self {
        self.min_description_len = len;
        self
    }

    /// With accepted note length range (inclusive)
    #[inline]
    #[must_use]
    pub fn with_note_len(mut self, min: usize, max: usize) -> Self {
        self.min_note_len = min;
        self.max_note_len = max;
        self
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            style_checks: true,
            min_description_len: 10,
            min_note_len: 5,
            max_note_len: 200,
        }
    }
}

/// Per-graph configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Log every finding and per-pass detail while validating
    pub verbose: bool,
    /// Validation engine settings
    pub validation: ValidationConfig,
}

impl GraphConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With verbose validation logging
    #[inline]
    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// With validation settings
    #[inline]
    #[must_use]
    pub fn with_validation(mut self, validation: ValidationConfig) -> Self {
        self.validation = validation;
        self
    }
}
