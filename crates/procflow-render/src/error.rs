//! Error types for the renderers

use procflow_core::GraphError;
use std::path::PathBuf;

/// Errors raised while importing or writing process artifacts
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Malformed CSV input or failed CSV write
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Malformed state file or failed state write
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Input file lacks a required header
    #[error("missing required column '{column}'")]
    MissingColumn {
        /// Header text
        column: &'static str,
    },

    /// A row could not become a step or note
    #[error("invalid row in {}: {source}", path.display())]
    InvalidRow {
        /// Source file
        path: PathBuf,
        /// Shape violation
        #[source]
        source: GraphError,
    },

    /// Graph contract violation
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Result alias for renderer operations
pub type Result<T, E = RenderError> = std::result::Result<T, E>;
