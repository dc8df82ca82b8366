//! Procflow Render
//!
//! Input and output around a process graph:
//!
//! - [`table`]: CSV import into row records, CSV export
//! - [`mermaid`]: flowchart diagram
//! - [`markdown`]: process document
//! - [`output`]: writes the chosen artifacts into a directory
//! - [`state`]: saves and reloads an unfinished process
//!
//! Every artifact writer takes a
//! [`ValidatedProcess`](procflow_core::ValidatedProcess), so only buildable
//! graphs are ever rendered. State files are the exception: they exist to
//! hold work in progress.

#![warn(unreachable_pub)]

pub mod error;
pub mod markdown;
pub mod mermaid;
pub mod output;
pub mod state;
pub mod table;

pub use error::{RenderError, Result};
pub use output::{write_artifacts, Format};
pub use state::{load_state, save_state, ProcessState};
pub use table::{load_process, read_notes, read_steps, CsvNoteRow, CsvStepRow};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
