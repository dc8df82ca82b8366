//! Artifact files for one rendering run

use crate::error::Result;
use crate::{markdown, mermaid, table};
use procflow_core::ValidatedProcess;
use std::fmt;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

/// Kind of artifact to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// Step and note tables
    Csv,
    /// Flowchart source
    Mermaid,
    /// Process document
    Markdown,
}

impl Format {
    /// Every format, in writing order
    pub const ALL: [Format; 3] = [Format::Csv, Format::Mermaid, Format::Markdown];

    /// Lowercase name as accepted on the command line
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Mermaid => "mermaid",
            Self::Markdown => "markdown",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "mermaid" | "mmd" => Ok(Self::Mermaid),
            "markdown" | "md" => Ok(Self::Markdown),
            other => Err(format!("unknown format '{other}'")),
        }
    }
}

/// File name for the step table
#[must_use]
pub fn steps_file_name(process: &str) -> String {
    format!("{process}_process.csv")
}

/// File name for the note table
#[must_use]
pub fn notes_file_name(process: &str) -> String {
    format!("{process}_notes.csv")
}

/// File name for the Mermaid diagram
#[must_use]
pub fn diagram_file_name(process: &str) -> String {
    format!("{process}_diagram.mmd")
}

/// File name for the Markdown document
#[must_use]
pub fn document_file_name(process: &str) -> String {
    format!("{process}_summary.md")
}

/// Write the requested artifacts into `dir`, creating it if needed
///
/// The notes table is only written when the process has notes. Returns the
/// paths written, in order.
///
/// # Errors
/// Directory creation or file write failure.
pub fn write_artifacts(
    process: &ValidatedProcess<'_>,
    dir: &Path,
    formats: &[Format],
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let name = process.name();
    let mut written = Vec::new();

    for format in Format::ALL.into_iter().filter(|f| formats.contains(f)) {
        match format {
            Format::Csv => {
                let path = dir.join(steps_file_name(name));
                table::write_steps(process, BufWriter::new(File::create(&path)?))?;
                written.push(path);
                if process.notes().next().is_some() {
                    let path = dir.join(notes_file_name(name));
                    table::write_notes(process, BufWriter::new(File::create(&path)?))?;
                    written.push(path);
                }
            }
            Format::Mermaid => {
                let path = dir.join(diagram_file_name(name));
                fs::write(&path, mermaid::render(process))?;
                written.push(path);
            }
            Format::Markdown => {
                let path = dir.join(document_file_name(name));
                fs::write(&path, markdown::render(process))?;
                written.push(path);
            }
        }
        debug!(%format, "artifact written");
    }

    info!(process = name, files = written.len(), dir = %dir.display(), "artifacts written");
    Ok(written)
}
