//! Work-in-progress state file
//!
//! An unfinished process (drafting steps, forward references, loose notes)
//! can be saved to `<dir>/<process>.json` and picked up again later. The
//! file holds the same row records the CSV importer produces, so reloading
//! goes through [`ProcessGraph::from_records`] and duplicate rows survive
//! the round trip for the validator to report.

use crate::error::{RenderError, Result};
use procflow_core::{GraphConfig, GraphError, NoteRecord, ProcessGraph, StepRecord};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Saved form of a process under construction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessState {
    /// Process identifier
    pub process_name: String,
    /// Entry step id at save time
    #[serde(default)]
    pub entry_step: Option<String>,
    /// Step rows, live steps first, then shadowed duplicates
    #[serde(default)]
    pub steps: Vec<StepRecord>,
    /// Note rows, same ordering as steps
    #[serde(default)]
    pub notes: Vec<NoteRecord>,
}

impl ProcessState {
    /// Snapshot a graph, finished or not
    #[must_use]
    pub fn capture(graph: &ProcessGraph) -> Self {
        Self {
            process_name: graph.name().to_string(),
            entry_step: graph.entry_step().map(|step| step.id().to_string()),
            steps: graph
                .steps()
                .chain(graph.shadowed_steps())
                .map(StepRecord::from)
                .collect(),
            notes: graph
                .notes()
                .chain(graph.shadowed_notes())
                .map(NoteRecord::from)
                .collect(),
        }
    }

    /// Rebuild the graph
    ///
    /// # Errors
    /// A row that is not a valid step or note.
    pub fn into_graph(self, config: GraphConfig) -> std::result::Result<ProcessGraph, GraphError> {
        let graph = ProcessGraph::from_records(self.process_name, config, self.steps, self.notes)?;
        let entry = graph.entry_step().map(|step| step.id());
        if let Some(saved) = self.entry_step.as_deref() {
            if !entry.is_some_and(|id| id.matches(saved)) {
                warn!(saved, process = graph.name(), "saved entry step is not the first step");
            }
        }
        Ok(graph)
    }
}

/// File name of a process's state file
#[must_use]
pub fn state_file_name(process: &str) -> String {
    format!("{process}.json")
}

/// Write the graph's state into `dir`, creating it if needed
///
/// # Errors
/// Directory creation, encoding or write failure.
pub fn save_state(graph: &ProcessGraph, dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(state_file_name(graph.name()));
    let state = ProcessState::capture(graph);

    let mut writer = BufWriter::new(File::create(&path)?);
    serde_json::to_writer_pretty(&mut writer, &state)?;
    writer.flush()?;

    debug!(
        process = graph.name(),
        steps = state.steps.len(),
        notes = state.notes.len(),
        path = %path.display(),
        "state saved"
    );
    Ok(path)
}

/// Reload a saved process from `dir`
///
/// Returns `None` when no state file exists for the process.
///
/// # Errors
/// Unreadable or malformed file, or a row that is not a valid step or note.
pub fn load_state(process: &str, config: GraphConfig, dir: &Path) -> Result<Option<ProcessGraph>> {
    let path = dir.join(state_file_name(process));
    if !path.is_file() {
        debug!(process, path = %path.display(), "no saved state");
        return Ok(None);
    }

    let state: ProcessState = serde_json::from_reader(BufReader::new(File::open(&path)?))?;
    let graph = state
        .into_graph(config)
        .map_err(|source| RenderError::InvalidRow {
            path: path.clone(),
            source,
        })?;
    info!(
        process = graph.name(),
        steps = graph.len(),
        notes = graph.notes().len(),
        path = %path.display(),
        "state loaded"
    );
    Ok(Some(graph))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_default_to_empty() {
        let state: ProcessState = serde_json::from_str(r#"{"process_name": "ship"}"#).unwrap();
        assert_eq!(state.process_name, "ship");
        assert!(state.steps.is_empty());
        assert!(state.into_graph(GraphConfig::default()).unwrap().is_empty());
    }

    #[test]
    fn state_file_is_named_after_process() {
        assert_eq!(state_file_name("make_a_sandwich"), "make_a_sandwich.json");
    }
}
