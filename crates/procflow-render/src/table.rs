//! CSV import and export
//!
//! Two files per process: one row per step and, optionally, one row per
//! note. Headers are the human-facing column titles used by spreadsheet
//! authors, so they are renamed onto the core row records here.

use crate::error::{RenderError, Result};
use procflow_core::{GraphConfig, NoteRecord, ProcessGraph, StepRecord, ValidatedProcess};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::{debug, info};

const STEP_ID: &str = "Step ID";
const NOTE_ID: &str = "Note ID";
const NOTE_CONTENT: &str = "Content";

/// Step row with spreadsheet headers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct CsvStepRow {
    #[serde(rename = "Step ID")]
    pub step_id: String,
    #[serde(rename = "Description", default)]
    pub description: String,
    #[serde(rename = "Decision", default)]
    pub decision: String,
    #[serde(rename = "Success Outcome", default)]
    pub success_outcome: String,
    #[serde(rename = "Failure Outcome", default)]
    pub failure_outcome: String,
    #[serde(rename = "Linked Note ID", default)]
    pub note_id: Option<String>,
    #[serde(rename = "Next Step (Success)", default)]
    pub next_step_success: String,
    #[serde(rename = "Next Step (Failure)", default)]
    pub next_step_failure: String,
    #[serde(rename = "Validation Rules", default)]
    pub validation_rules: Option<String>,
    #[serde(rename = "Error Codes", default)]
    pub error_codes: Option<String>,
    #[serde(rename = "Retry Logic", default)]
    pub retry_logic: Option<String>,
}

impl From<CsvStepRow> for StepRecord {
    fn from(row: CsvStepRow) -> Self {
        Self {
            id: row.step_id,
            description: row.description,
            decision: row.decision,
            success_outcome: row.success_outcome,
            failure_outcome: row.failure_outcome,
            note_id: row.note_id,
            next_on_success: row.next_step_success,
            next_on_failure: row.next_step_failure,
            validation_rules: row.validation_rules,
            error_codes: row.error_codes,
            retry_logic: row.retry_logic,
        }
    }
}

impl From<StepRecord> for CsvStepRow {
    fn from(record: StepRecord) -> Self {
        Self {
            step_id: record.id,
            description: record.description,
            decision: record.decision,
            success_outcome: record.success_outcome,
            failure_outcome: record.failure_outcome,
            note_id: record.note_id,
            next_step_success: record.next_on_success,
            next_step_failure: record.next_on_failure,
            validation_rules: record.validation_rules,
            error_codes: record.error_codes,
            retry_logic: record.retry_logic,
        }
    }
}

/// Note row with spreadsheet headers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct CsvNoteRow {
    #[serde(rename = "Note ID")]
    pub note_id: String,
    #[serde(rename = "Content")]
    pub content: String,
    #[serde(rename = "Related Step ID", default)]
    pub related_step_id: Option<String>,
}

impl From<CsvNoteRow> for NoteRecord {
    fn from(row: CsvNoteRow) -> Self {
        Self {
            id: row.note_id,
            content: row.content,
            related_step_id: row.related_step_id,
        }
    }
}

impl From<NoteRecord> for CsvNoteRow {
    fn from(record: NoteRecord) -> Self {
        Self {
            note_id: record.id,
            content: record.content,
            related_step_id: record.related_step_id,
        }
    }
}

fn reader<R: Read>(input: R, required: &[&'static str]) -> Result<csv::Reader<R>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(input);
    let headers = reader.headers()?;
    for &column in required {
        if !headers.iter().any(|h| h == column) {
            return Err(RenderError::MissingColumn { column });
        }
    }
    Ok(reader)
}

/// Read step rows; blank lines and rows without a step id are skipped
///
/// # Errors
/// Malformed CSV or a missing `Step ID` column.
pub fn read_steps<R: Read>(input: R) -> Result<Vec<StepRecord>> {
    let mut reader = reader(input, &[STEP_ID])?;
    let mut records = Vec::new();
    for row in reader.deserialize::<CsvStepRow>() {
        let row = row?;
        if row.step_id.is_empty() {
            continue;
        }
        records.push(StepRecord::from(row));
    }
    debug!(rows = records.len(), "step rows read");
    Ok(records)
}

/// Read note rows; rows without a note id are skipped
///
/// # Errors
/// Malformed CSV or a missing `Note ID` / `Content` column.
pub fn read_notes<R: Read>(input: R) -> Result<Vec<NoteRecord>> {
    let mut reader = reader(input, &[NOTE_ID, NOTE_CONTENT])?;
    let mut records = Vec::new();
    for row in reader.deserialize::<CsvNoteRow>() {
        let row = row?;
        if row.note_id.is_empty() {
            continue;
        }
        records.push(NoteRecord::from(row));
    }
    debug!(rows = records.len(), "note rows read");
    Ok(records)
}

/// Build a graph from a steps file and an optional notes file
///
/// Duplicate ids are kept for the validator to report rather than refused.
///
/// # Errors
/// Unreadable or malformed files, or a row that is not a valid step or note.
pub fn load_process(
    name: &str,
    config: GraphConfig,
    steps_path: &Path,
    notes_path: Option<&Path>,
) -> Result<ProcessGraph> {
    let steps = read_steps(File::open(steps_path)?)?
        .into_iter()
        .map(StepRecord::into_step)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|source| RenderError::InvalidRow {
            path: steps_path.to_path_buf(),
            source,
        })?;
    let notes = match notes_path {
        Some(path) => read_notes(File::open(path)?)?
            .into_iter()
            .map(NoteRecord::into_note)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|source| RenderError::InvalidRow {
                path: path.to_path_buf(),
                source,
            })?,
        None => Vec::new(),
    };
    let graph = ProcessGraph::from_parts(name, config, steps, notes);
    info!(
        process = name,
        steps = graph.len(),
        notes = graph.notes().len(),
        path = %steps_path.display(),
        "process loaded"
    );
    Ok(graph)
}

/// Write the step table in insertion order
///
/// # Errors
/// Write failure.
pub fn write_steps<W: Write>(process: &ValidatedProcess<'_>, output: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(output);
    for step in process.steps() {
        writer.serialize(CsvStepRow::from(StepRecord::from(step)))?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the note table in insertion order
///
/// # Errors
/// Write failure.
pub fn write_notes<W: Write>(process: &ValidatedProcess<'_>, output: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(output);
    for note in process.notes() {
        writer.serialize(CsvNoteRow::from(NoteRecord::from(note)))?;
    }
    writer.flush()?;
    Ok(())
}
