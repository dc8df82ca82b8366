//! `validate` and `render` subcommands
//!
//! Each command writes its user-facing output to the given writer and
//! returns whether the process was buildable; the binary maps that to the
//! exit code.

use crate::config::CliConfig;
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use procflow_core::{ProcessGraph, ValidationReport};
use procflow_render::{load_process, write_artifacts, Format};
use serde_json::json;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Timestamp layout of run directories
pub const RUN_DIR_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Input files of one process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInput {
    /// Step table
    pub steps: PathBuf,
    /// Optional note table
    pub notes: Option<PathBuf>,
    /// Process name; derived from the steps file when absent
    pub name: Option<String>,
}

impl ProcessInput {
    /// Process name as given, or the steps file stem without a trailing
    /// `_process`
    #[must_use]
    pub fn process_name(&self) -> String {
        if let Some(name) = self.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            return name.to_string();
        }
        let stem = self
            .steps
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        if let Some(base) = stem.strip_suffix("_process").filter(|b| !b.is_empty()) {
            return base.to_string();
        }
        if stem.is_empty() {
            "process".to_string()
        } else {
            stem
        }
    }

    fn load(&self, config: &CliConfig) -> Result<ProcessGraph> {
        let name = self.process_name();
        load_process(
            &name,
            config.graph.clone(),
            &self.steps,
            self.notes.as_deref(),
        )
        .with_context(|| format!("failed to load process from {}", self.steps.display()))
    }
}

/// Directory for one rendering run: `<base>/<process>/<timestamp>`
#[must_use]
pub fn run_directory(base: &Path, process: &str, at: DateTime<Local>) -> PathBuf {
    base.join(process)
        .join(at.format(RUN_DIR_FORMAT).to_string())
}

fn write_report(out: &mut dyn Write, name: &str, report: &ValidationReport, json: bool) -> Result<()> {
    if json {
        let value = json!({
            "process": name,
            "buildable": !report.has_errors(),
            "errors": report.error_count(),
            "warnings": report.warning_count(),
            "findings": report.findings(),
        });
        serde_json::to_writer_pretty(&mut *out, &value).context("failed to encode report")?;
        writeln!(out)?;
    } else {
        writeln!(out, "Process '{name}': {report}")?;
    }
    Ok(())
}

/// Validate a process and print its report
///
/// # Errors
/// Input files cannot be read or parsed, or output cannot be written.
pub fn validate(
    input: &ProcessInput,
    config: &CliConfig,
    json: bool,
    out: &mut dyn Write,
) -> Result<bool> {
    let mut graph = input.load(config)?;
    let name = graph.name().to_string();
    let report = graph.validate();
    write_report(out, &name, report, json)?;
    Ok(!report.has_errors())
}

/// Render artifacts for a buildable process
///
/// Returns the run directory, or `None` (after printing the report) when
/// the process has errors.
///
/// # Errors
/// Input files cannot be read, or artifacts cannot be written.
pub fn render(
    input: &ProcessInput,
    config: &CliConfig,
    formats: &[Format],
    at: DateTime<Local>,
    out: &mut dyn Write,
) -> Result<Option<PathBuf>> {
    let mut graph = input.load(config)?;
    let name = graph.name().to_string();
    let process = match graph.finalize() {
        Ok(process) => process,
        Err(report) => {
            write_report(out, &name, &report, false)?;
            return Ok(None);
        }
    };

    let dir = run_directory(&config.output.dir, &name, at);
    let written = write_artifacts(&process, &dir, formats)
        .with_context(|| format!("failed to write artifacts to {}", dir.display()))?;

    for warning in process.warnings() {
        writeln!(out, "{warning}")?;
    }
    writeln!(out, "Generated {} file(s) in {}", written.len(), dir.display())?;
    for path in &written {
        writeln!(out, "- {}", path.display())?;
    }
    info!(process = %name, dir = %dir.display(), "render complete");
    Ok(Some(dir))
}
