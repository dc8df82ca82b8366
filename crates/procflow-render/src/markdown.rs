//! Markdown process document

use procflow_core::{Outcome, Step, ValidatedProcess};
use std::fmt;

fn outcome_title(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Success => "Success",
        Outcome::Failure => "Failure",
    }
}

/// Markdown rendering of a process, written through [`fmt::Display`]
struct Document<'p, 'g> {
    process: &'p ValidatedProcess<'g>,
}

impl Document<'_, '_> {
    fn write_step(&self, f: &mut fmt::Formatter<'_>, number: usize, step: &Step) -> fmt::Result {
        writeln!(f, "### {number}. {}\n", step.id())?;
        if let Some(description) = step.description() {
            writeln!(f, "{description}\n")?;
        }
        if let Some(decision) = step.decision() {
            writeln!(f, "**Decision:** {decision}\n")?;
        }
        for outcome in Outcome::ALL {
            let next = step
                .next(outcome)
                .map(ToString::to_string)
                .unwrap_or_default();
            writeln!(
                f,
                "- **{}:** {} → {next}",
                outcome_title(outcome),
                step.outcome_label(outcome).unwrap_or_default()
            )?;
        }
        writeln!(f)?;

        let metadata = [
            ("Validation rules", step.validation_rules()),
            ("Error codes", step.error_codes()),
            ("Retry logic", step.retry_logic()),
        ];
        if metadata.iter().any(|(_, value)| value.is_some()) {
            for (name, value) in metadata {
                if let Some(value) = value {
                    writeln!(f, "- *{name}:* {value}")?;
                }
            }
            writeln!(f)?;
        }

        if let Some(note) = self.process.note_for(step) {
            writeln!(f, "> **Note {}:** {}\n", note.id(), note.content())?;
        }
        Ok(())
    }
}

impl fmt::Display for Document<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let process = self.process;
        writeln!(f, "# {}\n", process.name())?;

        writeln!(f, "## Overview\n")?;
        writeln!(f, "- Steps: {}", process.steps().len())?;
        writeln!(f, "- Notes: {}", process.notes().len())?;
        if let Some(entry) = process.entry_id() {
            writeln!(f, "- Entry step: {entry}")?;
        }
        writeln!(f)?;

        writeln!(f, "## Steps\n")?;
        for (index, step) in process.traverse().enumerate() {
            self.write_step(f, index + 1, step)?;
        }

        let notes: Vec<_> = process.notes().collect();
        if !notes.is_empty() {
            writeln!(f, "## Notes\n")?;
            for note in notes {
                match note.related_step_id() {
                    Some(step) => writeln!(f, "- **{}** ({step}): {}", note.id(), note.content())?,
                    None => writeln!(f, "- **{}**: {}", note.id(), note.content())?,
                }
            }
            writeln!(f)?;
        }

        let warnings: Vec<_> = process.warnings().collect();
        if !warnings.is_empty() {
            writeln!(f, "## Warnings\n")?;
            for warning in warnings {
                writeln!(f, "- {warning}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Render the process as a Markdown document
///
/// Steps appear in breadth-first order from the entry step. Validation
/// warnings, if any, are listed at the end.
#[must_use]
pub fn render(process: &ValidatedProcess<'_>) -> String {
    Document { process }.to_string()
}
