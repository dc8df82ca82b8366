//! Flat row records
//!
//! Transport shape for importers: every field is plain text, exactly as it
//! sits in a tabular source. Conversion into [`Step`] and [`Note`] checks
//! shape only; references are left for the validation engine.

use crate::error::Result;
use crate::note::{Note, NoteId};
use crate::step::{NextStep, Step, StepId};
use serde::{Deserialize, Serialize};

/// One step row
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepRecord {
    /// Step identifier
    pub id: String,
    /// What happens in the step
    pub description: String,
    /// Yes/no question
    pub decision: String,
    /// Success branch label
    pub success_outcome: String,
    /// Failure branch label
    pub failure_outcome: String,
    /// Linked note id
    pub note_id: Option<String>,
    /// Success target; empty means unset
    pub next_on_success: String,
    /// Failure target; empty means unset
    pub next_on_failure: String,
    /// Free-form validation rules
    pub validation_rules: Option<String>,
    /// Free-form error codes
    pub error_codes: Option<String>,
    /// Free-form retry logic
    pub retry_logic: Option<String>,
}

fn pointer(raw: &str) -> Result<Option<NextStep>> {
    if raw.trim().is_empty() {
        Ok(None)
    } else {
        NextStep::parse(raw).map(Some)
    }
}

fn present(raw: Option<&String>) -> Option<&str> {
    raw.map(|s| s.trim()).filter(|s| !s.is_empty())
}

impl StepRecord {
    /// Convert into a step
    ///
    /// Blank text leaves the matching field unset, so a partial row becomes
    /// a drafting step.
    ///
    /// # Errors
    /// Blank or reserved step id, or a note id that is only whitespace
    /// after the row was marked as having one.
    pub fn into_step(self) -> Result<Step> {
        let mut step = Step::with_id(StepId::new(self.id)?)
            .with_description(self.description)
            .with_decision(self.decision)
            .with_success_outcome(self.success_outcome)
            .with_failure_outcome(self.failure_outcome);
        if let Some(next) = pointer(&self.next_on_success)? {
            step = step.with_next_on_success(next);
        }
        if let Some(next) = pointer(&self.next_on_failure)? {
            step = step.with_next_on_failure(next);
        }
        if let Some(note) = present(self.note_id.as_ref()) {
            step = step.with_note(NoteId::new(note)?);
        }
        if let Some(text) = present(self.validation_rules.as_ref()) {
            step = step.with_validation_rules(text);
        }
        if let Some(text) = present(self.error_codes.as_ref()) {
            step = step.with_error_codes(text);
        }
        if let Some(text) = present(self.retry_logic.as_ref()) {
            step = step.with_retry_logic(text);
        }
        Ok(step)
    }
}

impl From<&Step> for StepRecord {
    fn from(step: &Step) -> Self {
        let text = |v: Option<&str>| v.unwrap_or_default().to_string();
        let next = |v: Option<&NextStep>| v.map(ToString::to_string).unwrap_or_default();
        Self {
            id: step.id().to_string(),
            description: text(step.description()),
            decision: text(step.decision()),
            success_outcome: text(step.success_outcome()),
            failure_outcome: text(step.failure_outcome()),
            note_id: step.note_id().map(ToString::to_string),
            next_on_success: next(step.next_on_success()),
            next_on_failure: next(step.next_on_failure()),
            validation_rules: step.validation_rules().map(str::to_string),
            error_codes: step.error_codes().map(str::to_string),
            retry_logic: step.retry_logic().map(str::to_string),
        }
    }
}

/// One note row
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoteRecord {
    /// Note identifier
    pub id: String,
    /// Note text
    pub content: String,
    /// Step the note annotates
    pub related_step_id: Option<String>,
}

impl NoteRecord {
    /// Convert into a note
    ///
    /// # Errors
    /// Blank id or content, or a related step id that is reserved.
    pub fn into_note(self) -> Result<Note> {
        let mut note = Note::new(self.id, self.content)?;
        if let Some(step) = present(self.related_step_id.as_ref()) {
            note = note.with_related_step(StepId::new(step)?);
        }
        Ok(note)
    }
}

impl From<&Note> for NoteRecord {
    fn from(note: &Note) -> Self {
        Self {
            id: note.id().to_string(),
            content: note.content().to_string(),
            related_step_id: note.related_step_id().map(ToString::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::StepState;
    use crate::error::GraphError;

    fn row(id: &str) -> StepRecord {
        StepRecord {
            id: id.to_string(),
            description: "Lay out two slices".to_string(),
            decision: "Are there two slices?".to_string(),
            success_outcome: "Two slices".to_string(),
            failure_outcome: "Not enough bread".to_string(),
            next_on_success: "Spread Butter".to_string(),
            next_on_failure: "end".to_string(),
            ..StepRecord::default()
        }
    }

    #[test]
    fn record_converts_to_complete_step() {
        let step = row("Slice Bread").into_step().unwrap();
        assert_eq!(step.state(), StepState::Complete);
        assert_eq!(step.next_on_failure(), Some(&NextStep::End));
        assert_eq!(step.note_id(), None);
    }

    #[test]
    fn partial_record_becomes_draft() {
        let record = StepRecord {
            id: "Toast".into(),
            description: "Toast it".into(),
            ..StepRecord::default()
        };
        let step = record.into_step().unwrap();
        assert_eq!(step.state(), StepState::Drafting);
        assert!(step.next_on_success().is_none());
    }

    #[test]
    fn reserved_id_is_rejected() {
        assert!(matches!(
            row("End").into_step(),
            Err(GraphError::ReservedId { .. })
        ));
    }

    #[test]
    fn step_round_trips_through_record() {
        let step = row("Slice Bread").into_step().unwrap();
        let record = StepRecord::from(&step);
        assert_eq!(record.next_on_failure, "End");
        assert_eq!(record.into_step().unwrap(), step);
    }

    #[test]
    fn note_record_with_blank_related_step() {
        let note = NoteRecord {
            id: "N1".into(),
            content: "Use fresh bread".into(),
            related_step_id: Some("  ".into()),
        }
        .into_note()
        .unwrap();
        assert!(note.related_step_id().is_none());
    }
}
