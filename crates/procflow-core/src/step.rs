//! Step entity
//!
//! A step is a decision point with a success and a failure outcome, each
//! leading to another step or to the terminal `End`. The identifier is fixed
//! at creation; every other field changes through [`StepUpdate`], which only
//! checks the field's own shape. Whether pointers resolve is a graph-level
//! question left to the validation engine.

use crate::edit::StepState;
use crate::error::{GraphError, Result};
use crate::note::NoteId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Literal naming the terminal sentinel
pub const END: &str = "End";

/// Lookup key for a raw identifier: trimmed and case-folded
pub(crate) fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub(crate) fn is_end(raw: &str) -> bool {
    raw.trim().eq_ignore_ascii_case(END)
}

/// Human-assigned step identifier
///
/// Compares case-insensitively and ignores surrounding whitespace. Displays
/// the spelling it was created with.
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StepId {
    label: String,
    key: String,
}

impl StepId {
    /// Create an identifier from a title
    ///
    /// # Errors
    /// - `EmptyField` if the title is blank
    /// - `ReservedId` if the title is the `End` sentinel
    pub fn new(title: impl Into<String>) -> Result<Self> {
        let title = title.into();
        let label = title.trim();
        if label.is_empty() {
            return Err(GraphError::EmptyField { field: "id" });
        }
        if is_end(label) {
            return Err(GraphError::ReservedId {
                id: label.to_string(),
            });
        }
        Ok(Self {
            key: normalize(label),
            label: label.to_string(),
        })
    }

    /// Identifier as authored
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.label
    }

    /// Whether `raw` names this step
    #[inline]
    #[must_use]
    pub fn matches(&self, raw: &str) -> bool {
        self.key == normalize(raw)
    }

    pub(crate) fn key(&self) -> &str {
        &self.key
    }
}

impl PartialEq for StepId {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for StepId {}

impl Hash for StepId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Debug for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.label, f)
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

impl TryFrom<String> for StepId {
    type Error = GraphError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<&str> for StepId {
    type Error = GraphError;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl From<StepId> for String {
    fn from(value: StepId) -> Self {
        value.label
    }
}

/// Resolved target of an outcome pointer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum NextStep {
    /// Continue at another step
    Step(StepId),
    /// Terminate the process
    End,
}

impl NextStep {
    /// Interpret a pointer value: `End` in any case, otherwise a step id
    ///
    /// # Errors
    /// `EmptyField` if the value is blank.
    pub fn parse(raw: &str) -> Result<Self> {
        if is_end(raw) {
            Ok(Self::End)
        } else {
            StepId::new(raw).map(Self::Step)
        }
    }

    /// Pointer to a step by title
    ///
    /// # Errors
    /// See [`StepId::new`].
    pub fn step(title: impl Into<String>) -> Result<Self> {
        StepId::new(title).map(Self::Step)
    }

    /// Target step, if the pointer is not `End`
    #[inline]
    #[must_use]
    pub fn step_id(&self) -> Option<&StepId> {
        match self {
            Self::Step(id) => Some(id),
            Self::End => None,
        }
    }

    /// Whether the pointer terminates the process
    #[inline]
    #[must_use]
    pub fn is_end(&self) -> bool {
        matches!(self, Self::End)
    }
}

impl fmt::Display for NextStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Step(id) => fmt::Display::fmt(id, f),
            Self::End => f.write_str(END),
        }
    }
}

impl TryFrom<String> for NextStep {
    type Error = GraphError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<NextStep> for String {
    fn from(value: NextStep) -> Self {
        value.to_string()
    }
}

/// Which branch of a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// The decision was answered "yes"
    Success,
    /// The decision was answered "no"
    Failure,
}

impl Outcome {
    /// Both outcomes, success first
    pub const ALL: [Outcome; 2] = [Outcome::Success, Outcome::Failure];

    /// Pointer field carrying this outcome's target
    #[inline]
    #[must_use]
    pub fn pointer_field(self) -> StepField {
        match self {
            Self::Success => StepField::NextOnSuccess,
            Self::Failure => StepField::NextOnFailure,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("success"),
            Self::Failure => f.write_str("failure"),
        }
    }
}

/// Named field of a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum StepField {
    Id,
    Description,
    Decision,
    SuccessOutcome,
    FailureOutcome,
    NextOnSuccess,
    NextOnFailure,
    NoteId,
    ValidationRules,
    ErrorCodes,
    RetryLogic,
}

impl StepField {
    /// Fields that must be set before a step is complete
    pub const REQUIRED: [StepField; 4] = [
        StepField::Description,
        StepField::Decision,
        StepField::SuccessOutcome,
        StepField::FailureOutcome,
    ];

    /// Field name as used in messages and serialized reports
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Description => "description",
            Self::Decision => "decision",
            Self::SuccessOutcome => "success_outcome",
            Self::FailureOutcome => "failure_outcome",
            Self::NextOnSuccess => "next_on_success",
            Self::NextOnFailure => "next_on_failure",
            Self::NoteId => "note_id",
            Self::ValidationRules => "validation_rules",
            Self::ErrorCodes => "error_codes",
            Self::RetryLogic => "retry_logic",
        }
    }
}

impl fmt::Display for StepField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single field rewrite applied through the edit protocol
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum StepUpdate {
    Description(String),
    Decision(String),
    SuccessOutcome(String),
    FailureOutcome(String),
    NextOnSuccess(Option<NextStep>),
    NextOnFailure(Option<NextStep>),
    ValidationRules(Option<String>),
    ErrorCodes(Option<String>),
    RetryLogic(Option<String>),
}

impl StepUpdate {
    /// Field this update rewrites
    #[must_use]
    pub fn field(&self) -> StepField {
        match self {
            Self::Description(_) => StepField::Description,
            Self::Decision(_) => StepField::Decision,
            Self::SuccessOutcome(_) => StepField::SuccessOutcome,
            Self::FailureOutcome(_) => StepField::FailureOutcome,
            Self::NextOnSuccess(_) => StepField::NextOnSuccess,
            Self::NextOnFailure(_) => StepField::NextOnFailure,
            Self::ValidationRules(_) => StepField::ValidationRules,
            Self::ErrorCodes(_) => StepField::ErrorCodes,
            Self::RetryLogic(_) => StepField::RetryLogic,
        }
    }

    /// Pointer update for one outcome
    #[must_use]
    pub fn next(outcome: Outcome, target: Option<NextStep>) -> Self {
        match outcome {
            Outcome::Success => Self::NextOnSuccess(target),
            Outcome::Failure => Self::NextOnFailure(target),
        }
    }
}

fn required_text(field: StepField, value: String) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(GraphError::EmptyField {
            field: field.as_str(),
        });
    }
    Ok(trimmed.to_string())
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// A decision step of a process
///
/// Required text fields (`description`, `decision`, both outcome labels)
/// may be unset while the step is being drafted; see [`StepState`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    id: StepId,
    description: Option<String>,
    decision: Option<String>,
    success_outcome: Option<String>,
    failure_outcome: Option<String>,
    next_on_success: Option<NextStep>,
    next_on_failure: Option<NextStep>,
    note_id: Option<NoteId>,
    validation_rules: Option<String>,
    error_codes: Option<String>,
    retry_logic: Option<String>,
}

impl Step {
    /// Create an empty draft step
    ///
    /// # Errors
    /// See [`StepId::new`].
    pub fn new(title: impl Into<String>) -> Result<Self> {
        StepId::new(title).map(Self::with_id)
    }

    /// Create an empty draft step from an existing identifier
    #[must_use]
    pub fn with_id(id: StepId) -> Self {
        Self {
            id,
            description: None,
            decision: None,
            success_outcome: None,
            failure_outcome: None,
            next_on_success: None,
            next_on_failure: None,
            note_id: None,
            validation_rules: None,
            error_codes: None,
            retry_logic: None,
        }
    }

    /// With description; blank text leaves the field unset
    #[must_use]
    pub fn with_description(mut self, text: impl Into<String>) -> Self {
        self.description = optional_text(Some(text.into()));
        self
    }

    /// With decision question; blank text leaves the field unset
    #[must_use]
    pub fn with_decision(mut self, text: impl Into<String>) -> Self {
        self.decision = optional_text(Some(text.into()));
        self
    }

    /// With success outcome label; blank text leaves the field unset
    #[must_use]
    pub fn with_success_outcome(mut self, text: impl Into<String>) -> Self {
        self.success_outcome = optional_text(Some(text.into()));
        self
    }

    /// With failure outcome label; blank text leaves the field unset
    #[must_use]
    pub fn with_failure_outcome(mut self, text: impl Into<String>) -> Self {
        self.failure_outcome = optional_text(Some(text.into()));
        self
    }

    /// With success pointer
    #[must_use]
    pub fn with_next_on_success(mut self, next: NextStep) -> Self {
        self.next_on_success = Some(next);
        self
    }

    /// With failure pointer
    #[must_use]
    pub fn with_next_on_failure(mut self, next: NextStep) -> Self {
        self.next_on_failure = Some(next);
        self
    }

    /// With linked note
    #[must_use]
    pub fn with_note(mut self, note_id: NoteId) -> Self {
        self.note_id = Some(note_id);
        self
    }

    /// With validation rules text
    #[must_use]
    pub fn with_validation_rules(mut self, text: impl Into<String>) -> Self {
        self.validation_rules = optional_text(Some(text.into()));
        self
    }

    /// With error codes text
    #[must_use]
    pub fn with_error_codes(mut self, text: impl Into<String>) -> Self {
        self.error_codes = optional_text(Some(text.into()));
        self
    }

    /// With retry logic text
    #[must_use]
    pub fn with_retry_logic(mut self, text: impl Into<String>) -> Self {
        self.retry_logic = optional_text(Some(text.into()));
        self
    }

    /// Rewrite one field
    ///
    /// Checks only the field's own shape. On error the step is unchanged.
    ///
    /// # Errors
    /// `EmptyField` when a required text field is set to blank text.
    pub fn apply(&mut self, update: StepUpdate) -> Result<()> {
        let field = update.field();
        match update {
            StepUpdate::Description(text) => {
                self.description = Some(required_text(field, text)?);
            }
            StepUpdate::Decision(text) => self.decision = Some(required_text(field, text)?),
            StepUpdate::SuccessOutcome(text) => {
                self.success_outcome = Some(required_text(field, text)?);
            }
            StepUpdate::FailureOutcome(text) => {
                self.failure_outcome = Some(required_text(field, text)?);
            }
            StepUpdate::NextOnSuccess(next) => self.next_on_success = next,
            StepUpdate::NextOnFailure(next) => self.next_on_failure = next,
            StepUpdate::ValidationRules(text) => self.validation_rules = optional_text(text),
            StepUpdate::ErrorCodes(text) => self.error_codes = optional_text(text),
            StepUpdate::RetryLogic(text) => self.retry_logic = optional_text(text),
        }
        Ok(())
    }

    pub(crate) fn set_note(&mut self, note_id: Option<NoteId>) -> Option<NoteId> {
        std::mem::replace(&mut self.note_id, note_id)
    }

    pub(crate) fn pointer_mut(&mut self, outcome: Outcome) -> &mut Option<NextStep> {
        match outcome {
            Outcome::Success => &mut self.next_on_success,
            Outcome::Failure => &mut self.next_on_failure,
        }
    }

    /// Step identifier
    #[inline]
    #[must_use]
    pub fn id(&self) -> &StepId {
        &self.id
    }

    /// What happens in this step
    #[inline]
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Yes/no question deciding the branch
    #[inline]
    #[must_use]
    pub fn decision(&self) -> Option<&str> {
        self.decision.as_deref()
    }

    /// Label of the success branch
    #[inline]
    #[must_use]
    pub fn success_outcome(&self) -> Option<&str> {
        self.success_outcome.as_deref()
    }

    /// Label of the failure branch
    #[inline]
    #[must_use]
    pub fn failure_outcome(&self) -> Option<&str> {
        self.failure_outcome.as_deref()
    }

    /// Label of one branch
    #[must_use]
    pub fn outcome_label(&self, outcome: Outcome) -> Option<&str> {
        match outcome {
            Outcome::Success => self.success_outcome(),
            Outcome::Failure => self.failure_outcome(),
        }
    }

    /// Success pointer
    #[inline]
    #[must_use]
    pub fn next_on_success(&self) -> Option<&NextStep> {
        self.next_on_success.as_ref()
    }

    /// Failure pointer
    #[inline]
    #[must_use]
    pub fn next_on_failure(&self) -> Option<&NextStep> {
        self.next_on_failure.as_ref()
    }

    /// Pointer of one branch
    #[must_use]
    pub fn next(&self, outcome: Outcome) -> Option<&NextStep> {
        match outcome {
            Outcome::Success => self.next_on_success(),
            Outcome::Failure => self.next_on_failure(),
        }
    }

    /// Step ids this step points at, success first
    pub fn successors(&self) -> impl Iterator<Item = &StepId> + '_ {
        Outcome::ALL
            .into_iter()
            .filter_map(|outcome| self.next(outcome).and_then(NextStep::step_id))
    }

    /// Whether either pointer targets `id`
    #[must_use]
    pub fn points_to(&self, id: &StepId) -> bool {
        self.successors().any(|s| s == id)
    }

    /// Linked note
    #[inline]
    #[must_use]
    pub fn note_id(&self) -> Option<&NoteId> {
        self.note_id.as_ref()
    }

    /// Free-form validation rules
    #[inline]
    #[must_use]
    pub fn validation_rules(&self) -> Option<&str> {
        self.validation_rules.as_deref()
    }

    /// Free-form error codes
    #[inline]
    #[must_use]
    pub fn error_codes(&self) -> Option<&str> {
        self.error_codes.as_deref()
    }

    /// Free-form retry logic
    #[inline]
    #[must_use]
    pub fn retry_logic(&self) -> Option<&str> {
        self.retry_logic.as_deref()
    }

    /// Required fields still unset, in declaration order
    #[must_use]
    pub fn missing_fields(&self) -> Vec<StepField> {
        StepField::REQUIRED
            .into_iter()
            .filter(|field| match field {
                StepField::Description => self.description.is_none(),
                StepField::Decision => self.decision.is_none(),
                StepField::SuccessOutcome => self.success_outcome.is_none(),
                StepField::FailureOutcome => self.failure_outcome.is_none(),
                _ => false,
            })
            .collect()
    }

    /// Drafting until every required field is set
    #[must_use]
    pub fn state(&self) -> StepState {
        if self.missing_fields().is_empty() {
            StepState::Complete
        } else {
            StepState::Drafting
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete(id: &str) -> Step {
        Step::new(id)
            .unwrap()
            .with_description("Spread the butter evenly")
            .with_decision("Is the bread covered?")
            .with_success_outcome("Covered")
            .with_failure_outcome("Patchy")
    }

    #[test]
    fn step_id_is_case_insensitive() {
        let a = StepId::new("Gather Ingredients").unwrap();
        let b = StepId::new("  gather ingredients ").unwrap();
        assert_eq!(a, b);
        assert_eq!(b.as_str(), "gather ingredients");
        assert!(a.matches("GATHER INGREDIENTS"));
    }

    #[test]
    fn step_id_rejects_blank_and_end() {
        assert_eq!(
            StepId::new("   ").unwrap_err(),
            GraphError::EmptyField { field: "id" }
        );
        assert!(matches!(
            StepId::new("end"),
            Err(GraphError::ReservedId { .. })
        ));
    }

    #[test]
    fn next_step_parses_end_in_any_case() {
        assert_eq!(NextStep::parse("END").unwrap(), NextStep::End);
        assert_eq!(NextStep::parse(" end ").unwrap(), NextStep::End);
        let next = NextStep::parse("Go to Store").unwrap();
        assert_eq!(next.step_id().map(StepId::as_str), Some("Go to Store"));
        assert!(NextStep::parse("").is_err());
    }

    #[test]
    fn draft_becomes_complete_once_required_fields_set() {
        let mut step = Step::new("Toast").unwrap();
        assert_eq!(step.state(), StepState::Drafting);
        assert_eq!(step.missing_fields().len(), 4);

        step.apply(StepUpdate::Description("Toast both slices".into()))
            .unwrap();
        step.apply(StepUpdate::Decision("Is it golden?".into()))
            .unwrap();
        step.apply(StepUpdate::SuccessOutcome("Golden".into()))
            .unwrap();
        assert_eq!(step.missing_fields(), vec![StepField::FailureOutcome]);
        step.apply(StepUpdate::FailureOutcome("Burnt".into()))
            .unwrap();

        // pointers stay unset; completeness does not depend on them
        assert_eq!(step.state(), StepState::Complete);
        assert!(step.next_on_success().is_none());
    }

    #[test]
    fn blank_required_update_leaves_step_unchanged() {
        let mut step = complete("Butter");
        let before = step.clone();
        let err = step
            .apply(StepUpdate::Decision("  ".into()))
            .unwrap_err();
        assert_eq!(err, GraphError::EmptyField { field: "decision" });
        assert_eq!(step, before);
    }

    #[test]
    fn optional_text_clears_on_blank() {
        let mut step = complete("Butter").with_retry_logic("retry twice");
        assert_eq!(step.retry_logic(), Some("retry twice"));
        step.apply(StepUpdate::RetryLogic(Some(String::new())))
            .unwrap();
        assert_eq!(step.retry_logic(), None);
    }

    #[test]
    fn successors_skip_end_and_unset() {
        let step = complete("Butter")
            .with_next_on_success(NextStep::step("Assemble").unwrap())
            .with_next_on_failure(NextStep::End);
        let ids: Vec<_> = step.successors().map(StepId::as_str).collect();
        assert_eq!(ids, vec!["Assemble"]);
        assert!(step.points_to(&StepId::new("assemble").unwrap()));
    }

    #[test]
    fn serializes_ids_as_plain_strings() {
        let step = complete("Butter").with_next_on_failure(NextStep::End);
        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json["id"], "Butter");
        assert_eq!(json["next_on_failure"], "End");
        assert!(json["next_on_success"].is_null());

        let back: Step = serde_json::from_value(json).unwrap();
        assert_eq!(back, step);
    }
}
