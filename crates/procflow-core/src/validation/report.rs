//! Findings and the report that collects them

use crate::note::NoteId;
use crate::step::{StepField, StepId};
use serde::Serialize;
use std::fmt;

/// How serious a finding is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Advisory; does not block building
    Warning,
    /// Blocks building
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => f.write_str("warning"),
            Self::Error => f.write_str("error"),
        }
    }
}

/// Stable identifier of the check that produced a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
#[allow(missing_docs)]
pub enum RuleCode {
    EmptyGraph,
    DuplicateStepId,
    DuplicateNoteId,
    IncompleteStep,
    DescriptionTooShort,
    DecisionNotQuestion,
    NoteLength,
    UnsetNextStep,
    UnresolvedReference,
    DanglingNoteLink,
    NoteLinkMismatch,
    DanglingNoteTarget,
    OrphanNote,
    UnreachableStep,
    NoPathToEnd,
    MultipleEntrySteps,
}

impl RuleCode {
    /// Kebab-case code as printed and serialized
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EmptyGraph => "empty-graph",
            Self::DuplicateStepId => "duplicate-step-id",
            Self::DuplicateNoteId => "duplicate-note-id",
            Self::IncompleteStep => "incomplete-step",
            Self::DescriptionTooShort => "description-too-short",
            Self::DecisionNotQuestion => "decision-not-question",
            Self::NoteLength => "note-length",
            Self::UnsetNextStep => "unset-next-step",
            Self::UnresolvedReference => "unresolved-reference",
            Self::DanglingNoteLink => "dangling-note-link",
            Self::NoteLinkMismatch => "note-link-mismatch",
            Self::DanglingNoteTarget => "dangling-note-target",
            Self::OrphanNote => "orphan-note",
            Self::UnreachableStep => "unreachable-step",
            Self::NoPathToEnd => "no-path-to-end",
            Self::MultipleEntrySteps => "multiple-entry-steps",
        }
    }

    /// Severity every finding of this rule carries
    #[must_use]
    pub fn severity(self) -> Severity {
        match self {
            Self::DescriptionTooShort
            | Self::DecisionNotQuestion
            | Self::NoteLength
            | Self::OrphanNote => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for RuleCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One problem found in a graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    /// Error or warning
    pub severity: Severity,
    /// Check that produced it
    pub rule: RuleCode,
    /// Step concerned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<StepId>,
    /// Note concerned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<NoteId>,
    /// Field concerned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<StepField>,
    /// Human-readable explanation
    pub message: String,
}

impl Finding {
    pub(crate) fn new(rule: RuleCode, message: impl Into<String>) -> Self {
        Self {
            severity: rule.severity(),
            rule,
            step: None,
            note: None,
            field: None,
            message: message.into(),
        }
    }

    pub(crate) fn at_step(mut self, step: &StepId) -> Self {
        self.step = Some(step.clone());
        self
    }

    pub(crate) fn at_note(mut self, note: &NoteId) -> Self {
        self.note = Some(note.clone());
        self
    }

    pub(crate) fn at_field(mut self, field: StepField) -> Self {
        self.field = Some(field);
        self
    }

    /// Whether the finding blocks building
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.severity, self.rule)?;
        if let Some(step) = &self.step {
            write!(f, " step '{step}'")?;
        }
        if let Some(note) = &self.note {
            write!(f, " note '{note}'")?;
        }
        if let Some(field) = self.field {
            write!(f, " ({field})")?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Ordered findings of one validation run
///
/// Findings appear in pass order, and within a pass in step insertion
/// order, so two runs over the same graph produce identical reports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    findings: Vec<Finding>,
}

impl ValidationReport {
    pub(crate) fn push(&mut self, finding: Finding) {
        self.findings.push(finding);
    }

    /// Every finding, in order
    #[must_use]
    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    /// Error findings, in order
    pub fn errors(&self) -> impl Iterator<Item = &Finding> + '_ {
        self.findings.iter().filter(|f| f.is_error())
    }

    /// Warning findings, in order
    pub fn warnings(&self) -> impl Iterator<Item = &Finding> + '_ {
        self.findings.iter().filter(|f| !f.is_error())
    }

    /// Number of errors
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    /// Number of warnings
    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    /// Whether any finding blocks building
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.findings.iter().any(Finding::is_error)
    }

    /// Whether there are no findings at all
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    /// Findings of one rule
    pub fn with_rule(&self, rule: RuleCode) -> impl Iterator<Item = &Finding> + '_ {
        self.findings.iter().filter(move |f| f.rule == rule)
    }

    /// Whether a rule fired
    #[must_use]
    pub fn contains(&self, rule: RuleCode) -> bool {
        self.with_rule(rule).next().is_some()
    }

    /// One-line summary
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{} error(s), {} warning(s)",
            self.error_count(),
            self.warning_count()
        )
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for finding in &self.findings {
            writeln!(f, "{finding}")?;
        }
        write!(f, "{}", self.summary())
    }
}

impl<'a> IntoIterator for &'a ValidationReport {
    type Item = &'a Finding;
    type IntoIter = std::slice::Iter<'a, Finding>;

    fn into_iter(self) -> Self::IntoIter {
        self.findings.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_is_fixed_per_rule() {
        assert_eq!(RuleCode::OrphanNote.severity(), Severity::Warning);
        assert_eq!(RuleCode::NoPathToEnd.severity(), Severity::Error);
        assert_eq!(RuleCode::MultipleEntrySteps.as_str(), "multiple-entry-steps");
    }

    #[test]
    fn report_counts_and_formats() {
        let mut report = ValidationReport::default();
        assert!(report.is_clean());
        let step = StepId::new("Toast").unwrap();
        report.push(
            Finding::new(RuleCode::UnsetNextStep, "failure pointer is unset")
                .at_step(&step)
                .at_field(StepField::NextOnFailure),
        );
        report.push(Finding::new(RuleCode::DecisionNotQuestion, "should end with '?'").at_step(&step));

        assert!(report.has_errors());
        assert_eq!(report.summary(), "1 error(s), 1 warning(s)");
        assert_eq!(
            report.findings()[0].to_string(),
            "error [unset-next-step] step 'Toast' (next_on_failure): failure pointer is unset"
        );
    }

    #[test]
    fn serializes_codes_in_kebab_case() {
        let finding = Finding::new(RuleCode::EmptyGraph, "graph has no steps");
        let json = serde_json::to_value(&finding).unwrap();
        assert_eq!(json["rule"], "empty-graph");
        assert_eq!(json["severity"], "error");
        assert!(json.get("step").is_none());
    }
}
