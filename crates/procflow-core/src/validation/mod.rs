//! Validation engine
//!
//! Batch checker that turns a [`ProcessGraph`] into a [`ValidationReport`].
//! Structural problems are findings, never errors. Passes run in a fixed
//! order and each pass walks steps in insertion order:
//!
//! 1. shape: duplicate ids, unset required fields, style warnings
//! 2. references: outcome pointers and note links resolve and agree
//! 3. reachability from the entry step
//! 4. termination: every step has a path to `End`
//! 5. entry uniqueness

mod index;
mod report;

pub use report::{Finding, RuleCode, Severity, ValidationReport};

use crate::config::{GraphConfig, ValidationConfig};
use crate::graph::ProcessGraph;
use crate::step::{NextStep, Outcome, Step, StepField};
use index::FlowIndex;
use tracing::{debug, info, trace};

/// Structural checker for process graphs
#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: GraphConfig,
}

impl Validator {
    /// Create a validator
    #[must_use]
    pub fn new(config: GraphConfig) -> Self {
        Self { config }
    }

    /// Configuration in use
    #[must_use]
    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Run every pass over the graph
    #[must_use]
    pub fn validate(&self, graph: &ProcessGraph) -> ValidationReport {
        let mut report = ValidationReport::default();

        if graph.is_empty() {
            report.push(Finding::new(RuleCode::EmptyGraph, "process has no steps"));
        } else {
            self.shape_pass(graph, &mut report);
            self.pass_done("shape", &report);
            Self::reference_pass(graph, &mut report);
            self.pass_done("references", &report);

            let index = FlowIndex::build(graph);
            Self::reachability_pass(graph, &index, &mut report);
            self.pass_done("reachability", &report);
            Self::termination_pass(graph, &index, &mut report);
            self.pass_done("termination", &report);
            Self::entry_pass(graph, &index, &mut report);
            self.pass_done("entry", &report);
        }

        if self.config.verbose {
            for finding in &report {
                debug!(process = graph.name(), "{finding}");
            }
        }
        info!(
            process = graph.name(),
            steps = graph.len(),
            errors = report.error_count(),
            warnings = report.warning_count(),
            "validation complete"
        );
        report
    }

    fn pass_done(&self, pass: &'static str, report: &ValidationReport) {
        if self.config.verbose {
            trace!(pass, findings = report.findings().len(), "pass finished");
        }
    }

    fn shape_pass(&self, graph: &ProcessGraph, report: &mut ValidationReport) {
        for step in graph.shadowed_steps() {
            report.push(
                Finding::new(
                    RuleCode::DuplicateStepId,
                    format!("step id '{}' appears more than once", step.id()),
                )
                .at_step(step.id())
                .at_field(StepField::Id),
            );
        }
        for note in graph.shadowed_notes() {
            report.push(
                Finding::new(
                    RuleCode::DuplicateNoteId,
                    format!("note id '{}' appears more than once", note.id()),
                )
                .at_note(note.id()),
            );
        }

        let style = &self.config.validation;
        for step in graph.steps() {
            for field in step.missing_fields() {
                report.push(
                    Finding::new(RuleCode::IncompleteStep, format!("required field {field} is unset"))
                        .at_step(step.id())
                        .at_field(field),
                );
            }
            if style.style_checks {
                Self::step_style(step, style, report);
            }
        }

        if style.style_checks {
            for note in graph.notes() {
                let len = note.content().chars().count();
                if len < style.min_note_len || len > style.max_note_len {
                    report.push(
                        Finding::new(
                            RuleCode::NoteLength,
                            format!(
                                "note is {len} characters; expected {} to {}",
                                style.min_note_len, style.max_note_len
                            ),
                        )
                        .at_note(note.id()),
                    );
                }
            }
        }
    }

    fn step_style(step: &Step, style: &ValidationConfig, report: &mut ValidationReport) {
        if let Some(description) = step.description() {
            let len = description.chars().count();
            if len < style.min_description_len {
                report.push(
                    Finding::new(
                        RuleCode::DescriptionTooShort,
                        format!(
                            "description is {len} characters; at least {} expected",
                            style.min_description_len
                        ),
                    )
                    .at_step(step.id())
                    .at_field(StepField::Description),
                );
            }
        }
        if let Some(decision) = step.decision() {
            if !decision.ends_with('?') {
                report.push(
                    Finding::new(RuleCode::DecisionNotQuestion, "decision should end with '?'")
                        .at_step(step.id())
                        .at_field(StepField::Decision),
                );
            }
        }
    }

    fn reference_pass(graph: &ProcessGraph, report: &mut ValidationReport) {
        for step in graph.steps() {
            for outcome in Outcome::ALL {
                let field = outcome.pointer_field();
                match step.next(outcome) {
                    None => report.push(
                        Finding::new(RuleCode::UnsetNextStep, format!("{outcome} pointer is unset"))
                            .at_step(step.id())
                            .at_field(field),
                    ),
                    Some(NextStep::Step(target)) if !graph.contains_step(target.as_str()) => {
                        report.push(
                            Finding::new(
                                RuleCode::UnresolvedReference,
                                format!("{outcome} pointer names unknown step '{target}'"),
                            )
                            .at_step(step.id())
                            .at_field(field),
                        );
                    }
                    Some(_) => {}
                }
            }
            if let Some(note_id) = step.note_id() {
                match graph.get_note(note_id.as_str()) {
                    Err(_) => report.push(
                        Finding::new(
                            RuleCode::DanglingNoteLink,
                            format!("linked note '{note_id}' does not exist"),
                        )
                        .at_step(step.id())
                        .at_field(StepField::NoteId),
                    ),
                    Ok(note) if note.related_step_id() != Some(step.id()) => {
                        let attached = note
                            .related_step_id()
                            .map_or_else(|| "no step".to_string(), |s| format!("step '{s}'"));
                        report.push(
                            Finding::new(
                                RuleCode::NoteLinkMismatch,
                                format!("linked note '{note_id}' is attached to {attached}"),
                            )
                            .at_step(step.id())
                            .at_note(note_id)
                            .at_field(StepField::NoteId),
                        );
                    }
                    Ok(_) => {}
                }
            }
        }

        for note in graph.notes() {
            match note.related_step_id() {
                None => report.push(
                    Finding::new(RuleCode::OrphanNote, "note is not attached to any step")
                        .at_note(note.id()),
                ),
                Some(target) if !graph.contains_step(target.as_str()) => report.push(
                    Finding::new(
                        RuleCode::DanglingNoteTarget,
                        format!("note refers to unknown step '{target}'"),
                    )
                    .at_note(note.id()),
                ),
                Some(_) => {}
            }
        }
    }

    fn reachability_pass(graph: &ProcessGraph, index: &FlowIndex, report: &mut ValidationReport) {
        let reached = index.reachable_from_entry();
        for (step, seen) in graph.steps().zip(reached) {
            if !seen {
                report.push(
                    Finding::new(RuleCode::UnreachableStep, "step cannot be reached from the entry step")
                        .at_step(step.id()),
                );
            }
        }
    }

    fn termination_pass(graph: &ProcessGraph, index: &FlowIndex, report: &mut ValidationReport) {
        let reaches_end = index.reaches_end();
        let cycles = index.dead_end_cycles(&reaches_end);
        for (position, step) in graph.steps().enumerate() {
            if reaches_end[position] {
                continue;
            }
            let message = match cycles.iter().find(|cycle| cycle.contains(&position)) {
                Some(cycle) => {
                    let members: Vec<String> = cycle
                        .iter()
                        .filter_map(|&i| graph.step_at(i))
                        .map(|s| s.id().to_string())
                        .collect();
                    format!("no path to End; trapped in cycle {}", members.join(" -> "))
                }
                None => "no path to End".to_string(),
            };
            report.push(Finding::new(RuleCode::NoPathToEnd, message).at_step(step.id()));
        }
    }

    fn entry_pass(graph: &ProcessGraph, index: &FlowIndex, report: &mut ValidationReport) {
        let entry = graph.entry_step().map(Step::id);
        for (position, step) in graph.steps().enumerate() {
            if Some(step.id()) == entry || index.has_predecessor(position) {
                continue;
            }
            let entry_label = entry.map(ToString::to_string).unwrap_or_default();
            report.push(
                Finding::new(
                    RuleCode::MultipleEntrySteps,
                    format!("step has no predecessors but the entry step is '{entry_label}'"),
                )
                .at_step(step.id()),
            );
        }
    }
}

/// Validate a graph with its own configuration
#[must_use]
pub fn validate(graph: &ProcessGraph) -> ValidationReport {
    graph.validator().validate(graph)
}
