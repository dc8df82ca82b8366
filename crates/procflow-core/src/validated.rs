//! Sealed view of a buildable graph
//!
//! [`ValidatedProcess`] can only be obtained from
//! [`ProcessGraph::finalize`], which hands it out when every step is
//! complete and validation found no errors. Renderers accept nothing else.

use crate::graph::{ProcessGraph, TopologicalSnapshot};
use crate::note::Note;
use crate::step::{Step, StepId};
use crate::validation::{Finding, ValidationReport};
use tracing::{debug, warn};

/// A graph that passed validation, borrowed for rendering
#[derive(Debug, Clone)]
pub struct ValidatedProcess<'g> {
    graph: &'g ProcessGraph,
    report: ValidationReport,
}

impl<'g> ValidatedProcess<'g> {
    pub(crate) fn new(graph: &'g ProcessGraph, report: ValidationReport) -> Self {
        Self { graph, report }
    }

    /// Process identifier
    #[must_use]
    pub fn name(&self) -> &'g str {
        self.graph.name()
    }

    /// Underlying graph
    #[must_use]
    pub fn graph(&self) -> &'g ProcessGraph {
        self.graph
    }

    /// Report that cleared the graph; holds warnings only
    #[must_use]
    pub fn report(&self) -> &ValidationReport {
        &self.report
    }

    /// Warnings carried over from validation
    pub fn warnings(&self) -> impl Iterator<Item = &Finding> + '_ {
        self.report.warnings()
    }

    /// Entry step
    #[must_use]
    pub fn entry_step(&self) -> Option<&'g Step> {
        self.graph.entry_step()
    }

    /// Entry step id
    #[must_use]
    pub fn entry_id(&self) -> Option<&'g StepId> {
        self.entry_step().map(Step::id)
    }

    /// Steps in insertion order
    pub fn steps(&self) -> impl ExactSizeIterator<Item = &'g Step> + 'g {
        self.graph.steps()
    }

    /// Notes in insertion order
    pub fn notes(&self) -> impl ExactSizeIterator<Item = &'g Note> + 'g {
        self.graph.notes()
    }

    /// Steps breadth-first from the entry step; visits every step
    #[must_use]
    pub fn traverse(&self) -> TopologicalSnapshot<'g> {
        self.graph.topological_snapshot()
    }

    /// Note linked from a step
    #[must_use]
    pub fn note_for(&self, step: &Step) -> Option<&'g Note> {
        self.graph.note_for(step)
    }
}

impl ProcessGraph {
    /// Validate and, when buildable, seal the graph for rendering
    ///
    /// # Errors
    /// The validation report when it holds any error finding. Unfinished
    /// steps always produce errors, so a sealed graph has no drafts.
    pub fn finalize(&mut self) -> Result<ValidatedProcess<'_>, ValidationReport> {
        let report = self.validate().clone();
        if report.has_errors() {
            warn!(process = self.name(), summary = %report.summary(), "graph is not buildable");
            return Err(report);
        }
        debug!(process = self.name(), warnings = report.warning_count(), "graph finalized");
        Ok(ValidatedProcess::new(self, report))
    }
}
