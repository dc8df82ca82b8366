//! Process graph
//!
//! Ordered collection of steps and notes with identity and reference
//! bookkeeping. Mutations are atomic: each one checks its preconditions
//! before touching state, so a refused call leaves the graph exactly as it
//! was.

use crate::config::GraphConfig;
use crate::error::{EntityKind, GraphError, Result};
use crate::note::{Note, NoteId};
use crate::record::{NoteRecord, StepRecord};
use crate::step::{normalize, NextStep, Outcome, Step, StepId, StepUpdate};
use crate::validation::{ValidationReport, Validator};
use indexmap::IndexMap;
use std::collections::VecDeque;
use tracing::{debug, warn};

/// What `remove_step` does when other steps still point at the target
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RemovalPolicy {
    /// Fail with `GraphError::Referenced`
    #[default]
    Refuse,
    /// Re-point every referencing edge to `End`, then remove
    UnlinkToEnd,
}

/// A business process as a directed graph of decision steps
#[derive(Debug, Clone)]
pub struct ProcessGraph {
    name: String,
    config: GraphConfig,
    /// Keyed by normalized step id, in insertion order
    steps: IndexMap<String, Step>,
    notes: IndexMap<NoteId, Note>,
    entry: Option<String>,
    /// Later rows of duplicated ids from direct construction
    shadowed_steps: Vec<Step>,
    shadowed_notes: Vec<Note>,
    report: Option<ValidationReport>,
}

impl ProcessGraph {
    /// Create an empty graph with default configuration
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, GraphConfig::default())
    }

    /// Create an empty graph with explicit configuration
    #[must_use]
    pub fn with_config(name: impl Into<String>, config: GraphConfig) -> Self {
        Self {
            name: name.into(),
            config,
            steps: IndexMap::new(),
            notes: IndexMap::new(),
            entry: None,
            shadowed_steps: Vec::new(),
            shadowed_notes: Vec::new(),
            report: None,
        }
    }

    /// Build a graph directly from importer rows
    ///
    /// Rows are converted in order and handed to
    /// [`from_parts`](Self::from_parts).
    ///
    /// # Errors
    /// A row whose own shape is invalid (blank or reserved id, blank note
    /// content).
    pub fn from_records<S, N>(
        name: impl Into<String>,
        config: GraphConfig,
        steps: S,
        notes: N,
    ) -> Result<Self>
    where
        S: IntoIterator<Item = StepRecord>,
        N: IntoIterator<Item = NoteRecord>,
    {
        let steps = steps
            .into_iter()
            .map(StepRecord::into_step)
            .collect::<Result<Vec<_>>>()?;
        let notes = notes
            .into_iter()
            .map(NoteRecord::into_note)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::from_parts(name, config, steps, notes))
    }

    /// Build a graph directly from converted steps and notes
    ///
    /// The first step becomes the entry step. Unlike
    /// [`add_step`](Self::add_step), repeated ids are not refused: the
    /// first occurrence wins and later ones are kept aside so that
    /// validation reports them.
    #[must_use]
    pub fn from_parts<S, N>(name: impl Into<String>, config: GraphConfig, steps: S, notes: N) -> Self
    where
        S: IntoIterator<Item = Step>,
        N: IntoIterator<Item = Note>,
    {
        let mut graph = Self::with_config(name, config);
        for step in steps {
            let key = step.id().key().to_string();
            if graph.steps.contains_key(&key) {
                debug!(step = %step.id(), "shadowing duplicate step row");
                graph.shadowed_steps.push(step);
                continue;
            }
            if graph.entry.is_none() {
                graph.entry = Some(key.clone());
            }
            graph.steps.insert(key, step);
        }
        for note in notes {
            if graph.notes.contains_key(note.id()) {
                debug!(note = %note.id(), "shadowing duplicate note row");
                graph.shadowed_notes.push(note);
                continue;
            }
            graph.notes.insert(note.id().clone(), note);
        }
        debug!(
            process = %graph.name,
            steps = graph.steps.len(),
            notes = graph.notes.len(),
            "graph constructed from rows"
        );
        graph
    }

    /// Process identifier
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Configuration the graph was created with
    #[inline]
    #[must_use]
    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Number of steps
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the graph has no steps
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Steps in insertion order
    pub fn steps(&self) -> impl ExactSizeIterator<Item = &Step> + '_ {
        self.steps.values()
    }

    /// Notes in insertion order
    pub fn notes(&self) -> impl ExactSizeIterator<Item = &Note> + '_ {
        self.notes.values()
    }

    /// Duplicate step rows retained from direct construction
    #[must_use]
    pub fn shadowed_steps(&self) -> &[Step] {
        &self.shadowed_steps
    }

    /// Duplicate note rows retained from direct construction
    #[must_use]
    pub fn shadowed_notes(&self) -> &[Note] {
        &self.shadowed_notes
    }

    /// The first step authored
    #[must_use]
    pub fn entry_step(&self) -> Option<&Step> {
        self.entry.as_ref().and_then(|key| self.steps.get(key))
    }

    /// Whether a step with this id exists
    #[must_use]
    pub fn contains_step(&self, id: &str) -> bool {
        self.steps.contains_key(&normalize(id))
    }

    /// Whether a note with this id exists
    #[must_use]
    pub fn contains_note(&self, id: &str) -> bool {
        self.notes.contains_key(id.trim())
    }

    /// Insertion index of a step
    pub(crate) fn position(&self, id: &StepId) -> Option<usize> {
        self.steps.get_index_of(id.key())
    }

    pub(crate) fn step_at(&self, index: usize) -> Option<&Step> {
        self.steps.get_index(index).map(|(_, step)| step)
    }

    /// Add a step; the first step added becomes the entry step
    ///
    /// # Errors
    /// `DuplicateId` if a step with the same id (case-insensitive) exists.
    pub fn add_step(&mut self, step: Step) -> Result<()> {
        let key = step.id().key().to_string();
        if self.steps.contains_key(&key) {
            warn!(step = %step.id(), "refusing duplicate step");
            return Err(GraphError::duplicate(EntityKind::Step, step.id()));
        }
        if self.entry.is_none() {
            self.entry = Some(key.clone());
        }
        debug!(step = %step.id(), state = ?step.state(), "step added");
        self.steps.insert(key, step);
        self.invalidate();
        Ok(())
    }

    /// Look up a step
    ///
    /// # Errors
    /// `NotFound` if no step has this id.
    pub fn get_step(&self, id: &str) -> Result<&Step> {
        self.steps
            .get(&normalize(id))
            .ok_or_else(|| GraphError::not_found(EntityKind::Step, id.trim()))
    }

    /// Rewrite one field of a step in place
    ///
    /// # Errors
    /// - `NotFound` if no step has this id
    /// - `EmptyField` if a required text field is set blank
    pub fn update_step(&mut self, id: &str, update: StepUpdate) -> Result<()> {
        let field = update.field();
        let step = self
            .steps
            .get_mut(&normalize(id))
            .ok_or_else(|| GraphError::not_found(EntityKind::Step, id.trim()))?;
        step.apply(update)?;
        debug!(step = %step.id(), %field, "step updated");
        self.invalidate();
        Ok(())
    }

    /// Ids of other steps whose pointers target `id`, in insertion order
    #[must_use]
    pub fn referrers(&self, id: &StepId) -> Vec<&StepId> {
        self.steps
            .values()
            .filter(|step| step.id() != id && step.points_to(id))
            .map(Step::id)
            .collect()
    }

    /// Remove a step
    ///
    /// Notes related to the removed step become orphans. If the entry step
    /// is removed, the earliest remaining step takes its place.
    ///
    /// # Errors
    /// - `NotFound` if no step has this id
    /// - `Referenced` if other steps point at it and `policy` is
    ///   [`RemovalPolicy::Refuse`]
    pub fn remove_step(&mut self, id: &str, policy: RemovalPolicy) -> Result<Step> {
        let key = normalize(id);
        let target = self
            .steps
            .get(&key)
            .map(|step| step.id().clone())
            .ok_or_else(|| GraphError::not_found(EntityKind::Step, id.trim()))?;

        let referrers: Vec<String> = self
            .referrers(&target)
            .into_iter()
            .map(|r| r.key().to_string())
            .collect();

        if !referrers.is_empty() && policy == RemovalPolicy::Refuse {
            warn!(step = %target, referrers = referrers.len(), "refusing removal of referenced step");
            return Err(GraphError::Referenced {
                id: target.to_string(),
                referrers: referrers
                    .iter()
                    .filter_map(|k| self.steps.get(k))
                    .map(|s| s.id().to_string())
                    .collect(),
            });
        }

        for referrer in &referrers {
            if let Some(step) = self.steps.get_mut(referrer) {
                for outcome in Outcome::ALL {
                    let pointer = step.pointer_mut(outcome);
                    if pointer.as_ref().and_then(NextStep::step_id) == Some(&target) {
                        *pointer = Some(NextStep::End);
                    }
                }
                debug!(step = %step.id(), removed = %target, "edge re-pointed to End");
            }
        }

        let removed = self.steps.shift_remove(&key).ok_or_else(|| {
            GraphError::not_found(EntityKind::Step, target.as_str())
        })?;

        for note in self.notes.values_mut() {
            if note.related_step_id() == Some(&target) {
                note.set_related_step(None);
            }
        }

        if self.entry.as_deref() == Some(key.as_str()) {
            self.entry = self.steps.keys().next().cloned();
        }

        debug!(step = %target, "step removed");
        self.invalidate();
        Ok(removed)
    }

    /// Add a note
    ///
    /// The related step is not required to exist yet.
    ///
    /// # Errors
    /// `DuplicateId` if a note with the same id exists.
    pub fn add_note(&mut self, note: Note) -> Result<()> {
        if self.notes.contains_key(note.id()) {
            warn!(note = %note.id(), "refusing duplicate note");
            return Err(GraphError::duplicate(EntityKind::Note, note.id()));
        }
        debug!(note = %note.id(), "note added");
        self.notes.insert(note.id().clone(), note);
        self.invalidate();
        Ok(())
    }

    /// Look up a note
    ///
    /// # Errors
    /// `NotFound` if no note has this id.
    pub fn get_note(&self, id: &str) -> Result<&Note> {
        self.notes
            .get(id.trim())
            .ok_or_else(|| GraphError::not_found(EntityKind::Note, id.trim()))
    }

    /// Note linked from a step, if any
    #[must_use]
    pub fn note_for(&self, step: &Step) -> Option<&Note> {
        step.note_id().and_then(|id| self.notes.get(id))
    }

    /// Attach a note to a step, in both directions
    ///
    /// Any other step linking the note loses its link, and the step's
    /// previous note is detached from it, so both sides keep agreeing.
    ///
    /// # Errors
    /// `NotFound` if either the step or the note is absent.
    pub fn link_note(&mut self, step_id: &str, note_id: &str) -> Result<()> {
        let key = normalize(step_id);
        let step_id = self
            .steps
            .get(&key)
            .map(|step| step.id().clone())
            .ok_or_else(|| GraphError::not_found(EntityKind::Step, step_id.trim()))?;
        let note_id = self
            .notes
            .get(note_id.trim())
            .map(|note| note.id().clone())
            .ok_or_else(|| GraphError::not_found(EntityKind::Note, note_id.trim()))?;

        for step in self.steps.values_mut() {
            if step.id() != &step_id && step.note_id() == Some(&note_id) {
                step.set_note(None);
                debug!(step = %step.id(), note = %note_id, "note moved away from step");
            }
        }

        let previous = self
            .steps
            .get_mut(&key)
            .and_then(|step| step.set_note(Some(note_id.clone())));
        if let Some(old) = previous.filter(|old| old != &note_id) {
            if let Some(note) = self.notes.get_mut(&old) {
                if note.related_step_id() == Some(&step_id) {
                    note.set_related_step(None);
                }
            }
        }
        if let Some(note) = self.notes.get_mut(&note_id) {
            note.set_related_step(Some(step_id.clone()));
        }

        debug!(step = %step_id, note = %note_id, "note linked");
        self.invalidate();
        Ok(())
    }

    /// Clear a step's note link, returning the previous note id
    ///
    /// The note loses its related step too and becomes an orphan.
    ///
    /// # Errors
    /// `NotFound` if the step is absent.
    pub fn unlink_note(&mut self, step_id: &str) -> Result<Option<NoteId>> {
        let step = self
            .steps
            .get_mut(&normalize(step_id))
            .ok_or_else(|| GraphError::not_found(EntityKind::Step, step_id.trim()))?;
        let previous = step.set_note(None);
        let step_id = step.id().clone();
        if let Some(note) = previous.as_ref().and_then(|id| self.notes.get_mut(id)) {
            if note.related_step_id() == Some(&step_id) {
                note.set_related_step(None);
            }
        }
        debug!(step = %step_id, note = ?previous, "note unlinked");
        self.invalidate();
        Ok(previous)
    }

    /// Steps in breadth-first order from the entry step
    ///
    /// Lazy and finite: every reachable step is yielded exactly once,
    /// success branch before failure branch. Unreachable steps are not
    /// yielded.
    #[must_use]
    pub fn topological_snapshot(&self) -> TopologicalSnapshot<'_> {
        TopologicalSnapshot::new(self)
    }

    /// Validator configured from this graph's configuration
    #[must_use]
    pub fn validator(&self) -> Validator {
        Validator::new(self.config.clone())
    }

    /// Run the validation engine, reusing the cached report when the graph
    /// has not changed since the last run
    pub fn validate(&mut self) -> &ValidationReport {
        if self.report.is_none() {
            let report = self.validator().validate(self);
            self.report = Some(report);
        }
        self.report.get_or_insert_with(ValidationReport::default)
    }

    /// Latest report, if the graph has not changed since it was produced
    #[must_use]
    pub fn latest_report(&self) -> Option<&ValidationReport> {
        self.report.as_ref()
    }

    /// Read-only view for renderers and importers
    #[must_use]
    pub fn snapshot(&self) -> GraphSnapshot<'_> {
        GraphSnapshot {
            name: &self.name,
            steps: self.steps.values().collect(),
            notes: self.notes.values().collect(),
            entry_step: self.entry_step().map(Step::id),
            report: self.report.as_ref(),
        }
    }

    fn invalidate(&mut self) {
        self.report = None;
    }
}

/// Read-only view of a graph
#[derive(Debug, Clone)]
pub struct GraphSnapshot<'g> {
    /// Process identifier
    pub name: &'g str,
    /// Steps in insertion order
    pub steps: Vec<&'g Step>,
    /// Notes in insertion order
    pub notes: Vec<&'g Note>,
    /// Entry step id
    pub entry_step: Option<&'g StepId>,
    /// Latest validation report, if still current
    pub report: Option<&'g ValidationReport>,
}

/// Breadth-first walk from the entry step
///
/// Created by [`ProcessGraph::topological_snapshot`].
#[derive(Debug, Clone)]
pub struct TopologicalSnapshot<'g> {
    graph: &'g ProcessGraph,
    queue: VecDeque<usize>,
    seen: Vec<bool>,
}

impl<'g> TopologicalSnapshot<'g> {
    fn new(graph: &'g ProcessGraph) -> Self {
        let mut seen = vec![false; graph.len()];
        let mut queue = VecDeque::new();
        if let Some(entry) = graph.entry_step().and_then(|s| graph.position(s.id())) {
            seen[entry] = true;
            queue.push_back(entry);
        }
        Self { graph, queue, seen }
    }
}

impl<'g> Iterator for TopologicalSnapshot<'g> {
    type Item = &'g Step;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.queue.pop_front()?;
        let step = self.graph.step_at(index)?;
        for successor in step.successors() {
            if let Some(next) = self.graph.position(successor) {
                if !self.seen[next] {
                    self.seen[next] = true;
                    self.queue.push_back(next);
                }
            }
        }
        Some(step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(id: &str, success: &str, failure: &str) -> Step {
        Step::new(id)
            .unwrap()
            .with_description(format!("Carry out {id}"))
            .with_decision(format!("Did {id} work?"))
            .with_success_outcome("yes")
            .with_failure_outcome("no")
            .with_next_on_success(NextStep::parse(success).unwrap())
            .with_next_on_failure(NextStep::parse(failure).unwrap())
    }

    fn chain() -> ProcessGraph {
        let mut graph = ProcessGraph::new("chain");
        graph.add_step(step("A", "B", "End")).unwrap();
        graph.add_step(step("B", "C", "A")).unwrap();
        graph.add_step(step("C", "End", "End")).unwrap();
        graph
    }

    #[test]
    fn first_step_becomes_entry() {
        let graph = chain();
        assert_eq!(graph.entry_step().map(|s| s.id().as_str()), Some("A"));
        assert_eq!(graph.len(), 3);
    }

    #[test]
    fn duplicate_step_is_refused_without_side_effects() {
        let mut graph = chain();
        let before: Vec<Step> = graph.steps().cloned().collect();
        let err = graph.add_step(step("a", "End", "End")).unwrap_err();
        assert_eq!(
            err,
            GraphError::DuplicateId {
                kind: EntityKind::Step,
                id: "a".to_string()
            }
        );
        let after: Vec<Step> = graph.steps().cloned().collect();
        assert_eq!(before, after);
    }

    #[test]
    fn get_step_is_case_insensitive() {
        let graph = chain();
        assert_eq!(graph.get_step(" b ").unwrap().id().as_str(), "B");
        assert!(matches!(
            graph.get_step("Z"),
            Err(GraphError::NotFound { kind: EntityKind::Step, .. })
        ));
    }

    #[test]
    fn update_step_rewrites_pointer() {
        let mut graph = chain();
        graph
            .update_step("C", StepUpdate::NextOnFailure(Some(NextStep::step("A").unwrap())))
            .unwrap();
        let c = graph.get_step("C").unwrap();
        assert_eq!(c.next_on_failure(), Some(&NextStep::step("A").unwrap()));
        assert!(matches!(
            graph.update_step("Z", StepUpdate::Decision("?".into())),
            Err(GraphError::NotFound { .. })
        ));
    }

    #[test]
    fn remove_referenced_step_refused_by_default() {
        let mut graph = chain();
        graph.add_note(Note::new("N1", "Second pass of the chain").unwrap()).unwrap();
        graph.link_note("B", "N1").unwrap();
        let steps_before: Vec<Step> = graph.steps().cloned().collect();
        let notes_before: Vec<Note> = graph.notes().cloned().collect();

        let err = graph.remove_step("B", RemovalPolicy::default()).unwrap_err();
        assert_eq!(
            err,
            GraphError::Referenced {
                id: "B".to_string(),
                referrers: vec!["A".to_string()]
            }
        );
        let steps_after: Vec<Step> = graph.steps().cloned().collect();
        let notes_after: Vec<Note> = graph.notes().cloned().collect();
        assert_eq!(steps_before, steps_after);
        assert_eq!(notes_before, notes_after);
        assert_eq!(graph.entry_step().map(|s| s.id().as_str()), Some("A"));
    }

    #[test]
    fn absent_step_is_not_found() {
        let mut graph = chain();
        graph.add_note(Note::new("N1", "Check the fridge first").unwrap()).unwrap();

        assert!(matches!(
            graph.remove_step("Z", RemovalPolicy::UnlinkToEnd),
            Err(GraphError::NotFound { kind: EntityKind::Step, .. })
        ));
        assert!(matches!(
            graph.link_note("Z", "N1"),
            Err(GraphError::NotFound { kind: EntityKind::Step, .. })
        ));
        assert_eq!(graph.len(), 3);
        assert!(graph.get_note("N1").unwrap().related_step_id().is_none());
    }

    #[test]
    fn remove_with_unlink_repoints_to_end() {
        let mut graph = chain();
        let removed = graph.remove_step("C", RemovalPolicy::UnlinkToEnd).unwrap();
        assert_eq!(removed.id().as_str(), "C");
        let b = graph.get_step("B").unwrap();
        assert_eq!(b.next_on_success(), Some(&NextStep::End));
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn self_reference_does_not_block_removal() {
        let mut graph = chain();
        graph.add_step(step("Retry", "Retry", "End")).unwrap();
        assert!(graph.remove_step("Retry", RemovalPolicy::Refuse).is_ok());
    }

    #[test]
    fn removing_entry_promotes_next_step() {
        let mut graph = chain();
        graph.remove_step("A", RemovalPolicy::UnlinkToEnd).unwrap();
        assert_eq!(graph.entry_step().map(|s| s.id().as_str()), Some("B"));
        assert_eq!(
            graph.get_step("B").unwrap().next_on_failure(),
            Some(&NextStep::End)
        );
    }

    #[test]
    fn link_note_sets_both_directions() {
        let mut graph = chain();
        graph.add_note(Note::new("N1", "Check the fridge first").unwrap()).unwrap();
        graph.link_note("a", "N1").unwrap();

        let a = graph.get_step("A").unwrap();
        assert_eq!(a.note_id().map(NoteId::as_str), Some("N1"));
        let note = graph.get_note("N1").unwrap();
        assert_eq!(note.related_step_id().map(StepId::as_str), Some("A"));

        assert!(matches!(
            graph.link_note("A", "N9"),
            Err(GraphError::NotFound { kind: EntityKind::Note, .. })
        ));
        assert_eq!(graph.unlink_note("A").unwrap().map(|n| n.to_string()), Some("N1".into()));
        assert!(graph.get_step("A").unwrap().note_id().is_none());
        assert!(graph.get_note("N1").unwrap().related_step_id().is_none());
    }

    #[test]
    fn relinking_note_moves_both_ends() {
        let mut graph = chain();
        graph.add_note(Note::new("N1", "Check the fridge first").unwrap()).unwrap();
        graph.link_note("A", "N1").unwrap();
        graph.link_note("B", "N1").unwrap();

        assert_eq!(graph.get_step("A").unwrap().note_id(), None);
        assert_eq!(
            graph.get_step("B").unwrap().note_id().map(NoteId::as_str),
            Some("N1")
        );
        assert_eq!(
            graph.get_note("N1").unwrap().related_step_id().map(StepId::as_str),
            Some("B")
        );
    }

    #[test]
    fn linking_new_note_detaches_previous_one() {
        let mut graph = chain();
        graph.add_note(Note::new("N1", "Check the fridge first").unwrap()).unwrap();
        graph.add_note(Note::new("N2", "Use fresh bread").unwrap()).unwrap();
        graph.link_note("A", "N1").unwrap();
        graph.link_note("A", "N2").unwrap();

        assert_eq!(
            graph.get_step("A").unwrap().note_id().map(NoteId::as_str),
            Some("N2")
        );
        assert!(graph.get_note("N1").unwrap().related_step_id().is_none());
        assert_eq!(
            graph.get_note("N2").unwrap().related_step_id().map(StepId::as_str),
            Some("A")
        );
    }

    #[test]
    fn removing_step_orphans_its_notes() {
        let mut graph = chain();
        graph.add_note(Note::new("N1", "Keep it simple").unwrap()).unwrap();
        graph.link_note("C", "N1").unwrap();
        graph.remove_step("C", RemovalPolicy::UnlinkToEnd).unwrap();
        assert!(graph.get_note("N1").unwrap().related_step_id().is_none());
    }

    #[test]
    fn snapshot_walks_breadth_first_once() {
        let graph = chain();
        let order: Vec<_> = graph
            .topological_snapshot()
            .map(|s| s.id().as_str())
            .collect();
        assert_eq!(order, vec!["A", "B", "C"]);
    }

    #[test]
    fn snapshot_of_empty_graph_is_empty() {
        let graph = ProcessGraph::new("empty");
        assert_eq!(graph.topological_snapshot().count(), 0);
    }

    #[test]
    fn mutation_drops_cached_report() {
        let mut graph = chain();
        graph.validate();
        assert!(graph.latest_report().is_some());
        graph
            .update_step("A", StepUpdate::Description("Start the chain".into()))
            .unwrap();
        assert!(graph.latest_report().is_none());
        assert!(graph.snapshot().report.is_none());
    }
}
