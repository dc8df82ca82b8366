//! Incremental edit protocol
//!
//! A step moves from [`StepState::Drafting`] to [`StepState::Complete`] as
//! its required fields are filled in. Outcome pointers are chosen through a
//! [`StepSelection`], which either names an existing step, reserves a new
//! title to be created later, or terminates the process. Forward references
//! created that way are listed by [`ProcessGraph::missing_steps`] until they
//! are authored.

use crate::error::{EntityKind, GraphError, Result};
use crate::graph::ProcessGraph;
use crate::note::NoteId;
use crate::step::{NextStep, Outcome, Step, StepId, END};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Authoring state of a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepState {
    /// One or more required fields unset
    Drafting,
    /// Every required field set
    Complete,
}

impl fmt::Display for StepState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Drafting => f.write_str("drafting"),
            Self::Complete => f.write_str("complete"),
        }
    }
}

/// Choice made when wiring an outcome pointer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepSelection {
    /// Point at a step that already exists
    Existing(StepId),
    /// Point at a step that will be authored later
    New(String),
    /// Terminate the process
    End,
}

impl StepSelection {
    /// Selection for an existing step
    ///
    /// # Errors
    /// See [`StepId::new`].
    pub fn existing(id: impl Into<String>) -> Result<Self> {
        StepId::new(id).map(Self::Existing)
    }

    /// Selection for a step still to be written
    #[must_use]
    pub fn new_step(title: impl Into<String>) -> Self {
        Self::New(title.into())
    }
}

impl fmt::Display for StepSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Existing(id) => write!(f, "{id}"),
            Self::New(title) => write!(f, "new step '{}'", title.trim()),
            Self::End => f.write_str(END),
        }
    }
}

/// Pointer whose target step has not been authored yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingStep {
    /// Step holding the pointer
    pub referenced_by: StepId,
    /// Branch of the pointer
    pub outcome: Outcome,
    /// Target that does not exist
    pub missing: StepId,
}

impl fmt::Display for MissingStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' ({} branch of '{}')",
            self.missing, self.outcome, self.referenced_by
        )
    }
}

impl ProcessGraph {
    /// Turn a selection into a pointer value
    ///
    /// # Errors
    /// - `NotFound` if an existing selection names an absent step
    /// - `DuplicateId` if a new selection names a step that already exists
    /// - `EmptyField` / `ReservedId` if a new title is not a valid id
    pub fn resolve_selection(&self, selection: &StepSelection) -> Result<NextStep> {
        match selection {
            StepSelection::End => Ok(NextStep::End),
            StepSelection::Existing(id) => {
                if self.contains_step(id.as_str()) {
                    Ok(NextStep::Step(id.clone()))
                } else {
                    Err(GraphError::not_found(EntityKind::Step, id))
                }
            }
            StepSelection::New(title) => {
                let id = StepId::new(title.as_str())?;
                if self.contains_step(id.as_str()) {
                    Err(GraphError::duplicate(EntityKind::Step, &id))
                } else {
                    Ok(NextStep::Step(id))
                }
            }
        }
    }

    /// Pointers naming steps that do not exist, in step order, success
    /// branch first, each target listed once
    #[must_use]
    pub fn missing_steps(&self) -> Vec<MissingStep> {
        let mut missing: Vec<MissingStep> = Vec::new();
        for step in self.steps() {
            for outcome in Outcome::ALL {
                let Some(target) = step.next(outcome).and_then(NextStep::step_id) else {
                    continue;
                };
                if self.contains_step(target.as_str())
                    || missing.iter().any(|m| &m.missing == target)
                {
                    continue;
                }
                missing.push(MissingStep {
                    referenced_by: step.id().clone(),
                    outcome,
                    missing: target.clone(),
                });
            }
        }
        missing
    }

    /// Steps still in drafting, in insertion order
    pub fn drafting_steps(&self) -> impl Iterator<Item = &Step> + '_ {
        self.steps()
            .filter(|step| step.state() == StepState::Drafting)
    }

    /// Whether the graph validates without errors
    pub fn is_buildable(&mut self) -> bool {
        !self.validate().has_errors()
    }

    /// First free identifier derived from `title`
    ///
    /// Returns the title itself when free, otherwise `title_2`, `title_3`,
    /// and so on.
    ///
    /// # Errors
    /// See [`StepId::new`].
    pub fn unique_step_id(&self, title: &str) -> Result<StepId> {
        let base = StepId::new(title)?;
        if !self.contains_step(base.as_str()) {
            return Ok(base);
        }
        let mut n = 2usize;
        loop {
            let candidate = StepId::new(format!("{base}_{n}"))?;
            if !self.contains_step(candidate.as_str()) {
                return Ok(candidate);
            }
            n += 1;
        }
    }

    /// Next free note id in the `N1`, `N2`, ... sequence
    #[must_use]
    pub fn next_note_id(&self) -> NoteId {
        let mut n = self.notes().len() + 1;
        loop {
            let candidate = NoteId::numbered(n);
            if !self.contains_note(candidate.as_str()) {
                return candidate;
            }
            n += 1;
        }
    }
}
