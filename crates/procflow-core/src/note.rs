//! Note entity

use crate::error::{GraphError, Result};
use crate::step::StepId;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Note identifier (`N1`, `N2`, ... when allocated by the graph)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NoteId(String);

impl NoteId {
    /// Create a note identifier
    ///
    /// # Errors
    /// `EmptyField` if the identifier is blank.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(GraphError::EmptyField { field: "note_id" });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub(crate) fn numbered(n: usize) -> Self {
        Self(format!("N{n}"))
    }

    /// Identifier text
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for NoteId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for NoteId {
    type Error = GraphError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<NoteId> for String {
    fn from(value: NoteId) -> Self {
        value.0
    }
}

/// Free-text annotation attached to a step
///
/// A note without a related step is legal; validation reports it as a
/// warning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    id: NoteId,
    content: String,
    related_step_id: Option<StepId>,
}

impl Note {
    /// Create an unattached note
    ///
    /// # Errors
    /// `EmptyField` if the identifier or the content is blank.
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Result<Self> {
        let id = NoteId::new(id)?;
        let content = content.into();
        if content.trim().is_empty() {
            return Err(GraphError::EmptyField { field: "content" });
        }
        Ok(Self {
            id,
            content: content.trim().to_string(),
            related_step_id: None,
        })
    }

    /// With related step
    #[must_use]
    pub fn with_related_step(mut self, step_id: StepId) -> Self {
        self.related_step_id = Some(step_id);
        self
    }

    pub(crate) fn set_related_step(&mut self, step_id: Option<StepId>) {
        self.related_step_id = step_id;
    }

    /// Note identifier
    #[inline]
    #[must_use]
    pub fn id(&self) -> &NoteId {
        &self.id
    }

    /// Note text
    #[inline]
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Step the note annotates
    #[inline]
    #[must_use]
    pub fn related_step_id(&self) -> Option<&StepId> {
        self.related_step_id.as_ref()
    }
}
