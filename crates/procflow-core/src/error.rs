//! Error types for Procflow Core
//!
//! Construction-time contract violations only. Structural problems of a
//! graph are never errors here; they are findings in a
//! [`ValidationReport`](crate::ValidationReport).

use std::fmt;

/// Kind of entity an identifier belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// A process step
    Step,
    /// A note attached to a step
    Note,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Step => f.write_str("step"),
            Self::Note => f.write_str("note"),
        }
    }
}

/// Errors raised synchronously by graph mutations
///
/// Every variant is recoverable by caller action: retry with different
/// input, cascade the removal, or fix the graph and re-validate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// Identifier already present in the graph
    #[error("{kind} '{id}' already exists")]
    DuplicateId {
        /// Entity kind
        kind: EntityKind,
        /// Offending identifier
        id: String,
    },

    /// Identifier absent from the graph
    #[error("{kind} '{id}' not found")]
    NotFound {
        /// Entity kind
        kind: EntityKind,
        /// Missing identifier
        id: String,
    },

    /// Step removal refused because other steps still point at it
    #[error("step '{id}' is still referenced by: {}", .referrers.join(", "))]
    Referenced {
        /// Step that was to be removed
        id: String,
        /// Steps whose outcome pointers target it, in insertion order
        referrers: Vec<String>,
    },

    /// Required field set to an empty value
    #[error("field '{field}' cannot be empty")]
    EmptyField {
        /// Field name
        field: &'static str,
    },

    /// Identifier collides with the `End` sentinel
    #[error("'{id}' is reserved for the End sentinel")]
    ReservedId {
        /// Offending identifier
        id: String,
    },
}

impl GraphError {
    pub(crate) fn duplicate(kind: EntityKind, id: impl fmt::Display) -> Self {
        Self::DuplicateId {
            kind,
            id: id.to_string(),
        }
    }

    pub(crate) fn not_found(kind: EntityKind, id: impl fmt::Display) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Identifier the error is about, when there is one
    #[must_use]
    pub fn entity_id(&self) -> Option<&str> {
        match self {
            Self::DuplicateId { id, .. }
            | Self::NotFound { id, .. }
            | Self::Referenced { id, .. }
            | Self::ReservedId { id } => Some(id),
            Self::EmptyField { .. } => None,
        }
    }

    /// Whether the caller can recover by changing its input
    ///
    /// Always true: no mutation leaves the graph in a partial state.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        true
    }

    /// Whether the caller should ask for a different identifier
    #[inline]
    #[must_use]
    pub fn needs_new_id(&self) -> bool {
        matches!(self, Self::DuplicateId { .. } | Self::ReservedId { .. })
    }
}

/// Result alias for graph operations
pub type Result<T, E = GraphError> = std::result::Result<T, E>;
