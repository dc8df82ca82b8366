//! Procflow Core
//!
//! In-memory model of a business process as a directed graph of decision
//! steps, plus the engine that decides whether such a graph is well-formed.
//!
//! # Overview
//!
//! - [`Step`]: a decision step with a success and a failure outcome
//! - [`Note`]: optional annotation attached to a step
//! - [`ProcessGraph`]: ordered steps and notes with identity bookkeeping
//! - [`Validator`]: batch structural checker producing a [`ValidationReport`]
//! - [`StepSelection`] / [`StepState`]: the incremental edit protocol
//!
//! # Example
//!
//! ```rust
//! use procflow_core::{NextStep, ProcessGraph, Step};
//!
//! let mut graph = ProcessGraph::new("make_a_sandwich");
//! let step = Step::new("Gather Ingredients")?
//!     .with_description("Collect bread, filling and condiments")
//!     .with_decision("Are all ingredients available?")
//!     .with_success_outcome("Everything is on the counter")
//!     .with_failure_outcome("Something is missing")
//!     .with_next_on_success(NextStep::End)
//!     .with_next_on_failure(NextStep::End);
//! graph.add_step(step)?;
//!
//! let report = graph.validate();
//! assert!(!report.has_errors());
//! # Ok::<(), procflow_core::GraphError>(())
//! ```

#![warn(unreachable_pub)]

// Core modules
pub mod config;
pub mod edit;
pub mod error;
pub mod graph;
pub mod note;
pub mod record;
pub mod step;
pub mod validated;
pub mod validation;

// Re-exports
pub use config::{GraphConfig, ValidationConfig};
pub use edit::{MissingStep, StepSelection, StepState};
pub use error::{EntityKind, GraphError, Result};
pub use graph::{GraphSnapshot, ProcessGraph, RemovalPolicy, TopologicalSnapshot};
pub use note::{Note, NoteId};
pub use record::{NoteRecord, StepRecord};
pub use step::{NextStep, Outcome, Step, StepField, StepId, StepUpdate};
pub use validated::ValidatedProcess;
pub use validation::{validate, Finding, RuleCode, Severity, ValidationReport, Validator};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for building and validating process graphs
    pub use crate::{
        GraphConfig, GraphError, NextStep, Note, NoteId, Outcome, ProcessGraph, RemovalPolicy,
        RuleCode, Severity, Step, StepId, StepSelection, StepState, StepUpdate, ValidatedProcess,
        ValidationReport, Validator,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
