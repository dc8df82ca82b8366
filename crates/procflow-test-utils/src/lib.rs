//! Testing utilities for the Procflow workspace
//!
//! Shared fixtures and step helpers.

#![allow(missing_docs)]
#![allow(clippy::missing_panics_doc)]

use procflow_core::{
    GraphConfig, NextStep, Note, NoteRecord, ProcessGraph, Step, StepRecord,
};

/// Name of the sandwich fixture process
pub const SANDWICH: &str = "make_a_sandwich";

/// (id, description, decision, success label, failure label, on success, on failure)
type Row = (&'static str, &'static str, &'static str, &'static str, &'static str, &'static str, &'static str);

const SANDWICH_ROWS: [Row; 14] = [
    ("Gather Ingredients", "Collect bread, filling and condiments", "Are all ingredients available?", "Everything is on the counter", "Something is missing", "Slice Bread", "Go to Store"),
    ("Go to Store", "Buy whatever is missing from the list", "Did the store have everything?", "Shopping done", "Store was out of stock", "Gather Ingredients", "End"),
    ("Slice Bread", "Cut two even slices from the loaf", "Are the slices even?", "Two good slices", "Slices are uneven", "Toast Bread", "Start Over"),
    ("Toast Bread", "Toast both slices until golden", "Is the toast golden?", "Golden toast", "Burnt toast", "Spread Butter", "Slice Bread"),
    ("Spread Butter", "Spread butter across both slices", "Is the butter spread evenly?", "Evenly buttered", "Butter is torn", "Add Filling", "Start Over"),
    ("Add Filling", "Layer the main filling on one slice", "Is there enough filling?", "Filling in place", "Ran out of filling", "Add Condiments", "Gather Ingredients"),
    ("Add Condiments", "Add sauces and seasoning to taste", "Were condiments added?", "Condiments added", "Skipped condiments", "Assemble Sandwich", "Assemble Sandwich"),
    ("Assemble Sandwich", "Close the sandwich with the second slice", "Does the sandwich hold together?", "Sandwich holds", "Filling falls out", "Cut Sandwich", "Add Filling"),
    ("Cut Sandwich", "Cut the sandwich diagonally in half", "Is the cut clean?", "Clean halves", "Ragged cut", "Plate Sandwich", "Plate Sandwich"),
    ("Plate Sandwich", "Place both halves on a clean plate", "Is the plate ready to serve?", "Plated", "Plate dropped", "Taste Test", "Clean Up"),
    ("Taste Test", "Take a small bite to check the flavour", "Does it taste right?", "Tastes great", "Tastes wrong", "Serve", "Start Over"),
    ("Serve", "Hand the plate to the hungry person", "Was the sandwich accepted?", "Sandwich accepted", "Sandwich refused", "Clean Up", "Clean Up"),
    ("Clean Up", "Wipe the counter and wash the knife", "Is the kitchen clean?", "Kitchen clean", "Mess remains", "End", "End"),
    ("Start Over", "Put the ingredients back and begin again", "Do you want to try again?", "Trying again", "Giving up", "Gather Ingredients", "End"),
];

const SANDWICH_NOTES: [(&str, &str, &str); 2] = [
    ("N1", "Check the pantry before going out.", "Gather Ingredients"),
    ("N2", "Medium heat keeps the crust even.", "Toast Bread"),
];

/// Complete step with plausible text and the given pointers
pub fn complete_step(id: &str, on_success: &str, on_failure: &str) -> Step {
    Step::new(id)
        .unwrap()
        .with_description(format!("Carry out the {id} step"))
        .with_decision(format!("Did {id} succeed?"))
        .with_success_outcome("Succeeded")
        .with_failure_outcome("Failed")
        .with_next_on_success(NextStep::parse(on_success).unwrap())
        .with_next_on_failure(NextStep::parse(on_failure).unwrap())
}

/// Step with only an identifier
pub fn draft_step(id: &str) -> Step {
    Step::new(id).unwrap()
}

/// Graph built by `add_step` from the given steps, in order
pub fn graph_of(name: &str, steps: impl IntoIterator<Item = Step>) -> ProcessGraph {
    let mut graph = ProcessGraph::new(name);
    for step in steps {
        graph.add_step(step).unwrap();
    }
    graph
}

/// Row records of the sandwich process
pub fn sandwich_records() -> (Vec<StepRecord>, Vec<NoteRecord>) {
    let note_for = |id: &str| {
        SANDWICH_NOTES
            .iter()
            .find(|(_, _, step)| *step == id)
            .map(|(note, _, _)| (*note).to_string())
    };
    let steps = SANDWICH_ROWS
        .iter()
        .map(|&(id, description, decision, success, failure, on_success, on_failure)| StepRecord {
            id: id.to_string(),
            description: description.to_string(),
            decision: decision.to_string(),
            success_outcome: success.to_string(),
            failure_outcome: failure.to_string(),
            note_id: note_for(id),
            next_on_success: on_success.to_string(),
            next_on_failure: on_failure.to_string(),
            ..StepRecord::default()
        })
        .collect();
    let notes = SANDWICH_NOTES
        .iter()
        .map(|&(id, content, step)| NoteRecord {
            id: id.to_string(),
            content: content.to_string(),
            related_step_id: Some(step.to_string()),
        })
        .collect();
    (steps, notes)
}

/// The 14-step sandwich process, authored through the graph API
///
/// Entry is "Gather Ingredients"; "Start Over" loops back to it on success
/// and ends the process on failure. Validates without findings.
pub fn sandwich_process() -> ProcessGraph {
    let (steps, _) = sandwich_records();
    let mut graph = ProcessGraph::new(SANDWICH);
    for mut record in steps {
        record.note_id = None;
        graph.add_step(record.into_step().unwrap()).unwrap();
    }
    for (id, content, step) in SANDWICH_NOTES {
        graph.add_note(Note::new(id, content).unwrap()).unwrap();
        graph.link_note(step, id).unwrap();
    }
    graph
}

/// The sandwich process built by direct construction
pub fn sandwich_from_records(config: GraphConfig) -> ProcessGraph {
    let (steps, notes) = sandwich_records();
    ProcessGraph::from_records(SANDWICH, config, steps, notes).unwrap()
}
