//! Mermaid flowchart output

use procflow_core::{NextStep, Outcome, Step, StepId, ValidatedProcess};
use std::collections::{HashMap, HashSet};
use std::fmt;

const START_NODE: &str = "Start";
const END_NODE: &str = "End";

/// Turn an identifier into a Mermaid node id
///
/// Keeps ASCII letters, digits, `_` and `-`; whitespace becomes `_`. The
/// result always starts with a letter and never collides with the
/// `Start`/`End` terminals.
#[must_use]
pub fn sanitize_id(raw: &str) -> String {
    let mut id: String = raw
        .trim()
        .chars()
        .filter_map(|c| match c {
            c if c.is_ascii_alphanumeric() || c == '_' || c == '-' => Some(c),
            c if c.is_whitespace() => Some('_'),
            _ => None,
        })
        .collect();
    let reserved = id.eq_ignore_ascii_case(START_NODE) || id.eq_ignore_ascii_case(END_NODE);
    if reserved || !id.starts_with(|c: char| c.is_ascii_alphabetic()) {
        id.insert(0, 'n');
    }
    id
}

/// Escape a label for use inside double quotes
fn label(text: &str) -> String {
    text.replace('"', "#quot;")
}

/// Node ids for steps, made unique where sanitizing collapses two ids
struct NodeIds {
    by_step: HashMap<StepId, String>,
}

impl NodeIds {
    fn new<'a>(steps: impl Iterator<Item = &'a Step>) -> Self {
        let mut used = HashSet::new();
        let mut by_step = HashMap::new();
        for step in steps {
            let base = sanitize_id(step.id().as_str());
            let mut candidate = base.clone();
            let mut n = 2;
            while !used.insert(candidate.clone()) {
                candidate = format!("{base}_{n}");
                n += 1;
            }
            by_step.insert(step.id().clone(), candidate);
        }
        Self { by_step }
    }

    fn get(&self, id: &StepId) -> &str {
        self.by_step.get(id).map_or(END_NODE, String::as_str)
    }

    fn target(&self, next: &NextStep) -> &str {
        match next {
            NextStep::End => END_NODE,
            NextStep::Step(id) => self.get(id),
        }
    }
}

/// Mermaid rendering of a process, written through [`fmt::Display`]
struct Flowchart<'p, 'g> {
    process: &'p ValidatedProcess<'g>,
    nodes: NodeIds,
}

impl fmt::Display for Flowchart<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { process, nodes } = self;
        writeln!(f, "graph TD")?;
        writeln!(f, "    {START_NODE}([Start])")?;
        for step in process.steps() {
            writeln!(f, "    {}[\"{}\"]", nodes.get(step.id()), label(step.id().as_str()))?;
        }
        writeln!(f, "    {END_NODE}([End])")?;

        if let Some(entry) = process.entry_id() {
            writeln!(f, "    {START_NODE} --> {}", nodes.get(entry))?;
        }
        for step in process.steps() {
            let from = nodes.get(step.id());
            for outcome in Outcome::ALL {
                let Some(next) = step.next(outcome) else {
                    continue;
                };
                let arrow = match outcome {
                    Outcome::Success => "-->",
                    Outcome::Failure => "-.->",
                };
                let text = step.outcome_label(outcome).unwrap_or_default();
                writeln!(f, "    {from} {arrow}|\"{}\"| {}", label(text), nodes.target(next))?;
            }
        }

        for note in process.notes() {
            let Some(step) = note.related_step_id() else {
                continue;
            };
            let id = format!("note_{}", sanitize_id(note.id().as_str()));
            writeln!(f, "    {id}[/\"{}\"/]", label(note.content()))?;
            writeln!(f, "    {} -.- {id}", nodes.get(step))?;
        }
        Ok(())
    }
}

/// Render a top-down flowchart
///
/// Success edges are solid, failure edges dotted; both carry the outcome
/// label. Linked notes hang off their step as side nodes.
#[must_use]
pub fn render(process: &ValidatedProcess<'_>) -> String {
    Flowchart {
        process,
        nodes: NodeIds::new(process.steps()),
    }
    .to_string()
}
