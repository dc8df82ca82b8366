//! Adjacency view of a process graph for the traversal passes

use crate::graph::ProcessGraph;
use crate::step::{NextStep, Outcome};
use petgraph::algo::tarjan_scc;
use petgraph::graphmap::DiGraphMap;
use petgraph::visit::{Bfs, Reversed};
use petgraph::Direction;

/// Node of the flow graph: a step by insertion index, or the terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) enum FlowNode {
    Step(usize),
    End,
}

/// Directed graph over resolved outcome pointers
///
/// Unset and unresolved pointers contribute no edge.
pub(crate) struct FlowIndex {
    graph: DiGraphMap<FlowNode, Outcome>,
    entry: Option<usize>,
    len: usize,
}

impl FlowIndex {
    pub(crate) fn build(process: &ProcessGraph) -> Self {
        let mut graph = DiGraphMap::new();
        graph.add_node(FlowNode::End);
        for (index, step) in process.steps().enumerate() {
            let from = FlowNode::Step(index);
            graph.add_node(from);
            for outcome in Outcome::ALL {
                let to = match step.next(outcome) {
                    Some(NextStep::End) => FlowNode::End,
                    Some(NextStep::Step(id)) => match process.position(id) {
                        Some(target) => FlowNode::Step(target),
                        None => continue,
                    },
                    None => continue,
                };
                // a shared target keeps the success label
                if !graph.contains_edge(from, to) {
                    graph.add_edge(from, to, outcome);
                }
            }
        }
        let entry = process
            .entry_step()
            .and_then(|step| process.position(step.id()));
        Self {
            graph,
            entry,
            len: process.len(),
        }
    }

    /// Steps visited by a breadth-first walk from the entry step
    pub(crate) fn reachable_from_entry(&self) -> Vec<bool> {
        let mut seen = vec![false; self.len];
        let Some(entry) = self.entry else {
            return seen;
        };
        let mut bfs = Bfs::new(&self.graph, FlowNode::Step(entry));
        while let Some(node) = bfs.next(&self.graph) {
            if let FlowNode::Step(index) = node {
                seen[index] = true;
            }
        }
        seen
    }

    /// Steps with some directed path to `End`
    ///
    /// Walks the reversed graph from the terminal, so every step is settled
    /// in one pass and cycles cannot loop.
    pub(crate) fn reaches_end(&self) -> Vec<bool> {
        let mut reaches = vec![false; self.len];
        let reversed = Reversed(&self.graph);
        let mut bfs = Bfs::new(reversed, FlowNode::End);
        while let Some(node) = bfs.next(reversed) {
            if let FlowNode::Step(index) = node {
                reaches[index] = true;
            }
        }
        reaches
    }

    /// Whether any other step points at this one
    pub(crate) fn has_predecessor(&self, index: usize) -> bool {
        let node = FlowNode::Step(index);
        self.graph
            .neighbors_directed(node, Direction::Incoming)
            .any(|from| from != node)
    }

    /// Cycles none of whose members can reach `End`, members in insertion
    /// order, cycles ordered by their first member
    pub(crate) fn dead_end_cycles(&self, reaches_end: &[bool]) -> Vec<Vec<usize>> {
        let mut cycles: Vec<Vec<usize>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter_map(|component| {
                let mut members: Vec<usize> = component
                    .iter()
                    .filter_map(|node| match node {
                        FlowNode::Step(index) => Some(*index),
                        FlowNode::End => None,
                    })
                    .collect();
                let cyclic = members.len() > 1
                    || members
                        .first()
                        .is_some_and(|&i| self.graph.contains_edge(FlowNode::Step(i), FlowNode::Step(i)));
                if !cyclic || members.iter().any(|&i| reaches_end[i]) {
                    return None;
                }
                members.sort_unstable();
                Some(members)
            })
            .collect();
        cycles.sort_unstable();
        cycles
    }
}
