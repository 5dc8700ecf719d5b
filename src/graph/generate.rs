//! Example generation: exhaustive expansion of an intent graph into sentences.
//!
//! Walks every simple start→final path and renders it to an [`Example`]:
//! the intent name (from the first edge's `__label__` output label), the
//! space-joined words along the path, and the path itself in upstream node
//! ids. Enumeration is lazy — one example is produced at a time, so peak
//! memory stays bounded even for heavily branching grammars.
//!
//! Path count grows combinatorially with grammar branching (optionals and
//! alternatives multiply). That is inherent to exhaustive expansion and
//! accepted here: generation is the offline training step.

use std::collections::HashSet;

use petgraph::graph::NodeIndex;

use crate::error::{GraphError, GraphResult};

use super::{INTENT_LABEL_PREFIX, IntentGraph, NodeId};

/// One rendered grammar sentence: intent name, sentence text, and the
/// graph path that produced it.
///
/// `text` is the raw space-joined word sequence; normalization is applied
/// when the example becomes a candidate-table key, not here.
#[derive(Debug, Clone, PartialEq)]
pub struct Example {
    /// Bare intent name, `__label__` prefix stripped.
    pub intent: String,
    /// Space-joined words along the path.
    pub text: String,
    /// The full path in upstream node ids, start node first, final node last.
    pub path: Vec<NodeId>,
}

/// Lazily enumerate every simple start→final path as an [`Example`].
///
/// Fails immediately with [`GraphError::MissingStartEnd`] when the graph
/// lacks unique start/final markers. Per-path malformations (a missing
/// intent label, a degenerate two-node path) surface as `Err` items.
pub fn generate_examples(graph: &IntentGraph) -> GraphResult<Examples<'_>> {
    let (start, end) = graph.start_end()?;
    tracing::debug!("generating examples");
    Ok(Examples::new(graph, start, end))
}

/// Iterator over all simple start→final paths of an [`IntentGraph`].
///
/// Depth-first with a per-path visited set: paths in a DAG diverge and
/// reconverge, so nodes are only excluded while they are on the current
/// path, never globally. Successors are visited in upstream-id order,
/// making enumeration order independent of edge insertion order.
pub struct Examples<'g> {
    graph: &'g IntentGraph,
    end: NodeIndex,
    /// Current path under construction (petgraph indices).
    path: Vec<NodeIndex>,
    /// Nodes on the current path.
    on_path: HashSet<NodeIndex>,
    /// One successor cursor per node on the path.
    cursors: Vec<std::vec::IntoIter<NodeIndex>>,
}

impl<'g> Examples<'g> {
    fn new(graph: &'g IntentGraph, start: NodeIndex, end: NodeIndex) -> Self {
        Self {
            graph,
            end,
            path: vec![start],
            on_path: HashSet::from([start]),
            cursors: vec![graph.successors(start).into_iter()],
        }
    }

    /// Render the current path (plus the final node) into an `Example`.
    fn render(&self, full_path: &[NodeIndex]) -> GraphResult<Example> {
        let first = full_path[0];
        let second = full_path[1];
        if full_path.len() <= 2 {
            return Err(GraphError::DegeneratePath {
                from: self.graph.node_id(first),
                to: self.graph.node_id(second),
            });
        }

        // First edge carries the intent label.
        let intent = self
            .graph
            .olabel(first, second)
            .and_then(|l| l.strip_prefix(INTENT_LABEL_PREFIX))
            .filter(|name| !name.is_empty())
            .map(str::to_owned)
            .ok_or(GraphError::MissingIntentLabel {
                from: self.graph.node_id(first),
                to: self.graph.node_id(second),
            })?;

        let words: Vec<&str> = full_path
            .iter()
            .filter_map(|&idx| self.graph.word(idx))
            .collect();

        Ok(Example {
            intent,
            text: words.join(" "),
            path: full_path.iter().map(|&idx| self.graph.node_id(idx)).collect(),
        })
    }
}

impl Iterator for Examples<'_> {
    type Item = GraphResult<Example>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(cursor) = self.cursors.last_mut() {
            match cursor.next() {
                Some(child) if child == self.end => {
                    let mut full_path = self.path.clone();
                    full_path.push(child);
                    return Some(self.render(&full_path));
                }
                Some(child) => {
                    if self.on_path.insert(child) {
                        self.path.push(child);
                        self.cursors.push(self.graph.successors(child).into_iter());
                    }
                }
                None => {
                    self.cursors.pop();
                    if let Some(node) = self.path.pop() {
                        self.on_path.remove(&node);
                    }
                }
            }
        }
        None
    }
}
