//! Intent path-graph: the compiled grammar as a directed acyclic word graph.
//!
//! The grammar compiler exports a node-link JSON document; [`IntentGraph`]
//! loads it into a `petgraph` structure and preserves the upstream node ids,
//! so paths handed to the reconstruction collaborator stay expressed in the
//! ids the compiler knows.
//!
//! - Nodes optionally carry a `word`; structural nodes (branch/merge points,
//!   optionals) carry none and render to nothing.
//! - Exactly one node is marked `start` and one `final`.
//! - Edges optionally carry an output label; the first edge of every path
//!   carries the intent label `__label__<name>`.

pub mod generate;

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};

use crate::error::{GraphError, GraphResult};

/// Prefix carried by the output label of each path's first edge.
pub const INTENT_LABEL_PREFIX: &str = "__label__";

/// Upstream identifier of a graph node, as assigned by the grammar compiler.
pub type NodeId = u64;

/// A node in the node-link JSON document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Upstream node id.
    pub id: NodeId,
    /// Word emitted when a path passes through this node. Structural nodes
    /// have no word (or an empty one, which is treated the same).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word: Option<String>,
    /// Marks the unique start node.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub start: bool,
    /// Marks the unique final node.
    #[serde(default, rename = "final", skip_serializing_if = "std::ops::Not::not")]
    pub is_final: bool,
}

impl Node {
    /// A wordless structural node.
    pub fn structural(id: NodeId) -> Self {
        Self {
            id,
            word: None,
            start: false,
            is_final: false,
        }
    }

    /// A word-emitting node.
    pub fn word(id: NodeId, word: impl Into<String>) -> Self {
        Self {
            id,
            word: Some(word.into()),
            start: false,
            is_final: false,
        }
    }

    /// Mark this node as the start node.
    pub fn with_start(mut self) -> Self {
        self.start = true;
        self
    }

    /// Mark this node as the final node.
    pub fn with_final(mut self) -> Self {
        self.is_final = true;
        self
    }
}

/// An edge in the node-link JSON document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    /// Upstream id of the source node.
    pub source: NodeId,
    /// Upstream id of the target node.
    pub target: NodeId,
    /// Output label. Intent labels (`__label__<name>`) ride on the first
    /// edge out of the start node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub olabel: Option<String>,
}

impl Edge {
    /// An unlabeled edge.
    pub fn new(source: NodeId, target: NodeId) -> Self {
        Self {
            source,
            target,
            olabel: None,
        }
    }

    /// An edge carrying an output label.
    pub fn labeled(source: NodeId, target: NodeId, olabel: impl Into<String>) -> Self {
        Self {
            source,
            target,
            olabel: Some(olabel.into()),
        }
    }
}

/// Node-link JSON document, as exported by the grammar compiler. Extra
/// top-level keys (`directed`, `multigraph`, `graph`) are ignored.
#[derive(Debug, Deserialize)]
struct NodeLink {
    #[serde(default)]
    nodes: Vec<Node>,
    #[serde(default)]
    links: Vec<Edge>,
}

/// The compiled grammar as a directed word graph.
///
/// Immutable for the duration of enumeration and recognition; retraining
/// builds a fresh graph rather than mutating in place.
#[derive(Debug, Default)]
pub struct IntentGraph {
    /// The directed graph: node weights keep the upstream attributes,
    /// edge weights keep the output label.
    graph: DiGraph<Node, Option<String>>,
    /// Upstream id → petgraph index, for edge resolution during load.
    node_index: HashMap<NodeId, NodeIndex>,
}

impl IntentGraph {
    /// Create an empty graph. Nodes and edges are added with
    /// [`add_node`](Self::add_node) / [`add_edge`](Self::add_edge).
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node. An empty `word` is normalized to no word at all.
    pub fn add_node(&mut self, mut node: Node) -> NodeIndex {
        if node.word.as_deref() == Some("") {
            node.word = None;
        }
        let id = node.id;
        let idx = self.graph.add_node(node);
        self.node_index.insert(id, idx);
        idx
    }

    /// Add an edge between two previously added nodes.
    pub fn add_edge(&mut self, edge: Edge) -> GraphResult<()> {
        let source = self.index_of(edge.source)?;
        let target = self.index_of(edge.target)?;
        self.graph.add_edge(source, target, edge.olabel);
        Ok(())
    }

    /// Load a graph from node-link JSON text.
    pub fn from_json_str(json: &str) -> GraphResult<Self> {
        let doc: NodeLink =
            serde_json::from_str(json).map_err(|source| GraphError::Json { source })?;
        Self::from_node_link(doc)
    }

    /// Load a graph from a node-link JSON reader (file or stdin).
    pub fn from_json_reader(mut reader: impl Read) -> GraphResult<Self> {
        let mut buf = String::new();
        reader
            .read_to_string(&mut buf)
            .map_err(|source| GraphError::Io { source })?;
        Self::from_json_str(&buf)
    }

    /// Load a graph from a node-link JSON file.
    pub fn from_json_file(path: &Path) -> GraphResult<Self> {
        let file = std::fs::File::open(path).map_err(|source| GraphError::Io { source })?;
        Self::from_json_reader(std::io::BufReader::new(file))
    }

    fn from_node_link(doc: NodeLink) -> GraphResult<Self> {
        let mut graph = Self::new();
        for node in doc.nodes {
            graph.add_node(node);
        }
        for edge in doc.links {
            graph.add_edge(edge)?;
        }
        tracing::debug!(
            nodes = graph.graph.node_count(),
            edges = graph.graph.edge_count(),
            "loaded intent graph"
        );
        Ok(graph)
    }

    /// Locate the unique start and final nodes.
    ///
    /// Fatal [`GraphError::MissingStartEnd`] when either marker is missing
    /// or not unique.
    pub fn start_end(&self) -> GraphResult<(NodeIndex, NodeIndex)> {
        let mut starts: Vec<NodeIndex> = Vec::new();
        let mut finals: Vec<NodeIndex> = Vec::new();
        for idx in self.graph.node_indices() {
            let node = &self.graph[idx];
            if node.start {
                starts.push(idx);
            }
            if node.is_final {
                finals.push(idx);
            }
        }
        match (starts.as_slice(), finals.as_slice()) {
            ([start], [end]) => Ok((*start, *end)),
            _ => Err(GraphError::MissingStartEnd {
                starts: starts.len(),
                finals: finals.len(),
            }),
        }
    }

    /// Petgraph index for an upstream node id.
    pub fn index_of(&self, id: NodeId) -> GraphResult<NodeIndex> {
        self.node_index
            .get(&id)
            .copied()
            .ok_or(GraphError::UnknownNode { id })
    }

    /// Upstream id of a node.
    pub fn node_id(&self, idx: NodeIndex) -> NodeId {
        self.graph[idx].id
    }

    /// Word emitted by a node, if any.
    pub fn word(&self, idx: NodeIndex) -> Option<&str> {
        self.graph[idx].word.as_deref()
    }

    /// Output label of the (first) edge between two nodes, if any.
    pub fn olabel(&self, from: NodeIndex, to: NodeIndex) -> Option<&str> {
        self.graph
            .find_edge(from, to)
            .and_then(|e| self.graph[e].as_deref())
    }

    /// Successors of a node, sorted by upstream id for reproducible
    /// enumeration regardless of edge insertion order.
    pub fn successors(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut out: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(idx, Direction::Outgoing)
            .collect();
        out.sort_by_key(|&n| self.graph[n].id);
        out.dedup();
        out
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_sentence_graph() -> IntentGraph {
        // start → this → is → a → test → final
        let mut g = IntentGraph::new();
        g.add_node(Node::structural(0).with_start());
        g.add_node(Node::word(1, "this"));
        g.add_node(Node::word(2, "is"));
        g.add_node(Node::word(3, "a"));
        g.add_node(Node::word(4, "test"));
        g.add_node(Node::structural(5).with_final());
        g.add_edge(Edge::labeled(0, 1, "__label__TestIntent")).unwrap();
        g.add_edge(Edge::new(1, 2)).unwrap();
        g.add_edge(Edge::new(2, 3)).unwrap();
        g.add_edge(Edge::new(3, 4)).unwrap();
        g.add_edge(Edge::new(4, 5)).unwrap();
        g
    }

    #[test]
    fn start_end_found() {
        let g = single_sentence_graph();
        let (start, end) = g.start_end().unwrap();
        assert_eq!(g.node_id(start), 0);
        assert_eq!(g.node_id(end), 5);
    }

    #[test]
    fn missing_start_is_fatal() {
        let mut g = IntentGraph::new();
        g.add_node(Node::word(0, "hello"));
        g.add_node(Node::structural(1).with_final());
        g.add_edge(Edge::new(0, 1)).unwrap();

        match g.start_end() {
            Err(GraphError::MissingStartEnd { starts: 0, finals: 1 }) => {}
            other => panic!("expected MissingStartEnd, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_start_is_fatal() {
        let mut g = IntentGraph::new();
        g.add_node(Node::structural(0).with_start());
        g.add_node(Node::structural(1).with_start());
        g.add_node(Node::structural(2).with_final());
        assert!(matches!(
            g.start_end(),
            Err(GraphError::MissingStartEnd { starts: 2, finals: 1 })
        ));
    }

    #[test]
    fn node_link_json_roundtrip_fields() {
        let json = r#"{
            "directed": true,
            "nodes": [
                {"id": 0, "start": true},
                {"id": 1, "word": "hello"},
                {"id": 2, "word": ""},
                {"id": 3, "final": true}
            ],
            "links": [
                {"source": 0, "target": 1, "olabel": "__label__Greet"},
                {"source": 1, "target": 2},
                {"source": 2, "target": 3}
            ]
        }"#;
        let g = IntentGraph::from_json_str(json).unwrap();
        assert_eq!(g.node_count(), 4);
        assert_eq!(g.edge_count(), 3);

        let (start, end) = g.start_end().unwrap();
        assert_eq!(g.node_id(start), 0);
        assert_eq!(g.node_id(end), 3);

        // Empty word normalizes to no word.
        let idx2 = g.index_of(2).unwrap();
        assert_eq!(g.word(idx2), None);

        let idx0 = g.index_of(0).unwrap();
        let idx1 = g.index_of(1).unwrap();
        assert_eq!(g.olabel(idx0, idx1), Some("__label__Greet"));
    }

    #[test]
    fn edge_to_unknown_node_rejected() {
        let mut g = IntentGraph::new();
        g.add_node(Node::structural(0).with_start());
        assert!(matches!(
            g.add_edge(Edge::new(0, 99)),
            Err(GraphError::UnknownNode { id: 99 })
        ));
    }

    #[test]
    fn successors_sorted_by_upstream_id() {
        let mut g = IntentGraph::new();
        g.add_node(Node::structural(0).with_start());
        g.add_node(Node::word(7, "late"));
        g.add_node(Node::word(3, "early"));
        g.add_node(Node::structural(9).with_final());
        // Insert the higher-id successor first.
        g.add_edge(Edge::new(0, 7)).unwrap();
        g.add_edge(Edge::new(0, 3)).unwrap();

        let start = g.index_of(0).unwrap();
        let succ: Vec<NodeId> = g.successors(start).iter().map(|&i| g.node_id(i)).collect();
        assert_eq!(succ, vec![3, 7]);
    }
}
