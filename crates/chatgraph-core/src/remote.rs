//! The remote graph dump model.
//!
//! A [`GraphDump`] is the raw node/edge listing returned by the remote graph
//! service. [`RemoteGraph`] indexes a dump into a petgraph [`DiGraph`] with a
//! remote-id lookup table, preserving the dump's node and edge order, and
//! exposes the MEMBER_OF structure the initial bulk load consumes.
//!
//! Dump edges keep their relation name as a plain `String`: dumps are
//! consumed leniently (a graph may carry relations this connector does not
//! manage), while signals this connector authors use the closed [`Relation`]
//! vocabulary.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

use crate::id::RemoteId;
use crate::signal::{NodeProperties, NodeType, Relation};

/// A full remote graph listing: every node and every edge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDump {
    #[serde(default)]
    pub nodes: Vec<RemoteNode>,
    #[serde(default)]
    pub edges: Vec<RemoteEdge>,
}

/// One node of the remote graph as it appears in a dump.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteNode {
    pub id: RemoteId,
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default)]
    pub properties: NodeProperties,
}

/// One edge of the remote graph as it appears in a dump.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteEdge {
    pub id: RemoteId,
    pub name: String,
    pub from: RemoteId,
    pub to: RemoteId,
}

impl RemoteEdge {
    pub fn is_member_of(&self) -> bool {
        self.name == Relation::MemberOf.as_str()
    }
}

/// An indexed view over a [`GraphDump`].
///
/// Edges whose endpoints are not present in the dump are dropped during
/// construction; the dump is the whole universe, so a dangling endpoint
/// cannot be resolved to anything.
#[derive(Debug)]
pub struct RemoteGraph {
    graph: DiGraph<RemoteNode, RemoteEdge>,
    index: HashMap<RemoteId, NodeIndex<u32>>,
}

impl RemoteGraph {
    pub fn from_dump(dump: &GraphDump) -> Self {
        let mut graph = DiGraph::with_capacity(dump.nodes.len(), dump.edges.len());
        let mut index = HashMap::with_capacity(dump.nodes.len());

        for node in &dump.nodes {
            let idx = graph.add_node(node.clone());
            index.insert(node.id.clone(), idx);
        }
        for edge in &dump.edges {
            if let (Some(&from), Some(&to)) = (index.get(&edge.from), index.get(&edge.to)) {
                graph.add_edge(from, to, edge.clone());
            }
        }

        RemoteGraph { graph, index }
    }

    /// Looks up a node by its remote id.
    pub fn node(&self, id: &RemoteId) -> Option<&RemoteNode> {
        self.index.get(id).and_then(|idx| self.graph.node_weight(*idx))
    }

    /// All nodes in dump order.
    pub fn nodes(&self) -> impl Iterator<Item = &RemoteNode> {
        self.graph.node_weights()
    }

    /// All MEMBER_OF edges in dump order.
    pub fn member_of_edges(&self) -> impl Iterator<Item = &RemoteEdge> {
        self.graph
            .edge_references()
            .map(|e| e.weight())
            .filter(|e| e.is_member_of())
    }

    /// The channels a user's node is a MEMBER_OF, in dump edge order.
    pub fn member_channels(&self, user: &RemoteId) -> Vec<&RemoteNode> {
        self.graph
            .edge_references()
            .filter(|e| {
                e.weight().is_member_of() && self.graph[e.source()].id == *user
            })
            .filter_map(|e| {
                let target = &self.graph[e.target()];
                (target.node_type == NodeType::Channel).then_some(target)
            })
            .collect()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}
