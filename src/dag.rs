//! Stage dependency graph.
//!
//! Stages are nodes of a daggy DAG; an edge `a -> b` means `b` reads a product
//! of `a`. Cycles are rejected when the edge is added.

use crate::stages::StageKind;
use daggy::{Dag, NodeIndex, Walker};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

/// Error types for stage graph operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// Adding the edge would create a cycle
    CycleDetected { from: StageKind, to: StageKind },
    /// No stage with this id exists
    StageNotFound(StageId),
}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphError::CycleDetected { from, to } => write!(
                f,
                "Cycle detected: adding edge from {} to {} would create a cycle",
                from, to
            ),
            GraphError::StageNotFound(id) => write!(f, "Stage not found: {:?}", id),
        }
    }
}

impl std::error::Error for GraphError {}

/// Stage identifier, assigned in insertion order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StageId(pub usize);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageNode {
    pub id: StageId,
    pub kind: StageKind,
}

#[derive(Debug)]
pub struct StageGraph {
    dag: Dag<StageNode, ()>,
    id_to_index: Vec<NodeIndex>,
    index_to_id: HashMap<NodeIndex, StageId>,
}

impl StageGraph {
    pub fn new() -> Self {
        StageGraph {
            dag: Dag::new(),
            id_to_index: Vec::new(),
            index_to_id: HashMap::new(),
        }
    }

    /// The six analysis stages wired by the products they exchange:
    /// the monthly frame feeds seasonality and market share, and the
    /// seasonality stage derives the series the forecast reads.
    pub fn standard() -> Result<Self, GraphError> {
        let mut graph = StageGraph::new();
        let ids: HashMap<StageKind, StageId> = StageKind::ALL
            .iter()
            .map(|&kind| (kind, graph.add_stage(kind)))
            .collect();

        let edges = [
            (StageKind::MonthlyTrend, StageKind::Seasonality),
            (StageKind::Seasonality, StageKind::Forecast),
            (StageKind::MonthlyTrend, StageKind::MarketShare),
        ];
        for (from, to) in edges {
            graph.add_dependency(ids[&from], ids[&to])?;
        }
        Ok(graph)
    }

    pub fn add_stage(&mut self, kind: StageKind) -> StageId {
        let id = StageId(self.id_to_index.len());
        let index = self.dag.add_node(StageNode { id, kind });
        self.id_to_index.push(index);
        self.index_to_id.insert(index, id);
        id
    }

    /// Declares that `to` depends on `from`.
    pub fn add_dependency(&mut self, from: StageId, to: StageId) -> Result<(), GraphError> {
        let from_index = self.index_of(from)?;
        let to_index = self.index_of(to)?;

        match self.dag.add_edge(from_index, to_index, ()) {
            Ok(_) => Ok(()),
            Err(_would_cycle) => Err(GraphError::CycleDetected {
                from: self.dag[from_index].kind,
                to: self.dag[to_index].kind,
            }),
        }
    }

    pub fn stage(&self, id: StageId) -> Option<&StageNode> {
        self.id_to_index
            .get(id.0)
            .and_then(|&index| self.dag.node_weight(index))
    }

    pub fn stage_count(&self) -> usize {
        self.dag.node_count()
    }

    pub fn dependency_count(&self) -> usize {
        self.dag.edge_count()
    }

    /// Direct dependencies of a stage, lowest id first.
    pub fn parents(&self, id: StageId) -> Vec<StageId> {
        let Some(&index) = self.id_to_index.get(id.0) else {
            return Vec::new();
        };
        let mut parents: Vec<StageId> = self
            .dag
            .parents(index)
            .iter(&self.dag)
            .filter_map(|(_, parent)| self.index_to_id.get(&parent).copied())
            .collect();
        parents.sort();
        parents
    }

    /// Topological order using Kahn's algorithm.
    ///
    /// Among ready stages the lowest id runs first, so the order only depends
    /// on insertion order and the edges.
    pub fn execution_order(&self) -> Vec<StageNode> {
        let mut in_degree: Vec<usize> = vec![0; self.id_to_index.len()];
        for edge in self.dag.raw_edges() {
            if let Some(id) = self.index_to_id.get(&edge.target()) {
                in_degree[id.0] += 1;
            }
        }

        let mut ready: BinaryHeap<Reverse<StageId>> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, &degree)| degree == 0)
            .map(|(id, _)| Reverse(StageId(id)))
            .collect();

        let mut order = Vec::with_capacity(self.id_to_index.len());
        while let Some(Reverse(id)) = ready.pop() {
            let index = self.id_to_index[id.0];
            order.push(self.dag[index].clone());

            for (_, child) in self.dag.children(index).iter(&self.dag) {
                if let Some(child_id) = self.index_to_id.get(&child) {
                    in_degree[child_id.0] -= 1;
                    if in_degree[child_id.0] == 0 {
                        ready.push(Reverse(*child_id));
                    }
                }
            }
        }

        order
    }

    fn index_of(&self, id: StageId) -> Result<NodeIndex, GraphError> {
        self.id_to_index
            .get(id.0)
            .copied()
            .ok_or(GraphError::StageNotFound(id))
    }
}

impl Default for StageGraph {
    fn default() -> Self {
        Self::new()
    }
}
