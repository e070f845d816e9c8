//! Dependency resolution: weighted DFS from a root node into execution tiers.
//!
//! [`resolve()`] walks the root's declared inputs depth-first, giving each
//! node a weight equal to its longest discovered distance from the root. A
//! node reached again through a longer path takes the larger weight and its
//! subtree is walked again; a node reached through an equal or shorter path is
//! left alone. Because every input ends up with a strictly larger weight than
//! each of its consumers, running tiers from the highest weight down to the
//! root guarantees inputs are prepared first.
//!
//! The visited map is keyed by arena index, and the nodes on the current DFS
//! path are tracked so a cycle is reported as [`GraphError::CycleDetected`]
//! instead of recursing forever.

use core::ops::Range;

use crate::error::{GraphError, Result};

use super::node::NodeId;
use super::processing::Graph;

/// A node and its longest distance from the schedule's root.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dependency {
    /// The scheduled node.
    pub node: NodeId,
    /// Longest path length from the root; the root has weight 0.
    pub weight: usize,
}

/// Flat dependency list sorted by descending weight, grouped into tiers.
///
/// Nodes within a tier have equal weight and never read each other, so the
/// dispatcher may prepare them concurrently.
#[derive(Clone, Debug)]
pub struct Schedule {
    root: NodeId,
    dependencies: Vec<Dependency>,
    tiers: Vec<Range<usize>>,
}

impl Schedule {
    /// The node the schedule was resolved from.
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Every scheduled node, deepest first. Equal weights keep discovery order.
    #[inline]
    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    /// Tiers in execution order, from the deepest leaves to the root.
    pub fn tiers(&self) -> impl ExactSizeIterator<Item = &[Dependency]> + '_ {
        self.tiers.iter().map(|range| &self.dependencies[range.clone()])
    }

    /// Number of tiers.
    #[inline]
    pub fn tier_count(&self) -> usize {
        self.tiers.len()
    }

    /// Number of scheduled nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    /// Always false; a schedule contains at least its root.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    /// Weight assigned to `id`, if it is scheduled.
    pub fn weight_of(&self, id: NodeId) -> Option<usize> {
        self.dependencies
            .iter()
            .find(|dep| dep.node == id)
            .map(|dep| dep.weight)
    }
}

/// Resolves the execution order for everything reachable from `root`.
pub fn resolve(graph: &Graph, root: NodeId) -> Result<Schedule> {
    if !graph.contains(root) {
        return Err(GraphError::NodeNotFound(root));
    }

    let mut walk = Walk {
        graph,
        weights: vec![None; graph.len()],
        on_path: vec![false; graph.len()],
        order: Vec::new(),
    };
    walk.visit(root, 0)?;

    let Walk { weights, order, .. } = walk;
    let mut dependencies: Vec<Dependency> = order
        .into_iter()
        .filter_map(|node| {
            weights[node.index()].map(|weight| Dependency { node, weight })
        })
        .collect();
    // Stable: equal weights keep discovery order.
    dependencies.sort_by(|a, b| b.weight.cmp(&a.weight));

    let mut tiers = Vec::new();
    let mut start = 0;
    for i in 1..=dependencies.len() {
        if i == dependencies.len() || dependencies[i].weight != dependencies[start].weight {
            tiers.push(start..i);
            start = i;
        }
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(
        "graph_resolve: root {root}, {} nodes in {} tiers",
        dependencies.len(),
        tiers.len()
    );

    Ok(Schedule {
        root,
        dependencies,
        tiers,
    })
}

struct Walk<'g> {
    graph: &'g Graph,
    weights: Vec<Option<usize>>,
    on_path: Vec<bool>,
    order: Vec<NodeId>,
}

impl Walk<'_> {
    fn visit(&mut self, id: NodeId, weight: usize) -> Result<()> {
        let idx = id.index();
        if self.on_path[idx] {
            return Err(GraphError::CycleDetected);
        }
        match self.weights[idx] {
            Some(known) if known >= weight => return Ok(()),
            Some(_) => {}
            None => self.order.push(id),
        }
        self.weights[idx] = Some(weight);

        self.on_path[idx] = true;
        for input in self.graph.inputs(id)? {
            self.visit(input, weight + 1)?;
        }
        self.on_path[idx] = false;
        Ok(())
    }
}
