//! Engine: a graph, its dispatcher and a cached schedule for one root.
//!
//! [`Engine::tick()`] is the pull the device boundary performs once per
//! block: advance the tick counter, dispatch every tier, then expose the
//! root's block through [`Engine::output()`].

use parking_lot::{MappedRwLockReadGuard, RwLockReadGuard};

use crate::error::Result;

use super::dispatch::Dispatcher;
use super::node::{Node, NodeId, NodeKind};
use super::processing::Graph;
use super::schedule::{Schedule, resolve};

/// Owns a graph and drives it one block at a time.
pub struct Engine {
    graph: Graph,
    dispatcher: Dispatcher,
    root: NodeId,
    schedule: Schedule,
}

impl Engine {
    /// Creates an engine that renders `root`.
    pub fn new(graph: Graph, dispatcher: Dispatcher, root: NodeId) -> Result<Self> {
        let schedule = resolve(&graph, root)?;
        Ok(Self {
            graph,
            dispatcher,
            root,
            schedule,
        })
    }

    /// The underlying graph.
    #[inline]
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Mutable access to the graph. Call [`refresh()`](Self::refresh) after
    /// rewiring so the schedule picks up new nodes.
    #[inline]
    pub fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    /// The dispatcher used for every tick.
    #[inline]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// The current root node.
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The cached schedule.
    #[inline]
    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Interleaved channels of the root's output.
    pub fn channels(&self) -> usize {
        self.graph.nodes[self.root.index()].read().channels()
    }

    /// Adds a node to the graph. The schedule is unchanged until something
    /// reachable from the root reads the new node and the engine refreshes.
    pub fn add(&mut self, kind: impl Into<NodeKind>) -> Result<NodeId> {
        self.graph.add(kind)
    }

    /// Appends `input` to `mixer` and refreshes the schedule.
    pub fn connect(&mut self, mixer: NodeId, input: NodeId) -> Result<()> {
        self.graph.connect(mixer, input)?;
        self.refresh()
    }

    /// Re-resolves the schedule from the current root.
    pub fn refresh(&mut self) -> Result<()> {
        self.schedule = resolve(&self.graph, self.root)?;
        Ok(())
    }

    /// Switches the rendered node and resolves its schedule.
    ///
    /// On error the previous root and schedule stay in place.
    pub fn set_root(&mut self, root: NodeId) -> Result<()> {
        self.schedule = resolve(&self.graph, root)?;
        self.root = root;
        Ok(())
    }

    /// Advances the tick counter and prepares every scheduled node.
    /// Returns the tick that was run.
    pub fn tick(&mut self) -> Result<u64> {
        let tick = self.graph.next_tick();
        self.dispatcher.dispatch(&self.graph, &self.schedule, tick)?;
        Ok(tick)
    }

    /// The root's output block from the last tick.
    pub fn output(&self) -> MappedRwLockReadGuard<'_, [f64]> {
        // Nodes are never removed and the root was resolved, so the index is valid.
        RwLockReadGuard::map(self.graph.nodes[self.root.index()].read(), Node::samples)
    }

    /// Runs as many ticks as needed to produce `frames` frames of the root's
    /// output, interleaved by channel.
    pub fn render(&mut self, frames: usize) -> Result<Vec<f64>> {
        let wanted = frames * self.channels();
        let mut rendered = Vec::with_capacity(wanted);
        while rendered.len() < wanted {
            self.tick()?;
            let block = self.output();
            let take = (wanted - rendered.len()).min(block.len());
            rendered.extend_from_slice(&block[..take]);
        }
        Ok(rendered)
    }
}
