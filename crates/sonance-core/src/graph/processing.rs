//! Signal graph arena: construction, wiring and per-node access.
//!
//! [`Graph`] owns every node in a flat arena indexed by [`NodeId`]. Each node
//! sits behind its own `RwLock` so the dispatcher can prepare the nodes of one
//! tier in parallel while they read the already-prepared blocks of deeper
//! tiers. Nodes only reference nodes that already exist when they are added,
//! so a graph built with [`add()`](Graph::add) alone is acyclic;
//! [`connect()`](Graph::connect) is the one late-wiring operation and checks
//! for cycles before it appends.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{
    MappedRwLockReadGuard, MappedRwLockWriteGuard, RwLock, RwLockReadGuard, RwLockWriteGuard,
};

use crate::config::GraphConfig;
use crate::envelope::Envelope;
use crate::error::{GraphError, Result};
use crate::gain::Pan;
use crate::instrument::Instrument;
use crate::looper::{Freeze, Loop};
use crate::oscillator::Oscillator;

use super::node::{Node, NodeId, NodeKind, Signals};

/// Arena of signal nodes sharing one [`GraphConfig`].
///
/// # Usage
///
/// 1. Create a graph with [`new()`](Self::new)
/// 2. Add nodes leaves first with [`add()`](Self::add); constructors take the
///    IDs of the nodes they read from
/// 3. Resolve a schedule from the output node with
///    [`resolve()`](super::resolve)
/// 4. Run ticks through a [`Dispatcher`](super::Dispatcher), or wrap
///    everything in an [`Engine`](super::Engine)
pub struct Graph {
    pub(crate) nodes: Vec<RwLock<Node>>,
    config: GraphConfig,
    tick: AtomicU64,
}

impl Graph {
    /// Creates an empty graph after validating `config`.
    pub fn new(config: GraphConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            nodes: Vec::new(),
            config,
            tick: AtomicU64::new(0),
        })
    }

    /// Graph-wide settings.
    #[inline]
    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Sample rate in Hz.
    #[inline]
    pub fn sample_rate(&self) -> f64 {
        self.config.sample_rate
    }

    /// Frames per block.
    #[inline]
    pub fn block_size(&self) -> usize {
        self.config.block_size
    }

    /// Number of nodes in the arena.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if no nodes were added.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// True if `id` names a node in this graph.
    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    /// Adds a node and returns its ID.
    ///
    /// Every input the node declares must already exist. Nodes that cache a
    /// sample rate must have been built for this graph's rate, and a
    /// [`Delay`](crate::Delay) is given one block of this graph's size as
    /// headroom. A [`Tap`](crate::Tap) must point at a `Delay`; its offset is
    /// clamped to the delay's length.
    pub fn add(&mut self, kind: impl Into<NodeKind>) -> Result<NodeId> {
        let mut kind = kind.into();
        for input in kind.inputs() {
            self.get(input)?;
        }
        kind.attach(&self.config)?;
        if let NodeKind::Tap(tap) = &mut kind {
            let delay = tap.delay();
            let node = self.get(delay)?.read();
            match node.kind() {
                NodeKind::Delay(parent) => tap.clamp_offset(parent.frames()),
                _ => {
                    return Err(GraphError::WrongKind {
                        id: delay,
                        expected: "delay",
                    });
                }
            }
        }

        let id = NodeId(self.nodes.len() as u32);
        #[cfg(feature = "tracing")]
        tracing::debug!("graph_add: {} node {id}", kind.name());
        self.nodes.push(RwLock::new(Node::new(kind, &self.config)));
        Ok(id)
    }

    /// Appends `input` to a mixer's inputs after construction.
    ///
    /// Returns an error if either node doesn't exist, `mixer` is not a
    /// [`Mixer`](crate::Mixer), or `input` already reads from `mixer`
    /// (the new edge would close a cycle).
    pub fn connect(&mut self, mixer: NodeId, input: NodeId) -> Result<()> {
        self.get(mixer)?;
        self.get(input)?;
        if self.can_reach(input, mixer) {
            return Err(GraphError::CycleDetected);
        }
        let mut node = self.nodes[mixer.index()].write();
        let mix = node
            .kind_mut()
            .as_mixer_mut()
            .ok_or(GraphError::WrongKind {
                id: mixer,
                expected: "mixer",
            })?;
        mix.push(input);
        #[cfg(feature = "tracing")]
        tracing::debug!("graph_connect: {input} → {mixer}");
        Ok(())
    }

    /// Read access to a node.
    pub fn node(&self, id: NodeId) -> Option<RwLockReadGuard<'_, Node>> {
        self.nodes.get(id.index()).map(|lock| lock.read())
    }

    /// Write access to a node.
    pub fn node_mut(&self, id: NodeId) -> Option<RwLockWriteGuard<'_, Node>> {
        self.nodes.get(id.index()).map(|lock| lock.write())
    }

    /// Current output block of a node.
    pub fn samples(&self, id: NodeId) -> Option<MappedRwLockReadGuard<'_, [f64]>> {
        self.node(id)
            .map(|node| RwLockReadGuard::map(node, Node::samples))
    }

    /// Declared inputs of a node.
    pub fn inputs(&self, id: NodeId) -> Result<Vec<NodeId>> {
        Ok(self.get(id)?.read().inputs())
    }

    /// Enables a node.
    pub fn on(&self, id: NodeId) -> Result<()> {
        self.get(id)?.write().on();
        Ok(())
    }

    /// Disables a node.
    pub fn off(&self, id: NodeId) -> Result<()> {
        self.get(id)?.write().off();
        Ok(())
    }

    /// Prepares a single node for `tick`, reading whatever its inputs hold.
    ///
    /// The dispatcher calls this tier by tier; calling it directly is useful
    /// for tests and for nodes without inputs.
    pub fn prepare(&self, id: NodeId, tick: u64) -> Result<()> {
        self.get(id)?;
        self.prepare_node(id, tick);
        Ok(())
    }

    pub(crate) fn prepare_node(&self, id: NodeId, tick: u64) {
        if let Some(lock) = self.nodes.get(id.index()) {
            lock.write().prepare(tick, &Signals::new(&self.nodes));
        }
    }

    /// Advances the shared tick counter and returns the new tick.
    ///
    /// Every dispatch over this graph draws from the same counter, so two
    /// passes never share a tick.
    pub fn next_tick(&self) -> u64 {
        self.tick.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Most recently issued tick, 0 before the first.
    pub fn current_tick(&self) -> u64 {
        self.tick.load(Ordering::Relaxed)
    }

    // --- Typed access ---

    /// Envelope state of `id`, if it is an envelope.
    pub fn envelope_mut(&self, id: NodeId) -> Option<MappedRwLockWriteGuard<'_, Envelope>> {
        let guard = self.node_mut(id)?;
        RwLockWriteGuard::try_map(guard, |node| node.kind_mut().as_envelope_mut()).ok()
    }

    /// Oscillator state of `id`, if it is an oscillator.
    pub fn oscillator_mut(&self, id: NodeId) -> Option<MappedRwLockWriteGuard<'_, Oscillator>> {
        let guard = self.node_mut(id)?;
        RwLockWriteGuard::try_map(guard, |node| node.kind_mut().as_oscillator_mut()).ok()
    }

    /// Loop state of `id`, if it is a loop.
    pub fn looper_mut(&self, id: NodeId) -> Option<MappedRwLockWriteGuard<'_, Loop>> {
        let guard = self.node_mut(id)?;
        RwLockWriteGuard::try_map(guard, |node| node.kind_mut().as_loop_mut()).ok()
    }

    /// Freeze state of `id`, if it is a freeze.
    pub fn freeze_mut(&self, id: NodeId) -> Option<MappedRwLockWriteGuard<'_, Freeze>> {
        let guard = self.node_mut(id)?;
        RwLockWriteGuard::try_map(guard, |node| node.kind_mut().as_freeze_mut()).ok()
    }

    /// Pan state of `id`, if it is a panner.
    pub fn pan_mut(&self, id: NodeId) -> Option<MappedRwLockWriteGuard<'_, Pan>> {
        let guard = self.node_mut(id)?;
        RwLockWriteGuard::try_map(guard, |node| node.kind_mut().as_pan_mut()).ok()
    }

    /// Instrument state of `id`, if it is an instrument.
    pub fn instrument_mut(&self, id: NodeId) -> Option<MappedRwLockWriteGuard<'_, Instrument>> {
        let guard = self.node_mut(id)?;
        RwLockWriteGuard::try_map(guard, |node| node.kind_mut().as_instrument_mut()).ok()
    }

    // --- Internal helpers ---

    fn get(&self, id: NodeId) -> Result<&RwLock<Node>> {
        self.nodes
            .get(id.index())
            .ok_or(GraphError::NodeNotFound(id))
    }

    /// DFS reachability check: does `from` read `to`, directly or transitively?
    fn can_reach(&self, from: NodeId, to: NodeId) -> bool {
        let mut visited = vec![false; self.nodes.len()];
        let mut stack = vec![from];

        while let Some(current) = stack.pop() {
            if current == to {
                return true;
            }
            let idx = current.index();
            if idx >= visited.len() || visited[idx] {
                continue;
            }
            visited[idx] = true;
            stack.extend(self.nodes[idx].read().inputs());
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Gain, Mixer, Tap, Unit};

    fn graph() -> Graph {
        Graph::new(GraphConfig::new(1000.0, 8).unwrap()).unwrap()
    }

    #[test]
    fn test_add_assigns_sequential_ids() {
        let mut g = graph();
        let a = g.add(Unit::step(1.0)).unwrap();
        let b = g.add(Unit::step(2.0)).unwrap();
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(g.len(), 2);
    }

    #[test]
    fn test_add_rejects_missing_input() {
        let mut g = graph();
        let result = g.add(Gain::new(NodeId(3), 0.5));
        assert!(matches!(result, Err(GraphError::NodeNotFound(NodeId(3)))));
        assert!(g.is_empty());
    }

    #[test]
    fn test_tap_requires_delay_parent() {
        let mut g = graph();
        let src = g.add(Unit::step(1.0)).unwrap();
        let config = *g.config();
        let result = g.add(Tap::new(&config, src, core::time::Duration::from_millis(1)));
        assert!(matches!(
            result,
            Err(GraphError::WrongKind { expected: "delay", .. })
        ));
    }

    #[test]
    fn test_connect_rejects_cycle() {
        let mut g = graph();
        let mix = g.add(Mixer::new()).unwrap();
        let gain = g.add(Gain::new(mix, 0.5)).unwrap();
        assert!(matches!(
            g.connect(mix, gain),
            Err(GraphError::CycleDetected)
        ));
        // Self loop
        assert!(matches!(g.connect(mix, mix), Err(GraphError::CycleDetected)));
    }

    #[test]
    fn test_connect_requires_mixer() {
        let mut g = graph();
        let a = g.add(Unit::step(1.0)).unwrap();
        let b = g.add(Unit::step(1.0)).unwrap();
        assert!(matches!(
            g.connect(a, b),
            Err(GraphError::WrongKind { expected: "mixer", .. })
        ));
    }

    #[test]
    fn test_connect_appends_input() {
        let mut g = graph();
        let mix = g.add(Mixer::new()).unwrap();
        let a = g.add(Unit::step(1.0)).unwrap();
        g.connect(mix, a).unwrap();
        assert_eq!(g.inputs(mix).unwrap(), vec![a]);
    }

    #[test]
    fn test_typed_access_checks_kind() {
        let mut g = graph();
        let unit = g.add(Unit::step(1.0)).unwrap();
        assert!(g.envelope_mut(unit).is_none());
        assert!(g.oscillator_mut(NodeId(42)).is_none());
    }

    #[test]
    fn test_prepare_is_idempotent_per_tick() {
        let mut g = graph();
        let ramp = g.add(Unit::ramp(0.0, 1.0)).unwrap();
        g.prepare(ramp, 1).unwrap();
        let first: Vec<f64> = g.samples(ramp).unwrap().to_vec();
        g.prepare(ramp, 1).unwrap();
        assert_eq!(&*g.samples(ramp).unwrap(), first.as_slice());
        g.prepare(ramp, 2).unwrap();
        assert_eq!(g.samples(ramp).unwrap()[0], 8.0);
    }

    #[test]
    fn test_off_node_outputs_silence() {
        let mut g = graph();
        let unit = g.add(Unit::step(0.7)).unwrap();
        g.off(unit).unwrap();
        g.prepare(unit, 1).unwrap();
        assert!(g.samples(unit).unwrap().iter().all(|&x| x == 0.0));
        g.on(unit).unwrap();
        g.prepare(unit, 2).unwrap();
        assert!(g.samples(unit).unwrap().iter().all(|&x| x == 0.7));
    }

    #[test]
    fn test_next_tick_is_monotonic() {
        let g = graph();
        assert_eq!(g.current_tick(), 0);
        assert_eq!(g.next_tick(), 1);
        assert_eq!(g.next_tick(), 2);
        assert_eq!(g.current_tick(), 2);
    }
}
