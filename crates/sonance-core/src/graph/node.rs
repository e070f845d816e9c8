//! Node contract for the signal graph.
//!
//! Every processing unit is a [`Node`]: a [`NodeKind`] variant carrying its own
//! DSP state, plus the bookkeeping shared by all variants (output block,
//! sample rate, enabled flag, last-prepared tick). Variants read their inputs
//! through [`Signals`], which hands out read guards on other nodes' output
//! blocks; a node only ever writes its own block and counters.

use parking_lot::{MappedRwLockReadGuard, RwLock, RwLockReadGuard};

use crate::comb::Comb;
use crate::config::GraphConfig;
use crate::delay::{Delay, DelayLine, Tap};
use crate::envelope::{Damp, Drive, Envelope};
use crate::error::Result;
use crate::filter::{BandPass, LowPass};
use crate::gain::{Gain, Pan};
use crate::instrument::Instrument;
use crate::looper::{Freeze, Loop};
use crate::mixer::{Mixer, Ring};
use crate::oscillator::Oscillator;
use crate::unit::Unit;

/// Unique identifier for a node in the signal graph.
///
/// Node IDs are arena indices, assigned sequentially and never reused. Nodes
/// are never removed while the graph lives, so an ID stays valid for the
/// graph's lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Returns the arena index.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl core::fmt::Display for NodeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// Per-variant processing behavior.
pub(crate) trait Render {
    /// Fills `out` for one tick while the node is enabled.
    ///
    /// Returns `false` when the variant switched itself off during the block;
    /// it must then have zeroed the remainder of `out`.
    fn render(&mut self, out: &mut [f64], signals: &Signals<'_>) -> bool;

    /// Fills `out` while the node is disabled. Variants with counters that
    /// keep running while silent override this.
    fn silence(&mut self, out: &mut [f64]) {
        out.fill(0.0);
    }

    /// Nodes this variant reads from.
    fn inputs(&self, _into: &mut Vec<NodeId>) {}

    /// Interleaved channels in the output block.
    fn channels(&self) -> usize {
        1
    }

    /// Called when the node is switched on from outside.
    fn enabled(&mut self) {}

    /// Reconciles construction-time settings with the graph the node joins.
    /// Variants that cached a sample rate reject a mismatch.
    fn attach(&mut self, _config: &GraphConfig) -> Result<()> {
        Ok(())
    }
}

/// Read access to other nodes' output blocks during `prepare`.
pub(crate) struct Signals<'a> {
    nodes: &'a [RwLock<Node>],
}

impl<'a> Signals<'a> {
    pub(crate) fn new(nodes: &'a [RwLock<Node>]) -> Self {
        Self { nodes }
    }

    /// Locks an optional input for reading; `None` reads as absent.
    pub(crate) fn input(&self, id: Option<NodeId>) -> Option<Input<'a>> {
        let lock = self.nodes.get(id?.index())?;
        Some(Input {
            block: RwLockReadGuard::map(lock.read(), |node| node.out.as_slice()),
        })
    }

    /// Locks several optional inputs at once, taking one guard per distinct
    /// node. A node named in more than one slot is never read-locked twice,
    /// which could deadlock against a queued writer.
    pub(crate) fn inputs<const N: usize>(&self, ids: [Option<NodeId>; N]) -> Inputs<'a, N> {
        let mut locked: [Option<Input<'a>>; N] = core::array::from_fn(|_| None);
        let mut slot = [None; N];
        for i in 0..N {
            let Some(id) = ids[i] else { continue };
            if let Some(j) = (0..i).find(|&j| ids[j] == Some(id)) {
                slot[i] = slot[j];
                continue;
            }
            locked[i] = self.input(Some(id));
            slot[i] = Some(i);
        }
        Inputs { locked, slot }
    }

    /// Locks the delay line owned by a [`Delay`] node.
    pub(crate) fn delay_line(&self, id: NodeId) -> Option<MappedRwLockReadGuard<'a, DelayLine>> {
        let lock = self.nodes.get(id.index())?;
        RwLockReadGuard::try_map(lock.read(), |node| match &node.kind {
            NodeKind::Delay(delay) => Some(delay.line()),
            _ => None,
        })
        .ok()
    }
}

/// A locked input block.
pub(crate) struct Input<'a> {
    block: MappedRwLockReadGuard<'a, [f64]>,
}

impl Input<'_> {
    /// Sample `i` of the input, wrapping modulo the input's block length.
    #[inline]
    pub(crate) fn sample(&self, i: usize) -> f64 {
        self.block[i % self.block.len()]
    }
}

/// Inputs locked together by [`Signals::inputs`].
pub(crate) struct Inputs<'a, const N: usize> {
    locked: [Option<Input<'a>>; N],
    slot: [Option<usize>; N],
}

impl<'a, const N: usize> Inputs<'a, N> {
    /// The input requested in slot `i`, if present.
    #[inline]
    pub(crate) fn get(&self, i: usize) -> Option<&Input<'a>> {
        self.slot[i].and_then(|s| self.locked[s].as_ref())
    }
}

/// The closed set of node variants.
pub enum NodeKind {
    /// Constant, impulse or ramp source.
    Unit(Unit),
    /// Wavetable oscillator with modulation inputs.
    Oscillator(Oscillator),
    /// ADSR envelope.
    Envelope(Envelope),
    /// Exponential decay.
    Damp(Damp),
    /// Exponential rise.
    Drive(Drive),
    /// Recursive Gaussian low-pass.
    LowPass(LowPass),
    /// Two-pole resonant band-pass.
    BandPass(BandPass),
    /// Circular-buffer delay; owns the buffer its taps read.
    Delay(Delay),
    /// Feedback comb.
    Comb(Comb),
    /// Secondary read cursor into a [`Delay`]'s buffer.
    Tap(Tap),
    /// Record-and-replay buffer.
    Loop(Loop),
    /// Buffer captured eagerly at build time.
    Freeze(Freeze),
    /// Sum of inputs.
    Mixer(Mixer),
    /// Product of two inputs.
    Ring(Ring),
    /// Constant gain.
    Gain(Gain),
    /// Mono to stereo panner.
    Pan(Pan),
    /// Pass-through with a scheduled off.
    Instrument(Instrument),
}

impl NodeKind {
    /// Short variant name, used in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Unit(_) => "unit",
            Self::Oscillator(_) => "oscillator",
            Self::Envelope(_) => "envelope",
            Self::Damp(_) => "damp",
            Self::Drive(_) => "drive",
            Self::LowPass(_) => "lowpass",
            Self::BandPass(_) => "bandpass",
            Self::Delay(_) => "delay",
            Self::Comb(_) => "comb",
            Self::Tap(_) => "tap",
            Self::Loop(_) => "loop",
            Self::Freeze(_) => "freeze",
            Self::Mixer(_) => "mixer",
            Self::Ring(_) => "ring",
            Self::Gain(_) => "gain",
            Self::Pan(_) => "pan",
            Self::Instrument(_) => "instrument",
        }
    }

    /// Nodes this variant reads from.
    pub fn inputs(&self) -> Vec<NodeId> {
        let mut ids = Vec::new();
        self.render_ref().inputs(&mut ids);
        ids
    }

    fn render_ref(&self) -> &dyn Render {
        match self {
            Self::Unit(n) => n,
            Self::Oscillator(n) => n,
            Self::Envelope(n) => n,
            Self::Damp(n) => n,
            Self::Drive(n) => n,
            Self::LowPass(n) => n,
            Self::BandPass(n) => n,
            Self::Delay(n) => n,
            Self::Comb(n) => n,
            Self::Tap(n) => n,
            Self::Loop(n) => n,
            Self::Freeze(n) => n,
            Self::Mixer(n) => n,
            Self::Ring(n) => n,
            Self::Gain(n) => n,
            Self::Pan(n) => n,
            Self::Instrument(n) => n,
        }
    }

    fn render_mut(&mut self) -> &mut dyn Render {
        match self {
            Self::Unit(n) => n,
            Self::Oscillator(n) => n,
            Self::Envelope(n) => n,
            Self::Damp(n) => n,
            Self::Drive(n) => n,
            Self::LowPass(n) => n,
            Self::BandPass(n) => n,
            Self::Delay(n) => n,
            Self::Comb(n) => n,
            Self::Tap(n) => n,
            Self::Loop(n) => n,
            Self::Freeze(n) => n,
            Self::Mixer(n) => n,
            Self::Ring(n) => n,
            Self::Gain(n) => n,
            Self::Pan(n) => n,
            Self::Instrument(n) => n,
        }
    }

    pub(crate) fn attach(&mut self, config: &GraphConfig) -> Result<()> {
        self.render_mut().attach(config)
    }

    pub(crate) fn as_envelope_mut(&mut self) -> Option<&mut Envelope> {
        match self {
            Self::Envelope(env) => Some(env),
            _ => None,
        }
    }

    pub(crate) fn as_oscillator_mut(&mut self) -> Option<&mut Oscillator> {
        match self {
            Self::Oscillator(osc) => Some(osc),
            _ => None,
        }
    }

    pub(crate) fn as_loop_mut(&mut self) -> Option<&mut Loop> {
        match self {
            Self::Loop(lp) => Some(lp),
            _ => None,
        }
    }

    pub(crate) fn as_freeze_mut(&mut self) -> Option<&mut Freeze> {
        match self {
            Self::Freeze(frz) => Some(frz),
            _ => None,
        }
    }

    pub(crate) fn as_pan_mut(&mut self) -> Option<&mut Pan> {
        match self {
            Self::Pan(pan) => Some(pan),
            _ => None,
        }
    }

    pub(crate) fn as_instrument_mut(&mut self) -> Option<&mut Instrument> {
        match self {
            Self::Instrument(inst) => Some(inst),
            _ => None,
        }
    }

    pub(crate) fn as_mixer_mut(&mut self) -> Option<&mut Mixer> {
        match self {
            Self::Mixer(mix) => Some(mix),
            _ => None,
        }
    }
}

macro_rules! impl_from_variant {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for NodeKind {
                fn from(node: $variant) -> Self {
                    Self::$variant(node)
                }
            }
        )*
    };
}

impl_from_variant!(
    Unit, Oscillator, Envelope, Damp, Drive, LowPass, BandPass, Delay, Comb, Tap, Loop, Freeze,
    Mixer, Ring, Gain, Pan, Instrument,
);

/// A node in the graph arena: variant state plus shared bookkeeping.
pub struct Node {
    kind: NodeKind,
    out: Vec<f64>,
    channels: usize,
    sample_rate: f64,
    off: bool,
    last_tick: Option<u64>,
}

impl Node {
    pub(crate) fn new(kind: NodeKind, config: &GraphConfig) -> Self {
        let channels = kind.render_ref().channels();
        Self {
            kind,
            out: vec![0.0; config.block_size * channels],
            channels,
            sample_rate: config.sample_rate,
            off: false,
            last_tick: None,
        }
    }

    /// Interleaved channel count of the output block.
    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Sample rate in Hz.
    #[inline]
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Output block from the most recent `prepare`.
    #[inline]
    pub fn samples(&self) -> &[f64] {
        &self.out
    }

    /// Output sample `i`, wrapping modulo the block length.
    #[inline]
    pub fn sample_at(&self, i: usize) -> f64 {
        self.out[i % self.out.len()]
    }

    /// Enables the node.
    pub fn on(&mut self) {
        self.off = false;
        self.kind.render_mut().enabled();
    }

    /// Disables the node; it outputs silence from the next `prepare`.
    pub fn off(&mut self) {
        self.off = true;
    }

    /// True while disabled.
    #[inline]
    pub fn is_off(&self) -> bool {
        self.off
    }

    /// Nodes this node reads from, for dependency discovery.
    pub fn inputs(&self) -> Vec<NodeId> {
        self.kind.inputs()
    }

    /// Tick of the most recent `prepare`, if any.
    #[inline]
    pub fn last_tick(&self) -> Option<u64> {
        self.last_tick
    }

    /// Variant state.
    #[inline]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Mutable variant state.
    #[inline]
    pub fn kind_mut(&mut self) -> &mut NodeKind {
        &mut self.kind
    }

    /// Recomputes the output block for `tick`. A second call with the same
    /// tick is a no-op.
    pub(crate) fn prepare(&mut self, tick: u64, signals: &Signals<'_>) {
        if self.last_tick == Some(tick) {
            return;
        }
        self.last_tick = Some(tick);
        let render = self.kind.render_mut();
        if self.off {
            render.silence(&mut self.out);
        } else if !render.render(&mut self.out, signals) {
            self.off = true;
        }
    }
}
