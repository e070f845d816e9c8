//! Level and placement: constant gain and a constant-power stereo panner.

use core::f64::consts::FRAC_1_SQRT_2;

use crate::graph::{NodeId, Render, Signals};

/// Multiplies its input by a constant.
#[derive(Debug, Clone)]
pub struct Gain {
    input: NodeId,
    gain: f64,
}

impl Gain {
    /// Scales `input` by `gain`.
    pub fn new(input: NodeId, gain: f64) -> Self {
        Self { input, gain }
    }

    /// Linear gain factor.
    pub fn gain(&self) -> f64 {
        self.gain
    }

    /// Sets the linear gain factor.
    pub fn set_gain(&mut self, gain: f64) {
        self.gain = gain;
    }
}

impl Render for Gain {
    fn render(&mut self, out: &mut [f64], signals: &Signals<'_>) -> bool {
        let Some(input) = signals.input(Some(self.input)) else {
            out.fill(0.0);
            return true;
        };
        for (i, o) in out.iter_mut().enumerate() {
            *o = self.gain * input.sample(i);
        }
        true
    }

    fn inputs(&self, into: &mut Vec<NodeId>) {
        into.push(self.input);
    }
}

/// Left and right gains for pan position `p` in `[-1, 1]`.
///
/// `-1` is hard left, `1` hard right. `l² + r²` is `1` at the extremes and
/// `1/2` in the centre, where each side sits at `1/√2`.
#[inline]
pub fn pan_gains(p: f64) -> (f64, f64) {
    let p = p.clamp(-1.0, 1.0);
    let norm = FRAC_1_SQRT_2 / (1.0 + p * p).sqrt();
    (norm * (1.0 - p), norm * (1.0 + p))
}

/// Places a mono input in a stereo field. The output block is interleaved
/// left/right, twice the block size.
#[derive(Debug, Clone)]
pub struct Pan {
    input: NodeId,
    pan: f64,
    left: f64,
    right: f64,
}

impl Pan {
    /// Pans `input` to position `pan`, clamped to `[-1, 1]`.
    pub fn new(input: NodeId, pan: f64) -> Self {
        let mut node = Self {
            input,
            pan: 0.0,
            left: 0.0,
            right: 0.0,
        };
        node.set_pan(pan);
        node
    }

    /// Current position.
    pub fn pan(&self) -> f64 {
        self.pan
    }

    /// Moves the source; takes effect from the next block.
    pub fn set_pan(&mut self, pan: f64) {
        self.pan = pan.clamp(-1.0, 1.0);
        (self.left, self.right) = pan_gains(self.pan);
    }
}

impl Render for Pan {
    fn render(&mut self, out: &mut [f64], signals: &Signals<'_>) -> bool {
        let Some(input) = signals.input(Some(self.input)) else {
            out.fill(0.0);
            return true;
        };
        for (i, frame) in out.chunks_exact_mut(2).enumerate() {
            let x = input.sample(i);
            frame[0] = self.left * x;
            frame[1] = self.right * x;
        }
        true
    }

    fn inputs(&self, into: &mut Vec<NodeId>) {
        into.push(self.input);
    }

    fn channels(&self) -> usize {
        2
    }
}
