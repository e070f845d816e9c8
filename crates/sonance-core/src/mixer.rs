//! Summing and multiplying nodes.

use crate::graph::{NodeId, Render, Signals};

/// Sums its inputs sample by sample, with no normalization.
///
/// A mixer with no inputs outputs silence. Inputs can be appended after the
/// mixer is in a graph with [`Graph::connect`](crate::Graph::connect).
#[derive(Debug, Clone)]
pub struct Mixer {
    inputs: Vec<NodeId>,
    channels: usize,
}

impl Mixer {
    /// Creates an empty mono mixer.
    pub fn new() -> Self {
        Self {
            inputs: Vec::new(),
            channels: 1,
        }
    }

    /// Creates a mono mixer over `inputs`.
    pub fn with_inputs(inputs: Vec<NodeId>) -> Self {
        Self {
            inputs,
            channels: 1,
        }
    }

    /// Makes the output block stereo interleaved. Every input should then be
    /// stereo too, e.g. a [`Pan`](crate::Pan).
    pub fn stereo(mut self) -> Self {
        self.channels = 2;
        self
    }

    /// Appends an input. Use [`Graph::connect`](crate::Graph::connect) once
    /// the mixer is in a graph.
    pub fn push(&mut self, input: NodeId) {
        self.inputs.push(input);
    }

    /// Current inputs, in summation order.
    pub fn sources(&self) -> &[NodeId] {
        &self.inputs
    }
}

impl Render for Mixer {
    fn render(&mut self, out: &mut [f64], signals: &Signals<'_>) -> bool {
        out.fill(0.0);
        for &id in &self.inputs {
            if let Some(input) = signals.input(Some(id)) {
                for (i, o) in out.iter_mut().enumerate() {
                    *o += input.sample(i);
                }
            }
        }
        true
    }

    fn inputs(&self, into: &mut Vec<NodeId>) {
        into.extend_from_slice(&self.inputs);
    }

    fn channels(&self) -> usize {
        self.channels
    }
}

impl Default for Mixer {
    fn default() -> Self {
        Self::new()
    }
}

/// Ring modulator: the product of two inputs.
#[derive(Debug, Clone)]
pub struct Ring {
    a: NodeId,
    b: NodeId,
}

impl Ring {
    /// Multiplies `a` by `b`.
    pub fn new(a: NodeId, b: NodeId) -> Self {
        Self { a, b }
    }
}

impl Render for Ring {
    fn render(&mut self, out: &mut [f64], signals: &Signals<'_>) -> bool {
        let both = signals.inputs([Some(self.a), Some(self.b)]);
        match (both.get(0), both.get(1)) {
            (Some(a), Some(b)) => {
                for (i, o) in out.iter_mut().enumerate() {
                    *o = a.sample(i) * b.sample(i);
                }
            }
            _ => out.fill(0.0),
        }
        true
    }

    fn inputs(&self, into: &mut Vec<NodeId>) {
        into.push(self.a);
        into.push(self.b);
    }
}
