//! Feedback comb filter.
//!
//! Same buffer mechanics as [`Delay`](crate::Delay), but the value written
//! back is `input + gain * delayed_output`. An impulse comes back every `N`
//! frames, scaled by `gain` once more each time.

use core::time::Duration;

use crate::config::GraphConfig;
use crate::delay::DelayLine;
use crate::error::Result;
use crate::graph::{NodeId, Render, Signals};

/// Feedback comb filter node.
///
/// # Example
///
/// ```rust,ignore
/// let comb = graph.add(Comb::new(&config, src, Duration::from_millis(30), 0.7)?)?;
/// ```
#[derive(Debug, Clone)]
pub struct Comb {
    input: NodeId,
    line: DelayLine,
    gain: f64,
}

impl Comb {
    /// Creates a comb of `duration` with feedback `gain`.
    ///
    /// Returns an error if the duration rounds to zero frames.
    pub fn new(config: &GraphConfig, input: NodeId, duration: Duration, gain: f64) -> Result<Self> {
        Self::with_frames(input, config.frames(duration), gain)
    }

    /// Creates a comb of exactly `frames` frames.
    pub fn with_frames(input: NodeId, frames: usize, gain: f64) -> Result<Self> {
        Ok(Self {
            input,
            line: DelayLine::new(frames, 0)?,
            gain,
        })
    }

    /// Feedback gain.
    pub fn gain(&self) -> f64 {
        self.gain
    }

    /// Sets the feedback gain. Values with magnitude of 1 or more never decay.
    pub fn set_gain(&mut self, gain: f64) {
        self.gain = gain;
    }

    /// Loop length in frames.
    pub fn frames(&self) -> usize {
        self.line.delay()
    }
}

impl Render for Comb {
    fn render(&mut self, out: &mut [f64], signals: &Signals<'_>) -> bool {
        let input = signals.input(Some(self.input));
        for (i, o) in out.iter_mut().enumerate() {
            let delayed = self.line.read();
            let x = input.as_ref().map_or(0.0, |x| x.sample(i));
            self.line.write(x + self.gain * delayed);
            *o = delayed;
        }
        true
    }

    /// Drains the feedback line while off; re-enabling starts from silence.
    fn silence(&mut self, out: &mut [f64]) {
        out.fill(0.0);
        for _ in 0..out.len() {
            self.line.skip();
        }
    }

    fn inputs(&self, into: &mut Vec<NodeId>) {
        into.push(self.input);
    }
}
