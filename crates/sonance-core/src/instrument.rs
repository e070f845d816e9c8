//! Pass-through node with a scheduled off.
//!
//! Voices are usually built as an [`Instrument`] wrapping an envelope or a
//! mixer: when a key is released the envelope is released and the instrument
//! is told to go quiet once the release has run, without a timer thread.

use core::time::Duration;

use crate::config::GraphConfig;
use crate::error::Result;
use crate::graph::{NodeId, Render, Signals};

/// Forwards its input and can switch itself off after a delay.
#[derive(Debug, Clone)]
pub struct Instrument {
    input: NodeId,
    sample_rate: f64,
    count: u64,
    off_at: Option<u64>,
}

impl Instrument {
    /// Wraps `input`.
    pub fn new(config: &GraphConfig, input: NodeId) -> Self {
        Self {
            input,
            sample_rate: config.sample_rate,
            count: 0,
            off_at: None,
        }
    }

    /// Switches the node off once `delay` has elapsed, counted in frames from
    /// now. Replaces any pending off.
    pub fn off_in(&mut self, delay: Duration) {
        let frames = (delay.as_secs_f64() * self.sample_rate).round() as u64;
        self.off_at = Some(self.count.saturating_add(frames));
    }

    /// True while an off is scheduled.
    pub fn is_pending_off(&self) -> bool {
        self.off_at.is_some()
    }

    /// Frames elapsed since construction.
    pub fn frames(&self) -> u64 {
        self.count
    }

    fn due(&self) -> bool {
        self.off_at.is_some_and(|at| self.count >= at)
    }
}

impl Render for Instrument {
    fn render(&mut self, out: &mut [f64], signals: &Signals<'_>) -> bool {
        let input = signals.input(Some(self.input));
        for i in 0..out.len() {
            if self.due() {
                out[i..].fill(0.0);
                self.off_at = None;
                return false;
            }
            out[i] = input.as_ref().map_or(0.0, |x| x.sample(i));
            self.count += 1;
        }
        if self.due() {
            self.off_at = None;
            return false;
        }
        true
    }

    fn silence(&mut self, out: &mut [f64]) {
        out.fill(0.0);
        self.count += out.len() as u64;
    }

    fn attach(&mut self, config: &GraphConfig) -> Result<()> {
        config.check_sample_rate(self.sample_rate)
    }

    fn inputs(&self, into: &mut Vec<NodeId>) {
        into.push(self.input);
    }

    fn enabled(&mut self) {
        self.off_at = None;
    }
}
