//! Leaf sources with no inputs.

use crate::graph::{Render, Signals};

/// What a [`Unit`] emits.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UnitMode {
    /// `amp` on the first frame, then the node switches itself off.
    Sample,
    /// `amp` on every frame.
    Step,
    /// Starts at `amp` and adds `step` every frame.
    Ramp {
        /// Increment per frame.
        step: f64,
    },
}

/// Constant, impulse or ramp source.
///
/// Units are the usual control inputs for modulation slots and the test
/// signals for everything else.
#[derive(Debug, Clone)]
pub struct Unit {
    mode: UnitMode,
    amp: f64,
    value: f64,
}

impl Unit {
    /// Creates a unit in `mode` with level `amp`.
    pub fn new(mode: UnitMode, amp: f64) -> Self {
        Self {
            mode,
            amp,
            value: amp,
        }
    }

    /// Single-frame impulse of height `amp`.
    pub fn impulse(amp: f64) -> Self {
        Self::new(UnitMode::Sample, amp)
    }

    /// Constant `amp`.
    pub fn step(amp: f64) -> Self {
        Self::new(UnitMode::Step, amp)
    }

    /// Linear ramp starting at `start`.
    pub fn ramp(start: f64, step: f64) -> Self {
        Self::new(UnitMode::Ramp { step }, start)
    }

    /// Emission mode.
    pub fn mode(&self) -> UnitMode {
        self.mode
    }

    /// Level.
    pub fn amp(&self) -> f64 {
        self.amp
    }

    /// Sets the level. A ramp restarts from it.
    pub fn set_amp(&mut self, amp: f64) {
        self.amp = amp;
        self.value = amp;
    }
}

impl Render for Unit {
    fn render(&mut self, out: &mut [f64], _signals: &Signals<'_>) -> bool {
        match self.mode {
            UnitMode::Sample => {
                out.fill(0.0);
                if let Some(first) = out.first_mut() {
                    *first = self.amp;
                }
                false
            }
            UnitMode::Step => {
                out.fill(self.amp);
                true
            }
            UnitMode::Ramp { step } => {
                for o in out.iter_mut() {
                    *o = self.value;
                    self.value += step;
                }
                true
            }
        }
    }
}
