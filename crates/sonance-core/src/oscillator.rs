//! Phase-accumulating wavetable oscillator.
//!
//! Each frame reads the table at `phase + phase_mod[i]`, scales it by
//! `amp * amp_mod[i]`, then advances the phase by
//! `freq * freq_mod[i] / sample_rate`. Absent modulators read as 1 for
//! frequency and amplitude and 0 for phase. Because the phase step is a
//! normalized frequency (cycles per frame), the table length and the playback
//! rate are independent.

use crate::config::GraphConfig;
use crate::error::Result;
use crate::graph::{NodeId, Render, Signals};
use crate::table::Table;

/// Wavetable oscillator node with frequency, amplitude and phase modulation.
///
/// # Example
///
/// ```rust,ignore
/// let lfo = graph.add(Oscillator::new(&config, Table::sine(), 5.0, 0.02))?;
/// let osc = graph.add(
///     Oscillator::new(&config, Table::sawtooth(), 220.0, 0.8).with_phase_mod(lfo),
/// )?;
/// ```
#[derive(Debug, Clone)]
pub struct Oscillator {
    table: Table,
    freq: f64,
    amp: f64,
    phase: f64,
    sample_rate: f64,
    freq_mod: Option<NodeId>,
    amp_mod: Option<NodeId>,
    phase_mod: Option<NodeId>,
}

impl Oscillator {
    /// Creates an oscillator reading `table` at `freq` Hz with amplitude `amp`.
    pub fn new(config: &GraphConfig, table: Table, freq: f64, amp: f64) -> Self {
        Self {
            table,
            freq,
            amp,
            phase: 0.0,
            sample_rate: config.sample_rate,
            freq_mod: None,
            amp_mod: None,
            phase_mod: None,
        }
    }

    /// Multiplies the frequency by `modulator` each frame.
    pub fn with_freq_mod(mut self, modulator: NodeId) -> Self {
        self.freq_mod = Some(modulator);
        self
    }

    /// Multiplies the amplitude by `modulator` each frame.
    pub fn with_amp_mod(mut self, modulator: NodeId) -> Self {
        self.amp_mod = Some(modulator);
        self
    }

    /// Adds `modulator` to the phase each frame.
    pub fn with_phase_mod(mut self, modulator: NodeId) -> Self {
        self.phase_mod = Some(modulator);
        self
    }

    /// Base frequency in Hz.
    pub fn freq(&self) -> f64 {
        self.freq
    }

    /// Sets the base frequency in Hz.
    pub fn set_freq(&mut self, freq: f64) {
        self.freq = freq;
    }

    /// Base amplitude.
    pub fn amp(&self) -> f64 {
        self.amp
    }

    /// Sets the base amplitude.
    pub fn set_amp(&mut self, amp: f64) {
        self.amp = amp;
    }

    /// Current phase in cycles, kept in `[0, 1)` between blocks.
    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Resets the phase, e.g. to retrigger a note at a known point.
    pub fn set_phase(&mut self, phase: f64) {
        self.phase = phase.rem_euclid(1.0);
    }

    /// The waveform being read.
    pub fn table(&self) -> &Table {
        &self.table
    }
}

impl Render for Oscillator {
    fn render(&mut self, out: &mut [f64], signals: &Signals<'_>) -> bool {
        let mods = signals.inputs([self.freq_mod, self.amp_mod, self.phase_mod]);
        let (fm, am, pm) = (mods.get(0), mods.get(1), mods.get(2));

        for (i, o) in out.iter_mut().enumerate() {
            let freq = self.freq * fm.map_or(1.0, |m| m.sample(i));
            let amp = self.amp * am.map_or(1.0, |m| m.sample(i));
            let offset = pm.map_or(0.0, |m| m.sample(i));
            *o = amp * self.table.index(self.phase + offset);
            self.phase += freq / self.sample_rate;
        }
        // Table lookup only sees the fractional part, so this keeps
        // precision without changing the output.
        self.phase = self.phase.rem_euclid(1.0);
        true
    }

    /// Free-runs at the base frequency so re-enabling stays in phase.
    fn silence(&mut self, out: &mut [f64]) {
        out.fill(0.0);
        let step = self.freq / self.sample_rate;
        self.phase = (self.phase + step * out.len() as f64).rem_euclid(1.0);
    }

    fn attach(&mut self, config: &GraphConfig) -> Result<()> {
        config.check_sample_rate(self.sample_rate)
    }

    fn inputs(&self, into: &mut Vec<NodeId>) {
        into.extend(self.freq_mod);
        into.extend(self.amp_mod);
        into.extend(self.phase_mod);
    }
}
