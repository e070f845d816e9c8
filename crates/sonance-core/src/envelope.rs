//! Sample-accurate envelopes: ADSR, exponential damp and drive.
//!
//! [`Envelope`] walks a frame counter `pn` through four boundaries
//! `p0 ≤ p1 ≤ p2 ≤ p3` (end of attack, decay, sustain and release), computed
//! once from durations at construction. Every segment is linear except the
//! release, which can follow the exponential [`drive_factor`] curve instead.
//! A zero-length segment is skipped, which makes it instantaneous.
//!
//! [`Damp`] and [`Drive`] are the bare exponential curves, looping over a
//! fixed period and multiplied into an optional input.

use core::time::Duration;
use std::f64::consts::TAU;

use crate::config::GraphConfig;
use crate::error::Result;
use crate::graph::{NodeId, Render, Signals};

/// Exponential decay from 1 toward `e^-2π` as `t` goes from 0 to 1.
///
/// `t` is clamped to `[0, 1]`.
#[inline]
pub fn damp_factor(t: f64) -> f64 {
    (-TAU * t.clamp(0.0, 1.0)).exp()
}

/// Mirror of [`damp_factor`]: rises from `e^-2π` to 1 as `t` goes from 0 to 1.
#[inline]
pub fn drive_factor(t: f64) -> f64 {
    (-TAU * (1.0 - t.clamp(0.0, 1.0))).exp()
}

/// ADSR durations and levels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Adsr {
    /// Time to rise from 0 to `peak`.
    pub attack: Duration,
    /// Time to fall from `peak` to `sustain_level`.
    pub decay: Duration,
    /// Time held at `sustain_level` before releasing.
    pub sustain: Duration,
    /// Time to fall from `sustain_level` to 0.
    pub release: Duration,
    /// Level held during sustain.
    pub sustain_level: f64,
    /// Level reached at the end of the attack.
    pub peak: f64,
}

/// Shape of the release segment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReleaseCurve {
    /// Straight line from the sustain level to zero.
    #[default]
    Linear,
    /// [`drive_factor`] curve scaled by the sustain level.
    Exponential,
}

/// Segment the envelope is currently in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnvelopeState {
    /// Rising toward the peak.
    Attack,
    /// Falling toward the sustain level.
    Decay,
    /// Holding the sustain level for its fixed duration.
    Sustain,
    /// Pinned at the sustain level until released.
    Sustaining,
    /// Falling toward zero.
    Release,
}

/// Four-segment ADSR envelope node.
///
/// Without an input the envelope outputs its amplitude directly and can
/// drive other nodes as a control signal; with one it scales the input.
///
/// # Example
///
/// ```rust,ignore
/// let env = graph.add(
///     Envelope::new(&config, adsr).with_input(osc),
/// )?;
/// graph.envelope_mut(env).unwrap().sustain();
/// // later
/// graph.envelope_mut(env).unwrap().release();
/// ```
#[derive(Debug, Clone)]
pub struct Envelope {
    /// Frame counts for attack, decay, sustain, release.
    frames: [usize; 4],
    /// Segment end markers p0..p3.
    ends: [usize; 4],
    pn: usize,
    peak: f64,
    sustain_level: f64,
    sustaining: bool,
    curve: ReleaseCurve,
    one_shot: bool,
    sample_rate: f64,
    input: Option<NodeId>,
}

impl Envelope {
    /// Creates an envelope, converting durations to frames with `config`.
    pub fn new(config: &GraphConfig, adsr: Adsr) -> Self {
        let frames = [
            config.frames(adsr.attack),
            config.frames(adsr.decay),
            config.frames(adsr.sustain),
            config.frames(adsr.release),
        ];
        let mut ends = [0; 4];
        let mut acc = 0;
        for (end, len) in ends.iter_mut().zip(frames) {
            acc += len;
            *end = acc;
        }
        Self {
            frames,
            ends,
            pn: 0,
            peak: adsr.peak,
            sustain_level: adsr.sustain_level,
            sustaining: false,
            curve: ReleaseCurve::Linear,
            one_shot: false,
            sample_rate: config.sample_rate,
            input: None,
        }
    }

    /// Scales `input` by the envelope instead of emitting the bare amplitude.
    pub fn with_input(mut self, input: NodeId) -> Self {
        self.input = Some(input);
        self
    }

    /// Selects the release shape.
    pub fn with_release_curve(mut self, curve: ReleaseCurve) -> Self {
        self.curve = curve;
        self
    }

    /// Turns the node off when the release ends instead of looping.
    pub fn one_shot(mut self) -> Self {
        self.one_shot = true;
        self
    }

    /// Restarts from the beginning of the attack.
    pub fn restart(&mut self) {
        self.pn = 0;
    }

    /// Latches the envelope at the sustain level once it gets there.
    pub fn sustain(&mut self) {
        self.sustaining = true;
    }

    /// Jumps to the release segment and clears the sustain latch.
    ///
    /// Returns `false` if the envelope was already releasing, so repeated
    /// calls do not retrigger anything.
    pub fn release(&mut self) -> bool {
        self.sustaining = false;
        let p2 = self.ends[2];
        if self.pn <= p2 {
            self.pn = p2 + 1;
            true
        } else {
            false
        }
    }

    /// Segment end markers `[p0, p1, p2, p3]` in frames.
    pub fn boundaries(&self) -> [usize; 4] {
        self.ends
    }

    /// Current frame counter.
    pub fn position(&self) -> usize {
        self.pn
    }

    /// Total length of one pass.
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.ends[3] as f64 / self.sample_rate)
    }

    /// True while latched at the sustain level.
    pub fn is_sustaining(&self) -> bool {
        self.sustaining
    }

    /// Segment the next frame falls in.
    pub fn state(&self) -> EnvelopeState {
        let [p0, p1, p2, _] = self.ends;
        match self.pn {
            pn if pn < p0 => EnvelopeState::Attack,
            pn if pn < p1 => EnvelopeState::Decay,
            pn if pn < p2 => EnvelopeState::Sustain,
            _ if self.sustaining => EnvelopeState::Sustaining,
            _ => EnvelopeState::Release,
        }
    }

    /// Amplitude at the current frame; advances `pn`.
    fn advance(&mut self) -> (f64, bool) {
        let [f0, f1, _, f3] = self.frames;
        let [p0, p1, p2, p3] = self.ends;
        let pn = self.pn;

        let amp = if pn < p0 {
            self.peak * pn as f64 / f0 as f64
        } else if pn < p1 {
            self.peak - (self.peak - self.sustain_level) * (pn - p0) as f64 / f1 as f64
        } else if pn < p2 {
            self.sustain_level
        } else if self.sustaining {
            // Hold pn where it is.
            return (self.sustain_level, false);
        } else if pn < p3 {
            let remaining = (p3 - pn) as f64 / f3 as f64;
            match self.curve {
                ReleaseCurve::Linear => self.sustain_level * remaining,
                ReleaseCurve::Exponential => self.sustain_level * drive_factor(remaining),
            }
        } else {
            // Past the end: a zero-length release or an all-zero envelope.
            0.0
        };

        self.pn += 1;
        let wrapped = self.pn >= p3;
        if wrapped {
            self.pn = 0;
        }
        (amp, wrapped)
    }
}

impl Render for Envelope {
    fn render(&mut self, out: &mut [f64], signals: &Signals<'_>) -> bool {
        let input = signals.input(self.input);
        for i in 0..out.len() {
            let (amp, wrapped) = self.advance();
            out[i] = match &input {
                Some(x) => amp * x.sample(i),
                None => amp,
            };
            if wrapped && self.one_shot {
                out[i + 1..].fill(0.0);
                return false;
            }
        }
        true
    }

    fn attach(&mut self, config: &GraphConfig) -> Result<()> {
        config.check_sample_rate(self.sample_rate)
    }

    fn inputs(&self, into: &mut Vec<NodeId>) {
        into.extend(self.input);
    }
}

/// Exponential decay over a looping period.
#[derive(Debug, Clone)]
pub struct Damp {
    period: usize,
    pn: usize,
    input: Option<NodeId>,
}

impl Damp {
    /// Decays from 1 over `period`, then starts again.
    pub fn new(config: &GraphConfig, period: Duration) -> Self {
        Self {
            period: config.frames(period),
            pn: 0,
            input: None,
        }
    }

    /// Scales `input` by the curve.
    pub fn with_input(mut self, input: NodeId) -> Self {
        self.input = Some(input);
        self
    }
}

impl Render for Damp {
    fn render(&mut self, out: &mut [f64], signals: &Signals<'_>) -> bool {
        let input = signals.input(self.input);
        for (i, o) in out.iter_mut().enumerate() {
            let fac = looping_factor(&mut self.pn, self.period, damp_factor);
            *o = input.as_ref().map_or(fac, |x| fac * x.sample(i));
        }
        true
    }

    fn inputs(&self, into: &mut Vec<NodeId>) {
        into.extend(self.input);
    }
}

/// Exponential rise over a looping period, multiplied into its input.
#[derive(Debug, Clone)]
pub struct Drive {
    period: usize,
    pn: usize,
    input: NodeId,
}

impl Drive {
    /// Rises toward 1 over `period`, then starts again.
    pub fn new(config: &GraphConfig, input: NodeId, period: Duration) -> Self {
        Self {
            period: config.frames(period),
            pn: 0,
            input,
        }
    }
}

impl Render for Drive {
    fn render(&mut self, out: &mut [f64], signals: &Signals<'_>) -> bool {
        let input = signals.input(Some(self.input));
        for (i, o) in out.iter_mut().enumerate() {
            let fac = looping_factor(&mut self.pn, self.period, drive_factor);
            *o = input.as_ref().map_or(0.0, |x| fac * x.sample(i));
        }
        true
    }

    fn inputs(&self, into: &mut Vec<NodeId>) {
        into.push(self.input);
    }
}

/// Evaluates `curve` at `pn / period` and advances `pn`, wrapping at
/// `period`. A zero period passes the signal through unchanged.
#[inline]
fn looping_factor(pn: &mut usize, period: usize, curve: fn(f64) -> f64) -> f64 {
    if period == 0 {
        return 1.0;
    }
    let fac = curve(*pn as f64 / period as f64);
    *pn += 1;
    if *pn == period {
        *pn = 0;
    }
    fac
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;
    use crate::Unit;

    fn adsr(ms: [u64; 4]) -> Adsr {
        Adsr {
            attack: Duration::from_millis(ms[0]),
            decay: Duration::from_millis(ms[1]),
            sustain: Duration::from_millis(ms[2]),
            release: Duration::from_millis(ms[3]),
            sustain_level: 0.5,
            peak: 1.0,
        }
    }

    fn config() -> GraphConfig {
        GraphConfig::new(1000.0, 1).unwrap()
    }

    fn step(graph: &Graph, id: NodeId) -> f64 {
        let tick = graph.next_tick();
        graph.prepare(id, tick).unwrap();
        graph.samples(id).unwrap()[0]
    }

    #[test]
    fn test_boundaries_round_durations() {
        let env = Envelope::new(&config(), adsr([10, 10, 10, 10]));
        assert_eq!(env.boundaries(), [10, 20, 30, 40]);
        assert_eq!(env.duration(), Duration::from_millis(40));
    }

    #[test]
    fn test_segments() {
        let mut g = Graph::new(config()).unwrap();
        let env = g.add(Envelope::new(&config(), adsr([10, 10, 10, 10]))).unwrap();
        let out: Vec<f64> = (0..41).map(|_| step(&g, env)).collect();

        assert_eq!(out[0], 0.0);
        assert!((out[5] - 0.5).abs() < 1e-12, "expected 0.5, got {}", out[5]);
        assert!((out[10] - 1.0).abs() < 1e-12, "decay starts at peak, got {}", out[10]);
        assert!((out[15] - 0.75).abs() < 1e-12, "expected 0.75, got {}", out[15]);
        assert_eq!(out[25], 0.5);
        assert_eq!(out[30], 0.5);
        assert!((out[35] - 0.25).abs() < 1e-12, "expected 0.25, got {}", out[35]);
        // Looped back to the start of the attack.
        assert_eq!(out[40], 0.0);
    }

    #[test]
    fn test_release_mid_attack() {
        let mut g = Graph::new(config()).unwrap();
        let env = g.add(Envelope::new(&config(), adsr([10, 10, 10, 10]))).unwrap();
        for _ in 0..5 {
            step(&g, env);
        }
        assert!(g.envelope_mut(env).unwrap().release());
        assert_eq!(g.envelope_mut(env).unwrap().position(), 31);
        assert!(!g.envelope_mut(env).unwrap().release(), "already releasing");

        let tail: Vec<f64> = (0..9).map(|_| step(&g, env)).collect();
        for (k, y) in tail.iter().enumerate() {
            let expected = 0.5 * (9 - k) as f64 / 10.0;
            assert!((y - expected).abs() < 1e-12, "expected {expected}, got {y}");
        }
        assert_eq!(g.envelope_mut(env).unwrap().position(), 0);
    }

    #[test]
    fn test_sustain_lock_holds_until_release() {
        let mut g = Graph::new(config()).unwrap();
        let env = g.add(Envelope::new(&config(), adsr([2, 2, 2, 4]))).unwrap();
        g.envelope_mut(env).unwrap().sustain();
        for _ in 0..6 {
            step(&g, env);
        }
        for _ in 0..20 {
            assert_eq!(step(&g, env), 0.5);
        }
        assert_eq!(
            g.envelope_mut(env).unwrap().state(),
            EnvelopeState::Sustaining
        );
        assert!(g.envelope_mut(env).unwrap().release());
        assert_eq!(
            g.envelope_mut(env).unwrap().state(),
            EnvelopeState::Release
        );
        assert!(step(&g, env) < 0.5);
    }

    #[test]
    fn test_zero_attack_is_instantaneous() {
        let mut g = Graph::new(config()).unwrap();
        let env = g.add(Envelope::new(&config(), adsr([0, 10, 10, 10]))).unwrap();
        let first = step(&g, env);
        assert_eq!(first, 1.0);
    }

    #[test]
    fn test_all_zero_envelope_is_silent() {
        let mut g = Graph::new(config()).unwrap();
        let env = g.add(Envelope::new(&config(), adsr([0, 0, 0, 0]))).unwrap();
        for _ in 0..4 {
            assert_eq!(step(&g, env), 0.0);
        }
    }

    #[test]
    fn test_one_shot_turns_off() {
        let mut g = Graph::new(GraphConfig::new(1000.0, 8).unwrap()).unwrap();
        let env = g
            .add(Envelope::new(g.config(), adsr([1, 1, 1, 1])).one_shot())
            .unwrap();
        g.prepare(env, 1).unwrap();
        let out = g.samples(env).unwrap().to_vec();
        assert_eq!(&out[4..], &[0.0; 4]);
        assert!(g.node(env).unwrap().is_off());
    }

    #[test]
    fn test_envelope_scales_input() {
        let mut g = Graph::new(config()).unwrap();
        let unit = g.add(Unit::step(0.5)).unwrap();
        let env = g
            .add(Envelope::new(&config(), adsr([10, 10, 10, 10])).with_input(unit))
            .unwrap();
        for _ in 0..5 {
            let tick = g.next_tick();
            g.prepare(unit, tick).unwrap();
            g.prepare(env, tick).unwrap();
        }
        let tick = g.next_tick();
        g.prepare(unit, tick).unwrap();
        g.prepare(env, tick).unwrap();
        let y = g.samples(env).unwrap()[0];
        assert!((y - 0.25).abs() < 1e-12, "expected 0.25, got {y}");
    }

    #[test]
    fn test_exponential_release_starts_at_sustain() {
        let mut env = Envelope::new(&config(), adsr([0, 0, 0, 10]))
            .with_release_curve(ReleaseCurve::Exponential);
        let (first, _) = env.advance();
        assert!((first - 0.5).abs() < 1e-12, "expected 0.5, got {first}");
        let (second, _) = env.advance();
        assert!(second < first);
    }

    #[test]
    fn test_damp_and_drive_curves() {
        assert_eq!(damp_factor(0.0), 1.0);
        assert_eq!(drive_factor(1.0), 1.0);
        assert!((damp_factor(1.0) - (-TAU).exp()).abs() < 1e-15);
        assert_eq!(damp_factor(2.0), damp_factor(1.0));
    }

    #[test]
    fn test_damp_loops_over_period() {
        let mut g = Graph::new(GraphConfig::new(1000.0, 8).unwrap()).unwrap();
        let damp = g
            .add(Damp::new(g.config(), Duration::from_millis(4)))
            .unwrap();
        g.prepare(damp, 1).unwrap();
        let out = g.samples(damp).unwrap().to_vec();
        assert_eq!(out[0], 1.0);
        assert!(out[1] < out[0]);
        assert_eq!(out[4], 1.0);
        assert_eq!(out[5], out[1]);
    }

    #[test]
    fn test_zero_period_drive_passes_through() {
        let mut g = Graph::new(GraphConfig::new(1000.0, 4).unwrap()).unwrap();
        let unit = g.add(Unit::step(0.3)).unwrap();
        let drive = g
            .add(Drive::new(g.config(), unit, Duration::ZERO))
            .unwrap();
        g.prepare(unit, 1).unwrap();
        g.prepare(drive, 1).unwrap();
        assert!(g.samples(drive).unwrap().iter().all(|&x| x == 0.3));
    }
}
