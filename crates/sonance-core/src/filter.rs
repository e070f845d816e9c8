//! Recursive IIR filters operating per frame on a node's input block.
//!
//! - [`LowPass`]: recursive approximation of a Gaussian low-pass (Young and
//!   van Vliet), three unit delays and four normalized coefficients.
//! - [`BandPass`]: two-pole resonator with a radius/cosine pair derived from
//!   bandwidth and center frequency.
//!
//! Coefficients are computed at construction (or on an explicit setter
//! call), never in `prepare`, and per-frame work is constant.

use core::f64::consts::{PI, TAU};

use crate::config::GraphConfig;
use crate::error::{GraphError, Result};
use crate::graph::{NodeId, Render, Signals};

/// Coefficients `(b, b1, b2, b3)` for the recursive Gaussian low-pass.
///
/// The scale `s = sample_rate / cutoff / 5` picks one of two empirical
/// formulas for `q`, split at `s = 2.5`.
pub fn lowpass_coefficients(cutoff: f64, sample_rate: f64) -> [f64; 4] {
    let s = sample_rate / cutoff / 5.0;
    let q = if s > 2.5 {
        0.98711 * s - 0.96330
    } else {
        3.97156 - 4.14554 * (1.0 - 0.26891 * s).sqrt()
    };
    let q2 = q * q;
    let q3 = q2 * q;

    let b0 = 1.0 / (1.57825 + 2.44413 * q + 1.4281 * q2 + 0.422205 * q3);
    let b1 = 2.44413 * q + 2.85619 * q2 + 1.26661 * q3;
    let b2 = -(1.4281 * q2 + 1.26661 * q3);
    let b3 = 0.422205 * q3;
    let b = 1.0 - (b1 + b2 + b3) * b0;

    [b, b1 * b0, b2 * b0, b3 * b0]
}

fn check_frequency(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(GraphError::invalid(name, value))
    }
}

/// Recursive Gaussian low-pass filter node.
#[derive(Debug, Clone)]
pub struct LowPass {
    input: NodeId,
    cutoff: f64,
    sample_rate: f64,
    coeffs: [f64; 4],
    d1: f64,
    d2: f64,
    d3: f64,
}

impl LowPass {
    /// Creates a low-pass over `input` at `cutoff` Hz.
    pub fn new(config: &GraphConfig, input: NodeId, cutoff: f64) -> Result<Self> {
        check_frequency("cutoff", cutoff)?;
        Ok(Self {
            input,
            cutoff,
            sample_rate: config.sample_rate,
            coeffs: lowpass_coefficients(cutoff, config.sample_rate),
            d1: 0.0,
            d2: 0.0,
            d3: 0.0,
        })
    }

    /// Cutoff frequency in Hz.
    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    /// Moves the cutoff and recomputes coefficients. Filter state is kept.
    pub fn set_cutoff(&mut self, cutoff: f64) -> Result<()> {
        check_frequency("cutoff", cutoff)?;
        self.cutoff = cutoff;
        self.coeffs = lowpass_coefficients(cutoff, self.sample_rate);
        Ok(())
    }

    /// Current coefficients `(b, b1, b2, b3)`.
    pub fn coefficients(&self) -> [f64; 4] {
        self.coeffs
    }

    /// Clears the delay taps.
    pub fn clear(&mut self) {
        self.d1 = 0.0;
        self.d2 = 0.0;
        self.d3 = 0.0;
    }
}

impl Render for LowPass {
    fn render(&mut self, out: &mut [f64], signals: &Signals<'_>) -> bool {
        let Some(input) = signals.input(Some(self.input)) else {
            out.fill(0.0);
            return true;
        };
        let [b, b1, b2, b3] = self.coeffs;
        for (i, o) in out.iter_mut().enumerate() {
            let y = b * input.sample(i) + b1 * self.d1 + b2 * self.d2 + b3 * self.d3;
            self.d3 = self.d2;
            self.d2 = self.d1;
            self.d1 = y;
            *o = y;
        }
        true
    }

    fn attach(&mut self, config: &GraphConfig) -> Result<()> {
        config.check_sample_rate(self.sample_rate)
    }

    fn inputs(&self, into: &mut Vec<NodeId>) {
        into.push(self.input);
    }
}

/// Two-pole resonant band-pass filter node.
#[derive(Debug, Clone)]
pub struct BandPass {
    input: NodeId,
    center: f64,
    bandwidth: f64,
    sample_rate: f64,
    a: f64,
    b0: f64,
    b1: f64,
    d0: f64,
    d1: f64,
}

impl BandPass {
    /// Creates a band-pass over `input` centred on `center` Hz with
    /// `bandwidth` Hz.
    pub fn new(config: &GraphConfig, input: NodeId, center: f64, bandwidth: f64) -> Result<Self> {
        check_frequency("center", center)?;
        check_frequency("bandwidth", bandwidth)?;
        let mut filter = Self {
            input,
            center,
            bandwidth,
            sample_rate: config.sample_rate,
            a: 0.0,
            b0: 0.0,
            b1: 0.0,
            d0: 0.0,
            d1: 0.0,
        };
        filter.recalculate();
        Ok(filter)
    }

    /// Center frequency in Hz.
    pub fn center(&self) -> f64 {
        self.center
    }

    /// Bandwidth in Hz.
    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    /// Retunes the filter. Filter state is kept.
    pub fn set_band(&mut self, center: f64, bandwidth: f64) -> Result<()> {
        check_frequency("center", center)?;
        check_frequency("bandwidth", bandwidth)?;
        self.center = center;
        self.bandwidth = bandwidth;
        self.recalculate();
        Ok(())
    }

    fn recalculate(&mut self) {
        let r = 1.0 - PI * self.bandwidth / self.sample_rate;
        let rr = 2.0 * r;
        let rsq = r * r;
        let cos = (rr / (1.0 + rsq)) * (TAU * self.center / self.sample_rate).cos();
        self.a = (1.0 - rsq) * cos.clamp(-1.0, 1.0).acos().sin();
        self.b0 = rr * cos;
        self.b1 = rsq;
    }
}

impl Render for BandPass {
    fn render(&mut self, out: &mut [f64], signals: &Signals<'_>) -> bool {
        let Some(input) = signals.input(Some(self.input)) else {
            out.fill(0.0);
            return true;
        };
        for (i, o) in out.iter_mut().enumerate() {
            let y = self.a * input.sample(i) + self.b0 * self.d0 - self.b1 * self.d1;
            self.d1 = self.d0;
            self.d0 = y;
            *o = y;
        }
        true
    }

    fn attach(&mut self, config: &GraphConfig) -> Result<()> {
        config.check_sample_rate(self.sample_rate)
    }

    fn inputs(&self, into: &mut Vec<NodeId>) {
        into.push(self.input);
    }
}
