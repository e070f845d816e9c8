//! Discrete signal tables (wavetables).
//!
//! A [`Table`] holds one period of a waveform as a fixed-length sequence of
//! samples. Indexing is circular: any phase, including negative or very large
//! values, is reduced to `[0, 1)` before lookup. Tables are immutable once
//! built and share their storage, so cloning one into many oscillators is a
//! reference-count bump.
//!
//! # Generators
//!
//! The continuous functions [`sine`], [`triangle`], [`square`] and
//! [`sawtooth`] map a normalized time `t` in `[0, 1)` to a sample and can be
//! fed to [`Table::sample`]. The additive constructors
//! ([`Table::square_synthesis`] and friends) sum harmonics and normalize the
//! result to unit peak.

use std::f64::consts::TAU;
use std::sync::Arc;

use crate::error::{GraphError, Result};

/// Default wavetable length.
pub const DEFAULT_TABLE_LEN: usize = 1024;

/// Sine wave, `sin(2πt)`.
#[inline]
pub fn sine(t: f64) -> f64 {
    (TAU * t).sin()
}

/// Triangle wave derived from the sawtooth, `2|saw(t)| - 1`.
#[inline]
pub fn triangle(t: f64) -> f64 {
    2.0 * sawtooth(t).abs() - 1.0
}

/// Square wave: `+1` where `sin(2πt)` is non-negative, `-1` elsewhere.
#[inline]
pub fn square(t: f64) -> f64 {
    if sine(t).is_sign_negative() {
        -1.0
    } else {
        1.0
    }
}

/// Sawtooth wave, `2(t - floor(0.5 + t))`.
#[inline]
pub fn sawtooth(t: f64) -> f64 {
    2.0 * (t - (0.5 + t).floor())
}

/// Which harmonics an additive table sums, and how they are weighted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Partials {
    /// Odd harmonics at `1/n` (square).
    Odd,
    /// Every harmonic at `1/n` (sawtooth).
    All,
    /// Every harmonic at unit weight (pulse).
    Flat,
}

/// One period of a waveform, indexed circularly.
#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    samples: Arc<[f64]>,
}

impl Table {
    /// Builds a table from raw samples.
    pub fn from_samples(samples: Vec<f64>) -> Result<Self> {
        if samples.is_empty() {
            return Err(GraphError::EmptyTable);
        }
        Ok(Self {
            samples: samples.into(),
        })
    }

    /// Samples a continuous function at `len` evenly spaced points of `[0, 1)`.
    pub fn sample<F: Fn(f64) -> f64>(len: usize, f: F) -> Result<Self> {
        if len == 0 {
            return Err(GraphError::EmptyTable);
        }
        Ok(Self::sampled(len, f))
    }

    /// Sine table of [`DEFAULT_TABLE_LEN`] samples.
    pub fn sine() -> Self {
        Self::sampled(DEFAULT_TABLE_LEN, sine)
    }

    /// Triangle table of [`DEFAULT_TABLE_LEN`] samples.
    pub fn triangle() -> Self {
        Self::sampled(DEFAULT_TABLE_LEN, triangle)
    }

    /// Square table of [`DEFAULT_TABLE_LEN`] samples.
    pub fn square() -> Self {
        Self::sampled(DEFAULT_TABLE_LEN, square)
    }

    /// Sawtooth table of [`DEFAULT_TABLE_LEN`] samples.
    pub fn sawtooth() -> Self {
        Self::sampled(DEFAULT_TABLE_LEN, sawtooth)
    }

    /// Band-limited square built from odd harmonics up to `harmonics`,
    /// each at `1/n`, shifted by `phase` radians.
    pub fn square_synthesis(harmonics: usize, phase: f64) -> Self {
        Self::additive(harmonics, phase, Partials::Odd)
    }

    /// Band-limited sawtooth built from every harmonic up to `harmonics`,
    /// each at `1/n`.
    pub fn sawtooth_synthesis(harmonics: usize, phase: f64) -> Self {
        Self::additive(harmonics, phase, Partials::All)
    }

    /// Pulse train built from every harmonic up to `harmonics` at unit weight.
    pub fn pulse_synthesis(harmonics: usize, phase: f64) -> Self {
        Self::additive(harmonics, phase, Partials::Flat)
    }

    fn additive(harmonics: usize, phase: f64, partials: Partials) -> Self {
        let step = if partials == Partials::Odd { 2 } else { 1 };
        let table = Self::sampled(DEFAULT_TABLE_LEN, |t| {
            (1..=harmonics)
                .step_by(step)
                .map(|n| {
                    let n = n as f64;
                    let weight = if partials == Partials::Flat { 1.0 } else { 1.0 / n };
                    weight * (n * TAU * t + phase).sin()
                })
                .sum()
        });
        table.normalize()
    }

    // Callers guarantee len > 0.
    fn sampled<F: Fn(f64) -> f64>(len: usize, f: F) -> Self {
        let n = len as f64;
        let samples: Vec<f64> = (0..len).map(|i| f(i as f64 / n)).collect();
        Self {
            samples: samples.into(),
        }
    }

    /// Returns a copy scaled so the peak magnitude is 1.
    ///
    /// A silent table is returned unchanged.
    pub fn normalize(&self) -> Self {
        let peak = self.samples.iter().fold(0.0_f64, |m, x| m.max(x.abs()));
        if peak == 0.0 {
            return self.clone();
        }
        let samples: Vec<f64> = self.samples.iter().map(|x| x / peak).collect();
        Self {
            samples: samples.into(),
        }
    }

    /// Number of samples in one period.
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false; tables hold at least one sample.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Raw samples.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.samples
    }

    /// Sample at integer position `i`, wrapping modulo the length.
    #[inline]
    pub fn at(&self, i: usize) -> f64 {
        self.samples[i % self.samples.len()]
    }

    /// Truncating lookup at phase `t`.
    ///
    /// Only the fractional part of `t` matters; the sample at
    /// `floor(frac(t) * len)` is returned. NaN and infinite phases read
    /// index 0.
    #[inline]
    pub fn index(&self, t: f64) -> f64 {
        let len = self.samples.len();
        let i = (t.rem_euclid(1.0) * len as f64) as usize;
        self.samples[i % len]
    }

    /// Linearly interpolated lookup at phase `t`, wrapping between the last
    /// and first samples.
    #[inline]
    pub fn interpolate(&self, t: f64) -> f64 {
        let len = self.samples.len();
        let pos = t.rem_euclid(1.0) * len as f64;
        let base = pos.floor();
        let frac = if base.is_finite() { pos - base } else { 0.0 };
        let i = (base as usize) % len;
        let a = self.samples[i];
        let b = self.samples[(i + 1) % len];
        a + (b - a) * frac
    }
}
