//! Graph-wide settings threaded through node construction.

use core::time::Duration;

use crate::error::{GraphError, Result};

/// Default sample rate in Hz.
pub const DEFAULT_SAMPLE_RATE: f64 = 44100.0;

/// Default number of frames per block.
pub const DEFAULT_BLOCK_SIZE: usize = 256;

/// Sample rate and block size shared by every node in a graph.
///
/// Nodes that convert wall-clock durations to frame counts take a
/// `&GraphConfig` in their constructors; the conversion happens once, at
/// construction, never during `prepare`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GraphConfig {
    /// Sample rate in Hz.
    pub sample_rate: f64,
    /// Frames per block. Must be a power of two.
    pub block_size: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}

impl GraphConfig {
    /// Creates a validated configuration.
    pub fn new(sample_rate: f64, block_size: usize) -> Result<Self> {
        let config = Self {
            sample_rate,
            block_size,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks the sample rate is positive and the block size a power of two.
    pub fn validate(&self) -> Result<()> {
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(GraphError::InvalidSampleRate(self.sample_rate));
        }
        if !self.block_size.is_power_of_two() {
            return Err(GraphError::InvalidBlockSize(self.block_size));
        }
        Ok(())
    }

    /// Converts a duration to a frame count, rounding to the nearest frame.
    #[inline]
    pub fn frames(&self, duration: Duration) -> usize {
        (duration.as_secs_f64() * self.sample_rate).round() as usize
    }

    /// Converts a frame count back to a duration.
    #[inline]
    pub fn duration(&self, frames: usize) -> Duration {
        Duration::from_secs_f64(frames as f64 / self.sample_rate)
    }

    /// Rejects a node whose cached sample rate is not this graph's.
    pub(crate) fn check_sample_rate(&self, sample_rate: f64) -> Result<()> {
        if sample_rate == self.sample_rate {
            Ok(())
        } else {
            Err(GraphError::invalid("sample_rate", sample_rate))
        }
    }
}
