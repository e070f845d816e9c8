//! Device boundary for the sonance signal graph.
//!
//! This crate provides:
//!
//! - **PCM encoding**: [`PcmFormat`] turns `f64` blocks into little-endian
//!   16-bit integer or 32-bit float bytes, clamping to `[-1, 1]` first
//! - **Block pulling**: [`Player`] wraps an [`Engine`](sonance_core::Engine)
//!   and fills byte buffers of any size, ticking the graph as needed
//! - **Underruns**: [`Underruns`] is a shared counter the device layer bumps
//!   when it could not be fed in time
//! - **WAV files**: [`write_wav`], [`read_wav`] and [`render_wav`]
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sonance_io::{PcmFormat, Player};
//!
//! let mut player = Player::new(engine, PcmFormat::I16);
//! let underruns = player.underruns();
//!
//! // In the device callback:
//! player.read(&mut device_buffer)?;
//! ```

mod pcm;
mod player;
mod wav;

pub use pcm::PcmFormat;
pub use player::{Player, Underruns};
pub use wav::{WavSpec, read_wav, render_wav, write_wav};

use sonance_core::GraphError;

/// Error types for the device boundary.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The graph failed to schedule or dispatch.
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    /// WAV bit depth other than 8, 16, 24 or 32.
    #[error("unsupported bit depth: {0}")]
    UnsupportedBitDepth(u16),

    /// Only mono and stereo output is supported.
    #[error("unsupported channel count: {0}")]
    UnsupportedChannels(usize),
}

/// Convenience result type for device boundary operations.
pub type Result<T> = std::result::Result<T, Error>;
