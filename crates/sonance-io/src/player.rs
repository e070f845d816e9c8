//! Pull-driven playback: fills device buffers from an engine.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use sonance_core::Engine;

use crate::Result;
use crate::pcm::PcmFormat;

/// Shared count of buffers the device could not fill in time.
///
/// The device layer holds a clone and calls [`record()`](Self::record) when it
/// misses a deadline; the graph never handles underruns itself.
#[derive(Debug, Clone, Default)]
pub struct Underruns(Arc<AtomicU64>);

impl Underruns {
    /// Creates a counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one underrun.
    pub fn record(&self) {
        let total = self.0.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::warn!(total, "audio underrun");
    }

    /// Underruns so far.
    pub fn count(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    /// Resets to zero and returns the previous count.
    pub fn take(&self) -> u64 {
        self.0.swap(0, Ordering::Relaxed)
    }
}

/// Encodes an engine's output into byte buffers of any size.
///
/// Each refill runs one tick and encodes the whole root block; bytes the
/// caller did not ask for are kept for the next [`read()`](Self::read).
pub struct Player {
    engine: Engine,
    format: PcmFormat,
    pending: Vec<u8>,
    offset: usize,
    underruns: Underruns,
}

impl Player {
    /// Creates a player over `engine`.
    pub fn new(engine: Engine, format: PcmFormat) -> Self {
        tracing::info!(
            ?format,
            channels = engine.channels(),
            block_size = engine.graph().block_size(),
            "player created"
        );
        Self {
            engine,
            format,
            pending: Vec::new(),
            offset: 0,
            underruns: Underruns::new(),
        }
    }

    /// Fills `buf` completely, ticking the engine as often as needed.
    /// Returns the number of bytes written.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut written = 0;
        while written < buf.len() {
            if self.offset == self.pending.len() {
                self.refill()?;
            }
            let n = (buf.len() - written).min(self.pending.len() - self.offset);
            buf[written..written + n].copy_from_slice(&self.pending[self.offset..self.offset + n]);
            written += n;
            self.offset += n;
        }
        Ok(written)
    }

    fn refill(&mut self) -> Result<()> {
        self.pending.clear();
        self.offset = 0;
        self.engine.tick()?;
        let block = self.engine.output();
        self.format.encode_block(&block, &mut self.pending);
        Ok(())
    }

    /// Encoded bytes left over from the last refill.
    pub fn buffered(&self) -> usize {
        self.pending.len() - self.offset
    }

    /// Handle to the underrun counter, for the device layer.
    pub fn underruns(&self) -> Underruns {
        self.underruns.clone()
    }

    /// Output byte format.
    pub fn format(&self) -> PcmFormat {
        self.format
    }

    /// The driven engine.
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Mutable access to the driven engine, e.g. to rewire and refresh.
    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    /// Releases the engine.
    pub fn into_engine(self) -> Engine {
        self.engine
    }
}

impl std::io::Read for Player {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        Player::read(self, buf).map_err(std::io::Error::other)
    }
}
