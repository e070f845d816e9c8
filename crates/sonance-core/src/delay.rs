//! Circular-buffer delay and the taps that share its storage.
//!
//! # Types
//!
//! - [`DelayLine`]: owned buffer with independent read and write cursors
//! - [`Delay`]: node that owns a `DelayLine` and is its only writer
//! - [`Tap`]: node holding a second read cursor into a `Delay`'s buffer
//!
//! A `Delay` of `N` frames reads the slot written `N` frames earlier before
//! writing the current input, so an impulse at frame 0 comes out at frame
//! `N`. Its buffer carries one block of headroom beyond `N`: a tap is
//! scheduled after its delay and reads the block the delay just wrote, and
//! the headroom keeps every slot a tap may still need from being overwritten
//! within that block.
//!
//! Taps never get `&mut` access to the line. They borrow it read-only through
//! the graph while their own node is being prepared, and the tiering keeps
//! that borrow from overlapping the delay's write.

use core::time::Duration;

use crate::config::GraphConfig;
use crate::error::{GraphError, Result};
use crate::graph::{NodeId, Render, Signals};

/// Fixed-length circular buffer with independent read and write cursors.
///
/// The read cursor trails the write cursor by [`delay()`](Self::delay)
/// frames modulo the buffer length.
#[derive(Debug, Clone)]
pub struct DelayLine {
    buf: Vec<f64>,
    read: usize,
    write: usize,
    delay: usize,
}

impl DelayLine {
    /// Creates a zeroed line delaying by `delay` frames, with `headroom`
    /// extra slots. Returns an error if `delay` is zero.
    pub fn new(delay: usize, headroom: usize) -> Result<Self> {
        if delay == 0 {
            return Err(GraphError::zero_length("delay line"));
        }
        let len = delay + headroom;
        Ok(Self {
            buf: vec![0.0; len],
            read: (len - delay) % len,
            write: 0,
            delay,
        })
    }

    /// Returns the sample at the read cursor and advances it.
    #[inline]
    pub fn read(&mut self) -> f64 {
        let x = self.buf[self.read];
        self.read = (self.read + 1) % self.buf.len();
        x
    }

    /// Stores `x` at the write cursor and advances it.
    #[inline]
    pub fn write(&mut self, x: f64) {
        self.buf[self.write] = x;
        self.write = (self.write + 1) % self.buf.len();
    }

    /// Sample at absolute slot `pos`, wrapping modulo the length.
    #[inline]
    pub fn read_at(&self, pos: usize) -> f64 {
        self.buf[pos % self.buf.len()]
    }

    /// Slot the next write goes to.
    #[inline]
    pub fn write_position(&self) -> usize {
        self.write
    }

    /// Delay in frames between a write and the read that returns it.
    #[inline]
    pub fn delay(&self) -> usize {
        self.delay
    }

    /// Buffer length including headroom.
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Always false; a line holds at least one slot.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Advances both cursors by one frame, writing silence.
    #[inline]
    pub fn skip(&mut self) {
        self.read();
        self.write(0.0);
    }

    /// Extra slots beyond the delay.
    #[inline]
    pub fn headroom(&self) -> usize {
        self.buf.len() - self.delay
    }

    /// Zeroes the buffer without moving the cursors.
    pub fn clear(&mut self) {
        self.buf.fill(0.0);
    }
}

/// Delay node: outputs its input `N` frames late.
#[derive(Debug, Clone)]
pub struct Delay {
    input: NodeId,
    line: DelayLine,
}

impl Delay {
    /// Creates a delay of `duration`, rounded to the nearest frame.
    ///
    /// Returns an error if the duration rounds to zero frames.
    pub fn new(config: &GraphConfig, input: NodeId, duration: Duration) -> Result<Self> {
        Self::with_frames(config, input, config.frames(duration))
    }

    /// Creates a delay of exactly `frames` frames.
    pub fn with_frames(config: &GraphConfig, input: NodeId, frames: usize) -> Result<Self> {
        Ok(Self {
            input,
            line: DelayLine::new(frames, config.block_size)?,
        })
    }

    /// Delay length in frames.
    pub fn frames(&self) -> usize {
        self.line.delay()
    }

    /// The line taps read from.
    pub fn line(&self) -> &DelayLine {
        &self.line
    }
}

impl Render for Delay {
    fn render(&mut self, out: &mut [f64], signals: &Signals<'_>) -> bool {
        let input = signals.input(Some(self.input));
        for (i, o) in out.iter_mut().enumerate() {
            *o = self.line.read();
            self.line.write(input.as_ref().map_or(0.0, |x| x.sample(i)));
        }
        true
    }

    /// Keeps the line moving while off so taps drain instead of replaying
    /// the last block.
    fn silence(&mut self, out: &mut [f64]) {
        out.fill(0.0);
        for _ in 0..out.len() {
            self.line.skip();
        }
    }

    fn inputs(&self, into: &mut Vec<NodeId>) {
        into.push(self.input);
    }

    /// Taps read a whole block behind the write cursor, so the headroom must
    /// match the block size of the graph that runs this node.
    fn attach(&mut self, config: &GraphConfig) -> Result<()> {
        if self.line.headroom() != config.block_size {
            self.line = DelayLine::new(self.line.delay(), config.block_size)?;
        }
        Ok(())
    }
}

/// Secondary read cursor into a [`Delay`]'s buffer.
///
/// A tap with offset `f` outputs the delay's input `f` frames late, for any
/// `f` up to the delay's own length. Several taps on one delay build a
/// multi-tap echo from a single buffer.
#[derive(Debug, Clone)]
pub struct Tap {
    delay: NodeId,
    offset: usize,
    cursor: usize,
}

impl Tap {
    /// Creates a tap on `delay` trailing its input by `offset`.
    ///
    /// The offset is clamped to the delay's length when the tap is added to
    /// a graph.
    pub fn new(config: &GraphConfig, delay: NodeId, offset: Duration) -> Self {
        Self::with_frames(delay, config.frames(offset))
    }

    /// Creates a tap trailing by exactly `offset` frames.
    pub fn with_frames(delay: NodeId, offset: usize) -> Self {
        Self {
            delay,
            offset,
            cursor: 0,
        }
    }

    /// The delay node whose buffer this tap reads.
    pub fn delay(&self) -> NodeId {
        self.delay
    }

    /// Offset in frames.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Slot the next read comes from.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub(crate) fn clamp_offset(&mut self, max: usize) {
        self.offset = self.offset.min(max);
    }
}

impl Render for Tap {
    fn render(&mut self, out: &mut [f64], signals: &Signals<'_>) -> bool {
        let Some(line) = signals.delay_line(self.delay) else {
            out.fill(0.0);
            return true;
        };
        // The delay has already written this block, ending at its write
        // cursor; frame i of the block landed in slot end - len(out) + i.
        let len = line.len();
        let back = (out.len() + self.offset.min(line.delay())) % len;
        self.cursor = (line.write_position() + len - back) % len;
        for o in out.iter_mut() {
            *o = line.read_at(self.cursor);
            self.cursor = (self.cursor + 1) % len;
        }
        true
    }

    fn inputs(&self, into: &mut Vec<NodeId>) {
        into.push(self.delay);
    }
}
