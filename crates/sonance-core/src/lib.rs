//! Sonance Core - block-based signal graph and DSP nodes
//!
//! This crate provides the execution core of a real-time synthesis engine: a
//! graph of sound nodes that cooperatively produce fixed-size blocks of `f64`
//! samples, one tick at a time.
//!
//! # Core Abstractions
//!
//! ## Graph Execution
//!
//! - [`Graph`] - Arena of nodes, each behind its own lock
//! - [`resolve`] / [`Schedule`] - Longest-path weights and execution tiers
//! - [`Dispatcher`] - Runs tiers in order, nodes within a tier in parallel
//! - [`Engine`] - Graph, dispatcher and cached schedule behind one `tick()`
//!
//! ## Generators
//!
//! - [`Table`] - One period of a waveform with circular indexing
//! - [`Oscillator`] - Phase-accumulating table reader with FM/AM/PM inputs
//! - [`Unit`] - Constant, impulse and ramp sources
//!
//! ## Envelopes
//!
//! - [`Envelope`] - Sample-accurate ADSR with sustain lock
//! - [`Damp`] / [`Drive`] - Looping exponential decay and rise
//!
//! ## Filters and Buffers
//!
//! - [`LowPass`] - Recursive Gaussian low-pass
//! - [`BandPass`] - Two-pole resonator
//! - [`Delay`], [`Tap`], [`Comb`] - Circular-buffer effects
//! - [`Loop`], [`Freeze`] - Record-and-replay
//!
//! ## Routing
//!
//! - [`Mixer`], [`Ring`], [`Gain`], [`Pan`], [`Instrument`]
//!
//! # Example
//!
//! ```rust,ignore
//! use core::time::Duration;
//! use sonance_core::{Adsr, Dispatcher, Engine, Envelope, Graph, GraphConfig, Oscillator, Table};
//!
//! let config = GraphConfig::default();
//! let mut graph = Graph::new(config)?;
//! let osc = graph.add(Oscillator::new(&config, Table::sine(), 440.0, 0.5))?;
//! let env = graph.add(Envelope::new(&config, adsr).with_input(osc))?;
//!
//! let mut engine = Engine::new(graph, Dispatcher::new(0)?, env)?;
//! engine.tick()?;
//! let block = engine.output();
//! ```
//!
//! # Features
//!
//! - `tracing`: debug events when nodes are added or connected, schedules
//!   resolved, dispatchers built and freezes captured

pub mod comb;
pub mod config;
pub mod delay;
pub mod envelope;
pub mod error;
pub mod filter;
pub mod gain;
pub mod graph;
pub mod instrument;
pub mod looper;
pub mod mixer;
pub mod oscillator;
pub mod table;
pub mod unit;

// Re-export main types at crate root
pub use comb::Comb;
pub use config::{DEFAULT_BLOCK_SIZE, DEFAULT_SAMPLE_RATE, GraphConfig};
pub use delay::{Delay, DelayLine, Tap};
pub use envelope::{
    Adsr, Damp, Drive, Envelope, EnvelopeState, ReleaseCurve, damp_factor, drive_factor,
};
pub use error::{GraphError, Result};
pub use filter::{BandPass, LowPass, lowpass_coefficients};
pub use gain::{Gain, Pan, pan_gains};
pub use graph::{
    Dependency, Dispatcher, Engine, Graph, Node, NodeId, NodeKind, Schedule, resolve,
};
pub use instrument::Instrument;
pub use looper::{Freeze, Loop};
pub use mixer::{Mixer, Ring};
pub use oscillator::Oscillator;
pub use table::{DEFAULT_TABLE_LEN, Table};
pub use unit::{Unit, UnitMode};
