//! Engine configuration for the sonance signal graph.
//!
//! Settings live in a small TOML file:
//!
//! ```toml
//! sample_rate = 48000.0
//! block_size = 128
//! workers = 4
//! format = "f32"
//! ```
//!
//! [`EngineConfig`] loads and saves that file, validates it against the graph's
//! rules, and hands out the pieces an embedding program needs: a
//! [`GraphConfig`](sonance_core::GraphConfig), a
//! [`Dispatcher`](sonance_core::Dispatcher) and a
//! [`PcmFormat`](sonance_io::PcmFormat).
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sonance_config::EngineConfig;
//! use sonance_core::{Engine, Graph};
//! use sonance_io::Player;
//!
//! let config = EngineConfig::load("engine.toml")?;
//! let mut graph = Graph::new(config.graph_config()?)?;
//! // ... add nodes ...
//! let engine = Engine::new(graph, config.dispatcher()?, root)?;
//! let player = Player::new(engine, config.pcm_format());
//! ```

mod engine_config;
mod error;

pub use engine_config::{EngineConfig, SampleFormat};
pub use error::ConfigError;
