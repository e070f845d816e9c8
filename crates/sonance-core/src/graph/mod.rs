//! Signal graph execution core.
//!
//! # Architecture
//!
//! - [`Graph`]: an arena of [`Node`]s, each behind its own lock. Nodes name
//!   their inputs by [`NodeId`], so identity is the arena index, never a
//!   pointer.
//! - [`resolve()`]: depth-first dependency discovery from a root node into a
//!   [`Schedule`] of weighted tiers.
//! - [`Dispatcher`]: runs tiers deepest first, preparing the nodes of one tier
//!   in parallel with a barrier between tiers.
//! - [`Engine`]: bundles the three and advances one tick per pull.
//!
//! Every node guards against double preparation by remembering the last tick
//! it ran, so a node reached through several paths computes once per tick.
//!
//! # Scheduling footgun
//!
//! Only nodes reachable through [`Node::inputs()`] are scheduled. Variants
//! derive their inputs from the same fields they read during `prepare`, so an
//! input cannot be read without being declared.
//!
//! # Example
//!
//! ```rust,ignore
//! use sonance_core::graph::{Dispatcher, Engine, Graph};
//! use sonance_core::{GraphConfig, Mixer, Oscillator, Table};
//!
//! let mut graph = Graph::new(GraphConfig::default())?;
//! let config = *graph.config();
//! let osc = graph.add(Oscillator::new(&config, Table::sine(), 440.0, 0.5))?;
//! let mix = graph.add(Mixer::with_inputs(vec![osc]))?;
//!
//! let mut engine = Engine::new(graph, Dispatcher::new(0)?, mix)?;
//! engine.tick()?;
//! let block = engine.output();
//! ```

mod dispatch;
mod engine;
mod node;
mod processing;
mod schedule;

pub use dispatch::Dispatcher;
pub use engine::Engine;
pub use node::{Node, NodeId, NodeKind};
pub(crate) use node::{Render, Signals};
pub use processing::Graph;
pub use schedule::{Dependency, Schedule, resolve};
