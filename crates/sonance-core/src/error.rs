//! Error types for graph construction and dispatch.
//!
//! Everything here is a construction-time failure. Per-tick numerical edge
//! cases (zero-length segments, out-of-range modulator values) are clamped
//! locally by the nodes and never surface as errors.

use thiserror::Error;

use crate::graph::NodeId;

/// Errors that can occur while building or scheduling a signal graph.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Sample rate was zero, negative or not finite.
    #[error("sample rate must be finite and positive, got {0}")]
    InvalidSampleRate(f64),

    /// Block size was zero or not a power of two.
    #[error("block size must be a non-zero power of two, got {0}")]
    InvalidBlockSize(usize),

    /// A signal table was built with no samples.
    #[error("signal table must hold at least one sample")]
    EmptyTable,

    /// A duration-based buffer rounded down to zero frames.
    #[error("{what} must span at least one frame")]
    ZeroLength {
        /// Which buffer was requested.
        what: &'static str,
    },

    /// A constructor parameter was out of its valid domain.
    #[error("invalid {name}: {value}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Rejected value.
        value: f64,
    },

    /// The requested node was not found in the graph.
    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    /// The node exists but is not of the kind the operation needs.
    #[error("node {id} is not a {expected}")]
    WrongKind {
        /// Offending node.
        id: NodeId,
        /// Kind the operation expected.
        expected: &'static str,
    },

    /// Following declared inputs leads back to a node already on the path.
    #[error("dependency cycle detected")]
    CycleDetected,

    /// The worker pool for tier dispatch could not be created.
    #[error("failed to build dispatch pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl GraphError {
    /// Create a zero-length error for the named buffer.
    pub fn zero_length(what: &'static str) -> Self {
        Self::ZeroLength { what }
    }

    /// Create an invalid-parameter error.
    pub fn invalid(name: &'static str, value: f64) -> Self {
        Self::InvalidParameter { name, value }
    }
}

/// Result type for graph operations.
pub type Result<T> = core::result::Result<T, GraphError>;
