//! Error types for the ANN core.

use thiserror::Error;

use crate::hnsw::NodeId;

/// Errors that can occur in queue, graph, or persistence operations.
///
/// None of these are retried internally: insert and search are deterministic
/// for a given graph state, so the caller decides what to do next.
#[derive(Debug, Error)]
pub enum HnswError {
    /// Vector length disagrees with the graph's (or the other operand's) dimension.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// The expected dimension.
        expected: usize,
        /// The actual dimension.
        actual: usize,
    },

    /// `pop_top` on a queue without items.
    #[error("candidate queue is empty")]
    EmptyQueue,

    /// `take(count)` asked for more items than the queue holds.
    #[error("queue only has {available} items, but {requested} were requested")]
    InsufficientItems {
        /// Number of items requested.
        requested: usize,
        /// Number of items held by the queue.
        available: usize,
    },

    /// A node id that is not part of the graph.
    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    /// Rejected graph configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O failure in the persistence layer.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot encoding/decoding failure.
    #[error("codec error: {0}")]
    Codec(String),

    /// Persisted state that violates a graph invariant.
    #[error("corrupted snapshot: {0}")]
    Corrupted(String),
}

impl From<bincode::Error> for HnswError {
    fn from(e: bincode::Error) -> Self {
        HnswError::Codec(e.to_string())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, HnswError>;
