//! # vectorgraph-core
//!
//! In-memory approximate nearest neighbor index over fixed-dimension `f32`
//! vectors, built on the Hierarchical Navigable Small World (HNSW) graph.
//!
//! The crate has no async or threading dependencies. A graph is a plain value:
//! callers that share one across threads serialize writers themselves.

/// Global configuration constants: graph defaults, tolerances, and input limits.
pub mod config;
/// Error taxonomy shared by the queue, graph, and persistence layers.
pub mod error;
/// HNSW index: distance metric, candidate queue, node/graph model, insert, and search.
pub mod hnsw;
/// Persistence collaborator: graph header / node loading and checksummed snapshot files.
pub mod storage;

pub use error::{HnswError, Result};
pub use hnsw::{HnswConfig, HnswGraph, Neighbor, NodeId};
