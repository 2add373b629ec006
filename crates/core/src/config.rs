//! Global configuration constants for vectorgraph.
//!
//! These are compile-time defaults; per-graph tuning lives in
//! [`HnswConfig`](crate::hnsw::HnswConfig) and the CLI flags built on it.

/// Default number of bidirectional links per node above layer 0.
///
/// Higher values improve recall but increase memory and build time.
/// Typical range: 8–64. Default: 16.
pub const HNSW_DEFAULT_M: usize = 16;

/// Default ef parameter during index construction.
///
/// Controls the size of the candidate pool gathered per layer on insert.
pub const HNSW_DEFAULT_EF_CONSTRUCTION: usize = 200;

/// Default ef parameter during search.
///
/// Controls the size of the layer-0 result set. Higher values improve recall
/// at the cost of latency. Always raised to at least `k`.
pub const HNSW_DEFAULT_EF_SEARCH: usize = 50;

/// Maximum number of layers in the graph. Drawn levels are capped at `MAX_LAYERS - 1`.
pub const HNSW_DEFAULT_MAX_LAYERS: usize = 16;

/// Upper bound accepted for `max_layers`. With `mL = 1/ln(2)` a 64-layer
/// graph would need around 2^63 nodes to fill.
pub const HNSW_MAX_LAYERS_LIMIT: usize = 64;

/// Absolute and relative tolerance used by [`nearly_equal`](crate::hnsw::distance::nearly_equal).
pub const FLOAT_TOLERANCE: f32 = 1e-6;

/// Maximum allowed vector dimension.
pub const MAX_DIMENSION: usize = 4096;

/// Maximum number of results (`k`) per search request.
pub const MAX_K: usize = 10_000;

/// Magic bytes written before the CRC32 footer of a snapshot file.
pub const SNAPSHOT_MAGIC: &[u8; 4] = b"VGS1";

/// File extension used by the CLI for snapshot files.
pub const SNAPSHOT_EXTENSION: &str = "vgs";
