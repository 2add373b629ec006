//! Hierarchical Navigable Small World (HNSW) approximate nearest neighbor index.
//!
//! Every node lives on layer 0; each higher layer holds an exponentially
//! thinner subset. Search descends greedily from the entry point through the
//! upper layers and finishes with a bounded best-first search on layer 0.
//!
//! Both insert and search accumulate candidates in a [`CandidateQueue`]: a
//! binary heap with an identity map, so a node reached twice is re-prioritized
//! in place instead of being queued again.

/// Euclidean distance and tolerance-aware float equality.
pub mod distance;
/// HNSW graph structure, configuration, level generation, and edge wiring.
pub mod graph;
/// HNSW insertion: greedy descent, per-layer candidate search, and bidirectional wiring.
pub mod insert;
/// Graph node: vector, assigned layer, and per-layer friend lists.
pub mod node;
/// Indexed binary-heap candidate queue with min and max orderings.
pub mod queue;
/// HNSW search: greedy descent, single-layer best-first search, and multi-layer KNN.
pub mod search;
/// Generation-based visited set for graph traversal.
pub mod visited;

/// Identity of a node. Assigned sequentially on insert and never reused.
pub type NodeId = u32;

pub use distance::{euclidean_distance, nearly_equal};
pub use graph::{HnswConfig, HnswGraph};
pub use node::Node;
pub use queue::{Candidate, CandidateQueue, FarthestFirst, HeapOrder, MaxQueue, MinQueue, NearestFirst};
pub use search::{exact_search, knn_search, Neighbor};
