//! HNSW graph structure and configuration.
//!
//! [`HnswConfig`] defines tuning parameters (M, ef_construction, ef_search, level normalization).
//! [`HnswGraph`] owns every [`Node`], the entry point, and the current maximum layer.

use ordered_float::OrderedFloat;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config;
use crate::error::{HnswError, Result};
use crate::hnsw::distance::distance_unchecked;
use crate::hnsw::node::Node;
use crate::hnsw::NodeId;

/// Configuration parameters for an HNSW graph.
///
/// Controls the trade-off between build speed, search speed, recall, and memory usage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HnswConfig {
    /// Degree bound for every layer above 0.
    pub m: usize,
    /// Degree bound at layer 0 (typically `2 * m`).
    pub m_max0: usize,
    /// Candidate pool size gathered per layer during insertion.
    pub ef_construction: usize,
    /// Default layer-0 result set size during search (raised to `k` when smaller).
    pub ef_search: usize,
    /// Maximum number of layers in the graph.
    pub max_layers: usize,
    /// Level normalization `mL`: a node reaches layer `floor(-ln(U) * mL)`.
    pub level_multiplier: f64,
    /// Seed for level generation. `None` draws from OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl HnswConfig {
    /// Config with degree bound `m`, `m_max0 = 2m`, and `mL = 1/ln(m)`.
    pub fn with_m(m: usize) -> Self {
        Self {
            m,
            m_max0: m.saturating_mul(2),
            level_multiplier: 1.0 / (m as f64).ln(),
            ..Self::default()
        }
    }

    /// Fixes the level-generation seed so graph construction is reproducible.
    pub fn seeded(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.m < 2 {
            return Err(HnswError::InvalidConfig(format!("m must be at least 2, got {}", self.m)));
        }
        if self.m_max0 < self.m {
            return Err(HnswError::InvalidConfig(format!(
                "m_max0 ({}) must not be smaller than m ({})",
                self.m_max0, self.m
            )));
        }
        for (name, ef) in [("ef_construction", self.ef_construction), ("ef_search", self.ef_search)] {
            if ef == 0 || ef > config::MAX_K {
                return Err(HnswError::InvalidConfig(format!(
                    "{name} must be in 1..={}, got {ef}",
                    config::MAX_K
                )));
            }
        }
        if self.max_layers == 0 || self.max_layers > config::HNSW_MAX_LAYERS_LIMIT {
            return Err(HnswError::InvalidConfig(format!(
                "max_layers must be in 1..={}, got {}",
                config::HNSW_MAX_LAYERS_LIMIT,
                self.max_layers
            )));
        }
        if !(self.level_multiplier.is_finite() && self.level_multiplier > 0.0) {
            return Err(HnswError::InvalidConfig(format!(
                "level_multiplier must be finite and positive, got {}",
                self.level_multiplier
            )));
        }
        Ok(())
    }
}

impl Default for HnswConfig {
    fn default() -> Self {
        Self {
            m: config::HNSW_DEFAULT_M,
            m_max0: config::HNSW_DEFAULT_M * 2,
            ef_construction: config::HNSW_DEFAULT_EF_CONSTRUCTION,
            ef_search: config::HNSW_DEFAULT_EF_SEARCH,
            max_layers: config::HNSW_DEFAULT_MAX_LAYERS,
            level_multiplier: 1.0 / (config::HNSW_DEFAULT_M as f64).ln(),
            seed: None,
        }
    }
}

/// Level generator for a graph holding `node_count` nodes. A seeded graph
/// gets a distinct stream per node count, so a rehydrated graph does not
/// replay the levels its first nodes were given.
fn level_rng(seed: Option<u64>, node_count: usize) -> StdRng {
    match seed {
        Some(seed) => {
            let offset = (node_count as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
            StdRng::seed_from_u64(seed ^ offset)
        }
        None => StdRng::from_entropy(),
    }
}

/// In-memory HNSW graph.
///
/// Node ids are indices into `nodes`. Callers sharing a graph across threads
/// must serialize writers (e.g. behind a `RwLock`).
#[derive(Debug, Clone)]
pub struct HnswGraph {
    config: HnswConfig,
    dimension: usize,
    nodes: Vec<Node>,
    entry_point: Option<NodeId>,
    max_layer: usize,
    rng: StdRng,
}

impl HnswGraph {
    /// Creates an empty graph for vectors of length `dimension`.
    pub fn new(dimension: usize, config: HnswConfig) -> Result<Self> {
        config.validate()?;
        if dimension == 0 || dimension > config::MAX_DIMENSION {
            return Err(HnswError::InvalidConfig(format!(
                "dimension must be in 1..={}, got {}",
                config::MAX_DIMENSION,
                dimension
            )));
        }
        let rng = level_rng(config.seed, 0);
        Ok(Self {
            config,
            dimension,
            nodes: Vec::new(),
            entry_point: None,
            max_layer: 0,
            rng,
        })
    }

    /// Creates an empty graph with default configuration (M=16, ef_c=200, ef_s=50).
    pub fn with_default_config(dimension: usize) -> Result<Self> {
        Self::new(dimension, HnswConfig::default())
    }

    /// Reassembles a graph from persisted state and checks its invariants.
    pub(crate) fn from_parts(
        dimension: usize,
        config: HnswConfig,
        nodes: Vec<Node>,
        entry_point: Option<NodeId>,
        max_layer: usize,
    ) -> Result<Self> {
        let mut graph = Self::new(dimension, config)?;
        let count = nodes.len();
        for (idx, node) in nodes.iter().enumerate() {
            if node.id() as usize != idx {
                return Err(HnswError::Corrupted(format!(
                    "node at slot {idx} carries id {}",
                    node.id()
                )));
            }
            graph.check_dimension(node.vector())?;
            let layer = node.layer().ok_or_else(|| {
                HnswError::Corrupted(format!("node {idx} has no friend lists"))
            })?;
            if layer > max_layer {
                return Err(HnswError::Corrupted(format!(
                    "node {idx} sits on layer {layer} above max layer {max_layer}"
                )));
            }
            let dangling = node
                .all_friends()
                .iter()
                .flatten()
                .find(|&&f| f as usize >= count);
            if let Some(f) = dangling {
                return Err(HnswError::Corrupted(format!("node {idx} links to unknown node {f}")));
            }
        }
        match entry_point {
            Some(ep) => {
                let ep_layer = nodes
                    .get(ep as usize)
                    .and_then(Node::layer)
                    .ok_or_else(|| HnswError::Corrupted(format!("entry point {ep} not found")))?;
                if ep_layer != max_layer {
                    return Err(HnswError::Corrupted(format!(
                        "entry point {ep} is on layer {ep_layer}, expected {max_layer}"
                    )));
                }
            }
            None if count > 0 => {
                return Err(HnswError::Corrupted("non-empty graph without entry point".into()));
            }
            None => {}
        }
        // Continue the level sequence past the nodes already drawn
        graph.rng = level_rng(graph.config.seed, count);
        graph.nodes = nodes;
        graph.entry_point = entry_point;
        graph.max_layer = max_layer;
        Ok(graph)
    }

    pub fn config(&self) -> &HnswConfig {
        &self.config
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The node every descent starts from; `None` only while the graph is empty.
    #[inline]
    pub fn entry_point(&self) -> Option<NodeId> {
        self.entry_point
    }

    /// Highest layer any node has been assigned. `0` for an empty graph.
    #[inline]
    pub fn max_layer(&self) -> usize {
        self.max_layer
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id as usize)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Like [`node`](Self::node) but fails with [`HnswError::NodeNotFound`].
    pub fn try_node(&self, id: NodeId) -> Result<&Node> {
        self.node(id).ok_or(HnswError::NodeNotFound(id))
    }

    pub fn check_dimension(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(HnswError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(())
    }

    /// Maximum friend-list size at `layer`: `m_max0` on layer 0, `m` above.
    #[inline]
    pub fn degree_bound(&self, layer: usize) -> usize {
        if layer == 0 {
            self.config.m_max0
        } else {
            self.config.m
        }
    }

    /// Draws a layer for a new node: `floor(-ln(U) * mL)`, capped at `max_layers - 1`.
    pub fn random_level(&mut self) -> usize {
        let r: f64 = self.rng.gen();
        // r == 0 gives +inf, which saturates in the cast and is capped below
        let level = (-r.ln() * self.config.level_multiplier).floor() as usize;
        level.min(self.config.max_layers - 1)
    }

    /// Distance from `query` to a node. `query` must match the graph dimension.
    #[inline]
    pub(crate) fn distance_to(&self, query: &[f32], id: NodeId) -> f32 {
        distance_unchecked(query, self.nodes[id as usize].vector())
    }

    /// Next free node id.
    pub(crate) fn next_id(&self) -> Result<NodeId> {
        NodeId::try_from(self.nodes.len())
            .map_err(|_| HnswError::InvalidConfig("node id space exhausted".into()))
    }

    pub(crate) fn push_node(&mut self, node: Node) {
        debug_assert_eq!(node.id() as usize, self.nodes.len());
        self.nodes.push(node);
    }

    /// Makes `id` the entry point if it sits above the current max layer.
    /// Returns `true` on promotion.
    pub(crate) fn promote_if_higher(&mut self, id: NodeId, layer: usize) -> bool {
        if self.entry_point.is_none() || layer > self.max_layer {
            self.entry_point = Some(id);
            self.max_layer = layer;
            return true;
        }
        false
    }

    /// Wires a bidirectional edge between `a` and `b` at `layer`, pruning
    /// either friend list back to the layer's degree bound if it overflows.
    pub(crate) fn connect(&mut self, a: NodeId, b: NodeId, layer: usize) {
        if a == b {
            return;
        }
        self.add_friend(a, b, layer);
        self.add_friend(b, a, layer);
    }

    fn add_friend(&mut self, owner: NodeId, friend: NodeId, layer: usize) {
        let bound = self.degree_bound(layer);
        let Some(list) = self
            .nodes
            .get_mut(owner as usize)
            .and_then(|n| n.friends_mut(layer))
        else {
            return;
        };
        if list.contains(&friend) {
            return;
        }
        list.push(friend);
        if list.len() > bound {
            self.prune_friends(owner, layer, bound);
        }
    }

    /// Keeps the `bound` friends nearest to `owner`, dropping the farthest.
    fn prune_friends(&mut self, owner: NodeId, layer: usize, bound: usize) {
        let owner_node = &self.nodes[owner as usize];
        let mut ranked: Vec<(OrderedFloat<f32>, NodeId)> = owner_node
            .friends(layer)
            .iter()
            .map(|&fid| {
                let d = owner_node.distance_to_node(&self.nodes[fid as usize]);
                (OrderedFloat(d), fid)
            })
            .collect();
        ranked.sort_unstable();
        let dropped = ranked.len().saturating_sub(bound);
        ranked.truncate(bound);
        tracing::trace!(owner, layer, dropped, "pruned friend list");

        if let Some(list) = self.nodes[owner as usize].friends_mut(layer) {
            list.clear();
            list.extend(ranked.into_iter().map(|(_, id)| id));
        }
    }

    /// Mean friend-list length at `layer` over the nodes that reach it.
    pub fn mean_degree(&self, layer: usize) -> f64 {
        let (sum, count) = self
            .nodes
            .iter()
            .filter(|n| n.layer().is_some_and(|l| l >= layer))
            .fold((0usize, 0usize), |(s, c), n| (s + n.friends(layer).len(), c + 1));
        if count == 0 {
            0.0
        } else {
            sum as f64 / count as f64
        }
    }
}
