//! HNSW search: greedy descent through the upper layers and bounded
//! best-first search on a single layer.
//!
//! Layer search keeps two [`CandidateQueue`](crate::hnsw::CandidateQueue)s: a
//! [`MinQueue`] frontier of nodes to expand and a [`MaxQueue`] result set
//! capped at `ef`, whose farthest member is evicted when something closer
//! arrives.

use std::cell::RefCell;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::hnsw::graph::HnswGraph;
use crate::hnsw::queue::{Candidate, FarthestFirst, MaxQueue, MinQueue, NearestFirst};
use crate::hnsw::visited::VisitedSet;
use crate::hnsw::NodeId;

thread_local! {
    /// Per-thread visited set reused across searches to avoid a fresh
    /// allocation per query.
    static SEARCH_VISITED: RefCell<VisitedSet> = RefCell::new(VisitedSet::default());
}

/// A search hit: node id and its Euclidean distance to the query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub id: NodeId,
    pub distance: f32,
}

impl From<Candidate> for Neighbor {
    fn from(c: Candidate) -> Self {
        Self {
            id: c.id,
            distance: c.distance,
        }
    }
}

/// Walks `layer` from `start`, moving to any friend strictly closer to
/// `query` until none is. Returns the local minimum reached.
pub fn greedy_closest(
    graph: &HnswGraph,
    query: &[f32],
    start: NodeId,
    layer: usize,
) -> Result<Candidate> {
    graph.check_dimension(query)?;
    graph.try_node(start)?;

    let mut current = Candidate::new(start, graph.distance_to(query, start));
    loop {
        let mut moved = false;
        for &friend in graph.nodes()[current.id as usize].friends(layer) {
            let dist = graph.distance_to(query, friend);
            if dist < current.distance {
                current = Candidate::new(friend, dist);
                moved = true;
            }
        }
        if !moved {
            return Ok(current);
        }
    }
}

/// Best-first search of a single layer.
///
/// Returns up to `ef` nodes closest to `query` reachable from `entry_points`,
/// as a max-ordered queue (the farthest kept node on top). `visited` is reset
/// at the start of the call.
pub fn search_layer(
    graph: &HnswGraph,
    query: &[f32],
    entry_points: &[NodeId],
    ef: usize,
    layer: usize,
    visited: &mut VisitedSet,
) -> Result<MaxQueue> {
    graph.check_dimension(query)?;
    visited.reset(graph.len());
    let ef = ef.max(1);
    // ef may far exceed the graph; neither queue can outgrow the node count
    let hint = ef.min(graph.len());
    let mut frontier = MinQueue::with_capacity(NearestFirst, hint.saturating_mul(2));
    let mut results = MaxQueue::with_capacity(FarthestFirst, hint.saturating_add(1));

    for &ep in entry_points {
        graph.try_node(ep)?;
        if visited.insert(ep) {
            let dist = graph.distance_to(query, ep);
            frontier.insert(ep, dist);
            results.insert(ep, dist);
            if results.len() > ef {
                results.pop_top()?;
            }
        }
    }

    while let Ok(closest) = frontier.pop_top() {
        let worst = results.top().map_or(f32::INFINITY, |c| c.distance);
        // Once the result set is full, nothing past its worst member can improve it
        if results.len() >= ef && closest.distance > worst {
            break;
        }

        for &friend in graph.nodes()[closest.id as usize].friends(layer) {
            if !visited.insert(friend) {
                continue;
            }
            let dist = graph.distance_to(query, friend);
            let worst = results.top().map_or(f32::INFINITY, |c| c.distance);
            if results.len() < ef || dist < worst {
                frontier.insert(friend, dist);
                results.insert(friend, dist);
                if results.len() > ef {
                    results.pop_top()?;
                }
            }
        }
    }

    Ok(results)
}

/// Drains a max-ordered result set into at most `k` neighbors, closest first.
pub(crate) fn closest_k(mut results: MaxQueue, k: usize) -> Result<Vec<Neighbor>> {
    while results.len() > k {
        results.pop_top()?;
    }
    let count = results.len();
    let ascending = results.take(count, NearestFirst)?;
    Ok(ascending
        .into_sorted_vec()
        .into_iter()
        .map(Neighbor::from)
        .collect())
}

impl HnswGraph {
    /// Approximate `k` nearest neighbors of `query`, closest first.
    ///
    /// `ef` sets the layer-0 breadth and is raised to `k` when smaller. An
    /// empty graph yields an empty result, never an error. Fewer than `k`
    /// neighbors come back only when the graph holds fewer than `k` nodes
    /// reachable from the entry point.
    pub fn search(&self, query: &[f32], k: usize, ef: usize) -> Result<Vec<Neighbor>> {
        let Some(entry_point) = self.entry_point() else {
            return Ok(Vec::new());
        };
        self.check_dimension(query)?;
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut current = entry_point;
        for layer in (1..=self.max_layer()).rev() {
            current = greedy_closest(self, query, current, layer)?.id;
        }

        let results = SEARCH_VISITED.with(|cell| {
            let mut visited = cell.borrow_mut();
            search_layer(self, query, &[current], ef.max(k), 0, &mut visited)
        })?;
        closest_k(results, k)
    }
}

/// Multi-layer KNN search using the graph's configured `ef_search`.
pub fn knn_search(graph: &HnswGraph, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
    graph.search(query, k, graph.config().ef_search)
}

/// Brute-force `k` nearest neighbors, closest first. Reference for recall
/// measurements; scans every node.
pub fn exact_search(graph: &HnswGraph, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
    graph.check_dimension(query)?;
    if k == 0 {
        return Ok(Vec::new());
    }
    let mut results = MaxQueue::with_capacity(FarthestFirst, k.min(graph.len()).saturating_add(1));
    for node in graph.nodes() {
        let dist = graph.distance_to(query, node.id());
        if results.len() < k || results.top().is_some_and(|worst| dist < worst.distance) {
            results.insert(node.id(), dist);
            if results.len() > k {
                results.pop_top()?;
            }
        }
    }
    closest_k(results, k)
}
