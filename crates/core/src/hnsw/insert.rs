//! HNSW insertion.
//!
//! A new node is placed on a random layer, the graph is descended greedily
//! down to that layer, and on every layer from there to 0 the node is wired to
//! the closest members of a best-first candidate pool. Neighbor selection and
//! overflow pruning both keep the nearest by distance.

use crate::error::Result;
use crate::hnsw::graph::HnswGraph;
use crate::hnsw::node::Node;
use crate::hnsw::queue::{MaxQueue, NearestFirst};
use crate::hnsw::search::{greedy_closest, search_layer};
use crate::hnsw::visited::VisitedSet;
use crate::hnsw::NodeId;

impl HnswGraph {
    /// Inserts `vector` and returns its new node id.
    ///
    /// Fails only on a dimension mismatch, in which case the graph is left
    /// unchanged. Neighbors are chosen before the node is added, so the node
    /// is complete by the time any edge points at it.
    pub fn insert(&mut self, vector: Vec<f32>) -> Result<NodeId> {
        self.check_dimension(&vector)?;
        let id = self.next_id()?;
        let level = self.random_level();
        let mut node = Node::new(id, vector);
        node.assign_layer(level);

        let Some(entry_point) = self.entry_point() else {
            self.push_node(node);
            self.promote_if_higher(id, level);
            tracing::debug!(id, level, "first node placed as entry point");
            return Ok(id);
        };

        // Phase 1: greedy descent from the top layer down to level + 1
        let query = node.vector();
        let mut current = entry_point;
        for layer in (level + 1..=self.max_layer()).rev() {
            current = greedy_closest(self, query, current, layer)?.id;
        }

        // Phase 2: collect neighbors on every layer the node shares with the graph
        let top = level.min(self.max_layer());
        let ef = self.config().ef_construction;
        let mut visited = VisitedSet::with_capacity(self.len());
        let mut layer_eps = vec![current];
        let mut selected: Vec<(usize, Vec<NodeId>)> = Vec::with_capacity(top + 1);
        for layer in (0..=top).rev() {
            let pool = search_layer(self, query, &layer_eps, ef, layer, &mut visited)?;
            let neighbors = select_closest(&pool, self.degree_bound(layer))?;

            // The whole pool seeds the next layer down
            layer_eps.clear();
            layer_eps.extend(pool.iter().map(|c| c.id));
            if layer_eps.is_empty() {
                layer_eps.push(entry_point);
            }
            selected.push((layer, neighbors));
        }

        // Phase 3: add the node, then wire bidirectional edges with pruning
        self.push_node(node);
        for (layer, neighbors) in selected {
            for neighbor in neighbors {
                self.connect(id, neighbor, layer);
            }
        }

        if self.promote_if_higher(id, level) {
            tracing::debug!(id, level, "new entry point");
        }
        Ok(id)
    }

    /// Inserts every vector in order, returning the assigned ids.
    ///
    /// Stops at the first failing vector; vectors inserted before it stay in
    /// the graph.
    pub fn insert_batch<I>(&mut self, vectors: I) -> Result<Vec<NodeId>>
    where
        I: IntoIterator<Item = Vec<f32>>,
    {
        let iter = vectors.into_iter();
        let mut ids = Vec::with_capacity(iter.size_hint().0);
        for vector in iter {
            ids.push(self.insert(vector)?);
        }
        tracing::debug!(
            inserted = ids.len(),
            nodes = self.len(),
            max_layer = self.max_layer(),
            "batch insert complete"
        );
        Ok(ids)
    }
}

/// Picks the `m` closest members of a candidate pool, closest first.
pub fn select_closest(pool: &MaxQueue, m: usize) -> Result<Vec<NodeId>> {
    let mut nearest = pool.reorder(NearestFirst);
    let count = m.min(nearest.len());
    let chosen = nearest.take(count, NearestFirst)?;
    Ok(chosen.into_sorted_vec().into_iter().map(|c| c.id).collect())
}
