//! Graph node: the stored vector, its assigned top layer, and one friend list
//! per layer from 0 up to that layer.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::hnsw::distance::{distance_unchecked, euclidean_distance};
use crate::hnsw::NodeId;

/// A vector stored in the graph.
///
/// `layer` is `None` until the node has been placed; after
/// [`assign_layer`](Node::assign_layer) it holds exactly `layer + 1` friend lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    id: NodeId,
    vector: Vec<f32>,
    layer: Option<usize>,
    // [layer][neighbor_ids]
    friends: Vec<Vec<NodeId>>,
}

impl Node {
    /// Creates an unplaced node with no friend lists.
    pub fn new(id: NodeId, vector: Vec<f32>) -> Self {
        Self {
            id,
            vector,
            layer: None,
            friends: Vec::new(),
        }
    }

    /// Rebuilds a placed node from persisted parts. The top layer is implied
    /// by the number of friend lists.
    pub(crate) fn from_parts(id: NodeId, vector: Vec<f32>, friends: Vec<Vec<NodeId>>) -> Self {
        let layer = friends.len().checked_sub(1);
        Self {
            id,
            vector,
            layer,
            friends,
        }
    }

    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[inline]
    pub fn vector(&self) -> &[f32] {
        &self.vector
    }

    /// The node's top layer, or `None` while unplaced.
    #[inline]
    pub fn layer(&self) -> Option<usize> {
        self.layer
    }

    /// Places the node on `layer` and allocates empty friend lists for
    /// layers `0..=layer`.
    pub fn assign_layer(&mut self, layer: usize) {
        self.layer = Some(layer);
        self.friends = vec![Vec::new(); layer + 1];
    }

    /// Friend list at `layer`; empty above the node's top layer.
    #[inline]
    pub fn friends(&self, layer: usize) -> &[NodeId] {
        self.friends.get(layer).map_or(&[], |f| f.as_slice())
    }

    /// All friend lists, indexed by layer.
    pub fn all_friends(&self) -> &[Vec<NodeId>] {
        &self.friends
    }

    pub(crate) fn friends_mut(&mut self, layer: usize) -> Option<&mut Vec<NodeId>> {
        self.friends.get_mut(layer)
    }

    /// Euclidean distance from this node's vector to `v`.
    pub fn distance_to(&self, v: &[f32]) -> Result<f32> {
        euclidean_distance(&self.vector, v)
    }

    /// Euclidean distance between two nodes of the same graph.
    #[inline]
    pub fn distance_to_node(&self, other: &Node) -> f32 {
        distance_unchecked(&self.vector, &other.vector)
    }
}
