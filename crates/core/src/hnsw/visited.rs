//! Generation-stamped visited set for graph traversal.
//!
//! Node ids are dense, so membership is a `Vec<u32>` of stamps rather than a
//! `HashSet`. Resetting bumps the current stamp instead of zeroing the array.

use crate::hnsw::NodeId;

/// Visited set over dense node ids. A slot counts as visited when it holds the
/// current stamp. Zeroing only happens when the stamp would wrap.
#[derive(Debug)]
pub struct VisitedSet {
    stamps: Vec<u32>,
    current: u32,
}

impl VisitedSet {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            stamps: vec![0; capacity],
            current: 1,
        }
    }

    /// Forgets every visit and makes room for ids below `node_count`.
    pub fn reset(&mut self, node_count: usize) {
        if node_count > self.stamps.len() {
            self.stamps.resize(node_count, 0);
        }
        if self.current == u32::MAX {
            self.stamps.fill(0);
            self.current = 1;
        } else {
            self.current += 1;
        }
    }

    /// Marks `id` visited. Returns `true` if it was not visited before.
    #[inline]
    pub fn insert(&mut self, id: NodeId) -> bool {
        let idx = id as usize;
        if idx >= self.stamps.len() {
            self.stamps.resize(idx + 1, 0);
        }
        if self.stamps[idx] == self.current {
            false
        } else {
            self.stamps[idx] = self.current;
            true
        }
    }
}

impl Default for VisitedSet {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_reset() {
        let mut visited = VisitedSet::with_capacity(8);
        assert!(visited.insert(3));
        assert!(!visited.insert(3));
        assert!(visited.insert(4));

        visited.reset(8);
        assert!(visited.insert(3));
        assert!(!visited.insert(3));
    }

    #[test]
    fn test_grows_on_demand() {
        let mut visited = VisitedSet::default();
        assert!(visited.insert(100));
        assert!(!visited.insert(100));
        assert_eq!(visited.stamps.len(), 101);
    }

    #[test]
    fn test_stamp_wrap_clears_array() {
        let mut visited = VisitedSet::with_capacity(4);
        visited.current = u32::MAX;
        visited.insert(2);
        visited.reset(4);
        assert_eq!(visited.current, 1);
        assert!(visited.stamps.iter().all(|&s| s == 0));
        assert!(visited.insert(2));
    }
}
