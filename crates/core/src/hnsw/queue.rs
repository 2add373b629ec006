//! Indexed binary-heap candidate queue.
//!
//! One heap implementation serves both orderings used by the graph: a
//! [`NearestFirst`] frontier of nodes still to expand, and a [`FarthestFirst`]
//! result set whose worst member sits at the top so it can be evicted.
//!
//! Unlike `std::collections::BinaryHeap`, every id maps to its slot in the
//! backing array. Inserting an id that is already queued re-prioritizes the
//! existing entry in place, so the queue never holds duplicates.

use std::collections::HashMap;
use std::fmt;

use ordered_float::OrderedFloat;

use crate::error::{HnswError, Result};
use crate::hnsw::NodeId;

/// A queued node and its rank key (distance to the query).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub id: NodeId,
    pub distance: f32,
}

impl Candidate {
    pub fn new(id: NodeId, distance: f32) -> Self {
        Self { id, distance }
    }
}

/// Ordering strategy for a [`CandidateQueue`].
pub trait HeapOrder: Copy + fmt::Debug {
    /// Returns `true` when `a` must sit above `b` in the heap.
    fn precedes(&self, a: &Candidate, b: &Candidate) -> bool;
}

/// Min ordering: the smallest distance is on top ("closer wins").
#[derive(Debug, Clone, Copy, Default)]
pub struct NearestFirst;

/// Max ordering: the largest distance is on top ("farther wins").
#[derive(Debug, Clone, Copy, Default)]
pub struct FarthestFirst;

impl HeapOrder for NearestFirst {
    #[inline]
    fn precedes(&self, a: &Candidate, b: &Candidate) -> bool {
        OrderedFloat(a.distance) < OrderedFloat(b.distance)
    }
}

impl HeapOrder for FarthestFirst {
    #[inline]
    fn precedes(&self, a: &Candidate, b: &Candidate) -> bool {
        OrderedFloat(a.distance) > OrderedFloat(b.distance)
    }
}

/// Binary heap over [`Candidate`]s with O(1) identity lookup.
///
/// `positions[id]` is always the index of `id` in `items`; every swap during
/// a sift rewrites both entries.
#[derive(Debug, Clone)]
pub struct CandidateQueue<O: HeapOrder> {
    items: Vec<Candidate>,
    positions: HashMap<NodeId, usize>,
    order: O,
}

/// Frontier queue: closest candidate on top.
pub type MinQueue = CandidateQueue<NearestFirst>;
/// Capped result set: farthest candidate on top.
pub type MaxQueue = CandidateQueue<FarthestFirst>;

impl<O: HeapOrder> CandidateQueue<O> {
    /// Creates an empty queue bound to `order`.
    pub fn new(order: O) -> Self {
        Self {
            items: Vec::new(),
            positions: HashMap::new(),
            order,
        }
    }

    pub fn with_capacity(order: O, capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            positions: HashMap::with_capacity(capacity),
            order,
        }
    }

    /// Builds a queue from arbitrary candidates in O(n).
    /// A repeated id keeps its first slot and takes the later distance.
    pub fn from_candidates<I>(order: O, candidates: I) -> Self
    where
        I: IntoIterator<Item = Candidate>,
    {
        let iter = candidates.into_iter();
        let mut queue = Self::with_capacity(order, iter.size_hint().0);
        for candidate in iter {
            match queue.positions.get(&candidate.id) {
                Some(&pos) => queue.items[pos].distance = candidate.distance,
                None => {
                    queue.positions.insert(candidate.id, queue.items.len());
                    queue.items.push(candidate);
                }
            }
        }
        for pos in (0..queue.items.len() / 2).rev() {
            queue.sift_down(pos);
        }
        queue
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        self.positions.contains_key(&id)
    }

    /// Returns the queued entry for `id`, if any.
    pub fn get(&self, id: NodeId) -> Option<&Candidate> {
        self.positions.get(&id).map(|&pos| &self.items[pos])
    }

    /// Returns the current slot of `id` in the backing array.
    pub fn position_of(&self, id: NodeId) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    /// Peeks at the top-ranked candidate without removing it.
    #[inline]
    pub fn top(&self) -> Option<&Candidate> {
        self.items.first()
    }

    /// Inserts `id` with rank key `distance`.
    ///
    /// An id that is already queued is re-prioritized in place; the length
    /// does not change.
    pub fn insert(&mut self, id: NodeId, distance: f32) {
        if self.update(id, distance) {
            return;
        }
        let pos = self.items.len();
        self.items.push(Candidate { id, distance });
        self.positions.insert(id, pos);
        self.sift_up(pos);
    }

    /// Rewrites the distance of a queued id and restores heap order from its
    /// slot. Returns `false` when `id` is not queued.
    pub(crate) fn update(&mut self, id: NodeId, distance: f32) -> bool {
        match self.positions.get(&id) {
            Some(&pos) => {
                self.items[pos].distance = distance;
                self.fix(pos);
                true
            }
            None => false,
        }
    }

    /// Removes and returns the top-ranked candidate.
    pub fn pop_top(&mut self) -> Result<Candidate> {
        if self.items.is_empty() {
            return Err(HnswError::EmptyQueue);
        }
        let last = self.items.len() - 1;
        self.swap(0, last);
        let top = self.items.pop().ok_or(HnswError::EmptyQueue)?;
        self.positions.remove(&top.id);
        if !self.items.is_empty() {
            self.sift_down(0);
        }
        Ok(top)
    }

    /// Moves the `count` top-ranked candidates into a new queue ordered by `order`.
    ///
    /// Fails with [`HnswError::InsufficientItems`] when fewer than `count`
    /// items are held; the queue is left untouched in that case.
    pub fn take<P: HeapOrder>(&mut self, count: usize, order: P) -> Result<CandidateQueue<P>> {
        if count > self.items.len() {
            return Err(HnswError::InsufficientItems {
                requested: count,
                available: self.items.len(),
            });
        }
        let mut taken = CandidateQueue::with_capacity(order, count);
        for _ in 0..count {
            let candidate = self.pop_top()?;
            taken.insert(candidate.id, candidate.distance);
        }
        Ok(taken)
    }

    /// Copies the queued candidates into a new queue ordered by `order`.
    pub fn reorder<P: HeapOrder>(&self, order: P) -> CandidateQueue<P> {
        CandidateQueue::from_candidates(order, self.items.iter().copied())
    }

    /// Drains the queue in top-first order.
    pub fn into_sorted_vec(mut self) -> Vec<Candidate> {
        let mut out = Vec::with_capacity(self.items.len());
        while let Ok(candidate) = self.pop_top() {
            out.push(candidate);
        }
        out
    }

    /// Iterates the queued candidates in heap-array (unspecified) order.
    pub fn iter(&self) -> impl Iterator<Item = &Candidate> + '_ {
        self.items.iter()
    }

    /// Swaps two slots and rewrites both position handles.
    pub(crate) fn swap(&mut self, i: usize, j: usize) {
        self.items.swap(i, j);
        self.positions.insert(self.items[i].id, i);
        self.positions.insert(self.items[j].id, j);
    }

    /// Restores heap order after the item at `pos` changed rank.
    pub(crate) fn fix(&mut self, pos: usize) {
        if !self.sift_up(pos) {
            self.sift_down(pos);
        }
    }

    #[inline]
    fn ranks_above(&self, i: usize, j: usize) -> bool {
        self.order.precedes(&self.items[i], &self.items[j])
    }

    /// Returns `true` if the item moved.
    fn sift_up(&mut self, mut pos: usize) -> bool {
        let start = pos;
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if !self.ranks_above(pos, parent) {
                break;
            }
            self.swap(pos, parent);
            pos = parent;
        }
        pos != start
    }

    fn sift_down(&mut self, mut pos: usize) {
        let len = self.items.len();
        loop {
            let left = 2 * pos + 1;
            if left >= len {
                break;
            }
            let right = left + 1;
            let mut best = left;
            if right < len && self.ranks_above(right, left) {
                best = right;
            }
            if !self.ranks_above(best, pos) {
                break;
            }
            self.swap(pos, best);
            pos = best;
        }
    }
}

#[cfg(test)]
impl<O: HeapOrder> CandidateQueue<O> {
    /// Panics unless the heap property and the identity map both hold.
    fn assert_consistent(&self) {
        assert_eq!(self.items.len(), self.positions.len());
        for (pos, item) in self.items.iter().enumerate() {
            assert_eq!(self.positions.get(&item.id), Some(&pos), "stale handle for {}", item.id);
            if pos > 0 {
                let parent = (pos - 1) / 2;
                assert!(
                    !self.ranks_above(pos, parent),
                    "heap order broken at {pos} (parent {parent})"
                );
            }
        }
    }
}
