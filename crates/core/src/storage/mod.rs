//! Storage layer: persistence collaborator for the in-memory graph.
//!
//! The graph itself never touches disk. At startup it is rehydrated from a
//! [`GraphStore`] (graph header plus one node at a time); [`SnapshotFile`] is
//! the bundled implementation, a bincode snapshot written atomically with a
//! CRC32 footer.

/// Graph header / node loading and checksummed snapshot files.
pub mod persistence;

pub use persistence::{GraphHeader, GraphStore, SnapshotFile, StoredNode};
