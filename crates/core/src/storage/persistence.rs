//! Graph persistence using bincode snapshots.
//!
//! The graph only needs two primitives from a store: the graph header and
//! one node at a time ([`GraphStore`]). [`SnapshotFile`] implements them on
//! top of a single file written atomically (temp file + rename) with a CRC32
//! footer: `[bincode payload][magic "VGS1"][u32 CRC32 BE]`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::SNAPSHOT_MAGIC;
use crate::error::{HnswError, Result};
use crate::hnsw::graph::{HnswConfig, HnswGraph};
use crate::hnsw::node::Node;
use crate::hnsw::NodeId;

/// Graph-level state needed before any node can be loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphHeader {
    pub dimension: usize,
    pub node_count: usize,
    pub entry_point: Option<NodeId>,
    pub max_layer: usize,
    pub config: HnswConfig,
}

/// A persisted node: its vector and one friend list per layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredNode {
    pub vector: Vec<f32>,
    pub friends: Vec<Vec<NodeId>>,
}

/// Source of persisted graph state, used at startup to rehydrate a graph.
pub trait GraphStore {
    fn load_graph_header(&self) -> Result<GraphHeader>;

    /// Loads node `id`. Ids run from 0 to `node_count - 1`.
    fn load_node(&self, id: NodeId) -> Result<StoredNode>;
}

/// Ids of a store holding `node_count` nodes.
fn stored_ids(node_count: usize) -> Result<std::ops::Range<NodeId>> {
    let end = NodeId::try_from(node_count)
        .map_err(|_| HnswError::Corrupted(format!("node count {node_count} overflows ids")))?;
    Ok(0..end)
}

impl GraphStore for HnswGraph {
    fn load_graph_header(&self) -> Result<GraphHeader> {
        Ok(GraphHeader {
            dimension: self.dimension(),
            node_count: self.len(),
            entry_point: self.entry_point(),
            max_layer: self.max_layer(),
            config: self.config().clone(),
        })
    }

    fn load_node(&self, id: NodeId) -> Result<StoredNode> {
        let node = self.try_node(id)?;
        Ok(StoredNode {
            vector: node.vector().to_vec(),
            friends: node.all_friends().to_vec(),
        })
    }
}

impl HnswGraph {
    /// Rebuilds a graph from `store`, validating dimensions, friend ids, and
    /// the entry point. Fails with [`HnswError::Corrupted`] on any violation.
    pub fn rehydrate<S: GraphStore + ?Sized>(store: &S) -> Result<Self> {
        let header = store.load_graph_header()?;
        let mut nodes = Vec::with_capacity(header.node_count);
        for id in stored_ids(header.node_count)? {
            let stored = store.load_node(id)?;
            nodes.push(Node::from_parts(id, stored.vector, stored.friends));
        }
        HnswGraph::from_parts(
            header.dimension,
            header.config,
            nodes,
            header.entry_point,
            header.max_layer,
        )
    }

    /// Writes the graph to `path` as a checksummed snapshot.
    pub fn save(&self, path: &Path) -> Result<()> {
        SnapshotFile::save(self, path)
    }

    /// Loads a graph from a snapshot written by [`save`](Self::save).
    pub fn load(path: &Path) -> Result<Self> {
        let snapshot = SnapshotFile::open(path)?;
        Self::rehydrate(&snapshot)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotPayload {
    header: GraphHeader,
    nodes: Vec<StoredNode>,
}

/// A snapshot file read fully into memory.
#[derive(Debug)]
pub struct SnapshotFile {
    path: PathBuf,
    payload: SnapshotPayload,
}

impl SnapshotFile {
    /// Copies everything `store` holds into a snapshot at `path`.
    pub fn save<S: GraphStore + ?Sized>(store: &S, path: &Path) -> Result<()> {
        let header = store.load_graph_header()?;
        let mut nodes = Vec::with_capacity(header.node_count);
        for id in stored_ids(header.node_count)? {
            nodes.push(store.load_node(id)?);
        }
        let payload = SnapshotPayload { header, nodes };
        let bytes = bincode::serialize(&payload)?;
        let crc = crc32fast::hash(&bytes);

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        let mut output = Vec::with_capacity(bytes.len() + 8);
        output.extend_from_slice(&bytes);
        output.extend_from_slice(SNAPSHOT_MAGIC);
        output.extend_from_slice(&crc.to_be_bytes());

        // Atomic write: write to temp, then rename
        fs::write(&tmp_path, &output)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&tmp_path, fs::Permissions::from_mode(0o600))?;
        }
        fs::rename(&tmp_path, path)?;

        tracing::info!(
            "Saved graph snapshot {:?} ({} nodes, {} bytes, CRC32={:#010x})",
            path,
            payload.header.node_count,
            bytes.len(),
            crc
        );
        Ok(())
    }

    /// Reads and checksums a snapshot.
    pub fn open(path: &Path) -> Result<Self> {
        let raw = fs::read(path)?;
        if raw.len() < 8 || &raw[raw.len() - 8..raw.len() - 4] != SNAPSHOT_MAGIC {
            return Err(HnswError::Corrupted(format!(
                "{:?} is missing the snapshot footer",
                path
            )));
        }
        let payload = &raw[..raw.len() - 8];
        let mut crc_bytes = [0u8; 4];
        crc_bytes.copy_from_slice(&raw[raw.len() - 4..]);
        let stored_crc = u32::from_be_bytes(crc_bytes);
        let computed_crc = crc32fast::hash(payload);
        if computed_crc != stored_crc {
            tracing::warn!("Snapshot {:?} failed its checksum", path);
            return Err(HnswError::Corrupted(format!(
                "CRC32 mismatch: expected {:#010x}, got {:#010x}",
                stored_crc, computed_crc
            )));
        }
        tracing::debug!("Snapshot CRC32 verified: {:#010x}", stored_crc);

        let payload: SnapshotPayload = bincode::deserialize(payload)?;
        if payload.nodes.len() != payload.header.node_count {
            return Err(HnswError::Corrupted(format!(
                "header lists {} nodes, file holds {}",
                payload.header.node_count,
                payload.nodes.len()
            )));
        }
        tracing::info!(
            "Loaded graph snapshot {:?} ({} nodes)",
            path,
            payload.header.node_count
        );
        Ok(Self {
            path: path.to_path_buf(),
            payload,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &GraphHeader {
        &self.payload.header
    }
}

impl GraphStore for SnapshotFile {
    fn load_graph_header(&self) -> Result<GraphHeader> {
        Ok(self.payload.header.clone())
    }

    fn load_node(&self, id: NodeId) -> Result<StoredNode> {
        self.payload
            .nodes
            .get(id as usize)
            .cloned()
            .ok_or(HnswError::NodeNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_graph() -> HnswGraph {
        let mut graph = HnswGraph::new(2, HnswConfig::default().seeded(21)).unwrap();
        for i in 0..30 {
            let x = i as f32;
            graph.insert(vec![x, (x * 0.5).sin()]).unwrap();
        }
        graph
    }

    #[test]
    fn test_save_and_load_preserves_graph() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("graph.vgs");
        let graph = sample_graph();
        graph.save(&path).unwrap();

        let loaded = HnswGraph::load(&path).unwrap();
        assert_eq!(loaded.len(), graph.len());
        assert_eq!(loaded.entry_point(), graph.entry_point());
        assert_eq!(loaded.max_layer(), graph.max_layer());
        assert_eq!(loaded.config(), graph.config());
        for (a, b) in graph.nodes().iter().zip(loaded.nodes()) {
            assert_eq!(a.vector(), b.vector());
            assert_eq!(a.all_friends(), b.all_friends());
            assert_eq!(a.layer(), b.layer());
        }

        let query = [12.2, 0.0];
        assert_eq!(
            graph.search(&query, 5, 20).unwrap(),
            loaded.search(&query, 5, 20).unwrap()
        );
        assert!(!dir.path().join("graph.vgs.tmp").exists());
    }

    #[test]
    fn test_empty_graph_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.vgs");
        HnswGraph::with_default_config(3).unwrap().save(&path).unwrap();
        let loaded = HnswGraph::load(&path).unwrap();
        assert!(loaded.is_empty());
        assert_eq!(loaded.dimension(), 3);
    }

    #[test]
    fn test_corrupted_payload_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("graph.vgs");
        sample_graph().save(&path).unwrap();

        let mut raw = fs::read(&path).unwrap();
        raw[10] ^= 0xFF;
        fs::write(&path, &raw).unwrap();

        assert!(matches!(SnapshotFile::open(&path), Err(HnswError::Corrupted(_))));
    }

    #[test]
    fn test_missing_footer_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("junk.vgs");
        fs::write(&path, b"not a snapshot").unwrap();
        assert!(matches!(SnapshotFile::open(&path), Err(HnswError::Corrupted(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = SnapshotFile::open(&dir.path().join("absent.vgs")).unwrap_err();
        assert!(matches!(err, HnswError::Io(_)));
    }

    #[test]
    fn test_snapshot_serves_nodes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("graph.vgs");
        let graph = sample_graph();
        graph.save(&path).unwrap();

        let snapshot = SnapshotFile::open(&path).unwrap();
        assert_eq!(snapshot.path(), path.as_path());
        assert_eq!(snapshot.header().node_count, 30);
        let stored = snapshot.load_node(4).unwrap();
        assert_eq!(stored.vector, graph.node(4).unwrap().vector());
        assert!(matches!(snapshot.load_node(30), Err(HnswError::NodeNotFound(30))));
    }

    #[test]
    fn test_node_count_beyond_id_space_is_corrupted() {
        assert_eq!(stored_ids(3).unwrap(), 0..3);
        assert!(matches!(
            stored_ids(NodeId::MAX as usize + 1),
            Err(HnswError::Corrupted(_))
        ));
    }

    #[test]
    fn test_reload_does_not_replay_levels() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("graph.vgs");
        let config = HnswConfig::with_m(2).seeded(5);
        let mut graph = HnswGraph::new(1, config.clone()).unwrap();
        for i in 0..10 {
            graph.insert(vec![i as f32]).unwrap();
        }
        graph.save(&path).unwrap();

        let mut loaded = HnswGraph::load(&path).unwrap();
        let mut fresh = HnswGraph::new(1, config).unwrap();
        let after_reload: Vec<usize> = (0..64).map(|_| loaded.random_level()).collect();
        let from_start: Vec<usize> = (0..64).map(|_| fresh.random_level()).collect();
        assert_ne!(after_reload, from_start);
    }

    #[test]
    fn test_rehydrate_rejects_bad_entry_point() {
        struct BrokenStore;
        impl GraphStore for BrokenStore {
            fn load_graph_header(&self) -> Result<GraphHeader> {
                Ok(GraphHeader {
                    dimension: 1,
                    node_count: 1,
                    entry_point: Some(7),
                    max_layer: 0,
                    config: HnswConfig::default(),
                })
            }
            fn load_node(&self, _id: NodeId) -> Result<StoredNode> {
                Ok(StoredNode {
                    vector: vec![0.0],
                    friends: vec![vec![]],
                })
            }
        }
        assert!(matches!(
            HnswGraph::rehydrate(&BrokenStore),
            Err(HnswError::Corrupted(_))
        ));
    }
}
