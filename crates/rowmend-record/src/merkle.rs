//! Merkle root over per-record hashes
//!
//! A thin wrapper around `rs_merkle`. Snapshots store the root so that a
//! tampered or truncated snapshot file is caught on read.

use crate::hash::ContentHash;
use rs_merkle::{Hasher, MerkleTree};

/// Merkle tree whose leaves are record hashes in ordinal order
pub struct RecordMerkleTree {
    inner: MerkleTree<Blake3Hasher>,
}

impl std::fmt::Debug for RecordMerkleTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordMerkleTree")
            .field("leaf_count", &self.leaf_count())
            .field("root", &self.root())
            .finish()
    }
}

impl RecordMerkleTree {
    /// Build from leaf hashes
    #[must_use]
    pub fn from_leaves(leaves: &[ContentHash]) -> Self {
        let leaves: Vec<_> = leaves.iter().map(|h| *h.as_bytes()).collect();
        Self {
            inner: MerkleTree::from_leaves(&leaves),
        }
    }

    /// Root hash; the zero hash for an empty record set
    #[must_use]
    pub fn root(&self) -> ContentHash {
        self.inner.root().map(ContentHash::new).unwrap_or_default()
    }

    /// Number of leaves
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        self.inner.leaves().map_or(0, |leaves| leaves.len())
    }

    /// Leaf at a zero-based position
    #[must_use]
    pub fn leaf(&self, index: usize) -> Option<ContentHash> {
        self.inner
            .leaves()
            .and_then(|leaves| leaves.get(index).copied().map(ContentHash::new))
    }
}

/// Blake3 adapter for `rs_merkle`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Blake3Hasher;

impl Hasher for Blake3Hasher {
    type Hash = [u8; 32];

    #[inline]
    fn hash(data: &[u8]) -> Self::Hash {
        *blake3::hash(data).as_bytes()
    }
}
