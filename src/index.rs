//! Bucketed Identifier Index
//!
//! Hash-partitioned sorted buckets answering "is this id known
//! anywhere" in O(log bucket size). The index is a derived structure:
//! the source of truth for per-file membership is each file entry's
//! own set, and for persisted data the on-disk text files.

use std::hash::Hasher;

use fnv::FnvHasher;

use crate::error::{FilerError, Result};

/// Fixed-size array of sorted integer buckets, partitioned by the
/// FNV-1a hash of the identifier.
#[derive(Debug)]
pub struct BucketIndex {
    buckets: Vec<Vec<u32>>,
}

impl BucketIndex {
    /// Create an index with the given bucket count.
    ///
    /// A bucket count of zero is a fatal misconfiguration.
    pub fn new(bucket_count: usize) -> Result<Self> {
        if bucket_count == 0 {
            return Err(FilerError::Config(
                "hash bucket count must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            buckets: vec![Vec::new(); bucket_count],
        })
    }

    /// Check whether an identifier is present (binary search)
    pub fn contains(&self, id: u32) -> bool {
        self.buckets[self.bucket_of(id)].binary_search(&id).is_ok()
    }

    /// Insert an identifier, keeping its bucket sorted.
    ///
    /// Idempotent: returns `false` if the id was already present.
    pub fn insert(&mut self, id: u32) -> bool {
        let slot = self.bucket_of(id);
        let bucket = &mut self.buckets[slot];
        match bucket.binary_search(&id) {
            Ok(_) => false,
            Err(pos) => {
                bucket.insert(pos, id);
                true
            }
        }
    }

    /// Remove an identifier, keeping its bucket sorted.
    ///
    /// No-op: returns `false` if the id was absent.
    pub fn remove(&mut self, id: u32) -> bool {
        let slot = self.bucket_of(id);
        let bucket = &mut self.buckets[slot];
        match bucket.binary_search(&id) {
            Ok(pos) => {
                bucket.remove(pos);
                true
            }
            Err(_) => false,
        }
    }

    /// Total number of identifiers across all buckets
    pub fn len(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    /// Whether the index holds no identifiers
    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(Vec::is_empty)
    }

    /// Number of buckets
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// FNV-1a over the id's little-endian bytes, reduced mod the
    /// bucket count. No reliance on in-memory layout.
    fn bucket_of(&self, id: u32) -> usize {
        let mut hasher = FnvHasher::default();
        hasher.write(&id.to_le_bytes());
        (hasher.finish() as u32 as usize) % self.buckets.len()
    }
}
