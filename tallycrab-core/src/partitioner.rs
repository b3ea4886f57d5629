//! # Partitioner
//!
//! Routing strategies that pick the partition a message is appended to.

use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};

use ahash::AHasher;

use crate::types::PartitionId;

/// Chooses a partition (0..num_partitions) for a message key.
pub trait Partitioner: Send + Sync {
    fn partition(&self, key: Option<&[u8]>, num_partitions: u32) -> PartitionId;
}

/// Hashes the key with ahash; unkeyed messages go to partition 0.
///
/// `AHasher::default()` uses fixed keys, so a key always maps to the same
/// partition for the lifetime of the process.
#[derive(Debug, Default, Clone, Copy)]
pub struct HashPartitioner;

impl HashPartitioner {
    pub fn new() -> Self {
        Self
    }
}

impl Partitioner for HashPartitioner {
    fn partition(&self, key: Option<&[u8]>, num_partitions: u32) -> PartitionId {
        let Some(key) = key else {
            return 0;
        };
        let mut hasher = AHasher::default();
        key.hash(&mut hasher);
        (hasher.finish() % u64::from(num_partitions.max(1))) as PartitionId
    }
}

/// Cycles through partitions regardless of the key.
#[derive(Debug, Default)]
pub struct RoundRobinPartitioner {
    counter: AtomicUsize,
}

impl RoundRobinPartitioner {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Partitioner for RoundRobinPartitioner {
    fn partition(&self, _key: Option<&[u8]>, num_partitions: u32) -> PartitionId {
        let count = self.counter.fetch_add(1, Ordering::Relaxed);
        (count % num_partitions.max(1) as usize) as PartitionId
    }
}

/// Keyed messages are hashed, unkeyed messages rotate round-robin.
#[derive(Debug, Default)]
pub struct DefaultPartitioner {
    hash: HashPartitioner,
    round_robin: RoundRobinPartitioner,
}

impl DefaultPartitioner {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Partitioner for DefaultPartitioner {
    fn partition(&self, key: Option<&[u8]>, num_partitions: u32) -> PartitionId {
        match key {
            Some(_) => self.hash.partition(key, num_partitions),
            None => self.round_robin.partition(None, num_partitions),
        }
    }
}
