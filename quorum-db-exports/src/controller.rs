// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::{QuorumDBError, STATE_HASH_BYTES_LEN};
use quorum_hash::HashXof;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::ops::Bound;
use std::sync::Arc;

pub type Key = Vec<u8>;
pub type Value = Vec<u8>;
/// `None` values are deletions
pub type DBBatch = BTreeMap<Key, Option<Value>>;
pub type StateHash = HashXof<STATE_HASH_BYTES_LEN>;

/// Read access to an ordered key-value state
#[cfg_attr(any(test, feature = "test-exports"), mockall::automock)]
pub trait KVRead {
    /// Value stored under `key`
    fn get(&self, key: &[u8]) -> Option<Value>;

    /// Every entry whose key starts with `prefix`, in key order
    fn prefix_iterator(&self, prefix: &[u8]) -> Vec<(Key, Value)>;
}

/// Write access to an ordered key-value state
pub trait KVStore: KVRead {
    /// Inserts or replaces the value stored under `key`
    fn set(&mut self, key: Key, value: Value);

    /// Removes `key`
    fn delete(&mut self, key: &[u8]);
}

/// Exclusive upper bound of the keys starting with `prefix`
pub fn prefix_end(prefix: &[u8]) -> Bound<Key> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < u8::MAX {
            end.push(last + 1);
            return Bound::Excluded(end);
        }
    }
    Bound::Unbounded
}

/// Immutable state as of a committed version
#[derive(Debug, Clone)]
pub struct DBSnapshot {
    /// version this snapshot was committed at
    pub version: u64,
    /// state root at that version
    pub state_hash: StateHash,
    /// full state
    pub state: Arc<BTreeMap<Key, Value>>,
}

impl KVRead for DBSnapshot {
    fn get(&self, key: &[u8]) -> Option<Value> {
        self.state.get(key).cloned()
    }

    fn prefix_iterator(&self, prefix: &[u8]) -> Vec<(Key, Value)> {
        self.state
            .range::<[u8], _>((Bound::Included(prefix), as_slice_bound(&prefix_end(prefix))))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

fn as_slice_bound(bound: &Bound<Key>) -> Bound<&[u8]> {
    match bound {
        Bound::Included(k) => Bound::Included(k.as_slice()),
        Bound::Excluded(k) => Bound::Excluded(k.as_slice()),
        Bound::Unbounded => Bound::Unbounded,
    }
}

/// Versioned storage engine
pub trait QuorumDBController: Send + Sync + Debug {
    /// Atomically applies a batch as version `version` and returns the new state root.
    /// Versions must strictly increase.
    fn write_batch(&mut self, batch: DBBatch, version: u64) -> Result<StateHash, QuorumDBError>;

    /// Utility function to put / update a key & value in the batch
    fn put_or_update_entry_value(&self, batch: &mut DBBatch, key: Key, value: &[u8]) {
        batch.insert(key, Some(value.to_vec()));
    }

    /// Utility function to delete a key & value in the batch
    fn delete_key(&self, batch: &mut DBBatch, key: Key) {
        batch.insert(key, None);
    }

    /// Last committed version, 0 before the first commit
    fn get_version(&self) -> u64;

    /// State root of the last committed version
    fn get_state_hash(&self) -> StateHash;

    /// Read snapshot of a committed version, the latest one if `version` is `None`
    fn get_snapshot(&self, version: Option<u64>) -> Result<Arc<DBSnapshot>, QuorumDBError>;

    /// Batch that produced a committed version, if still in history
    fn get_changes(&self, version: u64) -> Result<DBBatch, QuorumDBError>;
}
