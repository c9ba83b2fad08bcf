// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::{prefix_end, DBBatch, KVRead, KVStore, Key, Value};
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

/// Scoped writable view layered over a read-only parent state.
///
/// Writes are recorded in an ordered change map and never reach the parent.
/// A whole block, or a single transaction within it, can be rolled back
/// by restoring an earlier snapshot of that change map.
pub struct CacheView {
    parent: Arc<dyn KVRead + Send + Sync>,
    changes: DBBatch,
}

impl CacheView {
    /// Creates an empty view over `parent`
    pub fn new(parent: Arc<dyn KVRead + Send + Sync>) -> Self {
        CacheView {
            parent,
            changes: DBBatch::new(),
        }
    }

    /// Returns a copy of the pending changes, to be restored with `reset_to_snapshot`
    pub fn get_snapshot(&self) -> DBBatch {
        self.changes.clone()
    }

    /// Discards every change made since `snapshot` was taken
    pub fn reset_to_snapshot(&mut self, snapshot: DBBatch) {
        self.changes = snapshot;
    }

    /// Takes the pending changes, leaving the view empty
    pub fn take(&mut self) -> DBBatch {
        std::mem::take(&mut self.changes)
    }

    /// Pending changes
    pub fn changes(&self) -> &DBBatch {
        &self.changes
    }
}

impl KVRead for CacheView {
    fn get(&self, key: &[u8]) -> Option<Value> {
        match self.changes.get(key) {
            Some(change) => change.clone(),
            None => self.parent.get(key),
        }
    }

    fn prefix_iterator(&self, prefix: &[u8]) -> Vec<(Key, Value)> {
        let mut merged: BTreeMap<Key, Value> =
            self.parent.prefix_iterator(prefix).into_iter().collect();
        let end = prefix_end(prefix);
        let range: (Bound<&[u8]>, Bound<&[u8]>) = (
            Bound::Included(prefix),
            match &end {
                Bound::Excluded(k) => Bound::Excluded(k.as_slice()),
                _ => Bound::Unbounded,
            },
        );
        for (key, change) in self.changes.range::<[u8], _>(range) {
            match change {
                Some(value) => {
                    merged.insert(key.clone(), value.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }
        merged.into_iter().collect()
    }
}

impl KVStore for CacheView {
    fn set(&mut self, key: Key, value: Value) {
        self.changes.insert(key, Some(value));
    }

    fn delete(&mut self, key: &[u8]) {
        self.changes.insert(key.to_vec(), None);
    }
}

/// Empty state, parent of the genesis view
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyState;

impl KVRead for EmptyState {
    fn get(&self, _key: &[u8]) -> Option<Value> {
        None
    }

    fn prefix_iterator(&self, _prefix: &[u8]) -> Vec<(Key, Value)> {
        Vec::new()
    }
}
