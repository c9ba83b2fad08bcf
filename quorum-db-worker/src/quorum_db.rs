// Copyright (c) 2022 MASSA LABS <info@massa.net>

use quorum_db_exports::{
    DBBatch, DBSnapshot, KVRead, Key, QuorumDBConfig, QuorumDBController, QuorumDBError,
    StateHash, Value,
};
use quorum_hash::HashXof;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// In-memory versioned database with XOR state root
pub struct QuorumDB {
    /// configuration for the `QuorumDB`
    pub config: QuorumDBConfig,
    state: Arc<BTreeMap<Key, Value>>,
    state_hash: StateHash,
    version: u64,
    /// In change_history, we keep the latest batches written to the database, indexed by version
    pub change_history: BTreeMap<u64, DBBatch>,
    snapshots: BTreeMap<u64, Arc<DBSnapshot>>,
}

impl std::fmt::Debug for QuorumDB {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuorumDB")
            .field("config", &self.config)
            .field("version", &self.version)
            .field("state_hash", &self.state_hash)
            .field("entries", &self.state.len())
            .finish()
    }
}

impl QuorumDB {
    /// Returns a new empty `QuorumDB` at version 0
    pub fn new(config: QuorumDBConfig) -> Self {
        let state = Arc::new(BTreeMap::new());
        let state_hash = StateHash::zero();
        let mut snapshots = BTreeMap::new();
        snapshots.insert(
            0,
            Arc::new(DBSnapshot {
                version: 0,
                state_hash,
                state: state.clone(),
            }),
        );
        QuorumDB {
            config,
            state,
            state_hash,
            version: 0,
            change_history: BTreeMap::new(),
            snapshots,
        }
    }

    /// Recomputes the state root from scratch, used to check the incremental one
    pub fn compute_state_hash_from_scratch(&self) -> StateHash {
        self.state
            .iter()
            .fold(StateHash::zero(), |acc, (k, v)| {
                acc ^ HashXof::compute_from_kv(k, v)
            })
    }

    fn prune_history(&mut self) {
        while self.change_history.len() > self.config.max_history_length {
            self.change_history.pop_first();
        }
        // the latest snapshot always stays available
        while self.snapshots.len() > self.config.max_history_length.max(1) {
            self.snapshots.pop_first();
        }
    }
}

impl KVRead for QuorumDB {
    fn get(&self, key: &[u8]) -> Option<Value> {
        self.state.get(key).cloned()
    }

    fn prefix_iterator(&self, prefix: &[u8]) -> Vec<(Key, Value)> {
        DBSnapshot {
            version: self.version,
            state_hash: self.state_hash,
            state: self.state.clone(),
        }
        .prefix_iterator(prefix)
    }
}

impl QuorumDBController for QuorumDB {
    fn write_batch(&mut self, batch: DBBatch, version: u64) -> Result<StateHash, QuorumDBError> {
        if version <= self.version {
            return Err(QuorumDBError::InvalidVersion(format!(
                "version should strictly increase after every write: {} <= {}",
                version, self.version
            )));
        }

        let mut current_xor_hash = self.state_hash;
        let state = Arc::make_mut(&mut self.state);
        for (key, value) in batch.iter() {
            // Compute the XOR in all cases
            if let Some(prev_value) = state.get(key) {
                current_xor_hash ^= HashXof::compute_from_kv(key, prev_value);
            }
            match value {
                Some(value) => {
                    current_xor_hash ^= HashXof::compute_from_kv(key, value);
                    state.insert(key.clone(), value.clone());
                }
                None => {
                    state.remove(key);
                }
            }
        }

        self.state_hash = current_xor_hash;
        self.version = version;
        self.change_history.insert(version, batch);
        self.snapshots.insert(
            version,
            Arc::new(DBSnapshot {
                version,
                state_hash: current_xor_hash,
                state: self.state.clone(),
            }),
        );
        self.prune_history();
        debug!("db: committed version {} root {}", version, current_xor_hash);
        Ok(current_xor_hash)
    }

    fn get_version(&self) -> u64 {
        self.version
    }

    fn get_state_hash(&self) -> StateHash {
        self.state_hash
    }

    fn get_snapshot(&self, version: Option<u64>) -> Result<Arc<DBSnapshot>, QuorumDBError> {
        let version = version.unwrap_or(self.version);
        if version > self.version {
            return Err(QuorumDBError::UnknownVersion(version));
        }
        self.snapshots
            .get(&version)
            .cloned()
            .ok_or(QuorumDBError::VersionPruned(version))
    }

    fn get_changes(&self, version: u64) -> Result<DBBatch, QuorumDBError> {
        if version > self.version || version == 0 {
            return Err(QuorumDBError::UnknownVersion(version));
        }
        self.change_history
            .get(&version)
            .cloned()
            .ok_or(QuorumDBError::VersionPruned(version))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_matches::assert_matches;
    use parking_lot::RwLock;

    fn new_db(max_history_length: usize) -> Arc<RwLock<Box<dyn QuorumDBController>>> {
        Arc::new(RwLock::new(Box::new(QuorumDB::new(QuorumDBConfig {
            max_history_length,
        })) as Box<dyn QuorumDBController>))
    }

    #[test]
    fn test_basics() {
        // 1- Init a db + check initial hash
        // 2- Add some data
        // 3- Read it
        // 4- Remove data, the hash is back to its initial value
        let db = new_db(10);
        assert_eq!(db.read().get_state_hash(), StateHash::zero());

        let mut batch = DBBatch::new();
        db.read()
            .put_or_update_entry_value(&mut batch, vec![1, 2, 3], &[4, 5, 6]);
        let root_1 = db.write().write_batch(batch, 1).unwrap();
        assert_ne!(root_1, StateHash::zero());
        let snapshot = db.read().get_snapshot(None).unwrap();
        assert_eq!(snapshot.get(&[1, 2, 3]), Some(vec![4, 5, 6]));

        let mut batch_2 = DBBatch::new();
        db.read().delete_key(&mut batch_2, vec![1, 2, 3]);
        let root_2 = db.write().write_batch(batch_2, 2).unwrap();
        assert_eq!(root_2, StateHash::zero());
        // the snapshot of version 1 is unaffected
        assert_eq!(snapshot.get(&[1, 2, 3]), Some(vec![4, 5, 6]));
        assert_eq!(db.read().get_snapshot(Some(2)).unwrap().get(&[1, 2, 3]), None);
    }

    #[test]
    fn test_hash_is_content_addressed() {
        let mut db_a = QuorumDB::new(QuorumDBConfig {
            max_history_length: 10,
        });
        let mut db_b = QuorumDB::new(QuorumDBConfig {
            max_history_length: 10,
        });
        let mut batch = DBBatch::new();
        batch.insert(b"pool/".to_vec(), Some(b"1".to_vec()));
        batch.insert(b"validator/a".to_vec(), Some(b"2".to_vec()));
        db_a.write_batch(batch, 1).unwrap();
        let mut batch = DBBatch::new();
        batch.insert(b"validator/a".to_vec(), Some(b"0".to_vec()));
        db_a.write_batch(batch, 2).unwrap();
        let mut batch = DBBatch::new();
        batch.insert(b"validator/a".to_vec(), Some(b"2".to_vec()));
        db_a.write_batch(batch, 3).unwrap();

        let mut batch = DBBatch::new();
        batch.insert(b"validator/a".to_vec(), Some(b"2".to_vec()));
        batch.insert(b"pool/".to_vec(), Some(b"1".to_vec()));
        db_b.write_batch(batch, 7).unwrap();

        assert_eq!(db_a.get_state_hash(), db_b.get_state_hash());
        assert_eq!(db_a.get_state_hash(), db_a.compute_state_hash_from_scratch());
    }

    #[test]
    fn test_versions_and_history() {
        let db = new_db(2);
        for version in 1..=4u64 {
            let mut batch = DBBatch::new();
            batch.insert(version.to_be_bytes().to_vec(), Some(vec![0]));
            db.write().write_batch(batch, version).unwrap();
        }
        assert_matches!(
            db.write().write_batch(DBBatch::new(), 4),
            Err(QuorumDBError::InvalidVersion(_))
        );
        assert_matches!(
            db.read().get_snapshot(Some(1)),
            Err(QuorumDBError::VersionPruned(1))
        );
        assert_matches!(
            db.read().get_snapshot(Some(9)),
            Err(QuorumDBError::UnknownVersion(9))
        );
        assert_eq!(db.read().get_snapshot(Some(3)).unwrap().state.len(), 3);
        assert_eq!(db.read().get_changes(4).unwrap().len(), 1);
        assert_matches!(db.read().get_changes(2), Err(QuorumDBError::VersionPruned(2)));
    }
}
