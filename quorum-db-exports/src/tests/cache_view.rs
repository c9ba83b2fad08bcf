// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::*;
use mockall::predicate::eq;
use std::collections::BTreeMap;
use std::sync::Arc;

fn snapshot(entries: &[(&[u8], &[u8])]) -> Arc<DBSnapshot> {
    let state: BTreeMap<Key, Value> = entries
        .iter()
        .map(|(k, v)| (k.to_vec(), v.to_vec()))
        .collect();
    Arc::new(DBSnapshot {
        version: 1,
        state_hash: StateHash::zero(),
        state: Arc::new(state),
    })
}

#[test]
fn test_local_writes_shadow_parent() {
    let mut parent = MockKVRead::new();
    parent
        .expect_get()
        .with(eq(b"validator/b".to_vec()))
        .times(1)
        .returning(|_| Some(b"parent".to_vec()));
    let mut view = CacheView::new(Arc::new(parent));
    view.set(b"validator/a".to_vec(), b"local".to_vec());
    // served locally, the mock would panic on an unexpected call
    assert_eq!(view.get(b"validator/a"), Some(b"local".to_vec()));
    assert_eq!(view.get(b"validator/b"), Some(b"parent".to_vec()));
    view.delete(b"validator/c");
    assert_eq!(view.get(b"validator/c"), None);
}

#[test]
fn test_prefix_iterator_merges_in_key_order() {
    let parent = snapshot(&[
        (b"delegation/1", b"a"),
        (b"delegation/3", b"c"),
        (b"delegationz", b"out of prefix"),
        (b"pool/", b"p"),
    ]);
    let mut view = CacheView::new(parent);
    view.set(b"delegation/2".to_vec(), b"b".to_vec());
    view.delete(b"delegation/3");
    view.set(b"delegation/4".to_vec(), b"d".to_vec());
    let keys: Vec<Key> = view
        .prefix_iterator(DELEGATION_PREFIX)
        .into_iter()
        .map(|(k, _)| k)
        .collect();
    assert_eq!(
        keys,
        vec![
            b"delegation/1".to_vec(),
            b"delegation/2".to_vec(),
            b"delegation/4".to_vec()
        ]
    );
}

#[test]
fn test_reset_to_snapshot_discards_later_writes() {
    let mut view = CacheView::new(Arc::new(EmptyState));
    view.set(b"account/x".to_vec(), b"1".to_vec());
    let snapshot = view.get_snapshot();
    view.set(b"account/x".to_vec(), b"2".to_vec());
    view.set(b"account/y".to_vec(), b"3".to_vec());
    view.reset_to_snapshot(snapshot);
    assert_eq!(view.get(b"account/x"), Some(b"1".to_vec()));
    assert_eq!(view.get(b"account/y"), None);
    let batch = view.take();
    assert_eq!(batch.len(), 1);
    assert!(view.changes().is_empty());
}

#[test]
fn test_prefix_end() {
    assert_eq!(
        prefix_end(b"ab"),
        std::ops::Bound::Excluded(b"ac".to_vec())
    );
    assert_eq!(
        prefix_end(&[1, 0xff]),
        std::ops::Bound::Excluded(vec![2])
    );
    assert_eq!(prefix_end(&[0xff]), std::ops::Bound::Unbounded);
}
