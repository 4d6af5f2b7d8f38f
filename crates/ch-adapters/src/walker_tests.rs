// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;
use crate::objectstore::Listing;

/// Minimal store whose `list_level` returns a fixed, ordered key list for
/// one prefix and nothing else — lets tests control scheduling order
/// deterministically, unlike `FakeObjectStore`'s `HashMap` iteration.
struct OrderedStore {
    root: String,
    keys: Vec<String>,
    list_calls: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl ObjectStore for OrderedStore {
    async fn list_level(&self, prefix: &str) -> Result<Listing, ObjectStoreError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if prefix == self.root {
            Ok(Listing { keys: self.keys.clone(), prefixes: vec![] })
        } else {
            Ok(Listing::default())
        }
    }
    async fn download(&self, _: &str, _: &Path) -> Result<i64, ObjectStoreError> {
        unimplemented!()
    }
    async fn upload(&self, _: &str, _: &Path, _: &HashMap<String, String>) -> Result<i64, ObjectStoreError> {
        unimplemented!()
    }
    async fn upload_directory(&self, _: &Path, _: &str) -> Result<i64, ObjectStoreError> {
        unimplemented!()
    }
    async fn exists(&self, _: &str) -> Result<bool, ObjectStoreError> {
        unimplemented!()
    }
    async fn delete(&self, _: &str) -> Result<(), ObjectStoreError> {
        unimplemented!()
    }
    async fn delete_prefix(&self, _: &str) -> Result<u64, ObjectStoreError> {
        unimplemented!()
    }
    async fn size(&self, _: &str) -> Result<i64, ObjectStoreError> {
        unimplemented!()
    }
}

#[tokio::test]
async fn max_depth_zero_returns_immediately_without_listing() {
    let list_calls = Arc::new(AtomicUsize::new(0));
    let store: Arc<dyn ObjectStore> =
        Arc::new(OrderedStore { root: "root/".to_string(), keys: vec!["root/a".to_string()], list_calls: list_calls.clone() });
    let visited = Arc::new(AtomicUsize::new(0));
    let v = visited.clone();
    let visit: Visit = Arc::new(move |_key| {
        let v = v.clone();
        Box::pin(async move {
            v.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    });

    walk(store, "root/".to_string(), 0, visit).await.unwrap();

    assert_eq!(list_calls.load(Ordering::SeqCst), 0);
    assert_eq!(visited.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn first_error_cancels_siblings_and_propagates() {
    let list_calls = Arc::new(AtomicUsize::new(0));
    let keys: Vec<String> = (0..50).map(|i| format!("root/obj{i}")).collect();
    let store: Arc<dyn ObjectStore> = Arc::new(OrderedStore { root: "root/".to_string(), keys: keys.clone(), list_calls });

    let completed = Arc::new(AtomicUsize::new(0));
    let completed_for_visit = completed.clone();
    let visit: Visit = Arc::new(move |key| {
        let completed = completed_for_visit.clone();
        Box::pin(async move {
            if key == "root/obj0" {
                return Err(WalkError::Visit("injected failure".to_string()));
            }
            // Yield so the scheduler has a chance to run the failing
            // sibling and cancel before this one does its "real work".
            tokio::task::yield_now().await;
            tokio::task::yield_now().await;
            completed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    });

    let result = walk(store, "root/".to_string(), 1, visit).await;

    assert!(result.is_err());
    // Not every sibling should have completed its work; some were
    // skipped once the first error cancelled the group.
    assert!(completed.load(Ordering::SeqCst) < keys.len() - 1);
}

#[tokio::test]
async fn walk_visits_every_object_when_none_fail() {
    let list_calls = Arc::new(AtomicUsize::new(0));
    let keys: Vec<String> = (0..10).map(|i| format!("root/obj{i}")).collect();
    let store: Arc<dyn ObjectStore> = Arc::new(OrderedStore { root: "root/".to_string(), keys: keys.clone(), list_calls });

    let visited = Arc::new(AtomicUsize::new(0));
    let v = visited.clone();
    let visit: Visit = Arc::new(move |_key| {
        let v = v.clone();
        Box::pin(async move {
            v.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    });

    walk(store, "root/".to_string(), 1, visit).await.unwrap();
    assert_eq!(visited.load(Ordering::SeqCst), keys.len());
}
