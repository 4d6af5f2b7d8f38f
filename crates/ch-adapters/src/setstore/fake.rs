// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use ch_core::Resource;
use parking_lot::Mutex;

use super::{Inserter, ResourceSetStore, SetStoreError};

/// In-memory set store for tests — no network, same semantics.
#[derive(Clone, Default)]
pub struct FakeResourceSetStore {
    sets: Arc<Mutex<HashMap<String, HashSet<String>>>>,
}

impl FakeResourceSetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, set: &str, url: &str) -> bool {
        self.sets.lock().get(set).map(|s| s.contains(url)).unwrap_or(false)
    }
}

#[async_trait]
impl ResourceSetStore for FakeResourceSetStore {
    async fn add(&self, set: &str, resources: &[Resource]) -> Result<u64, SetStoreError> {
        let mut sets = self.sets.lock();
        let entry = sets.entry(set.to_string()).or_default();
        let mut added = 0;
        for r in resources {
            if entry.insert(r.url().to_string()) {
                added += 1;
            }
        }
        Ok(added)
    }

    async fn bulk_insert(&self, set: &str) -> Result<Box<dyn Inserter>, SetStoreError> {
        Ok(Box::new(FakeInserter { store: self.clone(), set: set.to_string() }))
    }

    async fn pop(&self, set: &str, n: u64) -> Result<Vec<Resource>, SetStoreError> {
        let mut sets = self.sets.lock();
        let Some(entry) = sets.get_mut(set) else {
            return Ok(Vec::new());
        };
        let taken: Vec<String> = entry.iter().take(n as usize).cloned().collect();
        for url in &taken {
            entry.remove(url);
        }
        Ok(taken.into_iter().map(Resource::new).collect())
    }

    async fn count(&self, set: &str) -> Result<u64, SetStoreError> {
        Ok(self.sets.lock().get(set).map(|s| s.len() as u64).unwrap_or(0))
    }
}

struct FakeInserter {
    store: FakeResourceSetStore,
    set: String,
}

#[async_trait]
impl Inserter for FakeInserter {
    async fn insert(&mut self, resource: Resource) -> Result<(), SetStoreError> {
        self.store.add(&self.set, &[resource]).await?;
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<(), SetStoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn add_is_set_semantics() {
        let store = FakeResourceSetStore::new();
        let r = Resource::new("s3://b/x.pdf");
        assert_eq!(store.add("resources", &[r.clone()]).await.unwrap(), 1);
        assert_eq!(store.add("resources", &[r]).await.unwrap(), 0);
        assert_eq!(store.count("resources").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn pop_removes_atomically() {
        let store = FakeResourceSetStore::new();
        store.add("resources", &[Resource::new("s3://b/a"), Resource::new("s3://b/b")]).await.unwrap();
        let popped = store.pop("resources", 10).await.unwrap();
        assert_eq!(popped.len(), 2);
        assert_eq!(store.count("resources").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn bulk_insert_streams_and_closes() {
        let store = FakeResourceSetStore::new();
        let mut inserter = store.bulk_insert("resources").await.unwrap();
        inserter.insert(Resource::new("s3://b/a")).await.unwrap();
        inserter.insert(Resource::new("s3://b/b")).await.unwrap();
        inserter.close().await.unwrap();
        assert_eq!(store.count("resources").await.unwrap(), 2);
    }
}
