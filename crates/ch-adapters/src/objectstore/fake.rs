// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{Listing, ObjectStore, ObjectStoreError, DELETE_BATCH_SIZE};

/// In-memory object store for tests: keys map to raw bytes, independent
/// of any real filesystem backing beyond the `download`/`upload` calls
/// which do touch real paths (so callers can assert on real files).
#[derive(Clone, Default)]
pub struct FakeObjectStore {
    objects: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    /// Number of `delete_objects`-equivalent batch calls issued by the
    /// last `delete_prefix`, for asserting batching.
    pub last_delete_batches: Arc<Mutex<usize>>,
}

impl FakeObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_bytes(&self, key: &str, bytes: Vec<u8>) {
        self.objects.lock().insert(key.to_string(), bytes);
    }

    pub fn keys(&self) -> HashSet<String> {
        self.objects.lock().keys().cloned().collect()
    }
}

#[async_trait]
impl ObjectStore for FakeObjectStore {
    async fn list_level(&self, prefix: &str) -> Result<Listing, ObjectStoreError> {
        let objects = self.objects.lock();
        let mut listing = Listing::default();
        let mut seen_prefixes = HashSet::new();
        for key in objects.keys() {
            let Some(rest) = key.strip_prefix(prefix) else { continue };
            match rest.split_once('/') {
                Some((sub, _)) => {
                    let full = format!("{prefix}{sub}/");
                    if seen_prefixes.insert(full.clone()) {
                        listing.prefixes.push(full);
                    }
                }
                None if !rest.is_empty() => listing.keys.push(key.clone()),
                None => {}
            }
        }
        Ok(listing)
    }

    async fn download(&self, key: &str, dest: &Path) -> Result<i64, ObjectStoreError> {
        let bytes = self.objects.lock().get(key).cloned().ok_or_else(|| ObjectStoreError::NotFound(key.to_string()))?;
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(dest, &bytes).await?;
        Ok(bytes.len() as i64)
    }

    async fn upload(&self, key: &str, src: &Path, _metadata: &HashMap<String, String>) -> Result<i64, ObjectStoreError> {
        let bytes = tokio::fs::read(src).await?;
        let len = bytes.len() as i64;
        self.objects.lock().insert(key.to_string(), bytes);
        Ok(len)
    }

    async fn upload_directory(&self, dir: &Path, base_prefix: &str) -> Result<i64, ObjectStoreError> {
        let mut total = 0i64;
        for entry in walkdir::WalkDir::new(dir).into_iter().filter_map(Result::ok) {
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = entry.path().strip_prefix(dir).unwrap_or(entry.path());
            let rel_str = rel.components().filter_map(|c| c.as_os_str().to_str()).collect::<Vec<_>>().join("/");
            let key = format!("{base_prefix}/{rel_str}");
            total += self.upload(&key, entry.path(), &HashMap::new()).await?;
        }
        Ok(total)
    }

    async fn exists(&self, key: &str) -> Result<bool, ObjectStoreError> {
        Ok(self.objects.lock().contains_key(key))
    }

    async fn delete(&self, key: &str) -> Result<(), ObjectStoreError> {
        self.objects.lock().remove(key);
        Ok(())
    }

    async fn delete_prefix(&self, root: &str) -> Result<u64, ObjectStoreError> {
        let keys: Vec<String> = self.objects.lock().keys().filter(|k| k.starts_with(root)).cloned().collect();
        let batches = keys.chunks(DELETE_BATCH_SIZE).count();
        *self.last_delete_batches.lock() = batches;
        let mut objects = self.objects.lock();
        for key in &keys {
            objects.remove(key);
        }
        Ok(keys.len() as u64)
    }

    async fn size(&self, key: &str) -> Result<i64, ObjectStoreError> {
        let objects = self.objects.lock();
        if key.ends_with('/') {
            Ok(objects.iter().filter(|(k, _)| k.starts_with(key)).map(|(_, v)| v.len() as i64).sum())
        } else {
            objects.get(key).map(|v| v.len() as i64).ok_or_else(|| ObjectStoreError::NotFound(key.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn list_level_splits_leaves_and_prefixes() {
        let store = FakeObjectStore::new();
        store.put_bytes("in/clip.mov", vec![1, 2, 3]);
        store.put_bytes("in/sub/other.mov", vec![4]);
        let listing = store.list_level("in/").await.unwrap();
        assert_eq!(listing.keys, vec!["in/clip.mov".to_string()]);
        assert_eq!(listing.prefixes, vec!["in/sub/".to_string()]);
    }

    #[tokio::test]
    async fn upload_directory_produces_one_object_per_file() {
        let store = FakeObjectStore::new();
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"hello").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/b.txt"), b"world").unwrap();

        store.upload_directory(dir.path(), "out").await.unwrap();

        let keys = store.keys();
        assert!(keys.contains("out/a.txt"));
        assert!(keys.contains("out/sub/b.txt"));
        assert_eq!(keys.len(), 2);
    }

    #[tokio::test]
    async fn delete_prefix_batches_by_1000() {
        let store = FakeObjectStore::new();
        for i in 0..2500 {
            store.put_bytes(&format!("p/{i}"), vec![0]);
        }
        let deleted = store.delete_prefix("p/").await.unwrap();
        assert_eq!(deleted, 2500);
        assert_eq!(*store.last_delete_batches.lock(), 3); // ceil(2500/1000)
    }

    #[tokio::test]
    async fn size_sums_prefix_and_heads_object() {
        let store = FakeObjectStore::new();
        store.put_bytes("p/a", vec![0; 3]);
        store.put_bytes("p/b", vec![0; 5]);
        assert_eq!(store.size("p/").await.unwrap(), 8);
        assert_eq!(store.size("p/a").await.unwrap(), 3);
    }
}
