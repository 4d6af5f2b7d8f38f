// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Object Store Adapter (C3): prefix listing with delimiter, ranged
//! get/put, directory sync, multi-delete.

mod error;
mod fake;
mod s3;

pub use error::ObjectStoreError;
pub use fake::FakeObjectStore;
pub use s3::S3ObjectStore;

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;

/// Multi-object delete batches into chunks of this many keys per request.
pub const DELETE_BATCH_SIZE: usize = 1000;

/// One delimiter-bounded listing level: the leaf keys directly under the
/// prefix, and the sub-prefixes one level down. Pagination against the
/// server's continuation token is exhausted internally — callers always
/// see a complete level.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Listing {
    pub keys: Vec<String>,
    pub prefixes: Vec<String>,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Lists `prefix` with `/` as the delimiter, returning leaves and
    /// one level of sub-prefixes.
    async fn list_level(&self, prefix: &str) -> Result<Listing, ObjectStoreError>;

    async fn download(&self, key: &str, dest: &Path) -> Result<i64, ObjectStoreError>;

    async fn upload(&self, key: &str, src: &Path, metadata: &HashMap<String, String>) -> Result<i64, ObjectStoreError>;

    /// Walks the filesystem under `dir`, uploading each regular file to
    /// `basePrefix + "/" + relativePath` (joined with `/`, never the
    /// platform separator).
    async fn upload_directory(&self, dir: &Path, base_prefix: &str) -> Result<i64, ObjectStoreError>;

    async fn exists(&self, key: &str) -> Result<bool, ObjectStoreError>;

    async fn delete(&self, key: &str) -> Result<(), ObjectStoreError>;

    async fn delete_if_exists(&self, key: &str) -> Result<(), ObjectStoreError> {
        if self.exists(key).await? {
            self.delete(key).await
        } else {
            Ok(())
        }
    }

    /// Deletes every object under `root`, batching into chunks of
    /// `DELETE_BATCH_SIZE` keys. Returns the number of keys deleted.
    async fn delete_prefix(&self, root: &str) -> Result<u64, ObjectStoreError>;

    /// If `key` ends in `/` it is a prefix: sum content length across
    /// every object under it. Otherwise, head the single object.
    async fn size(&self, key: &str) -> Result<i64, ObjectStoreError>;
}
