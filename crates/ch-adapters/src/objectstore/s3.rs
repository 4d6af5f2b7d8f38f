// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tokio::io::AsyncWriteExt;

use super::{Listing, ObjectStore, ObjectStoreError, DELETE_BATCH_SIZE};

/// S3-backed object store, scoped to one bucket.
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl S3ObjectStore {
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self { client, bucket: bucket.into() }
    }

    /// Lists every key (and its size) under `prefix`, ignoring the
    /// delimiter so descendants at every depth are returned — used by
    /// `delete_prefix` and prefix `size`.
    async fn list_all_flat(&self, prefix: &str) -> Result<Vec<(String, i64)>, ObjectStoreError> {
        let mut out = Vec::new();
        let mut continuation: Option<String> = None;
        loop {
            let mut req = self.client.list_objects_v2().bucket(&self.bucket).prefix(prefix);
            if let Some(token) = &continuation {
                req = req.continuation_token(token);
            }
            let resp = req.send().await.map_err(|e| ObjectStoreError::Transport(e.to_string()))?;
            for obj in resp.contents() {
                if let Some(key) = obj.key() {
                    out.push((key.to_string(), obj.size().unwrap_or(0)));
                }
            }
            if resp.is_truncated() == Some(true) {
                continuation = resp.next_continuation_token().map(str::to_string);
            } else {
                break;
            }
        }
        Ok(out)
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn list_level(&self, prefix: &str) -> Result<Listing, ObjectStoreError> {
        let mut listing = Listing::default();
        let mut continuation: Option<String> = None;
        loop {
            let mut req = self.client.list_objects_v2().bucket(&self.bucket).prefix(prefix).delimiter("/");
            if let Some(token) = &continuation {
                req = req.continuation_token(token);
            }
            let resp = req.send().await.map_err(|e| ObjectStoreError::Transport(e.to_string()))?;
            for obj in resp.contents() {
                if let Some(key) = obj.key() {
                    listing.keys.push(key.to_string());
                }
            }
            for cp in resp.common_prefixes() {
                if let Some(p) = cp.prefix() {
                    listing.prefixes.push(p.to_string());
                }
            }
            if resp.is_truncated() == Some(true) {
                continuation = resp.next_continuation_token().map(str::to_string);
            } else {
                break;
            }
        }
        Ok(listing)
    }

    async fn download(&self, key: &str, dest: &Path) -> Result<i64, ObjectStoreError> {
        let resp =
            self.client.get_object().bucket(&self.bucket).key(key).send().await.map_err(|e| ObjectStoreError::Transport(e.to_string()))?;
        let len = resp.content_length().unwrap_or(0);
        let mut body = resp.body.into_async_read();
        let mut file = tokio::fs::File::create(dest).await?;
        tokio::io::copy(&mut body, &mut file).await?;
        file.flush().await?;
        Ok(len)
    }

    async fn upload(&self, key: &str, src: &Path, metadata: &HashMap<String, String>) -> Result<i64, ObjectStoreError> {
        let size = tokio::fs::metadata(src).await?.len() as i64;
        let body = ByteStream::from_path(src).await.map_err(|e| ObjectStoreError::Transport(e.to_string()))?;
        let mut req = self.client.put_object().bucket(&self.bucket).key(key).body(body);
        if !metadata.is_empty() {
            req = req.set_metadata(Some(metadata.clone()));
        }
        req.send().await.map_err(|e| ObjectStoreError::Transport(e.to_string()))?;
        Ok(size)
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
        match self.client.head_object().bucket(&self.bucket).key(key).send().await {
            Ok(_) => Ok(true),
            Err(aws_sdk_s3::error::SdkError::ServiceError(e)) if e.err().is_not_found() => Ok(false),
            Err(e) => Err(ObjectStoreError::Transport(e.to_string())),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), ObjectStoreError> {
        self.client.delete_object().bucket(&self.bucket).key(key).send().await.map_err(|e| ObjectStoreError::Transport(e.to_string()))?;
        Ok(())
    }

    async fn delete_prefix(&self, root: &str) -> Result<u64, ObjectStoreError> {
        let all = self.list_all_flat(root).await?;
        let keys: Vec<String> = all.into_iter().map(|(k, _)| k).collect();
        let mut deleted = 0u64;
        for chunk in keys.chunks(DELETE_BATCH_SIZE) {
            let objects: Vec<aws_sdk_s3::types::ObjectIdentifier> = chunk
                .iter()
                .filter_map(|k| aws_sdk_s3::types::ObjectIdentifier::builder().key(k).build().ok())
                .collect();
            let delete = aws_sdk_s3::types::Delete::builder().set_objects(Some(objects)).build().map_err(|e| ObjectStoreError::Transport(e.to_string()))?;
            self.client.delete_objects().bucket(&self.bucket).delete(delete).send().await.map_err(|e| ObjectStoreError::Transport(e.to_string()))?;
            deleted += chunk.len() as u64;
        }
        Ok(deleted)
    }

    async fn size(&self, key: &str) -> Result<i64, ObjectStoreError> {
        if key.ends_with('/') {
            let all = self.list_all_flat(key).await?;
            Ok(all.into_iter().map(|(_, sz)| sz).sum())
        } else {
            let resp = self.client.head_object().bucket(&self.bucket).key(key).send().await.map_err(|e| ObjectStoreError::Transport(e.to_string()))?;
            Ok(resp.content_length().unwrap_or(0))
        }
    }
}
