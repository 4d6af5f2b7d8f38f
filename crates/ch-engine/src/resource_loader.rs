// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resource Loader (C9): scheme-dispatched download/upload/capacity-check
//! over a `Resource`, layered onto the object store adapter.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use ch_adapters::ObjectStore;
use ch_core::Resource;
use thiserror::Error;

/// The zero-byte sentinel object written alongside a successful prefix
/// upload that carries non-empty metadata.
pub const METADATA_OBJECT_NAME: &str = "tw-metadata";

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error(transparent)]
    Store(#[from] ch_adapters::ObjectStoreError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no loader registered for scheme {0:?}")]
    UnknownScheme(String),
    #[error("unsupported archive format {0:?}")]
    UnsupportedArchiveFormat(String),
    #[error("prefix archival is not implemented")]
    ArchivalNotImplemented,
    #[error("statfs failed: {0}")]
    Statfs(String),
}

/// Builds an `ObjectStore` scoped to a single bucket/host, on demand.
/// Lets one `S3SchemeLoader` serve resources across many buckets without
/// pre-enumerating them.
pub trait ObjectStoreFactory: Send + Sync {
    fn for_bucket(&self, bucket: &str) -> Arc<dyn ObjectStore>;
}

#[async_trait]
pub trait SchemeLoader: Send + Sync {
    async fn check_capacity_posix(&self, resource: &Resource, path: &Path, scale_factor: u64) -> Result<bool, LoaderError>;
    async fn download(&self, resource: &Resource, path: &Path) -> Result<i64, LoaderError>;
    async fn upload(
        &self,
        resource: &Resource,
        path: &Path,
        metadata: &HashMap<String, String>,
        remove: bool,
    ) -> Result<i64, LoaderError>;
    async fn exists(&self, resource: &Resource) -> Result<bool, LoaderError>;
}

/// Dispatches to the scheme loader registered for a resource's URL
/// scheme, or to `"phony"` when the resource is synthetic.
pub struct ResourceLoader {
    registry: HashMap<String, Arc<dyn SchemeLoader>>,
}

impl ResourceLoader {
    /// Builds the registry with `"phony"` always present.
    pub fn new(mut registry: HashMap<String, Arc<dyn SchemeLoader>>) -> Self {
        registry.entry("phony".to_string()).or_insert_with(|| Arc::new(PhonyLoader));
        Self { registry }
    }

    fn resolve(&self, resource: &Resource) -> Result<&Arc<dyn SchemeLoader>, LoaderError> {
        let key = if resource.phony { "phony" } else { resource.scheme() };
        self.registry.get(key).ok_or_else(|| LoaderError::UnknownScheme(key.to_string()))
    }

    pub async fn check_capacity_posix(&self, resource: &Resource, path: &Path, scale_factor: u64) -> Result<bool, LoaderError> {
        self.resolve(resource)?.check_capacity_posix(resource, path, scale_factor).await
    }

    pub async fn download(&self, resource: &Resource, path: &Path) -> Result<i64, LoaderError> {
        self.resolve(resource)?.download(resource, path).await
    }

    pub async fn upload(
        &self,
        resource: &Resource,
        path: &Path,
        metadata: &HashMap<String, String>,
        remove: bool,
    ) -> Result<i64, LoaderError> {
        self.resolve(resource)?.upload(resource, path, metadata, remove).await
    }

    pub async fn exists(&self, resource: &Resource) -> Result<bool, LoaderError> {
        self.resolve(resource)?.exists(resource).await
    }
}

/// No-op loader for synthetic resources.
pub struct PhonyLoader;

#[async_trait]
impl SchemeLoader for PhonyLoader {
    async fn check_capacity_posix(&self, _resource: &Resource, _path: &Path, _scale_factor: u64) -> Result<bool, LoaderError> {
        Ok(true)
    }

    async fn download(&self, _resource: &Resource, _path: &Path) -> Result<i64, LoaderError> {
        Ok(0)
    }

    async fn upload(
        &self,
        _resource: &Resource,
        _path: &Path,
        _metadata: &HashMap<String, String>,
        _remove: bool,
    ) -> Result<i64, LoaderError> {
        Ok(0)
    }

    async fn exists(&self, _resource: &Resource) -> Result<bool, LoaderError> {
        Ok(false)
    }
}

/// S3-backed scheme loader. Builds a per-bucket `ObjectStore` from the
/// factory for every call rather than caching, since `S3ObjectStore` is a
/// thin handle around a shared client.
pub struct S3SchemeLoader {
    stores: Box<dyn ObjectStoreFactory>,
}

impl S3SchemeLoader {
    pub fn new(stores: impl ObjectStoreFactory + 'static) -> Self {
        Self { stores: Box::new(stores) }
    }

    fn store(&self, resource: &Resource) -> Arc<dyn ObjectStore> {
        self.stores.for_bucket(resource.host())
    }
}

async fn path_is_dir(path: &Path) -> Result<bool, LoaderError> {
    match tokio::fs::metadata(path).await {
        Ok(meta) => Ok(meta.is_dir()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

fn trim_trailing_slash(s: &str) -> &str {
    s.strip_suffix('/').unwrap_or(s)
}

#[async_trait]
impl SchemeLoader for S3SchemeLoader {
    async fn check_capacity_posix(&self, resource: &Resource, path: &Path, scale_factor: u64) -> Result<bool, LoaderError> {
        let object_size = self.store(resource).size(resource.path()).await?;
        let stat = nix::sys::statfs::statfs(path).map_err(|e| LoaderError::Statfs(e.to_string()))?;
        let available = stat.blocks_available() as u64 * stat.block_size() as u64;
        Ok((object_size as u64).saturating_mul(scale_factor) < available)
    }

    async fn download(&self, resource: &Resource, path: &Path) -> Result<i64, LoaderError> {
        let is_prefix = resource.is_prefix();
        let is_dir = path_is_dir(path).await?;
        let store = self.store(resource);

        match (is_prefix, is_dir) {
            // Prefix + directory: sync one level of the prefix into the directory.
            (true, true) => {
                let listing = store.list_level(resource.path()).await?;
                let mut total = 0;
                for key in listing.keys {
                    let rel = key.trim_start_matches(trim_trailing_slash(resource.path())).trim_start_matches('/');
                    total += store.download(&key, &path.join(rel)).await?;
                }
                Ok(total)
            }
            // Object + file: write the object to the existing file path.
            (false, false) => store.download(resource.path(), path).await.map_err(Into::into),
            // Prefix + file: archive-style download, not implemented.
            (true, false) => {
                let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
                if ext != "tar" {
                    Err(LoaderError::UnsupportedArchiveFormat(ext.to_string()))
                } else {
                    Err(LoaderError::ArchivalNotImplemented)
                }
            }
            // Object + directory: write into dir/<basename>.
            (false, true) => {
                let basename = resource.path().rsplit('/').next().unwrap_or_default();
                store.download(resource.path(), &path.join(basename)).await.map_err(Into::into)
            }
        }
    }

    async fn upload(
        &self,
        resource: &Resource,
        path: &Path,
        metadata: &HashMap<String, String>,
        remove: bool,
    ) -> Result<i64, LoaderError> {
        let is_prefix = resource.is_prefix();
        let is_dir = path_is_dir(path).await?;
        let store = self.store(resource);

        match (is_prefix, is_dir) {
            (true, true) => {
                let trimmed = trim_trailing_slash(resource.path());
                if remove {
                    store.delete_prefix(trimmed).await?;
                }
                let size = store.upload_directory(path, trimmed).await?;
                if !metadata.is_empty() {
                    let marker = tempfile::NamedTempFile::new()?;
                    store.upload(&format!("{trimmed}/{METADATA_OBJECT_NAME}"), marker.path(), metadata).await?;
                }
                Ok(size)
            }
            (false, false) => {
                if remove {
                    store.delete_if_exists(resource.path()).await?;
                }
                store.upload(resource.path(), path, metadata).await.map_err(Into::into)
            }
            (true, false) => {
                let filename = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
                let key = format!("{}/{}", trim_trailing_slash(resource.path()), filename);
                if remove {
                    store.delete_if_exists(&key).await?;
                }
                store.upload(&key, path, metadata).await.map_err(Into::into)
            }
            (false, true) => {
                let object = resource.path().rsplit('/').next().unwrap_or_default();
                let ext = object.rsplit_once('.').map(|(_, e)| e).unwrap_or("");
                if ext != "tar" {
                    Err(LoaderError::UnsupportedArchiveFormat(ext.to_string()))
                } else {
                    Err(LoaderError::ArchivalNotImplemented)
                }
            }
        }
    }

    async fn exists(&self, resource: &Resource) -> Result<bool, LoaderError> {
        self.store(resource).exists(resource.path()).await.map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ch_adapters::FakeObjectStore;

    struct SingleBucketFactory(Arc<dyn ObjectStore>);

    impl ObjectStoreFactory for SingleBucketFactory {
        fn for_bucket(&self, _bucket: &str) -> Arc<dyn ObjectStore> {
            self.0.clone()
        }
    }

    #[tokio::test]
    async fn phony_scheme_never_touches_the_network() {
        let loader = ResourceLoader::new(HashMap::new());
        let r = Resource::phony("phony://noop");
        assert_eq!(loader.download(&r, Path::new("/tmp/nope")).await.unwrap(), 0);
        assert!(!loader.exists(&r).await.unwrap());
    }

    #[tokio::test]
    async fn unknown_scheme_errors() {
        let loader = ResourceLoader::new(HashMap::new());
        let r = Resource::new("gopher://example/x");
        let err = loader.download(&r, Path::new("/tmp")).await.unwrap_err();
        assert!(matches!(err, LoaderError::UnknownScheme(s) if s == "gopher"));
    }

    #[tokio::test]
    async fn object_to_file_downloads_directly() {
        let store = Arc::new(FakeObjectStore::new());
        store.put_bytes("a/x.pdf", b"hello".to_vec());
        let mut registry: HashMap<String, Arc<dyn SchemeLoader>> = HashMap::new();
        registry.insert("s3".to_string(), Arc::new(S3SchemeLoader::new(SingleBucketFactory(store))));
        let loader = ResourceLoader::new(registry);

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.pdf");
        let r = Resource::new("s3://bucket/a/x.pdf");
        let n = loader.download(&r, &dest).await.unwrap();
        assert_eq!(n, 5);
        assert_eq!(std::fs::read(&dest).unwrap(), b"hello");
    }

    #[tokio::test]
    async fn prefix_to_file_without_tar_extension_errors() {
        let store = Arc::new(FakeObjectStore::new());
        let mut registry: HashMap<String, Arc<dyn SchemeLoader>> = HashMap::new();
        registry.insert("s3".to_string(), Arc::new(S3SchemeLoader::new(SingleBucketFactory(store))));
        let loader = ResourceLoader::new(registry);

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.zip");
        let r = Resource::new("s3://bucket/a/");
        let err = loader.download(&r, &dest).await.unwrap_err();
        assert!(matches!(err, LoaderError::UnsupportedArchiveFormat(ext) if ext == "zip"));
    }

    #[tokio::test]
    async fn object_to_dir_upload_without_tar_extension_errors() {
        let store = Arc::new(FakeObjectStore::new());
        let mut registry: HashMap<String, Arc<dyn SchemeLoader>> = HashMap::new();
        registry.insert("s3".to_string(), Arc::new(S3SchemeLoader::new(SingleBucketFactory(store))));
        let loader = ResourceLoader::new(registry);

        let dir = tempfile::tempdir().unwrap();
        let r = Resource::new("s3://bucket/a/out.zip");
        let err = loader.upload(&r, dir.path(), &HashMap::new(), false).await.unwrap_err();
        assert!(matches!(err, LoaderError::UnsupportedArchiveFormat(ext) if ext == "zip"));
    }

    #[tokio::test]
    async fn object_to_dir_upload_with_tar_extension_is_not_implemented() {
        let store = Arc::new(FakeObjectStore::new());
        let mut registry: HashMap<String, Arc<dyn SchemeLoader>> = HashMap::new();
        registry.insert("s3".to_string(), Arc::new(S3SchemeLoader::new(SingleBucketFactory(store))));
        let loader = ResourceLoader::new(registry);

        let dir = tempfile::tempdir().unwrap();
        let r = Resource::new("s3://bucket/a/out.tar");
        let err = loader.upload(&r, dir.path(), &HashMap::new(), false).await.unwrap_err();
        assert!(matches!(err, LoaderError::ArchivalNotImplemented));
    }
}
