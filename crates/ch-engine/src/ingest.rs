// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ingest Service (C6): filters and inserts resources into the set store,
//! either a single resource or every object under a walked prefix.

use std::sync::Arc;

use async_trait::async_trait;
use ch_adapters::{walk, ResourceSetStore, WalkError};
use ch_core::{Filter, FilterError, FilterRegistry, Resource};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::resource_loader::ObjectStoreFactory;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("invalid filter {filter}: {source}")]
    InvalidFilter { filter: String, source: FilterError },
    #[error("recursion depth specified but key {0:?} is not a prefix; append '/' to ingest a prefix recursively")]
    RecursionOnNonPrefix(String),
    #[error(transparent)]
    SetStore(#[from] ch_adapters::SetStoreError),
    #[error(transparent)]
    Walk(#[from] WalkError),
}

#[async_trait]
pub trait IngestService: Send + Sync {
    async fn ingest(&self, resource: Resource, filter_spec: &str, recursion_depth: u32) -> Result<u64, IngestError>;
}

pub struct Ingester {
    set_store: Arc<dyn ResourceSetStore>,
    resource_set_key: String,
    filters: FilterRegistry,
    stores: Arc<dyn ObjectStoreFactory>,
}

impl Ingester {
    /// `stores` resolves the object store to walk by the ingested
    /// resource's own host (bucket), so one ingester can serve requests
    /// against whatever bucket each URL names.
    pub fn new(
        set_store: Arc<dyn ResourceSetStore>,
        resource_set_key: impl Into<String>,
        filters: FilterRegistry,
        stores: Arc<dyn ObjectStoreFactory>,
    ) -> Self {
        Self { set_store, resource_set_key: resource_set_key.into(), filters, stores }
    }

    async fn ingest_prefix(&self, resource: Resource, filter: Filter, depth: u32) -> Result<u64, IngestError> {
        let inserter = Arc::new(Mutex::new(self.set_store.bulk_insert(&self.resource_set_key).await?));

        let root = resource.clone();
        let visit: ch_adapters::Visit = {
            let inserter = inserter.clone();
            Arc::new(move |key: String| {
                let root = root.clone();
                let filter = filter.clone();
                let inserter = inserter.clone();
                Box::pin(async move {
                    let Some(admitted) = filter(&root.with_key(&key)) else { return Ok(()) };
                    inserter.lock().await.insert(admitted).await.map_err(|e| WalkError::Visit(e.to_string()))
                }) as std::pin::Pin<Box<dyn std::future::Future<Output = Result<(), WalkError>> + Send>>
            })
        };

        let store = self.stores.for_bucket(resource.host());
        walk(store, resource.path().to_string(), depth, visit).await?;

        let inserter = Arc::try_unwrap(inserter).unwrap_or_else(|_| unreachable!("walk has completed; no other clone is live")).into_inner();
        inserter.close().await?;

        Ok(self.set_store.count(&self.resource_set_key).await?)
    }
}

#[async_trait]
impl IngestService for Ingester {
    async fn ingest(&self, resource: Resource, filter_spec: &str, recursion_depth: u32) -> Result<u64, IngestError> {
        let filter =
            self.filters.new_filter(filter_spec).map_err(|e| IngestError::InvalidFilter { filter: filter_spec.to_string(), source: e })?;

        if recursion_depth > 0 {
            if !resource.is_prefix() {
                return Err(IngestError::RecursionOnNonPrefix(resource.url().to_string()));
            }
            return self.ingest_prefix(resource, filter, recursion_depth).await;
        }

        let Some(admitted) = filter(&resource) else { return Ok(0) };
        let inserted = self.set_store.add(&self.resource_set_key, std::slice::from_ref(&admitted)).await?;
        Ok(inserted)
    }
}

#[cfg(test)]
#[path = "ingest_tests.rs"]
mod tests;
