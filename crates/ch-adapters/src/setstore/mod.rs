// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resource Set Store (C1): unique-set semantics over string URLs with
//! atomic pop-N and a streaming bulk-insert.

mod error;
mod fake;
mod redis_store;

pub use error::SetStoreError;
pub use fake::FakeResourceSetStore;
pub use redis_store::RedisResourceSetStore;

use async_trait::async_trait;
use ch_core::Resource;

/// `add`/`bulkInsert`/`pop`/`count` over a named set.
#[async_trait]
pub trait ResourceSetStore: Send + Sync {
    /// Adds `resources` to `set`; returns the number of genuinely new
    /// members (set semantics — duplicates don't increase cardinality).
    async fn add(&self, set: &str, resources: &[Resource]) -> Result<u64, SetStoreError>;

    /// Opens a streaming inserter for bulk-loading `set`. `insert` must
    /// not block the caller on a network round-trip per resource; the
    /// adapter batches or pipelines internally. `close` flushes and
    /// surfaces any deferred write error.
    async fn bulk_insert(&self, set: &str) -> Result<Box<dyn Inserter>, SetStoreError>;

    /// Atomically removes and returns at most `n` elements, in
    /// unspecified order. A malformed stored URL is skipped rather than
    /// surfaced (ingest-time filtering is the enforcement point for URL
    /// validity).
    async fn pop(&self, set: &str, n: u64) -> Result<Vec<Resource>, SetStoreError>;

    async fn count(&self, set: &str) -> Result<u64, SetStoreError>;
}

/// Streaming handle returned by `bulk_insert`.
#[async_trait]
pub trait Inserter: Send {
    async fn insert(&mut self, resource: Resource) -> Result<(), SetStoreError>;

    /// Flushes any buffered writes and surfaces the first deferred error,
    /// if any.
    async fn close(self: Box<Self>) -> Result<(), SetStoreError>;
}

/// A stored URL is well-formed enough to become a `Resource` iff it
/// contains a `scheme://` separator. This is the only validity check the
/// set store itself performs; anything more specific happens at ingest
/// time (C6), per §4.1 "Rationale."
pub(crate) fn is_well_formed_url(raw: &str) -> bool {
    raw.contains("://")
}
