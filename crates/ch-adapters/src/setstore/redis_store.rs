// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use async_trait::async_trait;
use ch_core::Resource;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use super::{is_well_formed_url, Inserter, ResourceSetStore, SetStoreError};

/// Flush threshold for the streaming bulk-inserter's internal batching.
const BULK_INSERT_BATCH: usize = 500;

/// Redis-backed set store: `SADD`/`SPOP`/`SCARD` against a configured
/// connection. `SPOP key count` gives an atomic multi-pop.
#[derive(Clone)]
pub struct RedisResourceSetStore {
    manager: ConnectionManager,
}

impl RedisResourceSetStore {
    pub async fn connect(addr: &str, password: Option<&str>) -> Result<Self, SetStoreError> {
        let mut conn_info = redis::ConnectionInfo {
            addr: redis::ConnectionAddr::Tcp(
                addr.split(':').next().unwrap_or("127.0.0.1").to_string(),
                addr.split(':').nth(1).and_then(|p| p.parse().ok()).unwrap_or(6379),
            ),
            redis: redis::RedisConnectionInfo { password: password.map(str::to_string), ..Default::default() },
        };
        if password.is_none() {
            conn_info.redis.password = None;
        }
        let client = redis::Client::open(conn_info).map_err(|e| SetStoreError::Transport(e.to_string()))?;
        let manager = ConnectionManager::new(client).await.map_err(|e| SetStoreError::Transport(e.to_string()))?;
        Ok(Self { manager })
    }

    async fn sadd_batch(&self, set: &str, batch: &[Resource]) -> Result<u64, SetStoreError> {
        if batch.is_empty() {
            return Ok(0);
        }
        let urls: Vec<&str> = batch.iter().map(Resource::url).collect();
        let mut conn = self.manager.clone();
        conn.sadd(set, urls).await.map_err(|e| SetStoreError::Transport(e.to_string()))
    }
}

#[async_trait]
impl ResourceSetStore for RedisResourceSetStore {
    async fn add(&self, set: &str, resources: &[Resource]) -> Result<u64, SetStoreError> {
        self.sadd_batch(set, resources).await
    }

    async fn bulk_insert(&self, set: &str) -> Result<Box<dyn Inserter>, SetStoreError> {
        Ok(Box::new(RedisInserter { store: self.clone(), set: set.to_string(), buffer: Vec::new(), closed: false }))
    }

    async fn pop(&self, set: &str, n: u64) -> Result<Vec<Resource>, SetStoreError> {
        let mut conn = self.manager.clone();
        let raw: Vec<String> =
            redis::cmd("SPOP").arg(set).arg(n).query_async(&mut conn).await.map_err(|e| SetStoreError::Transport(e.to_string()))?;
        Ok(raw.into_iter().filter(|url| is_well_formed_url(url)).map(Resource::new).collect())
    }

    async fn count(&self, set: &str) -> Result<u64, SetStoreError> {
        let mut conn = self.manager.clone();
        conn.scard(set).await.map_err(|e| SetStoreError::Transport(e.to_string()))
    }
}

struct RedisInserter {
    store: RedisResourceSetStore,
    set: String,
    buffer: Vec<Resource>,
    closed: bool,
}

#[async_trait]
impl Inserter for RedisInserter {
    async fn insert(&mut self, resource: Resource) -> Result<(), SetStoreError> {
        if self.closed {
            return Err(SetStoreError::AlreadyClosed);
        }
        self.buffer.push(resource);
        if self.buffer.len() >= BULK_INSERT_BATCH {
            self.store.sadd_batch(&self.set, &self.buffer).await?;
            self.buffer.clear();
        }
        Ok(())
    }

    async fn close(mut self: Box<Self>) -> Result<(), SetStoreError> {
        self.closed = true;
        self.store.sadd_batch(&self.set, &self.buffer).await?;
        self.buffer.clear();
        Ok(())
    }
}
