// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tasker Service (C8): periodic poll of the resource set, templating each
//! popped resource into tasks, enqueueing them, and recording their hashes
//! in the task repository.

use std::sync::Arc;
use std::time::Duration;

use ch_adapters::{QueueError, ResourceSetStore, SetStoreError, TaskQueue};
use ch_core::Resource;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::templater::TaskTemplater;

#[derive(Debug, Error)]
pub enum TaskerError {
    #[error(transparent)]
    SetStore(#[from] SetStoreError),
    #[error(transparent)]
    Queue(#[from] QueueError),
}

pub const TICK_INTERVAL: Duration = Duration::from_secs(30);

pub struct TaskerService {
    resource_set_key: String,
    task_repository_key: String,
    set_store: Arc<dyn ResourceSetStore>,
    task_queue: Arc<dyn TaskQueue>,
    templater: TaskTemplater,
    batch_size: u64,
}

impl TaskerService {
    pub fn new(
        resource_set_key: impl Into<String>,
        task_repository_key: impl Into<String>,
        set_store: Arc<dyn ResourceSetStore>,
        task_queue: Arc<dyn TaskQueue>,
        templater: TaskTemplater,
        batch_size: u64,
    ) -> Self {
        Self {
            resource_set_key: resource_set_key.into(),
            task_repository_key: task_repository_key.into(),
            set_store,
            task_queue,
            templater,
            batch_size,
        }
    }

    /// Whatever the batch size ought to be this tick. Currently a
    /// constant; a future damped moving average of queue depth would
    /// live here.
    fn should_create(&self) -> u64 {
        self.batch_size
    }

    /// Pops up to `should_create()` resources and templates/enqueues each.
    /// On any failure, the resources not yet consumed are re-added to the
    /// set before returning the error, so a crash mid-tick never loses
    /// work — only reprocesses it.
    pub async fn create_tasks(&self) -> Result<u64, TaskerError> {
        let count = self.should_create();
        let mut sources = self.set_store.pop(&self.resource_set_key, count).await?;

        let result = self.drain_sources(&mut sources).await;

        if !sources.is_empty() {
            if let Err(e) = self.set_store.add(&self.resource_set_key, &sources).await {
                warn!(error = %e, remaining = sources.len(), "failed to re-add unconsumed sources after tick error");
            }
        }

        result
    }

    async fn drain_sources(&self, sources: &mut Vec<Resource>) -> Result<u64, TaskerError> {
        let mut created = 0u64;
        while !sources.is_empty() {
            let source = sources[0].clone();
            let tasks = self.templater.create(&source);
            for task in &tasks {
                self.task_queue.enqueue(task).await?;
                if let Err(e) = self.set_store.add(&self.task_repository_key, std::slice::from_ref(&Resource::new(task.hash()))).await {
                    warn!(error = %e, hash = task.hash(), "task repository add failed (advisory only)");
                }
                created += 1;
            }
            sources.remove(0);
        }
        Ok(created)
    }

    pub async fn poll(&self) -> Result<u64, TaskerError> {
        info!("tasker poll");
        self.create_tasks().await
    }

    /// Runs the 30-second tick loop until `shutdown` is cancelled,
    /// finishing any in-flight tick before returning.
    pub async fn run(&self, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(TICK_INTERVAL);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.poll().await {
                        warn!(error = %e, "tasker tick failed");
                    }
                }
                _ = shutdown.cancelled() => {
                    info!("tasker shutting down");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "tasker_tests.rs"]
mod tests;
