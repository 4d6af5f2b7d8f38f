// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task Queue (C2): at-least-once delivery with visibility timeout and a
//! dead-letter sibling.

mod error;
mod fake;
mod sqs;

pub use error::QueueError;
pub use fake::FakeTaskQueue;
pub use sqs::SqsTaskQueue;

use std::collections::HashMap;

use async_trait::async_trait;
use ch_core::{Task, TaskMessage};

/// SQS protocol limits; concrete transport constraints, not design
/// choices.
pub const MAX_LONG_POLL_WAIT_SECONDS: u64 = 20;
pub const MAX_VISIBILITY_TIMEOUT_SECONDS: u64 = 43_200;
pub const MAX_MESSAGES_PER_RECEIVE: u32 = 10;

#[async_trait]
pub trait TaskQueue: Send + Sync {
    async fn enqueue(&self, task: &Task) -> Result<(), QueueError> {
        self.enqueue_with_attrs(task, HashMap::new()).await
    }

    async fn enqueue_with_attrs(&self, task: &Task, attrs: HashMap<String, String>) -> Result<(), QueueError>;

    /// Long-polls up to `MAX_LONG_POLL_WAIT_SECONDS` for up to
    /// `max_batch` (clamped to `[1, MAX_MESSAGES_PER_RECEIVE]`) messages.
    async fn dequeue(&self, max_batch: u32) -> Result<Vec<TaskMessage>, QueueError>;

    /// Idempotent per-task via the task's own `deleted` flag: a second
    /// call on an already-deleted message's task is a no-op that makes no
    /// transport call.
    async fn delete(&self, message: &TaskMessage) -> Result<(), QueueError> {
        if !message.task.mark_deleted() {
            return Ok(());
        }
        self.delete_unconditionally(message).await
    }

    /// The actual transport delete; only ever called once per task by
    /// `delete`'s mutex-guarded check, or directly by `fail`.
    async fn delete_unconditionally(&self, message: &TaskMessage) -> Result<(), QueueError>;

    /// Best-effort: deletes from the primary queue and enqueues to the
    /// DLQ with `Error`/`Hash` attributes. Both are attempted regardless
    /// of whether the other failed; the first error encountered (if any)
    /// is returned.
    async fn fail(&self, message: &TaskMessage, error: &str) -> Result<(), QueueError>;

    async fn message_count(&self) -> Result<u64, QueueError>;
}

pub(crate) fn dlq_attrs(task: &Task, error: &str) -> HashMap<String, String> {
    let mut attrs = HashMap::new();
    attrs.insert("Error".to_string(), error.to_string());
    attrs.insert("Hash".to_string(), task.hash().to_string());
    attrs
}
