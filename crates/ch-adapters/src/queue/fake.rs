// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use ch_core::{Clock, Task, TaskMessage};
use parking_lot::Mutex;

use super::{dlq_attrs, QueueError, TaskQueue, MAX_MESSAGES_PER_RECEIVE};

/// In-memory task queue for tests. Tracks pending vs. in-flight messages
/// by handle so cancellation/redelivery scenarios can be exercised
/// without a real SQS queue.
#[derive(Clone)]
pub struct FakeTaskQueue {
    inner: Arc<Inner>,
}

struct Inner {
    pending: Mutex<VecDeque<Task>>,
    in_flight: Mutex<HashMap<String, TaskMessage>>,
    next_handle: AtomicU64,
    clock: Arc<dyn Clock>,
    max_visibility_secs: u64,
    dlq: Mutex<Option<Arc<dyn TaskQueue>>>,
}

impl FakeTaskQueue {
    pub fn new(clock: Arc<dyn Clock>, max_visibility_secs: u64) -> Self {
        Self {
            inner: Arc::new(Inner {
                pending: Mutex::new(VecDeque::new()),
                in_flight: Mutex::new(HashMap::new()),
                next_handle: AtomicU64::new(0),
                clock,
                max_visibility_secs,
                dlq: Mutex::new(None),
            }),
        }
    }

    pub fn with_dlq(self, dlq: Arc<dyn TaskQueue>) -> Self {
        *self.inner.dlq.lock() = Some(dlq);
        self
    }

    pub fn pending_len(&self) -> usize {
        self.inner.pending.lock().len()
    }

    pub fn in_flight_len(&self) -> usize {
        self.inner.in_flight.lock().len()
    }

    /// Simulates a visibility timeout lapsing: moves in-flight messages
    /// whose deadline has passed back onto the pending queue.
    pub fn expire_lapsed(&self) {
        let now = self.inner.clock.now_ms();
        let mut in_flight = self.inner.in_flight.lock();
        let mut pending = self.inner.pending.lock();
        let expired: Vec<String> =
            in_flight.iter().filter(|(_, m)| m.visibility_deadline_ms <= now).map(|(h, _)| h.clone()).collect();
        for handle in expired {
            if let Some(msg) = in_flight.remove(&handle) {
                pending.push_back(msg.task);
            }
        }
    }
}

#[async_trait]
impl TaskQueue for FakeTaskQueue {
    async fn enqueue_with_attrs(&self, task: &Task, _attrs: HashMap<String, String>) -> Result<(), QueueError> {
        self.inner.pending.lock().push_back(task.clone());
        Ok(())
    }

    async fn dequeue(&self, max_batch: u32) -> Result<Vec<TaskMessage>, QueueError> {
        if max_batch < 1 || max_batch > MAX_MESSAGES_PER_RECEIVE {
            return Err(QueueError::BatchOutOfRange { max: MAX_MESSAGES_PER_RECEIVE });
        }
        let mut out = Vec::new();
        let mut pending = self.inner.pending.lock();
        let mut in_flight = self.inner.in_flight.lock();
        for _ in 0..max_batch {
            let Some(task) = pending.pop_front() else { break };
            let handle = self.inner.next_handle.fetch_add(1, Ordering::SeqCst).to_string();
            let msg = TaskMessage::new(task, handle.clone(), self.inner.max_visibility_secs, self.inner.clock.as_ref());
            in_flight.insert(handle, msg.clone());
            out.push(msg);
        }
        Ok(out)
    }

    async fn delete_unconditionally(&self, message: &TaskMessage) -> Result<(), QueueError> {
        self.inner.in_flight.lock().remove(&message.handle);
        Ok(())
    }

    async fn fail(&self, message: &TaskMessage, error: &str) -> Result<(), QueueError> {
        self.inner.in_flight.lock().remove(&message.handle);
        if let Some(dlq) = self.inner.dlq.lock().as_ref() {
            dlq.enqueue_with_attrs(&message.task, dlq_attrs(&message.task, error)).await?;
        }
        Ok(())
    }

    async fn message_count(&self) -> Result<u64, QueueError> {
        Ok((self.inner.pending.lock().len() + self.inner.in_flight.lock().len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ch_core::{ExecutionStrategy, FakeClock, Resource};
    use std::time::Duration;

    fn sample_task() -> Task {
        Task::new(
            Resource::new("s3://b/x"),
            Resource::new("s3://b/y"),
            ExecutionStrategy::docker("img"),
            "mov",
            Duration::from_secs(60),
            "0.1",
        )
    }

    #[tokio::test]
    async fn delete_is_idempotent_and_makes_no_second_transport_call() {
        let clock = Arc::new(FakeClock::new(0));
        let queue = FakeTaskQueue::new(clock, 30);
        queue.enqueue(&sample_task()).await.unwrap();
        let mut msgs = queue.dequeue(1).await.unwrap();
        let msg = msgs.remove(0);

        queue.delete(&msg).await.unwrap();
        assert_eq!(queue.in_flight_len(), 0);
        // Second delete: task already marked deleted, no-op.
        queue.delete(&msg).await.unwrap();
        assert!(msg.task.is_deleted());
    }

    #[tokio::test]
    async fn fail_enqueues_dlq_and_removes_from_primary() {
        let clock = Arc::new(FakeClock::new(0));
        let dlq = Arc::new(FakeTaskQueue::new(clock.clone(), 30));
        let queue = FakeTaskQueue::new(clock, 30).with_dlq(dlq.clone());
        queue.enqueue(&sample_task()).await.unwrap();
        let msgs = queue.dequeue(1).await.unwrap();
        queue.fail(&msgs[0], "boom").await.unwrap();

        assert_eq!(queue.in_flight_len(), 0);
        assert_eq!(dlq.message_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn dequeue_batch_out_of_range_errors() {
        let clock = Arc::new(FakeClock::new(0));
        let queue = FakeTaskQueue::new(clock, 30);
        assert!(queue.dequeue(0).await.is_err());
        assert!(queue.dequeue(11).await.is_err());
    }
}
