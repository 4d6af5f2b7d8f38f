// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_sqs::types::MessageAttributeValue;
use aws_sdk_sqs::Client;
use ch_core::{Clock, Task, TaskMessage};

use super::{dlq_attrs, QueueError, TaskQueue, MAX_LONG_POLL_WAIT_SECONDS, MAX_MESSAGES_PER_RECEIVE, MAX_VISIBILITY_TIMEOUT_SECONDS};

/// SQS-backed task queue. `dlq`, if set, is where `fail` enqueues.
pub struct SqsTaskQueue {
    client: Client,
    queue_url: String,
    max_visibility_secs: u64,
    clock: Arc<dyn Clock>,
    dlq: Option<Arc<dyn TaskQueue>>,
}

impl SqsTaskQueue {
    pub fn new(client: Client, queue_url: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            client,
            queue_url: queue_url.into(),
            max_visibility_secs: MAX_VISIBILITY_TIMEOUT_SECONDS,
            clock,
            dlq: None,
        }
    }

    pub fn with_dlq(mut self, dlq: Arc<dyn TaskQueue>) -> Self {
        self.dlq = Some(dlq);
        self
    }

    pub fn with_max_visibility_secs(mut self, secs: u64) -> Self {
        self.max_visibility_secs = secs;
        self
    }

    fn attrs_to_sqs(attrs: HashMap<String, String>) -> HashMap<String, MessageAttributeValue> {
        attrs
            .into_iter()
            .filter_map(|(k, v)| {
                let value = MessageAttributeValue::builder().data_type("String").string_value(v).build().ok()?;
                Some((k, value))
            })
            .collect()
    }
}

#[async_trait]
impl TaskQueue for SqsTaskQueue {
    async fn enqueue_with_attrs(&self, task: &Task, attrs: HashMap<String, String>) -> Result<(), QueueError> {
        let body = serde_json::to_string(task)?;
        let mut req = self.client.send_message().queue_url(&self.queue_url).message_body(body);
        for (k, v) in Self::attrs_to_sqs(attrs) {
            req = req.message_attributes(k, v);
        }
        req.send().await.map_err(|e| QueueError::Transport(e.to_string()))?;
        Ok(())
    }

    async fn dequeue(&self, max_batch: u32) -> Result<Vec<TaskMessage>, QueueError> {
        if max_batch < 1 || max_batch > MAX_MESSAGES_PER_RECEIVE {
            return Err(QueueError::BatchOutOfRange { max: MAX_MESSAGES_PER_RECEIVE });
        }
        let response = self
            .client
            .receive_message()
            .queue_url(&self.queue_url)
            .wait_time_seconds(MAX_LONG_POLL_WAIT_SECONDS as i32)
            .max_number_of_messages(max_batch as i32)
            .message_attribute_names("All")
            .send()
            .await
            .map_err(|e| QueueError::Transport(e.to_string()))?;

        let mut out = Vec::new();
        for msg in response.messages.unwrap_or_default() {
            let Some(body) = msg.body else { continue };
            let Some(handle) = msg.receipt_handle else { continue };
            let task: Task = serde_json::from_str(&body)?;
            out.push(TaskMessage::new(task, handle, self.max_visibility_secs, self.clock.as_ref()));
        }
        Ok(out)
    }

    async fn delete_unconditionally(&self, message: &TaskMessage) -> Result<(), QueueError> {
        self.client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(&message.handle)
            .send()
            .await
            .map_err(|e| QueueError::Transport(e.to_string()))?;
        Ok(())
    }

    async fn fail(&self, message: &TaskMessage, error: &str) -> Result<(), QueueError> {
        let mut first_err = None;

        if let Some(dlq) = &self.dlq {
            if let Err(e) = dlq.enqueue_with_attrs(&message.task, dlq_attrs(&message.task, error)).await {
                first_err = Some(e);
            }
        }

        if let Err(e) = self.delete_unconditionally(message).await {
            if first_err.is_none() {
                first_err = Some(e);
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn message_count(&self) -> Result<u64, QueueError> {
        let response = self
            .client
            .get_queue_attributes()
            .queue_url(&self.queue_url)
            .attribute_names(aws_sdk_sqs::types::QueueAttributeName::ApproximateNumberOfMessages)
            .send()
            .await
            .map_err(|e| QueueError::Transport(e.to_string()))?;

        let count = response
            .attributes
            .and_then(|a| a.get(&aws_sdk_sqs::types::QueueAttributeName::ApproximateNumberOfMessages).cloned())
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(0);
        Ok(count)
    }
}
