// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Envelope around a dequeued `Task`.

use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::task::Task;

/// `{task, handle, visibilityDeadline}`. `handle` is the queue-specific
/// receipt needed to delete or extend visibility; `visibilityDeadline` is
/// set 10s before the queue's maximum visibility to leave room for
/// cleanup.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TaskMessage {
    pub task: Task,
    pub handle: String,
    pub visibility_deadline_ms: u64,
}

/// Safety margin subtracted from the queue's maximum visibility window so
/// the worker has time to run cleanup before redelivery risk.
pub const VISIBILITY_SAFETY_MARGIN_SECS: u64 = 10;

impl TaskMessage {
    pub fn new(task: Task, handle: impl Into<String>, queue_max_visibility_secs: u64, clock: &dyn Clock) -> Self {
        let deadline_secs = queue_max_visibility_secs.saturating_sub(VISIBILITY_SAFETY_MARGIN_SECS);
        let visibility_deadline_ms = clock.now_ms() + deadline_secs * 1000;
        Self { task, handle: handle.into(), visibility_deadline_ms }
    }

    /// Remaining time until the visibility deadline; negative values are
    /// clamped to zero (deadline already passed).
    pub fn until_timeout_ms(&self, clock: &dyn Clock) -> u64 {
        self.visibility_deadline_ms.saturating_sub(clock.now_ms())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FakeClock;
    use crate::execution::ExecutionStrategy;
    use crate::resource::Resource;
    use std::time::Duration;

    #[test]
    fn deadline_is_margin_before_max_visibility() {
        let clock = FakeClock::new(0);
        let task = Task::new(
            Resource::new("s3://b/x"),
            Resource::new("s3://b/y"),
            ExecutionStrategy::docker("img"),
            "mov",
            Duration::from_secs(60),
            "0.1",
        );
        let msg = TaskMessage::new(task, "handle-1", 30, &clock);
        assert_eq!(msg.visibility_deadline_ms, 20_000);
        assert_eq!(msg.until_timeout_ms(&clock), 20_000);
    }
}
