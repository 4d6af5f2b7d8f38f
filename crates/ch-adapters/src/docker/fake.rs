// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use ch_core::Task;
use tokio_util::sync::CancellationToken;

use super::{ExecutionResult, Executor, ExecutorError};

/// Always-succeeds (or configurably-failing) executor for worker tests,
/// registered under the `"phony"` executor name. Never shells out to a
/// real container runtime.
pub struct PhonyExecutor {
    exit_code: i64,
    delay: std::time::Duration,
    executed: AtomicUsize,
    cleaned: Mutex<Vec<String>>,
}

impl Default for PhonyExecutor {
    fn default() -> Self {
        Self { exit_code: 0, delay: std::time::Duration::ZERO, executed: AtomicUsize::new(0), cleaned: Mutex::new(Vec::new()) }
    }
}

impl PhonyExecutor {
    pub fn exiting_with(exit_code: i64) -> Self {
        Self { exit_code, ..Self::default() }
    }

    pub fn with_delay(delay: std::time::Duration) -> Self {
        Self { delay, ..Self::default() }
    }

    pub fn execute_count(&self) -> usize {
        self.executed.load(Ordering::SeqCst)
    }

    pub fn cleaned_tasks(&self) -> Vec<String> {
        self.cleaned.lock().unwrap().clone()
    }
}

#[async_trait]
impl Executor for PhonyExecutor {
    async fn execute(&self, task: &Task, cancel: CancellationToken) -> Result<ExecutionResult, ExecutorError> {
        self.executed.fetch_add(1, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::select! {
                _ = tokio::time::sleep(self.delay) => {}
                _ = cancel.cancelled() => return Err(ExecutorError::Cancelled),
            }
        }

        if self.exit_code != 0 {
            return Err(ExecutorError::NonZeroExit(self.exit_code));
        }

        let output_path = task.workspace.as_ref().map(|w| w.output_dir.clone()).unwrap_or_else(|| PathBuf::from("/out"));
        Ok(ExecutionResult { output_path, metadata_paths: HashMap::new() })
    }

    async fn clean(&self, task: &Task) -> Result<(), ExecutorError> {
        self.cleaned.lock().unwrap().push(task.hash().to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ch_core::{ExecutionStrategy, Resource};
    use std::collections::HashMap;

    fn task() -> Task {
        let strategy = ExecutionStrategy::new("phony", HashMap::new());
        Task::new(
            Resource::new("s3://bucket/in/a"),
            Resource::new("s3://bucket/out/a"),
            strategy,
            "",
            std::time::Duration::from_secs(5),
            "v1",
        )
    }

    #[tokio::test]
    async fn succeeds_by_default() {
        let exec = PhonyExecutor::default();
        let result = exec.execute(&task(), CancellationToken::new()).await;
        assert!(result.is_ok());
        assert_eq!(exec.execute_count(), 1);
    }

    #[tokio::test]
    async fn reports_configured_non_zero_exit() {
        let exec = PhonyExecutor::exiting_with(17);
        let err = exec.execute(&task(), CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, ExecutorError::NonZeroExit(17)));
    }

    #[tokio::test]
    async fn cancellation_during_delay_is_reported() {
        let exec = PhonyExecutor::with_delay(std::time::Duration::from_secs(60));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = exec.execute(&task(), cancel).await.unwrap_err();
        assert!(matches!(err, ExecutorError::Cancelled));
    }
}
