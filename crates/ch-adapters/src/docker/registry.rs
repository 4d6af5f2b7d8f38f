// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;
use std::sync::Arc;

use ch_core::Task;
use tokio_util::sync::CancellationToken;

use super::{ExecutionResult, Executor, ExecutorError};

/// Dispatches a task to the executor named by its execution strategy.
/// Mirrors the filter registry's name-keyed lookup-and-call shape (C5).
#[derive(Clone, Default)]
pub struct ExecutorRegistry {
    executors: HashMap<String, Arc<dyn Executor>>,
}

impl ExecutorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, executor: Arc<dyn Executor>) {
        self.executors.insert(name.into(), executor);
    }

    pub async fn execute(&self, task: &Task, cancel: CancellationToken) -> Result<ExecutionResult, ExecutorError> {
        let executor = self
            .executors
            .get(&task.execution.executor)
            .ok_or_else(|| ExecutorError::UnknownExecutor(task.execution.executor.clone()))?;
        executor.execute(task, cancel).await
    }

    pub async fn clean(&self, task: &Task) -> Result<(), ExecutorError> {
        let executor = self
            .executors
            .get(&task.execution.executor)
            .ok_or_else(|| ExecutorError::UnknownExecutor(task.execution.executor.clone()))?;
        executor.clean(task).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docker::PhonyExecutor;
    use ch_core::{ExecutionStrategy, Resource};
    use std::collections::HashMap as Map;

    fn task(executor: &str) -> Task {
        Task::new(
            Resource::new("s3://bucket/in/a"),
            Resource::new("s3://bucket/out/a"),
            ExecutionStrategy::new(executor, Map::new()),
            "",
            std::time::Duration::from_secs(5),
            "v1",
        )
    }

    #[tokio::test]
    async fn dispatches_to_registered_executor() {
        let mut registry = ExecutorRegistry::new();
        registry.register("phony", Arc::new(PhonyExecutor::default()));

        let result = registry.execute(&task("phony"), CancellationToken::new()).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn unknown_executor_errors() {
        let registry = ExecutorRegistry::new();
        let err = registry.execute(&task("nonexistent"), CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, ExecutorError::UnknownExecutor(name) if name == "nonexistent"));
    }
}
