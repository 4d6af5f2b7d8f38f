// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task Executor (C11): runs containers with the task's workspace mounted,
//! under a timeout, with reuse-by-name for resumption.

mod error;
mod fake;
mod real;
mod registry;

pub use error::ExecutorError;
pub use fake::PhonyExecutor;
pub use real::DockerExecutor;
pub use registry::ExecutorRegistry;

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use ch_core::Task;
use tokio_util::sync::CancellationToken;

/// Result of a successful `execute`.
#[derive(Clone, Debug, Default)]
pub struct ExecutionResult {
    pub output_path: PathBuf,
    pub metadata_paths: HashMap<String, String>,
}

#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, task: &Task, cancel: CancellationToken) -> Result<ExecutionResult, ExecutorError>;

    /// Removes the container by name, if `should_remove` is configured.
    async fn clean(&self, task: &Task) -> Result<(), ExecutorError>;
}
