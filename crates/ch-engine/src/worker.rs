// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker Service (C14): dequeues tasks and drives each through the
//! download/execute/upload state machine, persisting on cancellation and
//! completing with a queue delete or a dead-letter fail.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use ch_adapters::{ExecutionResult, ExecutorError, ExecutorRegistry, QueueError, TaskQueue};
use ch_core::{Clock, ProcessStage, State, SystemClock, Task, TaskMessage};
use parking_lot::Mutex;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::hooks::{HookError, HookRegistry, Hooks};
use crate::persister::{PersistError, Persister};
use crate::task_loader::{TaskLoader, TaskLoaderError};

/// Below this remaining visibility window, a freshly dequeued message is
/// left alone rather than started: another worker will pick it up once it
/// redelivers, rather than racing a doomed attempt against the deadline.
const MIN_PROCESSING_WINDOW: Duration = Duration::from_secs(10);

const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("unknown task hooks {0:?}")]
    UnknownHooks(String),
    #[error("failed to create workspace: {0}")]
    Workspace(TaskLoaderError),
    #[error("during pre-download hook: {0}")]
    PreDownload(HookError),
    #[error("during download: {0}")]
    Download(TaskLoaderError),
    #[error("during pre-execute hook: {0}")]
    PreExecute(HookError),
    #[error("execution was cancelled")]
    Cancelled,
    #[error("error(s) during execution: {0}")]
    Execution(String),
    #[error("during pre-upload hook: {0}")]
    PreUpload(HookError),
    #[error("failed to upload task output: {0}")]
    Upload(TaskLoaderError),
    #[error("during post-upload hook: {0}")]
    PostUpload(HookError),
    #[error(transparent)]
    Queue(#[from] QueueError),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Outcome of driving a task through the state machine: the stage it
/// reached, and the error (if any) that stopped it there.
struct ProcessOutcome {
    stage: ProcessStage,
    result: ExecutionResult,
    error: Option<WorkerError>,
}

pub struct WorkerService {
    task_queue: Arc<dyn TaskQueue>,
    task_loader: Arc<TaskLoader>,
    executors: Arc<ExecutorRegistry>,
    hooks: HookRegistry,
    persister: Arc<dyn Persister>,
    version: String,
    clock: Arc<dyn Clock>,
    in_process: Arc<Mutex<HashMap<String, JoinHandle<()>>>>,
}

impl WorkerService {
    pub fn new(
        task_queue: Arc<dyn TaskQueue>,
        task_loader: Arc<TaskLoader>,
        executors: Arc<ExecutorRegistry>,
        hooks: HookRegistry,
        persister: Arc<dyn Persister>,
        version: impl Into<String>,
    ) -> Self {
        Self::with_clock(task_queue, task_loader, executors, hooks, persister, version, Arc::new(SystemClock))
    }

    pub fn with_clock(
        task_queue: Arc<dyn TaskQueue>,
        task_loader: Arc<TaskLoader>,
        executors: Arc<ExecutorRegistry>,
        hooks: HookRegistry,
        persister: Arc<dyn Persister>,
        version: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            task_queue,
            task_loader,
            executors,
            hooks,
            persister,
            version: version.into(),
            clock,
            in_process: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn in_process_count(&self) -> usize {
        self.in_process.lock().len()
    }

    /// Dequeues at most one message and spawns its processing, tracked by
    /// task hash so duplicate in-flight processing of the same task never
    /// happens within a single worker process. `shutdown` is the
    /// process-wide cancellation signal; spawned processors observe it at
    /// every suspension point of the state machine.
    pub async fn poll(self: &Arc<Self>, shutdown: CancellationToken) -> Result<(), WorkerError> {
        let messages = self.task_queue.dequeue(1).await?;
        for message in messages {
            let hash = message.task.hash().to_string();
            info!(task = %hash, "message pulled from task queue");
            let this = self.clone();
            let hash_for_spawn = hash.clone();
            let shutdown = shutdown.clone();
            let handle = tokio::spawn(async move {
                if let Err(e) = this.process_message(message, ProcessStage::Start, shutdown).await {
                    error!(error = %e, "unrecoverable error while processing task");
                }
                this.in_process.lock().remove(&hash_for_spawn);
            });
            self.in_process.lock().insert(hash, handle);
        }
        Ok(())
    }

    async fn process_message(
        self: &Arc<Self>,
        mut message: TaskMessage,
        start_stage: ProcessStage,
        shutdown: CancellationToken,
    ) -> Result<(), WorkerError> {
        let Some(hooks) = self.hooks.get(&message.task.hooks).cloned() else {
            let err = WorkerError::UnknownHooks(message.task.hooks.clone());
            return self.task_queue.fail(&message, &err.to_string()).await.map_err(Into::into);
        };

        let until_timeout = message.until_timeout_ms(self.clock.as_ref());
        if until_timeout < MIN_PROCESSING_WINDOW.as_millis() as u64 {
            return Ok(());
        }

        let timer_stop = CancellationToken::new();
        let timeout_guard = {
            let queue = self.task_queue.clone();
            let message = message.clone();
            let timer_stop = timer_stop.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = tokio::time::sleep(Duration::from_millis(until_timeout)) => {
                        warn!(task = %message.task.hash(), "visibility deadline reached mid-processing; deleting message");
                        let _ = queue.delete(&message).await;
                    }
                    _ = timer_stop.cancelled() => {}
                }
            })
        };

        let outcome = self.process(&mut message.task, hooks.as_ref(), start_stage, shutdown).await;
        timer_stop.cancel();
        timeout_guard.abort();

        if matches!(outcome.error, Some(WorkerError::Cancelled)) {
            let state = State { stage: outcome.stage, task_message: message, version: self.version.clone() };
            return self.persister.persist(&state).await.map_err(Into::into);
        }

        let mut errors: Vec<String> = Vec::new();
        if let Some(e) = &outcome.error {
            errors.push(e.to_string());
        }
        if let Err(e) = self.task_loader.clean(&message.task).await {
            errors.push(e.to_string());
        }
        if let Err(e) = self.executors.clean(&message.task).await {
            errors.push(e.to_string());
        }

        if errors.is_empty() {
            self.task_queue.delete(&message).await.map_err(Into::into)
        } else {
            self.task_queue.fail(&message, &errors.join("; ")).await.map_err(Into::into)
        }
    }

    /// Downloads, executes and uploads a single task, starting at `stage`.
    /// A `loop` over an exhaustive `match` carries the state machine
    /// forward one stage per iteration, checking cancellation at the top
    /// of every iteration rather than only at a single entry point.
    async fn process(&self, task: &mut Task, hooks: &dyn Hooks, stage: ProcessStage, cancel: CancellationToken) -> ProcessOutcome {
        let mut stage = stage;
        let mut result = ExecutionResult::default();

        loop {
            if cancel.is_cancelled() {
                return ProcessOutcome { stage, result, error: Some(WorkerError::Cancelled) };
            }

            match stage {
                ProcessStage::Start => {
                    if let Err(e) = self.task_loader.create_workspace(task).await {
                        return ProcessOutcome { stage, result, error: Some(WorkerError::Workspace(e)) };
                    }
                    stage = ProcessStage::Download;
                }
                ProcessStage::Download => {
                    if let Err(e) = hooks.pre_download(task).await {
                        return ProcessOutcome { stage, result, error: Some(WorkerError::PreDownload(e)) };
                    }
                    if let Err(e) = self.task_loader.download(task).await {
                        return ProcessOutcome { stage, result, error: Some(WorkerError::Download(e)) };
                    }
                    stage = ProcessStage::Execute;
                }
                ProcessStage::Execute => {
                    if let Err(e) = hooks.pre_execute(task).await {
                        return ProcessOutcome { stage, result, error: Some(WorkerError::PreExecute(e)) };
                    }
                    match self.executors.execute(task, cancel.clone()).await {
                        Ok(r) => result = r,
                        Err(ExecutorError::Cancelled) => {
                            return ProcessOutcome { stage, result, error: Some(WorkerError::Cancelled) };
                        }
                        Err(e) => {
                            return ProcessOutcome { stage, result, error: Some(WorkerError::Execution(e.to_string())) };
                        }
                    }
                    if let Err(e) = self.task_loader.upload_metadata(task, &result).await {
                        return ProcessOutcome { stage, result, error: Some(WorkerError::Execution(e.to_string())) };
                    }
                    stage = ProcessStage::Upload;
                }
                ProcessStage::Metadata => {
                    // Only ever produced as a failing return stage from
                    // `Execute`; a non-cancellation failure there never
                    // gets persisted, so this is never actually resumed
                    // from. Treated as equivalent to retrying upload.
                    stage = ProcessStage::Upload;
                }
                ProcessStage::Upload => {
                    if let Err(e) = hooks.pre_upload(task).await {
                        return ProcessOutcome { stage, result, error: Some(WorkerError::PreUpload(e)) };
                    }
                    if let Err(e) = self.task_loader.upload(task, &result.output_path).await {
                        return ProcessOutcome { stage, result, error: Some(WorkerError::Upload(e)) };
                    }
                    if let Err(e) = hooks.post_upload(task).await {
                        return ProcessOutcome { stage, result, error: Some(WorkerError::PostUpload(e)) };
                    }
                    stage = ProcessStage::Complete;
                }
                ProcessStage::Complete => {
                    return ProcessOutcome { stage, result, error: None };
                }
            }
        }
    }

    /// Loads any state left by a previous crashed/cancelled process and
    /// resumes each task from the stage it reached, so work already done
    /// (workspace creation, download, ...) is not repeated. Runs once, at
    /// startup, before the poll loop begins.
    async fn resume_persisted(self: &Arc<Self>, shutdown: CancellationToken) {
        let states = match self.persister.load().await {
            Ok(states) => states,
            Err(e) => {
                warn!(error = %e, "failed to load persisted worker state");
                return;
            }
        };
        for state in states {
            let hash = state.task_message.task.hash().to_string();
            info!(task = %hash, stage = ?state.stage, "resuming task from persisted state");
            if let Err(e) = self.process_message(state.task_message, state.stage, shutdown.clone()).await {
                error!(error = %e, task = %hash, "unrecoverable error while resuming persisted task");
            }
        }
    }

    /// Runs the tight poll loop until `shutdown` is cancelled, backing off
    /// 10s after a poll error.
    pub async fn run(self: Arc<Self>, shutdown: CancellationToken) {
        self.resume_persisted(shutdown.clone()).await;
        loop {
            if shutdown.is_cancelled() {
                info!("worker shutting down");
                break;
            }
            if let Err(e) = self.poll(shutdown.clone()).await {
                warn!(error = %e, "poll failed");
                tokio::select! {
                    _ = tokio::time::sleep(POLL_ERROR_BACKOFF) => {}
                    _ = shutdown.cancelled() => break,
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
