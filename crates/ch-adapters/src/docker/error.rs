// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("task execution requires executor \"docker\", got {0:?}")]
    NotDocker(String),
    #[error("task execution config is missing an image")]
    MissingImage,
    #[error("container exited with non-zero status {0}")]
    NonZeroExit(i64),
    #[error("container execution timed out and was killed")]
    Timeout,
    #[error("execution was cancelled")]
    Cancelled,
    #[error("unknown executor {0:?}")]
    UnknownExecutor(String),
    #[error("container runtime error: {0}")]
    Runtime(String),
}
