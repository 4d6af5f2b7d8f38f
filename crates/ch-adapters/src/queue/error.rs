// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("queue transport error: {0}")]
    Transport(String),
    #[error("dequeue batch size out of range, must be between 1 and {max} inclusive")]
    BatchOutOfRange { max: u32 },
    #[error("message serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
