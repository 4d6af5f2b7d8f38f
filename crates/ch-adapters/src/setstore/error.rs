// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SetStoreError {
    #[error("set store transport error: {0}")]
    Transport(String),
    #[error("inserter already closed")]
    AlreadyClosed,
}
