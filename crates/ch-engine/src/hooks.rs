// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hook Registry (C12): per-template lifecycle callbacks. Default
//! implementations are no-ops; templates override selectively.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use ch_core::Task;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HookError {
    #[error("hook failed: {0}")]
    Failed(String),
}

#[async_trait]
pub trait Hooks: Send + Sync {
    async fn pre_download(&self, _task: &Task) -> Result<(), HookError> {
        Ok(())
    }

    async fn pre_execute(&self, _task: &Task) -> Result<(), HookError> {
        Ok(())
    }

    async fn pre_upload(&self, _task: &Task) -> Result<(), HookError> {
        Ok(())
    }

    async fn post_upload(&self, _task: &Task) -> Result<(), HookError> {
        Ok(())
    }
}

/// All-default hook set, registered under a template's name when no
/// bespoke behaviour is needed.
pub struct NoopHooks;

impl Hooks for NoopHooks {}

pub type HookRegistry = HashMap<String, Arc<dyn Hooks>>;
