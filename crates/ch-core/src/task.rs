// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `Task` is the unit of work handed from the tasker to the worker fleet.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::execution::ExecutionStrategy;
use crate::hash::collate;
use crate::resource::Resource;
use crate::workspace::Workspace;

/// `{input, output, metadata?, execution, hooks, workspace?, timeout, version}`.
///
/// `hash` collates the input and output resource hashes order-independently
/// and also serves as the task's container name — uniqueness of
/// `(input, output)` implies uniqueness of container.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Task {
    pub input: Resource,
    pub output: Resource,
    pub metadata: Option<Resource>,
    pub execution: ExecutionStrategy,
    pub hooks: String,
    pub workspace: Option<Workspace>,
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
    pub version: String,

    #[serde(skip, default)]
    hash: OnceLock<String>,
    /// Guards idempotent queue delete: the second `delete` call on an
    /// already-deleted task observes the flag set and skips the transport
    /// call.
    #[serde(skip, default)]
    deleted: Arc<Mutex<bool>>,
}

impl Task {
    pub fn new(
        input: Resource,
        output: Resource,
        execution: ExecutionStrategy,
        hooks: impl Into<String>,
        timeout: Duration,
        version: impl Into<String>,
    ) -> Self {
        Self {
            input,
            output,
            metadata: None,
            execution,
            hooks: hooks.into(),
            workspace: None,
            timeout,
            version: version.into(),
            hash: OnceLock::new(),
            deleted: Arc::new(Mutex::new(false)),
        }
    }

    pub fn hash(&self) -> &str {
        self.hash.get_or_init(|| collate([self.input.hash().to_string(), self.output.hash().to_string()]))
    }

    /// Marks the task deleted if it was not already. Returns `true` if this
    /// call performed the transition (and so the caller should issue the
    /// transport delete); `false` if a prior call already did.
    pub fn mark_deleted(&self) -> bool {
        let mut deleted = self.deleted.lock();
        if *deleted {
            false
        } else {
            *deleted = true;
            true
        }
    }

    pub fn is_deleted(&self) -> bool {
        *self.deleted.lock()
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
