// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-task on-disk scratch space.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Three sibling directories under `workDir/<task.hash>`, created mode
/// 0700 by the task loader's `createWorkspace`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Workspace {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub internal_dir: PathBuf,
}

impl Workspace {
    pub fn for_task(work_dir: &Path, task_hash: &str) -> Self {
        let root = work_dir.join(task_hash);
        Self {
            input_dir: root.join("input"),
            output_dir: root.join("output"),
            internal_dir: root.join("internal"),
        }
    }

    pub fn root(&self) -> &Path {
        // All three siblings share a parent; `internal_dir`'s parent is it.
        self.internal_dir.parent().unwrap_or(&self.internal_dir)
    }

    pub fn state_file(&self) -> PathBuf {
        self.internal_dir.join(".chstate.json")
    }
}
