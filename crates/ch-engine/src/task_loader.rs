// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task Loader (C10): per-task workspace lifecycle layered on the
//! resource loader (C9).

use std::collections::HashMap;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use ch_adapters::ExecutionResult;
use ch_core::{Task, Workspace};
use thiserror::Error;

use crate::resource_loader::{LoaderError, ResourceLoader};

#[derive(Debug, Error)]
pub enum TaskLoaderError {
    #[error(transparent)]
    Loader(#[from] LoaderError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("empty filepath")]
    EmptyFilePath,
}

/// Mode bits for created workspace directories.
const WORKSPACE_DIR_MODE: u32 = 0o700;

pub struct TaskLoader {
    loader: ResourceLoader,
    work_dir: PathBuf,
}

impl TaskLoader {
    pub fn new(loader: ResourceLoader, work_dir: impl Into<PathBuf>) -> Self {
        Self { loader, work_dir: work_dir.into() }
    }

    /// Creates `input`/`output`/`internal` under `workDir/<task.hash>`,
    /// mode 0700, and attaches the resulting paths to `task.workspace`.
    pub async fn create_workspace(&self, task: &mut Task) -> Result<(), TaskLoaderError> {
        let workspace = Workspace::for_task(&self.work_dir, task.hash());
        for dir in [&workspace.input_dir, &workspace.output_dir, &workspace.internal_dir] {
            tokio::fs::create_dir_all(dir).await?;
            tokio::fs::set_permissions(dir, std::fs::Permissions::from_mode(WORKSPACE_DIR_MODE)).await?;
        }
        task.workspace = Some(workspace);
        Ok(())
    }

    pub async fn check_capacity(&self, task: &Task, scale_factor: u64) -> Result<bool, TaskLoaderError> {
        let workspace = task.workspace.as_ref().expect("workspace created before capacity check");
        self.loader.check_capacity_posix(&task.input, &workspace.input_dir, scale_factor).await.map_err(Into::into)
    }

    /// Resets `input` to empty (idempotent) then downloads the task's
    /// input resource into it.
    pub async fn download(&self, task: &Task) -> Result<(), TaskLoaderError> {
        let workspace = task.workspace.as_ref().expect("workspace created before download");
        remove_contents(&workspace.input_dir).await?;
        self.loader.download(&task.input, &workspace.input_dir).await?;
        Ok(())
    }

    pub async fn upload(&self, task: &Task, file_path: &Path) -> Result<(), TaskLoaderError> {
        if file_path.as_os_str().is_empty() {
            return Err(TaskLoaderError::EmptyFilePath);
        }
        self.loader.upload(&task.output, file_path, &HashMap::new(), true).await?;
        Ok(())
    }

    /// Uploads every `(name, path)` pair in `result.metadata_paths` under
    /// `task.metadata`'s prefix, suffixed with `task.hash()/<name>`.
    pub async fn upload_metadata(&self, task: &Task, result: &ExecutionResult) -> Result<(), TaskLoaderError> {
        let Some(metadata) = &task.metadata else { return Ok(()) };
        for (name, file_path) in &result.metadata_paths {
            let target = metadata.with_key(&format!("{}/{}/{}", trim_slash(metadata.path()), task.hash(), name));
            self.loader.upload(&target, Path::new(file_path), &HashMap::new(), true).await?;
        }
        Ok(())
    }

    /// Removes `workDir/<task.hash>` recursively.
    pub async fn clean(&self, task: &Task) -> Result<(), TaskLoaderError> {
        let dir = self.work_dir.join(task.hash());
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn trim_slash(s: &str) -> &str {
    s.trim_start_matches('/').trim_end_matches('/')
}

async fn remove_contents(path: &Path) -> std::io::Result<()> {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    tokio::fs::create_dir_all(path).await?;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(WORKSPACE_DIR_MODE)).await
}

#[cfg(test)]
#[path = "task_loader_tests.rs"]
mod tests;
