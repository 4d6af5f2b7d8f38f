// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State Persister (C13): writes `.chstate.json` on worker cancellation so
//! a resumed worker can pick up from the stage it reached.

use std::os::unix::fs::OpenOptionsExt;
use std::path::PathBuf;

use async_trait::async_trait;
use ch_core::State;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

const STATE_FILE_MODE: u32 = 0o600;

#[async_trait]
pub trait Persister: Send + Sync {
    async fn persist(&self, state: &State) -> Result<(), PersistError>;

    /// Walks the work directory, decoding every `.chstate.json` found.
    /// Unknown JSON fields are ignored (serde's default behaviour) for
    /// forward compatibility.
    async fn load(&self) -> Result<Vec<State>, PersistError>;
}

pub struct FsPersister {
    work_dir: PathBuf,
}

impl FsPersister {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self { work_dir: work_dir.into() }
    }
}

#[async_trait]
impl Persister for FsPersister {
    async fn persist(&self, state: &State) -> Result<(), PersistError> {
        let path = state.task_message.task.workspace.as_ref().map(|w| w.state_file()).unwrap_or_else(|| {
            self.work_dir.join(state.task_message.task.hash()).join("internal").join(".chstate.json")
        });
        let bytes = serde_json::to_vec(state)?;
        tokio::task::spawn_blocking(move || -> Result<(), PersistError> {
            use std::io::Write;
            let mut file = std::fs::OpenOptions::new().create(true).write(true).truncate(true).mode(STATE_FILE_MODE).open(&path)?;
            file.write_all(&bytes)?;
            Ok(())
        })
        .await
        .map_err(|e| PersistError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))??;
        Ok(())
    }

    async fn load(&self) -> Result<Vec<State>, PersistError> {
        let work_dir = self.work_dir.clone();
        tokio::task::spawn_blocking(move || -> Result<Vec<State>, PersistError> {
            let mut states = Vec::new();
            for entry in walkdir::WalkDir::new(&work_dir).into_iter().filter_map(Result::ok) {
                if entry.file_type().is_file() && entry.file_name() == ".chstate.json" {
                    let bytes = std::fs::read(entry.path())?;
                    states.push(serde_json::from_slice(&bytes)?);
                }
            }
            Ok(states)
        })
        .await
        .map_err(|e| PersistError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?
    }
}

#[cfg(test)]
#[path = "persister_tests.rs"]
mod tests;
