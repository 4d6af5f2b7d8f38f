// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker persistence record, written on cancellation for later resumption.

use serde::{Deserialize, Serialize};

use crate::task_message::TaskMessage;

/// The worker's state-machine alphabet. Stages execute in this declared
/// order; resumption may begin at any intermediate stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessStage {
    Start,
    Download,
    Execute,
    Metadata,
    Upload,
    Complete,
}

impl ProcessStage {
    pub fn next(self) -> ProcessStage {
        match self {
            ProcessStage::Start => ProcessStage::Download,
            ProcessStage::Download => ProcessStage::Execute,
            ProcessStage::Execute => ProcessStage::Metadata,
            ProcessStage::Metadata => ProcessStage::Upload,
            ProcessStage::Upload => ProcessStage::Complete,
            ProcessStage::Complete => ProcessStage::Complete,
        }
    }
}

/// `{stage, taskMessage, version}`. Serialised to
/// `internalDir/.chstate.json`; unknown fields are ignored on load
/// (serde's default behaviour — no `deny_unknown_fields`) for forward
/// compatibility.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct State {
    pub stage: ProcessStage,
    pub task_message: TaskMessage,
    pub version: String,
}
