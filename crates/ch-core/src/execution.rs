// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ExecutionStrategy` names the executor a task runs under and its config.

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::hash::hash_bytes;

/// `{executor, config}`. Hash is SHA-1 over `(executor, sorted(config))`,
/// deterministic regardless of map iteration order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExecutionStrategy {
    pub executor: String,
    pub config: HashMap<String, String>,
    #[serde(skip, default)]
    hash: OnceLock<String>,
}

impl ExecutionStrategy {
    pub fn new(executor: impl Into<String>, config: HashMap<String, String>) -> Self {
        Self { executor: executor.into(), config, hash: OnceLock::new() }
    }

    pub fn docker(image: impl Into<String>) -> Self {
        let mut config = HashMap::new();
        config.insert("image".to_string(), image.into());
        Self::new("docker", config)
    }

    pub fn hash(&self) -> &str {
        self.hash.get_or_init(|| {
            // Sort config entries into tuples *before* hashing so the
            // result does not depend on HashMap iteration order.
            let mut pairs: Vec<(&String, &String)> = self.config.iter().collect();
            pairs.sort_by(|a, b| a.0.cmp(b.0));
            let mut buf = self.executor.clone();
            for (k, v) in pairs {
                buf.push('\0');
                buf.push_str(k);
                buf.push('=');
                buf.push_str(v);
            }
            hash_bytes(buf.as_bytes())
        })
    }
}

#[cfg(test)]
#[path = "execution_tests.rs"]
mod tests;
