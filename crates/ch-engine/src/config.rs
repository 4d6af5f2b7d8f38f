// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Config loaders (C16): one env-var-driven `Config` struct per binary,
//! loaded once at process start and threaded by value into adapter and
//! service constructors. No global mutable config.

use thiserror::Error;

use crate::templater::TemplateConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("environment variable {name} has an invalid value {value:?}: {reason}")]
    Invalid { name: &'static str, value: String, reason: String },
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn parse_u64(name: &'static str, value: String) -> Result<u64, ConfigError> {
    value.parse().map_err(|e: std::num::ParseIntError| ConfigError::Invalid { name, value, reason: e.to_string() })
}

/// Parses a boolean env value with a documented default when unset or
/// empty. Recognises `true`/`false` case-insensitively, matching the
/// original's `strconv.ParseBool`-shaped knobs.
fn parse_bool_option(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(v) if !v.is_empty() => v.eq_ignore_ascii_case("true") || v == "1",
        _ => default,
    }
}

/// Shared Redis connection settings backing the resource-set store.
#[derive(Clone, Debug)]
pub struct RedisConfig {
    pub address: String,
    pub password: Option<String>,
}

impl RedisConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self { address: require("CH_REDIS_ADDR")?, password: optional("CH_REDIS_PASSWORD") })
    }
}

/// Opaque secret-broker settings, threaded through unread by the core —
/// only adapters that need a vault-issued credential consult these.
#[derive(Clone, Debug)]
pub struct VaultConfig {
    pub address: Option<String>,
    pub static_token: Option<String>,
    pub sts_secret: Option<String>,
}

impl VaultConfig {
    fn from_env() -> Self {
        Self {
            address: optional("CH_VAULT_ADDR"),
            static_token: optional("CH_VAULT_STATIC_TKN"),
            sts_secret: optional("CH_VAULT_STS_SECRET"),
        }
    }
}

/// Config for the `ch-ingester` binary (C6/C15).
#[derive(Clone, Debug)]
pub struct IngestConfig {
    pub listen_addr: String,
    pub redis: RedisConfig,
    pub resource_set_key: String,
    pub vault: VaultConfig,
}

impl IngestConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            listen_addr: require("CH_INGEST_PORT")?,
            redis: RedisConfig::from_env()?,
            resource_set_key: require("CH_RESOURCE_SET")?,
            vault: VaultConfig::from_env(),
        })
    }
}

/// Config for the `ch-tasker` binary (C7/C8).
#[derive(Clone, Debug)]
pub struct TaskerConfig {
    pub redis: RedisConfig,
    pub resource_set_key: String,
    pub task_repository_key: String,
    pub task_queue_name: String,
    pub task_dlq_name: String,
    pub task_batch_size: u64,
    pub templates: TemplateConfig,
    pub vault: VaultConfig,
}

impl TaskerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            redis: RedisConfig::from_env()?,
            resource_set_key: require("CH_RESOURCE_SET")?,
            task_repository_key: require("CH_TASK_SET")?,
            task_queue_name: require("CH_TASK_QUEUE")?,
            task_dlq_name: require("CH_TASK_DLQ")?,
            task_batch_size: parse_u64("CH_TASK_BATCH_SIZE", require("CH_TASK_BATCH_SIZE")?)?,
            templates: TemplateConfig::from_env(),
            vault: VaultConfig::from_env(),
        })
    }
}

/// Docker executor options (`CH_WORKER_DOCKER_*`).
#[derive(Clone, Debug)]
pub struct DockerConfig {
    pub user: Option<String>,
    pub pull: bool,
    pub remove: bool,
}

impl DockerConfig {
    fn from_env() -> Self {
        Self {
            user: optional("CH_WORKER_DOCKER_USER"),
            pull: parse_bool_option("CH_WORKER_DOCKER_PULL", false),
            remove: parse_bool_option("CH_WORKER_DOCKER_REMOVE", true),
        }
    }
}

/// Config for the `ch-worker` binary (C9-C14).
#[derive(Clone, Debug)]
pub struct WorkerConfig {
    pub work_dir: String,
    pub docker: DockerConfig,
    pub task_queue_name: String,
    pub task_dlq_name: String,
    pub version: String,
    pub vault: VaultConfig,
}

impl WorkerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            work_dir: format!("{}/chyme", require("CH_WORKER_WORKDIR")?.trim_end_matches('/')),
            docker: DockerConfig::from_env(),
            task_queue_name: require("CH_TASK_QUEUE")?,
            task_dlq_name: require("CH_TASK_DLQ")?,
            version: env!("CARGO_PKG_VERSION").to_string(),
            vault: VaultConfig::from_env(),
        })
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
