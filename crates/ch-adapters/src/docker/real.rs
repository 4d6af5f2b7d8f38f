// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;

use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, KillContainerOptions, ListContainersOptions, RemoveContainerOptions, StartContainerOptions,
    WaitContainerOptions,
};
use bollard::image::CreateImageOptions;
use bollard::service::HostConfig;
use bollard::Docker;
use ch_core::Task;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use super::{ExecutionResult, Executor, ExecutorError};

/// Docker-backed executor: containers looked up, started and reaped by
/// name through the `bollard` async client.
pub struct DockerExecutor {
    docker: Docker,
    should_pull: bool,
    should_remove: bool,
    user: Option<String>,
}

impl DockerExecutor {
    pub fn connect_local(should_pull: bool, should_remove: bool, user: Option<String>) -> Result<Self, ExecutorError> {
        let docker = Docker::connect_with_local_defaults().map_err(|e| ExecutorError::Runtime(e.to_string()))?;
        Ok(Self { docker, should_pull, should_remove, user })
    }

    async fn find_existing(&self, name: &str) -> Result<Option<String>, ExecutorError> {
        let mut filters = HashMap::new();
        filters.insert("name".to_string(), vec![name.to_string()]);
        let containers = self
            .docker
            .list_containers(Some(ListContainersOptions { all: true, filters, ..Default::default() }))
            .await
            .map_err(|e| ExecutorError::Runtime(e.to_string()))?;

        for c in containers {
            let matches = c.names.unwrap_or_default().iter().any(|n| n.trim_start_matches('/') == name);
            if matches {
                return Ok(c.id);
            }
        }
        Ok(None)
    }

    async fn create_and_start(&self, task: &Task, image: &str, name: &str) -> Result<String, ExecutorError> {
        if self.should_pull {
            let mut stream =
                self.docker.create_image(Some(CreateImageOptions { from_image: image, ..Default::default() }), None, None);
            while let Some(item) = stream.next().await {
                item.map_err(|e| ExecutorError::Runtime(e.to_string()))?;
            }
        }

        let workspace = task.workspace.as_ref().ok_or_else(|| ExecutorError::Runtime("task has no workspace".to_string()))?;
        let env: Vec<String> = task
            .execution
            .config
            .get("env")
            .map(|e| e.split('\n').filter(|s| !s.is_empty()).map(str::to_string).collect())
            .unwrap_or_default();

        let binds = vec![
            format!("{}:/in", workspace.input_dir.display()),
            format!("{}:/out", workspace.output_dir.display()),
        ];

        let config = Config {
            image: Some(image.to_string()),
            user: self.user.clone(),
            tty: Some(true),
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            env: Some(env),
            host_config: Some(HostConfig { binds: Some(binds), ..Default::default() }),
            ..Default::default()
        };

        let created = self
            .docker
            .create_container(Some(CreateContainerOptions { name: name.to_string(), platform: None }), config)
            .await
            .map_err(|e| ExecutorError::Runtime(e.to_string()))?;

        self.docker
            .start_container(&created.id, None::<StartContainerOptions<String>>)
            .await
            .map_err(|e| ExecutorError::Runtime(e.to_string()))?;

        Ok(created.id)
    }
}

#[async_trait]
impl Executor for DockerExecutor {
    async fn execute(&self, task: &Task, cancel: CancellationToken) -> Result<ExecutionResult, ExecutorError> {
        if task.execution.executor != "docker" {
            return Err(ExecutorError::NotDocker(task.execution.executor.clone()));
        }
        let image = task.execution.config.get("image").filter(|i| !i.is_empty()).ok_or(ExecutorError::MissingImage)?;
        let name = task.hash().to_string();

        let container_id = match self.find_existing(&name).await? {
            Some(id) => id,
            None => self.create_and_start(task, image, &name).await?,
        };

        let timeout = task.timeout;
        let mut wait_stream = self.docker.wait_container(&container_id, None::<WaitContainerOptions<String>>);

        let result = if timeout.is_zero() {
            tokio::select! {
                _ = cancel.cancelled() => Err(ExecutorError::Cancelled),
                next = wait_stream.next() => wait_result(next),
            }
        } else {
            tokio::select! {
                _ = tokio::time::sleep(timeout) => {
                    let _ = self
                        .docker
                        .kill_container(&container_id, Some(KillContainerOptions { signal: "SIGKILL" }))
                        .await;
                    Err(ExecutorError::Timeout)
                }
                _ = cancel.cancelled() => Err(ExecutorError::Cancelled),
                next = wait_stream.next() => wait_result(next),
            }
        };

        result.map(|()| ExecutionResult {
            output_path: task.workspace.as_ref().map(|w| w.output_dir.clone()).unwrap_or_default(),
            metadata_paths: HashMap::new(),
        })
    }

    async fn clean(&self, task: &Task) -> Result<(), ExecutorError> {
        if !self.should_remove {
            return Ok(());
        }
        let name = task.hash();
        let _ = self
            .docker
            .remove_container(name, Some(RemoveContainerOptions { force: true, ..Default::default() }))
            .await;
        Ok(())
    }
}

fn wait_result(next: Option<Result<bollard::models::ContainerWaitResponse, bollard::errors::Error>>) -> Result<(), ExecutorError> {
    match next {
        Some(Ok(status)) if status.status_code == 0 => Ok(()),
        Some(Ok(status)) => Err(ExecutorError::NonZeroExit(status.status_code)),
        Some(Err(e)) => Err(ExecutorError::Runtime(e.to_string())),
        None => Err(ExecutorError::Runtime("container wait stream ended without a result".to_string())),
    }
}
