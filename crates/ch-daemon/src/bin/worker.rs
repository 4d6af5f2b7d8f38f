// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;
use std::sync::Arc;

use ch_adapters::{DockerExecutor, ExecutorRegistry, SqsTaskQueue, TaskQueue};
use ch_core::SystemClock;
use ch_daemon::S3BucketFactory;
use ch_engine::{FsPersister, HookRegistry, NoopHooks, ResourceLoader, S3SchemeLoader, TaskLoader, WorkerConfig, WorkerService};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = match WorkerConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "failed to load configuration");
            std::process::exit(1);
        }
    };

    let aws_cfg = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let sqs_client = aws_sdk_sqs::Client::new(&aws_cfg);
    let clock = Arc::new(SystemClock);
    let dlq = Arc::new(SqsTaskQueue::new(sqs_client.clone(), config.task_dlq_name.clone(), clock.clone()));
    let task_queue: Arc<dyn TaskQueue> =
        Arc::new(SqsTaskQueue::new(sqs_client, config.task_queue_name.clone(), clock).with_dlq(dlq));

    let s3_client = aws_sdk_s3::Client::new(&aws_cfg);
    let stores = S3BucketFactory::new(s3_client);
    let mut scheme_registry: HashMap<String, Arc<dyn ch_engine::SchemeLoader>> = HashMap::new();
    scheme_registry.insert("s3".to_string(), Arc::new(S3SchemeLoader::new(stores)));
    let task_loader = Arc::new(TaskLoader::new(ResourceLoader::new(scheme_registry), config.work_dir.clone()));

    let mut executors = ExecutorRegistry::new();
    let docker = match DockerExecutor::connect_local(config.docker.pull, config.docker.remove, config.docker.user.clone()) {
        Ok(e) => e,
        Err(e) => {
            tracing::error!(error = %e, "failed to connect to docker");
            std::process::exit(1);
        }
    };
    executors.register("docker", Arc::new(docker));

    let mut hooks: HookRegistry = HashMap::new();
    hooks.insert("mov".to_string(), Arc::new(NoopHooks));
    hooks.insert("mp4".to_string(), Arc::new(NoopHooks));
    hooks.insert("nui".to_string(), Arc::new(NoopHooks));

    let persister = Arc::new(FsPersister::new(config.work_dir.clone()));

    let worker = Arc::new(WorkerService::new(task_queue, task_loader, Arc::new(executors), hooks, persister, config.version.clone()));

    let shutdown = ch_daemon::listen_for_shutdown();
    tracing::info!("worker service starting");
    worker.run(shutdown).await;
    tracing::info!("worker service stopped");
}
