// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use ch_adapters::{RedisResourceSetStore, SqsTaskQueue, TaskQueue};
use ch_core::SystemClock;
use ch_engine::{TaskTemplater, TaskerConfig, TaskerService};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = match TaskerConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "failed to load configuration");
            std::process::exit(1);
        }
    };

    let set_store = match RedisResourceSetStore::connect(&config.redis.address, config.redis.password.as_deref()).await {
        Ok(s) => Arc::new(s),
        Err(e) => {
            tracing::error!(error = %e, "failed to connect to redis");
            std::process::exit(1);
        }
    };

    let aws_cfg = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let sqs_client = aws_sdk_sqs::Client::new(&aws_cfg);
    let clock = Arc::new(SystemClock);
    let dlq = Arc::new(SqsTaskQueue::new(sqs_client.clone(), config.task_dlq_name.clone(), clock.clone()));
    let task_queue: Arc<dyn TaskQueue> =
        Arc::new(SqsTaskQueue::new(sqs_client, config.task_queue_name.clone(), clock).with_dlq(dlq));

    let templater = TaskTemplater::with_canonical_templates(config.templates.clone(), env!("CARGO_PKG_VERSION"));

    let tasker = TaskerService::new(
        config.resource_set_key.clone(),
        config.task_repository_key.clone(),
        set_store,
        task_queue,
        templater,
        config.task_batch_size,
    );

    let shutdown = ch_daemon::listen_for_shutdown();
    tracing::info!("tasker service starting");
    tasker.run(shutdown).await;
    tracing::info!("tasker service stopped");
}
