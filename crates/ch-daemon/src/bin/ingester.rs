// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use ch_adapters::RedisResourceSetStore;
use ch_daemon::S3BucketFactory;
use ch_engine::{IngestConfig, IngestService, Ingester};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = match IngestConfig::from_env() {
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
    let s3_client = aws_sdk_s3::Client::new(&aws_cfg);
    let stores = Arc::new(S3BucketFactory::new(s3_client));

    let ingester: Arc<dyn IngestService> = Arc::new(Ingester::new(set_store, config.resource_set_key.clone(), Default::default(), stores));

    let app = ch_daemon::http::router(ingester);
    let listener = match tokio::net::TcpListener::bind(&config.listen_addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(error = %e, addr = %config.listen_addr, "failed to bind ingest listener");
            std::process::exit(1);
        }
    };

    let shutdown = ch_daemon::listen_for_shutdown();
    tracing::info!(addr = %config.listen_addr, "ingest server listening");
    let result = axum::serve(listener, app).with_graceful_shutdown(async move { shutdown.cancelled().await }).await;
    if let Err(e) = result {
        tracing::error!(error = %e, "ingest server exited with an error");
        std::process::exit(1);
    }
}
