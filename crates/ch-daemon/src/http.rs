// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ingest HTTP server (C15): `POST /ingest` wraps `IngestService::ingest`,
//! answering `200 OK` with `{res, err}` whether ingest succeeded or
//! failed at the domain level — only transport-level failures produce a
//! non-200 status.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use ch_core::Resource;
use ch_engine::IngestService;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Deserialize)]
struct IngestRequest {
    url: String,
    filter: String,
    #[serde(rename = "recursionDepth")]
    recursion_depth: u32,
}

#[derive(Serialize)]
struct IngestResponse {
    res: u64,
    #[serde(skip_serializing_if = "String::is_empty")]
    err: String,
}

pub fn router(service: Arc<dyn IngestService>) -> Router {
    Router::new().route("/ingest", post(ingest)).with_state(service)
}

async fn ingest(State(service): State<Arc<dyn IngestService>>, Json(req): Json<IngestRequest>) -> Json<IngestResponse> {
    info!(url = %req.url, filter = %req.filter, depth = req.recursion_depth, "ingest request");
    match service.ingest(Resource::new(req.url.as_str()), &req.filter, req.recursion_depth).await {
        Ok(res) => Json(IngestResponse { res, err: String::new() }),
        Err(e) => {
            warn!(error = %e, "ingest failed");
            Json(IngestResponse { res: 0, err: e.to_string() })
        }
    }
}
