// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thin HTTP client for the ingest service: issues `indexer ingest` as a
//! POST to a running ingest server. `indexer start`, `tasker start` and
//! `worker start` are served directly by the `ch-ingester`/`ch-tasker`/
//! `ch-worker` binaries instead of being re-implemented here.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "indexer", about = "Chyme S3 indexing client")]
struct Cli {
    /// Base URL of the running ingest server.
    #[arg(long, default_value = "http://localhost:8080")]
    addr: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest an S3 URL (or bucket prefix) into the resource set.
    Ingest {
        url: String,
        /// Recursion depth for prefix URLs.
        #[arg(short = 'r', long = "recursion", default_value_t = 0)]
        recursion_depth: u32,
        /// Filter name applied to every discovered resource.
        #[arg(short = 'f', long, default_value = "")]
        filter: String,
    },
}

#[derive(Serialize)]
struct IngestRequest {
    url: String,
    filter: String,
    #[serde(rename = "recursionDepth")]
    recursion_depth: u32,
}

#[derive(Deserialize)]
struct IngestResponse {
    res: u64,
    #[serde(default)]
    err: String,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Ingest { url, recursion_depth, filter } => {
            let body = IngestRequest { url, filter, recursion_depth };
            let client = reqwest::Client::new();
            let response = client.post(format!("{}/ingest", cli.addr.trim_end_matches('/'))).json(&body).send().await?;
            if !response.status().is_success() {
                bail!("ingest request failed with transport status {}", response.status());
            }
            let parsed: IngestResponse = response.json().await?;
            if !parsed.err.is_empty() {
                bail!("ingest failed: {}", parsed.err);
            }
            println!("ingested {} resource(s)", parsed.res);
            Ok(())
        }
    }
}
