// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bucket Walker (C4): bounded-depth, concurrent prefix traversal with
//! first-error-cancels-siblings semantics.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::objectstore::{ObjectStore, ObjectStoreError};

#[derive(Debug, Error)]
pub enum WalkError {
    #[error(transparent)]
    Store(#[from] ObjectStoreError),
    #[error("visit failed: {0}")]
    Visit(String),
    #[error("walker task panicked: {0}")]
    Join(String),
}

type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Called once per object discovered under the walked root.
pub type Visit = Arc<dyn Fn(String) -> BoxFuture<Result<(), WalkError>> + Send + Sync>;

/// Performs a bounded-depth, concurrent traversal of `root`. Depth starts
/// at 1; recursion stops without listing when `d > max_depth` (so
/// `max_depth = 0` returns immediately). Every launched visit and every
/// launched sub-prefix descent belongs to a single error group: the first
/// error cancels siblings and propagates out.
pub async fn walk(store: Arc<dyn ObjectStore>, root: String, max_depth: u32, visit: Visit) -> Result<(), WalkError> {
    let cancel = CancellationToken::new();
    walk_at_depth(store, root, 1, max_depth, visit, cancel).await
}

fn walk_at_depth(
    store: Arc<dyn ObjectStore>,
    prefix: String,
    depth: u32,
    max_depth: u32,
    visit: Visit,
    cancel: CancellationToken,
) -> BoxFuture<Result<(), WalkError>> {
    Box::pin(async move {
        if depth > max_depth {
            return Ok(());
        }
        if cancel.is_cancelled() {
            return Ok(());
        }

        let listing = store.list_level(&prefix).await?;
        let mut tasks: JoinSet<Result<(), WalkError>> = JoinSet::new();

        for key in listing.keys {
            let visit = visit.clone();
            let cancel = cancel.clone();
            tasks.spawn(async move {
                if cancel.is_cancelled() {
                    return Ok(());
                }
                (visit)(key).await
            });
        }

        for sub_prefix in listing.prefixes {
            let store = store.clone();
            let visit = visit.clone();
            let cancel = cancel.clone();
            tasks.spawn(async move {
                if cancel.is_cancelled() {
                    return Ok(());
                }
                walk_at_depth(store, sub_prefix, depth + 1, max_depth, visit, cancel).await
            });
        }

        let mut first_err: Option<WalkError> = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    cancel.cancel();
                    first_err.get_or_insert(e);
                }
                Err(join_err) => {
                    cancel.cancel();
                    first_err.get_or_insert(WalkError::Join(join_err.to_string()));
                }
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    })
}

#[cfg(test)]
#[path = "walker_tests.rs"]
mod tests;
