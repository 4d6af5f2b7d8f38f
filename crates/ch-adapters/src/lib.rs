// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Adapter implementations for the pipeline's four external dependencies
//! (Redis set store, SQS task queue, S3 object store, Docker executor)
//! plus the bucket walker that rides on top of the object store.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod docker;
pub mod objectstore;
pub mod queue;
pub mod setstore;
pub mod walker;

pub use docker::{DockerExecutor, ExecutionResult, Executor, ExecutorError, ExecutorRegistry, PhonyExecutor};
pub use objectstore::{FakeObjectStore, Listing, ObjectStore, ObjectStoreError, S3ObjectStore, DELETE_BATCH_SIZE};
pub use queue::{
    FakeTaskQueue, QueueError, SqsTaskQueue, TaskQueue, MAX_LONG_POLL_WAIT_SECONDS, MAX_MESSAGES_PER_RECEIVE,
    MAX_VISIBILITY_TIMEOUT_SECONDS,
};
pub use setstore::{FakeResourceSetStore, Inserter, RedisResourceSetStore, ResourceSetStore, SetStoreError};
pub use walker::{walk, WalkError, Visit};
