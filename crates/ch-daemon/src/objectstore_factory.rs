// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use aws_sdk_s3::Client;
use ch_adapters::{ObjectStore, S3ObjectStore};
use ch_engine::ObjectStoreFactory;

/// Builds a `S3ObjectStore` per bucket from a shared S3 client, since the
/// client itself is cheap to clone (an `Arc` handle internally).
pub struct S3BucketFactory {
    client: Client,
}

impl S3BucketFactory {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl ObjectStoreFactory for S3BucketFactory {
    fn for_bucket(&self, bucket: &str) -> Arc<dyn ObjectStore> {
        Arc::new(S3ObjectStore::new(self.client.clone(), bucket.to_string()))
    }
}
