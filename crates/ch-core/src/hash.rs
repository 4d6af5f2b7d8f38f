// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SHA-1 hashing primitives shared by every entity with a derived, memoised
//! hash (`Resource`, `Task`, `ExecutionStrategy`).

use sha1::{Digest, Sha1};

/// Anything that can produce a stable hex-encoded SHA-1 digest of itself.
pub trait Hasher {
    fn hash(&self) -> String;
}

impl Hasher for str {
    fn hash(&self) -> String {
        hash_bytes(self.as_bytes())
    }
}

impl Hasher for String {
    fn hash(&self) -> String {
        hash_bytes(self.as_bytes())
    }
}

pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Hashes a set of hex digests to the same result irrespective of input
/// order: sort, concatenate, hash. Used to make `Task::hash` and
/// `ExecutionStrategy::hash` order-independent.
pub fn collate<I, S>(hashes: I) -> String
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut sorted: Vec<String> = hashes.into_iter().map(Into::into).collect();
    sorted.sort();
    hash_bytes(sorted.concat().as_bytes())
}
