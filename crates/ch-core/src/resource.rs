// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A `Resource` identifies an object or prefix in an object store by URL.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::hash::Hasher;

/// A URL-identified object or prefix. `hash` is the hex SHA-1 of `url`,
/// computed lazily and cached; equal URLs hash equal.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Resource {
    url: String,
    /// Synthetic resources carry no real content; they pass through a
    /// no-op loader instead of a real download/upload.
    pub phony: bool,
    #[serde(skip, default)]
    hash: OnceLock<String>,
}

impl Resource {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), phony: false, hash: OnceLock::new() }
    }

    pub fn phony(url: impl Into<String>) -> Self {
        Self { url: url.into(), phony: true, hash: OnceLock::new() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Memoised hex SHA-1 of the full URL string.
    pub fn hash(&self) -> &str {
        self.hash.get_or_init(|| self.url.hash())
    }

    /// The URL scheme (`s3`, `phony`, ...), or empty string if unparsable.
    pub fn scheme(&self) -> &str {
        self.url.split_once("://").map(|(s, _)| s).unwrap_or_default()
    }

    /// The URL authority (bucket/host component).
    pub fn host(&self) -> &str {
        let rest = self.url.split_once("://").map(|(_, r)| r).unwrap_or(&self.url);
        rest.split_once('/').map(|(h, _)| h).unwrap_or(rest)
    }

    /// The URL path component, including the leading `/`.
    pub fn path(&self) -> &str {
        let rest = self.url.split_once("://").map(|(_, r)| r).unwrap_or(&self.url);
        match rest.split_once('/') {
            Some((_, path)) => path,
            None => "",
        }
    }

    /// A resource whose path ends in `/` addresses a prefix rather than a
    /// single object.
    pub fn is_prefix(&self) -> bool {
        self.path().ends_with('/')
    }

    /// Builds the resource for an object discovered under a walked prefix:
    /// same scheme/host as `self`, path replaced with `key`.
    pub fn with_key(&self, key: &str) -> Resource {
        Resource::new(format!("{}://{}/{}", self.scheme(), self.host(), key.trim_start_matches('/')))
    }
}

impl PartialEq for Resource {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url
    }
}

impl Eq for Resource {}

#[cfg(test)]
#[path = "resource_tests.rs"]
mod tests;
