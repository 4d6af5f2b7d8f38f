// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filter Registry (C5): compile-once predicate factories keyed by name.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::resource::Resource;

/// A pure total function from resource to resource-or-absent.
pub type Filter = Arc<dyn Fn(&Resource) -> Option<Resource> + Send + Sync>;

type Factory = Box<dyn Fn(&[&str]) -> Result<Filter, FilterError> + Send + Sync>;

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("unknown filter {0}")]
    Unknown(String),
    #[error("filter {name} rejected args {args:?}")]
    BadArgs { name: String, args: Vec<String> },
}

/// `{name -> (description, factory)}`. `new_filter("ext/pdf")` splits on
/// `/`, looks up `"ext"`, invokes the factory with `["pdf"]`.
pub struct FilterRegistry {
    factories: HashMap<&'static str, Factory>,
}

impl Default for FilterRegistry {
    fn default() -> Self {
        let mut registry = Self { factories: HashMap::new() };
        registry.register("identity", |_args| Ok(Arc::new(|r: &Resource| Some(r.clone()))));
        registry.register("ext", |args| {
            let ext = args
                .first()
                .ok_or_else(|| FilterError::BadArgs { name: "ext".into(), args: args.iter().map(|s| s.to_string()).collect() })?
                .to_lowercase();
            let suffix = format!(".{ext}");
            Ok(Arc::new(move |r: &Resource| {
                if r.url().to_lowercase().ends_with(&suffix) {
                    Some(r.clone())
                } else {
                    None
                }
            }))
        });
        registry
    }
}

impl FilterRegistry {
    pub fn register(
        &mut self,
        name: &'static str,
        factory: impl Fn(&[&str]) -> Result<Filter, FilterError> + Send + Sync + 'static,
    ) {
        self.factories.insert(name, Box::new(factory));
    }

    /// Builds a `Filter` from a spec like `"ext/pdf"` or `"identity"`.
    pub fn new_filter(&self, spec: &str) -> Result<Filter, FilterError> {
        let mut parts = spec.split('/');
        let name = parts.next().unwrap_or_default();
        let args: Vec<&str> = parts.collect();
        let factory = self.factories.get(name).ok_or_else(|| FilterError::Unknown(name.to_string()))?;
        factory(&args)
    }
}

#[cfg(test)]
#[path = "filter_tests.rs"]
mod tests;
