// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn identity_admits_everything() {
    let registry = FilterRegistry::default();
    let filter = registry.new_filter("identity").expect("identity is registered");
    let r = Resource::new("s3://b/x.jpg");
    assert!(filter(&r).is_some());
}

#[test]
fn ext_filter_matches_case_insensitively() {
    let registry = FilterRegistry::default();
    let filter = registry.new_filter("ext/pdf").expect("ext is registered");
    assert!(filter(&Resource::new("s3://b/x.PDF")).is_some());
    assert!(filter(&Resource::new("s3://b/x.pdf")).is_some());
    assert!(filter(&Resource::new("s3://b/x.jpg")).is_none());
}

#[test]
fn unknown_filter_errors() {
    let registry = FilterRegistry::default();
    let err = registry.new_filter("nope/x").unwrap_err();
    assert!(matches!(err, FilterError::Unknown(name) if name == "nope"));
}
