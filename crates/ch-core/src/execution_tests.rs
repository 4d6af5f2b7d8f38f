// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use proptest::prelude::*;
use std::collections::HashMap;

fn strategy(pairs: &[(&str, &str)]) -> ExecutionStrategy {
    let config = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    ExecutionStrategy::new("docker", config)
}

#[test]
fn hash_is_order_independent() {
    let a = strategy(&[("image", "x:1"), ("env", "A=1\nB=2"), ("user", "1000")]);
    let b = strategy(&[("user", "1000"), ("image", "x:1"), ("env", "A=1\nB=2")]);
    assert_eq!(a.hash(), b.hash());
}

#[test]
fn hash_differs_on_different_config() {
    let a = strategy(&[("image", "x:1")]);
    let b = strategy(&[("image", "x:2")]);
    assert_ne!(a.hash(), b.hash());
}

#[test]
fn hash_differs_on_different_executor() {
    let mut cfg = std::collections::HashMap::new();
    cfg.insert("image".to_string(), "x:1".to_string());
    let a = ExecutionStrategy::new("docker", cfg.clone());
    let b = ExecutionStrategy::new("phony", cfg);
    assert_ne!(a.hash(), b.hash());
}

proptest! {
    #[test]
    fn hash_is_order_independent_for_arbitrary_configs(
        entries in prop::collection::vec(("[a-z]{1,8}", "[a-zA-Z0-9:._/=]{0,16}"), 0..8)
    ) {
        let forward: HashMap<String, String> = entries.iter().cloned().collect();
        let reversed: HashMap<String, String> = entries.into_iter().rev().collect();
        let a = ExecutionStrategy::new("docker", forward);
        let b = ExecutionStrategy::new("docker", reversed);
        prop_assert_eq!(a.hash(), b.hash());
    }
}
