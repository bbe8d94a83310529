//! Invariant checks excluded from coverage reports.

#![cfg_attr(coverage_nightly, coverage(off))]

/// Sources are only looked up by ids the same map handed out.
pub(crate) fn ensure_source<T>(entry: Option<T>) -> T {
    match entry {
        Some(entry) => entry,
        None => panic!("invalid SourceId: source map does not contain it"),
    }
}

/// Only a layer pushed for a speculative walk may be folded or discarded.
pub(crate) fn ensure_speculative_layer(depth: usize, op: &str) {
    assert!(
        depth > 1,
        "inference store: {op} without a speculative layer (base layer is permanent)"
    );
}
