//! Invariant checks excluded from coverage reports.

#![cfg_attr(coverage_nightly, coverage(off))]

use crate::context::Context;

/// A transition that consumes nothing must at least change the state, or
/// the machine would spin on the same text forever.
pub(crate) fn ensure_progress(prior: Context, next: Context, consumed: usize, text: &str) {
    if consumed == 0 && prior.state() == next.state() {
        panic!("raw text: no progress at `{text}` in {prior} (transition table is cyclic)");
    }
}
