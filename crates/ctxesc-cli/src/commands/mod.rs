pub mod check;
pub mod rewrite;
pub mod run_common;

#[cfg(test)]
mod rewrite_tests;
