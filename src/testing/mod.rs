//! Property-testing support: record strategies and run invariants.

pub mod generators;
pub mod law;

pub use generators::{RecordInput, outcome_kind, package_name, record_input, record_stream, seal_records};
pub use law::{
    assert_identical_rerun_unchanged, assert_rollup_consistent, assert_score_counts_lines,
    assert_traversal_stable, assert_worst_outcome_wins, traversal_order,
};
