//! Small helpers for building fixtures in tests.
//!
//! Keeping these in a microcrate avoids copy-paste across engine, sim and
//! CLI tests.

use casematrix_group::ScenarioGroup;
use casematrix_store::{ScenarioStore, SharedStore};
use casematrix_value::{Value, row};

pub mod mocks;
pub mod proptest;

pub use mocks::RecordingMocks;

/// `scenario | a | b | sum` with three labelled rows, none isolated.
pub fn sum_matrix() -> ScenarioGroup {
    ScenarioGroup::vars(["scenario", "a", "b", "sum"])
        .and_then(|g| g.with(row!["one plus one", 1, 1, 2]))
        .and_then(|g| g.with(row!["two plus three", 2, 3, 5]))
        .and_then(|g| g.with(row!["negative", -4, 1, -3]))
        .expect("sum fixture is well formed")
}

/// Four rows where `second` and `fourth` are isolated.
pub fn isolated_matrix() -> ScenarioGroup {
    ScenarioGroup::vars(["scenario", "n"])
        .and_then(|g| g.with(row!["first", 1]))
        .and_then(|g| g.with(row!["second", 2]))
        .and_then(ScenarioGroup::isolate)
        .and_then(|g| g.with(row!["third", 3]))
        .and_then(|g| g.with(row!["fourth", 4]))
        .and_then(ScenarioGroup::isolate)
        .expect("isolated fixture is well formed")
}

/// Rows with a null label column; labels fall back to row numbers.
pub fn unlabelled_matrix() -> ScenarioGroup {
    ScenarioGroup::vars(["scenario", "word"])
        .and_then(|g| g.with(row![Value::Null, "alpha"]))
        .and_then(|g| g.with(row![Value::Null, "beta"]))
        .expect("unlabelled fixture is well formed")
}

/// Frozen store with `sum`, `isolated` and `unlabelled` registered.
pub fn fixture_store() -> SharedStore {
    let mut store = ScenarioStore::new();
    store
        .register("sum", sum_matrix())
        .register("isolated", isolated_matrix())
        .register("unlabelled", unlabelled_matrix());
    store.freeze()
}

/// YAML matrix file equivalent to [`sum_matrix`] registered under `sum`.
pub const SUM_MATRIX_YAML: &str = r#"methods:
  - method: sum
    template: "adds #scenario"
    columns: [scenario, a, b, sum]
    rows:
      - ["one plus one", 1, 1, 2]
      - ["two plus three", 2, 3, 5]
      - values: ["negative", -4, 1, -3]
        isolate: true
"#;
