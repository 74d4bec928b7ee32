use casematrix_group::ScenarioGroup;
use casematrix_value::Value;
use proptest::prelude::*;

/// One generated row of a `scenario | n` matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct RowSpec {
    pub label: String,
    pub n: i64,
    pub isolate: bool,
    pub ignore: bool,
}

/// Short lowercase labels; collisions are likely on purpose.
pub fn strategy_label() -> impl Strategy<Value = String> {
    "[a-e]{1,2}"
}

/// Non-null scalar cells.
pub fn strategy_scalar_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        (-1.0e6f64..1.0e6).prop_map(Value::Float),
        "[a-z0-9 ]{0,12}".prop_map(Value::Str),
    ]
}

/// Display-name templates, some containing the label token.
pub fn strategy_template() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z ]{0,10}",
        "[a-z ]{0,6}".prop_map(|prefix| format!("{prefix}#scenario")),
        ("[a-z]{0,4}", "[a-z]{0,4}").prop_map(|(a, b)| format!("{a}#scenario{b}#scenario")),
    ]
}

/// Rows where a row is isolated, ignored, or neither; never both.
pub fn strategy_row_specs(max_rows: usize) -> impl Strategy<Value = Vec<RowSpec>> {
    prop::collection::vec(
        (strategy_label(), any::<i64>(), 0u8..4).prop_map(|(label, n, flag)| RowSpec {
            label,
            n,
            isolate: flag == 1,
            ignore: flag == 2,
        }),
        1..=max_rows.max(1),
    )
}

/// Build a `scenario | n` group from `rows` through the public builder.
pub fn build_group(rows: &[RowSpec]) -> ScenarioGroup {
    let mut group = ScenarioGroup::vars(["scenario", "n"]).expect("two distinct columns");
    for spec in rows {
        group = group
            .with([Value::from(spec.label.as_str()), Value::Int(spec.n)])
            .expect("rows match the column count");
        if spec.isolate {
            group = group.isolate().expect("a row was just added");
        }
        if spec.ignore {
            group = group.ignore().expect("a row was just added");
        }
    }
    group
}
