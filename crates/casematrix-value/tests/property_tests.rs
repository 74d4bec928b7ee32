//! Property tests for casematrix-value

use casematrix_value::{ParamType, Value, ValueShape};
use proptest::prelude::*;

fn scalar_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        (-1.0e6f64..1.0e6).prop_map(Value::Float),
        "[a-zA-Z0-9 +=_-]{0,20}".prop_map(Value::Str),
    ]
}

fn any_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![Just(Value::Null), scalar_value()];
    leaf.prop_recursive(2, 16, 4, |inner| {
        prop::collection::vec(inner, 0..4).prop_map(Value::List)
    })
}

proptest! {
    /// Every non-null value is accepted by its own runtime type
    #[test]
    fn prop_own_type_accepts(value in any_value()) {
        match value.param_type() {
            Some(ty) => prop_assert!(ty.accepts(&value)),
            None => prop_assert!(value.is_null()),
        }
    }

    /// Scalars never bind positionally
    #[test]
    fn prop_scalars_have_scalar_shape(value in scalar_value()) {
        prop_assert_eq!(value.shape(), ValueShape::Scalar);
    }

    /// A label is the display form for every non-null value
    #[test]
    fn prop_label_matches_display(value in any_value()) {
        match value.label() {
            Some(label) => prop_assert_eq!(label, value.to_string()),
            None => prop_assert!(value.is_null()),
        }
    }

    /// Int and Str never accept each other's values
    #[test]
    fn prop_int_rejects_strings(s in "[0-9]{1,6}") {
        prop_assert!(!ParamType::Int.accepts(&Value::from(s)));
    }
}
