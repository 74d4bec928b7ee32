//! Property tests for casematrix-resolver

use casematrix_resolver::{ParameterResolver, ParameterSlot, ValueResolver, resolve_arguments};
use casematrix_value::{ParamType, Value};
use proptest::prelude::*;

fn declared() -> impl Strategy<Value = ParamType> {
    prop_oneof![
        Just(ParamType::Bool),
        Just(ParamType::Int),
        Just(ParamType::Float),
        Just(ParamType::Str),
        Just(ParamType::List),
        Just(ParamType::Map),
    ]
}

proptest! {
    /// Resolution is deterministic for (index, value, declared type)
    #[test]
    fn prop_resolution_is_deterministic(index in 0usize..8, n in any::<i64>(), ty in declared()) {
        let resolver = ValueResolver::for_value(index, Value::from(n));
        let slot = ParameterSlot::new(index, ty);
        prop_assert_eq!(resolver.supports(&slot), resolver.supports(&slot));
        prop_assert_eq!(resolver.resolve(&slot), resolver.resolve(&slot));
    }

    /// A typed resolver never supports a slot at another index
    #[test]
    fn prop_index_must_match(index in 0usize..8, other in 0usize..8, n in any::<i64>()) {
        prop_assume!(index != other);
        let resolver = ValueResolver::for_value(index, Value::from(n));
        prop_assert!(!resolver.supports(&ParameterSlot::new(other, ParamType::Int)));
    }

    /// Integer rows always bind to an all-Int signature of the same length
    #[test]
    fn prop_int_rows_bind(values in prop::collection::vec(any::<i64>(), 0..6)) {
        let resolvers: Vec<ValueResolver> = values
            .iter()
            .enumerate()
            .map(|(i, n)| ValueResolver::for_value(i, Value::from(*n)))
            .collect();
        let signature = vec![ParamType::Int; values.len()];
        let args = resolve_arguments(&resolvers, &signature).unwrap();
        for (i, n) in values.iter().enumerate() {
            prop_assert_eq!(args.int(i).unwrap(), *n);
        }
    }

    /// A string never binds to an Int parameter
    #[test]
    fn prop_string_rejected_for_int(s in "[0-9]{1,5}") {
        let resolvers = vec![ValueResolver::for_value(0, Value::from(s))];
        let err = resolve_arguments(&resolvers, &[ParamType::Int]).unwrap_err();
        prop_assert!(err.is_resolution_error());
    }
}
