//! Fuzz harness for matrix files
//!
//! Parses arbitrary input as a YAML and a JSON matrix, builds the store when
//! parsing succeeds, and drains every method's invocations.
//! Target: declarative matrix files

#![no_main]

use casematrix_config::{ConfigFormat, parse_matrix};
use casematrix_distributor::InvocationContext;
use casematrix_engine::ScenarioEngine;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let input = match std::str::from_utf8(data) {
        Ok(s) => s,
        Err(_) => return,
    };

    for format in [ConfigFormat::Yaml, ConfigFormat::Json] {
        let Ok(file) = parse_matrix(input, format) else {
            continue;
        };
        let Ok(store) = file.build_store() else {
            continue;
        };

        let store = store.freeze();
        let engine = ScenarioEngine::new(store.clone());
        for method in store.method_ids() {
            let Ok(invocations) = engine.provide_invocations(method.as_str()) else {
                continue;
            };
            for (index, invocation) in invocations.enumerate() {
                let _ = invocation.display_name(index);
                let _ = invocation.parameter_resolvers();
            }
        }
    }
});
