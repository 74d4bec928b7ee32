use casematrix_distributor::InvocationContext;
use casematrix_engine::ScenarioEngine;
use casematrix_group::ScenarioGroup;
use casematrix_store::ScenarioStore;
use casematrix_value::row;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

fn engine_with_rows(rows: usize, isolate_every: Option<usize>) -> ScenarioEngine {
    let mut group = ScenarioGroup::vars(["scenario", "x", "y", "items"]).unwrap();
    for i in 0..rows {
        let label = format!("case-{i}");
        group = group.with(row![label, i as i64, "y", vec![1, 2, 3]]).unwrap();
        if isolate_every.is_some_and(|n| i % n == 0) {
            group = group.isolate().unwrap();
        }
    }
    let mut store = ScenarioStore::new();
    store.register("bench", group);
    ScenarioEngine::new(store.freeze())
}

fn bench_provide_invocations(c: &mut Criterion) {
    let mut group = c.benchmark_group("provide_invocations");
    for rows in [10, 100, 1_000] {
        let all = engine_with_rows(rows, None);
        group.bench_with_input(BenchmarkId::new("all", rows), &all, |b, engine| {
            b.iter(|| {
                for context in engine.provide_invocations("bench").unwrap() {
                    black_box(context.parameter_resolvers());
                }
            })
        });

        let isolated = engine_with_rows(rows, Some(10));
        group.bench_with_input(BenchmarkId::new("isolated", rows), &isolated, |b, engine| {
            b.iter(|| {
                for (i, context) in engine
                    .provide_invocations_with_template("bench", "bench #scenario")
                    .unwrap()
                    .enumerate()
                {
                    black_box(context.display_name(i + 1));
                }
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_provide_invocations);
criterion_main!(benches);
