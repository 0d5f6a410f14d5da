//! Benchmarks for sitestack core operations.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sitestack::core::{defaults, digest, parser, resolver, selector, synth};
use sitestack::core::types::{BuildVariable, BuildVariables};

fn build_vars(count: usize) -> BuildVariables {
    (0..count)
        .map(|i| {
            (
                format!("VITE_VAR_{i}"),
                BuildVariable {
                    value: format!("value-{i}"),
                },
            )
        })
        .collect()
}

fn bench_config_parse(c: &mut Criterion) {
    let yaml = serde_yaml_ng::to_string(&defaults::default_app("bench-site")).unwrap();
    c.bench_function("config_parse_validate", |b| {
        b.iter(|| {
            let config = parser::parse_config(black_box(&yaml)).unwrap();
            black_box(parser::validate_config(&config));
        });
    });
}

fn bench_compose_stack(c: &mut Criterion) {
    let app = defaults::default_app("bench-site");
    let env = selector::select(&app.environments).unwrap().remove(0);

    let mut group = c.benchmark_group("compose_stack");
    for count in [0, 16, 256] {
        let vars = build_vars(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &vars, |b, vars| {
            b.iter(|| black_box(synth::compose_with_variables(&env, black_box(vars)).unwrap()));
        });
    }
    group.finish();
}

fn bench_template_digest(c: &mut Criterion) {
    let app = defaults::default_app("bench-site");
    let env = selector::select(&app.environments).unwrap().remove(0);
    let stack = synth::compose_with_variables(&env, &build_vars(16)).unwrap();

    c.bench_function("template_digest", |b| {
        b.iter(|| black_box(digest::hash_template(black_box(&stack.template)).unwrap()));
    });
}

fn bench_deploy_order(c: &mut Criterion) {
    let app = defaults::default_app("bench-site");
    let env = selector::select(&app.environments).unwrap().remove(0);
    let stack = synth::compose_with_variables(&env, &BuildVariables::new()).unwrap();

    c.bench_function("deploy_order", |b| {
        b.iter(|| {
            black_box(
                resolver::build_deploy_order(&stack.stack_name, black_box(&stack.template.resources))
                    .unwrap(),
            )
        });
    });
}

criterion_group!(
    benches,
    bench_config_parse,
    bench_compose_stack,
    bench_template_digest,
    bench_deploy_order
);
criterion_main!(benches);
