use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ferrous_registrar::*;

fn component(i: usize) -> TypeKey {
    TypeKey::named(format!("bench::Component{}", i))
}

/// `n` components each depending on the next, all bound to one abstraction
/// through their own interface.
fn chain_universe(n: usize) -> TypeUniverse {
    let mut universe = TypeUniverse::new();
    universe.insert(TypeDescriptor::abstraction_named(TypeKey::named("bench::Service")));
    for i in 0..n {
        let mut ctor = Constructor::new();
        if i + 1 < n {
            ctor = ctor.parameter(Parameter::new(component(i + 1)));
        }
        universe.insert(TypeDescriptor::implementation_named(component(i)).constructor(ctor));
    }
    universe
}

fn composition(n: usize) -> Composition {
    let mut registrar = Registrar::new(chain_universe(n));
    registrar.register_all((0..n).map(|i| RegistrationIntent::new(component(i), Lifetime::Transient)));
    registrar.build().unwrap()
}

// ===== Registration pass =====

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");
    for n in [10, 100, 1000] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter_batched(
                || {
                    let mut registrar = Registrar::new(chain_universe(n));
                    registrar.register_all((0..n).map(|i| RegistrationIntent::new(component(i), Lifetime::Scoped)));
                    registrar
                },
                |registrar| black_box(registrar.build().unwrap()),
                criterion::BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

// ===== Validation =====

fn bench_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate");
    for n in [10, 100, 1000] {
        let composition = composition(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &composition, |b, composition| {
            b.iter(|| black_box(composition.validate_with(ValidationSeverity::Warning)))
        });
    }
    group.finish();
}

fn bench_dependency_graph(c: &mut Criterion) {
    let composition = composition(1000);
    c.bench_function("dependency_graph_1000", |b| {
        b.iter(|| black_box(composition.dependency_graph().cycles()))
    });
}

// ===== Diagnostics =====

fn bench_report(c: &mut Criterion) {
    let composition = composition(500);
    c.bench_function("report_500", |b| b.iter(|| black_box(composition.registry().report())));
    c.bench_function("csv_500", |b| b.iter(|| black_box(composition.registry().to_csv())));
}

criterion_group!(benches, bench_build, bench_validate, bench_dependency_graph, bench_report);
criterion_main!(benches);
