//! Benchmarks for type discovery and candidate generation.
//!
//! Run with: cargo bench
//! Run specific benchmark: cargo bench -- generation

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use apexmut::mutation::{GenerationOptions, MutantGenerator};
use apexmut::types::{TypeDiscoverer, TypeRegistry};

/// Generate an Apex class with `methods` methods of varying shape.
fn generate_class(methods: usize) -> String {
    let mut code = String::from("public class BenchSubject {\n    private Integer total = 0;\n\n");
    for m in 0..methods {
        let depth = m % 4;
        code.push_str(&format!(
            "    public Integer method{m}(Integer x, Integer y, String label) {{\n"
        ));
        for d in 0..depth {
            code.push_str(&"    ".repeat(d + 2));
            code.push_str(&format!("if (x > {d} && y != {d}) {{\n"));
        }
        let indent = "    ".repeat(depth + 2);
        code.push_str(&format!("{indent}Integer result = x + y * {m};\n"));
        code.push_str(&format!("{indent}String text = label.trim() + 'n';\n"));
        code.push_str(&format!("{indent}total++;\n"));
        code.push_str(&format!("{indent}return -result;\n"));
        for d in (0..depth).rev() {
            code.push_str(&"    ".repeat(d + 2));
            code.push_str("}\n");
        }
        code.push_str("        return 0;\n    }\n\n");
    }
    code.push_str("}\n");
    code
}

fn discover(source: &str) -> TypeRegistry {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime")
        .block_on(TypeDiscoverer::with_default_matchers(["BenchSubject"]).discover(source))
        .expect("discovery succeeds")
}

/// Benchmark type discovery.
fn bench_discovery(c: &mut Criterion) {
    let mut group = c.benchmark_group("discovery");
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime");

    for size in [10, 50, 200] {
        let source = generate_class(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("methods", size), &source, |b, source| {
            b.iter(|| {
                let registry = runtime
                    .block_on(TypeDiscoverer::with_default_matchers(["BenchSubject"]).discover(source))
                    .unwrap();
                black_box(registry.methods().len())
            });
        });
    }
    group.finish();
}

/// Benchmark candidate generation with every mutator active.
fn bench_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("generation");
    let generator = MutantGenerator::new();

    for size in [10, 50, 200] {
        let source = generate_class(size);
        let types = discover(&source);
        let options = GenerationOptions::covering_all(&source);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("methods", size), &source, |b, source| {
            b.iter(|| black_box(generator.compute(source, &types, &options).unwrap().len()));
        });
    }
    group.finish();
}

/// Benchmark rewriting every candidate of a class.
fn bench_mutate(c: &mut Criterion) {
    let source = generate_class(50);
    let types = discover(&source);
    let generator = MutantGenerator::new();
    let mutations = generator
        .compute(&source, &types, &GenerationOptions::covering_all(&source))
        .unwrap();

    c.bench_function("mutate_all", |b| {
        b.iter(|| {
            for mutation in &mutations {
                black_box(generator.mutate(&source, mutation).unwrap());
            }
        });
    });
}

criterion_group!(benches, bench_discovery, bench_generation, bench_mutate);
criterion_main!(benches);
