//! Benchmarks for Python graph extraction.
//!
//! Run with: `cargo bench`

use std::path::Path;

use codegraph::domain::linker::{CallGraphLinker, CallerCalls, SymbolTable};
use codegraph::infrastructure::PythonExtractor;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

/// A module with `classes` classes of `methods` methods each, every method
/// calling a sibling method and a free function.
fn synthetic_module(classes: usize, methods: usize) -> String {
    let mut src = String::from("from helpers import log\n\n");
    for f in 0..classes {
        src.push_str(&format!("def func_{f}(x):\n    log(x)\n    return x\n\n"));
    }
    for c in 0..classes {
        src.push_str(&format!("class Class{c}(Base):\n"));
        for m in 0..methods {
            let next = (m + 1) % methods;
            src.push_str(&format!(
                "    def method_{m}(self):\n        self.method_{next}()\n        func_{c}({m})\n\n"
            ));
        }
    }
    src
}

fn bench_extract(c: &mut Criterion) {
    let extractor = PythonExtractor::new();
    let mut group = c.benchmark_group("python_extract");

    for &(classes, methods) in &[(5, 5), (20, 10), (100, 20)] {
        let src = synthetic_module(classes, methods);
        group.throughput(Throughput::Bytes(src.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{classes}x{methods}")),
            &src,
            |b, src| {
                b.iter(|| {
                    extractor
                        .extract_source(Path::new("bench.py"), black_box(src))
                        .unwrap()
                })
            },
        );
    }
    group.finish();
}

fn bench_linker(c: &mut Criterion) {
    let mut table = SymbolTable::new();
    let mut callers = Vec::new();
    for i in 0..1_000 {
        table.add_member(format!("Owner{}.run_{i}", i % 10), format!("run_{i}"));
        table.add_function(format!("fn_{i}"));
        callers.push(CallerCalls::new(
            format!("fn_{i}"),
            vec![format!("run_{}", (i + 1) % 1_000), format!("fn_{}", (i + 7) % 1_000), "print".into()],
        ));
    }

    c.bench_function("linker_resolve_1000", |b| {
        b.iter(|| CallGraphLinker::resolve(black_box(&callers), &table))
    });
}

criterion_group!(benches, bench_extract, bench_linker);
criterion_main!(benches);
