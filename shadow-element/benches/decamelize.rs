//! Criterion benchmarks for property name hyphenation and debounced requests.
//!
//! - Hyphenating short and long property names.
//! - Folding a burst of render requests into one pending invocation.

use std::hint::black_box;
use std::sync::Arc;
use std::time::Duration;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use shadow_element::reflect::decamelize;
use shadow_element::schedule::{DebounceConfig, Debouncer, ManualScheduler};

fn bench_decamelize(c: &mut Criterion) {
    let mut group = c.benchmark_group("decamelize");
    for name in ["value", "stringProp", "XMLHttpRequest", "someVeryLongPropertyNameWithManyWords"] {
        group.bench_with_input(BenchmarkId::from_parameter(name), name, |b, name| {
            b.iter(|| decamelize(black_box(name)));
        });
    }
    group.finish();
}

fn bench_debounce_burst(c: &mut Criterion) {
    let mut group = c.benchmark_group("debounce_burst");
    for &n in &[10usize, 100, 1_000] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let scheduler = Arc::new(ManualScheduler::new());
                let debouncer = Debouncer::new(Arc::new(|| Ok(())), DebounceConfig::default(), scheduler.clone());
                for _ in 0..n {
                    let _ = debouncer.run(false);
                }
                scheduler.advance(Duration::from_millis(100))
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_decamelize, bench_debounce_burst);
criterion_main!(benches);
