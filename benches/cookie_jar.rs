//! Cookie jar benchmarks.
//!
//! Every call merges handshake cookies and builds a `Cookie` header, so
//! both sit on the hot path of each request.
//!
//! Run with: cargo bench --bench cookie_jar
//! Results saved to: target/criterion/

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use yolobox_control::transport::cookies::parse_set_cookies;
use yolobox_control::{Cookie, CookieJar};

// ============================================================================
// Benchmark Parameters
// ============================================================================

const JAR_SIZES: &[usize] = &[1, 8, 32];

fn filled_jar(size: usize) -> CookieJar {
    let mut jar = CookieJar::new();
    jar.merge((0..size).map(|i| Cookie::new(format!("c{i}"), format!("v{i}"))));
    jar
}

// ============================================================================
// Benchmarks
// ============================================================================

fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("cookie_merge");

    for &size in JAR_SIZES {
        let update: Vec<Cookie> = (0..size)
            .step_by(2)
            .map(|i| Cookie::new(format!("c{i}"), "fresh"))
            .collect();

        group.bench_with_input(BenchmarkId::new("overwrite_half", size), &size, |b, &size| {
            b.iter_batched(
                || (filled_jar(size), update.clone()),
                |(mut jar, update)| {
                    jar.merge(update);
                    black_box(jar)
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn bench_header(c: &mut Criterion) {
    let mut group = c.benchmark_group("cookie_header");

    for &size in JAR_SIZES {
        let jar = filled_jar(size);
        group.bench_with_input(BenchmarkId::new("build", size), &jar, |b, jar| {
            b.iter(|| black_box(jar.header()));
        });
    }

    group.finish();
}

fn bench_parse(c: &mut Criterion) {
    let headers = [
        "sid=abc123; Path=/; HttpOnly",
        "lang=en; Max-Age=3600",
        "token=eyJhbGciOi==; Secure",
    ];

    c.bench_function("parse_set_cookie", |b| {
        b.iter(|| black_box(parse_set_cookies(headers.iter().copied())));
    });
}

criterion_group!(benches, bench_merge, bench_header, bench_parse);
criterion_main!(benches);
