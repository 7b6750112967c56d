use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use mimic::domain::{ApiShape, Endpoint, HttpMethod};
use mimic::engine::{extract_json, merge, resolve_endpoint, validate_and_normalize};
use serde_json::{json, Value};
use uuid::Uuid;

fn flat_rows(count: usize) -> Value {
    Value::Array(
        (0..count)
            .map(|i| json!({ "id": i, "name": format!("user {}", i), "email": format!("u{}@example.com", i) }))
            .collect(),
    )
}

fn relational_rows(count: usize) -> Value {
    json!({
        "users": flat_rows(count),
        "posts": (0..count).map(|i| json!({ "id": i, "userId": i % 7, "title": "post" })).collect::<Vec<_>>(),
    })
}

fn endpoints(count: usize) -> Vec<Endpoint> {
    (0..count)
        .map(|i| Endpoint {
            id: Uuid::new_v4(),
            path: format!("/resource{}", i),
            method: if i % 2 == 0 { HttpMethod::Get } else { HttpMethod::Post },
            response: json!({ "index": i }),
            created_at: Utc::now(),
        })
        .collect()
}

fn benchmark_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate_and_normalize");

    for size in [10usize, 100, 1000] {
        let flat = flat_rows(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("flat", size), &flat, |b, raw| {
            b.iter(|| validate_and_normalize(ApiShape::Flat, black_box(raw)));
        });

        let relational = relational_rows(size);
        group.bench_with_input(BenchmarkId::new("relational", size), &relational, |b, raw| {
            b.iter(|| validate_and_normalize(ApiShape::Relational, black_box(raw)));
        });
    }

    group.finish();
}

fn benchmark_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge");

    for size in [100usize, 1000] {
        let existing = validate_and_normalize(ApiShape::Relational, &relational_rows(size)).unwrap();
        let incoming = validate_and_normalize(ApiShape::Relational, &relational_rows(size)).unwrap();

        group.bench_with_input(BenchmarkId::new("append", size), &size, |b, _| {
            b.iter(|| merge(ApiShape::Relational, black_box(&existing), black_box(&incoming), false));
        });
        group.bench_with_input(BenchmarkId::new("overwrite", size), &size, |b, _| {
            b.iter(|| merge(ApiShape::Relational, black_box(&existing), black_box(&incoming), true));
        });
    }

    group.finish();
}

fn benchmark_resolve_endpoint(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_endpoint");

    for count in [10usize, 100] {
        let declared = endpoints(count);
        let last = format!("/resource{}", count - 2);

        group.bench_with_input(BenchmarkId::new("hit_last", count), &declared, |b, declared| {
            b.iter(|| resolve_endpoint(black_box(declared), black_box(&last), "GET"));
        });
        group.bench_with_input(BenchmarkId::new("miss", count), &declared, |b, declared| {
            b.iter(|| resolve_endpoint(black_box(declared), "/missing", "DELETE"));
        });
    }

    group.finish();
}

fn benchmark_extract_json(c: &mut Criterion) {
    let answer = format!(
        "Here is the data you asked for:\n```json\n{}\n```\nLet me know if you need more.",
        flat_rows(50)
    );

    c.bench_function("extract_json_fenced", |b| {
        b.iter(|| extract_json(black_box(&answer)));
    });
}

criterion_group!(
    benches,
    benchmark_validate,
    benchmark_merge,
    benchmark_resolve_endpoint,
    benchmark_extract_json
);
criterion_main!(benches);
