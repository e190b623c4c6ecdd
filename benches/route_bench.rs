use std::hint::black_box;

use axum::http::Method;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use infodot::router::{CompiledPattern, RouteDef, RouteTable};
use infodot::sanitize;
use infodot::token::{Claims, TokenCodec};

fn table(extra_routes: usize) -> RouteTable<usize> {
    let mut defs = vec![
        RouteDef { method: Method::GET, template: "/api/articles", handler: 0 },
        RouteDef { method: Method::GET, template: "/api/articles/id/{id}", handler: 1 },
        RouteDef { method: Method::GET, template: "/api/articles/{slug}", handler: 2 },
        RouteDef { method: Method::POST, template: "/api/articles/{id}/image", handler: 3 },
    ];
    // Filler routes ahead of the real ones, so lookups have to walk past them
    let filler: Vec<&'static str> = (0..extra_routes)
        .map(|i| -> &'static str { Box::leak(format!("/api/filler{}/{{id}}", i).into_boxed_str()) })
        .collect();
    for (i, template) in filler.into_iter().enumerate() {
        defs.insert(0, RouteDef { method: Method::GET, template, handler: 100 + i });
    }
    RouteTable::build(defs).unwrap()
}

fn bench_route_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("route_lookup");

    for extra in [0usize, 20, 100] {
        let table = table(extra);
        group.bench_with_input(BenchmarkId::new("slug", extra), &table, |b, t| {
            b.iter(|| t.find(&Method::GET, black_box("/api/articles/hello-world-1234")))
        });
        group.bench_with_input(BenchmarkId::new("miss", extra), &table, |b, t| {
            b.iter(|| t.find(&Method::GET, black_box("/api/unknown/a/b/c")))
        });
    }
    group.finish();
}

fn bench_compile(c: &mut Criterion) {
    c.bench_function("compile_pattern", |b| {
        b.iter(|| CompiledPattern::compile(black_box("/api/users/{user}/articles/{id}/image")).unwrap())
    });
}

fn bench_tokens(c: &mut Criterion) {
    let codec = TokenCodec::new("bench-secret", std::time::Duration::from_secs(3600));
    let mut claims = Claims::new();
    claims.insert("id".into(), 42.into());
    claims.insert("email".into(), "bench@example.com".into());
    let token = codec.issue(claims.clone());

    c.bench_function("token_issue", |b| b.iter(|| codec.issue(black_box(claims.clone()))));
    c.bench_function("token_verify", |b| b.iter(|| codec.verify(black_box(&token)).unwrap()));
    c.bench_function("slugify", |b| b.iter(|| sanitize::slugify(black_box("Rust 2024: What's New in Async?"))));
}

criterion_group!(benches, bench_route_lookup, bench_compile, bench_tokens);
criterion_main!(benches);
