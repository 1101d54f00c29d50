use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use axum::http::HeaderMap;
use mealgate::gate::{decide, AccessGate, RouteTable};
use mealgate::identity::{Role, StaticSessionResolver};

const PATHS: &[&str] = &[
    "/",
    "/meals/8f1c",
    "/api/orders",
    "/dashboard",
    "/cart/",
    "/orders/123/track",
    "/provider/menu/edit",
    "/admin/users",
    "/providerx",
    "/administrator",
];

fn bench_classify(c: &mut Criterion) {
    let table = RouteTable::default();
    let mut group = c.benchmark_group("gate_classify");
    group.throughput(Throughput::Elements(PATHS.len() as u64));
    group.bench_function("classify_and_decide", |b| {
        b.iter(|| {
            for p in PATHS {
                let class = table.classify(p);
                for role in [None, Some(Role::Customer), Some(Role::Provider), Some(Role::Admin)] {
                    criterion::black_box(decide(&table, role, class));
                }
            }
        });
    });
    group.finish();
}

fn bench_check(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().expect("tokio runtime");
    let headers = HeaderMap::new();
    let mut group = c.benchmark_group("gate_check");
    for role in [Role::Customer, Role::Provider, Role::Admin] {
        let gate = AccessGate::with_resolver(StaticSessionResolver::with_role(role));
        group.bench_with_input(BenchmarkId::new("static_resolver", role.as_str()), &gate, |b, gate| {
            b.iter(|| {
                rt.block_on(async {
                    for p in PATHS {
                        criterion::black_box(gate.check(p, &headers).await);
                    }
                })
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_classify, bench_check);
criterion_main!(benches);
