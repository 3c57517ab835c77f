//! Benchmarks for the registry backends
//!
//! `workload` is the mixed register/resolve loop: 8 service types registered
//! as instances then overwritten by factories, followed by 19 resolutions.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use service_registry::{DynamicRegistry, Registry, ServiceLocator, SyncRegistry};
use std::hint::black_box;
use std::sync::Arc;

const NUMBER: i32 = 30;

trait MathService: Send + Sync {
    fn get_int(&self) -> i32;
}

struct MathImpl;

impl MathService for MathImpl {
    fn get_int(&self) -> i32 {
        NUMBER
    }
}

fn workload<L: ServiceLocator>(locator: &mut L) -> i32 {
    locator.register_instance(Arc::new(NUMBER));
    locator.register_instance(Arc::new(NUMBER as f32));
    locator.register_instance(Arc::new(NUMBER as f64));
    locator.register_instance(Arc::new(NUMBER as i8));
    locator.register_instance(Arc::new(NUMBER as u8));
    locator.register_instance(Arc::new(NUMBER as u32));
    locator.register_instance(Arc::new(NUMBER as u64));
    locator.register_instance::<dyn MathService>(Arc::new(MathImpl));

    locator.register_factory(|| Arc::new(NUMBER));
    locator.register_factory(|| Arc::new(NUMBER as f32));
    locator.register_factory(|| Arc::new(NUMBER as f64));
    locator.register_factory(|| Arc::new(NUMBER as i8));
    locator.register_factory(|| Arc::new(NUMBER as u8));
    locator.register_factory(|| Arc::new(NUMBER as u32));
    locator.register_factory(|| Arc::new(NUMBER as u64));
    locator.register_factory::<dyn MathService, _>(|| Arc::new(MathImpl));

    let mut result = 0;
    for _ in 0..2 {
        result += (*locator.resolve::<i32>().unwrap() == NUMBER) as i32;
        result += (*locator.resolve::<f32>().unwrap() == NUMBER as f32) as i32;
        result += (*locator.resolve::<f64>().unwrap() == NUMBER as f64) as i32;
        result += (*locator.resolve::<i8>().unwrap() == NUMBER as i8) as i32;
        result += (*locator.resolve::<u8>().unwrap() == NUMBER as u8) as i32;
        result += (*locator.resolve::<u32>().unwrap() == NUMBER as u32) as i32;
        result += (*locator.resolve::<u64>().unwrap() == NUMBER as u64) as i32;
    }
    for _ in 0..5 {
        result += (locator.resolve::<dyn MathService>().unwrap().get_int() == NUMBER) as i32;
    }
    result
}

fn bench_workload(c: &mut Criterion) {
    let mut group = c.benchmark_group("workload");
    group.throughput(Throughput::Elements(19));

    group.bench_function("double_dispatch_local", |b| {
        let mut locator = Registry::new();
        b.iter(|| black_box(workload(&mut locator)))
    });

    group.bench_function("double_dispatch_sync", |b| {
        let mut locator = SyncRegistry::default();
        b.iter(|| black_box(workload(&mut locator)))
    });

    group.bench_function("single_dispatch", |b| {
        let mut locator = DynamicRegistry::new();
        b.iter(|| black_box(workload(&mut locator)))
    });

    group.finish();
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");

    let local = Registry::new();
    local.register_instance(Arc::new(NUMBER));
    local.register_instance::<dyn MathService>(Arc::new(MathImpl));
    local.register_factory(|| Arc::new(NUMBER as u64));

    let sync = SyncRegistry::default();
    sync.register_instance(Arc::new(NUMBER));
    sync.register_instance::<dyn MathService>(Arc::new(MathImpl));
    sync.register_factory(|| Arc::new(NUMBER as u64));

    let mut dynamic = DynamicRegistry::new();
    dynamic.register_instance(Arc::new(NUMBER));
    dynamic.register_factory(|| Arc::new(NUMBER as u64));

    group.bench_function(BenchmarkId::new("instance", "local"), |b| {
        b.iter(|| black_box(local.resolve::<i32>()))
    });
    group.bench_function(BenchmarkId::new("instance", "sync"), |b| {
        b.iter(|| black_box(sync.resolve::<i32>()))
    });
    group.bench_function(BenchmarkId::new("instance", "dynamic"), |b| {
        b.iter(|| black_box(dynamic.resolve::<i32>()))
    });

    group.bench_function(BenchmarkId::new("trait_object", "local"), |b| {
        b.iter(|| black_box(local.resolve::<dyn MathService>()))
    });
    group.bench_function(BenchmarkId::new("trait_object", "sync"), |b| {
        b.iter(|| black_box(sync.resolve::<dyn MathService>()))
    });

    group.bench_function(BenchmarkId::new("factory", "local"), |b| {
        b.iter(|| black_box(local.resolve::<u64>()))
    });
    group.bench_function(BenchmarkId::new("factory", "sync"), |b| {
        b.iter(|| black_box(sync.resolve::<u64>()))
    });
    group.bench_function(BenchmarkId::new("factory", "dynamic"), |b| {
        b.iter(|| black_box(dynamic.resolve::<u64>()))
    });

    group.bench_function(BenchmarkId::new("missing", "local"), |b| {
        b.iter(|| black_box(local.resolve::<String>()))
    });

    group.finish();
}

fn bench_registration(c: &mut Criterion) {
    let mut group = c.benchmark_group("registration");

    group.bench_function("instance", |b| {
        let registry = Registry::new();
        b.iter(|| registry.register_instance(black_box(Arc::new(NUMBER))))
    });

    group.bench_function("singleton_factory_first_resolve", |b| {
        let registry = Registry::new();
        b.iter(|| {
            registry.register_singleton_factory(|| Arc::new(NUMBER));
            black_box(registry.resolve::<i32>())
        })
    });

    group.bench_function("create_with_capacity", |b| {
        b.iter(|| black_box(Registry::with_capacity(16)))
    });

    group.finish();
}

criterion_group!(benches, bench_workload, bench_resolve, bench_registration);
criterion_main!(benches);
