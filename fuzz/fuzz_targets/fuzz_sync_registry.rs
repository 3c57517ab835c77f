#![no_main]

//! Fuzz target for concurrent registry operations
//!
//! Tests that `SyncRegistry` stays consistent under concurrent registration,
//! resolution and clearing, and that singleton factories run at most once
//! per registration.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use service_registry::{ProviderKind, Registry, SyncRegistry};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::thread;

#[derive(Clone, Debug, Arbitrary)]
struct ConcurrentService {
    id: u64,
    data: Vec<u8>,
}

#[derive(Clone, Debug, Arbitrary)]
struct SharedConfig {
    value: u32,
}

/// Thread operation
#[derive(Debug, Clone, Arbitrary)]
enum ThreadOp {
    Resolve,
    TryResolve,
    Contains,
    Register(ConcurrentService),
    RegisterFactory(ConcurrentService),
    Clear,
}

#[derive(Debug, Arbitrary)]
struct ConcurrentScenario {
    initial_services: Vec<ConcurrentService>,
    // Clamped to 1-8
    thread_count: u8,
    ops_per_thread: Vec<ThreadOp>,
}

fuzz_target!(|scenario: ConcurrentScenario| {
    let registry: Arc<SyncRegistry> = Arc::new(Registry::synchronized());

    for svc in scenario.initial_services.into_iter().take(10) {
        registry.register_instance(Arc::new(svc));
    }

    // SharedConfig is never re-registered, so its factory must run exactly once
    let config_calls = Arc::new(AtomicU32::new(0));
    let calls = Arc::clone(&config_calls);
    registry.register_singleton_factory(move || {
        calls.fetch_add(1, Ordering::SeqCst);
        Arc::new(SharedConfig { value: 42 })
    });

    let thread_count = (scenario.thread_count % 8).max(1) as usize;
    let ops = scenario.ops_per_thread;

    let handles: Vec<_> = (0..thread_count)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let ops = ops.clone();
            thread::spawn(move || {
                for op in ops.into_iter().take(50) {
                    match op {
                        ThreadOp::Resolve => {
                            let config = registry.resolve::<SharedConfig>();
                            assert_eq!(config.map(|c| c.value), Some(42));
                        }
                        ThreadOp::TryResolve => {
                            let _ = registry.try_resolve::<ConcurrentService>();
                        }
                        ThreadOp::Contains => {
                            assert!(registry.contains::<SharedConfig>());
                            let _ = registry.contains::<ConcurrentService>();
                        }
                        ThreadOp::Register(svc) => {
                            registry.register_instance(Arc::new(svc));
                        }
                        ThreadOp::RegisterFactory(svc) => {
                            registry.register_factory(move || Arc::new(svc.clone()));
                        }
                        ThreadOp::Clear => {
                            registry.clear::<ConcurrentService>();
                        }
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("worker panicked");
    }

    assert!(config_calls.load(Ordering::SeqCst) <= 1);
    let config = registry.resolve::<SharedConfig>().expect("config registered");
    assert_eq!(config.value, 42);
    assert_eq!(config_calls.load(Ordering::SeqCst), 1);
    assert_eq!(registry.kind::<SharedConfig>(), Some(ProviderKind::Instance));
});
