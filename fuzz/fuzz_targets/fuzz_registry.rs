#![no_main]

//! Differential fuzz target for the unsynchronized registry
//!
//! Applies the same operation sequence to `Registry` and `DynamicRegistry`
//! and checks that every resolution agrees.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use service_registry::{DynamicRegistry, Registry, ServiceLocator};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

trait Named: Send + Sync {
    fn name(&self) -> &str;
}

#[derive(Clone, Debug, Arbitrary)]
struct Label(String);

impl Named for Label {
    fn name(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Arbitrary)]
enum RegistryOp {
    InstanceU64(u64),
    InstanceLabel(Label),
    InstanceNamed(Label),
    FactoryU64,
    FactoryLabel(Label),
    SingletonU64,
    SingletonNamed(Label),
    ResolveU64,
    ResolveLabel,
    ResolveNamed,
    ClearU64,
    ClearNamed,
    ClearAll,
}

/// Apply `op`, returning what a resolve observed (if it was a resolve).
fn apply<L: ServiceLocator>(locator: &mut L, op: &RegistryOp, counter: &Arc<AtomicU64>) -> Option<String> {
    match op {
        RegistryOp::InstanceU64(v) => locator.register_instance(Arc::new(*v)),
        RegistryOp::InstanceLabel(label) => locator.register_instance(Arc::new(label.clone())),
        RegistryOp::InstanceNamed(label) => {
            locator.register_instance::<dyn Named>(Arc::new(label.clone()))
        }
        RegistryOp::FactoryU64 => {
            let counter = Arc::clone(counter);
            locator.register_factory(move || Arc::new(counter.fetch_add(1, Ordering::Relaxed)));
        }
        RegistryOp::FactoryLabel(label) => {
            let label = label.clone();
            locator.register_factory(move || Arc::new(label.clone()));
        }
        RegistryOp::SingletonU64 => {
            let counter = Arc::clone(counter);
            locator.register_singleton_factory(move || {
                Arc::new(counter.fetch_add(1, Ordering::Relaxed))
            });
        }
        RegistryOp::SingletonNamed(label) => {
            let label = label.clone();
            locator.register_singleton_factory::<dyn Named, _>(move || Arc::new(label.clone()));
        }
        RegistryOp::ResolveU64 => {
            return Some(format!("{:?}", locator.resolve::<u64>().map(|v| *v)));
        }
        RegistryOp::ResolveLabel => {
            return Some(format!("{:?}", locator.resolve::<Label>().map(|v| v.0.clone())));
        }
        RegistryOp::ResolveNamed => {
            return Some(format!(
                "{:?}",
                locator.resolve::<dyn Named>().map(|v| v.name().to_owned())
            ));
        }
        RegistryOp::ClearU64 => return Some(locator.clear::<u64>().to_string()),
        RegistryOp::ClearNamed => return Some(locator.clear::<dyn Named>().to_string()),
        RegistryOp::ClearAll => locator.clear_all(),
    }
    None
}

fuzz_target!(|ops: Vec<RegistryOp>| {
    let mut registry = Registry::new();
    let mut dynamic = DynamicRegistry::new();

    // Separate counters: factories must be invoked the same number of times
    let registry_counter = Arc::new(AtomicU64::new(0));
    let dynamic_counter = Arc::new(AtomicU64::new(0));

    for op in ops.iter().take(256) {
        let left = apply(&mut registry, op, &registry_counter);
        let right = apply(&mut dynamic, op, &dynamic_counter);
        assert_eq!(left, right, "backends diverged on {:?}", op);
    }

    assert_eq!(
        registry_counter.load(Ordering::Relaxed),
        dynamic_counter.load(Ordering::Relaxed)
    );
    assert_eq!(registry.len(), dynamic.len());
});
