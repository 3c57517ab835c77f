//! Single-dispatch registry backend
//!
//! `DynamicRegistry` stores each [`Provider<T>`] directly in a
//! `Box<dyn Any>`. Resolution is one checked downcast to `Provider<T>`
//! followed by a match on the provider variant, with no slot trait object in
//! between. It satisfies the same [`ServiceLocator`](crate::ServiceLocator)
//! contract as [`Registry`](crate::Registry) and exists mainly as a baseline
//! for parity tests and benchmarks.

use crate::{Provider, Service, TypeKey, key_of};
use ahash::RandomState;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::debug;

struct Entry {
    provider: Box<dyn Any + Send + Sync>,
    promote: bool,
}

impl Entry {
    fn new<T: ?Sized + Service>(provider: Provider<T>, promote: bool) -> Self {
        Self {
            provider: Box::new(provider),
            promote,
        }
    }
}

/// Registry whose mutating operations, resolve included, need `&mut self`.
///
/// # Examples
///
/// ```rust
/// use service_registry::DynamicRegistry;
/// use std::sync::Arc;
///
/// let mut registry = DynamicRegistry::new();
/// registry.register_singleton_factory(|| Arc::new(String::from("db")));
///
/// let a = registry.resolve::<String>().unwrap();
/// let b = registry.resolve::<String>().unwrap();
/// assert!(Arc::ptr_eq(&a, &b));
/// ```
#[derive(Default)]
pub struct DynamicRegistry {
    providers: HashMap<TypeKey, Entry, RandomState>,
}

impl DynamicRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_instance<T: ?Sized + Service>(&mut self, value: Arc<T>) {
        self.providers
            .insert(key_of::<T>(), Entry::new(Provider::instance(value), false));
    }

    pub fn register_factory<T, F>(&mut self, factory: F)
    where
        T: ?Sized + Service,
        F: Fn() -> Arc<T> + Send + Sync + 'static,
    {
        self.providers
            .insert(key_of::<T>(), Entry::new(Provider::factory(factory), false));
    }

    pub fn register_singleton_factory<T, F>(&mut self, factory: F)
    where
        T: ?Sized + Service,
        F: Fn() -> Arc<T> + Send + Sync + 'static,
    {
        self.providers
            .insert(key_of::<T>(), Entry::new(Provider::factory(factory), true));
    }

    /// Resolve `T`, promoting a singleton factory on its first call.
    pub fn resolve<T: ?Sized + Service>(&mut self) -> Option<Arc<T>> {
        let key = key_of::<T>();
        let entry = self.providers.get(&key)?;
        let promote = entry.promote;
        let value = entry.provider.downcast_ref::<Provider<T>>()?.get();

        if promote {
            #[cfg(feature = "logging")]
            debug!(
                target: "service_registry",
                service = key.type_name(),
                "Promoting singleton factory to instance"
            );

            self.providers
                .insert(key, Entry::new(Provider::instance(Arc::clone(&value)), false));
        }

        Some(value)
    }

    pub fn clear<T: ?Sized + Service>(&mut self) -> bool {
        self.providers.remove(&key_of::<T>()).is_some()
    }

    pub fn clear_all(&mut self) {
        self.providers.clear();
    }

    pub fn contains<T: ?Sized + Service>(&self) -> bool {
        self.providers.contains_key(&key_of::<T>())
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl std::fmt::Debug for DynamicRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicRegistry")
            .field("count", &self.len())
            .finish()
    }
}
