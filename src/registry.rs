//! Service registry
//!
//! The `Registry` maps each service type to one type-erased slot and resolves
//! requests through the double-dispatch protocol in [`crate::visitor`].

use crate::slot::{SlotRef, singleton_slot_for, slot_for};
use crate::storage::{LocalStore, SharedStore, SlotStore};
use crate::visitor::{Resolved, dispatch};
use crate::{Provider, ProviderKind, RegistryError, Result, Service, TypeKey, key_of};
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::{debug, trace, warn};

/// Registry of services keyed by type.
///
/// The default store, [`LocalStore`], performs no synchronization. Such a
/// registry can be moved to another thread but not shared between threads;
/// use [`SyncRegistry`] when several threads register or resolve concurrently.
///
/// ```compile_fail
/// fn assert_sync<T: Sync>() {}
/// assert_sync::<service_registry::Registry>();
/// ```
///
/// # Examples
///
/// ```rust
/// use service_registry::Registry;
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
///
/// struct English;
///
/// impl Greeter for English {
///     fn greet(&self) -> String {
///         "hello".into()
///     }
/// }
///
/// let registry = Registry::new();
/// registry.register_instance::<dyn Greeter>(Arc::new(English));
/// registry.register_factory(|| Arc::new(42u32));
///
/// assert_eq!(registry.resolve::<dyn Greeter>().unwrap().greet(), "hello");
/// assert_eq!(*registry.resolve::<u32>().unwrap(), 42);
/// assert!(registry.resolve::<String>().is_none());
/// ```
pub struct Registry<S: SlotStore = LocalStore> {
    store: S,
}

/// Registry that may be shared between threads.
///
/// ```rust
/// use service_registry::{Registry, SyncRegistry};
/// use std::sync::Arc;
///
/// let registry: Arc<SyncRegistry> = Arc::new(Registry::synchronized());
/// registry.register_instance(Arc::new(7u8));
///
/// let worker = {
///     let registry = Arc::clone(&registry);
///     std::thread::spawn(move || *registry.resolve::<u8>().unwrap())
/// };
/// assert_eq!(worker.join().unwrap(), 7);
/// ```
pub type SyncRegistry = Registry<SharedStore>;

impl Registry<LocalStore> {
    /// Create an empty, unsynchronized registry.
    #[inline]
    pub fn new() -> Self {
        Self::with_store(LocalStore::default())
    }

    /// Create an unsynchronized registry with room for `capacity` services.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_store(LocalStore::with_capacity(capacity))
    }
}

impl Registry<SharedStore> {
    /// Create an empty registry that can be shared between threads.
    #[inline]
    pub fn synchronized() -> Self {
        Self::with_store(SharedStore::default())
    }

    /// Create a synchronized registry with room for `capacity` services.
    #[inline]
    pub fn synchronized_with_capacity(capacity: usize) -> Self {
        Self::with_store(SharedStore::with_capacity(capacity))
    }
}

impl<S: SlotStore> Default for Registry<S> {
    fn default() -> Self {
        Self::with_store(S::default())
    }
}

impl<S: SlotStore> Registry<S> {
    /// Create a registry over an existing store.
    #[inline]
    pub fn with_store(store: S) -> Self {
        #[cfg(feature = "logging")]
        debug!(
            target: "service_registry",
            store = std::any::type_name::<S>(),
            "Creating new service registry"
        );

        Self { store }
    }

    // =========================================================================
    // Registration Methods
    // =========================================================================

    /// Register a provider for `T`, replacing any previous registration.
    #[inline]
    pub fn register<T: ?Sized + Service>(&self, provider: Provider<T>) {
        let kind = provider.kind();
        self.install(key_of::<T>(), slot_for(provider), kind);
    }

    /// Register a shared instance for `T`.
    ///
    /// Every resolve returns a clone of the same `Arc`.
    #[inline]
    pub fn register_instance<T: ?Sized + Service>(&self, value: Arc<T>) {
        self.register(Provider::instance(value));
    }

    /// Register a factory for `T`, invoked on every resolve.
    #[inline]
    pub fn register_factory<T, F>(&self, factory: F)
    where
        T: ?Sized + Service,
        F: Fn() -> Arc<T> + Send + Sync + 'static,
    {
        self.register(Provider::factory(factory));
    }

    /// Register a factory for `T` that is promoted to an instance on first use.
    ///
    /// The first resolve calls `factory` once and replaces this registration
    /// with an instance holding the produced value; later resolves return
    /// that same value. Registering `T` again before the first resolve
    /// discards the promotion.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use service_registry::{ProviderKind, Registry};
    /// use std::sync::Arc;
    /// use std::sync::atomic::{AtomicU32, Ordering};
    ///
    /// static CALLS: AtomicU32 = AtomicU32::new(0);
    ///
    /// let registry = Registry::new();
    /// registry.register_singleton_factory(|| Arc::new(CALLS.fetch_add(1, Ordering::SeqCst) + 1));
    ///
    /// assert_eq!(*registry.resolve::<u32>().unwrap(), 1);
    /// assert_eq!(*registry.resolve::<u32>().unwrap(), 1);
    /// assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    /// assert_eq!(registry.kind::<u32>(), Some(ProviderKind::Instance));
    /// ```
    #[inline]
    pub fn register_singleton_factory<T, F>(&self, factory: F)
    where
        T: ?Sized + Service,
        F: Fn() -> Arc<T> + Send + Sync + 'static,
    {
        self.install(
            key_of::<T>(),
            singleton_slot_for::<T>(Arc::new(factory)),
            ProviderKind::SingletonFactory,
        );
    }

    fn install(&self, key: TypeKey, slot: SlotRef, kind: ProviderKind) {
        #[cfg(not(feature = "logging"))]
        let _ = kind;

        let previous = self.store.insert(key, slot);

        #[cfg(feature = "logging")]
        debug!(
            target: "service_registry",
            service = key.type_name(),
            kind = kind.as_str(),
            replaced = previous.as_ref().map(|slot| slot.kind().as_str()),
            service_count = self.store.len(),
            "Registering service"
        );

        drop(previous);
    }

    // =========================================================================
    // Resolution Methods
    // =========================================================================

    /// Resolve `T`, or `None` if nothing is registered for it.
    #[inline]
    pub fn resolve<T: ?Sized + Service>(&self) -> Option<Arc<T>> {
        match self.try_resolve::<T>() {
            Ok(value) => Some(value),
            #[cfg(feature = "logging")]
            Err(err) if !err.is_not_found() => {
                warn!(
                    target: "service_registry",
                    service = std::any::type_name::<T>(),
                    error = %err,
                    "Resolution failed"
                );
                None
            }
            Err(_) => None,
        }
    }

    /// Resolve `T`, returning [`RegistryError::NotFound`] if nothing is registered.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use service_registry::Registry;
    ///
    /// let registry = Registry::new();
    /// let err = registry.try_resolve::<u16>().unwrap_err();
    /// assert!(err.is_not_found());
    /// ```
    #[inline]
    pub fn try_resolve<T: ?Sized + Service>(&self) -> Result<Arc<T>> {
        let key = key_of::<T>();

        let Some(slot) = self.store.lookup(&key) else {
            #[cfg(feature = "logging")]
            trace!(
                target: "service_registry",
                service = key.type_name(),
                "Service not registered"
            );
            return Err(RegistryError::not_found::<T>());
        };

        let Resolved { value, promotion } = dispatch::<T>(slot.as_ref())?;

        if let Some(instance) = promotion {
            self.promote(&key, &slot, instance);
        }

        #[cfg(feature = "logging")]
        trace!(
            target: "service_registry",
            service = key.type_name(),
            kind = slot.kind().as_str(),
            "Service resolved"
        );

        Ok(value)
    }

    /// Swap a promoting factory slot for the instance it produced.
    #[cold]
    fn promote(&self, key: &TypeKey, factory_slot: &SlotRef, instance: SlotRef) {
        let installed = self.store.replace_if_current(key, factory_slot, instance);

        #[cfg(feature = "logging")]
        debug!(
            target: "service_registry",
            service = key.type_name(),
            installed,
            "Promoting singleton factory to instance"
        );

        #[cfg(not(feature = "logging"))]
        let _ = installed;
    }

    // =========================================================================
    // Removal Methods
    // =========================================================================

    /// Remove the registration for `T`. Returns whether one existed.
    ///
    /// Values already handed out stay alive as long as their holders keep them.
    #[inline]
    pub fn clear<T: ?Sized + Service>(&self) -> bool {
        let removed = self.store.remove(&key_of::<T>());

        #[cfg(feature = "logging")]
        debug!(
            target: "service_registry",
            service = std::any::type_name::<T>(),
            removed = removed.is_some(),
            "Clearing service"
        );

        removed.is_some()
    }

    /// Remove every registration.
    pub fn clear_all(&self) {
        #[cfg(feature = "logging")]
        debug!(
            target: "service_registry",
            service_count = self.store.len(),
            "Clearing all services"
        );

        self.store.clear();
    }

    // =========================================================================
    // Query Methods
    // =========================================================================

    /// Check if `T` is registered.
    #[inline]
    pub fn contains<T: ?Sized + Service>(&self) -> bool {
        self.store.lookup(&key_of::<T>()).is_some()
    }

    /// Kind of provider currently registered for `T`.
    #[inline]
    pub fn kind<T: ?Sized + Service>(&self) -> Option<ProviderKind> {
        self.store.lookup(&key_of::<T>()).map(|slot| slot.kind())
    }

    /// Number of registered services.
    #[inline]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Check if no services are registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Keys of all registered services, in no particular order.
    pub fn keys(&self) -> Vec<TypeKey> {
        self.store.keys()
    }
}

impl<S: SlotStore + std::fmt::Debug> std::fmt::Debug for Registry<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry").field("store", &self.store).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Weak;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    trait MathService: Send + Sync {
        fn get_int(&self) -> i32;
    }

    struct FixedMath;

    impl MathService for FixedMath {
        fn get_int(&self) -> i32 {
            30
        }
    }

    fn counter() -> (Arc<AtomicU32>, Arc<AtomicU32>) {
        let calls = Arc::new(AtomicU32::new(0));
        (Arc::clone(&calls), calls)
    }

    /// Properties shared by every store
    fn exercise_registry<S: SlotStore>() {
        let registry = Registry::<S>::default();
        assert!(registry.is_empty());
        assert!(registry.resolve::<i32>().is_none());

        // Instance round-trip
        let value = Arc::new(42i32);
        registry.register_instance(Arc::clone(&value));
        for _ in 0..3 {
            assert!(Arc::ptr_eq(&registry.resolve::<i32>().unwrap(), &value));
        }

        // Factory replaces instance, re-invoked per resolve
        let (calls, seen) = counter();
        registry.register_factory(move || {
            calls.fetch_add(1, Ordering::SeqCst);
            Arc::new(42i32)
        });
        assert_eq!(registry.kind::<i32>(), Some(ProviderKind::Factory));
        assert_eq!(*registry.resolve::<i32>().unwrap(), 42);
        assert_eq!(*registry.resolve::<i32>().unwrap(), 42);
        assert_eq!(seen.load(Ordering::SeqCst), 2);

        // Singleton promotion
        let (calls, seen) = counter();
        registry.register_singleton_factory(move || {
            Arc::new(calls.fetch_add(1, Ordering::SeqCst) as i32 + 1)
        });
        assert_eq!(registry.kind::<i32>(), Some(ProviderKind::SingletonFactory));
        let first = registry.resolve::<i32>().unwrap();
        let second = registry.resolve::<i32>().unwrap();
        assert_eq!(*first, 1);
        assert_eq!(*second, 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(registry.kind::<i32>(), Some(ProviderKind::Instance));

        // Clear
        assert!(registry.clear::<i32>());
        assert!(!registry.clear::<i32>());
        assert!(registry.resolve::<i32>().is_none());
        assert_eq!(*first, 1);
    }

    #[test]
    fn test_local_registry_properties() {
        exercise_registry::<LocalStore>();
    }

    #[test]
    fn test_sync_registry_properties() {
        exercise_registry::<SharedStore>();
    }

    #[test]
    fn test_math_service_scenario() {
        let registry = Registry::new();
        registry.register_instance::<dyn MathService>(Arc::new(FixedMath));

        for _ in 0..5 {
            assert_eq!(registry.resolve::<dyn MathService>().unwrap().get_int(), 30);
        }
    }

    #[test]
    fn test_singleton_promotion_survives_other_registrations() {
        let registry = Registry::new();
        let (calls, seen) = counter();
        registry.register_singleton_factory(move || {
            calls.fetch_add(1, Ordering::SeqCst);
            Arc::new(String::from("config"))
        });

        let first = registry.resolve::<String>().unwrap();
        registry.register_factory(|| Arc::new(1u8));
        registry.register_instance(Arc::new(2u16));
        let second = registry.resolve::<String>().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_reregister_before_first_resolve_drops_promotion() {
        let registry = Registry::new();
        let (calls, seen) = counter();
        registry.register_singleton_factory(move || {
            calls.fetch_add(1, Ordering::SeqCst);
            Arc::new(1u64)
        });
        registry.register_factory(|| Arc::new(2u64));

        assert_eq!(*registry.resolve::<u64>().unwrap(), 2);
        assert_eq!(registry.kind::<u64>(), Some(ProviderKind::Factory));
        assert_eq!(seen.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_factory_may_register_on_same_registry() {
        let registry = Arc::new(Registry::synchronized());
        let inner = Arc::downgrade(&registry);
        registry.register_factory(move || {
            if let Some(registry) = inner.upgrade() {
                registry.register_instance(Arc::new(true));
            }
            Arc::new(5u8)
        });

        assert_eq!(*registry.resolve::<u8>().unwrap(), 5);
        assert!(*registry.resolve::<bool>().unwrap());
    }

    #[test]
    fn test_local_factory_may_touch_registry_during_resolve() {
        // A local registry is !Sync, so the factory reaches it through a thread-local
        thread_local! {
            static REGISTRY: Registry = Registry::new();
        }

        REGISTRY.with(|registry| {
            registry.register_factory(|| {
                REGISTRY.with(|registry| registry.register_instance(Arc::new('x')));
                Arc::new(9i64)
            });

            assert_eq!(*registry.resolve::<i64>().unwrap(), 9);
            assert_eq!(*registry.resolve::<char>().unwrap(), 'x');
        });
    }

    #[test]
    fn test_reregister_during_singleton_factory_keeps_newer() {
        let registry = Arc::new(Registry::synchronized());
        let inner = Arc::downgrade(&registry);
        let (calls, seen) = counter();
        registry.register_singleton_factory(move || {
            calls.fetch_add(1, Ordering::SeqCst);
            if let Some(registry) = inner.upgrade() {
                registry.register_instance(Arc::new(99u32));
            }
            Arc::new(1u32)
        });

        assert_eq!(*registry.resolve::<u32>().unwrap(), 1);
        assert_eq!(*registry.resolve::<u32>().unwrap(), 99);
        assert_eq!(*registry.resolve::<u32>().unwrap(), 99);
        assert_eq!(registry.kind::<u32>(), Some(ProviderKind::Instance));
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_local_reregister_during_singleton_factory_keeps_newer() {
        thread_local! {
            static REGISTRY: Registry = Registry::new();
        }

        REGISTRY.with(|registry| {
            let (calls, seen) = counter();
            registry.register_singleton_factory(move || {
                calls.fetch_add(1, Ordering::SeqCst);
                REGISTRY.with(|registry| registry.register_instance(Arc::new(99u32)));
                Arc::new(1u32)
            });

            assert_eq!(*registry.resolve::<u32>().unwrap(), 1);
            assert_eq!(*registry.resolve::<u32>().unwrap(), 99);
            assert_eq!(registry.kind::<u32>(), Some(ProviderKind::Instance));
            assert_eq!(seen.load(Ordering::SeqCst), 1);
        });
    }

    /// Reads the registry that holds it when dropped
    struct TouchesOnDrop {
        registry: Weak<SyncRegistry>,
        drops: Arc<AtomicU32>,
    }

    impl Drop for TouchesOnDrop {
        fn drop(&mut self) {
            if let Some(registry) = self.registry.upgrade() {
                let _ = registry.len();
                let _ = registry.resolve::<u8>();
                self.drops.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[test]
    fn test_value_drop_may_touch_sync_registry() {
        let (done, finished) = std::sync::mpsc::channel();
        std::thread::spawn(move || {
            let registry = Arc::new(Registry::synchronized());
            let (drops, seen) = counter();
            let touching = || TouchesOnDrop {
                registry: Arc::downgrade(&registry),
                drops: Arc::clone(&drops),
            };

            registry.register_instance(Arc::new(touching()));
            assert!(registry.clear::<TouchesOnDrop>());

            registry.register_instance(Arc::new(touching()));
            registry.register_instance(Arc::new(touching()));

            registry.register_instance(Arc::new(1u8));
            registry.clear_all();
            assert!(registry.is_empty());

            let _ = done.send(seen.load(Ordering::SeqCst));
        });

        let drops = finished
            .recv_timeout(Duration::from_secs(5))
            .expect("registry operations did not finish");
        assert_eq!(drops, 3);
    }

    #[test]
    fn test_value_drop_may_touch_local_registry() {
        thread_local! {
            static REGISTRY: Registry = Registry::new();
        }

        struct TouchesLocal(Arc<AtomicU32>);

        impl Drop for TouchesLocal {
            fn drop(&mut self) {
                let touched = REGISTRY.try_with(|registry| {
                    let _ = registry.len();
                    registry.contains::<u8>()
                });
                if touched.is_ok() {
                    self.0.fetch_add(1, Ordering::SeqCst);
                }
            }
        }

        REGISTRY.with(|registry| {
            let (drops, seen) = counter();

            registry.register_instance(Arc::new(TouchesLocal(Arc::clone(&drops))));
            assert!(registry.clear::<TouchesLocal>());

            registry.register_instance(Arc::new(TouchesLocal(Arc::clone(&drops))));
            registry.register_instance(Arc::new(TouchesLocal(Arc::clone(&drops))));

            registry.register_instance(Arc::new(1u8));
            registry.clear_all();
            assert!(registry.is_empty());
            assert_eq!(seen.load(Ordering::SeqCst), 3);
        });
    }

    #[test]
    fn test_concurrent_first_resolve_invokes_singleton_once() {
        let registry = Arc::new(Registry::synchronized());
        let (calls, seen) = counter();
        registry.register_singleton_factory(move || {
            calls.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_millis(5));
            Arc::new(vec![1u8, 2, 3])
        });

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || registry.resolve::<Vec<u8>>().unwrap())
            })
            .collect();
        let values: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert!(values.iter().all(|v| Arc::ptr_eq(v, &values[0])));
        assert_eq!(registry.kind::<Vec<u8>>(), Some(ProviderKind::Instance));
    }

    #[test]
    fn test_clear_all_keeps_caller_shares_alive() {
        let registry = Registry::with_capacity(4);
        registry.register_instance(Arc::new(String::from("kept")));
        registry.register_instance(Arc::new(3u32));

        let held = registry.resolve::<String>().unwrap();
        assert_eq!(Arc::strong_count(&held), 2);
        assert_eq!(registry.len(), 2);

        registry.clear_all();
        assert!(registry.is_empty());
        assert!(registry.resolve::<u32>().is_none());
        assert_eq!(Arc::strong_count(&held), 1);
        assert_eq!(*held, "kept");
    }

    #[test]
    fn test_keys_and_contains() {
        let registry = Registry::new();
        registry.register_instance(Arc::new(1u8));
        registry.register_instance::<dyn MathService>(Arc::new(FixedMath));

        assert!(registry.contains::<u8>());
        assert!(registry.contains::<dyn MathService>());
        assert!(!registry.contains::<u16>());

        let keys = registry.keys();
        assert_eq!(keys.len(), 2);
        assert!(keys.contains(&key_of::<dyn MathService>()));
    }

    #[test]
    fn test_empty_value_is_not_absence() {
        let registry = Registry::new();
        registry.register_factory(|| Arc::new(None::<u32>));

        let resolved = registry.resolve::<Option<u32>>();
        assert!(resolved.is_some());
        assert!(resolved.unwrap().is_none());
    }

    #[test]
    fn test_registry_is_send() {
        fn assert_send<T: Send>() {}
        fn assert_send_sync<T: Send + Sync>() {}

        assert_send::<Registry>();
        assert_send_sync::<SyncRegistry>();
    }
}
