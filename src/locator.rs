//! Backend-independent service locator contract
//!
//! Every registry backend in this crate implements [`ServiceLocator`], so
//! code written against the trait (benchmarks, parity tests) runs unchanged
//! on any of them.

use crate::storage::SlotStore;
use crate::{DynamicRegistry, Registry, Service};
use std::sync::Arc;

/// Register/resolve/clear operations shared by all registry backends.
///
/// Methods take `&mut self` so that backends without interior mutability
/// can implement the trait; [`Registry`] simply forwards to its `&self` API.
pub trait ServiceLocator {
    /// Register a shared instance for `T`.
    fn register_instance<T: ?Sized + Service>(&mut self, value: Arc<T>);

    /// Register a factory for `T`, invoked on every resolve.
    fn register_factory<T, F>(&mut self, factory: F)
    where
        T: ?Sized + Service,
        F: Fn() -> Arc<T> + Send + Sync + 'static;

    /// Register a factory for `T` that is promoted to an instance on first use.
    fn register_singleton_factory<T, F>(&mut self, factory: F)
    where
        T: ?Sized + Service,
        F: Fn() -> Arc<T> + Send + Sync + 'static;

    /// Resolve `T`, or `None` if nothing is registered for it.
    fn resolve<T: ?Sized + Service>(&mut self) -> Option<Arc<T>>;

    /// Remove the registration for `T`. Returns whether one existed.
    fn clear<T: ?Sized + Service>(&mut self) -> bool;

    /// Remove every registration.
    fn clear_all(&mut self);
}

impl<S: SlotStore> ServiceLocator for Registry<S> {
    #[inline]
    fn register_instance<T: ?Sized + Service>(&mut self, value: Arc<T>) {
        Registry::register_instance(self, value);
    }

    #[inline]
    fn register_factory<T, F>(&mut self, factory: F)
    where
        T: ?Sized + Service,
        F: Fn() -> Arc<T> + Send + Sync + 'static,
    {
        Registry::register_factory(self, factory);
    }

    #[inline]
    fn register_singleton_factory<T, F>(&mut self, factory: F)
    where
        T: ?Sized + Service,
        F: Fn() -> Arc<T> + Send + Sync + 'static,
    {
        Registry::register_singleton_factory(self, factory);
    }

    #[inline]
    fn resolve<T: ?Sized + Service>(&mut self) -> Option<Arc<T>> {
        Registry::resolve::<T>(self)
    }

    #[inline]
    fn clear<T: ?Sized + Service>(&mut self) -> bool {
        Registry::clear::<T>(self)
    }

    #[inline]
    fn clear_all(&mut self) {
        Registry::clear_all(self);
    }
}

impl ServiceLocator for DynamicRegistry {
    #[inline]
    fn register_instance<T: ?Sized + Service>(&mut self, value: Arc<T>) {
        DynamicRegistry::register_instance(self, value);
    }

    #[inline]
    fn register_factory<T, F>(&mut self, factory: F)
    where
        T: ?Sized + Service,
        F: Fn() -> Arc<T> + Send + Sync + 'static,
    {
        DynamicRegistry::register_factory(self, factory);
    }

    #[inline]
    fn register_singleton_factory<T, F>(&mut self, factory: F)
    where
        T: ?Sized + Service,
        F: Fn() -> Arc<T> + Send + Sync + 'static,
    {
        DynamicRegistry::register_singleton_factory(self, factory);
    }

    #[inline]
    fn resolve<T: ?Sized + Service>(&mut self) -> Option<Arc<T>> {
        DynamicRegistry::resolve::<T>(self)
    }

    #[inline]
    fn clear<T: ?Sized + Service>(&mut self) -> bool {
        DynamicRegistry::clear::<T>(self)
    }

    #[inline]
    fn clear_all(&mut self) {
        DynamicRegistry::clear_all(self);
    }
}
