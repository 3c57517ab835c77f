//! Providers bound to service types
//!
//! A [`Provider`] is either a ready, shared instance or a zero-argument
//! factory producing a shared value on demand.

use std::fmt;
use std::sync::Arc;

/// Marker trait for types that can be registered as services.
///
/// Implemented for every `Send + Sync + 'static` type, sized or not, so trait
/// objects such as `dyn MyTrait` (with `Send + Sync` supertraits) work as
/// service types. You never need to implement this manually.
pub trait Service: Send + Sync + 'static {}

impl<T: ?Sized + Send + Sync + 'static> Service for T {}

/// Shared factory function producing `Arc<T>`.
pub type FactoryFn<T> = Arc<dyn Fn() -> Arc<T> + Send + Sync>;

/// What kind of provider a slot currently holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// A pre-built shared value
    Instance,
    /// A factory invoked on every resolve
    Factory,
    /// A factory that promotes its first value into an instance
    SingletonFactory,
}

impl ProviderKind {
    /// Short lowercase label, used in log fields
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Instance => "instance",
            ProviderKind::Factory => "factory",
            ProviderKind::SingletonFactory => "singleton_factory",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider of a `T` value.
///
/// # Examples
///
/// ```rust
/// use service_registry::Provider;
/// use std::sync::Arc;
///
/// let instance = Provider::instance(Arc::new(42));
/// assert!(Arc::ptr_eq(&instance.get(), &instance.get()));
///
/// let factory = Provider::factory(|| Arc::new(42));
/// assert!(!Arc::ptr_eq(&factory.get(), &factory.get()));
/// ```
pub enum Provider<T: ?Sized + Service> {
    /// Already-constructed shared value
    Instance(Arc<T>),
    /// Callable producing a shared value on every call
    Factory(FactoryFn<T>),
}

impl<T: ?Sized + Service> Provider<T> {
    /// Wrap an already-constructed value.
    #[inline]
    pub fn instance(value: Arc<T>) -> Self {
        Provider::Instance(value)
    }

    /// Wrap a factory.
    #[inline]
    pub fn factory<F>(factory: F) -> Self
    where
        F: Fn() -> Arc<T> + Send + Sync + 'static,
    {
        Provider::Factory(Arc::new(factory))
    }

    /// Produce the value: the shared instance, or a fresh factory call.
    #[inline]
    pub fn get(&self) -> Arc<T> {
        match self {
            Provider::Instance(value) => Arc::clone(value),
            Provider::Factory(factory) => factory(),
        }
    }

    /// Kind of this provider.
    #[inline]
    pub fn kind(&self) -> ProviderKind {
        match self {
            Provider::Instance(_) => ProviderKind::Instance,
            Provider::Factory(_) => ProviderKind::Factory,
        }
    }
}

impl<T: ?Sized + Service> Clone for Provider<T> {
    fn clone(&self) -> Self {
        match self {
            Provider::Instance(value) => Provider::Instance(Arc::clone(value)),
            Provider::Factory(factory) => Provider::Factory(Arc::clone(factory)),
        }
    }
}

impl<T: ?Sized + Service> fmt::Debug for Provider<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("service", &std::any::type_name::<T>())
            .field("kind", &self.kind())
            .finish()
    }
}
