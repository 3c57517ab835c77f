//! Type-erased provider slots
//!
//! Every registration is stored as an `Arc<dyn ErasedSlot>`, so one
//! homogeneous map can hold providers for any number of service types. The
//! concrete slot knows its own service type and provider kind; it exposes a
//! single erased [`ErasedSlot::resolve`] that forwards to the
//! [`ResolutionVisitor`] with both statically bound.

use crate::visitor::{CaptureSink, ResolutionVisitor};
use crate::{FactoryFn, Provider, ProviderKind, Result, Service};
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;

/// Shared handle to a slot, as stored in a registry.
pub type SlotRef = Arc<dyn ErasedSlot>;

/// A provider for one service type, with the service type erased.
pub trait ErasedSlot: Send + Sync {
    /// Dispatch this slot's provider to `visitor`, which delivers the value into `sink`.
    fn resolve(&self, visitor: &mut ResolutionVisitor, sink: &mut dyn CaptureSink) -> Result<()>;

    /// Kind of provider held by this slot
    fn kind(&self) -> ProviderKind;

    /// Name of the service type this slot provides
    fn type_name(&self) -> &'static str;
}

impl fmt::Debug for dyn ErasedSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErasedSlot")
            .field("service", &self.type_name())
            .field("kind", &self.kind())
            .finish()
    }
}

// =============================================================================
// Instance Slot
// =============================================================================

/// Slot holding a pre-built shared value.
pub struct InstanceSlot<T: ?Sized + Service> {
    value: Arc<T>,
}

impl<T: ?Sized + Service> InstanceSlot<T> {
    #[inline]
    pub fn new(value: Arc<T>) -> Self {
        Self { value }
    }

    /// The held value
    #[inline]
    pub fn value(&self) -> &Arc<T> {
        &self.value
    }
}

impl<T: ?Sized + Service> ErasedSlot for InstanceSlot<T> {
    #[inline]
    fn resolve(&self, visitor: &mut ResolutionVisitor, sink: &mut dyn CaptureSink) -> Result<()> {
        visitor.visit_instance(self, sink)
    }

    #[inline]
    fn kind(&self) -> ProviderKind {
        ProviderKind::Instance
    }

    #[inline]
    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

// =============================================================================
// Factory Slot
// =============================================================================

/// Slot holding a factory, optionally promoting its first value to an instance.
///
/// A promoting slot runs the factory at most once: the produced value is kept
/// in a `OnceCell`, so concurrent first resolves on a synchronized registry
/// still observe a single invocation.
pub struct FactorySlot<T: ?Sized + Service> {
    factory: FactoryFn<T>,
    promoted: Option<OnceCell<Arc<T>>>,
}

impl<T: ?Sized + Service> FactorySlot<T> {
    /// Factory invoked on every resolve
    #[inline]
    pub fn new(factory: FactoryFn<T>) -> Self {
        Self {
            factory,
            promoted: None,
        }
    }

    /// Factory whose first value becomes the instance for `T`
    #[inline]
    pub fn singleton(factory: FactoryFn<T>) -> Self {
        Self {
            factory,
            promoted: Some(OnceCell::new()),
        }
    }

    /// Whether this slot promotes itself on first resolve
    #[inline]
    pub fn is_singleton(&self) -> bool {
        self.promoted.is_some()
    }

    /// Produce a value. For a promoting slot the factory runs only once.
    #[inline]
    pub fn produce(&self) -> Arc<T> {
        match &self.promoted {
            None => (self.factory)(),
            Some(cell) => Arc::clone(cell.get_or_init(|| (self.factory)())),
        }
    }
}

impl<T: ?Sized + Service> ErasedSlot for FactorySlot<T> {
    #[inline]
    fn resolve(&self, visitor: &mut ResolutionVisitor, sink: &mut dyn CaptureSink) -> Result<()> {
        visitor.visit_factory(self, sink)
    }

    #[inline]
    fn kind(&self) -> ProviderKind {
        if self.is_singleton() {
            ProviderKind::SingletonFactory
        } else {
            ProviderKind::Factory
        }
    }

    #[inline]
    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Wrap a provider in the matching slot.
#[inline]
pub fn slot_for<T: ?Sized + Service>(provider: Provider<T>) -> SlotRef {
    match provider {
        Provider::Instance(value) => Arc::new(InstanceSlot::new(value)),
        Provider::Factory(factory) => Arc::new(FactorySlot::new(factory)),
    }
}

/// Wrap a factory in a promoting slot.
#[inline]
pub fn singleton_slot_for<T: ?Sized + Service>(factory: FactoryFn<T>) -> SlotRef {
    Arc::new(FactorySlot::singleton(factory))
}
