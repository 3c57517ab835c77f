//! Double-dispatch resolution protocol
//!
//! Resolution recovers a service's concrete type in two steps:
//!
//! 1. The erased slot dispatches on its own provider kind by calling
//!    [`ResolutionVisitor::visit_instance`] or
//!    [`ResolutionVisitor::visit_factory`] with its service type bound.
//! 2. The visitor obtains the typed `Arc<T>` and hands it, erased, to the
//!    caller's [`CaptureSink`]. The sink was built for the caller's `T` and
//!    performs the only de-erasure in the path, a checked downcast.
//!
//! No allocation happens on this path: the erased value is a borrowed
//! `Option<Arc<T>>` the sink takes ownership from.

use crate::slot::{ErasedSlot, FactorySlot, InstanceSlot, SlotRef};
use crate::{RegistryError, Result, Service};
use std::any::Any;
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::trace;

/// A shared value with its type erased, on its way into a sink.
pub struct ErasedValue<'a> {
    value: &'a mut dyn Any,
    type_name: &'static str,
}

impl<'a> ErasedValue<'a> {
    /// Erase a pending value. The sink takes the `Arc` out of `value`.
    #[inline]
    pub fn new<T: ?Sized + Service>(value: &'a mut Option<Arc<T>>) -> Self {
        Self {
            value,
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Name of the type the value was erased from
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Recover the value as `Arc<T>`.
    #[inline]
    pub fn take<T: ?Sized + Service>(self) -> Result<Arc<T>> {
        let found = self.type_name;
        self.value
            .downcast_mut::<Option<Arc<T>>>()
            .ok_or_else(|| RegistryError::type_mismatch::<T>(found))?
            .take()
            .ok_or_else(|| RegistryError::sink_reused::<T>())
    }
}

/// Typed, single-use receiver at the end of the dispatch chain.
pub trait CaptureSink {
    /// Accept an erased value and store it.
    fn capture(&mut self, value: ErasedValue<'_>) -> Result<()>;
}

/// Capture sink for service type `T`.
///
/// # Examples
///
/// ```rust
/// use service_registry::{Capture, CaptureSink, ErasedValue};
/// use std::sync::Arc;
///
/// let mut pending = Some(Arc::new(7u8));
/// let mut sink = Capture::<u8>::new();
/// sink.capture(ErasedValue::new(&mut pending)).unwrap();
/// assert_eq!(*sink.into_value().unwrap(), 7);
/// ```
pub struct Capture<T: ?Sized + Service> {
    value: Option<Arc<T>>,
}

impl<T: ?Sized + Service> Capture<T> {
    #[inline]
    pub fn new() -> Self {
        Self { value: None }
    }

    /// Whether a value has been captured
    #[inline]
    pub fn is_filled(&self) -> bool {
        self.value.is_some()
    }

    /// Consume the sink, yielding the captured value if any
    #[inline]
    pub fn into_value(self) -> Option<Arc<T>> {
        self.value
    }
}

impl<T: ?Sized + Service> Default for Capture<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized + Service> CaptureSink for Capture<T> {
    #[inline]
    fn capture(&mut self, value: ErasedValue<'_>) -> Result<()> {
        if self.value.is_some() {
            return Err(RegistryError::sink_reused::<T>());
        }
        self.value = Some(value.take::<T>()?);
        Ok(())
    }
}

/// Second half of the double dispatch: one method per slot kind.
///
/// A visitor lives for a single resolution. When it visits a promoting
/// factory it records the instance slot that should replace it; the registry
/// collects that with [`take_promotion`](Self::take_promotion) once dispatch
/// has returned.
#[derive(Default)]
pub struct ResolutionVisitor {
    promotion: Option<SlotRef>,
}

impl ResolutionVisitor {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver an instance slot's shared value.
    #[inline]
    pub fn visit_instance<T: ?Sized + Service>(
        &mut self,
        slot: &InstanceSlot<T>,
        sink: &mut dyn CaptureSink,
    ) -> Result<()> {
        let mut value = Some(Arc::clone(slot.value()));
        sink.capture(ErasedValue::new(&mut value))
    }

    /// Invoke a factory slot and deliver its value.
    #[inline]
    pub fn visit_factory<T: ?Sized + Service>(
        &mut self,
        slot: &FactorySlot<T>,
        sink: &mut dyn CaptureSink,
    ) -> Result<()> {
        #[cfg(feature = "logging")]
        trace!(
            target: "service_registry",
            service = std::any::type_name::<T>(),
            singleton = slot.is_singleton(),
            "Invoking factory"
        );

        let produced = slot.produce();
        if slot.is_singleton() {
            self.promotion = Some(Arc::new(InstanceSlot::new(Arc::clone(&produced))));
        }

        let mut value = Some(produced);
        sink.capture(ErasedValue::new(&mut value))
    }

    /// Instance slot recorded by a promoting factory, if any
    #[inline]
    pub fn take_promotion(&mut self) -> Option<SlotRef> {
        self.promotion.take()
    }
}

/// Outcome of dispatching one slot.
pub(crate) struct Resolved<T: ?Sized + Service> {
    pub(crate) value: Arc<T>,
    pub(crate) promotion: Option<SlotRef>,
}

/// Run the full double dispatch for `slot`, capturing into a fresh `Capture<T>`.
#[inline]
pub(crate) fn dispatch<T: ?Sized + Service>(slot: &dyn ErasedSlot) -> Result<Resolved<T>> {
    let mut visitor = ResolutionVisitor::new();
    let mut sink = Capture::<T>::new();

    slot.resolve(&mut visitor, &mut sink)?;

    let value = sink
        .into_value()
        .ok_or_else(|| RegistryError::not_captured::<T>())?;

    Ok(Resolved {
        value,
        promotion: visitor.take_promotion(),
    })
}
