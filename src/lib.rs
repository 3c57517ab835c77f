//! # Service Registry - Type-Erased Service Location for Rust
//!
//! A small registry mapping each service type to one provider: a shared
//! instance, a factory called on every resolve, or a factory promoted to a
//! cached instance the first time it is used.
//!
//! ## Features
//!
//! - 🔑 **Exact type keys** - `TypeId`-based identity, no hash collisions
//! - 🧩 **Trait objects as services** - register and resolve `dyn Trait` directly
//! - 🔀 **Double dispatch** - slot kind × capture target, one checked de-erasure
//! - 🏭 **Singleton promotion** - factories that turn into instances on first use
//! - 🧵 **Two stores** - zero-synchronization `Registry`, `DashMap`-backed `SyncRegistry`
//! - 📊 **Observable** - optional tracing integration with JSON or pretty output
//!
//! ## Quick Start
//!
//! ```rust
//! use service_registry::Registry;
//! use std::sync::Arc;
//!
//! trait MathService: Send + Sync {
//!     fn get_int(&self) -> i32;
//! }
//!
//! struct Thirty;
//!
//! impl MathService for Thirty {
//!     fn get_int(&self) -> i32 {
//!         30
//!     }
//! }
//!
//! let registry = Registry::new();
//!
//! // Instance - the same Arc on every resolve
//! registry.register_instance::<dyn MathService>(Arc::new(Thirty));
//!
//! // Factory - called on every resolve
//! registry.register_factory(|| Arc::new(String::from("fresh")));
//!
//! // Singleton factory - called once, then cached as an instance
//! registry.register_singleton_factory(|| Arc::new(vec![1u8, 2, 3]));
//!
//! assert_eq!(registry.resolve::<dyn MathService>().unwrap().get_int(), 30);
//! assert_eq!(registry.resolve::<String>().unwrap().as_str(), "fresh");
//! assert!(Arc::ptr_eq(
//!     &registry.resolve::<Vec<u8>>().unwrap(),
//!     &registry.resolve::<Vec<u8>>().unwrap(),
//! ));
//!
//! // Absence is a plain `None`
//! assert!(registry.resolve::<u64>().is_none());
//! ```
//!
//! ## Resolution
//!
//! Each registration is stored as an `Arc<dyn ErasedSlot>`. Resolving `T`
//! looks the slot up by `key_of::<T>()`, lets the slot dispatch on its own
//! provider kind into a [`ResolutionVisitor`], and the visitor hands the
//! value to a [`Capture<T>`] sink, which is the only place the erased value
//! is converted back to `Arc<T>`.
//!
//! ## Threading
//!
//! [`Registry`] does no synchronization and is `!Sync`; share it across
//! threads only behind your own lock. [`SyncRegistry`] is safe to share and
//! guarantees a singleton factory runs once even under concurrent first use.

mod dynamic;
mod error;
mod key;
mod locator;
#[cfg(feature = "logging")]
pub mod logging;
mod provider;
mod registry;
pub mod slot;
pub mod storage;
pub mod visitor;

pub use dynamic::*;
pub use error::*;
pub use key::*;
pub use locator::*;
pub use provider::*;
pub use registry::*;
pub use visitor::{Capture, CaptureSink, ErasedValue, ResolutionVisitor};

// Re-export for convenience
pub use std::sync::Arc;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        DynamicRegistry, Provider, ProviderKind, Registry, RegistryError, Result, Service,
        ServiceLocator, SyncRegistry, TypeKey, key_of,
    };
    pub use std::sync::Arc;
}
