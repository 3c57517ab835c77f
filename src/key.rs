//! Type identity keys
//!
//! A [`TypeKey`] is the exact identity of a service type. It wraps
//! [`TypeId`], so two distinct types never compare equal, and carries the
//! type name along for diagnostics only.

use std::any::TypeId;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identity of a service type, usable as a map key.
///
/// Equality, ordering and hashing only look at the [`TypeId`].
///
/// # Examples
///
/// ```rust
/// use service_registry::{key_of, TypeKey};
///
/// assert_eq!(key_of::<u32>(), TypeKey::of::<u32>());
/// assert_ne!(key_of::<u32>(), key_of::<i32>());
/// ```
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Key for the service type `T`.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The underlying `TypeId`.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// Human-readable type name (not guaranteed unique or stable across compilers).
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.name
    }
}

/// Key for the service type `T`. Shorthand for [`TypeKey::of`].
#[inline]
pub fn key_of<T: ?Sized + 'static>() -> TypeKey {
    TypeKey::of::<T>()
}

impl PartialEq for TypeKey {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for TypeKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypeKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeKey").field(&self.name).finish()
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
