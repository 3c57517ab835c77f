//! Slot storage backends
//!
//! A registry keeps its slots in a [`SlotStore`]. Two stores are provided:
//!
//! - [`LocalStore`] - a plain `HashMap` behind a `RefCell`. No synchronization
//!   at all; the store is `!Sync`, so the compiler refuses to share it between
//!   threads.
//! - [`SharedStore`] - a `DashMap`, safe for concurrent registration and
//!   resolution from any number of threads.
//!
//! Both hash `TypeKey`s with `ahash`. Lookups hand out a cloned [`SlotRef`], so
//! no borrow or shard lock is held while a slot runs user code.

use crate::TypeKey;
use crate::slot::SlotRef;
use ahash::RandomState;
use dashmap::DashMap;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

/// Map from service key to slot.
pub trait SlotStore: Default {
    /// Create a store with room for `capacity` slots.
    fn with_capacity(capacity: usize) -> Self;

    /// Get the slot for `key`
    fn lookup(&self, key: &TypeKey) -> Option<SlotRef>;

    /// Insert or replace the slot for `key`, returning the previous one
    fn insert(&self, key: TypeKey, slot: SlotRef) -> Option<SlotRef>;

    /// Replace the slot for `key` only while it is still `current`.
    ///
    /// Returns `false` if the key was removed or re-registered in the meantime.
    fn replace_if_current(&self, key: &TypeKey, current: &SlotRef, replacement: SlotRef) -> bool;

    /// Remove the slot for `key`, returning it
    fn remove(&self, key: &TypeKey) -> Option<SlotRef>;

    /// Remove every slot
    fn clear(&self);

    /// Number of slots
    fn len(&self) -> usize;

    /// Check if empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys of all registered slots, in no particular order
    fn keys(&self) -> Vec<TypeKey>;
}

// =============================================================================
// LocalStore
// =============================================================================

/// Unsynchronized store for single-threaded use.
///
/// The map is only borrowed for the duration of a single map operation.
/// Replaced and removed slots are returned to the caller and dropped after
/// the borrow ends, so a value's `Drop` may touch the same registry.
#[derive(Default)]
pub struct LocalStore {
    slots: RefCell<HashMap<TypeKey, SlotRef, RandomState>>,
}

impl SlotStore for LocalStore {
    #[inline]
    fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: RefCell::new(HashMap::with_capacity_and_hasher(
                capacity,
                RandomState::new(),
            )),
        }
    }

    #[inline]
    fn lookup(&self, key: &TypeKey) -> Option<SlotRef> {
        self.slots.borrow().get(key).cloned()
    }

    #[inline]
    fn insert(&self, key: TypeKey, slot: SlotRef) -> Option<SlotRef> {
        self.slots.borrow_mut().insert(key, slot)
    }

    #[inline]
    fn replace_if_current(&self, key: &TypeKey, current: &SlotRef, replacement: SlotRef) -> bool {
        let mut slots = self.slots.borrow_mut();
        match slots.get_mut(key) {
            Some(slot) if Arc::ptr_eq(slot, current) => {
                // `current` keeps the old slot alive, so nothing is dropped under the borrow
                *slot = replacement;
                true
            }
            _ => false,
        }
    }

    #[inline]
    fn remove(&self, key: &TypeKey) -> Option<SlotRef> {
        self.slots.borrow_mut().remove(key)
    }

    fn clear(&self) {
        let drained = std::mem::take(&mut *self.slots.borrow_mut());
        drop(drained);
    }

    #[inline]
    fn len(&self) -> usize {
        self.slots.borrow().len()
    }

    fn keys(&self) -> Vec<TypeKey> {
        self.slots.borrow().keys().copied().collect()
    }
}

impl std::fmt::Debug for LocalStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalStore")
            .field("count", &self.len())
            .finish()
    }
}

// =============================================================================
// SharedStore
// =============================================================================

/// Thread-safe store backed by `DashMap`.
///
/// Like [`LocalStore`], removed slots are dropped only after the shard locks
/// are released. `clear` removes the keys present when it starts; slots
/// inserted concurrently may survive it.
pub struct SharedStore {
    slots: DashMap<TypeKey, SlotRef, RandomState>,
}

impl SharedStore {
    /// Shard count for an expected number of slots.
    ///
    /// Registries rarely hold more than a few dozen services, so the
    /// `DashMap` default of `num_cpus * 4` shards mostly costs creation time.
    fn shard_amount(capacity: usize) -> usize {
        if capacity <= 16 {
            8
        } else if capacity <= 64 {
            16
        } else {
            32
        }
    }
}

impl Default for SharedStore {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

impl SlotStore for SharedStore {
    #[inline]
    fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: DashMap::with_capacity_and_hasher_and_shard_amount(
                capacity,
                RandomState::new(),
                Self::shard_amount(capacity),
            ),
        }
    }

    #[inline]
    fn lookup(&self, key: &TypeKey) -> Option<SlotRef> {
        self.slots.get(key).map(|slot| Arc::clone(slot.value()))
    }

    #[inline]
    fn insert(&self, key: TypeKey, slot: SlotRef) -> Option<SlotRef> {
        self.slots.insert(key, slot)
    }

    fn replace_if_current(&self, key: &TypeKey, current: &SlotRef, replacement: SlotRef) -> bool {
        match self.slots.get_mut(key) {
            Some(mut slot) if Arc::ptr_eq(slot.value(), current) => {
                *slot.value_mut() = replacement;
                true
            }
            _ => false,
        }
    }

    #[inline]
    fn remove(&self, key: &TypeKey) -> Option<SlotRef> {
        self.slots.remove(key).map(|(_, slot)| slot)
    }

    fn clear(&self) {
        // DashMap::clear drops values under the shard locks
        let drained: Vec<SlotRef> = self
            .keys()
            .iter()
            .filter_map(|key| self.remove(key))
            .collect();
        drop(drained);
    }

    #[inline]
    fn len(&self) -> usize {
        self.slots.len()
    }

    fn keys(&self) -> Vec<TypeKey> {
        self.slots.iter().map(|entry| *entry.key()).collect()
    }
}

impl std::fmt::Debug for SharedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedStore")
            .field("count", &self.len())
            .finish()
    }
}
