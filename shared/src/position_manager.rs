use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::id::PositionId;

/// Refers to a slot in a [`PositionManager`].
///
/// Identity is carried entirely by `id`; `index` is only a hint for where to
/// re-insert the element so an inverse operation can restore ordering.
/// Equality and hashing deliberately ignore the index: two handles naming the
/// same element are interchangeable even when their hints have drifted.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct PositionHandle {
    pub id: PositionId,
    pub index: usize,
}

impl PartialEq for PositionHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for PositionHandle {}

impl Hash for PositionHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Ordered container whose elements keep a stable identity across insertions
/// and removals at other positions.
///
/// Ordering lives in a plain vector of ids; the elements themselves sit in a
/// hash map keyed by id. Index hints in handles are clamped on insertion, so
/// replaying an insert against a shorter sequence degrades to appending
/// rather than failing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PositionManager<T> {
    order: Vec<PositionId>,
    elements: HashMap<PositionId, T>,
}

impl<T> PositionManager<T> {
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            elements: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, handle: PositionHandle) -> bool {
        self.elements.contains_key(&handle.id)
    }

    pub fn get(&self, handle: PositionHandle) -> Option<&T> {
        self.elements.get(&handle.id)
    }

    pub fn get_mut(&mut self, handle: PositionHandle) -> Option<&mut T> {
        self.elements.get_mut(&handle.id)
    }

    /// Returns the element for `handle`, inserting `default()` at the
    /// handle's index hint (clamped to the current length) if absent.
    pub fn get_or_insert_with<F>(&mut self, handle: PositionHandle, default: F) -> &mut T
    where
        F: FnOnce() -> T,
    {
        if !self.elements.contains_key(&handle.id) {
            let index = handle.index.min(self.order.len());
            self.order.insert(index, handle.id);
            self.elements.insert(handle.id, default());
        }
        self.elements
            .get_mut(&handle.id)
            .unwrap_or_else(|| unreachable!("element inserted above"))
    }

    /// Inserts `value` at the handle's index hint, clamped. Replaces any
    /// existing element with the same id without changing its position.
    pub fn insert(&mut self, handle: PositionHandle, value: T) {
        if self.elements.insert(handle.id, value).is_none() {
            let index = handle.index.min(self.order.len());
            self.order.insert(index, handle.id);
        }
    }

    /// Removes the element named by `handle`. Removing an absent element is
    /// a no-op, which makes inverse operations idempotent.
    pub fn remove(&mut self, handle: PositionHandle) -> Option<T> {
        let value = self.elements.remove(&handle.id)?;
        self.order.retain(|id| *id != handle.id);
        Some(value)
    }

    /// Handle for the element currently at `index`, with the index recorded
    /// as its hint.
    pub fn handle_at(&self, index: usize) -> Option<PositionHandle> {
        self.order
            .get(index)
            .map(|id| PositionHandle { id: *id, index })
    }

    /// Current index of the element named by `handle`.
    pub fn index_of(&self, handle: PositionHandle) -> Option<usize> {
        self.order.iter().position(|id| *id == handle.id)
    }

    pub fn handles(&self) -> impl Iterator<Item = PositionHandle> + '_ {
        self.order
            .iter()
            .enumerate()
            .map(|(index, id)| PositionHandle { id: *id, index })
    }

    pub fn iter(&self) -> impl Iterator<Item = (PositionHandle, &T)> {
        self.handles().map(move |handle| {
            let value = self
                .elements
                .get(&handle.id)
                .unwrap_or_else(|| unreachable!("order and elements are kept in sync"));
            (handle, value)
        })
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.order.iter().map(move |id| {
            self.elements
                .get(id)
                .unwrap_or_else(|| unreachable!("order and elements are kept in sync"))
        })
    }
}

impl<T> Default for PositionManager<T> {
    fn default() -> Self {
        Self::new()
    }
}
