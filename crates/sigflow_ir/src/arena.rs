//! Dense, id-indexed storage for design entities.
//!
//! Items are only ever appended, so an id stays valid for the lifetime of the
//! arena that issued it.

use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

/// An opaque `u32` key into an [`Arena`].
pub trait ArenaId: Copy {
    /// Creates an id from a raw index.
    fn from_raw(index: u32) -> Self;

    /// Returns the raw index.
    fn as_raw(self) -> u32;
}

/// Append-only vector addressed by typed ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arena<I: ArenaId, T> {
    items: Vec<T>,
    #[serde(skip)]
    _marker: PhantomData<I>,
}

impl<I: ArenaId, T> Default for Arena<I, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: ArenaId, T> Arena<I, T> {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Appends an item and returns its id.
    pub fn alloc(&mut self, item: T) -> I {
        let id = I::from_raw(self.items.len() as u32);
        self.items.push(item);
        id
    }

    /// Id the next [`alloc`](Self::alloc) will return.
    pub fn next_id(&self) -> I {
        I::from_raw(self.items.len() as u32)
    }

    /// Returns the item for `id`, or `None` if the id was not issued here.
    pub fn try_get(&self, id: I) -> Option<&T> {
        self.items.get(id.as_raw() as usize)
    }

    /// Returns true if `id` was issued by this arena.
    pub fn contains(&self, id: I) -> bool {
        (id.as_raw() as usize) < self.items.len()
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True if nothing has been allocated.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates `(id, item)` pairs in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (I, &T)> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, item)| (I::from_raw(i as u32), item))
    }

    /// Iterates items in allocation order.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    /// Iterates items mutably in allocation order.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.items.iter_mut()
    }
}

impl<I: ArenaId, T> Index<I> for Arena<I, T> {
    type Output = T;

    fn index(&self, id: I) -> &T {
        &self.items[id.as_raw() as usize]
    }
}

impl<I: ArenaId, T> IndexMut<I> for Arena<I, T> {
    fn index_mut(&mut self, id: I) -> &mut T {
        &mut self.items[id.as_raw() as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SignalId;

    #[test]
    fn alloc_returns_sequential_ids() {
        let mut arena: Arena<SignalId, &str> = Arena::new();
        assert_eq!(arena.next_id(), SignalId::from_raw(0));
        let a = arena.alloc("clk");
        let b = arena.alloc("rst");
        assert_eq!(a.as_raw(), 0);
        assert_eq!(b.as_raw(), 1);
        assert_eq!(arena[b], "rst");
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn try_get_rejects_foreign_ids() {
        let mut arena: Arena<SignalId, u32> = Arena::new();
        arena.alloc(1);
        assert_eq!(arena.try_get(SignalId::from_raw(0)), Some(&1));
        assert!(arena.try_get(SignalId::from_raw(5)).is_none());
        assert!(!arena.contains(SignalId::from_raw(1)));
    }

    #[test]
    fn index_mut_updates_in_place() {
        let mut arena: Arena<SignalId, Vec<u8>> = Arena::default();
        let id = arena.alloc(Vec::new());
        arena[id].push(3);
        assert_eq!(arena.iter().map(|(_, v)| v.len()).sum::<usize>(), 1);
    }

    #[test]
    fn serde_roundtrip() {
        let mut arena: Arena<SignalId, String> = Arena::new();
        arena.alloc("first".to_string());
        arena.alloc("second".to_string());
        let json = serde_json::to_string(&arena).unwrap();
        let back: Arena<SignalId, String> = serde_json::from_str(&json).unwrap();
        assert_eq!(back[SignalId::from_raw(1)], "second");
    }
}
