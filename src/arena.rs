//! Arena allocation for straight-line program nodes.
//!
//! Provides `VertexId` (a dense, total-orderable identifier) and `VertexArena`
//! (contiguous append-only storage). The arena stores node data of a generic
//! type `T`.
//!
//! # Determinism
//! - `VertexId` ordering is by its inner `u32`.
//! - Identifiers are handed out densely in allocation order, so the same
//!   sequence of allocations always produces the same identifiers.
//! - Nodes are never freed individually; dead nodes disappear when the owning
//!   program is compacted into a fresh arena.

use std::fmt;

/// Dense node identifier for arena-allocated programs.
///
/// `VertexId(u32)` is `Copy`, `Eq`, `Ord`, `Hash`. The inner value is an index
/// into the arena's slot array and is only meaningful for the arena that
/// produced it.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VertexId(u32);

impl VertexId {
    /// Creates a new `VertexId` from a raw `u32`.
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw `u32` index.
    #[inline]
    pub const fn as_u32(&self) -> u32 {
        self.0
    }

    #[inline]
    fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VertexId({})", self.0)
    }
}

/// Contiguous append-only storage for node data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexArena<T> {
    slots: Vec<T>,
}

impl<T> VertexArena<T> {
    /// Creates a new empty arena.
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Allocates a new slot holding `data` and returns its `VertexId`.
    ///
    /// # Panics
    /// Panics if the arena already holds `u32::MAX` nodes.
    pub fn allocate(&mut self, data: T) -> VertexId {
        let idx = u32::try_from(self.slots.len()).expect("vertex arena exhausted");
        self.slots.push(data);
        VertexId(idx)
    }

    /// Returns a reference to the data stored at `id`, if present.
    pub fn get(&self, id: VertexId) -> Option<&T> {
        self.slots.get(id.index())
    }

    /// Returns the number of allocated nodes.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if nothing has been allocated yet.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Iterates over all nodes in allocation order.
    ///
    /// Yields `(VertexId, &T)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (VertexId, &T)> {
        self.slots
            .iter()
            .enumerate()
            .map(|(idx, data)| (VertexId(idx as u32), data))
    }
}

impl<T> Default for VertexArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::ops::Index<VertexId> for VertexArena<T> {
    type Output = T;

    fn index(&self, id: VertexId) -> &T {
        &self.slots[id.index()]
    }
}
