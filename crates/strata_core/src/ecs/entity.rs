//! # Entity Identity
//!
//! Entities are lightweight identifiers consisting of:
//! - A slot index, recycled after the entity is destroyed
//! - A generation counter that tells successive occupants of a slot apart

use std::fmt;

use bytemuck::{Pod, Zeroable};

/// Recyclable positional part of an [`Entity`].
pub type SlotIndex = u32;

/// Generation counter of an [`Entity`].
pub type Generation = u32;

/// Unique identifier for an entity.
///
/// The ID is split into two parts:
/// - Upper 32 bits: Slot index into the registry's sparse sets
/// - Lower 32 bits: Generation counter for detecting stale references
///
/// Slot index `u32::MAX` is never handed out by a registry, which keeps
/// [`Entity::NULL`] apart from every live identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Pod, Zeroable)]
#[repr(transparent)]
pub struct Entity(u64);

impl Entity {
    /// Null/invalid entity ID. Never refers to a live entity.
    pub const NULL: Self = Self(u64::MAX);

    /// Largest slot index a registry may allocate.
    pub const MAX_INDEX: SlotIndex = SlotIndex::MAX - 1;

    /// Packs a slot index and a generation into an entity ID.
    ///
    /// This is the inverse of [`Entity::split`].
    #[inline]
    #[must_use]
    pub const fn combine(index: SlotIndex, generation: Generation) -> Self {
        Self(((index as u64) << 32) | (generation as u64))
    }

    /// Unpacks the entity ID into `(slot_index, generation)`.
    #[inline]
    #[must_use]
    pub const fn split(self) -> (SlotIndex, Generation) {
        (self.index(), self.generation())
    }

    /// Returns the slot index portion of the entity ID.
    #[inline]
    #[must_use]
    pub const fn index(self) -> SlotIndex {
        (self.0 >> 32) as SlotIndex
    }

    /// Returns the generation portion of the entity ID.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> Generation {
        self.0 as Generation
    }

    /// Checks if this entity ID is null/invalid.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == u64::MAX
    }

    /// Returns the raw 64-bit representation.
    #[inline]
    #[must_use]
    pub const fn to_bits(self) -> u64 {
        self.0
    }

    /// Rebuilds an entity ID from its raw 64-bit representation.
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    /// Returns the next occupant of this slot.
    ///
    /// The generation wraps on overflow.
    #[inline]
    #[must_use]
    pub(crate) const fn next_generation(self) -> Self {
        Self::combine(self.index(), self.generation().wrapping_add(1))
    }
}

/// Convenience projection onto the slot index, usable as a sparse-set key.
#[inline]
#[must_use]
pub const fn to_index(entity: Entity) -> usize {
    entity.index() as usize
}

impl Default for Entity {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            f.write_str("null")
        } else {
            write!(f, "{}v{}", self.index(), self.generation())
        }
    }
}
