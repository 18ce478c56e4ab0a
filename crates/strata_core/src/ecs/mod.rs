//! # Entity Component Store
//!
//! A sparse-set entity/component store.
//!
//! ## Design
//!
//! - Every component type lives in its own sparse set keyed by slot index
//! - Entity IDs are slot indices with generation counters
//! - The component set is a tuple fixed at compile time, so pool lookup is
//!   resolved statically
//! - Views drive iteration from the first queried type's packed array

mod component;
mod entity;
mod handle;
mod query;
mod registry;
mod sparse_set;

pub use component::{marker, CloneComponents, ComponentSet, ComponentVisitor, Contains, Pool};
pub use entity::{to_index, Entity, Generation, SlotIndex};
pub use handle::{Handle, HandleRef};
pub use query::{All, Query, View, ViewGet, ViewMut};
pub use registry::{copy, Registry, RegistryConfig};
pub use sparse_set::{Iter, IterMut, Keys, Safe, SafeCursor, SparseSet};
