//! # STRATA Core
//!
//! Embeddable, single-threaded entity/component store built on sparse sets:
//! - O(1) create, destroy, add, remove and lookup
//! - Generational entity IDs that never alias a recycled slot
//! - Per-type add/remove callbacks
//! - Lazy views filtered by component type
//!
//! ## Example
//!
//! ```rust
//! use strata_core::{Entity, Registry};
//!
//! #[derive(Debug, PartialEq)]
//! struct Position { x: i32 }
//! struct Velocity { dx: i32 }
//!
//! let mut registry: Registry<(Position, Velocity)> = Registry::new();
//! let e1 = registry.create();
//! let e2 = registry.create();
//! registry.add(e1, Position { x: 1 });
//! registry.add(e2, Velocity { dx: 1 });
//!
//! let moving: Vec<Entity> = registry.view::<(Velocity,), _>().collect();
//! assert_eq!(moving, vec![e2]);
//!
//! registry.destroy(e2);
//! assert_eq!(registry.size(), 1);
//! ```
//!
//! ## Threading
//!
//! A [`Registry`] is not synchronized. Callbacks are boxed `FnMut` closures
//! without a `Send` bound, so a registry stays on the thread that built it;
//! hosts that need several threads keep one registry per thread.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod ecs;
pub mod error;

pub use ecs::{
    copy, CloneComponents, ComponentSet, ComponentVisitor, Contains, Entity, Handle, HandleRef,
    Query, Registry, RegistryConfig, SafeCursor, SparseSet,
};
pub use error::{StoreError, StoreResult};
