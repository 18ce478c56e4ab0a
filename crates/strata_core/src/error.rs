//! # Store Error Types
//!
//! Precondition violations surfaced as values by the `try_` operations.
//!
//! These are programming errors, not runtime conditions: callers are expected
//! to check [`Registry::valid`](crate::Registry::valid) and
//! [`Registry::has`](crate::Registry::has) first. The panicking forms of the
//! same operations panic with the `Display` text of these variants.

use thiserror::Error;

use crate::ecs::Entity;

/// Errors raised when an operation's precondition does not hold.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Inserted into a sparse-set slot that already holds a value.
    #[error("slot {index} is already occupied")]
    Occupied {
        /// The occupied index.
        index: usize,
    },

    /// Accessed or erased a sparse-set slot that holds no value.
    #[error("slot {index} is empty")]
    Vacant {
        /// The vacant index.
        index: usize,
    },

    /// Used an identifier that is null, destroyed, or from another generation.
    #[error("entity {0} is not alive")]
    StaleEntity(Entity),

    /// Read or removed a component the entity does not carry.
    #[error("entity {entity} has no `{component}` component")]
    MissingComponent {
        /// The entity that was queried.
        entity: Entity,
        /// Type name of the missing component.
        component: &'static str,
    },

    /// Added a component the entity already carries.
    #[error("entity {entity} already has a `{component}` component")]
    DuplicateComponent {
        /// The entity that was targeted.
        entity: Entity,
        /// Type name of the duplicated component.
        component: &'static str,
    },

    /// Every allocatable slot index is live.
    #[error("entity slot indices exhausted")]
    SlotsExhausted,
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
