//! # Component Storage
//!
//! A registry's component types form a closed set fixed at compile time: the
//! registry is generic over a tuple such as `(Position, Velocity)`, and each
//! tuple element gets one [`Pool`] (its sparse set plus change callbacks).
//!
//! Pools are selected by type through [`Contains`]. The second parameter of
//! `Contains` is a position marker from [`marker`] that the compiler infers,
//! so call sites spell it `_`:
//!
//! ```rust
//! use strata_core::Registry;
//!
//! #[derive(Debug, PartialEq)]
//! struct Position(i32);
//! struct Velocity(i32);
//!
//! let mut registry: Registry<(Position, Velocity)> = Registry::new();
//! let entity = registry.create();
//! registry.add(entity, Position(1));
//! assert!(registry.has::<Position, _>(entity));
//! assert!(!registry.has::<Velocity, _>(entity));
//! ```
//!
//! Any `'static` type can be a component. Naming a type outside the set is a
//! compile error.

use std::any::{type_name, Any};
use std::fmt;

use super::entity::{to_index, Entity};
use super::registry::Registry;
use super::sparse_set::SparseSet;

/// Type-erased change callback stored in a [`Pool`].
///
/// The first argument is the owning registry, downcast back to its concrete
/// type by the wrapper installed in `Registry::on_add`/`on_remove`.
pub(crate) type Callback<T> = Box<dyn FnMut(&(dyn Any + 'static), Entity, &T)>;

/// Storage for one component type.
///
/// Holds the values keyed by slot index and the callbacks registered for
/// the type, in registration order. Callbacks are fired by the registry.
pub struct Pool<T> {
    set: SparseSet<T>,
    on_add: Vec<Callback<T>>,
    on_remove: Vec<Callback<T>>,
}

impl<T: 'static> Pool<T> {
    /// Creates an empty pool with room for `capacity` values.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            set: SparseSet::with_capacity(capacity),
            on_add: Vec::new(),
            on_remove: Vec::new(),
        }
    }

    /// The values stored for this type, keyed by slot index.
    #[inline]
    #[must_use]
    pub fn set(&self) -> &SparseSet<T> {
        &self.set
    }

    #[inline]
    pub(crate) fn set_mut(&mut self) -> &mut SparseSet<T> {
        &mut self.set
    }

    /// Returns true if a value is stored for the entity's slot.
    #[inline]
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.set.has(to_index(entity))
    }

    pub(crate) fn on_add_mut(&mut self) -> &mut Vec<Callback<T>> {
        &mut self.on_add
    }

    pub(crate) fn on_remove_mut(&mut self) -> &mut Vec<Callback<T>> {
        &mut self.on_remove
    }
}

impl<T: 'static> Default for Pool<T> {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

impl<T> fmt::Debug for Pool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("component", &type_name::<T>())
            .field("len", &self.set.len())
            .field("on_add", &self.on_add.len())
            .field("on_remove", &self.on_remove.len())
            .finish()
    }
}

/// A closed set of component types, implemented for tuples of 1 to 8 types.
///
/// Tuple order is the registry-declared order used when removing every
/// component of an entity and when copying entities between registries.
pub trait ComponentSet: Sized + 'static {
    /// One [`Pool`] per component type, in declared order.
    type Pools: 'static;

    /// Creates every pool with room for `capacity` values.
    fn pools_with_capacity(capacity: usize) -> Self::Pools;

    /// Removes every component of the live `entity`, in declared order,
    /// firing the `on_remove` callbacks of each type that had one.
    fn remove_all(registry: &mut Registry<Self>, entity: Entity);

    /// Calls `visitor` once per component type, in declared order.
    fn for_each_type<V: ComponentVisitor<Self>>(registry: &mut Registry<Self>, visitor: &mut V);

    /// Type names of the components, in declared order.
    fn type_names() -> Vec<&'static str>;
}

/// Type-directed access to the [`Pool`] of component `T`.
///
/// `I` is a position marker inferred by the compiler.
pub trait Contains<T, I>: ComponentSet {
    /// The pool of `T`.
    fn pool(pools: &Self::Pools) -> &Pool<T>;

    /// The pool of `T`, mutably.
    fn pool_mut(pools: &mut Self::Pools) -> &mut Pool<T>;
}

/// Generic code run once per component type of a set.
///
/// ```rust
/// use strata_core::{ComponentVisitor, Contains, Registry};
///
/// struct Names(Vec<&'static str>);
///
/// impl<S: strata_core::ComponentSet> ComponentVisitor<S> for Names {
///     fn visit<T: 'static, I>(&mut self, _: &mut Registry<S>)
///     where
///         S: Contains<T, I>,
///     {
///         self.0.push(std::any::type_name::<T>());
///     }
/// }
///
/// let mut registry: Registry<(u8, String)> = Registry::new();
/// let mut names = Names(Vec::new());
/// registry.for_each_type(&mut names);
/// assert_eq!(names.0, vec!["u8", "alloc::string::String"]);
/// ```
pub trait ComponentVisitor<S: ComponentSet> {
    /// Visits component type `T`.
    fn visit<T: 'static, I>(&mut self, registry: &mut Registry<S>)
    where
        S: Contains<T, I>;
}

/// Component sets whose types are all `Clone`, which makes their entities
/// copyable between registries of the same shape.
pub trait CloneComponents: ComponentSet {
    /// Clones every component `entity` carries in `src` onto `target` in
    /// `dst`, in declared order, firing `dst`'s `on_add` callbacks.
    fn clone_components(
        src: &Registry<Self>,
        entity: Entity,
        dst: &mut Registry<Self>,
        target: Entity,
    );
}

/// Position markers for [`Contains`].
pub mod marker {
    /// First tuple element.
    pub enum At0 {}
    /// Second tuple element.
    pub enum At1 {}
    /// Third tuple element.
    pub enum At2 {}
    /// Fourth tuple element.
    pub enum At3 {}
    /// Fifth tuple element.
    pub enum At4 {}
    /// Sixth tuple element.
    pub enum At5 {}
    /// Seventh tuple element.
    pub enum At6 {}
    /// Eighth tuple element.
    pub enum At7 {}
}

macro_rules! impl_component_set {
    (@contains $all:tt $(($T:ident, $idx:tt, $At:ident)),+) => {
        $( impl_component_set!(@one $all $T, $idx, $At); )+
    };
    (@one [$($A:ident),+] $T:ident, $idx:tt, $At:ident) => {
        impl<$($A: 'static),+> Contains<$T, marker::$At> for ($($A,)+) {
            #[inline]
            fn pool(pools: &Self::Pools) -> &Pool<$T> {
                &pools.$idx
            }

            #[inline]
            fn pool_mut(pools: &mut Self::Pools) -> &mut Pool<$T> {
                &mut pools.$idx
            }
        }
    };
    ($(($T:ident, $idx:tt, $At:ident)),+) => {
        impl<$($T: 'static),+> ComponentSet for ($($T,)+) {
            type Pools = ($(Pool<$T>,)+);

            fn pools_with_capacity(capacity: usize) -> Self::Pools {
                ($(Pool::<$T>::with_capacity(capacity),)+)
            }

            fn remove_all(registry: &mut Registry<Self>, entity: Entity) {
                $( registry.detach::<$T, marker::$At>(entity); )+
            }

            fn for_each_type<V: ComponentVisitor<Self>>(
                registry: &mut Registry<Self>,
                visitor: &mut V,
            ) {
                $( visitor.visit::<$T, marker::$At>(registry); )+
            }

            fn type_names() -> Vec<&'static str> {
                vec![$(type_name::<$T>()),+]
            }
        }

        impl<$($T: Clone + 'static),+> CloneComponents for ($($T,)+) {
            fn clone_components(
                src: &Registry<Self>,
                entity: Entity,
                dst: &mut Registry<Self>,
                target: Entity,
            ) {
                $(
                    if let Some(value) = src.get_if::<$T, marker::$At>(entity) {
                        dst.add::<$T, marker::$At>(target, value.clone());
                    }
                )+
            }
        }

        impl_component_set!(@contains [$($T),+] $(($T, $idx, $At)),+);
    };
}

impl_component_set!((A, 0, At0));
impl_component_set!((A, 0, At0), (B, 1, At1));
impl_component_set!((A, 0, At0), (B, 1, At1), (C, 2, At2));
impl_component_set!((A, 0, At0), (B, 1, At1), (C, 2, At2), (D, 3, At3));
impl_component_set!((A, 0, At0), (B, 1, At1), (C, 2, At2), (D, 3, At3), (E, 4, At4));
impl_component_set!(
    (A, 0, At0),
    (B, 1, At1),
    (C, 2, At2),
    (D, 3, At3),
    (E, 4, At4),
    (F, 5, At5)
);
impl_component_set!(
    (A, 0, At0),
    (B, 1, At1),
    (C, 2, At2),
    (D, 3, At3),
    (E, 4, At4),
    (F, 5, At5),
    (G, 6, At6)
);
impl_component_set!(
    (A, 0, At0),
    (B, 1, At1),
    (C, 2, At2),
    (D, 3, At3),
    (E, 4, At4),
    (F, 5, At5),
    (G, 6, At6),
    (H, 7, At7)
);
