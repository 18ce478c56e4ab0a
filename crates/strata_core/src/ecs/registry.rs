//! # Registry
//!
//! The owner of every entity and component.
//!
//! A [`Registry`] keeps one sparse set of live entity IDs plus one [`Pool`]
//! per component type, all keyed by slot index. A component pool holds an
//! entry for a slot only while the entity set holds a live ID at that slot.
//!
//! ## Slot lifecycle
//!
//! Every slot is either free or live. Destroyed IDs queue up in a FIFO
//! free-list; `create` reuses the oldest one under the next generation, so a
//! stale ID never matches the slot's new occupant.
//!
//! [`Pool`]: super::component::Pool

use std::any::{type_name, Any};
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::mem;

use tracing::{debug, trace};

use super::component::{Callback, CloneComponents, ComponentSet, ComponentVisitor, Contains};
use super::entity::{to_index, Entity, SlotIndex};
use super::handle::{Handle, HandleRef};
use super::query::{query_name, All, Query, View, ViewGet, ViewMut};
use super::sparse_set::{SafeCursor, SparseSet};
use crate::error::{StoreError, StoreResult};

/// Pre-reservation hints for a [`Registry`].
///
/// Capacities never cap growth; they only size the initial allocations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Slots reserved in the live-entity set.
    pub entity_capacity: usize,
    /// Slots reserved in every component pool.
    pub component_capacity: usize,
}

impl RegistryConfig {
    /// Sets the live-entity reservation.
    #[must_use]
    pub const fn with_entity_capacity(mut self, capacity: usize) -> Self {
        self.entity_capacity = capacity;
        self
    }

    /// Sets the per-pool reservation.
    #[must_use]
    pub const fn with_component_capacity(mut self, capacity: usize) -> Self {
        self.component_capacity = capacity;
        self
    }
}

/// Entity and component store over the closed component set `S`.
///
/// # Example
///
/// ```rust
/// use strata_core::Registry;
///
/// struct Position(i32);
/// struct Frozen;
///
/// let mut registry: Registry<(Position, Frozen)> = Registry::new();
/// let a = registry.create();
/// let b = registry.create();
/// registry.add(a, Position(1));
/// registry.add(b, Position(2));
/// registry.add(b, Frozen);
///
/// for (entity, (position,)) in registry.view_get::<(Position,), _>() {
///     assert!(position.0 > 0 && registry.valid(entity));
/// }
/// assert_eq!(registry.view::<(Position, Frozen), _>().count(), 1);
/// ```
pub struct Registry<S: ComponentSet> {
    entities: SparseSet<Entity>,
    free: VecDeque<Entity>,
    pools: S::Pools,
}

/// Panics with the message of a violated precondition.
#[cold]
#[track_caller]
fn fault<T>(err: StoreError) -> T {
    panic!("{err}")
}

impl<S: ComponentSet> Registry<S> {
    /// Creates an empty registry with no reserved capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Creates an empty registry, reserving the capacities in `config`.
    #[must_use]
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            entities: SparseSet::with_capacity(config.entity_capacity),
            free: VecDeque::new(),
            pools: S::pools_with_capacity(config.component_capacity),
        }
    }

    // =========================================================================
    // Callbacks
    // =========================================================================

    /// Registers a callback fired after every future `add`/`emplace` of `T`.
    ///
    /// The callback receives the registry with the value already stored, so
    /// it may read any component of the entity. Callbacks accumulate and fire
    /// in registration order.
    ///
    /// ```rust
    /// use strata_core::Registry;
    ///
    /// struct Health(u32);
    ///
    /// let mut registry: Registry<(Health,)> = Registry::new();
    /// registry.on_add::<Health, _>(|registry, entity, health| {
    ///     assert_eq!(registry.get::<Health, _>(entity).0, health.0);
    /// });
    /// let entity = registry.create();
    /// registry.add(entity, Health(3));
    /// ```
    pub fn on_add<T, I>(&mut self, mut callback: impl FnMut(&Self, Entity, &T) + 'static)
    where
        S: Contains<T, I>,
        T: 'static,
    {
        S::pool_mut(&mut self.pools)
            .on_add_mut()
            .push(Box::new(move |registry: &(dyn Any + 'static), entity: Entity, value: &T| {
                if let Some(registry) = registry.downcast_ref::<Self>() {
                    callback(registry, entity, value);
                }
            }));
    }

    /// Registers a callback fired before every future removal of `T`,
    /// including removals caused by `destroy` and `clear`.
    ///
    /// The value is still stored while the callback runs.
    pub fn on_remove<T, I>(&mut self, mut callback: impl FnMut(&Self, Entity, &T) + 'static)
    where
        S: Contains<T, I>,
        T: 'static,
    {
        S::pool_mut(&mut self.pools)
            .on_remove_mut()
            .push(Box::new(move |registry: &(dyn Any + 'static), entity: Entity, value: &T| {
                if let Some(registry) = registry.downcast_ref::<Self>() {
                    callback(registry, entity, value);
                }
            }));
    }

    /// Visits every component type of `S`, in declared order.
    ///
    /// Lets generic code act per type, such as registering the same kind of
    /// callback on every pool.
    pub fn for_each_type<V: ComponentVisitor<S>>(&mut self, visitor: &mut V) {
        S::for_each_type(self, visitor);
    }

    fn fire_on_add<T, I>(&mut self, entity: Entity)
    where
        S: Contains<T, I>,
        T: 'static,
    {
        let mut callbacks = mem::take(S::pool_mut(&mut self.pools).on_add_mut());
        self.fire::<T, I>(&mut callbacks, entity);
        *S::pool_mut(&mut self.pools).on_add_mut() = callbacks;
    }

    fn fire_on_remove<T, I>(&mut self, entity: Entity)
    where
        S: Contains<T, I>,
        T: 'static,
    {
        let mut callbacks = mem::take(S::pool_mut(&mut self.pools).on_remove_mut());
        self.fire::<T, I>(&mut callbacks, entity);
        *S::pool_mut(&mut self.pools).on_remove_mut() = callbacks;
    }

    fn fire<T, I>(&self, callbacks: &mut [Callback<T>], entity: Entity)
    where
        S: Contains<T, I>,
        T: 'static,
    {
        let any: &(dyn Any + 'static) = self;
        let index = to_index(entity);
        for callback in callbacks {
            let Some(value) = S::pool(&self.pools).set().get(index) else {
                break;
            };
            callback(any, entity, value);
        }
    }

    /// Stores `value` and fires `on_add`. The slot must be vacant.
    fn attach<T, I>(&mut self, entity: Entity, value: T) -> &mut T
    where
        S: Contains<T, I>,
        T: 'static,
    {
        let index = to_index(entity);
        S::pool_mut(&mut self.pools).set_mut().insert(index, value);
        self.fire_on_add::<T, I>(entity);
        S::pool_mut(&mut self.pools)
            .set_mut()
            .get_mut(index)
            .unwrap_or_else(|| {
                fault(StoreError::MissingComponent {
                    entity,
                    component: type_name::<T>(),
                })
            })
    }

    /// Fires `on_remove` and takes the value out, if the entity carries one.
    pub(crate) fn detach<T, I>(&mut self, entity: Entity) -> Option<T>
    where
        S: Contains<T, I>,
        T: 'static,
    {
        if !S::pool(&self.pools).contains(entity) {
            return None;
        }
        self.fire_on_remove::<T, I>(entity);
        trace!(%entity, component = type_name::<T>(), "removed component");
        S::pool_mut(&mut self.pools).set_mut().erase_if_exists(to_index(entity))
    }

    // =========================================================================
    // Entity lifecycle
    // =========================================================================

    /// Creates an entity.
    ///
    /// # Panics
    ///
    /// Panics if every allocatable slot index is live.
    pub fn create(&mut self) -> Entity {
        self.try_create().unwrap_or_else(fault)
    }

    /// Creates an entity, reusing the oldest destroyed slot if there is one.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::SlotsExhausted`] if every allocatable slot index
    /// is live.
    pub fn try_create(&mut self) -> StoreResult<Entity> {
        let entity = match self.free.pop_front() {
            Some(dead) => dead.next_generation(),
            None => {
                // No free slot means slots 0..len are all live.
                let index = SlotIndex::try_from(self.entities.len())
                    .ok()
                    .filter(|&index| index <= Entity::MAX_INDEX)
                    .ok_or(StoreError::SlotsExhausted)?;
                Entity::combine(index, 0)
            }
        };

        self.entities.insert(to_index(entity), entity);
        trace!(%entity, "created entity");
        Ok(entity)
    }

    /// Returns true if `entity` is the live occupant of its slot. Never fails.
    #[inline]
    #[must_use]
    pub fn valid(&self, entity: Entity) -> bool {
        !entity.is_null() && self.entities.get(to_index(entity)) == Some(&entity)
    }

    fn check(&self, entity: Entity) -> StoreResult<()> {
        if self.valid(entity) {
            Ok(())
        } else {
            Err(StoreError::StaleEntity(entity))
        }
    }

    /// Destroys an entity, removing its components in declared order.
    ///
    /// # Panics
    ///
    /// Panics if `entity` is not alive.
    pub fn destroy(&mut self, entity: Entity) {
        self.try_destroy(entity).unwrap_or_else(fault);
    }

    /// Destroys an entity.
    ///
    /// Every component is removed first, firing its `on_remove` callbacks
    /// while the value is still readable. The ID then joins the back of the
    /// free-list.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::StaleEntity`] if `entity` is not alive.
    pub fn try_destroy(&mut self, entity: Entity) -> StoreResult<()> {
        self.check(entity)?;
        S::remove_all(self, entity);
        self.free.push_back(entity);
        self.entities.erase_if_exists(to_index(entity));
        trace!(%entity, "destroyed entity");
        Ok(())
    }

    /// Destroys each entity of `batch` in order.
    ///
    /// # Panics
    ///
    /// Panics if any entity is not alive or appears twice. Nothing is
    /// destroyed in that case.
    pub fn destroy_batch(&mut self, batch: &[Entity]) {
        self.try_destroy_batch(batch).unwrap_or_else(fault);
    }

    /// Destroys each entity of `batch` in order, after checking the whole
    /// batch.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::StaleEntity`] naming the first entity that is
    /// not alive or repeats an earlier one. The registry is left untouched.
    pub fn try_destroy_batch(&mut self, batch: &[Entity]) -> StoreResult<()> {
        let mut seen = HashSet::with_capacity(batch.len());
        for &entity in batch {
            self.check(entity)?;
            if !seen.insert(entity) {
                return Err(StoreError::StaleEntity(entity));
            }
        }
        for &entity in batch {
            self.try_destroy(entity)?;
        }
        debug!(count = batch.len(), "destroyed entity batch");
        Ok(())
    }

    /// Number of live entities.
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.entities.len()
    }

    /// Returns true if no entity is alive.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Destroys every live entity.
    ///
    /// `on_remove` callbacks fire for every attached component, and every ID
    /// goes through the free-list, so none of them becomes valid again.
    pub fn clear(&mut self) {
        let count = self.entities.len();
        let mut cursor = SafeCursor::new();
        while let Some(index) = cursor.next_index(&self.entities) {
            if let Some(&entity) = self.entities.get(index) {
                self.destroy(entity);
            }
        }
        debug!(count, "cleared registry");
    }

    /// The live ID occupying `index`, if any.
    #[must_use]
    pub fn entity_at(&self, index: SlotIndex) -> Option<Entity> {
        self.entities.get(index as usize).copied()
    }

    // =========================================================================
    // Components
    // =========================================================================

    fn vacant<T, I>(&self, entity: Entity) -> StoreResult<()>
    where
        S: Contains<T, I>,
        T: 'static,
    {
        self.check(entity)?;
        if S::pool(&self.pools).contains(entity) {
            return Err(StoreError::DuplicateComponent {
                entity,
                component: type_name::<T>(),
            });
        }
        Ok(())
    }

    /// Attaches `value` to `entity`.
    ///
    /// # Panics
    ///
    /// Panics if `entity` is not alive or already carries a `T`.
    pub fn add<T, I>(&mut self, entity: Entity, value: T) -> &mut T
    where
        S: Contains<T, I>,
        T: 'static,
    {
        self.try_add(entity, value).unwrap_or_else(fault)
    }

    /// Attaches `value` to `entity`, then fires the `on_add` callbacks of `T`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::StaleEntity`] or
    /// [`StoreError::DuplicateComponent`] without storing anything.
    pub fn try_add<T, I>(&mut self, entity: Entity, value: T) -> StoreResult<&mut T>
    where
        S: Contains<T, I>,
        T: 'static,
    {
        self.vacant::<T, I>(entity)?;
        trace!(%entity, component = type_name::<T>(), "added component");
        Ok(self.attach::<T, I>(entity, value))
    }

    /// Attaches the value built by `ctor`, which only runs once the
    /// preconditions of [`Registry::add`] hold.
    ///
    /// # Panics
    ///
    /// Panics if `entity` is not alive or already carries a `T`.
    pub fn emplace<T, I>(&mut self, entity: Entity, ctor: impl FnOnce() -> T) -> &mut T
    where
        S: Contains<T, I>,
        T: 'static,
    {
        self.vacant::<T, I>(entity).unwrap_or_else(fault);
        trace!(%entity, component = type_name::<T>(), "added component");
        let value = ctor();
        self.attach::<T, I>(entity, value)
    }

    /// Attaches `value`, replacing and returning the previous `T` if any.
    ///
    /// A replaced value fires `on_remove` before the new one fires `on_add`.
    ///
    /// # Panics
    ///
    /// Panics if `entity` is not alive.
    pub fn replace<T, I>(&mut self, entity: Entity, value: T) -> Option<T>
    where
        S: Contains<T, I>,
        T: 'static,
    {
        self.check(entity).unwrap_or_else(fault);
        let previous = self.detach::<T, I>(entity);
        if previous.is_some() {
            trace!(%entity, component = type_name::<T>(), "replaced component");
        } else {
            trace!(%entity, component = type_name::<T>(), "added component");
        }
        self.attach::<T, I>(entity, value);
        previous
    }

    /// Detaches and returns the `T` of `entity`; no-op if it has none.
    ///
    /// # Panics
    ///
    /// Panics if `entity` is not alive.
    pub fn remove<T, I>(&mut self, entity: Entity) -> Option<T>
    where
        S: Contains<T, I>,
        T: 'static,
    {
        self.try_remove(entity).unwrap_or_else(fault)
    }

    /// Detaches the `T` of `entity`, firing its `on_remove` callbacks before
    /// the value is erased.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::StaleEntity`] if `entity` is not alive.
    pub fn try_remove<T, I>(&mut self, entity: Entity) -> StoreResult<Option<T>>
    where
        S: Contains<T, I>,
        T: 'static,
    {
        self.check(entity)?;
        Ok(self.detach::<T, I>(entity))
    }

    /// Detaches every component of `entity`, in declared order.
    ///
    /// # Panics
    ///
    /// Panics if `entity` is not alive.
    pub fn remove_all_components(&mut self, entity: Entity) {
        self.check(entity).unwrap_or_else(fault);
        S::remove_all(self, entity);
    }

    /// Returns true if `entity` is alive and carries a `T`. Never fails.
    #[inline]
    #[must_use]
    pub fn has<T, I>(&self, entity: Entity) -> bool
    where
        S: Contains<T, I>,
        T: 'static,
    {
        self.valid(entity) && S::pool(&self.pools).contains(entity)
    }

    /// Returns true if `entity` is alive and carries every type of `Q`.
    #[must_use]
    pub fn has_all<Q, I>(&self, entity: Entity) -> bool
    where
        Q: Query<S, I>,
    {
        self.valid(entity) && Q::has_all(&self.pools, to_index(entity))
    }

    /// Returns true if `entity` is alive and carries any type of `Q`.
    #[must_use]
    pub fn has_any<Q, I>(&self, entity: Entity) -> bool
    where
        Q: Query<S, I>,
    {
        self.valid(entity) && Q::has_any(&self.pools, to_index(entity))
    }

    /// The `T` of `entity`.
    ///
    /// # Panics
    ///
    /// Panics if `entity` is not alive or carries no `T`.
    #[must_use]
    pub fn get<T, I>(&self, entity: Entity) -> &T
    where
        S: Contains<T, I>,
        T: 'static,
    {
        self.try_get(entity).unwrap_or_else(fault)
    }

    /// The `T` of `entity`, mutably.
    ///
    /// # Panics
    ///
    /// Panics if `entity` is not alive or carries no `T`.
    pub fn get_mut<T, I>(&mut self, entity: Entity) -> &mut T
    where
        S: Contains<T, I>,
        T: 'static,
    {
        self.try_get_mut(entity).unwrap_or_else(fault)
    }

    /// The `T` of `entity`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::StaleEntity`] or [`StoreError::MissingComponent`].
    pub fn try_get<T, I>(&self, entity: Entity) -> StoreResult<&T>
    where
        S: Contains<T, I>,
        T: 'static,
    {
        self.check(entity)?;
        S::pool(&self.pools)
            .set()
            .get(to_index(entity))
            .ok_or(StoreError::MissingComponent {
                entity,
                component: type_name::<T>(),
            })
    }

    /// The `T` of `entity`, mutably.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::StaleEntity`] or [`StoreError::MissingComponent`].
    pub fn try_get_mut<T, I>(&mut self, entity: Entity) -> StoreResult<&mut T>
    where
        S: Contains<T, I>,
        T: 'static,
    {
        self.check(entity)?;
        S::pool_mut(&mut self.pools)
            .set_mut()
            .get_mut(to_index(entity))
            .ok_or(StoreError::MissingComponent {
                entity,
                component: type_name::<T>(),
            })
    }

    /// The `T` of `entity`, or `None` if it is not alive or has none.
    #[must_use]
    pub fn get_if<T, I>(&self, entity: Entity) -> Option<&T>
    where
        S: Contains<T, I>,
        T: 'static,
    {
        self.try_get(entity).ok()
    }

    /// The `T` of `entity` mutably, or `None` if it is not alive or has none.
    pub fn get_if_mut<T, I>(&mut self, entity: Entity) -> Option<&mut T>
    where
        S: Contains<T, I>,
        T: 'static,
    {
        self.try_get_mut(entity).ok()
    }

    /// One reference per type of `Q`, in the order requested.
    ///
    /// # Panics
    ///
    /// Panics if `entity` is not alive or lacks any type of `Q`.
    #[must_use]
    pub fn get_all<Q, I>(&self, entity: Entity) -> Q::Refs<'_>
    where
        Q: Query<S, I>,
    {
        self.try_get_all::<Q, I>(entity).unwrap_or_else(fault)
    }

    /// One reference per type of `Q`, in the order requested.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::StaleEntity`] or [`StoreError::MissingComponent`]
    /// naming the whole query.
    pub fn try_get_all<Q, I>(&self, entity: Entity) -> StoreResult<Q::Refs<'_>>
    where
        Q: Query<S, I>,
    {
        self.check(entity)?;
        Q::fetch(&self.pools, to_index(entity)).ok_or(StoreError::MissingComponent {
            entity,
            component: query_name::<Q>(),
        })
    }

    /// Type names of the component set, in declared order.
    #[must_use]
    pub fn component_names(&self) -> Vec<&'static str> {
        S::type_names()
    }

    // =========================================================================
    // Iteration
    // =========================================================================

    /// Every live entity.
    pub fn all(&self) -> All<'_> {
        All::new(&self.entities)
    }

    /// Live entities carrying every type of `Q`, driven by the first type.
    pub fn view<Q, I>(&self) -> View<'_, S, Q, I>
    where
        Q: Query<S, I>,
    {
        View::new(&self.entities, &self.pools)
    }

    /// [`Registry::view`] paired with [`Registry::get_all`] per entity.
    pub fn view_get<Q, I>(&self) -> ViewGet<'_, S, Q, I>
    where
        Q: Query<S, I>,
    {
        ViewGet::new(&self.entities, &self.pools)
    }

    /// Every `(entity, &mut T)` pair, in the pool's packed order.
    pub fn view_mut<T, I>(&mut self) -> ViewMut<'_, T>
    where
        S: Contains<T, I>,
        T: 'static,
    {
        let values = S::pool_mut(&mut self.pools).set_mut().fast_mut();
        ViewMut::new(&self.entities, values)
    }

    /// Destroys every entity of `view::<Q>()` accepted by `predicate` and
    /// returns how many were destroyed.
    ///
    /// The matches are collected before the first destroy.
    pub fn destroy_if<Q, I, F>(&mut self, mut predicate: F) -> usize
    where
        Q: Query<S, I>,
        F: FnMut(&Self, Entity) -> bool,
    {
        let this = &*self;
        let doomed: Vec<Entity> = this
            .view::<Q, I>()
            .filter(|&entity| predicate(this, entity))
            .collect();

        for &entity in &doomed {
            self.destroy(entity);
        }
        debug!(count = doomed.len(), query = query_name::<Q>(), "destroyed matching entities");
        doomed.len()
    }

    /// The first entity of `view::<Q>()` accepted by `predicate`, or
    /// [`Entity::NULL`]. Never fails.
    #[must_use]
    pub fn find<Q, I, F>(&self, mut predicate: F) -> Entity
    where
        Q: Query<S, I>,
        F: FnMut(&Self, Entity) -> bool,
    {
        self.view::<Q, I>()
            .find(|&entity| predicate(self, entity))
            .unwrap_or(Entity::NULL)
    }

    /// The first entity of `view::<Q>()`, or [`Entity::NULL`].
    #[must_use]
    pub fn first<Q, I>(&self) -> Entity
    where
        Q: Query<S, I>,
    {
        self.view::<Q, I>().next().unwrap_or(Entity::NULL)
    }

    // =========================================================================
    // Handles
    // =========================================================================

    /// Creates an entity and returns a handle to it.
    ///
    /// # Panics
    ///
    /// Panics if every allocatable slot index is live.
    pub fn spawn(&mut self) -> Handle<'_, S> {
        let entity = self.create();
        Handle::new(self, entity)
    }

    /// Wraps `entity` in a mutable handle. The ID is not checked.
    pub fn handle(&mut self, entity: Entity) -> Handle<'_, S> {
        Handle::new(self, entity)
    }

    /// Wraps `entity` in a shared handle. The ID is not checked.
    pub fn handle_ref(&self, entity: Entity) -> HandleRef<'_, S> {
        HandleRef::new(self, entity)
    }
}

/// Copies `entity` from `src` into a new entity of `dst`.
///
/// Every component `entity` carries is cloned in declared order. Only the
/// `on_add` callbacks of `dst` fire.
///
/// # Panics
///
/// Panics if `entity` is not alive in `src`, or if `dst` has no free slot.
pub fn copy<S: CloneComponents>(entity: Entity, src: &Registry<S>, dst: &mut Registry<S>) -> Entity {
    src.check(entity).unwrap_or_else(fault);
    let target = dst.create();
    S::clone_components(src, entity, dst, target);
    debug!(%entity, %target, "copied entity");
    target
}

impl<S: ComponentSet> Default for Registry<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ComponentSet> Drop for Registry<S> {
    fn drop(&mut self) {
        if !self.is_empty() {
            self.clear();
        }
    }
}

impl<S: ComponentSet> fmt::Debug for Registry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("size", &self.size())
            .field("free", &self.free.len())
            .field("components", &S::type_names())
            .finish()
    }
}
