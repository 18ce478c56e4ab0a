//! # Entity Handles
//!
//! A handle pairs a registry borrow with one entity ID so call sites can
//! write `handle.add(Position(1))` instead of `registry.add(id, Position(1))`.
//!
//! [`Handle`] borrows the registry mutably and forwards every entity-keyed
//! operation. [`HandleRef`] borrows it immutably, is `Copy`, and forwards the
//! read-only subset.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ptr;

use super::component::{ComponentSet, Contains};
use super::entity::Entity;
use super::query::Query;
use super::registry::Registry;

/// Mutable handle to one entity of a [`Registry`].
///
/// ```rust
/// use strata_core::Registry;
///
/// #[derive(Debug, PartialEq)]
/// struct Health(u32);
///
/// let mut registry: Registry<(Health,)> = Registry::new();
/// let mut player = registry.spawn();
/// player.add(Health(10));
/// player.get_mut::<Health, _>().0 -= 3;
/// assert_eq!(player.get::<Health, _>(), &Health(7));
/// ```
pub struct Handle<'r, S: ComponentSet> {
    registry: &'r mut Registry<S>,
    entity: Entity,
}

impl<'r, S: ComponentSet> Handle<'r, S> {
    /// Wraps `entity`. The ID is not checked.
    pub fn new(registry: &'r mut Registry<S>, entity: Entity) -> Self {
        Self { registry, entity }
    }

    /// The wrapped ID.
    #[inline]
    #[must_use]
    pub fn entity(&self) -> Entity {
        self.entity
    }

    /// The registry, for operations not keyed by this entity.
    pub fn registry(&mut self) -> &mut Registry<S> {
        self.registry
    }

    /// A shared handle to the same entity.
    #[must_use]
    pub fn shared(&self) -> HandleRef<'_, S> {
        HandleRef::new(self.registry, self.entity)
    }

    /// See [`Registry::valid`].
    #[must_use]
    pub fn valid(&self) -> bool {
        self.registry.valid(self.entity)
    }

    /// See [`Registry::destroy`]. Consumes the handle.
    ///
    /// # Panics
    ///
    /// Panics if the entity is not alive.
    pub fn destroy(self) {
        self.registry.destroy(self.entity);
    }

    /// See [`Registry::add`].
    ///
    /// # Panics
    ///
    /// Panics if the entity is not alive or already carries a `T`.
    pub fn add<T, I>(&mut self, value: T) -> &mut T
    where
        S: Contains<T, I>,
        T: 'static,
    {
        self.registry.add::<T, I>(self.entity, value)
    }

    /// See [`Registry::emplace`].
    ///
    /// # Panics
    ///
    /// Panics if the entity is not alive or already carries a `T`.
    pub fn emplace<T, I>(&mut self, ctor: impl FnOnce() -> T) -> &mut T
    where
        S: Contains<T, I>,
        T: 'static,
    {
        self.registry.emplace::<T, I>(self.entity, ctor)
    }

    /// See [`Registry::replace`].
    ///
    /// # Panics
    ///
    /// Panics if the entity is not alive.
    pub fn replace<T, I>(&mut self, value: T) -> Option<T>
    where
        S: Contains<T, I>,
        T: 'static,
    {
        self.registry.replace::<T, I>(self.entity, value)
    }

    /// See [`Registry::remove`].
    ///
    /// # Panics
    ///
    /// Panics if the entity is not alive.
    pub fn remove<T, I>(&mut self) -> Option<T>
    where
        S: Contains<T, I>,
        T: 'static,
    {
        self.registry.remove::<T, I>(self.entity)
    }

    /// See [`Registry::remove_all_components`].
    ///
    /// # Panics
    ///
    /// Panics if the entity is not alive.
    pub fn remove_all_components(&mut self) {
        self.registry.remove_all_components(self.entity);
    }

    /// See [`Registry::has`].
    #[must_use]
    pub fn has<T, I>(&self) -> bool
    where
        S: Contains<T, I>,
        T: 'static,
    {
        self.registry.has::<T, I>(self.entity)
    }

    /// See [`Registry::has_all`].
    #[must_use]
    pub fn has_all<Q, I>(&self) -> bool
    where
        Q: Query<S, I>,
    {
        self.registry.has_all::<Q, I>(self.entity)
    }

    /// See [`Registry::has_any`].
    #[must_use]
    pub fn has_any<Q, I>(&self) -> bool
    where
        Q: Query<S, I>,
    {
        self.registry.has_any::<Q, I>(self.entity)
    }

    /// See [`Registry::get`].
    ///
    /// # Panics
    ///
    /// Panics if the entity is not alive or carries no `T`.
    #[must_use]
    pub fn get<T, I>(&self) -> &T
    where
        S: Contains<T, I>,
        T: 'static,
    {
        self.registry.get::<T, I>(self.entity)
    }

    /// See [`Registry::get_mut`].
    ///
    /// # Panics
    ///
    /// Panics if the entity is not alive or carries no `T`.
    pub fn get_mut<T, I>(&mut self) -> &mut T
    where
        S: Contains<T, I>,
        T: 'static,
    {
        self.registry.get_mut::<T, I>(self.entity)
    }

    /// See [`Registry::get_if`].
    #[must_use]
    pub fn get_if<T, I>(&self) -> Option<&T>
    where
        S: Contains<T, I>,
        T: 'static,
    {
        self.registry.get_if::<T, I>(self.entity)
    }

    /// See [`Registry::get_if_mut`].
    pub fn get_if_mut<T, I>(&mut self) -> Option<&mut T>
    where
        S: Contains<T, I>,
        T: 'static,
    {
        self.registry.get_if_mut::<T, I>(self.entity)
    }

    /// See [`Registry::get_all`].
    ///
    /// # Panics
    ///
    /// Panics if the entity is not alive or lacks any type of `Q`.
    #[must_use]
    pub fn get_all<Q, I>(&self) -> Q::Refs<'_>
    where
        Q: Query<S, I>,
    {
        self.registry.get_all::<Q, I>(self.entity)
    }
}

impl<S: ComponentSet> PartialEq for Handle<'_, S> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(&*self.registry, &*other.registry) && self.entity == other.entity
    }
}

impl<S: ComponentSet> Eq for Handle<'_, S> {}

impl<S: ComponentSet> Hash for Handle<'_, S> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.entity.hash(state);
    }
}

impl<S: ComponentSet> fmt::Debug for Handle<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handle").field(&self.entity).finish()
    }
}

/// Shared, copyable handle to one entity of a [`Registry`].
pub struct HandleRef<'r, S: ComponentSet> {
    registry: &'r Registry<S>,
    entity: Entity,
}

impl<'r, S: ComponentSet> HandleRef<'r, S> {
    /// Wraps `entity`. The ID is not checked.
    pub fn new(registry: &'r Registry<S>, entity: Entity) -> Self {
        Self { registry, entity }
    }

    /// The wrapped ID.
    #[inline]
    #[must_use]
    pub fn entity(self) -> Entity {
        self.entity
    }

    /// The registry.
    #[must_use]
    pub fn registry(self) -> &'r Registry<S> {
        self.registry
    }

    /// See [`Registry::valid`].
    #[must_use]
    pub fn valid(self) -> bool {
        self.registry.valid(self.entity)
    }

    /// See [`Registry::has`].
    #[must_use]
    pub fn has<T, I>(self) -> bool
    where
        S: Contains<T, I>,
        T: 'static,
    {
        self.registry.has::<T, I>(self.entity)
    }

    /// See [`Registry::has_all`].
    #[must_use]
    pub fn has_all<Q, I>(self) -> bool
    where
        Q: Query<S, I>,
    {
        self.registry.has_all::<Q, I>(self.entity)
    }

    /// See [`Registry::has_any`].
    #[must_use]
    pub fn has_any<Q, I>(self) -> bool
    where
        Q: Query<S, I>,
    {
        self.registry.has_any::<Q, I>(self.entity)
    }

    /// See [`Registry::get`]. The reference outlives the handle.
    ///
    /// # Panics
    ///
    /// Panics if the entity is not alive or carries no `T`.
    #[must_use]
    pub fn get<T, I>(self) -> &'r T
    where
        S: Contains<T, I>,
        T: 'static,
    {
        self.registry.get::<T, I>(self.entity)
    }

    /// See [`Registry::get_if`].
    #[must_use]
    pub fn get_if<T, I>(self) -> Option<&'r T>
    where
        S: Contains<T, I>,
        T: 'static,
    {
        self.registry.get_if::<T, I>(self.entity)
    }

    /// See [`Registry::get_all`].
    ///
    /// # Panics
    ///
    /// Panics if the entity is not alive or lacks any type of `Q`.
    #[must_use]
    pub fn get_all<Q, I>(self) -> Q::Refs<'r>
    where
        Q: Query<S, I>,
    {
        self.registry.get_all::<Q, I>(self.entity)
    }
}

impl<S: ComponentSet> Clone for HandleRef<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: ComponentSet> Copy for HandleRef<'_, S> {}

impl<S: ComponentSet> PartialEq for HandleRef<'_, S> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.registry, other.registry) && self.entity == other.entity
    }
}

impl<S: ComponentSet> Eq for HandleRef<'_, S> {}

impl<S: ComponentSet> Hash for HandleRef<'_, S> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.entity.hash(state);
    }
}

impl<S: ComponentSet> fmt::Debug for HandleRef<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HandleRef").field(&self.entity).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[derive(Debug, PartialEq)]
    struct Name(&'static str);

    #[derive(Debug, PartialEq)]
    struct Score(u32);

    #[test]
    fn test_handle_forwards_to_registry() {
        let mut registry: Registry<(Name, Score)> = Registry::new();
        let entity = {
            let mut handle = registry.spawn();
            handle.add(Name("ada"));
            handle.emplace(|| Score(1));
            assert!(handle.has_all::<(Name, Score), _>());
            assert_eq!(handle.replace(Score(5)), Some(Score(1)));
            assert_eq!(handle.remove::<Name, _>(), Some(Name("ada")));
            assert!(!handle.has::<Name, _>());
            handle.entity()
        };

        assert_eq!(registry.get::<Score, _>(entity), &Score(5));
        registry.handle(entity).destroy();
        assert!(!registry.valid(entity));
    }

    #[test]
    fn test_handle_ref_outlives_itself() {
        let mut registry: Registry<(Name, Score)> = Registry::new();
        let entity = registry.create();
        registry.add(entity, Name("bo"));

        let name = {
            let handle = registry.handle_ref(entity);
            let copy = handle;
            assert!(copy.valid());
            assert!(copy.has_any::<(Score, Name), _>());
            assert!(copy.get_if::<Score, _>().is_none());
            handle.get::<Name, _>()
        };
        assert_eq!(name, &Name("bo"));
    }

    #[test]
    fn test_handle_ref_equality_and_hash() {
        let mut first: Registry<(Name,)> = Registry::new();
        let a = first.create();
        let b = first.create();
        let second: Registry<(Name,)> = Registry::new();

        assert_eq!(first.handle_ref(a), first.handle_ref(a));
        assert_ne!(first.handle_ref(a), first.handle_ref(b));
        assert_ne!(first.handle_ref(a), second.handle_ref(a));

        let set: HashSet<HandleRef<'_, (Name,)>> =
            [first.handle_ref(a), first.handle_ref(a), first.handle_ref(b)]
                .into_iter()
                .collect();
        assert_eq!(set.len(), 2);
    }
}
