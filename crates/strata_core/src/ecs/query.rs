//! # Views
//!
//! Lazy, read-as-you-go traversals of a registry.
//!
//! A query is a tuple of component types: `()`, `(A,)`, `(A, B)`, ... up to
//! eight. A view over `(A, B, C)` drives iteration from the pool of `A`, the
//! first listed type, and keeps the entities that also carry `B` and `C`.
//! Listing the rarest component first makes the view cheaper; the result set
//! does not depend on the order. The empty query `()` drives from the
//! live-entity set and matches every entity.

use std::any::type_name;
use std::marker::PhantomData;

use super::component::{ComponentSet, Contains};
use super::entity::Entity;
use super::sparse_set::{IterMut, Keys, SparseSet};

/// A tuple of component types that can be tested, fetched and iterated
/// against component set `S`.
///
/// `I` is a tuple of position markers inferred by the compiler.
pub trait Query<S: ComponentSet, I>: 'static {
    /// Value type of the sparse set that drives iteration.
    type Driver: 'static;

    /// Shared references to every queried component, in query order.
    type Refs<'a>;

    /// Slot indices of the driving set, in packed order.
    fn driver<'a>(entities: &'a SparseSet<Entity>, pools: &'a S::Pools) -> Keys<'a, Self::Driver>;

    /// True if the slot carries every queried component.
    fn has_all(pools: &S::Pools, index: usize) -> bool;

    /// True if the slot carries at least one queried component.
    fn has_any(pools: &S::Pools, index: usize) -> bool;

    /// References to every queried component of the slot, if all present.
    fn fetch(pools: &S::Pools, index: usize) -> Option<Self::Refs<'_>>;
}

impl<S: ComponentSet> Query<S, ()> for () {
    type Driver = Entity;
    type Refs<'a> = ();

    fn driver<'a>(entities: &'a SparseSet<Entity>, _: &'a S::Pools) -> Keys<'a, Entity> {
        entities.keys()
    }

    fn has_all(_: &S::Pools, _: usize) -> bool {
        true
    }

    fn has_any(_: &S::Pools, _: usize) -> bool {
        false
    }

    fn fetch(_: &S::Pools, _: usize) -> Option<()> {
        Some(())
    }
}

macro_rules! impl_query {
    (($Q0:ident, $I0:ident) $(, ($Q:ident, $I:ident))*) => {
        impl<S, $Q0: 'static, $I0 $(, $Q: 'static, $I)*> Query<S, ($I0, $($I,)*)> for ($Q0, $($Q,)*)
        where
            S: Contains<$Q0, $I0> $(+ Contains<$Q, $I>)*,
        {
            type Driver = $Q0;
            type Refs<'a> = (&'a $Q0, $(&'a $Q,)*);

            fn driver<'a>(_: &'a SparseSet<Entity>, pools: &'a S::Pools) -> Keys<'a, $Q0> {
                <S as Contains<$Q0, $I0>>::pool(pools).set().keys()
            }

            fn has_all(pools: &S::Pools, index: usize) -> bool {
                <S as Contains<$Q0, $I0>>::pool(pools).set().has(index)
                    $(&& <S as Contains<$Q, $I>>::pool(pools).set().has(index))*
            }

            fn has_any(pools: &S::Pools, index: usize) -> bool {
                <S as Contains<$Q0, $I0>>::pool(pools).set().has(index)
                    $(|| <S as Contains<$Q, $I>>::pool(pools).set().has(index))*
            }

            fn fetch(pools: &S::Pools, index: usize) -> Option<Self::Refs<'_>> {
                Some((
                    <S as Contains<$Q0, $I0>>::pool(pools).set().get(index)?,
                    $(<S as Contains<$Q, $I>>::pool(pools).set().get(index)?,)*
                ))
            }
        }
    };
}

impl_query!((A, IA));
impl_query!((A, IA), (B, IB));
impl_query!((A, IA), (B, IB), (C, IC));
impl_query!((A, IA), (B, IB), (C, IC), (D, ID));
impl_query!((A, IA), (B, IB), (C, IC), (D, ID), (E, IE));
impl_query!((A, IA), (B, IB), (C, IC), (D, ID), (E, IE), (F, IF));
impl_query!((A, IA), (B, IB), (C, IC), (D, ID), (E, IE), (F, IF), (G, IG));
impl_query!((A, IA), (B, IB), (C, IC), (D, ID), (E, IE), (F, IF), (G, IG), (H, IH));

/// Human-readable name of a query, for diagnostics.
pub(crate) fn query_name<Q>() -> &'static str {
    type_name::<Q>()
}

// ============================================================================
// ITERATORS
// ============================================================================

/// Every live entity, in the live set's packed order.
pub struct All<'a> {
    inner: super::sparse_set::Iter<'a, Entity>,
}

impl<'a> All<'a> {
    pub(crate) fn new(entities: &'a SparseSet<Entity>) -> Self {
        Self {
            inner: entities.fast(),
        }
    }
}

impl Iterator for All<'_> {
    type Item = Entity;

    #[inline]
    fn next(&mut self) -> Option<Entity> {
        self.inner.next().map(|(_, &entity)| entity)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for All<'_> {}

/// Entities carrying every component of `Q`.
pub struct View<'a, S, Q, I>
where
    S: ComponentSet,
    Q: Query<S, I>,
{
    entities: &'a SparseSet<Entity>,
    pools: &'a S::Pools,
    driver: Keys<'a, Q::Driver>,
    marker: PhantomData<fn() -> (Q, I)>,
}

impl<'a, S, Q, I> View<'a, S, Q, I>
where
    S: ComponentSet,
    Q: Query<S, I>,
{
    pub(crate) fn new(entities: &'a SparseSet<Entity>, pools: &'a S::Pools) -> Self {
        Self {
            entities,
            pools,
            driver: Q::driver(entities, pools),
            marker: PhantomData,
        }
    }
}

impl<S, Q, I> Iterator for View<'_, S, Q, I>
where
    S: ComponentSet,
    Q: Query<S, I>,
{
    type Item = Entity;

    fn next(&mut self) -> Option<Entity> {
        loop {
            let index = self.driver.next()?;
            if Q::has_all(self.pools, index) {
                if let Some(&entity) = self.entities.get(index) {
                    return Some(entity);
                }
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.driver.size_hint().1)
    }
}

/// Entities carrying every component of `Q`, paired with references to
/// those components.
pub struct ViewGet<'a, S, Q, I>
where
    S: ComponentSet,
    Q: Query<S, I>,
{
    view: View<'a, S, Q, I>,
}

impl<'a, S, Q, I> ViewGet<'a, S, Q, I>
where
    S: ComponentSet,
    Q: Query<S, I>,
{
    pub(crate) fn new(entities: &'a SparseSet<Entity>, pools: &'a S::Pools) -> Self {
        Self {
            view: View::new(entities, pools),
        }
    }
}

impl<'a, S, Q, I> Iterator for ViewGet<'a, S, Q, I>
where
    S: ComponentSet,
    Q: Query<S, I>,
{
    type Item = (Entity, Q::Refs<'a>);

    fn next(&mut self) -> Option<Self::Item> {
        let pools: &'a S::Pools = self.view.pools;
        self.view
            .by_ref()
            .find_map(|entity| Q::fetch(pools, entity.index() as usize).map(|refs| (entity, refs)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.view.size_hint()
    }
}

/// Entities carrying component `T`, paired with a mutable reference to it,
/// in the pool's packed order.
pub struct ViewMut<'a, T> {
    entities: &'a SparseSet<Entity>,
    inner: IterMut<'a, T>,
}

impl<'a, T> ViewMut<'a, T> {
    pub(crate) fn new(entities: &'a SparseSet<Entity>, inner: IterMut<'a, T>) -> Self {
        Self { entities, inner }
    }
}

impl<'a, T> Iterator for ViewMut<'a, T> {
    type Item = (Entity, &'a mut T);

    fn next(&mut self) -> Option<Self::Item> {
        let entities = self.entities;
        self.inner
            .by_ref()
            .find_map(|(index, value)| entities.get(index).map(|&entity| (entity, value)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
