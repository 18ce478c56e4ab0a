//! # Sparse Set
//!
//! Dense storage plus an index indirection, the container underlying every
//! component pool and the registry's live-entity set.
//!
//! ```text
//! sparse:  [ 1 | - | 0 | - | 2 ]        index -> position in packed
//! packed:  [ (2, c) | (0, a) | (4, e) ]  contiguous (index, value) pairs
//! ```
//!
//! - `insert`/`has`/`get`: O(1)
//! - `erase`: O(1) via swap-with-last, which moves at most one other pair
//!
//! Two traversal disciplines are offered:
//!
//! - **Fast** ([`SparseSet::fast`]): walks `packed` directly, O(len). The
//!   borrow checker rules out mutation while it is alive.
//! - **Safe** ([`SparseSet::safe`], [`SafeCursor`]): walks `sparse` in index
//!   order, O(extent). A [`SafeCursor`] holds no borrow between steps, so
//!   entries already visited may be erased mid-traversal.

use std::fmt;
use std::ops::{Index, IndexMut};
use std::slice;

use crate::error::{StoreError, StoreResult};

/// Marker for an unoccupied sparse slot.
const EMPTY: usize = usize::MAX;

/// Associative container from small non-negative indices to values.
///
/// # Example
///
/// ```rust
/// use strata_core::SparseSet;
///
/// let mut set = SparseSet::new();
/// set.insert(7, "seven");
/// assert!(set.has(7));
/// assert_eq!(set[7], "seven");
/// assert_eq!(set.erase(7), "seven");
/// assert!(set.is_empty());
/// ```
#[derive(Clone)]
pub struct SparseSet<V> {
    /// Position in `packed` for every index, or `EMPTY`.
    sparse: Vec<usize>,
    /// Contiguous `(index, value)` pairs, no gaps.
    packed: Vec<(usize, V)>,
}

impl<V> SparseSet<V> {
    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            sparse: Vec::new(),
            packed: Vec::new(),
        }
    }

    /// Creates an empty set with room for indices `0..capacity` and
    /// `capacity` values.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            sparse: Vec::with_capacity(capacity),
            packed: Vec::with_capacity(capacity),
        }
    }

    /// Grows the sparse array so that `index` is addressable.
    fn assure(&mut self, index: usize) {
        if self.sparse.len() <= index {
            self.sparse.resize(index + 1, EMPTY);
        }
    }

    /// Appends a value for a vacant index.
    fn push(&mut self, index: usize, value: V) -> &mut V {
        self.assure(index);
        self.sparse[index] = self.packed.len();
        self.packed.push((index, value));
        let last = self.packed.len() - 1;
        &mut self.packed[last].1
    }

    /// Inserts `value` at `index` and returns a reference to the stored value.
    ///
    /// # Panics
    ///
    /// Panics if `index` is already occupied.
    pub fn insert(&mut self, index: usize, value: V) -> &mut V {
        assert!(!self.has(index), "{}", StoreError::Occupied { index });
        self.push(index, value)
    }

    /// Inserts `value` at `index`, failing if the index is occupied.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Occupied`] without touching the set if `index`
    /// already holds a value.
    pub fn try_insert(&mut self, index: usize, value: V) -> StoreResult<&mut V> {
        if self.has(index) {
            return Err(StoreError::Occupied { index });
        }
        Ok(self.push(index, value))
    }

    /// Constructs the value at `index` in place.
    ///
    /// `ctor` only runs once the index is known to be vacant.
    ///
    /// # Panics
    ///
    /// Panics if `index` is already occupied.
    pub fn emplace<F>(&mut self, index: usize, ctor: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        assert!(!self.has(index), "{}", StoreError::Occupied { index });
        self.push(index, ctor())
    }

    /// Returns true if `index` holds a value. Never fails.
    #[inline]
    #[must_use]
    pub fn has(&self, index: usize) -> bool {
        self.sparse.get(index).is_some_and(|&slot| slot != EMPTY)
    }

    /// Returns the value at `index`, if any.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&V> {
        let position = *self.sparse.get(index)?;
        self.packed.get(position).map(|(_, value)| value)
    }

    /// Returns the value at `index` mutably, if any.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut V> {
        let position = *self.sparse.get(index)?;
        self.packed.get_mut(position).map(|(_, value)| value)
    }

    /// Removes and returns the value at `index`.
    ///
    /// If the pair is not last in `packed`, the last pair is moved into the
    /// vacated position. Any reference taken into this set before the call is
    /// invalidated, not only the one to the erased value.
    ///
    /// # Panics
    ///
    /// Panics if `index` holds no value.
    pub fn erase(&mut self, index: usize) -> V {
        match self.try_erase(index) {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }

    /// Removes and returns the value at `index`, failing if it is vacant.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Vacant`] if `index` holds no value.
    pub fn try_erase(&mut self, index: usize) -> StoreResult<V> {
        if !self.has(index) {
            return Err(StoreError::Vacant { index });
        }

        let position = self.sparse[index];
        self.sparse[index] = EMPTY;

        // Last pair is moved into `position` unless it was the erased one.
        let (_, value) = self.packed.swap_remove(position);
        if let Some(&(moved, _)) = self.packed.get(position) {
            self.sparse[moved] = position;
        }

        Ok(value)
    }

    /// Removes the value at `index` if there is one. Never fails.
    pub fn erase_if_exists(&mut self, index: usize) -> Option<V> {
        self.try_erase(index).ok()
    }

    /// Removes every value, leaving the set as if freshly constructed.
    pub fn clear(&mut self) {
        self.packed.clear();
        self.sparse.clear();
    }

    /// Number of stored values.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.packed.len()
    }

    /// Returns true if no value is stored.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.packed.is_empty()
    }

    /// One past the largest index the sparse array can address.
    ///
    /// This is the cost of a safe traversal.
    #[inline]
    #[must_use]
    pub fn extent(&self) -> usize {
        self.sparse.len()
    }

    /// Stored indices, in packed order.
    pub fn keys(&self) -> Keys<'_, V> {
        Keys {
            inner: self.packed.iter(),
        }
    }

    /// Fast traversal of `(index, &value)` in packed order.
    ///
    /// Packed order is insertion order until the first erase, unspecified
    /// (but dense and reproducible) afterwards.
    pub fn fast(&self) -> Iter<'_, V> {
        Iter {
            inner: self.packed.iter(),
        }
    }

    /// Fast traversal of `(index, &mut value)` in packed order.
    pub fn fast_mut(&mut self) -> IterMut<'_, V> {
        IterMut {
            inner: self.packed.iter_mut(),
        }
    }

    /// Safe traversal of `(index, &value)` in ascending index order.
    ///
    /// Costs O(extent) rather than O(len). To erase while traversing, use a
    /// [`SafeCursor`] instead.
    pub fn safe(&self) -> Safe<'_, V> {
        Safe {
            set: self,
            cursor: SafeCursor::new(),
        }
    }
}

impl<V> Default for SparseSet<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: fmt::Debug> fmt::Debug for SparseSet<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.fast()).finish()
    }
}

impl<V> Index<usize> for SparseSet<V> {
    type Output = V;

    fn index(&self, index: usize) -> &V {
        match self.get(index) {
            Some(value) => value,
            None => panic!("{}", StoreError::Vacant { index }),
        }
    }
}

impl<V> IndexMut<usize> for SparseSet<V> {
    fn index_mut(&mut self, index: usize) -> &mut V {
        match self.get_mut(index) {
            Some(value) => value,
            None => panic!("{}", StoreError::Vacant { index }),
        }
    }
}

impl<'a, V> IntoIterator for &'a SparseSet<V> {
    type Item = (usize, &'a V);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.fast()
    }
}

impl<'a, V> IntoIterator for &'a mut SparseSet<V> {
    type Item = (usize, &'a mut V);
    type IntoIter = IterMut<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.fast_mut()
    }
}

// ============================================================================
// FAST TRAVERSAL
// ============================================================================

/// Iterator over the stored indices of a [`SparseSet`], in packed order.
pub struct Keys<'a, V> {
    inner: slice::Iter<'a, (usize, V)>,
}

impl<V> Iterator for Keys<'_, V> {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        self.inner.next().map(|&(index, _)| index)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<V> ExactSizeIterator for Keys<'_, V> {}

/// Fast iterator over `(index, &value)`, in packed order.
pub struct Iter<'a, V> {
    inner: slice::Iter<'a, (usize, V)>,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (usize, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(index, value)| (*index, value))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}

/// Fast iterator over `(index, &mut value)`, in packed order.
pub struct IterMut<'a, V> {
    inner: slice::IterMut<'a, (usize, V)>,
}

impl<'a, V> Iterator for IterMut<'a, V> {
    type Item = (usize, &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(index, value)| (*index, value))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<V> ExactSizeIterator for IterMut<'_, V> {}

// ============================================================================
// SAFE TRAVERSAL
// ============================================================================

/// Position in a safe, index-ordered traversal of a [`SparseSet`].
///
/// The cursor only remembers the next index to inspect, so the set can be
/// mutated between calls to [`SafeCursor::next_index`]. Erasing entries at or
/// below the last returned index is tolerated; inserting, or erasing entries
/// that have not been reached yet, is not.
///
/// ```rust
/// use strata_core::{SafeCursor, SparseSet};
///
/// let mut set = SparseSet::new();
/// for i in [1, 3, 7, 9] {
///     set.insert(i, i * 10);
/// }
///
/// let mut cursor = SafeCursor::new();
/// while let Some(index) = cursor.next_index(&set) {
///     if index != 7 {
///         set.erase(index);
///     }
/// }
/// assert_eq!(set.len(), 1);
/// assert!(set.has(7));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SafeCursor {
    next: usize,
}

impl SafeCursor {
    /// Creates a cursor positioned before index 0.
    #[must_use]
    pub const fn new() -> Self {
        Self { next: 0 }
    }

    /// Returns the next occupied index of `set`, in ascending order.
    pub fn next_index<V>(&mut self, set: &SparseSet<V>) -> Option<usize> {
        while self.next < set.sparse.len() {
            let index = self.next;
            self.next += 1;
            if set.sparse[index] != EMPTY {
                return Some(index);
            }
        }
        None
    }
}

/// Safe iterator over `(index, &value)`, in ascending index order.
pub struct Safe<'a, V> {
    set: &'a SparseSet<V>,
    cursor: SafeCursor,
}

impl<'a, V> Iterator for Safe<'a, V> {
    type Item = (usize, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let set = self.set;
        let index = self.cursor.next_index(set)?;
        set.get(index).map(|value| (index, value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.set.extent().saturating_sub(self.cursor.next)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_of(indices: &[usize]) -> SparseSet<usize> {
        let mut set = SparseSet::new();
        for &i in indices {
            set.insert(i, i * 10);
        }
        set
    }

    #[test]
    fn test_set_and_get() {
        let mut set = SparseSet::new();
        set.insert(2, 5);
        assert!(set.has(2));
        assert_eq!(set[2], 5);
        assert_eq!(set.get(3), None);
    }

    #[test]
    fn test_insert_returns_stored_value() {
        let mut set = SparseSet::new();
        *set.insert(4, 1) += 1;
        assert_eq!(set[4], 2);
    }

    #[test]
    fn test_has_is_total() {
        let set = set_of(&[3]);
        assert!(!set.has(0));
        assert!(!set.has(4));
        assert!(!set.has(usize::MAX));
    }

    #[test]
    fn test_erase() {
        let mut set = SparseSet::new();
        set.insert(2, 5);
        assert_eq!(set.erase(2), 5);
        assert!(!set.has(2));
        assert!(set.is_empty());
    }

    #[test]
    fn test_erase_middle_keeps_others() {
        let mut set = set_of(&[1, 3, 7, 9]);
        set.erase(3);
        assert!(!set.has(3));
        for i in [1, 7, 9] {
            assert!(set.has(i));
            assert_eq!(set[i], i * 10);
        }
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_erase_last_does_not_move_others() {
        let mut set = set_of(&[1, 3, 7]);
        set.erase(7);
        assert_eq!(set.keys().collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn test_erase_non_last_relocates_exactly_one() {
        let mut set = set_of(&[1, 3, 7, 9]);
        set.erase(1);
        // 9 was last and now fills position 0.
        assert_eq!(set.keys().collect::<Vec<_>>(), vec![9, 3, 7]);
        assert_eq!(set[9], 90);
    }

    #[test]
    fn test_erase_only_element() {
        let mut set = set_of(&[5]);
        set.erase(5);
        assert!(set.is_empty());
        set.insert(5, 1);
        assert_eq!(set[5], 1);
    }

    #[test]
    fn test_try_variants() {
        let mut set = set_of(&[2]);
        assert_eq!(
            set.try_insert(2, 0).unwrap_err(),
            StoreError::Occupied { index: 2 }
        );
        assert_eq!(set[2], 20);
        assert_eq!(set.try_erase(4).unwrap_err(), StoreError::Vacant { index: 4 });
        assert_eq!(set.erase_if_exists(4), None);
        assert_eq!(set.erase_if_exists(2), Some(20));
    }

    #[test]
    #[should_panic(expected = "already occupied")]
    fn test_double_insert_panics() {
        let mut set = set_of(&[2]);
        set.insert(2, 0);
    }

    #[test]
    #[should_panic(expected = "is empty")]
    fn test_erase_vacant_panics() {
        let mut set: SparseSet<u8> = SparseSet::new();
        set.erase(0);
    }

    #[test]
    fn test_emplace_constructs_in_place() {
        let mut set = SparseSet::new();
        let value = set.emplace(1, || String::from("built"));
        value.push('!');
        assert_eq!(set[1], "built!");
    }

    #[test]
    fn test_size_tracks_has() {
        let mut set = SparseSet::new();
        let ops: [(bool, usize); 10] = [
            (true, 4),
            (true, 0),
            (true, 9),
            (false, 0),
            (true, 2),
            (false, 9),
            (true, 9),
            (false, 4),
            (true, 0),
            (false, 2),
        ];
        for (insert, index) in ops {
            if insert {
                set.insert(index, ());
            } else {
                set.erase(index);
            }
            let occupied = (0..set.extent()).filter(|&i| set.has(i)).count();
            assert_eq!(set.len(), occupied);
        }
    }

    #[test]
    fn test_clear_matches_fresh() {
        let mut set = set_of(&[1, 2, 3]);
        set.clear();
        assert!(set.is_empty());
        assert_eq!(set.extent(), 0);
        assert!(!set.has(1));
        set.insert(1, 7);
        assert_eq!(set.fast().collect::<Vec<_>>(), vec![(1, &7)]);
    }

    #[test]
    fn test_fast_with_one_element() {
        let mut set = SparseSet::new();
        set.insert(2, 5);
        for (key, value) in set.fast() {
            assert_eq!(key, 2);
            assert_eq!(*value, 5);
        }
    }

    #[test]
    fn test_fast_mut_writes_through() {
        let mut set = set_of(&[0, 1]);
        for (_, value) in &mut set {
            *value += 1;
        }
        assert_eq!(set[0], 1);
        assert_eq!(set[1], 11);
    }

    #[test]
    fn test_safe_walks_index_order() {
        let mut set = set_of(&[9, 1, 7, 3]);
        set.erase(9);
        let visited: Vec<usize> = set.safe().map(|(index, _)| index).collect();
        assert_eq!(visited, vec![1, 3, 7]);
    }

    #[test]
    fn test_safe_cursor_tolerates_erasing_visited() {
        let mut set = set_of(&[0, 1, 2, 3, 4, 5]);
        let mut cursor = SafeCursor::new();
        let mut visited = Vec::new();
        while let Some(index) = cursor.next_index(&set) {
            visited.push(index);
            set.erase(index);
        }
        assert_eq!(visited, vec![0, 1, 2, 3, 4, 5]);
        assert!(set.is_empty());
    }

    #[test]
    fn test_index_mut() {
        let mut set = set_of(&[3]);
        set[3] = 1;
        assert_eq!(set.get(3), Some(&1));
    }

    #[test]
    fn test_debug_lists_pairs() {
        let set = set_of(&[1]);
        assert_eq!(format!("{set:?}"), "{1: 10}");
    }
}
