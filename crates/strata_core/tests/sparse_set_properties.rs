//! # Sparse Set Properties
//!
//! Size tracking and relocation behaviour of `SparseSet` under mixed
//! insert/erase sequences.
//!
//! Run with: cargo test --package strata_core --test sparse_set_properties

use std::collections::BTreeMap;

use strata_core::{SafeCursor, SparseSet, StoreError};

#[test]
fn len_tracks_has_under_churn() {
    let mut set = SparseSet::new();
    let mut model = BTreeMap::new();
    let mut state = 0x9e37_79b9_u64;

    for step in 0..5_000_u64 {
        state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
        let index = ((state >> 33) % 256) as usize;
        if set.has(index) {
            assert_eq!(set.erase(index), model.remove(&index).unwrap());
        } else {
            set.insert(index, step);
            model.insert(index, step);
        }

        assert_eq!(set.len(), model.len());
    }

    let counted = (0..256).filter(|&i| set.has(i)).count();
    assert_eq!(counted, set.len());
    for (&index, value) in &model {
        assert_eq!(set.get(index), Some(value));
    }
}

#[test]
fn erase_middle_relocates_only_the_last() {
    let mut set = SparseSet::new();
    for index in [1, 3, 7, 9] {
        set.insert(index, index * 100);
    }

    let before: Vec<usize> = set.keys().collect();
    assert_eq!(before, vec![1, 3, 7, 9]);

    set.erase(3);
    let after: Vec<usize> = set.keys().collect();
    assert_eq!(after, vec![1, 9, 7]);
    assert!(!set.has(3));
    assert!([1, 7, 9].iter().all(|&i| set.has(i)));
    assert_eq!(set.len(), 3);
    assert_eq!(set[9], 900);
}

#[test]
fn erase_last_keeps_packed_order() {
    let mut set = SparseSet::new();
    for index in [4, 2, 8] {
        set.insert(index, ());
    }
    set.erase(8);
    assert_eq!(set.keys().collect::<Vec<_>>(), vec![4, 2]);
}

#[test]
fn safe_cursor_survives_erasing_visited_entries() {
    let mut set = SparseSet::new();
    for index in [9, 1, 7, 3] {
        set.insert(index, index);
    }

    let mut visited = Vec::new();
    let mut cursor = SafeCursor::new();
    while let Some(index) = cursor.next_index(&set) {
        visited.push(index);
        set.erase(index);
    }

    assert_eq!(visited, vec![1, 3, 7, 9]);
    assert!(set.is_empty());
}

#[test]
fn fast_and_safe_visit_the_same_entries() {
    let mut set = SparseSet::new();
    for index in [5, 0, 12, 3] {
        set.insert(index, index * 2);
    }
    set.erase(0);

    let mut fast: Vec<(usize, usize)> = set.fast().map(|(i, &v)| (i, v)).collect();
    let safe: Vec<(usize, usize)> = set.safe().map(|(i, &v)| (i, v)).collect();
    fast.sort_unstable();
    assert_eq!(fast, safe);
}

#[test]
fn try_forms_leave_the_set_untouched() {
    let mut set = SparseSet::new();
    set.insert(2, "two");

    assert_eq!(set.try_insert(2, "again"), Err(StoreError::Occupied { index: 2 }));
    assert_eq!(set.try_erase(5), Err(StoreError::Vacant { index: 5 }));
    assert_eq!(set.erase_if_exists(5), None);
    assert_eq!(set.len(), 1);
    assert_eq!(set[2], "two");
}
