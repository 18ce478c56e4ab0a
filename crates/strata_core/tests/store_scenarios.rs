//! # Store Scenarios
//!
//! End-to-end checks of the public store API:
//!
//! 1. **Identity**: stale IDs stay invalid after their slot is reused
//! 2. **Views**: results match `has_all` whatever the creation order
//! 3. **Callbacks**: add/remove fan-out across destroy, clear and drop
//! 4. **Copy**: cloning entities between registries of the same shape
//!
//! Run with: cargo test --package strata_core --test store_scenarios

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use strata_core::{copy, Entity, Registry, StoreError};

#[derive(Clone, Debug, PartialEq)]
struct Position {
    x: i64,
}

#[derive(Clone, Debug, PartialEq)]
struct Velocity {
    dx: i64,
}

#[derive(Clone, Debug, PartialEq)]
struct Tag;

type World = Registry<(Position, Velocity, Tag)>;

/// Deterministic xorshift, enough to scramble operation order.
struct Scrambler(u64);

impl Scrambler {
    fn next(&mut self) -> u64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        self.0
    }
}

// ============================================================================
// IDENTITY
// ============================================================================

#[test]
fn destroyed_ids_never_become_valid_again() {
    let mut registry = World::new();
    let mut rng = Scrambler(0x5eed);
    let mut live: Vec<Entity> = Vec::new();
    let mut dead: Vec<Entity> = Vec::new();

    for _ in 0..2_000 {
        if live.is_empty() || rng.next() % 3 != 0 {
            let entity = registry.create();
            assert!(registry.valid(entity));
            live.push(entity);
        } else {
            let victim = live.swap_remove((rng.next() % live.len() as u64) as usize);
            registry.destroy(victim);
            assert!(!registry.valid(victim));
            dead.push(victim);
        }
    }

    assert_eq!(registry.size(), live.len());
    assert!(live.iter().all(|&id| registry.valid(id)));
    assert!(dead.iter().all(|&id| !registry.valid(id)));

    let unique: HashSet<Entity> = live.iter().chain(&dead).copied().collect();
    assert_eq!(unique.len(), live.len() + dead.len());
}

#[test]
fn reused_slot_carries_next_generation() {
    let mut registry = World::new();
    let e1 = registry.create();
    let e2 = registry.create();
    let e3 = registry.create();
    registry.add(e1, Position { x: 1 });
    registry.add(e3, Position { x: 1 });

    let with_position: HashSet<Entity> = registry.view::<(Position,), _>().collect();
    assert_eq!(with_position, HashSet::from([e1, e3]));

    registry.destroy(e2);
    assert_eq!(registry.size(), 2);

    let e4 = registry.create();
    assert_eq!(e4.index(), e2.index());
    assert_eq!(e4.generation(), e2.generation() + 1);
    assert!(!registry.valid(e2));
    assert!(registry.get_if::<Position, _>(e2).is_none());
}

#[test]
fn stale_id_cannot_reach_new_occupant_components() {
    let mut registry = World::new();
    let old = registry.create();
    registry.destroy(old);
    let new = registry.create();
    registry.add(new, Tag);

    assert!(!registry.has::<Tag, _>(old));
    assert!(registry.get_if::<Tag, _>(old).is_none());
    assert_eq!(
        registry.try_get::<Tag, _>(old),
        Err(StoreError::StaleEntity(old))
    );
    assert!(registry.try_add(old, Velocity { dx: 0 }).is_err());
    assert!(!registry.has::<Velocity, _>(new));
}

#[test]
fn null_is_never_valid() {
    let mut registry = World::new();
    for _ in 0..8 {
        registry.create();
    }
    assert!(!registry.valid(Entity::NULL));
    assert!(!registry.has_any::<(Position, Velocity, Tag), _>(Entity::NULL));
    assert!(registry.try_destroy(Entity::NULL).is_err());
}

// ============================================================================
// VIEWS
// ============================================================================

#[test]
fn view_matches_has_all_after_churn() {
    let mut registry = World::new();
    let mut rng = Scrambler(42);
    let mut live = Vec::new();

    for i in 0..500 {
        let entity = registry.create();
        if rng.next() % 2 == 0 {
            registry.add(entity, Position { x: i });
        }
        if rng.next() % 3 == 0 {
            registry.add(entity, Velocity { dx: i });
        }
        live.push(entity);
    }
    for _ in 0..150 {
        let victim = live.swap_remove((rng.next() % live.len() as u64) as usize);
        registry.destroy(victim);
    }

    let expected: HashSet<Entity> = live
        .iter()
        .copied()
        .filter(|&e| registry.has_all::<(Position, Velocity), _>(e))
        .collect();
    let forward: Vec<Entity> = registry.view::<(Position, Velocity), _>().collect();
    let backward: HashSet<Entity> = registry.view::<(Velocity, Position), _>().collect();

    assert_eq!(forward.len(), expected.len());
    assert_eq!(forward.iter().copied().collect::<HashSet<_>>(), expected);
    assert_eq!(backward, expected);

    // Same history, same order.
    let again: Vec<Entity> = registry.view::<(Position, Velocity), _>().collect();
    assert_eq!(forward, again);
}

#[test]
fn view_get_yields_matching_components() {
    let mut registry = World::new();
    for i in 0..10 {
        let entity = registry.create();
        registry.add(entity, Position { x: i });
        if i % 2 == 1 {
            registry.add(entity, Velocity { dx: -i });
        }
    }

    let mut seen = 0;
    for (entity, (velocity, position)) in registry.view_get::<(Velocity, Position), _>() {
        assert_eq!(velocity.dx, -position.x);
        assert_eq!(registry.get::<Position, _>(entity), position);
        seen += 1;
    }
    assert_eq!(seen, 5);
}

#[test]
fn view_mut_then_read_back() {
    let mut registry = World::new();
    let ids: Vec<Entity> = (0..4).map(|_| registry.create()).collect();
    for (i, &id) in ids.iter().enumerate() {
        registry.add(id, Position { x: i as i64 });
        registry.add(id, Velocity { dx: 10 });
    }

    for (entity, position) in registry.view_mut::<Position, _>() {
        position.x += i64::from(entity.index()) * 100;
    }
    for (i, &id) in ids.iter().enumerate() {
        assert_eq!(registry.get::<Position, _>(id).x, i as i64 * 101);
    }
}

#[test]
fn destroy_if_spares_first_tagged() {
    let mut registry = World::new();
    let tagged: Vec<Entity> = (0..4)
        .map(|_| {
            let entity = registry.create();
            registry.add(entity, Tag);
            entity
        })
        .collect();
    let untagged = registry.create();

    let mut calls = 0;
    let destroyed = registry.destroy_if::<(Tag,), _, _>(|_, _| {
        calls += 1;
        calls > 1
    });

    assert_eq!(destroyed, 3);
    assert_eq!(registry.size(), 2);
    assert!(registry.valid(tagged[0]));
    assert!(registry.has::<Tag, _>(tagged[0]));
    assert!(registry.valid(untagged));
    assert_eq!(registry.view::<(Tag,), _>().count(), 1);
}

#[test]
fn find_uses_registry_in_predicate() {
    let mut registry = World::new();
    for x in [3, 8, 13] {
        let entity = registry.create();
        registry.add(entity, Position { x });
    }

    let found = registry.find::<(Position,), _, _>(|reg, e| reg.get::<Position, _>(e).x > 5);
    assert_eq!(registry.get::<Position, _>(found).x, 8);
    assert_eq!(
        registry.find::<(Position,), _, _>(|reg, e| reg.get::<Position, _>(e).x > 50),
        Entity::NULL
    );
}

// ============================================================================
// CALLBACKS
// ============================================================================

#[test]
fn on_add_sees_stored_value_once_per_entity() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut registry = World::new();
    let log = Rc::clone(&seen);
    registry.on_add::<Velocity, _>(move |registry, entity, velocity| {
        assert_eq!(registry.get::<Velocity, _>(entity).dx, velocity.dx);
        log.borrow_mut().push((entity, velocity.dx));
    });

    let a = registry.create();
    let b = registry.create();
    registry.add(a, Velocity { dx: 1 });
    registry.emplace(b, || Velocity { dx: 2 });
    registry.add(a, Position { x: 0 });

    assert_eq!(*seen.borrow(), vec![(a, 1), (b, 2)]);
}

#[test]
fn callbacks_fire_in_registration_order() {
    let order = Rc::new(RefCell::new(Vec::new()));
    let mut registry = World::new();
    for label in ["first", "second", "third"] {
        let log = Rc::clone(&order);
        registry.on_remove::<Tag, _>(move |_, _, _| log.borrow_mut().push(label));
    }

    let entity = registry.create();
    registry.add(entity, Tag);
    registry.remove::<Tag, _>(entity);

    assert_eq!(*order.borrow(), vec!["first", "second", "third"]);
}

#[test]
fn destroy_removes_in_declared_order() {
    let order = Rc::new(RefCell::new(Vec::new()));
    let mut registry = World::new();
    let log = Rc::clone(&order);
    registry.on_remove::<Tag, _>(move |_, _, _| log.borrow_mut().push("tag"));
    let log = Rc::clone(&order);
    registry.on_remove::<Position, _>(move |_, _, _| log.borrow_mut().push("position"));
    let log = Rc::clone(&order);
    registry.on_remove::<Velocity, _>(move |_, _, _| log.borrow_mut().push("velocity"));

    let entity = registry.create();
    registry.add(entity, Tag);
    registry.add(entity, Velocity { dx: 1 });
    registry.add(entity, Position { x: 1 });
    registry.destroy(entity);

    assert_eq!(*order.borrow(), vec!["position", "velocity", "tag"]);
}

#[test]
fn drop_and_clear_count_every_component() {
    let removed = Rc::new(RefCell::new(0_usize));
    {
        let mut registry = World::new();
        let counter = Rc::clone(&removed);
        registry.on_remove::<Position, _>(move |_, _, _| *counter.borrow_mut() += 1);

        for x in 0..10 {
            let entity = registry.create();
            registry.add(entity, Position { x });
        }
        registry.clear();
        assert_eq!(*removed.borrow(), 10);
        assert!(registry.is_empty());

        for x in 0..5 {
            let entity = registry.create();
            registry.add(entity, Position { x });
        }
    }
    assert_eq!(*removed.borrow(), 15);
}

// ============================================================================
// COPY
// ============================================================================

#[test]
fn copy_clones_components_into_fresh_entity() {
    let mut src = World::new();
    let mut dst = World::new();
    let src_adds = Rc::new(RefCell::new(0));
    let dst_adds = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&src_adds);
    src.on_add::<Velocity, _>(move |_, _, _| *counter.borrow_mut() += 1);
    let counter = Rc::clone(&dst_adds);
    dst.on_add::<Velocity, _>(move |_, _, _| *counter.borrow_mut() += 1);

    let entity = src.create();
    src.add(entity, Velocity { dx: 9 });
    src.add(entity, Tag);

    let copied = copy(entity, &src, &mut dst);
    assert!(dst.valid(copied));
    assert_eq!(dst.get::<Velocity, _>(copied), &Velocity { dx: 9 });
    assert!(dst.has::<Tag, _>(copied));
    assert!(!dst.has::<Position, _>(copied));
    assert_eq!(*src_adds.borrow(), 1);
    assert_eq!(*dst_adds.borrow(), 1);

    dst.get_mut::<Velocity, _>(copied).dx = 0;
    assert_eq!(src.get::<Velocity, _>(entity).dx, 9);
}

// ============================================================================
// HANDLES
// ============================================================================

#[test]
fn handles_forward_and_compare() {
    let mut registry = World::new();
    let entity = {
        let mut handle = registry.spawn();
        handle.add(Position { x: 2 });
        handle.add(Tag);
        assert!(handle.has_all::<(Position, Tag), _>());
        assert!(handle.shared().has::<Tag, _>());
        handle.entity()
    };

    let a = registry.handle_ref(entity);
    let b = registry.handle_ref(entity);
    assert_eq!(a, b);
    assert_eq!(a.get::<Position, _>().x, 2);

    registry.handle(entity).remove_all_components();
    assert!(!registry.has_any::<(Position, Velocity, Tag), _>(entity));
    assert!(registry.valid(entity));
}
