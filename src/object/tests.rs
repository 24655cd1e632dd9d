use super::*;

#[test]
fn insert_allocates_sequential_ids() {
    let mut pool = ObjectPool::new();
    assert_eq!(pool.insert(0, 4), 0);
    assert_eq!(pool.insert(1, 2), 1);
    assert_eq!(pool.len(), 2);
}

#[test]
fn new_objects_are_valid() {
    let mut pool = ObjectPool::new();
    let id = pool.insert(0, 1);
    assert!(pool.is_valid(id));
}

#[test]
fn invalidate_clears_validity_but_keeps_record() {
    let mut pool = ObjectPool::new();
    let id = pool.insert(0, 1);
    pool.invalidate(id);
    assert!(!pool.is_valid(id));
    assert_eq!(pool.get(id).size, 1);
}

#[test]
fn unknown_id_is_not_valid() {
    let pool = ObjectPool::new();
    assert!(!pool.is_valid(42));
}
