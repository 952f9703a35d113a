// Copyright 2026 the original authors.
// Licensed under the Apache License, Version 2.0 (see LICENSE).

//! Process-wide object pools for the major per-pip collections (spec.md
//! §5, §9): "the only near-global is the object pool... treat pools as
//! process-wide thread-safe caches with explicit acquire/release". Each
//! `Processor` acquires its working collections from these pools and each
//! `Result` releases them back on `dispose` (spec.md §4.6).

use parking_lot::Mutex;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// A collection that can be reset to empty and handed back to its pool.
pub trait Poolable: Default {
    fn clear(&mut self);
}

impl<T> Poolable for Vec<T> {
    fn clear(&mut self) {
        Vec::clear(self)
    }
}

impl<T: std::hash::Hash + Eq> Poolable for HashSet<T> {
    fn clear(&mut self) {
        HashSet::clear(self)
    }
}

impl<K: std::hash::Hash + Eq, V> Poolable for HashMap<K, V> {
    fn clear(&mut self) {
        HashMap::clear(self)
    }
}

impl<T: std::hash::Hash + Eq> Poolable for indexmap::IndexSet<T> {
    fn clear(&mut self) {
        indexmap::IndexSet::clear(self)
    }
}

/// A free-list of reusable instances of one collection type. `acquire`
/// pops a cleared instance or builds a fresh one; `release` clears and
/// returns an instance for reuse.
pub struct Pool<T: Poolable> {
    free: Mutex<Vec<T>>,
}

impl<T: Poolable> Pool<T> {
    pub const fn new() -> Self {
        Pool {
            free: Mutex::new(Vec::new()),
        }
    }

    pub fn acquire(&self) -> T {
        self.free.lock().pop().unwrap_or_default()
    }

    pub fn release(&self, mut item: T) {
        item.clear();
        self.free.lock().push(item);
    }

    /// Number of instances currently idle in the pool. Exposed for tests;
    /// not part of the acquire/release contract.
    pub fn idle_count(&self) -> usize {
        self.free.lock().len()
    }
}

impl<T: Poolable> Default for Pool<T> {
    fn default() -> Self {
        Pool::new()
    }
}

/// The caller-supplied ordering over expanded path strings used to keep
/// `sorted_observations_by_path` in canonical iteration order (spec.md
/// §4.6). Wrapped in `Arc` so its pointer identity can key the
/// per-comparator pool below.
pub type PathComparator = Arc<dyn Fn(&str, &str) -> Ordering + Send + Sync>;

fn comparator_identity(comparator: &PathComparator) -> usize {
    // A trait object's data pointer identifies the underlying closure;
    // casting the fat pointer to a thin one drops the vtable half, which
    // is exactly the identity we want (two `Arc`s of the same comparator
    // share a data pointer; unrelated comparators never collide in
    // practice).
    Arc::as_ptr(comparator) as *const u8 as usize
}

/// Pools for a collection type, keyed by comparator identity, so two
/// `Processor`s built with the same expanded-path comparator share a pool
/// instead of fragmenting pool memory per construction call (spec.md §9:
/// "must be de-duplicated by comparator identity to avoid fragmentation").
pub struct ComparatorKeyedPool<T: Poolable> {
    pools: Mutex<HashMap<usize, Arc<Pool<T>>>>,
}

impl<T: Poolable> ComparatorKeyedPool<T> {
    pub fn new() -> Self {
        ComparatorKeyedPool {
            pools: Mutex::new(HashMap::new()),
        }
    }

    pub fn pool_for(&self, comparator: &PathComparator) -> Arc<Pool<T>> {
        self.pools
            .lock()
            .entry(comparator_identity(comparator))
            .or_insert_with(|| Arc::new(Pool::new()))
            .clone()
    }

    pub fn distinct_comparator_count(&self) -> usize {
        self.pools.lock().len()
    }
}

impl<T: Poolable> Default for ComparatorKeyedPool<T> {
    fn default() -> Self {
        ComparatorKeyedPool::new()
    }
}

#[cfg(test)]
mod pool_tests {
    use super::*;

    #[test]
    fn acquire_without_prior_release_builds_fresh() {
        let pool: Pool<HashSet<u32>> = Pool::new();
        let set = pool.acquire();
        assert!(set.is_empty());
        assert_eq!(pool.idle_count(), 0);
    }

    #[test]
    fn release_clears_and_reuses() {
        let pool: Pool<HashSet<u32>> = Pool::new();
        let mut set = pool.acquire();
        set.insert(1);
        set.insert(2);
        pool.release(set);
        assert_eq!(pool.idle_count(), 1);

        let reused = pool.acquire();
        assert!(reused.is_empty(), "released collections must come back empty");
        assert_eq!(pool.idle_count(), 0);
    }

    #[test]
    fn same_comparator_shares_a_pool() {
        let registry: ComparatorKeyedPool<Vec<u32>> = ComparatorKeyedPool::new();
        let comparator: PathComparator = Arc::new(|a: &str, b: &str| a.cmp(b));

        let first = registry.pool_for(&comparator);
        let second = registry.pool_for(&comparator.clone());
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.distinct_comparator_count(), 1);
    }

    #[test]
    fn distinct_comparators_get_distinct_pools() {
        let registry: ComparatorKeyedPool<Vec<u32>> = ComparatorKeyedPool::new();
        let a: PathComparator = Arc::new(|x: &str, y: &str| x.cmp(y));
        let b: PathComparator = Arc::new(|x: &str, y: &str| y.cmp(x));

        let pool_a = registry.pool_for(&a);
        let pool_b = registry.pool_for(&b);
        assert!(!Arc::ptr_eq(&pool_a, &pool_b));
        assert_eq!(registry.distinct_comparator_count(), 2);
    }
}
