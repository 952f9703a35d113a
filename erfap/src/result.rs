// Copyright 2026 the original authors.
// Licensed under the Apache License, Version 2.0 (see LICENSE).

//! `ProcessorResult`: the frozen, disposable bundle `Processor::freeze`
//! hands to the caller (spec.md §4.6, component C7). Named `Processor
//! Result` rather than `Result` to avoid colliding with `std::result`.

use crate::event::AccessEvent;
use crate::path_state::PathState;
use crate::pool::{Pool, PathComparator};
use indexmap::IndexSet;
use path_table::PathId;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// The collection-level pools a `Processor` acquires its working state
/// from and a `ProcessorResult` releases back into on `dispose` (spec.md
/// §5, §9). One instance is shared by every `Processor` in the process.
pub struct Pools {
    pub accesses_by_path: Pool<HashMap<PathId, PathState>>,
    pub dynamic_write_accesses: Pool<HashMap<PathId, IndexSet<PathId>>>,
    pub path_sets: Pool<HashSet<PathId>>,
    pub event_sets: Pool<IndexSet<AccessEvent>>,
    pub sorted_observations: crate::pool::ComparatorKeyedPool<Vec<PathId>>,
}

impl Pools {
    pub fn new() -> Self {
        Pools {
            accesses_by_path: Pool::new(),
            dynamic_write_accesses: Pool::new(),
            path_sets: Pool::new(),
            event_sets: Pool::new(),
            sorted_observations: crate::pool::ComparatorKeyedPool::new(),
        }
    }
}

impl Default for Pools {
    fn default() -> Self {
        Pools::new()
    }
}

/// Frozen output of a `Processor` (spec.md §4.6). Consumers may mutate the
/// collections after receiving this — that is deliberate, downstream
/// cache-fingerprinting code refines them further.
pub struct ProcessorResult {
    pub accesses_by_path: HashMap<PathId, PathState>,
    /// Canonical iteration order for fingerprinting, per the
    /// expanded-path comparator supplied to `Processor::new`. Holds only
    /// paths that are live observations — i.e. excludes anything claimed
    /// by a shared opaque (spec.md §8 property 1) or a static output
    /// (property 6); look up the `PathState` itself via
    /// `accesses_by_path`.
    pub sorted_observations_by_path: Vec<PathId>,
    pub created_directories: HashSet<PathId>,
    pub dynamic_write_accesses: HashMap<PathId, IndexSet<PathId>>,
    pub file_existence_denials: HashSet<PathId>,
    pub maybe_unresolved_absent_accesses: HashSet<PathId>,
    pub explicitly_reported_file_accesses: IndexSet<AccessEvent>,
    comparator: PathComparator,
}

impl ProcessorResult {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        accesses_by_path: HashMap<PathId, PathState>,
        sorted_observations_by_path: Vec<PathId>,
        created_directories: HashSet<PathId>,
        dynamic_write_accesses: HashMap<PathId, IndexSet<PathId>>,
        file_existence_denials: HashSet<PathId>,
        maybe_unresolved_absent_accesses: HashSet<PathId>,
        explicitly_reported_file_accesses: IndexSet<AccessEvent>,
        comparator: PathComparator,
    ) -> Self {
        ProcessorResult {
            accesses_by_path,
            sorted_observations_by_path,
            created_directories,
            dynamic_write_accesses,
            file_existence_denials,
            maybe_unresolved_absent_accesses,
            explicitly_reported_file_accesses,
            comparator,
        }
    }

    /// Returns every collection's backing memory to `pools` (spec.md
    /// §4.6: "on disposal it returns them to the pool"). `accesses_by_path`
    /// isn't pool-tracked as a single object type shared with the two
    /// other `HashSet<PathId>` fields below it, since `Pool` is keyed by
    /// concrete type, not by field name — all three share one pool.
    pub fn dispose(self, pools: &Pools) {
        pools.accesses_by_path.release(self.accesses_by_path);
        pools
            .sorted_observations
            .pool_for(&self.comparator)
            .release(self.sorted_observations_by_path);
        pools.path_sets.release(self.created_directories);
        pools.dynamic_write_accesses.release(self.dynamic_write_accesses);
        pools.path_sets.release(self.file_existence_denials);
        pools.path_sets.release(self.maybe_unresolved_absent_accesses);
        pools.event_sets.release(self.explicitly_reported_file_accesses);
    }
}

#[cfg(test)]
mod result_tests {
    use super::*;

    fn comparator() -> PathComparator {
        Arc::new(|a: &str, b: &str| a.cmp(b))
    }

    #[test]
    fn dispose_returns_collections_to_the_pool() {
        let pools = Pools::new();
        let result = ProcessorResult::new(
            pools.accesses_by_path.acquire(),
            pools.sorted_observations.pool_for(&comparator()).acquire(),
            pools.path_sets.acquire(),
            pools.dynamic_write_accesses.acquire(),
            pools.path_sets.acquire(),
            pools.path_sets.acquire(),
            pools.event_sets.acquire(),
            comparator(),
        );

        result.dispose(&pools);

        assert_eq!(pools.accesses_by_path.idle_count(), 1);
        assert_eq!(pools.dynamic_write_accesses.idle_count(), 1);
        assert_eq!(pools.event_sets.idle_count(), 1);
        // Three `HashSet<PathId>` fields were released into the same pool.
        assert_eq!(pools.path_sets.idle_count(), 3);
    }
}
