// Copyright 2026 the original authors.
// Licensed under the Apache License, Version 2.0 (see LICENSE).

//! Per-pip memoization for the pure, expensive-to-recompute decisions in
//! `classifier` (spec.md §4.7). A `Caches` is owned by exactly one
//! `Processor` and lives no longer than the pip it was built for (spec.md
//! §9's "no persistence between pip runs" non-goal applies here too).

use parking_lot::RwLock;
use path_table::PathId;
use std::collections::HashMap;
use std::sync::Arc;

/// spec.md §4.7: "a small cache keyed by process path, remembering whether
/// that process is one of the configured incremental tools."
#[derive(Default)]
pub struct IncrementalToolCache {
    by_process_path: RwLock<HashMap<Arc<str>, bool>>,
}

impl IncrementalToolCache {
    pub fn new() -> Self {
        IncrementalToolCache::default()
    }

    pub fn get_or_compute(&self, process_path: &Arc<str>, compute: impl FnOnce() -> bool) -> bool {
        if let Some(hit) = self.by_process_path.read().get(process_path.as_ref()) {
            return *hit;
        }
        let value = compute();
        self.by_process_path
            .write()
            .insert(process_path.clone(), value);
        value
    }

    pub fn len(&self) -> usize {
        self.by_process_path.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// spec.md §4.7: "a cache of (tool, path) pairs already excluded as
/// tool-temp-files, so repeated probes of the same temp file by the same
/// tool are not reclassified every time."
#[derive(Default)]
pub struct ToolTempFileCache {
    excluded: RwLock<std::collections::HashSet<(Arc<str>, PathId)>>,
}

impl ToolTempFileCache {
    pub fn new() -> Self {
        ToolTempFileCache::default()
    }

    pub fn get_or_compute(
        &self,
        process_path: &Arc<str>,
        path: PathId,
        compute: impl FnOnce() -> bool,
    ) -> bool {
        let key = (process_path.clone(), path);
        if self.excluded.read().contains(&key) {
            return true;
        }
        let is_temp = compute();
        if is_temp {
            self.excluded.write().insert(key);
        }
        is_temp
    }

    pub fn len(&self) -> usize {
        self.excluded.read().len()
    }
}
