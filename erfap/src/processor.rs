// Copyright 2026 the original authors.
// Licensed under the Apache License, Version 2.0 (see LICENSE).

//! `Processor`: the public façade (spec.md §4.4–§4.6, component C6).
//! Single-producer entry points `add`, `remove`, `freeze`; owns all
//! mutable per-pip state. Not internally synchronized — spec.md §5
//! requires the caller to serialize calls for one pip, the same way a
//! single sandbox reporting channel is inherently single-producer.

use crate::caches::{IncrementalToolCache, ToolTempFileCache};
use crate::classifier::{self, is_tool_temp_file};
use crate::collaborators::{
    AllowListMatch, AllowListReporter, DiagnosticEvent, EventSink, FileAccessManifest,
    PathInterner, PipGraphFileSystemView, SandboxFileSystemView, SemanticPathExpander,
};
use crate::config::Config;
use crate::error::{fatal, ContractViolation};
use crate::event::{AccessEvent, RequestedAccess};
use crate::path_state::PathState;
use crate::pool::PathComparator;
use crate::result::{Pools, ProcessorResult};
use indexmap::IndexSet;
use path_table::PathId;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Immutable, per-pip construction context (spec.md §6's exposed-surface
/// constructor). Grouped into its own type the way
/// `process_execution::Context` bundles a command's immutable
/// collaborators instead of spreading them across positional
/// constructor arguments.
pub struct ProcessorContext {
    pub config: Config,
    pub comparator: PathComparator,
    pub path_interner: Arc<dyn PathInterner>,
    pub manifest: Arc<dyn FileAccessManifest>,
    pub semantic_expander: Arc<dyn SemanticPathExpander>,
    pub dir_symlinks_as_dirs: HashSet<PathId>,
    pub allow_list: Arc<dyn AllowListReporter>,
    pub inputs_under_shared_opaques: HashSet<PathId>,
    pub pip_graph_view: Arc<dyn PipGraphFileSystemView>,
    pub sandbox_view: Option<Arc<dyn SandboxFileSystemView>>,
    pub event_sink: Arc<dyn EventSink>,
    pub static_outputs: HashSet<PathId>,
    pub exclusive_opaque_outputs: HashSet<PathId>,
    /// Fixed at construction (spec.md §3 invariant 6); also the initial
    /// key set of `dynamic_write_accesses`.
    pub shared_opaque_roots: HashSet<PathId>,
    pub pip_is_incremental_output_preserving: bool,
    /// Whether this pip is declared to permit undeclared reads of its
    /// own freshly created directories (spec.md §4.4 step 2); part of the
    /// pip declaration, not of `Config`.
    pub pip_permits_undeclared_source_reads: bool,
}

pub struct Processor {
    ctx: ProcessorContext,
    incremental_tool_cache: IncrementalToolCache,
    tool_temp_file_cache: ToolTempFileCache,
    /// Parent directories of every declared output (static, exclusive
    /// opaque, and shared opaque root), fixed at construction — consulted
    /// by the csc/cvtres/resonexe temp-file carve-out, which spec.md §4.1
    /// scopes to "*.tmp in the same directory as outputs".
    output_parent_dir_ids: HashSet<PathId>,

    accesses_by_path: HashMap<PathId, PathState>,
    sorted_observations_by_path: Vec<PathId>,
    created_directories: HashSet<PathId>,
    dynamic_write_accesses: HashMap<PathId, IndexSet<PathId>>,
    file_existence_denials: HashSet<PathId>,
    maybe_unresolved_absent_accesses: HashSet<PathId>,
    explicitly_reported_file_accesses: IndexSet<AccessEvent>,

    frozen: bool,
}

impl Processor {
    pub fn new(ctx: ProcessorContext) -> Self {
        let mut dynamic_write_accesses = HashMap::new();
        for root in &ctx.shared_opaque_roots {
            dynamic_write_accesses.insert(*root, IndexSet::new());
        }
        let output_parent_dir_ids: HashSet<PathId> = ctx
            .static_outputs
            .iter()
            .chain(ctx.exclusive_opaque_outputs.iter())
            .chain(ctx.shared_opaque_roots.iter())
            .filter_map(|&output| ctx.path_interner.parent(output))
            .collect();
        Processor {
            ctx,
            incremental_tool_cache: IncrementalToolCache::new(),
            tool_temp_file_cache: ToolTempFileCache::new(),
            output_parent_dir_ids,
            accesses_by_path: HashMap::new(),
            sorted_observations_by_path: Vec::new(),
            created_directories: HashSet::new(),
            dynamic_write_accesses,
            file_existence_denials: HashSet::new(),
            maybe_unresolved_absent_accesses: HashSet::new(),
            explicitly_reported_file_accesses: IndexSet::new(),
            frozen: false,
        }
    }

    fn require_not_frozen(&self, method: &'static str) {
        if self.frozen {
            fatal(ContractViolation::UseAfterFreeze { method });
        }
    }

    fn insert_sorted(&mut self, path: PathId) {
        let expanded = self.ctx.path_interner.expand(path);
        let idx = self
            .sorted_observations_by_path
            .binary_search_by(|candidate| {
                (self.ctx.comparator)(&self.ctx.path_interner.expand(*candidate), &expanded)
            })
            .unwrap_or_else(|insert_at| insert_at);
        self.sorted_observations_by_path.insert(idx, path);
    }

    fn remove_from_sorted(&mut self, path: PathId) {
        if let Some(idx) = self.sorted_observations_by_path.iter().position(|p| *p == path) {
            self.sorted_observations_by_path.remove(idx);
        }
    }

    fn is_incremental_tool(&self, process_path: &Arc<str>) -> bool {
        let config = &self.ctx.config;
        self.incremental_tool_cache
            .get_or_compute(process_path, || config.matches_incremental_tool(process_path))
    }

    fn is_tool_temp_file_cached(&self, event: &AccessEvent, path: PathId) -> bool {
        let raw_path = event.path.as_deref().unwrap_or_default();
        let process_path = event.process_path.clone();
        let same_directory_as_output = self
            .ctx
            .path_interner
            .parent(path)
            .is_some_and(|parent| self.output_parent_dir_ids.contains(&parent));
        self.tool_temp_file_cache.get_or_compute(&process_path, path, || {
            is_tool_temp_file(&event.process_path, raw_path, same_directory_as_output)
        })
    }

    /// spec.md §4.4: `add(event)`.
    pub fn add(&mut self, event: AccessEvent) {
        self.require_not_frozen("add");

        // Step 1: record the raw event, unfiltered.
        self.explicitly_reported_file_accesses.insert(event.clone());

        let parsed_path = event
            .path
            .as_deref()
            .and_then(|raw_path| self.ctx.path_interner.create(raw_path).ok());

        // Step 2: created-directory tracking, independent of inclusion.
        if let Some(parsed) = parsed_path {
            if event.is_dir_effectively_created()
                && self.ctx.pip_permits_undeclared_source_reads
                && self
                    .ctx
                    .sandbox_view
                    .as_ref()
                    .is_some_and(|view| view.exists_created_directory_in_output_filesystem(parsed))
            {
                self.created_directories.insert(parsed);
            }
        }

        // Per-tool temp-file memoization (spec.md §4.1, §4.7): once a
        // (process_path, path) pair has been classified as a special
        // tool's temp file, later events on it are excluded without
        // re-running the suffix/regex checks in `classifier`.
        if let Some(parsed) = parsed_path {
            if self.is_tool_temp_file_cached(&event, parsed) {
                return;
            }
        }

        // Step 3: inclusion.
        let pip_is_incremental = self.ctx.pip_is_incremental_output_preserving;
        let inclusion = classifier::should_include(
            &event,
            &self.ctx.config,
            self.ctx.path_interner.as_ref(),
            self.ctx.semantic_expander.as_ref(),
            pip_is_incremental,
            &self.output_parent_dir_ids,
        );
        if !inclusion.include {
            if event.path.is_none() {
                self.ctx.event_sink.log(DiagnosticEvent::PathParseFailed {
                    raw_path: String::new(),
                    reason: "event carried no path".to_string(),
                });
            } else if inclusion.path.is_none() {
                self.ctx.event_sink.log(DiagnosticEvent::PathParseFailed {
                    raw_path: event.path.as_deref().unwrap_or_default().to_string(),
                    reason: "path failed to parse".to_string(),
                });
            } else if inclusion.reason == Some(classifier::ExclusionReason::SystemMount) {
                self.ctx.event_sink.log(DiagnosticEvent::SpecialDeviceIgnored {
                    path: inclusion.path.expect("reason is only set alongside a parsed path"),
                });
            }
            return;
        }
        let Some(path) = inclusion.path else {
            return;
        };

        // Step 4: obtain or create PathState.
        let is_new_path = !self.accesses_by_path.contains_key(&path);
        self.accesses_by_path.entry(path).or_insert_with(PathState::new);

        // Step 5: already claimed by a shared opaque.
        if self.accesses_by_path[&path].is_shared_opaque_output {
            return;
        }

        // Step 6: static outputs are exists-only markers.
        if self.ctx.static_outputs.contains(&path) {
            return;
        }

        // Step 7: compute candidate flag updates.
        let (is_directory_location, reparse_override) = classifier::is_directory_location(
            &event,
            path,
            &self.ctx.config,
            &self.ctx.dir_symlinks_as_dirs,
            self.manifest_requests_full_reparse_point_resolving(path),
        );
        // Incremental tools re-classify their own probes as non-probe so
        // they contribute to fingerprinting (spec.md §4.4 step 7).
        let incoming_is_probe_effective = event.requested_access.contains(RequestedAccess::PROBE)
            && !self.is_incremental_tool(&event.process_path);
        let is_probe_now = self.accesses_by_path[&path]
            .is_probe_only_including(incoming_is_probe_effective, |p| self.is_incremental_tool(p));
        // The "existing-directory probes as enumerations" config only
        // promotes accesses that are themselves probe-shaped (`Probe` or
        // `EnumerationProbe`) of an existing directory; a plain `Write` (or
        // `Read`) that happens to resolve to a directory location is not an
        // "existing-directory probe" and must not set `Enumeration` through
        // this clause (spec.md §4.4 step 7).
        let has_enumeration = event.requested_access.contains(RequestedAccess::ENUMERATE)
            || (self.ctx.config.existing_directory_probes_as_enumerations
                && is_directory_location
                && event
                    .requested_access
                    .intersects(RequestedAccess::PROBE | RequestedAccess::ENUMERATION_PROBE));

        // Step 8: shared-opaque attribution for file writes.
        if event.is_file_write() {
            if event.method.is_file_existence_based() && event.status.is_denied() {
                self.file_existence_denials.insert(path);
            }

            if let Some(root) = crate::shared_opaque::attribute_to_shared_opaque(
                &event,
                self.ctx.path_interner.as_ref(),
                &self.ctx.shared_opaque_roots,
            ) {
                let verdict = if self.ctx.config.do_not_apply_allowlist_to_dynamic_outputs {
                    AllowListMatch::NoMatch
                } else {
                    self.ctx.allow_list.match_event(&event)
                };
                if !matches!(verdict, AllowListMatch::NoMatch) {
                    self.ctx.allow_list.add_and_report_uncacheable(&event, verdict);
                    if verdict.is_match_not_cacheable() {
                        self.ctx
                            .event_sink
                            .log(DiagnosticEvent::UncacheableAllowListMatch { path });
                    }
                }

                let is_static_or_exclusive = self.ctx.static_outputs.contains(&path)
                    || self.ctx.exclusive_opaque_outputs.contains(&path);
                if matches!(verdict, AllowListMatch::NoMatch) || is_static_or_exclusive {
                    let state = self.accesses_by_path.get_mut(&path).expect("inserted above");
                    state.is_shared_opaque_output = true;
                    self.dynamic_write_accesses.entry(root).or_default().insert(path);
                    self.remove_from_sorted(path);
                    return;
                }
                // Matched and not overridden: the allow-list permits the
                // write outright, so it is discarded rather than folded
                // into observations. The write has been reclassified away
                // from the shared-opaque candidate it was attributed to,
                // so any denial tracked for it is stale (spec.md §4.4 step
                // 9's "kept in sync" note on step 8's first bullet).
                self.file_existence_denials.remove(&path);
                return;
            }
            // Step 9 applies only to the "matched and not overridden"
            // case above: a write with no attributable shared-opaque root
            // at all was never a shared-opaque candidate to begin with, so
            // a `FileExistenceDenials` entry for it (from this or an
            // earlier event on the same path) is left untouched — it is
            // exactly what scenario S5 needs surfaced until the caller's
            // explicit `remove`/`add` two-step resolves it.
        }

        // Step 10: undeclared accesses under shared opaques.
        if self.ctx.config.ignore_undeclared_accesses_under_shared_opaques {
            let (under_output_directory, is_shared_opaque) =
                self.ctx.pip_graph_view.is_path_under_output_directory(path);
            if under_output_directory
                && is_shared_opaque
                && !self.ctx.inputs_under_shared_opaques.contains(&path)
            {
                return;
            }
        }

        // Steps 11-12: merge flags, record the event.
        {
            let state = self.accesses_by_path.get_mut(&path).expect("inserted above");
            state.flags = state
                .flags
                .merge_file_probe(is_probe_now)
                .merge_enumeration(has_enumeration)
                .merge_directory_location(is_directory_location, state.has_directory_reparse_point_treated_as_file);
            if reparse_override {
                state.has_directory_reparse_point_treated_as_file = true;
            }
            state.record_event(event.clone());
        }

        // Step 13: absent-access tracking (spec.md §8 property 5 requires
        // `is_absent_access` to stay correct unconditionally; whether a
        // still-unresolved absent path also lands in
        // `MaybeUnresolvedAbsentAccesses` is additionally gated on full
        // reparse-point resolution being enabled, per spec.md §4.4 step 13).
        if !has_enumeration {
            let state = self.accesses_by_path.get_mut(&path).expect("inserted above");
            if state.is_absent_access {
                if event.error.is_absent() {
                    if self.ctx.config.enable_full_reparse_point_resolving {
                        self.maybe_unresolved_absent_accesses.insert(path);
                    }
                } else {
                    state.is_absent_access = false;
                    self.maybe_unresolved_absent_accesses.remove(&path);
                }
            }
        }

        // Step 14: insert into the sorted observation order.
        if is_new_path {
            self.insert_sorted(path);
        }
    }

    fn manifest_requests_full_reparse_point_resolving(&self, path: PathId) -> bool {
        self.ctx
            .manifest
            .find_manifest_path_for(path)
            .is_some_and(|(_, flags)| flags.requests_full_reparse_point_resolving)
    }

    /// spec.md §4.5: `remove(event)`. The only supported removal: a Write
    /// decided by FileExistenceBased. Anything else is a contract
    /// violation.
    pub fn remove(&mut self, event: &AccessEvent) {
        self.require_not_frozen("remove");
        if !(event.requested_access.contains(RequestedAccess::WRITE)
            && event.method.is_file_existence_based())
        {
            fatal(ContractViolation::IllegalRemove {
                reason: "remove only supports a FileExistenceBased Write",
            });
        }

        let Some(raw_path) = event.path.as_deref() else {
            return;
        };
        let Ok(path) = self.ctx.path_interner.create(raw_path) else {
            return;
        };
        if let Some(state) = self.accesses_by_path.get_mut(&path) {
            state.remove_event(event);
        }
        self.file_existence_denials.remove(&path);
    }

    /// spec.md §4.6: `freeze() -> Result`. Idempotent-once: a second call
    /// is a contract violation.
    pub fn freeze(mut self, pools: &Pools) -> ProcessorResult {
        if self.frozen {
            fatal(ContractViolation::DoubleFreeze);
        }
        self.frozen = true;

        let mut accesses_by_path = pools.accesses_by_path.acquire();
        accesses_by_path.extend(std::mem::take(&mut self.accesses_by_path));

        let mut sorted_observations_by_path =
            pools.sorted_observations.pool_for(&self.ctx.comparator).acquire();
        sorted_observations_by_path.extend(std::mem::take(&mut self.sorted_observations_by_path));

        let mut created_directories = pools.path_sets.acquire();
        created_directories.extend(std::mem::take(&mut self.created_directories));

        let mut dynamic_write_accesses = pools.dynamic_write_accesses.acquire();
        dynamic_write_accesses.extend(std::mem::take(&mut self.dynamic_write_accesses));

        let mut file_existence_denials = pools.path_sets.acquire();
        file_existence_denials.extend(std::mem::take(&mut self.file_existence_denials));

        let mut maybe_unresolved_absent_accesses = pools.path_sets.acquire();
        maybe_unresolved_absent_accesses.extend(std::mem::take(&mut self.maybe_unresolved_absent_accesses));

        let mut explicitly_reported_file_accesses = pools.event_sets.acquire();
        explicitly_reported_file_accesses.extend(std::mem::take(&mut self.explicitly_reported_file_accesses));

        ProcessorResult::new(
            accesses_by_path,
            sorted_observations_by_path,
            created_directories,
            dynamic_write_accesses,
            file_existence_denials,
            maybe_unresolved_absent_accesses,
            explicitly_reported_file_accesses,
            self.ctx.comparator.clone(),
        )
    }

    /// spec.md §6: "Query: `explicitly_reported_file_accesses() -> &set<AccessEvent>`".
    pub fn explicitly_reported_file_accesses(&self) -> &IndexSet<AccessEvent> {
        &self.explicitly_reported_file_accesses
    }
}
