// Copyright 2026 the original authors.
// Licensed under the Apache License, Version 2.0 (see LICENSE).

//! Trait boundaries for everything spec.md §6 lists as "consumed from
//! external collaborators": the path interner, the pip-graph and sandbox
//! filesystem views, the file-access manifest, the allow-list, and the
//! semantic-path expander. `Processor` depends on these as `Arc<dyn
//! Trait>` the way `process_execution::CommandRunner` depends on `Store`
//! and `NamedCaches` through narrow interfaces rather than owning their
//! implementations.

use path_table::PathId;

/// spec.md §6, C1: interns path strings into compact ids and answers
/// parent/name/root/ancestor/expand queries. Implemented for
/// `path_table::PathTable` via `SharedPathTable` in this module; a real
/// build system is free to back this with whatever path table it already
/// maintains for its pip graph.
pub trait PathInterner: Send + Sync {
    fn create(&self, path: &str) -> Result<PathId, String>;
    fn name(&self, id: PathId) -> String;
    fn parent(&self, id: PathId) -> Option<PathId>;
    fn root(&self, id: PathId) -> PathId;
    /// Innermost first, outermost (root) last, `id` itself included.
    fn enumerate_ancestors(&self, id: PathId) -> Vec<PathId>;
    fn expand(&self, id: PathId) -> String;
}

/// A `path_table::PathTable` behind a lock, so it can be shared (as spec.md
/// §5 requires of the path table) across `Processor`s running on different
/// worker threads for different pips.
pub struct SharedPathTable(parking_lot::Mutex<path_table::PathTable>);

impl SharedPathTable {
    pub fn new() -> Self {
        SharedPathTable(parking_lot::Mutex::new(path_table::PathTable::new()))
    }
}

impl PathInterner for SharedPathTable {
    fn create(&self, path: &str) -> Result<PathId, String> {
        self.0.lock().create(path)
    }

    fn name(&self, id: PathId) -> String {
        self.0.lock().name(id).to_owned()
    }

    fn parent(&self, id: PathId) -> Option<PathId> {
        self.0.lock().parent(id)
    }

    fn root(&self, id: PathId) -> PathId {
        self.0.lock().root(id)
    }

    fn enumerate_ancestors(&self, id: PathId) -> Vec<PathId> {
        self.0.lock().enumerate_ancestors(id).collect()
    }

    fn expand(&self, id: PathId) -> String {
        self.0.lock().expand(id)
    }
}

/// spec.md §6: "Sandbox file-system view".
pub trait SandboxFileSystemView: Send + Sync {
    fn exists_created_directory_in_output_filesystem(&self, path: PathId) -> bool;
}

/// spec.md §6: "Pip-graph file-system view".
pub trait PipGraphFileSystemView: Send + Sync {
    fn latest_file_artifact_for_path(&self, path: PathId) -> Option<ArtifactId>;
    /// `(is_under_output_directory, is_shared_opaque)`.
    fn is_path_under_output_directory(&self, path: PathId) -> (bool, bool);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ArtifactId(pub u64);

/// spec.md §6: "File-access manifest" policy flags attached to a manifest
/// path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ManifestPolicyFlags {
    pub requests_full_reparse_point_resolving: bool,
}

pub trait FileAccessManifest: Send + Sync {
    fn find_manifest_path_for(&self, path: PathId) -> Option<(PathId, ManifestPolicyFlags)>;
}

/// spec.md §6: allow-list match outcome — the three-variant sum spec.md §9
/// calls out explicitly ("allow-list match is a three-variant sum").
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::EnumIs)]
pub enum AllowListMatch {
    NoMatch,
    MatchCacheable,
    MatchNotCacheable,
}

pub trait AllowListReporter: Send + Sync {
    fn match_event(&self, event: &crate::event::AccessEvent) -> AllowListMatch;
    fn add_and_report_uncacheable(&self, event: &crate::event::AccessEvent, result: AllowListMatch);
}

/// spec.md §6: "Semantic-path expander".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SemanticPathInfo {
    pub valid: bool,
    pub is_system: bool,
}

pub trait SemanticPathExpander: Send + Sync {
    fn info_for(&self, path: PathId) -> SemanticPathInfo;
}

/// The caller-notification call sites spec.md §7 requires the core to
/// "delegate logging to caller-provided log functions" at: path-parse
/// failure, special-device ignored, and uncacheable allow-list match.
/// spec.md §7's prose also names a "wildcard-path ignored" call site, but
/// no wildcard-path concept exists anywhere else in spec.md's classifier
/// rules (§4.1's exclusions are device paths, coverage artifacts, tool
/// temp-files, and directory create/remove) — there is nothing in this
/// implementation for such a variant to be constructed from, so it is not
/// modeled here. Added by SPEC_FULL.md's AMBIENT STACK section: spec.md
/// names the obligation but not a concrete trait for it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiagnosticEvent {
    PathParseFailed { raw_path: String, reason: String },
    SpecialDeviceIgnored { path: PathId },
    UncacheableAllowListMatch { path: PathId },
}

pub trait EventSink: Send + Sync {
    fn log(&self, event: DiagnosticEvent);
}

/// An `EventSink` that forwards to the `log` facade at `debug` level —
/// the sensible default for a caller that doesn't need these events
/// structured any further (mirrors how much of `process_execution` just
/// calls `log::debug!` directly at its own decision points).
pub struct LogEventSink;

impl EventSink for LogEventSink {
    fn log(&self, event: DiagnosticEvent) {
        log::debug!("erfap: {event:?}");
    }
}
