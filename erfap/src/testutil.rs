// Copyright 2026 the original authors.
// Licensed under the Apache License, Version 2.0 (see LICENSE).

//! Fakes for the external collaborators named in spec.md §6, plus a small
//! `AccessEvent` builder. Test-only scaffolding (SPEC_FULL.md's
//! SUPPLEMENTED FEATURES), mirroring `process_execution::test_utils`.

#![cfg(test)]

use crate::collaborators::{
    AllowListMatch, AllowListReporter, ArtifactId, DiagnosticEvent, EventSink, FileAccessManifest,
    ManifestPolicyFlags, PathInterner, PipGraphFileSystemView, SandboxFileSystemView,
    SemanticPathExpander, SemanticPathInfo, SharedPathTable,
};
use crate::event::{AccessEvent, AccessMethod, AccessStatus, FileFlagsAndAttributes, NativeError, RequestedAccess};
use parking_lot::Mutex;
use path_table::PathId;
use std::collections::HashMap;
use std::sync::Arc;

pub fn event(path: &str) -> AccessEvent {
    AccessEvent {
        requested_access: RequestedAccess::PROBE,
        status: AccessStatus::Allowed,
        method: AccessMethod::Policy,
        path: Some(Arc::from(path)),
        manifest_path: PathId::INVALID,
        process_path: Arc::from("/usr/bin/tool"),
        flags_and_attrs: FileFlagsAndAttributes::empty(),
        opened_attrs: FileFlagsAndAttributes::empty(),
        error: NativeError::Success,
    }
}

impl AccessEvent {
    pub fn with_access(mut self, access: RequestedAccess) -> Self {
        self.requested_access = access;
        self
    }

    pub fn with_status(mut self, status: AccessStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_method(mut self, method: AccessMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_manifest_path(mut self, manifest_path: PathId) -> Self {
        self.manifest_path = manifest_path;
        self
    }

    pub fn with_process_path(mut self, process_path: &str) -> Self {
        self.process_path = Arc::from(process_path);
        self
    }

    pub fn with_opened_attrs(mut self, attrs: FileFlagsAndAttributes) -> Self {
        self.opened_attrs = attrs;
        self
    }

    pub fn with_flags_and_attrs(mut self, attrs: FileFlagsAndAttributes) -> Self {
        self.flags_and_attrs = attrs;
        self
    }

    pub fn with_error(mut self, error: NativeError) -> Self {
        self.error = error;
        self
    }
}

/// A `SemanticPathExpander` that treats every path as valid and
/// non-system, unless explicitly marked otherwise.
#[derive(Default)]
pub struct FakeSemanticExpander {
    overrides: Mutex<HashMap<PathId, SemanticPathInfo>>,
}

impl FakeSemanticExpander {
    pub fn mark_system(&self, path: PathId) {
        self.overrides.lock().insert(
            path,
            SemanticPathInfo {
                valid: true,
                is_system: true,
            },
        );
    }

    pub fn mark_invalid(&self, path: PathId) {
        self.overrides.lock().insert(
            path,
            SemanticPathInfo {
                valid: false,
                is_system: false,
            },
        );
    }
}

impl SemanticPathExpander for FakeSemanticExpander {
    fn info_for(&self, path: PathId) -> SemanticPathInfo {
        self.overrides.lock().get(&path).copied().unwrap_or(SemanticPathInfo {
            valid: true,
            is_system: false,
        })
    }
}

/// A `FileAccessManifest` backed by an explicit map from accessed path to
/// its manifest path.
#[derive(Default)]
pub struct FakeManifest {
    by_path: Mutex<HashMap<PathId, (PathId, ManifestPolicyFlags)>>,
}

impl FakeManifest {
    pub fn set(&self, path: PathId, manifest_path: PathId) {
        self.by_path
            .lock()
            .insert(path, (manifest_path, ManifestPolicyFlags::default()));
    }
}

impl FileAccessManifest for FakeManifest {
    fn find_manifest_path_for(&self, path: PathId) -> Option<(PathId, ManifestPolicyFlags)> {
        self.by_path.lock().get(&path).copied()
    }
}

/// An `AllowListReporter` whose verdict is fixed at construction time.
pub struct FixedAllowList {
    pub verdict: AllowListMatch,
    pub reported_uncacheable: Mutex<Vec<AccessEvent>>,
}

impl FixedAllowList {
    pub fn new(verdict: AllowListMatch) -> Self {
        FixedAllowList {
            verdict,
            reported_uncacheable: Mutex::new(Vec::new()),
        }
    }
}

impl AllowListReporter for FixedAllowList {
    fn match_event(&self, _event: &AccessEvent) -> AllowListMatch {
        self.verdict
    }

    fn add_and_report_uncacheable(&self, event: &AccessEvent, _result: AllowListMatch) {
        self.reported_uncacheable.lock().push(event.clone());
    }
}

#[derive(Default)]
pub struct FakePipGraphView {
    output_dirs: Mutex<HashMap<PathId, bool>>,
}

impl FakePipGraphView {
    pub fn mark_output_directory(&self, path: PathId, is_shared_opaque: bool) {
        self.output_dirs.lock().insert(path, is_shared_opaque);
    }
}

impl PipGraphFileSystemView for FakePipGraphView {
    fn latest_file_artifact_for_path(&self, _path: PathId) -> Option<ArtifactId> {
        None
    }

    fn is_path_under_output_directory(&self, path: PathId) -> (bool, bool) {
        match self.output_dirs.lock().get(&path) {
            Some(is_shared_opaque) => (true, *is_shared_opaque),
            None => (false, false),
        }
    }
}

#[derive(Default)]
pub struct FakeSandboxView {
    created_dirs: Mutex<std::collections::HashSet<PathId>>,
}

impl FakeSandboxView {
    pub fn mark_created(&self, path: PathId) {
        self.created_dirs.lock().insert(path);
    }
}

impl SandboxFileSystemView for FakeSandboxView {
    fn exists_created_directory_in_output_filesystem(&self, path: PathId) -> bool {
        self.created_dirs.lock().contains(&path)
    }
}

#[derive(Default)]
pub struct RecordingEventSink {
    pub events: Mutex<Vec<DiagnosticEvent>>,
}

impl EventSink for RecordingEventSink {
    fn log(&self, event: DiagnosticEvent) {
        self.events.lock().push(event);
    }
}

pub fn shared_path_table() -> Arc<SharedPathTable> {
    Arc::new(SharedPathTable::new())
}
