// Copyright 2026 the original authors.
// Licensed under the Apache License, Version 2.0 (see LICENSE).

//! `PathState`: the mutable, per-path rolling union of flags, events, and
//! status bits (spec.md §3).

use crate::event::AccessEvent;
use crate::flags::ObservationFlags;
use indexmap::IndexSet;

/// One per accessed path, created on first inclusion and mutated only via
/// `Processor::add`/`remove` (spec.md §3, "Lifecycles").
#[derive(Clone, Debug, Default)]
pub struct PathState {
    /// Ordered by arrival, deduplicated — `IndexSet` gives us both for
    /// free, the way `indexmap` is already reached for elsewhere in this
    /// workspace for ordered, deduplicated collections.
    events: IndexSet<AccessEvent>,
    pub flags: ObservationFlags,
    pub has_directory_reparse_point_treated_as_file: bool,
    pub is_shared_opaque_output: bool,
    pub is_absent_access: bool,
}

impl PathState {
    pub fn new() -> Self {
        PathState {
            events: IndexSet::new(),
            flags: ObservationFlags::empty(),
            has_directory_reparse_point_treated_as_file: false,
            is_shared_opaque_output: false,
            // Starts true; cleared by the first non-absent, non-enumeration
            // access (spec.md §3).
            is_absent_access: true,
        }
    }

    pub fn events(&self) -> impl Iterator<Item = &AccessEvent> {
        self.events.iter()
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// `FileProbe` must be recomputed against the *whole* history: a path
    /// is probe-only if every event folded in so far (including the one
    /// about to be added) is a `Probe`, once each event's incremental-tool
    /// reclassification (spec.md §4.4 step 7) is taken into account. The
    /// caller passes whether the incoming event is itself an effective
    /// probe, plus `is_incremental_tool` so that *stored* events are
    /// reclassified the same way: a stored event's literal
    /// `requested_access` bit never changes (spec.md §3's event record is
    /// immutable), so whether it counts as a probe for this fold must be
    /// recomputed from its own `process_path` every time, not read off a
    /// bit decided once at insertion. Without this, a probe from an
    /// incremental tool (correctly treated as non-probe when it arrived)
    /// could make a later, unrelated tool's probe on the same path
    /// incorrectly resurrect `FileProbe`.
    pub fn is_probe_only_including(
        &self,
        incoming_is_probe: bool,
        is_incremental_tool: impl Fn(&std::sync::Arc<str>) -> bool,
    ) -> bool {
        incoming_is_probe
            && self.events.iter().all(|e| {
                e.requested_access.contains(crate::event::RequestedAccess::PROBE)
                    && !is_incremental_tool(&e.process_path)
            })
    }

    /// Records `event` in this path's per-event set (idempotent: adding
    /// the same event twice is a no-op, spec.md §8 property 8).
    pub fn record_event(&mut self, event: AccessEvent) {
        self.events.insert(event);
    }

    /// Removes `event` from the per-event set, mirroring
    /// `Processor::remove`'s narrow contract (spec.md §4.5). Flags are
    /// deliberately left untouched; the caller is expected to `add` an
    /// equivalent allowed access immediately after.
    pub fn remove_event(&mut self, event: &AccessEvent) -> bool {
        self.events.shift_remove(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{AccessMethod, AccessStatus, FileFlagsAndAttributes, NativeError, RequestedAccess};
    use std::sync::Arc;

    fn probe_event() -> AccessEvent {
        AccessEvent {
            requested_access: RequestedAccess::PROBE,
            status: AccessStatus::Allowed,
            method: AccessMethod::Policy,
            path: Some(Arc::from("/src/a.h")),
            manifest_path: path_table::PathId::INVALID,
            process_path: Arc::from("/usr/bin/cc"),
            flags_and_attrs: FileFlagsAndAttributes::empty(),
            opened_attrs: FileFlagsAndAttributes::empty(),
            error: NativeError::Success,
        }
    }

    #[test]
    fn new_state_starts_absent() {
        let state = PathState::new();
        assert!(state.is_absent_access);
        assert_eq!(state.event_count(), 0);
    }

    #[test]
    fn duplicate_add_is_idempotent() {
        let mut state = PathState::new();
        let event = probe_event();
        state.record_event(event.clone());
        state.record_event(event);
        assert_eq!(state.event_count(), 1);
    }

    #[test]
    fn remove_then_readd_restores_event() {
        let mut state = PathState::new();
        let event = probe_event();
        state.record_event(event.clone());
        assert!(state.remove_event(&event));
        assert_eq!(state.event_count(), 0);
        state.record_event(event);
        assert_eq!(state.event_count(), 1);
    }
}
