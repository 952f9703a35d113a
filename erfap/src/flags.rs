// Copyright 2026 the original authors.
// Licensed under the Apache License, Version 2.0 (see LICENSE).

//! `ObservationFlags`: the per-path bit lattice from spec.md §3, modeled
//! as pure merge functions over a bitset (spec.md §9, "Sticky flag
//! lattice... implement merges as pure functions for ease of property
//! testing").

use bitflags::bitflags;

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ObservationFlags: u8 {
        const FILE_PROBE = 0b0000_0001;
        const DIRECTORY_LOCATION = 0b0000_0010;
        const ENUMERATION = 0b0000_0100;
    }
}

impl ObservationFlags {
    /// `FileProbe` is sticky-off: true only while every access folded in
    /// so far has been a probe. The caller recomputes `is_probe_now` over
    /// the path's whole access history (see `PathState::is_probe_only`),
    /// so setting/clearing here is idempotent with respect to order.
    pub fn merge_file_probe(self, is_probe_now: bool) -> Self {
        if is_probe_now {
            self | ObservationFlags::FILE_PROBE
        } else {
            self - ObservationFlags::FILE_PROBE
        }
    }

    /// `Enumeration` is sticky-on: once set it is never cleared.
    pub fn merge_enumeration(self, has_enumeration_this_access: bool) -> Self {
        if has_enumeration_this_access {
            self | ObservationFlags::ENUMERATION
        } else {
            self
        }
    }

    /// `DirectoryLocation` is sticky-on, but is overridden off whenever
    /// `has_directory_reparse_point_treated_as_file` has ever been set for
    /// the path (that flag is itself sticky-on in `PathState`, so the
    /// override is stable once triggered).
    pub fn merge_directory_location(
        self,
        is_directory_location_this_access: bool,
        reparse_point_override_sticky: bool,
    ) -> Self {
        let unioned = if is_directory_location_this_access {
            self | ObservationFlags::DIRECTORY_LOCATION
        } else {
            self
        };
        if reparse_point_override_sticky {
            unioned - ObservationFlags::DIRECTORY_LOCATION
        } else {
            unioned
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_probe_is_sticky_off() {
        let flags = ObservationFlags::empty().merge_file_probe(true);
        assert!(flags.contains(ObservationFlags::FILE_PROBE));
        let flags = flags.merge_file_probe(false);
        assert!(!flags.contains(ObservationFlags::FILE_PROBE));
        // Once cleared, a later probe-only recompute cannot resurrect it
        // for the same path in `PathState` because `is_probe_now` folds
        // in the whole history; at the bitset level alone re-merging true
        // would set it again, which is why `PathState` is the one that
        // must never recompute `is_probe_now` as true after a non-probe.
        let flags = flags.merge_file_probe(true);
        assert!(flags.contains(ObservationFlags::FILE_PROBE));
    }

    #[test]
    fn enumeration_is_sticky_on() {
        let flags = ObservationFlags::empty().merge_enumeration(true);
        assert!(flags.contains(ObservationFlags::ENUMERATION));
        let flags = flags.merge_enumeration(false);
        assert!(flags.contains(ObservationFlags::ENUMERATION));
    }

    #[test]
    fn directory_location_overridden_by_reparse_sticky() {
        let flags = ObservationFlags::empty().merge_directory_location(true, false);
        assert!(flags.contains(ObservationFlags::DIRECTORY_LOCATION));
        let flags = flags.merge_directory_location(false, true);
        assert!(!flags.contains(ObservationFlags::DIRECTORY_LOCATION));
        // Sticky: a later access that isn't itself a directory location,
        // with the override still in force, stays cleared.
        let flags = flags.merge_directory_location(false, true);
        assert!(!flags.contains(ObservationFlags::DIRECTORY_LOCATION));
    }
}
