// Copyright 2026 the original authors.
// Licensed under the Apache License, Version 2.0 (see LICENSE).

//! `AccessEvent` and the small closed enums/bitsets around it (spec.md §3,
//! "AccessEvent"). Sum types over inheritance: these are deliberately
//! plain, exhaustively-matched tagged unions (spec.md §9).

use bitflags::bitflags;
use path_table::PathId;
use std::sync::Arc;

bitflags! {
    /// What kind of access the sandbox reported. A single event may
    /// combine more than one bit (spec.md §3 calls this "a flag set").
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct RequestedAccess: u8 {
        const READ = 0b0000_0001;
        const WRITE = 0b0000_0010;
        const PROBE = 0b0000_0100;
        const ENUMERATE = 0b0000_1000;
        const ENUMERATION_PROBE = 0b0001_0000;
    }
}

bitflags! {
    /// OS-level flags and attributes under which the path was opened
    /// (spec.md §3, `flags_and_attrs`/`opened_attrs`).
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct FileFlagsAndAttributes: u8 {
        const OPEN_REPARSE_POINT = 0b0000_0001;
        const DIRECTORY = 0b0000_0010;
        const REPARSE_POINT = 0b0000_0100;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum_macros::EnumIs)]
pub enum AccessStatus {
    Allowed,
    Denied,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum_macros::EnumIs)]
pub enum AccessMethod {
    Policy,
    FileExistenceBased,
    /// The sandbox's decision mechanism doesn't matter for any rule in
    /// spec.md beyond the two named above; this stands in for the rest of
    /// the sandbox's real method enum.
    Other,
}

/// The native error code the sandbox observed attempting the access, used
/// to detect absent-access (spec.md §3, `PathState::is_absent_access`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NativeError {
    Success,
    PathNotFound,
    FileNotFound,
    Other(i32),
}

impl NativeError {
    pub fn is_absent(&self) -> bool {
        matches!(self, NativeError::PathNotFound | NativeError::FileNotFound)
    }
}

/// An immutable record of a single sandbox access (spec.md §3).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AccessEvent {
    pub requested_access: RequestedAccess,
    pub status: AccessStatus,
    pub method: AccessMethod,
    /// Raw path string as reported by the sandbox; absent when the
    /// sandbox could resolve only a manifest path.
    pub path: Option<Arc<str>>,
    /// Interned id of the nearest policy-bearing ancestor; `PathId::INVALID`
    /// when there is none.
    pub manifest_path: PathId,
    pub process_path: Arc<str>,
    pub flags_and_attrs: FileFlagsAndAttributes,
    pub opened_attrs: FileFlagsAndAttributes,
    pub error: NativeError,
}

impl AccessEvent {
    /// True for a write that creates or removes a directory (as opposed
    /// to a write to a file). Tracked separately from ordinary file
    /// writes (spec.md §4.1, §4.4 step 2).
    pub fn is_dir_create_or_remove(&self) -> bool {
        self.requested_access.contains(RequestedAccess::WRITE)
            && self.opened_attrs.contains(FileFlagsAndAttributes::DIRECTORY)
    }

    /// True when this write is the creation of a new directory — as
    /// opposed to its removal, or a write into an existing one — the
    /// distinction `CreatedDirectories` tracking needs (spec.md §4.4 step
    /// 2).
    pub fn is_dir_effectively_created(&self) -> bool {
        self.is_dir_create_or_remove() && self.status.is_allowed()
    }

    /// Was the handle this event opened a directory handle? `pred` lets
    /// the caller fold in the reparse-point override from spec.md §4.2
    /// without this type needing to know about `Config`.
    pub fn opened_handle_is_directory(&self, reparse_point_treated_as_file: bool) -> bool {
        self.opened_attrs.contains(FileFlagsAndAttributes::DIRECTORY)
            && !reparse_point_treated_as_file
    }

    /// True if the raw path string ends with an OS directory separator.
    pub fn path_ends_with_separator(&self) -> bool {
        self.path
            .as_deref()
            .is_some_and(|p| p.ends_with('/') || p.ends_with('\\'))
    }

    /// A write to something other than a directory create/remove
    /// (spec.md §4.3's precondition, and §4.4 step 8).
    pub fn is_file_write(&self) -> bool {
        self.requested_access.contains(RequestedAccess::WRITE) && !self.is_dir_create_or_remove()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_event() -> AccessEvent {
        AccessEvent {
            requested_access: RequestedAccess::WRITE,
            status: AccessStatus::Allowed,
            method: AccessMethod::Policy,
            path: Some(Arc::from("/out/a")),
            manifest_path: PathId::INVALID,
            process_path: Arc::from("/usr/bin/cc"),
            flags_and_attrs: FileFlagsAndAttributes::empty(),
            opened_attrs: FileFlagsAndAttributes::empty(),
            error: NativeError::Success,
        }
    }

    #[test]
    fn dir_create_or_remove_requires_write_and_directory_attr() {
        let mut event = base_event();
        assert!(!event.is_dir_create_or_remove());
        event.opened_attrs = FileFlagsAndAttributes::DIRECTORY;
        assert!(event.is_dir_create_or_remove());
        assert!(event.is_dir_effectively_created());
    }

    #[test]
    fn file_write_excludes_dir_create_or_remove() {
        let mut event = base_event();
        assert!(event.is_file_write());
        event.opened_attrs = FileFlagsAndAttributes::DIRECTORY;
        assert!(!event.is_file_write());
    }

    #[test]
    fn absent_error_detection() {
        assert!(NativeError::PathNotFound.is_absent());
        assert!(NativeError::FileNotFound.is_absent());
        assert!(!NativeError::Success.is_absent());
        assert!(!NativeError::Other(5).is_absent());
    }
}
