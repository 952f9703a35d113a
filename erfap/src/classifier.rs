// Copyright 2026 the original authors.
// Licensed under the Apache License, Version 2.0 (see LICENSE).

//! Pure decision functions for inclusion, directory-ness, and the various
//! exclusion carve-outs (spec.md §4.1, §4.2). Every helper here is a pure
//! function of the event plus immutable per-pip configuration, so they are
//! safe to memoize in `(process_path, path)` form within the pip (spec.md
//! §4.1, last paragraph).

use crate::collaborators::{PathInterner, SemanticPathExpander};
use crate::config::Config;
use crate::error::{fatal, ContractViolation};
use crate::event::{AccessEvent, AccessMethod, AccessStatus, RequestedAccess};
use path_table::PathId;
use std::collections::HashSet;
use std::sync::LazyLock;

/// `rc.exe`'s temp files: `\RC?XXXX` with no extension, where `?` is any
/// character and `XXXX` is 4 more, i.e. a 9-character suffix with no dot
/// (spec.md §4.1).
static RC_EXE_TEMP: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"^RC.[0-9A-Za-z]{4}$").unwrap());

/// `mt.exe`'s temp files: `RCX*.tmp`.
static MT_EXE_TEMP: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"(?i)^RCX.*\.tmp$").unwrap());

/// Build.exe/tracelog incremental dependency-output temp files:
/// `_buildc_dep_out.pass<N>`.
static BUILDC_DEP_OUT: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"^_buildc_dep_out\.pass\d+$").unwrap());

fn file_name(raw_path: &str) -> &str {
    raw_path
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(raw_path)
}

fn has_extension(name: &str, ext: &str) -> bool {
    name.rsplit('.').next().is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

/// The per-tool temp-file carve-outs from spec.md §4.1. `process_path` is
/// the accessing process's own path (used to recognize `csc`, `rc.exe`,
/// `mt.exe`, the `CC*` family); `raw_path` is the accessed file.
/// `same_directory_as_output` tells the csc/cvtres/resonexe carve-out
/// whether `raw_path`'s parent directory is the parent directory of one of
/// the pip's declared outputs — spec.md §4.1 scopes that one carve-out to
/// "`*.tmp` in the same directory as outputs", unlike the other per-tool
/// patterns below, which apply regardless of location.
pub fn is_tool_temp_file(process_path: &str, raw_path: &str, same_directory_as_output: bool) -> bool {
    let process_name = file_name(process_path).to_ascii_lowercase();
    let name = file_name(raw_path);

    let is_csc_family = process_name == "csc.exe"
        || process_name == "cvtres.exe"
        || process_name == "resonexe.exe";
    if is_csc_family && has_extension(name, "tmp") && same_directory_as_output {
        return true;
    }
    if process_name == "rc.exe" && RC_EXE_TEMP.is_match(name) {
        return true;
    }
    if process_name == "mt.exe" && MT_EXE_TEMP.is_match(name) {
        return true;
    }
    if process_name.starts_with("cc") && has_extension(name, "pdb") {
        return true;
    }
    if BUILDC_DEP_OUT.is_match(name) {
        return true;
    }
    false
}

/// Code-coverage instrumentation artifacts excluded when
/// `Config::file_access_ignore_code_coverage` is set (spec.md §4.1).
pub fn is_coverage_artifact(raw_path: &str) -> bool {
    let name = file_name(raw_path);
    ["pdb", "nls", "dll"]
        .iter()
        .any(|ext| has_extension(name, ext))
}

/// Was this `EnumerationProbe` material to an incremental-output-preserving
/// pip (spec.md §4.1's first bullet)?
pub fn enumeration_probe_is_material(
    config: &Config,
    pip_is_incremental_output_preserving: bool,
    process_path: &str,
) -> bool {
    pip_is_incremental_output_preserving && config.matches_incremental_tool(process_path)
}

/// Why `should_include` excluded an event, for the handful of exclusions
/// spec.md §7 requires surfaced to the caller's `EventSink` (the others are
/// silent per spec.md §7's propagation policy — encoded in the returned
/// state only).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExclusionReason {
    /// `event`'s path resolved to a system or otherwise injectable mount
    /// (spec.md §7, "Unknown mount / system mount").
    SystemMount,
}

/// The result of `should_include`: whether to fold the event into the
/// path's observations, and the interned path it resolved to (when
/// parsing succeeded at all, even for excluded events — callers that track
/// `CreatedDirectories` etc. need the id regardless of inclusion).
pub struct Inclusion {
    pub include: bool,
    pub path: Option<PathId>,
    pub reason: Option<ExclusionReason>,
}

/// spec.md §4.1: `should_include(event) -> (include, parsed_path)`.
/// `output_parent_dirs` is the set of parent directories of the pip's
/// declared outputs, consulted only by the csc/cvtres/resonexe temp-file
/// carve-out (see `is_tool_temp_file`).
pub fn should_include(
    event: &AccessEvent,
    config: &Config,
    path_interner: &dyn PathInterner,
    semantic_expander: &dyn SemanticPathExpander,
    pip_is_incremental_output_preserving: bool,
    output_parent_dirs: &HashSet<PathId>,
) -> Inclusion {
    if !(event.status.is_allowed() || event.method.is_file_existence_based()) {
        fatal(ContractViolation::PreconditionFailed {
            reason: "should_include requires Allowed status or FileExistenceBased method",
        });
    }

    if event.requested_access.contains(RequestedAccess::ENUMERATION_PROBE)
        && !enumeration_probe_is_material(
            config,
            pip_is_incremental_output_preserving,
            &event.process_path,
        )
    {
        return Inclusion {
            include: false,
            path: None,
            reason: None,
        };
    }

    let Some(raw_path) = event.path.as_deref() else {
        return Inclusion {
            include: false,
            path: None,
            reason: None,
        };
    };
    let Ok(parsed) = path_interner.create(raw_path) else {
        return Inclusion {
            include: false,
            path: None,
            reason: None,
        };
    };

    let info = semantic_expander.info_for(parsed);
    if info.is_system {
        return Inclusion {
            include: false,
            path: Some(parsed),
            reason: Some(ExclusionReason::SystemMount),
        };
    }
    if !info.valid {
        return Inclusion {
            include: false,
            path: Some(parsed),
            reason: None,
        };
    }

    if config.file_access_ignore_code_coverage && is_coverage_artifact(raw_path) {
        return Inclusion {
            include: false,
            path: Some(parsed),
            reason: None,
        };
    }

    let same_directory_as_output = path_interner
        .parent(parsed)
        .is_some_and(|parent| output_parent_dirs.contains(&parent));
    if is_tool_temp_file(&event.process_path, raw_path, same_directory_as_output) {
        return Inclusion {
            include: false,
            path: Some(parsed),
            reason: None,
        };
    }

    if event.is_dir_create_or_remove() {
        return Inclusion {
            include: false,
            path: Some(parsed),
            reason: None,
        };
    }

    Inclusion {
        include: true,
        path: Some(parsed),
        reason: None,
    }
}

/// spec.md §4.2: should `path` be treated as a directory reparse point
/// treated as a file, i.e. the override that turns off `DirectoryLocation`
/// even though the opened handle was a directory? On platforms without
/// reparse points this is always `false`.
#[allow(clippy::too_many_arguments)]
pub fn should_treat_directory_reparse_point_as_file(
    event: &AccessEvent,
    path: PathId,
    config: &Config,
    dir_symlinks_as_dirs: &std::collections::HashSet<PathId>,
    manifest_requests_full_reparse_point_resolving: bool,
) -> bool {
    use crate::event::FileFlagsAndAttributes;

    if path_not_a_reparse_point(event) {
        return false;
    }
    let not_open_reparse_point_or_is_write = !event
        .flags_and_attrs
        .contains(FileFlagsAndAttributes::OPEN_REPARSE_POINT)
        || event.requested_access.contains(RequestedAccess::WRITE);
    let not_in_dir_symlinks_as_dirs = !dir_symlinks_as_dirs.contains(&path);
    let not_a_symlink_probe_treated_as_dir = !(is_probe_like(event)
        && config.probe_directory_symlink_as_directory);
    let resolution_enabled =
        config.enable_full_reparse_point_resolving || manifest_requests_full_reparse_point_resolving;

    not_open_reparse_point_or_is_write
        && not_in_dir_symlinks_as_dirs
        && not_a_symlink_probe_treated_as_dir
        && resolution_enabled
}

fn path_not_a_reparse_point(event: &AccessEvent) -> bool {
    use crate::event::FileFlagsAndAttributes;
    !event.opened_attrs.contains(FileFlagsAndAttributes::REPARSE_POINT)
}

fn is_probe_like(event: &AccessEvent) -> bool {
    event.requested_access.contains(RequestedAccess::PROBE)
        || event.requested_access.contains(RequestedAccess::ENUMERATION_PROBE)
}

/// spec.md §4.2: `is_directory_location(path, event) -> bool`.
pub fn is_directory_location(
    event: &AccessEvent,
    path: PathId,
    config: &Config,
    dir_symlinks_as_dirs: &std::collections::HashSet<PathId>,
    manifest_requests_full_reparse_point_resolving: bool,
) -> (bool, bool) {
    if event.path_ends_with_separator() {
        return (true, false);
    }
    let reparse_override = should_treat_directory_reparse_point_as_file(
        event,
        path,
        config,
        dir_symlinks_as_dirs,
        manifest_requests_full_reparse_point_resolving,
    );
    (event.opened_handle_is_directory(reparse_override), reparse_override)
}

