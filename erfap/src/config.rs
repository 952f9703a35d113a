// Copyright 2026 the original authors.
// Licensed under the Apache License, Version 2.0 (see LICENSE).

//! The immutable per-pip configuration bundle described in spec.md §6.
//!
//! Mirrors how `process_execution::local::CommandRunner` and
//! `process_execution::NamedCaches` take their configuration as
//! constructor arguments rather than consulting a global each call: one
//! `Config` is built once per pip and shared by reference for the
//! lifetime of its `Processor`.

/// Filename suffixes (no leading dot) identifying a tool whose
/// correctness depends on observing enumerations/probes that would
/// otherwise be elided (spec.md GLOSSARY, "Incremental tool").
pub type IncrementalToolSuffix = String;

#[derive(Clone, Debug, Default)]
pub struct Config {
    /// Exclude `.pdb`/`.nls`/`.dll` writes produced by code-coverage
    /// instrumentation (spec.md §4.1).
    pub file_access_ignore_code_coverage: bool,
    /// Treat probes of an existing directory as enumerations (spec.md
    /// §4.4 step 7).
    pub existing_directory_probes_as_enumerations: bool,
    /// Silently drop undeclared accesses under shared opaques rather than
    /// recording them as observations (spec.md §4.4 step 10).
    pub ignore_undeclared_accesses_under_shared_opaques: bool,
    /// Treat a probe of a directory symlink as a directory access
    /// (spec.md §4.2).
    pub probe_directory_symlink_as_directory: bool,
    /// Short-circuit shared-opaque attribution straight to
    /// `shared-opaque output=true, matchType=NoMatch` without consulting
    /// the allow-list (spec.md §4.4 step 8, and the open question in §9).
    pub do_not_apply_allowlist_to_dynamic_outputs: bool,
    /// Globally enable reparse-point resolution (spec.md §4.2, §4.4 step
    /// 13).
    pub enable_full_reparse_point_resolving: bool,
    /// Filename suffixes identifying incremental tools (spec.md GLOSSARY).
    pub incremental_tools: Vec<IncrementalToolSuffix>,
}

impl Config {
    pub fn matches_incremental_tool(&self, process_path: &str) -> bool {
        self.incremental_tools
            .iter()
            .any(|suffix| process_path.ends_with(suffix.as_str()))
    }
}
