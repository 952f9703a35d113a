// Copyright 2026 the original authors.
// Licensed under the Apache License, Version 2.0 (see LICENSE).

//! Attribution of a file write to the shared opaque directory that owns it
//! (spec.md §4.3). Shared opaque directories can nest; the innermost one
//! wins, so this walks `event.manifest_path`'s ancestor chain bottom-up and
//! stops at the first declared root.

use crate::collaborators::PathInterner;
use crate::error::{fatal, ContractViolation};
use crate::event::AccessEvent;
use path_table::PathId;
use std::collections::HashSet;

/// spec.md §4.3: `attribute_to_shared_opaque(event) -> Option<root>`.
///
/// `roots` is the pip's fixed set of declared shared-opaque directory
/// roots (spec.md §3 invariant 6: fixed at construction).
///
/// Preconditions (asserted, contract violation on failure): `event` is a
/// write to a non-directory, not a directory create/remove. This holds
/// regardless of `event.status`: a denied `FileExistenceBased` write is
/// still attributable, since the allow-list pass may later reconsider it
/// (spec.md §4.4 steps 8-9, and the `FileExistenceDenials`/`remove`
/// two-step in §4.5).
pub fn attribute_to_shared_opaque(
    event: &AccessEvent,
    path_interner: &dyn PathInterner,
    roots: &HashSet<PathId>,
) -> Option<PathId> {
    if !event.is_file_write() {
        fatal(ContractViolation::PreconditionFailed {
            reason: "attribute_to_shared_opaque requires a file write",
        });
    }

    if roots.is_empty() || !event.manifest_path.is_valid() {
        return None;
    }

    let mut ancestors = path_interner.enumerate_ancestors(event.manifest_path);
    // The manifest path itself may be the root we want to attribute to
    // only when we have no more specific path to go on; when the raw
    // path is known, the manifest path is itself a candidate first.
    if event.path.is_none() && !ancestors.is_empty() {
        ancestors.remove(0);
    }

    ancestors.into_iter().find(|ancestor| roots.contains(ancestor))
}
