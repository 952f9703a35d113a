// Copyright 2026 the original authors.
// Licensed under the Apache License, Version 2.0 (see LICENSE).

//! Contract violations: the "programmer error" tier of spec.md §7's error
//! taxonomy. This workspace does not reach for `thiserror`/`anyhow` for
//! error enums (see `sharded_lmdb::StoreError` for precedent elsewhere in
//! this codebase) — a plain enum with a hand-written `Display` impl is
//! enough for a type whose only job is to describe a fatal assertion
//! before the process aborts.

use std::fmt;

/// A violation of one of `Processor`'s preconditions. Every variant here
/// corresponds to a "contract violation" in spec.md §7: there is no
/// recovery path, by design of the spec ("abort the pip").
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContractViolation {
    /// `add`/`remove` called after `freeze`.
    UseAfterFreeze { method: &'static str },
    /// `remove` was called for an event that isn't a `Write` decided by
    /// `FileExistenceBased` (spec.md §4.5), or for a path that never
    /// passed `should_include` in the first place.
    IllegalRemove { reason: &'static str },
    /// `freeze` called a second time.
    DoubleFreeze,
    /// `should_include`'s precondition failed: neither `Allowed` nor
    /// `FileExistenceBased` (spec.md §4.1).
    PreconditionFailed { reason: &'static str },
}

impl fmt::Display for ContractViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContractViolation::UseAfterFreeze { method } => {
                write!(f, "Processor::{method} called after freeze()")
            }
            ContractViolation::IllegalRemove { reason } => {
                write!(f, "illegal Processor::remove: {reason}")
            }
            ContractViolation::DoubleFreeze => write!(f, "Processor::freeze called twice"),
            ContractViolation::PreconditionFailed { reason } => {
                write!(f, "precondition failed: {reason}")
            }
        }
    }
}

/// Logs `violation` at `error` level and then aborts the pip by panicking.
/// This is the only place this crate panics on behalf of a caller; every
/// other exclusion is a recoverable `false`/`None` return, with an
/// `EventSink` notification at the handful of call sites spec.md §7 names
/// explicitly (spec.md §7's propagation policy).
pub fn fatal(violation: ContractViolation) -> ! {
    log::error!("ERFAP contract violation: {violation}");
    panic!("ERFAP contract violation: {violation}");
}
