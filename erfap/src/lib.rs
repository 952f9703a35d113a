// Copyright 2026 the original authors.
// Licensed under the Apache License, Version 2.0 (see LICENSE).

#![deny(warnings)]
#![deny(clippy::all)]
#![allow(clippy::too_many_arguments, clippy::new_without_default)]

//! The Explicitly-Reported File Access Processor (ERFAP): the online
//! classifier that folds sandbox-reported file-access events for a single
//! pip execution into a structured per-path observation summary (spec.md
//! §1). `Processor` (see [`processor`]) is the public façade; everything
//! else in this crate is a supporting component of it (spec.md §2).

pub mod caches;
pub mod classifier;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod event;
pub mod flags;
pub mod path_state;
pub mod pool;
pub mod processor;
pub mod result;
pub mod shared_opaque;

#[cfg(test)]
mod testutil;

pub use collaborators::{
    AllowListMatch, AllowListReporter, ArtifactId, DiagnosticEvent, EventSink, FileAccessManifest,
    LogEventSink, ManifestPolicyFlags, PathInterner, PipGraphFileSystemView, SandboxFileSystemView,
    SemanticPathExpander, SemanticPathInfo, SharedPathTable,
};
pub use config::Config;
pub use error::ContractViolation;
pub use event::{
    AccessEvent, AccessMethod, AccessStatus, FileFlagsAndAttributes, NativeError, RequestedAccess,
};
pub use flags::ObservationFlags;
pub use path_state::PathState;
pub use pool::{PathComparator, Pool, Poolable};
pub use processor::{Processor, ProcessorContext};
pub use result::{Pools, ProcessorResult};
