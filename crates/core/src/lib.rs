// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tally-core: state-transition tracking and aggregation for distributed
//! workload management.
//!
//! Entities (jobs, requests, framework job reports, agent log entries,
//! clipboard items) carry append-only transition logs; projections derive
//! current state from the log, and the map/reduce-style aggregator rolls
//! per-entity states into per-site/per-workflow/per-window summaries.

pub mod macros;

pub mod aggregate;
pub mod clock;
pub mod document;
pub mod id;
pub mod policy;
pub mod query;
pub mod state;
pub mod summary;
pub mod transition;
pub mod window;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use aggregate::{combine, project, CombineError, Emission, KeyPart, LogSample, Partial, View, ViewKey};
pub use clock::{Clock, FakeClock, SystemClock};
pub use document::{
    ClipboardDoc, DocKind, Document, DocumentError, FwjrDoc, JobDoc, JobError, LogDoc, OutputFile,
    RequestDoc, Severity, CURRENT_SCHEMA,
};
#[cfg(any(test, feature = "test-support"))]
pub use document::{JobDocBuilder, RequestDocBuilder};
pub use id::{short, ClipboardItemId, EntityId};
pub use policy::{
    JobPolicy, PermissivePolicy, RejectedTransition, RequestPolicy, TransitionOutcome,
    TransitionPolicy,
};
pub use query::{Grouping, ViewIndex};
pub use state::{
    ClipboardState, EffectiveState, FailureKind, JobState, RequestState, UnknownState,
};
pub use summary::{
    ClipboardSummary, CountMap, ErrorSummary, FailureCounts, OutputSummary, QueuedCounts,
    RequestSummary, Stamped, StateSummary, SubmittedCounts,
};
pub use transition::{Transition, TransitionLog};
pub use window::{bucket_index, bucket_start, WindowSample, HOUR_SECS};
