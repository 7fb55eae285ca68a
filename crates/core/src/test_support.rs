// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::document::{DocKind, Document, JobDoc, JobError, LogDoc, OutputFile, Severity};
use crate::state::{FailureKind, JobState};
use crate::transition::{Transition, TransitionLog};

// ── Proptest strategies ─────────────────────────────────────────────────

/// Proptest strategies for aggregation types.
pub mod strategies {
    use crate::document::{JobError, OutputFile};
    use crate::state::{EffectiveState, FailureKind};
    use crate::summary::StateSummary;
    use crate::window::WindowSample;
    use proptest::prelude::*;

    pub fn arb_failure_kind() -> impl Strategy<Value = FailureKind> {
        prop_oneof![
            Just(FailureKind::Create),
            Just(FailureKind::Submit),
            Just(FailureKind::Exception),
        ]
    }

    pub fn arb_effective_state() -> impl Strategy<Value = EffectiveState> {
        prop_oneof![
            any::<bool>().prop_map(|retry| EffectiveState::Queued { retry }),
            any::<bool>().prop_map(|retry| EffectiveState::Pending { retry }),
            any::<bool>().prop_map(|retry| EffectiveState::Running { retry }),
            Just(EffectiveState::Cooloff),
            Just(EffectiveState::Paused),
            arb_failure_kind().prop_map(EffectiveState::Failure),
            Just(EffectiveState::Success),
            Just(EffectiveState::Canceled),
        ]
    }

    /// A summary counting up to 16 jobs in arbitrary buckets.
    pub fn arb_state_summary() -> impl Strategy<Value = StateSummary> {
        proptest::collection::vec(arb_effective_state(), 0..16).prop_map(|states| {
            let mut summary = StateSummary::default();
            for state in states {
                summary.bump(state);
            }
            summary
        })
    }

    pub fn arb_error_row() -> impl Strategy<Value = JobError> {
        (
            "[a-z]{1,8}",
            arb_failure_kind(),
            0i64..256,
            "[a-z ]{0,20}",
            0u64..100_000,
        )
            .prop_map(|(step, kind, exit_code, message, timestamp)| JobError {
                step: step.into(),
                kind,
                exit_code,
                message,
                timestamp,
            })
    }

    pub fn arb_output_file() -> impl Strategy<Value = OutputFile> {
        ("[a-z]{1,8}", 0u64..1 << 40, 0u64..1 << 20).prop_map(|(name, size, events)| OutputFile {
            lfn: format!("/store/{name}/file.root").into(),
            dataset: format!("/store/{name}").into(),
            size,
            events,
            checksum: None,
        })
    }

    pub fn arb_window_sample() -> impl Strategy<Value = WindowSample> {
        ("[a-z]{1,8}", 0u64..1_000_000)
            .prop_map(|(entity, timestamp)| WindowSample::new(entity, timestamp))
    }
}

// ── Document factory functions ──────────────────────────────────────────

/// A job document whose log walks the given states in order, one second
/// apart, starting from `new`.
pub fn job_doc_with_states(id: &str, workflow: &str, states: &[JobState]) -> Document {
    let mut transitions = TransitionLog::new();
    let mut previous = JobState::New;
    for (i, &state) in states.iter().enumerate() {
        transitions.push(Transition::new(previous, state, i as u64));
        previous = state;
    }
    Document::new(
        id,
        DocKind::Job(
            JobDoc::builder()
                .workflow(workflow)
                .task(format!("{workflow}/Processing"))
                .transitions(transitions)
                .build(),
        ),
    )
}

pub fn job_error(step: &str, kind: FailureKind, timestamp: u64, message: &str) -> JobError {
    JobError {
        step: step.into(),
        kind,
        exit_code: 50664,
        message: message.to_string(),
        timestamp,
    }
}

pub fn output_file(dataset: &str, size: u64, events: u64) -> OutputFile {
    OutputFile {
        lfn: format!("{dataset}/file-{size}.root").into(),
        dataset: dataset.into(),
        size,
        events,
        checksum: None,
    }
}

pub fn log_doc(id: &str, agent: &str, thread: &str, timestamp: u64, message: &str) -> Document {
    Document::new(
        id,
        DocKind::LogEntry(LogDoc {
            agent_url: agent.into(),
            thread: thread.into(),
            severity: Severity::Error,
            message: message.to_string(),
            timestamp,
        }),
    )
}
