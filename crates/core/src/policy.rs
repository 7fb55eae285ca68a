// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transition validation policies.
//!
//! Validation is pluggable per entity kind: job transitions are checked
//! against the fixed legal-transition table, request transitions against the
//! request lifecycle graph, and some entity kinds (agent-reported job dumps)
//! deliberately accept any transition. All policies reject same-state no-ops
//! so that duplicate delivery of a status event never spams the log.
//!
//! Rejection is normal control flow, not an exception: callers log the
//! reason string and skip the append.

use crate::state::{JobState, RequestState};
use std::fmt::Display;
use std::marker::PhantomData;
use thiserror::Error;

/// Validator veto. Display strings are the wire contract consumed by
/// submitting agents; do not reword them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectedTransition {
    #[error("SAME STATE")]
    SameState { state: String },
    #[error("not allowed state {state}")]
    NotAllowedState { state: String },
    #[error("not allowed transition {from} to {to}")]
    NotAllowedTransition { from: String, to: String },
}

impl RejectedTransition {
    pub fn same_state(state: impl Display) -> Self {
        Self::SameState {
            state: state.to_string(),
        }
    }

    pub fn not_allowed_state(state: impl Display) -> Self {
        Self::NotAllowedState {
            state: state.to_string(),
        }
    }

    pub fn not_allowed(from: impl Display, to: impl Display) -> Self {
        Self::NotAllowedTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

/// Discriminated result of a state-transition update request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// Transition validated and appended.
    Accepted,
    /// Validator veto; the log is unchanged.
    Rejected(RejectedTransition),
    /// The request's `oldstate` does not match the entity's current state;
    /// structurally malformed, the log is unchanged.
    Illegal,
}

impl TransitionOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, TransitionOutcome::Accepted)
    }
}

impl Display for TransitionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransitionOutcome::Accepted => f.write_str("OK"),
            TransitionOutcome::Rejected(reason) => write!(f, "{reason}"),
            TransitionOutcome::Illegal => f.write_str("ILLEGAL TRANSITION"),
        }
    }
}

/// Decides whether a proposed transition from the current state is legal.
/// Pure; never mutates anything.
pub trait TransitionPolicy<S> {
    fn check(&self, current: S, proposed: S) -> Result<(), RejectedTransition>;
}

/// Legal-transition table for job states (the agent state machine).
#[derive(Debug, Clone, Copy, Default)]
pub struct JobPolicy;

impl JobPolicy {
    /// Legal successor states of `state`.
    pub fn successors(state: JobState) -> &'static [JobState] {
        use JobState::*;
        match state {
            New => &[Created, CreateFailed, Killed],
            Created => &[Executing, SubmitFailed, Killed],
            Executing => &[Complete, JobFailed, Killed],
            Complete => &[Success, JobFailed, Killed],
            CreateFailed => &[CreateCooloff, Exhausted, Killed],
            SubmitFailed => &[SubmitCooloff, Exhausted, Killed],
            JobFailed => &[JobCooloff, Exhausted, Killed],
            CreateCooloff => &[Created, CreatePaused, Killed],
            SubmitCooloff => &[Created, SubmitPaused, Killed],
            JobCooloff => &[Created, JobPaused, Killed],
            CreatePaused => &[Created, Killed],
            SubmitPaused => &[Created, Killed],
            JobPaused => &[Created, Killed],
            Success => &[Cleanout],
            Exhausted => &[Cleanout],
            Killed => &[Exhausted, Cleanout],
            Cleanout => &[],
        }
    }
}

impl TransitionPolicy<JobState> for JobPolicy {
    fn check(&self, current: JobState, proposed: JobState) -> Result<(), RejectedTransition> {
        if current == proposed {
            return Err(RejectedTransition::same_state(current));
        }
        if Self::successors(current).contains(&proposed) {
            Ok(())
        } else {
            Err(RejectedTransition::not_allowed(current, proposed))
        }
    }
}

/// Legal-transition table for request states.
///
/// Once a request is `completed`, the only legal continuation is the
/// archival chain (`closed-out` / `normal-archived`); archived states
/// accept nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestPolicy;

impl RequestPolicy {
    /// Legal successor states of `state`.
    pub fn successors(state: RequestState) -> &'static [RequestState] {
        use RequestState::*;
        match state {
            New => &[Assigned, Failed, Rejected, Aborted],
            Assigned => &[Acquired, Running, Failed, Rejected, Aborted],
            Acquired => &[Running, RunningOpen, Completed, Failed, Aborted],
            Running => &[Completed, Failed, Aborted],
            RunningOpen => &[RunningClosed, Aborted],
            RunningClosed => &[Completed, Failed, Aborted],
            Failed => &[Assigned, Rejected],
            Completed => &[ClosedOut, NormalArchived],
            ClosedOut => &[Announced, NormalArchived],
            Announced => &[NormalArchived],
            Aborted => &[AbortedArchived],
            Rejected => &[RejectedArchived],
            NormalArchived | AbortedArchived | RejectedArchived => &[],
        }
    }
}

impl TransitionPolicy<RequestState> for RequestPolicy {
    fn check(
        &self,
        current: RequestState,
        proposed: RequestState,
    ) -> Result<(), RejectedTransition> {
        if current == proposed {
            return Err(RejectedTransition::same_state(current));
        }
        if Self::successors(current).contains(&proposed) {
            Ok(())
        } else {
            Err(RejectedTransition::not_allowed(current, proposed))
        }
    }
}

/// Accepts any transition except a same-state no-op. Used for entity kinds
/// whose senders are trusted to know the state machine (agent job dumps).
#[derive(Debug, Clone, Copy)]
pub struct PermissivePolicy<S>(PhantomData<S>);

impl<S> Default for PermissivePolicy<S> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

impl<S: PartialEq + Display + Copy> TransitionPolicy<S> for PermissivePolicy<S> {
    fn check(&self, current: S, proposed: S) -> Result<(), RejectedTransition> {
        if current == proposed {
            return Err(RejectedTransition::same_state(current));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "policy_tests.rs"]
mod tests;
