// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State taxonomies for tracked entities.
//!
//! Two state machines coexist: the per-job bookkeeping states driven by the
//! submission agent ([`JobState`]) and the request/workflow lifecycle states
//! ([`RequestState`]). Both serialize with their historical wire names, which
//! downstream dashboards depend on.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Bookkeeping state of a single job.
///
/// `Cleanout` is a terminal record-keeping state orthogonal to success or
/// failure; the semantically meaningful outcome of a cleaned-out job is
/// recovered from the state it was cleaned out *from* (see
/// [`JobState::effective`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    New,
    Created,
    Executing,
    Complete,
    Success,
    CreateFailed,
    SubmitFailed,
    JobFailed,
    CreateCooloff,
    SubmitCooloff,
    JobCooloff,
    CreatePaused,
    SubmitPaused,
    JobPaused,
    Exhausted,
    Killed,
    Cleanout,
}

crate::simple_display! {
    JobState {
        New => "new",
        Created => "created",
        Executing => "executing",
        Complete => "complete",
        Success => "success",
        CreateFailed => "createfailed",
        SubmitFailed => "submitfailed",
        JobFailed => "jobfailed",
        CreateCooloff => "createcooloff",
        SubmitCooloff => "submitcooloff",
        JobCooloff => "jobcooloff",
        CreatePaused => "createpaused",
        SubmitPaused => "submitpaused",
        JobPaused => "jobpaused",
        Exhausted => "exhausted",
        Killed => "killed",
        Cleanout => "cleanout",
    }
}

impl JobState {
    pub const ALL: [JobState; 17] = [
        JobState::New,
        JobState::Created,
        JobState::Executing,
        JobState::Complete,
        JobState::Success,
        JobState::CreateFailed,
        JobState::SubmitFailed,
        JobState::JobFailed,
        JobState::CreateCooloff,
        JobState::SubmitCooloff,
        JobState::JobCooloff,
        JobState::CreatePaused,
        JobState::SubmitPaused,
        JobState::JobPaused,
        JobState::Exhausted,
        JobState::Killed,
        JobState::Cleanout,
    ];

    /// True for states from which no further transition is legal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Cleanout)
    }

    /// True for the cooloff (retry-wait) states.
    pub fn is_cooloff(&self) -> bool {
        matches!(
            self,
            JobState::CreateCooloff | JobState::SubmitCooloff | JobState::JobCooloff
        )
    }

    /// True for the paused states.
    pub fn is_paused(&self) -> bool {
        matches!(
            self,
            JobState::CreatePaused | JobState::SubmitPaused | JobState::JobPaused
        )
    }

    /// Semantic projection of a job's last transition.
    ///
    /// `via` is the `old_state` of that transition and resolves the cleanout
    /// indirection: `exhausted → cleanout` is a failure, `success → cleanout`
    /// a success, `killed → cleanout` a cancellation. Every aggregation
    /// consumer must apply this identically or bucket counts diverge.
    ///
    /// `retry` is whether the job has been through a cooloff retry;
    /// `scheduled` is whether a site has been assigned (splits executing jobs
    /// into pending vs running).
    pub fn effective(self, via: Option<JobState>, retry: bool, scheduled: bool) -> EffectiveState {
        match self {
            JobState::New | JobState::Created => EffectiveState::Queued { retry },
            JobState::Executing | JobState::Complete => {
                if scheduled {
                    EffectiveState::Running { retry }
                } else {
                    EffectiveState::Pending { retry }
                }
            }
            JobState::Success => EffectiveState::Success,
            JobState::CreateFailed => EffectiveState::Failure(FailureKind::Create),
            JobState::SubmitFailed => EffectiveState::Failure(FailureKind::Submit),
            JobState::JobFailed | JobState::Exhausted => {
                EffectiveState::Failure(FailureKind::Exception)
            }
            s if s.is_cooloff() => EffectiveState::Cooloff,
            s if s.is_paused() => EffectiveState::Paused,
            JobState::Killed => EffectiveState::Canceled,
            JobState::Cleanout => match via {
                Some(JobState::Success) => EffectiveState::Success,
                Some(JobState::Killed) => EffectiveState::Canceled,
                // Exhausted, or a malformed log with no recorded predecessor:
                // count as an exception failure rather than losing the job.
                _ => EffectiveState::Failure(FailureKind::Exception),
            },
            // is_cooloff/is_paused guards above are exhaustive for the rest
            _ => EffectiveState::Cooloff,
        }
    }
}

impl FromStr for JobState {
    type Err = UnknownState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobState::ALL
            .iter()
            .find(|state| state.to_string() == s)
            .copied()
            .ok_or_else(|| UnknownState(s.to_string()))
    }
}

/// Lifecycle state of a request/workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RequestState {
    #[serde(rename = "new")]
    New,
    #[serde(rename = "assigned")]
    Assigned,
    #[serde(rename = "acquired")]
    Acquired,
    #[serde(rename = "running")]
    Running,
    #[serde(rename = "running-open")]
    RunningOpen,
    #[serde(rename = "running-closed")]
    RunningClosed,
    #[serde(rename = "failed")]
    Failed,
    #[serde(rename = "completed")]
    Completed,
    #[serde(rename = "closed-out")]
    ClosedOut,
    #[serde(rename = "announced")]
    Announced,
    #[serde(rename = "normal-archived")]
    NormalArchived,
    #[serde(rename = "aborted")]
    Aborted,
    #[serde(rename = "aborted-archived")]
    AbortedArchived,
    #[serde(rename = "rejected")]
    Rejected,
    #[serde(rename = "rejected-archived")]
    RejectedArchived,
}

crate::simple_display! {
    RequestState {
        New => "new",
        Assigned => "assigned",
        Acquired => "acquired",
        Running => "running",
        RunningOpen => "running-open",
        RunningClosed => "running-closed",
        Failed => "failed",
        Completed => "completed",
        ClosedOut => "closed-out",
        Announced => "announced",
        NormalArchived => "normal-archived",
        Aborted => "aborted",
        AbortedArchived => "aborted-archived",
        Rejected => "rejected",
        RejectedArchived => "rejected-archived",
    }
}

impl RequestState {
    pub const ALL: [RequestState; 15] = [
        RequestState::New,
        RequestState::Assigned,
        RequestState::Acquired,
        RequestState::Running,
        RequestState::RunningOpen,
        RequestState::RunningClosed,
        RequestState::Failed,
        RequestState::Completed,
        RequestState::ClosedOut,
        RequestState::Announced,
        RequestState::NormalArchived,
        RequestState::Aborted,
        RequestState::AbortedArchived,
        RequestState::Rejected,
        RequestState::RejectedArchived,
    ];

    /// True for the archived end states.
    pub fn is_archived(&self) -> bool {
        matches!(
            self,
            RequestState::NormalArchived
                | RequestState::AbortedArchived
                | RequestState::RejectedArchived
        )
    }
}

impl FromStr for RequestState {
    type Err = UnknownState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RequestState::ALL
            .iter()
            .find(|state| state.to_string() == s)
            .copied()
            .ok_or_else(|| UnknownState(s.to_string()))
    }
}

/// State of an operations-clipboard item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClipboardState {
    New,
    InProgress,
    OnHold,
    Done,
}

crate::simple_display! {
    ClipboardState {
        New => "new",
        InProgress => "in_progress",
        OnHold => "on_hold",
        Done => "done",
    }
}

/// Phase in which a job failure occurred. Names are the wire-level
/// `failure.create` / `failure.submit` / `failure.exception` counter fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    Create,
    Submit,
    Exception,
}

crate::simple_display! {
    FailureKind {
        Create => "create",
        Submit => "submit",
        Exception => "exception",
    }
}

/// Semantic classification of a job's current state, used for counter
/// bucketing and per-site attribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectiveState {
    /// Created but not yet handed to a site.
    Queued { retry: bool },
    /// Submitted, idle at the site.
    Pending { retry: bool },
    /// Submitted and running at a site.
    Running { retry: bool },
    /// Waiting out a retry delay.
    Cooloff,
    /// Manually paused between retries.
    Paused,
    Failure(FailureKind),
    Success,
    Canceled,
}

impl EffectiveState {
    /// The wire-level bucket path for this class, e.g. `"queued.first"`,
    /// `"submitted.running"`, `"failure.exception"`.
    pub fn bucket_path(&self) -> String {
        match self {
            EffectiveState::Queued { retry: false } => "queued.first".to_string(),
            EffectiveState::Queued { retry: true } => "queued.retry".to_string(),
            EffectiveState::Pending { .. } => "submitted.pending".to_string(),
            EffectiveState::Running { .. } => "submitted.running".to_string(),
            EffectiveState::Cooloff => "cooloff".to_string(),
            EffectiveState::Paused => "paused".to_string(),
            EffectiveState::Failure(kind) => format!("failure.{kind}"),
            EffectiveState::Success => "success".to_string(),
            EffectiveState::Canceled => "canceled".to_string(),
        }
    }
}

impl std::fmt::Display for EffectiveState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.bucket_path())
    }
}

/// A state string that names no known state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not allowed state {0}")]
pub struct UnknownState(pub String);

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
