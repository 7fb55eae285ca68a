// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Aggregate counter structures.
//!
//! Field names are a wire-compatibility contract: every consuming dashboard
//! addresses counters as `queued.first`, `submitted.running`,
//! `failure.exception`, and so on. Renaming a field breaks them.
//!
//! All additive counters merge by field-wise addition, which is associative
//! and commutative so partial sums can be combined in any order and at any
//! fan-in. The two designed exceptions: latest-wins fields (compared by
//! timestamp) and first-wins fields (any one sample is representative).

use crate::state::{ClipboardState, EffectiveState, FailureKind, RequestState};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::collections::BTreeMap;

/// Jobs not yet handed to a site, split by first attempt vs retry.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedCounts {
    #[serde(default)]
    pub first: u64,
    #[serde(default)]
    pub retry: u64,
}

/// Jobs submitted to a site: first/retry split plus pending/running status.
///
/// A submitted job counts in exactly one of `first`/`retry` *and* exactly
/// one of `pending`/`running`, so the two pairs each sum to the number of
/// submitted jobs.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedCounts {
    #[serde(default)]
    pub first: u64,
    #[serde(default)]
    pub retry: u64,
    #[serde(default)]
    pub pending: u64,
    #[serde(default)]
    pub running: u64,
}

/// Failed jobs by failure phase.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureCounts {
    #[serde(default)]
    pub create: u64,
    #[serde(default)]
    pub submit: u64,
    #[serde(default)]
    pub exception: u64,
}

/// Per-bucket job counts mirroring the state taxonomy.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSummary {
    #[serde(default)]
    pub success: u64,
    #[serde(default)]
    pub canceled: u64,
    #[serde(default)]
    pub cooloff: u64,
    #[serde(default)]
    pub paused: u64,
    #[serde(default)]
    pub queued: QueuedCounts,
    #[serde(default)]
    pub submitted: SubmittedCounts,
    #[serde(default)]
    pub failure: FailureCounts,
}

impl StateSummary {
    /// Count one job in the bucket for its effective state.
    pub fn bump(&mut self, state: EffectiveState) {
        match state {
            EffectiveState::Queued { retry: false } => self.queued.first += 1,
            EffectiveState::Queued { retry: true } => self.queued.retry += 1,
            EffectiveState::Pending { retry } | EffectiveState::Running { retry } => {
                if retry {
                    self.submitted.retry += 1;
                } else {
                    self.submitted.first += 1;
                }
                if matches!(state, EffectiveState::Pending { .. }) {
                    self.submitted.pending += 1;
                } else {
                    self.submitted.running += 1;
                }
            }
            EffectiveState::Cooloff => self.cooloff += 1,
            EffectiveState::Paused => self.paused += 1,
            EffectiveState::Failure(FailureKind::Create) => self.failure.create += 1,
            EffectiveState::Failure(FailureKind::Submit) => self.failure.submit += 1,
            EffectiveState::Failure(FailureKind::Exception) => self.failure.exception += 1,
            EffectiveState::Success => self.success += 1,
            EffectiveState::Canceled => self.canceled += 1,
        }
    }

    /// A summary counting a single job.
    pub fn of(state: EffectiveState) -> Self {
        let mut summary = Self::default();
        summary.bump(state);
        summary
    }

    /// Field-wise addition. Counters are added, never overwritten.
    pub fn merge(&mut self, other: &StateSummary) {
        self.success += other.success;
        self.canceled += other.canceled;
        self.cooloff += other.cooloff;
        self.paused += other.paused;
        self.queued.first += other.queued.first;
        self.queued.retry += other.queued.retry;
        self.submitted.first += other.submitted.first;
        self.submitted.retry += other.submitted.retry;
        self.submitted.pending += other.submitted.pending;
        self.submitted.running += other.submitted.running;
        self.failure.create += other.failure.create;
        self.failure.submit += other.failure.submit;
        self.failure.exception += other.failure.exception;
    }

    pub fn total(&self) -> u64 {
        self.success
            + self.canceled
            + self.cooloff
            + self.paused
            + self.queued.first
            + self.queued.retry
            + self.submitted.pending
            + self.submitted.running
            + self.failure.create
            + self.failure.submit
            + self.failure.exception
    }

    pub fn failures(&self) -> u64 {
        self.failure.create + self.failure.submit + self.failure.exception
    }

    /// Success fraction in percent. The denominator substitutes 1 when the
    /// sample is empty, yielding a defined 0% instead of NaN.
    pub fn success_rate(&self) -> f64 {
        ratio(self.success, self.success + self.failures()) * 100.0
    }
}

/// `num / denom`, substituting 1 for a zero denominator.
pub fn ratio(num: u64, denom: u64) -> f64 {
    num as f64 / std::cmp::max(denom, 1) as f64
}

/// A timestamped value merged by latest-wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stamped<T> {
    pub timestamp: u64,
    pub value: T,
}

impl<T> Stamped<T> {
    pub fn new(timestamp: u64, value: T) -> Self {
        Self { timestamp, value }
    }

    /// Keep the newer of the two. Ties keep the incumbent so repeated
    /// merges of the same records stay stable.
    pub fn keep_newer(&mut self, other: Stamped<T>) {
        if other.timestamp > self.timestamp {
            *self = other;
        }
    }
}

/// Error roll-up for one (workflow, step) key.
///
/// `count` means "+1 per raw error row" at reduce level and "+= sub-count"
/// at rereduce level. `kind` is first-wins (all rows under one key report
/// the same failure phase); `last_error` is latest-wins by timestamp.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorSummary {
    #[serde(default)]
    pub count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<FailureKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<Stamped<String>>,
}

impl ErrorSummary {
    /// Fold in one raw error row.
    pub fn absorb_row(&mut self, kind: FailureKind, timestamp: u64, message: &str) {
        self.count += 1;
        if self.kind.is_none() {
            self.kind = Some(kind);
        }
        let sample = Stamped::new(timestamp, message.to_string());
        match &mut self.last_error {
            Some(existing) => existing.keep_newer(sample),
            None => self.last_error = Some(sample),
        }
    }

    /// Fold in an already-reduced partial.
    pub fn absorb(&mut self, other: &ErrorSummary) {
        self.count += other.count;
        if self.kind.is_none() {
            self.kind = other.kind;
        }
        if let Some(sample) = other.last_error.clone() {
            match &mut self.last_error {
                Some(existing) => existing.keep_newer(sample),
                None => self.last_error = Some(sample),
            }
        }
    }
}

/// Output roll-up for one (workflow, dataset) key. `dataset` is first-wins:
/// every sample under one key names the same dataset, so any one is
/// representative.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset: Option<SmolStr>,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub events: u64,
    #[serde(default)]
    pub count: u64,
}

impl OutputSummary {
    /// Fold in one raw output-file row.
    pub fn absorb_row(&mut self, dataset: &SmolStr, size: u64, events: u64) {
        self.count += 1;
        self.size += size;
        self.events += events;
        if self.dataset.is_none() {
            self.dataset = Some(dataset.clone());
        }
    }

    /// Fold in an already-reduced partial.
    pub fn absorb(&mut self, other: &OutputSummary) {
        self.count += other.count;
        self.size += other.size;
        self.events += other.events;
        if self.dataset.is_none() {
            self.dataset = other.dataset.clone();
        }
    }
}

/// Counts keyed by a closed state set (request states, clipboard states).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CountMap<S: Ord>(pub BTreeMap<S, u64>);

impl<S: Ord> Default for CountMap<S> {
    fn default() -> Self {
        Self(BTreeMap::new())
    }
}

impl<S: Ord + Copy> CountMap<S> {
    /// A map counting a single entity.
    pub fn of(state: S) -> Self {
        let mut map = Self::default();
        map.bump(state);
        map
    }

    pub fn bump(&mut self, state: S) {
        *self.0.entry(state).or_insert(0) += 1;
    }

    pub fn merge(&mut self, other: &CountMap<S>) {
        for (&state, &count) in &other.0 {
            *self.0.entry(state).or_insert(0) += count;
        }
    }

    pub fn get(&self, state: S) -> u64 {
        self.0.get(&state).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }
}

/// Request counts by lifecycle state (one per campaign key).
pub type RequestSummary = CountMap<RequestState>;

/// Clipboard item counts by clipboard state.
pub type ClipboardSummary = CountMap<ClipboardState>;

#[cfg(test)]
#[path = "summary_tests.rs"]
mod tests;
