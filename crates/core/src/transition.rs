// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only transition logs and the current-state projection.
//!
//! A transition log is the single source of truth for an entity's history.
//! Entries are appended, never edited or removed. Readers must tolerate
//! out-of-order appends: every projection first applies the canonical
//! ordering (stable sort by timestamp, ties broken by append order).

use crate::state::{EffectiveState, JobState, RequestState};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// One immutable state-transition record.
///
/// `timestamp` is caller-supplied epoch seconds; the log never assigns
/// timestamps itself. `location` is the site that reported the transition,
/// absent for transitions recorded directly by the orchestration agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition<S> {
    #[serde(rename = "oldstate")]
    pub old_state: S,
    #[serde(rename = "newstate")]
    pub new_state: S,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SmolStr>,
    pub timestamp: u64,
}

impl<S> Transition<S> {
    pub fn new(old_state: S, new_state: S, timestamp: u64) -> Self {
        Self {
            old_state,
            new_state,
            location: None,
            timestamp,
        }
    }

    pub fn at(old_state: S, new_state: S, location: impl Into<SmolStr>, timestamp: u64) -> Self {
        Self {
            old_state,
            new_state,
            location: Some(location.into()),
            timestamp,
        }
    }
}

/// Ordered, append-only sequence of transitions for one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransitionLog<S>(Vec<Transition<S>>);

impl<S> Default for TransitionLog<S> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<S> TransitionLog<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transition. Purely additive; validation happens upstream.
    pub fn push(&mut self, transition: Transition<S>) {
        self.0.push(transition);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries in append order, unsorted.
    pub fn iter(&self) -> std::slice::Iter<'_, Transition<S>> {
        self.0.iter()
    }

    /// Entries in canonical order: stable-sorted by timestamp, ties broken
    /// by append order. Applied uniformly wherever "the last transition"
    /// is taken.
    pub fn canonical(&self) -> Vec<&Transition<S>> {
        let mut entries: Vec<&Transition<S>> = self.0.iter().collect();
        entries.sort_by_key(|t| t.timestamp);
        entries
    }

    /// The chronologically last transition under canonical ordering.
    pub fn last(&self) -> Option<&Transition<S>> {
        self.canonical().into_iter().next_back()
    }
}

impl<S> FromIterator<Transition<S>> for TransitionLog<S> {
    fn from_iter<I: IntoIterator<Item = Transition<S>>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a, S> IntoIterator for &'a TransitionLog<S> {
    type Item = &'a Transition<S>;
    type IntoIter = std::slice::Iter<'a, Transition<S>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl TransitionLog<JobState> {
    /// Bookkeeping state: `new_state` of the chronologically last entry.
    /// Empty logs project to `new` (the entity exists but nothing has
    /// happened to it yet).
    pub fn current_state(&self) -> JobState {
        self.last().map(|t| t.new_state).unwrap_or(JobState::New)
    }

    /// Semantic state with the cleanout indirection applied.
    pub fn effective_state(&self) -> EffectiveState {
        self.effective_state_with(false)
    }

    /// Like [`effective_state`](Self::effective_state), with an external hint
    /// that a site has been assigned. The log alone only knows about located
    /// executing transitions; the document's assigned-site field covers jobs
    /// whose transitions carried no location.
    pub fn effective_state_with(&self, site_assigned: bool) -> EffectiveState {
        let retry = self.retry_count() > 0;
        let scheduled = site_assigned || self.last_known_location().is_some();
        match self.last() {
            Some(last) => last
                .new_state
                .effective(Some(last.old_state), retry, scheduled),
            None => JobState::New.effective(None, retry, scheduled),
        }
    }

    /// The site of the most recent transition into `executing` — the last
    /// place this job actually ran, independent of where it has moved since.
    ///
    /// `None` means "not yet scheduled", not an error: a job whose log is
    /// just `new → created` has never reached a site.
    pub fn last_known_location(&self) -> Option<&SmolStr> {
        self.canonical()
            .into_iter()
            .rev()
            .find(|t| t.new_state == JobState::Executing)
            .and_then(|t| t.location.as_ref())
    }

    /// Number of retries: cooloff → created edges in the log.
    pub fn retry_count(&self) -> u32 {
        self.0
            .iter()
            .filter(|t| t.old_state.is_cooloff() && t.new_state == JobState::Created)
            .count() as u32
    }
}

impl TransitionLog<RequestState> {
    /// Current request state under canonical ordering. Empty logs are `new`.
    pub fn current_state(&self) -> RequestState {
        self.last()
            .map(|t| t.new_state)
            .unwrap_or(RequestState::New)
    }
}

#[cfg(test)]
#[path = "transition_tests.rs"]
mod tests;
