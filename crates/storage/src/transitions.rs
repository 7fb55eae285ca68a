// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transition intake: validate a requested state change against the stored
//! entity, append it on acceptance, journal it, and report the outcome.
//!
//! The read-validate-append sequence for one entity is made atomic by the
//! store's revision check: a concurrent writer surfaces as a conflict and
//! the whole sequence is retried against the fresh document. Rejections and
//! illegal requests leave the document untouched and are reported as
//! outcomes, not errors; only infrastructure failures use `Err`.

use crate::journal::Journal;
use crate::store::{DocumentStore, Revision, StoreError};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::str::FromStr;
use tally_core::{
    Clock, DocKind, Document, EntityId, JobPolicy, JobState, PermissivePolicy, RejectedTransition,
    RequestPolicy, RequestState, SystemClock, Transition, TransitionOutcome, TransitionPolicy,
};

/// Bounded optimistic-concurrency retries per update.
const CAS_ATTEMPTS: u32 = 5;

/// A requested state change, in wire form. State names arrive as strings
/// and are validated here; `timestamp` is caller-supplied epoch seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRequest {
    pub oldstate: SmolStr,
    pub newstate: SmolStr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SmolStr>,
    pub timestamp: u64,
}

impl TransitionRequest {
    pub fn new(
        oldstate: impl Into<SmolStr>,
        newstate: impl Into<SmolStr>,
        timestamp: u64,
    ) -> Self {
        Self {
            oldstate: oldstate.into(),
            newstate: newstate.into(),
            location: None,
            timestamp,
        }
    }

    pub fn at(
        oldstate: impl Into<SmolStr>,
        newstate: impl Into<SmolStr>,
        location: impl Into<SmolStr>,
        timestamp: u64,
    ) -> Self {
        Self {
            oldstate: oldstate.into(),
            newstate: newstate.into(),
            location: Some(location.into()),
            timestamp,
        }
    }
}

/// How strictly job transitions are checked.
///
/// `Strict` enforces the agent state machine and the claimed-oldstate match.
/// `Permissive` trusts the sender (bulk agent dumps replaying their own
/// machine) and rejects only same-state no-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobValidation {
    #[default]
    Strict,
    Permissive,
}

/// Transition intake over a document store, with an optional durability
/// journal for accepted transitions.
pub struct TransitionStore<D, C = SystemClock> {
    store: D,
    clock: C,
    journal: Option<Mutex<Journal>>,
    job_validation: JobValidation,
}

impl<D: DocumentStore, C: Clock> TransitionStore<D, C> {
    pub fn new(store: D, clock: C) -> Self {
        Self {
            store,
            clock,
            journal: None,
            job_validation: JobValidation::Strict,
        }
    }

    /// Journal accepted transitions to `journal`.
    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = Some(Mutex::new(journal));
        self
    }

    pub fn with_job_validation(mut self, mode: JobValidation) -> Self {
        self.job_validation = mode;
        self
    }

    pub fn store(&self) -> &D {
        &self.store
    }

    /// Create a new entity document. Revision 0 semantics: fails with a
    /// conflict when the id already exists.
    pub fn create(&self, doc: Document) -> Result<Revision, StoreError> {
        let id = doc.id.clone();
        self.store.put(&id, 0, doc)
    }

    /// Apply a requested job state change.
    pub fn update_job(
        &self,
        id: &EntityId,
        request: &TransitionRequest,
    ) -> Result<TransitionOutcome, StoreError> {
        let (new_state, claimed_old) = match parse_pair::<JobState>(id, request) {
            Ok(pair) => pair,
            Err(outcome) => return Ok(outcome),
        };

        let mut attempt = 0;
        loop {
            attempt += 1;
            let (rev, mut doc) = self.store.get(id)?;
            let job = match &mut doc.kind {
                DocKind::Job(job) => job,
                other => {
                    return Err(StoreError::WrongKind {
                        id: id.clone(),
                        expected: "job",
                        found: other.name(),
                    })
                }
            };

            let current = job.transitions.current_state();
            if self.job_validation == JobValidation::Strict && claimed_old != current {
                tracing::info!(entity = %id, claimed = %claimed_old, actual = %current,
                    "illegal transition request");
                return Ok(TransitionOutcome::Illegal);
            }
            let check = match self.job_validation {
                JobValidation::Strict => JobPolicy.check(current, new_state),
                JobValidation::Permissive => {
                    PermissivePolicy::default().check(current, new_state)
                }
            };
            if let Err(reason) = check {
                tracing::info!(entity = %id, from = %current, to = %new_state,
                    "transition rejected: {reason}");
                return Ok(TransitionOutcome::Rejected(reason));
            }

            let mut transition = Transition::new(current, new_state, request.timestamp);
            transition.location = request.location.clone();
            job.transitions.push(transition);
            if let Some(site) = &request.location {
                job.site = Some(site.clone());
            }

            match self.store.put(id, rev, doc) {
                Ok(_) => {
                    self.record(id, current.to_string(), new_state.to_string(), request)?;
                    return Ok(TransitionOutcome::Accepted);
                }
                Err(StoreError::Conflict(_)) if attempt < CAS_ATTEMPTS => continue,
                Err(err) => return Err(err),
            }
        }
    }

    /// Apply a requested request/workflow state change. Requests are always
    /// checked strictly against the lifecycle graph.
    pub fn update_request(
        &self,
        id: &EntityId,
        request: &TransitionRequest,
    ) -> Result<TransitionOutcome, StoreError> {
        let (new_state, claimed_old) = match parse_pair::<RequestState>(id, request) {
            Ok(pair) => pair,
            Err(outcome) => return Ok(outcome),
        };

        let mut attempt = 0;
        loop {
            attempt += 1;
            let (rev, mut doc) = self.store.get(id)?;
            let req_doc = match &mut doc.kind {
                DocKind::Request(req) => req,
                other => {
                    return Err(StoreError::WrongKind {
                        id: id.clone(),
                        expected: "request",
                        found: other.name(),
                    })
                }
            };

            let current = req_doc.transitions.current_state();
            if claimed_old != current {
                tracing::info!(entity = %id, claimed = %claimed_old, actual = %current,
                    "illegal transition request");
                return Ok(TransitionOutcome::Illegal);
            }
            if let Err(reason) = RequestPolicy.check(current, new_state) {
                tracing::info!(entity = %id, from = %current, to = %new_state,
                    "transition rejected: {reason}");
                return Ok(TransitionOutcome::Rejected(reason));
            }

            let mut transition = Transition::new(current, new_state, request.timestamp);
            transition.location = request.location.clone();
            req_doc.transitions.push(transition);

            match self.store.put(id, rev, doc) {
                Ok(_) => {
                    self.record(id, current.to_string(), new_state.to_string(), request)?;
                    return Ok(TransitionOutcome::Accepted);
                }
                Err(StoreError::Conflict(_)) if attempt < CAS_ATTEMPTS => continue,
                Err(err) => return Err(err),
            }
        }
    }

    fn record(
        &self,
        id: &EntityId,
        old_state: String,
        new_state: String,
        request: &TransitionRequest,
    ) -> Result<(), StoreError> {
        let Some(journal) = &self.journal else {
            return Ok(());
        };
        let mut wire = Transition::new(
            SmolStr::new(old_state),
            SmolStr::new(new_state),
            request.timestamp,
        );
        wire.location = request.location.clone();
        let mut journal = journal.lock();
        journal.append(id, wire, self.clock.epoch_ms())?;
        journal.flush()?;
        Ok(())
    }
}

/// Parse the requested state pair, mapping unknown names to a
/// `not allowed state` rejection.
fn parse_pair<S: FromStr + Copy>(
    id: &EntityId,
    request: &TransitionRequest,
) -> Result<(S, S), TransitionOutcome> {
    let new_state = request.newstate.parse::<S>().map_err(|_| {
        tracing::info!(entity = %id, state = %request.newstate, "unknown target state");
        TransitionOutcome::Rejected(RejectedTransition::not_allowed_state(&request.newstate))
    })?;
    let claimed_old = request.oldstate.parse::<S>().map_err(|_| {
        tracing::info!(entity = %id, state = %request.oldstate, "unknown source state");
        TransitionOutcome::Rejected(RejectedTransition::not_allowed_state(&request.oldstate))
    })?;
    Ok((new_state, claimed_old))
}

#[cfg(test)]
#[path = "transitions_tests.rs"]
mod tests;
