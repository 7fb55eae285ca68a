// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job rejection specs
//!
//! Vetoed and malformed transition requests must report their exact outcome
//! strings and leave the stored document byte-for-byte unchanged.

use crate::prelude::*;

fn settled_job(tracker: &Tracker) -> EntityId {
    let id = EntityId::new("job-1");
    tracker.create(job_doc("job-1", "wf-a")).unwrap();
    walk_job(
        tracker,
        &id,
        &[
            ("new", "created", 100),
            ("created", "executing", 110),
            ("executing", "complete", 120),
            ("complete", "success", 130),
        ],
    );
    id
}

#[test]
fn disallowed_transition_reports_and_changes_nothing() {
    let tracker = tracker();
    let id = settled_job(&tracker);
    let before = tracker.store().get(&id).unwrap();

    let outcome = tracker
        .update_job(&id, &TransitionRequest::new("success", "executing", 200))
        .unwrap();
    assert_eq!(
        outcome.to_string(),
        "not allowed transition success to executing"
    );

    // Same revision, same document: the rejection wrote nothing.
    assert_eq!(tracker.store().get(&id).unwrap(), before);
}

#[test]
fn duplicate_delivery_reports_same_state() {
    let tracker = tracker();
    let id = settled_job(&tracker);
    let before = tracker.store().get(&id).unwrap();

    let outcome = tracker
        .update_job(&id, &TransitionRequest::new("success", "success", 200))
        .unwrap();
    assert_eq!(outcome.to_string(), "SAME STATE");
    assert_eq!(tracker.store().get(&id).unwrap(), before);
}

#[test]
fn unknown_state_reports_not_allowed_state() {
    let tracker = tracker();
    let id = settled_job(&tracker);

    let outcome = tracker
        .update_job(&id, &TransitionRequest::new("success", "finished", 200))
        .unwrap();
    assert_eq!(outcome.to_string(), "not allowed state finished");
}

#[test]
fn stale_oldstate_reports_illegal_transition() {
    let tracker = tracker();
    let id = settled_job(&tracker);
    let before = tracker.store().get(&id).unwrap();

    // The sender thinks the job is still executing.
    let outcome = tracker
        .update_job(&id, &TransitionRequest::new("executing", "jobfailed", 200))
        .unwrap();
    assert_eq!(outcome.to_string(), "ILLEGAL TRANSITION");
    assert_eq!(tracker.store().get(&id).unwrap(), before);
}
