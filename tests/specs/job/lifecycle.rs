// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job lifecycle specs
//!
//! Walk jobs through the agent state machine and verify the derived
//! projections: effective state buckets, retry accounting, and last known
//! location.

use crate::prelude::*;

#[test]
fn cooled_off_retry_counts_as_queued_retry() {
    let tracker = tracker();
    let id = EntityId::new("job-retry");
    tracker.create(job_doc("job-retry", "wf-a")).unwrap();

    walk_job(
        &tracker,
        &id,
        &[
            ("new", "created", 100),
            ("created", "executing", 110),
            ("executing", "jobfailed", 120),
            ("jobfailed", "jobcooloff", 130),
            ("jobcooloff", "created", 140),
        ],
    );
    let job = stored_job(&tracker, &id);
    assert_eq!(job.transitions.retry_count(), 1);
    assert_eq!(job.transitions.current_state(), JobState::Created);
    assert_eq!(job.transitions.effective_state().bucket_path(), "queued.retry");
}

#[test]
fn cooled_off_job_remembers_where_it_ran() {
    let tracker = tracker();
    let id = EntityId::new("job-cool");
    tracker.create(job_doc("job-cool", "wf-a")).unwrap();

    walk_job(&tracker, &id, &[("new", "created", 0)]);
    tracker
        .update_job(
            &id,
            &TransitionRequest::at("created", "executing", "SiteA", 10),
        )
        .unwrap();
    walk_job(
        &tracker,
        &id,
        &[
            ("executing", "jobfailed", 20),
            ("jobfailed", "jobcooloff", 30),
        ],
    );

    let job = stored_job(&tracker, &id);
    assert_eq!(job.transitions.effective_state().bucket_path(), "cooloff");
    assert_eq!(
        job.transitions.last_known_location().map(|s| s.as_str()),
        Some("SiteA")
    );
}

#[test]
fn executing_job_is_attributed_to_its_site() {
    let tracker = tracker();
    let id = EntityId::new("job-run");
    tracker.create(job_doc("job-run", "wf-a")).unwrap();

    tracker
        .update_job(&id, &TransitionRequest::new("new", "created", 100))
        .unwrap();
    tracker
        .update_job(
            &id,
            &TransitionRequest::at("created", "executing", "T1_US_FNAL", 110),
        )
        .unwrap();

    let job = stored_job(&tracker, &id);
    assert_eq!(
        job.transitions.last_known_location().map(|s| s.as_str()),
        Some("T1_US_FNAL")
    );
    assert_eq!(
        job.transitions.effective_state().bucket_path(),
        "submitted.running"
    );

    let views = views_of(&tracker);
    let rows = views
        .query(View::JobsBySite, .., Grouping::Detail)
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].0, ViewKey::from(["T1_US_FNAL", "submitted.running"]));
}

#[test]
fn cleanout_preserves_the_outcome_it_was_reached_from() {
    let tracker = tracker();

    // success -> cleanout stays a success
    let done = EntityId::new("job-done");
    tracker.create(job_doc("job-done", "wf-a")).unwrap();
    walk_job(
        &tracker,
        &done,
        &[
            ("new", "created", 100),
            ("created", "executing", 110),
            ("executing", "complete", 120),
            ("complete", "success", 130),
            ("success", "cleanout", 140),
        ],
    );
    assert_eq!(
        stored_job(&tracker, &done).transitions.effective_state().bucket_path(),
        "success"
    );

    // killed -> cleanout stays a cancellation
    let killed = EntityId::new("job-killed");
    tracker.create(job_doc("job-killed", "wf-a")).unwrap();
    walk_job(
        &tracker,
        &killed,
        &[
            ("new", "created", 100),
            ("created", "killed", 110),
            ("killed", "cleanout", 120),
        ],
    );
    assert_eq!(
        stored_job(&tracker, &killed).transitions.effective_state().bucket_path(),
        "canceled"
    );

    // exhausted -> cleanout stays a failure
    let lost = EntityId::new("job-lost");
    tracker.create(job_doc("job-lost", "wf-a")).unwrap();
    walk_job(
        &tracker,
        &lost,
        &[
            ("new", "created", 100),
            ("created", "executing", 110),
            ("executing", "jobfailed", 120),
            ("jobfailed", "exhausted", 130),
            ("exhausted", "cleanout", 140),
        ],
    );
    assert_eq!(
        stored_job(&tracker, &lost).transitions.effective_state().bucket_path(),
        "failure.exception"
    );
}

#[test]
fn out_of_order_delivery_projects_the_same_state() {
    // Two jobs see the same transitions; one log arrives shuffled. The
    // canonical ordering must make the projections agree.
    let tracker = tracker().with_job_validation(JobValidation::Permissive);
    let id = EntityId::new("job-shuffled");
    tracker.create(job_doc("job-shuffled", "wf-a")).unwrap();

    // Delivered late: the executing hop (ts 110) arrives after success (130).
    for (old, new, ts) in [
        ("new", "created", 100),
        ("created", "complete", 120),
        ("complete", "success", 130),
        ("success", "executing", 110),
    ] {
        tracker
            .update_job(&id, &TransitionRequest::new(old, new, ts))
            .unwrap();
    }

    let job = stored_job(&tracker, &id);
    assert_eq!(job.transitions.current_state(), JobState::Success);
    assert_eq!(job.transitions.effective_state().bucket_path(), "success");
}
