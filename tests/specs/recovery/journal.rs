// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recovery specs
//!
//! The journal is the durable transition history: replaying it against a
//! fresh store reconstructs the same documents and the same views.

use crate::prelude::*;
use std::io::Write;
use std::path::Path;
use tally_storage::replay;

fn tracked_with_journal(dir: &Path) -> Tracker {
    let journal = Journal::open(dir.join("transitions.jsonl")).unwrap();
    TransitionStore::new(MemoryStore::new(), FakeClock::new()).with_journal(journal)
}

fn run_scenario(tracker: &Tracker) {
    tracker.create(job_doc("job-1", "wf-a")).unwrap();
    walk_job(
        tracker,
        &EntityId::new("job-1"),
        &[("new", "created", 100)],
    );
    tracker
        .update_job(
            &EntityId::new("job-1"),
            &TransitionRequest::at("created", "executing", "T1_US_FNAL", 110),
        )
        .unwrap();

    tracker.create(job_doc("job-2", "wf-a")).unwrap();
    walk_job(
        tracker,
        &EntityId::new("job-2"),
        &[("new", "created", 100), ("created", "submitfailed", 120)],
    );

    // A rejected hop must leave no journal trace.
    let outcome = tracker
        .update_job(
            &EntityId::new("job-2"),
            &TransitionRequest::new("submitfailed", "success", 130),
        )
        .unwrap();
    assert!(!outcome.is_accepted());
}

#[test]
fn replaying_the_journal_reconstructs_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let original = tracked_with_journal(dir.path());
    run_scenario(&original);

    // Fresh store, same entities created, history re-driven from the journal.
    let restored = tracker();
    restored.create(job_doc("job-1", "wf-a")).unwrap();
    restored.create(job_doc("job-2", "wf-a")).unwrap();
    for entry in replay(dir.path().join("transitions.jsonl")).unwrap() {
        let mut request = TransitionRequest::new(
            entry.transition.old_state.clone(),
            entry.transition.new_state.clone(),
            entry.transition.timestamp,
        );
        request.location = entry.transition.location.clone();
        let outcome = restored.update_job(&entry.entity, &request).unwrap();
        assert!(outcome.is_accepted(), "journaled hop must replay cleanly");
    }

    for id in ["job-1", "job-2"] {
        let id = EntityId::new(id);
        assert_eq!(
            stored_job(&original, &id).transitions,
            stored_job(&restored, &id).transitions,
            "{id}"
        );
    }

    // Derived views agree too.
    let before = views_of(&original);
    let after = views_of(&restored);
    for view in View::ALL {
        assert_eq!(
            before.query(view, .., Grouping::Detail).unwrap(),
            after.query(view, .., Grouping::Detail).unwrap(),
            "{view}"
        );
    }
}

#[test]
fn torn_journal_tail_is_dropped_on_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("transitions.jsonl");
    {
        let tracker = tracked_with_journal(dir.path());
        tracker.create(job_doc("job-1", "wf-a")).unwrap();
        walk_job(
            &tracker,
            &EntityId::new("job-1"),
            &[("new", "created", 100)],
        );
    }

    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .open(&path)
        .unwrap();
    file.write_all(b"{\"seq\":2,\"entity\":\"jo").unwrap();
    drop(file);

    let entries = replay(&path).unwrap();
    assert_eq!(entries.len(), 1);

    // Appends after reopen continue on a clean line.
    let tracker = tracked_with_journal(dir.path());
    tracker.create(job_doc("job-2", "wf-a")).unwrap();
    walk_job(
        &tracker,
        &EntityId::new("job-2"),
        &[("new", "created", 200)],
    );
    let entries = replay(&path).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].seq, 2);
    assert_eq!(entries[1].entity, "job-2");
}

#[test]
fn create_collision_surfaces_as_conflict() {
    let tracker = tracker();
    tracker.create(job_doc("job-1", "wf-a")).unwrap();
    let err = tracker.create(job_doc("job-1", "wf-a")).unwrap_err();
    assert!(matches!(err, StoreError::Conflict(id) if id == "job-1"));
}
