// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for the spec tests.

#![allow(dead_code)]

pub use tally_core::{
    DocKind, Document, EntityId, FakeClock, Grouping, JobDoc, JobState, KeyPart, Partial,
    RequestDoc, RequestState, TransitionOutcome, View, ViewKey,
};
pub use tally_storage::{
    DocumentStore, Journal, JobValidation, MaterializedViews, MemoryStore, StoreError,
    TransitionRequest, TransitionStore,
};

pub type Tracker = TransitionStore<MemoryStore, FakeClock>;

pub fn tracker() -> Tracker {
    TransitionStore::new(MemoryStore::new(), FakeClock::new())
}

/// A fresh job document with an empty transition log.
pub fn job_doc(id: &str, workflow: &str) -> Document {
    Document::new(
        id,
        DocKind::Job(
            JobDoc::builder()
                .workflow(workflow)
                .task(format!("{workflow}/Processing"))
                .build(),
        ),
    )
}

pub fn request_doc(id: &str, campaign: &str) -> Document {
    Document::new(
        id,
        DocKind::Request(RequestDoc::builder().campaign(campaign).build()),
    )
}

/// Drive a job through the given hops, asserting each one is accepted.
pub fn walk_job(tracker: &Tracker, id: &EntityId, hops: &[(&str, &str, u64)]) {
    for &(old, new, ts) in hops {
        let outcome = tracker
            .update_job(id, &TransitionRequest::new(old, new, ts))
            .unwrap();
        assert_eq!(outcome, TransitionOutcome::Accepted, "{old} -> {new}");
    }
}

/// Drive a request through the given hops, asserting each one is accepted.
pub fn walk_request(tracker: &Tracker, id: &EntityId, hops: &[(&str, &str, u64)]) {
    for &(old, new, ts) in hops {
        let outcome = tracker
            .update_request(id, &TransitionRequest::new(old, new, ts))
            .unwrap();
        assert_eq!(outcome, TransitionOutcome::Accepted, "{old} -> {new}");
    }
}

/// The stored job payload for `id`.
pub fn stored_job(tracker: &Tracker, id: &EntityId) -> JobDoc {
    let (_, doc) = tracker.store().get(id).unwrap();
    match doc.kind {
        DocKind::Job(job) => job,
        other => panic!("expected job doc, got {}", other.name()),
    }
}

/// Materialized views over everything currently in the tracker's store.
pub fn views_of(tracker: &Tracker) -> MaterializedViews {
    let mut views = MaterializedViews::new();
    let docs = tracker.store().all_docs();
    views.rebuild(&docs);
    views
}
