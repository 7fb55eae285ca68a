// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire-format specs
//!
//! Field names on stored documents and transition requests are consumed by
//! external agents and dashboards; they are contracts, not implementation
//! details.

use crate::prelude::*;
use serde_json::json;

#[test]
fn job_document_uses_the_historical_field_names() {
    let tracker = tracker();
    let id = EntityId::new("job-1");
    tracker.create(job_doc("job-1", "wf-a")).unwrap();
    tracker
        .update_job(
            &id,
            &TransitionRequest::at("new", "created", "T1_US_FNAL", 1_700_000_000),
        )
        .unwrap();

    let (_, doc) = tracker.store().get(&id).unwrap();
    let value = serde_json::to_value(&doc).unwrap();

    assert_eq!(value["_id"], "job-1");
    assert_eq!(value["type"], "job");
    assert_eq!(value["schema"], 1);
    assert_eq!(value["workflow"], "wf-a");
    let transition = &value["transitions"][0];
    assert_eq!(transition["oldstate"], "new");
    assert_eq!(transition["newstate"], "created");
    assert_eq!(transition["location"], "T1_US_FNAL");
    assert_eq!(transition["timestamp"], 1_700_000_000u64);
}

#[test]
fn job_document_parses_with_defaults() {
    let doc: Document = serde_json::from_value(json!({
        "_id": "job-9",
        "type": "job",
        "workflow": "wf-a",
        "task": "wf-a/Processing",
        "jobid": 9
    }))
    .unwrap();

    assert_eq!(doc.schema, 1);
    let DocKind::Job(job) = doc.kind else {
        panic!("expected job doc");
    };
    assert!(job.transitions.is_empty());
    assert!(job.errors.is_empty());
    assert_eq!(job.transitions.current_state(), JobState::New);
}

#[test]
fn transition_request_parses_from_agent_payload() {
    let request: TransitionRequest = serde_json::from_value(json!({
        "oldstate": "created",
        "newstate": "executing",
        "location": "T2_DE_DESY",
        "timestamp": 1_700_000_123u64
    }))
    .unwrap();

    assert_eq!(
        request,
        TransitionRequest::at("created", "executing", "T2_DE_DESY", 1_700_000_123)
    );
}

#[test]
fn request_state_names_keep_their_dashes() {
    let states: Vec<RequestState> =
        serde_json::from_value(json!(["running-open", "closed-out", "normal-archived"])).unwrap();
    assert_eq!(
        states,
        [
            RequestState::RunningOpen,
            RequestState::ClosedOut,
            RequestState::NormalArchived
        ]
    );
}
