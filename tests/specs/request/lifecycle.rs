// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request lifecycle specs
//!
//! Requests follow the workflow lifecycle graph; completed requests only
//! continue into the archival chain.

use crate::prelude::*;

#[test]
fn request_reaches_completed_and_archives() {
    let tracker = tracker();
    let id = EntityId::new("req-1");
    tracker.create(request_doc("req-1", "spring-2026")).unwrap();

    walk_request(
        &tracker,
        &id,
        &[
            ("new", "assigned", 100),
            ("assigned", "acquired", 110),
            ("acquired", "running-open", 120),
            ("running-open", "running-closed", 130),
            ("running-closed", "completed", 140),
            ("completed", "closed-out", 150),
            ("closed-out", "announced", 160),
            ("announced", "normal-archived", 170),
        ],
    );

    let (_, doc) = tracker.store().get(&id).unwrap();
    let DocKind::Request(req) = doc.kind else {
        panic!("expected request doc");
    };
    assert_eq!(req.transitions.current_state(), RequestState::NormalArchived);
    assert!(req.transitions.current_state().is_archived());
}

#[test]
fn completed_request_cannot_go_back_to_running() {
    let tracker = tracker();
    let id = EntityId::new("req-1");
    tracker.create(request_doc("req-1", "spring-2026")).unwrap();
    walk_request(
        &tracker,
        &id,
        &[
            ("new", "assigned", 100),
            ("assigned", "running", 110),
            ("running", "completed", 120),
        ],
    );
    let before = tracker.store().get(&id).unwrap();

    let outcome = tracker
        .update_request(&id, &TransitionRequest::new("completed", "running", 200))
        .unwrap();
    assert_eq!(
        outcome.to_string(),
        "not allowed transition completed to running"
    );
    assert_eq!(tracker.store().get(&id).unwrap(), before);
}

#[test]
fn campaign_view_counts_requests_by_state() {
    let tracker = tracker();
    for (id, hops) in [
        ("req-1", vec![("new", "assigned", 100)]),
        ("req-2", vec![("new", "assigned", 100), ("assigned", "running", 110)]),
        ("req-3", vec![]),
    ] {
        tracker.create(request_doc(id, "spring-2026")).unwrap();
        walk_request(&tracker, &EntityId::new(id), &hops);
    }
    tracker.create(request_doc("req-4", "winter-2025")).unwrap();

    let views = views_of(&tracker);
    let rows = views
        .query(View::RequestsByCampaign, .., Grouping::Level(1))
        .unwrap();
    assert_eq!(rows.len(), 2);

    // Key order: "spring-2026" < "winter-2025".
    assert_eq!(rows[0].0, ViewKey::from(["spring-2026"]));
    let Partial::Requests(summary) = &rows[0].1 else {
        panic!("expected request counts");
    };
    assert_eq!(summary.get(RequestState::Assigned), 1);
    assert_eq!(summary.get(RequestState::Running), 1);
    assert_eq!(summary.get(RequestState::New), 1);
    assert_eq!(summary.total(), 3);
}
