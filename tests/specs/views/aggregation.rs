// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Aggregation specs
//!
//! Counter merges, group-level roll-up, and composite-key collation across
//! the materialized views.

use crate::prelude::*;
use tally_core::{combine, EffectiveState, FailureKind, StateSummary};

#[test]
fn partial_sums_add_field_by_field() {
    let mut left = StateSummary::default();
    for _ in 0..3 {
        left.bump(EffectiveState::Success);
    }
    left.bump(EffectiveState::Failure(FailureKind::Exception));

    let mut right = StateSummary::default();
    right.bump(EffectiveState::Success);
    right.bump(EffectiveState::Success);

    let combined = combine(
        &[Partial::Jobs(left), Partial::Jobs(right)],
        true,
    )
    .unwrap();
    let Partial::Jobs(summary) = combined else {
        panic!("expected jobs partial");
    };
    assert_eq!(summary.success, 5);
    assert_eq!(summary.failure.exception, 1);
    assert_eq!(summary.total(), 6);
}

#[test]
fn site_view_rolls_up_per_site_and_overall() {
    let tracker = tracker();
    for (id, site, fail) in [
        ("job-1", "T1_US_FNAL", false),
        ("job-2", "T1_US_FNAL", false),
        ("job-3", "T2_DE_DESY", true),
    ] {
        tracker.create(job_doc(id, "wf-a")).unwrap();
        let entity = EntityId::new(id);
        walk_job(
            &tracker,
            &entity,
            &[("new", "created", 100)],
        );
        tracker
            .update_job(
                &entity,
                &TransitionRequest::at("created", "executing", site, 110),
            )
            .unwrap();
        if fail {
            walk_job(&tracker, &entity, &[("executing", "jobfailed", 120)]);
        }
    }

    let views = views_of(&tracker);

    // Per-site: group by the leading site component.
    let rows = views
        .query(View::JobsBySite, .., Grouping::Level(1))
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].0, ViewKey::from(["T1_US_FNAL"]));
    let Partial::Jobs(fnal) = &rows[0].1 else {
        panic!("expected jobs partial");
    };
    assert_eq!(fnal.submitted.running, 2);
    let Partial::Jobs(desy) = &rows[1].1 else {
        panic!("expected jobs partial");
    };
    assert_eq!(desy.failure.exception, 1);

    // Overall: one row covering everything.
    let rows = views.query(View::JobsBySite, .., Grouping::All).unwrap();
    assert_eq!(rows.len(), 1);
    let Partial::Jobs(all) = &rows[0].1 else {
        panic!("expected jobs partial");
    };
    assert_eq!(all.total(), 3);
    assert_eq!(all.failures(), 1);
}

#[test]
fn composite_keys_collate_numbers_before_strings() {
    let keys = [
        ViewKey::from(["zeta"]),
        ViewKey(vec![KeyPart::from(10u64)]),
        ViewKey(vec![KeyPart::from(2u64)]),
        ViewKey::from(["alpha"]),
    ];
    let mut sorted = keys.clone();
    sorted.sort();

    assert_eq!(
        sorted,
        [
            ViewKey(vec![KeyPart::from(2u64)]),
            ViewKey(vec![KeyPart::from(10u64)]),
            ViewKey::from(["alpha"]),
            ViewKey::from(["zeta"]),
        ]
    );
}

#[test]
fn detail_rows_come_back_in_key_order() {
    let tracker = tracker();
    for (id, wf) in [("job-b", "wf-b"), ("job-a", "wf-a"), ("job-c", "wf-c")] {
        tracker.create(job_doc(id, wf)).unwrap();
        walk_job(&tracker, &EntityId::new(id), &[("new", "created", 100)]);
    }

    let views = views_of(&tracker);
    let rows = views
        .query(View::JobsByWorkflow, .., Grouping::Detail)
        .unwrap();
    let workflows: Vec<String> = rows.iter().map(|(key, _)| key.0[0].to_string()).collect();
    assert_eq!(workflows, ["wf-a", "wf-b", "wf-c"]);
}
