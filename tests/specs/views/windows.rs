// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Time-window specs
//!
//! Hourly bucketing of transition activity and last-write-wins within a
//! window cell.

use crate::prelude::*;
use tally_core::{bucket_index, bucket_start, HOUR_SECS};

#[test]
fn bucket_boundaries_are_exact() {
    assert_eq!(bucket_index(0, HOUR_SECS), 0);
    assert_eq!(bucket_index(3_599, HOUR_SECS), 0);
    assert_eq!(bucket_index(3_600, HOUR_SECS), 1);
    assert_eq!(bucket_start(42, HOUR_SECS), 0);
    assert_eq!(bucket_start(3_650, HOUR_SECS), 3_600);
}

#[test]
fn adjacent_transitions_split_across_hour_buckets() {
    let tracker = tracker();
    let id = EntityId::new("job-1");
    tracker.create(job_doc("job-1", "wf-a")).unwrap();
    walk_job(
        &tracker,
        &id,
        &[("new", "created", 3_599), ("created", "executing", 3_600)],
    );

    let views = views_of(&tracker);
    let rows = views
        .query(View::SiteHourly, .., Grouping::Detail)
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].0 .0[0], KeyPart::from(0u64));
    assert_eq!(rows[1].0 .0[0], KeyPart::from(1u64));
}

#[test]
fn window_cell_keeps_the_latest_sample() {
    let tracker = tracker();
    // Two jobs hit `created` within the same hour; the cell must remember
    // the later one regardless of application order.
    for (id, ts) in [("job-late", 500u64), ("job-early", 100u64)] {
        tracker.create(job_doc(id, "wf-a")).unwrap();
        walk_job(&tracker, &EntityId::new(id), &[("new", "created", ts)]);
    }

    let views = views_of(&tracker);
    let rows = views
        .query(View::SiteHourly, .., Grouping::Level(1))
        .unwrap();
    assert_eq!(rows.len(), 1);
    let Partial::Window(sample) = &rows[0].1 else {
        panic!("expected window sample");
    };
    assert_eq!(sample.entity, "job-late");
    assert_eq!(sample.timestamp, 500);
}
