// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Time-window bucketing for hourly transition views.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Default window width for hourly views, in seconds.
pub const HOUR_SECS: u64 = 3600;

/// Bucket index for a timestamp: `floor(timestamp / bucket_secs)`.
/// A transition at 3599 and one at 3600 land in different hourly buckets.
pub fn bucket_index(timestamp: u64, bucket_secs: u64) -> u64 {
    timestamp / bucket_secs.max(1)
}

/// Start of the bucket containing `timestamp`, in epoch seconds.
pub fn bucket_start(timestamp: u64, bucket_secs: u64) -> u64 {
    bucket_index(timestamp, bucket_secs) * bucket_secs.max(1)
}

/// The representative transition record for one (bucket, site, state) cell.
///
/// Window cells are *not* additive: when two records collide on the same
/// bucket and sub-key, the one with the greater timestamp wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSample {
    pub entity: SmolStr,
    pub timestamp: u64,
}

impl WindowSample {
    pub fn new(entity: impl Into<SmolStr>, timestamp: u64) -> Self {
        Self {
            entity: entity.into(),
            timestamp,
        }
    }

    /// Last-write-wins within a bucket cell; ties keep the incumbent.
    pub fn keep_newer(&mut self, other: &WindowSample) {
        if other.timestamp > self.timestamp {
            *self = other.clone();
        }
    }
}

#[cfg(test)]
#[path = "window_tests.rs"]
mod tests;
