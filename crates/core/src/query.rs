// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sorted view index and range queries with group-by-prefix roll-up.
//!
//! The index holds raw emissions sorted by composite key. A query is a range
//! scan with an optional group level: the caller names how many leading key
//! components to group by, and every group's rows are combined through the
//! aggregator. Output order is key order, which callers rely on for
//! "start after last key" pagination.

use crate::aggregate::{combine, CombineError, Partial, ViewKey};
use smol_str::SmolStr;
use std::collections::BTreeMap;
use std::ops::RangeBounds;

/// How a query reduces the rows it scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grouping {
    /// No reduction: raw rows in key order (transition-detail listings).
    Detail,
    /// Reduce the entire range to a single row (group_level = 0).
    All,
    /// Group rows by the first `n` key components and reduce each group.
    Level(usize),
}

/// Sorted multimap of raw emissions for one view.
///
/// Each entry remembers the source document so re-projection of an updated
/// document can first drop its previous rows (idempotent replay).
#[derive(Debug, Default, Clone)]
pub struct ViewIndex {
    rows: BTreeMap<ViewKey, Vec<(SmolStr, Partial)>>,
}

impl ViewIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert one raw emission for `source`.
    pub fn insert(&mut self, source: impl Into<SmolStr>, key: ViewKey, value: Partial) {
        self.rows.entry(key).or_default().push((source.into(), value));
    }

    /// Remove every row `source` emitted under `key`.
    pub fn remove(&mut self, source: &str, key: &ViewKey) {
        if let Some(entries) = self.rows.get_mut(key) {
            entries.retain(|(s, _)| s != source);
            if entries.is_empty() {
                self.rows.remove(key);
            }
        }
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Range scan with optional roll-up. Results are in key order; grouped
    /// results carry the group's key prefix.
    pub fn query(
        &self,
        range: impl RangeBounds<ViewKey>,
        grouping: Grouping,
    ) -> Result<Vec<(ViewKey, Partial)>, CombineError> {
        match grouping {
            Grouping::Detail => Ok(self
                .rows
                .range(range)
                .flat_map(|(key, entries)| {
                    entries
                        .iter()
                        .map(move |(_, value)| (key.clone(), value.clone()))
                })
                .collect()),
            Grouping::All => {
                let reduced = self.reduce_keys(range)?;
                if reduced.is_empty() {
                    return Ok(Vec::new());
                }
                let partials: Vec<Partial> = reduced.into_iter().map(|(_, p)| p).collect();
                Ok(vec![(ViewKey::default(), combine(&partials, true)?)])
            }
            Grouping::Level(level) => {
                let reduced = self.reduce_keys(range)?;
                let mut out: Vec<(ViewKey, Partial)> = Vec::new();
                let mut group: Vec<Partial> = Vec::new();
                let mut group_key: Option<ViewKey> = None;
                for (key, partial) in reduced {
                    let prefix = key.prefix(level);
                    match &group_key {
                        Some(current) if *current == prefix => group.push(partial),
                        Some(current) => {
                            out.push((current.clone(), combine(&group, true)?));
                            group = vec![partial];
                            group_key = Some(prefix);
                        }
                        None => {
                            group = vec![partial];
                            group_key = Some(prefix);
                        }
                    }
                }
                if let (Some(key), false) = (group_key, group.is_empty()) {
                    out.push((key, combine(&group, true)?));
                }
                Ok(out)
            }
        }
    }

    /// Reduce each exact key's raw rows (the reduce level below any
    /// group-prefix rereduce).
    fn reduce_keys(
        &self,
        range: impl RangeBounds<ViewKey>,
    ) -> Result<Vec<(ViewKey, Partial)>, CombineError> {
        self.rows
            .range(range)
            .map(|(key, entries)| {
                let raw: Vec<Partial> = entries.iter().map(|(_, v)| v.clone()).collect();
                Ok((key.clone(), combine(&raw, false)?))
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "query_tests.rs"]
mod tests;
