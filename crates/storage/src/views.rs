// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized view maintenance.
//!
//! One sorted index per standing view, fed incrementally from document
//! writes. Applying a document is idempotent: the previous emissions of that
//! document are dropped before its fresh projection is inserted, so replaying
//! a change feed (or the journal) any number of times converges to the same
//! index contents. A full rebuild from `all_docs` produces the identical
//! result, which is the recovery path when indexes are lost.

use smol_str::SmolStr;
use std::collections::HashMap;
use std::ops::RangeBounds;
use tally_core::{
    project, CombineError, Document, Grouping, Partial, View, ViewIndex, ViewKey,
};

/// All standing view indexes plus the per-document emission bookkeeping
/// that makes incremental apply idempotent.
#[derive(Debug, Default)]
pub struct MaterializedViews {
    indexes: HashMap<View, ViewIndex>,
    emissions: HashMap<SmolStr, Vec<(View, ViewKey)>>,
}

impl MaterializedViews {
    pub fn new() -> Self {
        let mut indexes = HashMap::with_capacity(View::ALL.len());
        for view in View::ALL {
            indexes.insert(view, ViewIndex::new());
        }
        Self {
            indexes,
            emissions: HashMap::new(),
        }
    }

    /// Project one document into every view it feeds, replacing whatever it
    /// emitted before.
    pub fn apply(&mut self, doc: &Document) {
        let source = SmolStr::new(doc.id.as_str());
        self.retract(&source);

        let emissions = project(doc);
        let mut recorded = Vec::with_capacity(emissions.len());
        for emission in emissions {
            self.indexes
                .entry(emission.view)
                .or_default()
                .insert(source.clone(), emission.key.clone(), emission.value);
            recorded.push((emission.view, emission.key));
        }
        tracing::debug!(entity = %source, rows = recorded.len(), "applied document to views");
        if !recorded.is_empty() {
            self.emissions.insert(source, recorded);
        }
    }

    /// Drop every row a deleted document contributed.
    pub fn remove(&mut self, id: &str) {
        self.retract(id);
    }

    /// Discard all indexes and re-project the given documents.
    pub fn rebuild<'a>(&mut self, docs: impl IntoIterator<Item = &'a Document>) {
        self.indexes.clear();
        for view in View::ALL {
            self.indexes.insert(view, ViewIndex::new());
        }
        self.emissions.clear();
        let mut count = 0usize;
        for doc in docs {
            self.apply(doc);
            count += 1;
        }
        tracing::info!(documents = count, "rebuilt materialized views");
    }

    /// Range query against one view.
    pub fn query(
        &self,
        view: View,
        range: impl RangeBounds<ViewKey>,
        grouping: Grouping,
    ) -> Result<Vec<(ViewKey, Partial)>, CombineError> {
        match self.indexes.get(&view) {
            Some(index) => index.query(range, grouping),
            None => Ok(Vec::new()),
        }
    }

    /// Number of distinct keys in one view.
    pub fn view_len(&self, view: View) -> usize {
        self.indexes.get(&view).map(ViewIndex::len).unwrap_or(0)
    }

    fn retract(&mut self, id: &str) {
        let Some(previous) = self.emissions.remove(id) else {
            return;
        };
        for (view, key) in previous {
            if let Some(index) = self.indexes.get_mut(&view) {
                index.remove(id, &key);
            }
        }
    }
}

#[cfg(test)]
#[path = "views_tests.rs"]
mod tests;
