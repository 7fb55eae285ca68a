// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Revisioned document store.
//!
//! The store exposes primary-key get/put with optimistic concurrency: every
//! write names the revision it read, and a mismatch surfaces as a conflict
//! for the caller to retry. Per-entity read-validate-append sequences rely
//! on this single-document compare-and-swap for their atomicity.

use crate::journal::JournalError;
use parking_lot::RwLock;
use std::collections::HashMap;
use tally_core::{Document, DocumentError, EntityId};
use thiserror::Error;

/// Monotonic per-document revision. Revision 0 means "does not exist yet"
/// and is the expected revision for a create.
pub type Revision = u64;

/// Store operation failures. All recoverable by the caller; none unwind
/// across entity boundaries.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("entity not found: {0}")]
    NotFound(EntityId),
    #[error("revision conflict for {0}")]
    Conflict(EntityId),
    #[error("entity {id} is a {found} document, expected {expected}")]
    WrongKind {
        id: EntityId,
        expected: &'static str,
        found: &'static str,
    },
    #[error("malformed document: {0}")]
    Malformed(#[from] DocumentError),
    #[error("journal error: {0}")]
    Journal(#[from] JournalError),
}

/// Primary-key document storage with revision-checked writes.
pub trait DocumentStore {
    fn get(&self, id: &EntityId) -> Result<(Revision, Document), StoreError>;

    /// Write `doc` expecting the given current revision (0 for create).
    /// Returns the new revision, or `Conflict` when another writer got
    /// there first.
    fn put(&self, id: &EntityId, expected: Revision, doc: Document)
        -> Result<Revision, StoreError>;

    fn delete(&self, id: &EntityId, expected: Revision) -> Result<(), StoreError>;

    /// Every stored document, in unspecified order. Used for full view
    /// rebuilds; aggregates are always recomputable from the documents.
    fn all_docs(&self) -> Vec<Document>;
}

/// In-memory document store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: RwLock<HashMap<EntityId, (Revision, Document)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.docs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.read().is_empty()
    }
}

impl DocumentStore for MemoryStore {
    fn get(&self, id: &EntityId) -> Result<(Revision, Document), StoreError> {
        self.docs
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    fn put(
        &self,
        id: &EntityId,
        expected: Revision,
        doc: Document,
    ) -> Result<Revision, StoreError> {
        doc.validate()?;
        let mut docs = self.docs.write();
        let current = docs.get(id).map(|(rev, _)| *rev).unwrap_or(0);
        if current != expected {
            return Err(StoreError::Conflict(id.clone()));
        }
        let next = current + 1;
        docs.insert(id.clone(), (next, doc));
        Ok(next)
    }

    fn delete(&self, id: &EntityId, expected: Revision) -> Result<(), StoreError> {
        let mut docs = self.docs.write();
        match docs.get(id) {
            None => Err(StoreError::NotFound(id.clone())),
            Some((rev, _)) if *rev != expected => Err(StoreError::Conflict(id.clone())),
            Some(_) => {
                docs.remove(id);
                Ok(())
            }
        }
    }

    fn all_docs(&self) -> Vec<Document> {
        self.docs.read().values().map(|(_, d)| d.clone()).collect()
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
