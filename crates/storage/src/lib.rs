// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tally-storage: revisioned document storage, transition intake, the
//! accepted-transition journal, and materialized view maintenance.

pub mod journal;
pub mod store;
pub mod transitions;
pub mod views;

pub use journal::{replay, Journal, JournalEntry, JournalError, JOURNAL_VERSION};
pub use store::{DocumentStore, MemoryStore, Revision, StoreError};
pub use transitions::{JobValidation, TransitionRequest, TransitionStore};
pub use views::MaterializedViews;
