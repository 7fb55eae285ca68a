// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only journal of accepted transitions.
//!
//! One JSON record per line: a header first, then sequenced entries. The
//! journal is the durable source of truth for transition history — view
//! aggregates are derived and recomputable, a lost journal entry is not.
//!
//! Replay tolerates a torn trailing line (crash mid-write): it stops at the
//! first undecodable line, warns, and keeps the prefix.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tally_core::{EntityId, Transition};
use thiserror::Error;

/// Current journal format version.
pub const JOURNAL_VERSION: u32 = 1;

/// Errors from journal operations.
#[derive(Debug, Error)]
pub enum JournalError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported journal version {0}")]
    UnsupportedVersion(u32),
    #[error("missing journal header in {0}")]
    MissingHeader(PathBuf),
}

/// First line of every journal file.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct JournalHeader {
    #[serde(rename = "v")]
    version: u32,
    created_at: DateTime<Utc>,
}

/// One accepted transition, in wire form (state names as strings so one
/// journal serves every entity kind).
///
/// `recorded_at_ms` is the store's receive stamp — distinct from the
/// caller-supplied event `timestamp`, and kept to diagnose out-of-order
/// delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub seq: u64,
    pub entity: EntityId,
    pub transition: Transition<SmolStr>,
    pub recorded_at_ms: u64,
}

/// Append-only transition journal backed by a JSONL file.
#[derive(Debug)]
pub struct Journal {
    path: PathBuf,
    writer: BufWriter<File>,
    next_seq: u64,
}

impl Journal {
    /// Open (or create) a journal file. Existing entries determine the next
    /// sequence number; a torn trailing line is truncated so new appends
    /// start on a clean boundary.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, JournalError> {
        let path = path.as_ref().to_path_buf();
        let existing = path.exists();
        let mut next_seq = 1;
        if existing {
            let (entries, valid_len) = scan(&path)?;
            next_seq = entries.last().map(|e| e.seq + 1).unwrap_or(1);
            let file_len = std::fs::metadata(&path)?.len();
            if file_len > valid_len {
                tracing::warn!(
                    path = %path.display(),
                    discarded = file_len - valid_len,
                    "truncating torn journal tail"
                );
                OpenOptions::new().write(true).open(&path)?.set_len(valid_len)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut writer = BufWriter::new(file);
        if !existing {
            let header = JournalHeader {
                version: JOURNAL_VERSION,
                created_at: Utc::now(),
            };
            serde_json::to_writer(&mut writer, &header)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }

        Ok(Self {
            path,
            writer,
            next_seq,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sequence number the next append will get.
    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }

    /// Append one accepted transition. Returns its sequence number.
    pub fn append(
        &mut self,
        entity: &EntityId,
        transition: Transition<SmolStr>,
        recorded_at_ms: u64,
    ) -> Result<u64, JournalError> {
        let entry = JournalEntry {
            seq: self.next_seq,
            entity: entity.clone(),
            transition,
            recorded_at_ms,
        };
        serde_json::to_writer(&mut self.writer, &entry)?;
        self.writer.write_all(b"\n")?;
        self.next_seq += 1;
        Ok(entry.seq)
    }

    /// Flush buffered entries to the file.
    pub fn flush(&mut self) -> Result<(), JournalError> {
        self.writer.flush()?;
        Ok(())
    }

    /// Re-read every entry from disk.
    pub fn replay(&self) -> Result<Vec<JournalEntry>, JournalError> {
        replay(&self.path)
    }
}

/// Read all entries from a journal file, stopping with a warning at the
/// first undecodable line.
pub fn replay(path: impl AsRef<Path>) -> Result<Vec<JournalEntry>, JournalError> {
    scan(path.as_ref()).map(|(entries, _)| entries)
}

/// Walk the file line by line, returning the decoded entries and the byte
/// length of the valid prefix (header plus intact entry lines).
fn scan(path: &Path) -> Result<(Vec<JournalEntry>, u64), JournalError> {
    let file = File::open(path)?;
    let mut lines = BufReader::new(file).lines();

    let header_line = match lines.next() {
        Some(line) => line?,
        None => return Err(JournalError::MissingHeader(path.to_path_buf())),
    };
    let header: JournalHeader = serde_json::from_str(&header_line)
        .map_err(|_| JournalError::MissingHeader(path.to_path_buf()))?;
    if header.version > JOURNAL_VERSION {
        return Err(JournalError::UnsupportedVersion(header.version));
    }
    let mut valid_len = header_line.len() as u64 + 1;

    let mut entries = Vec::new();
    for (lineno, line) in lines.enumerate() {
        let line = line?;
        match serde_json::from_str::<JournalEntry>(&line) {
            Ok(entry) => {
                valid_len += line.len() as u64 + 1;
                entries.push(entry);
            }
            Err(error) => {
                // Torn tail from a crash mid-write; keep the good prefix.
                tracing::warn!(
                    path = %path.display(),
                    line = lineno + 2,
                    %error,
                    "journal replay stopped at undecodable line"
                );
                break;
            }
        }
    }
    Ok((entries, valid_len))
}

#[cfg(test)]
#[path = "journal_tests.rs"]
mod tests;
