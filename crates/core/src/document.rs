// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Document types for tracked entities.
//!
//! A closed sum over the entity kinds the tracker knows about, serialized
//! with a `type` tag. Required fields are validated once at the store
//! boundary; everything past that point can rely on the shapes here instead
//! of re-checking optional fields.

use crate::id::EntityId;
use crate::state::{ClipboardState, FailureKind, JobState, RequestState};
use crate::transition::TransitionLog;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use thiserror::Error;

/// Current document schema version.
pub const CURRENT_SCHEMA: u32 = 1;

fn default_schema() -> u32 {
    CURRENT_SCHEMA
}

/// A stored document: stable external id plus kind-specific payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "schema", default = "default_schema")]
    pub schema: u32,
    #[serde(rename = "_id")]
    pub id: EntityId,
    #[serde(flatten)]
    pub kind: DocKind,
}

/// Kind-specific document payload, dispatched on the wire `type` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DocKind {
    Job(JobDoc),
    Request(RequestDoc),
    Fwjr(FwjrDoc),
    LogEntry(LogDoc),
    Clipboard(ClipboardDoc),
}

impl DocKind {
    /// Short kind name, used in logs and error reports.
    pub fn name(&self) -> &'static str {
        match self {
            DocKind::Job(_) => "job",
            DocKind::Request(_) => "request",
            DocKind::Fwjr(_) => "fwjr",
            DocKind::LogEntry(_) => "log_entry",
            DocKind::Clipboard(_) => "clipboard",
        }
    }
}

impl Document {
    pub fn new(id: impl Into<EntityId>, kind: DocKind) -> Self {
        Self {
            schema: CURRENT_SCHEMA,
            id: id.into(),
            kind,
        }
    }

    /// Boundary validation: required fields present, schema supported.
    /// Runs once when a document enters the store.
    pub fn validate(&self) -> Result<(), DocumentError> {
        if self.schema == 0 || self.schema > CURRENT_SCHEMA {
            return Err(DocumentError::UnsupportedSchema(self.schema));
        }
        if self.id.is_empty() {
            return Err(DocumentError::MissingField("_id"));
        }
        match &self.kind {
            DocKind::Job(job) => {
                if job.workflow.is_empty() {
                    return Err(DocumentError::MissingField("workflow"));
                }
                if job.task.is_empty() {
                    return Err(DocumentError::MissingField("task"));
                }
            }
            DocKind::Request(request) => {
                if request.campaign.is_empty() {
                    return Err(DocumentError::MissingField("campaign"));
                }
            }
            DocKind::Fwjr(fwjr) => {
                if fwjr.workflow.is_empty() {
                    return Err(DocumentError::MissingField("workflow"));
                }
            }
            DocKind::LogEntry(log) => {
                if log.agent_url.is_empty() {
                    return Err(DocumentError::MissingField("agent_url"));
                }
                if log.thread.is_empty() {
                    return Err(DocumentError::MissingField("thread"));
                }
            }
            DocKind::Clipboard(item) => {
                if item.request.is_empty() {
                    return Err(DocumentError::MissingField("request"));
                }
            }
        }
        Ok(())
    }
}

/// Malformed document: rejected at the store boundary, never applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error("missing required field {0}")]
    MissingField(&'static str),
    #[error("unsupported schema version {0}")]
    UnsupportedSchema(u32),
}

/// Per-job tracking document: identity, transition log, per-step errors,
/// and produced output files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDoc {
    pub workflow: SmolStr,
    pub task: SmolStr,
    pub jobid: u64,
    /// Site the job is currently assigned to, if any. Per-site attribution
    /// for finished jobs uses the transition log's last known location, not
    /// this field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<SmolStr>,
    #[serde(default)]
    pub transitions: TransitionLog<JobState>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<JobError>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output: Vec<OutputFile>,
}

crate::builder! {
    pub struct JobDocBuilder => JobDoc {
        into {
            workflow: SmolStr = "wf-test",
            task: SmolStr = "wf-test/Processing",
        }
        set {
            jobid: u64 = 1,
            transitions: TransitionLog<JobState> = TransitionLog::new(),
            errors: Vec<JobError> = Vec::new(),
            output: Vec<OutputFile> = Vec::new(),
        }
        option {
            site: SmolStr = None,
        }
    }
}

/// One recorded job failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobError {
    pub step: SmolStr,
    pub kind: FailureKind,
    pub exit_code: i64,
    pub message: String,
    pub timestamp: u64,
}

/// One produced output file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputFile {
    pub lfn: SmolStr,
    pub dataset: SmolStr,
    pub size: u64,
    pub events: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<SmolStr>,
}

/// Request/workflow lifecycle document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestDoc {
    pub campaign: SmolStr,
    #[serde(default)]
    pub transitions: TransitionLog<RequestState>,
}

crate::builder! {
    pub struct RequestDocBuilder => RequestDoc {
        into {
            campaign: SmolStr = "campaign-test",
        }
        set {
            transitions: TransitionLog<RequestState> = TransitionLog::new(),
        }
    }
}

/// Framework job report: the structured execution result uploaded after a
/// job attempt finishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FwjrDoc {
    pub workflow: SmolStr,
    pub task: SmolStr,
    pub jobid: u64,
    #[serde(default)]
    pub retry: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<SmolStr>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<JobError>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output: Vec<OutputFile>,
    pub timestamp: u64,
}

/// Severity of an agent log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

crate::simple_display! {
    Severity {
        Info => "info",
        Warning => "warning",
        Error => "error",
    }
}

/// One agent component log line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogDoc {
    pub agent_url: SmolStr,
    pub thread: SmolStr,
    pub severity: Severity,
    pub message: String,
    pub timestamp: u64,
}

/// Operations-clipboard item tracking a request through manual intervention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipboardDoc {
    pub request: SmolStr,
    pub state: ClipboardState,
    #[serde(default)]
    pub description: String,
    pub updated_at: u64,
}

#[cfg(test)]
#[path = "document_tests.rs"]
mod tests;
