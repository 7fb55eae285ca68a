// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Map/reduce-style aggregation over documents.
//!
//! [`project`] is the map side: pure and stateless, it derives zero or more
//! keyed emissions from one document. [`combine`] is the reduce side: it
//! merges partial aggregates sharing a key, and must stay associative and
//! commutative for all additive counters so that sharded partial sums can be
//! recombined in any order and at any fan-in. The designed exceptions are
//! latest-wins and first-wins fields (see [`crate::summary`]).

use crate::document::{DocKind, Document, JobError, OutputFile, Severity};
use crate::summary::{ClipboardSummary, ErrorSummary, OutputSummary, RequestSummary, StateSummary};
use crate::window::{bucket_index, WindowSample, HOUR_SECS};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::cmp::Ordering;
use thiserror::Error;

/// One component of a composite view key.
///
/// Ordering follows document-store collation: numbers sort before strings,
/// numbers compare numerically, strings lexically. Range pagination
/// ("start after last key") depends on this order being exact.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyPart {
    Num(f64),
    Str(SmolStr),
}

impl PartialEq for KeyPart {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for KeyPart {}

impl PartialOrd for KeyPart {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for KeyPart {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (KeyPart::Num(a), KeyPart::Num(b)) => a.total_cmp(b),
            (KeyPart::Str(a), KeyPart::Str(b)) => a.cmp(b),
            (KeyPart::Num(_), KeyPart::Str(_)) => Ordering::Less,
            (KeyPart::Str(_), KeyPart::Num(_)) => Ordering::Greater,
        }
    }
}

impl From<u64> for KeyPart {
    fn from(n: u64) -> Self {
        KeyPart::Num(n as f64)
    }
}

impl From<f64> for KeyPart {
    fn from(n: f64) -> Self {
        KeyPart::Num(n)
    }
}

impl From<&str> for KeyPart {
    fn from(s: &str) -> Self {
        KeyPart::Str(s.into())
    }
}

impl From<String> for KeyPart {
    fn from(s: String) -> Self {
        KeyPart::Str(s.into())
    }
}

impl From<SmolStr> for KeyPart {
    fn from(s: SmolStr) -> Self {
        KeyPart::Str(s)
    }
}

impl std::fmt::Display for KeyPart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyPart::Num(n) => write!(f, "{n}"),
            KeyPart::Str(s) => f.write_str(s),
        }
    }
}

/// Composite view key: a tuple of dimension values compared lexicographically
/// component by component.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewKey(pub Vec<KeyPart>);

impl ViewKey {
    pub fn new(parts: Vec<KeyPart>) -> Self {
        Self(parts)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The first `n` components (all of them if the key is shorter).
    pub fn prefix(&self, n: usize) -> ViewKey {
        ViewKey(self.0.iter().take(n).cloned().collect())
    }

    pub fn starts_with(&self, prefix: &ViewKey) -> bool {
        self.0.len() >= prefix.0.len() && self.0[..prefix.0.len()] == prefix.0[..]
    }
}

impl<T: Into<KeyPart>, const N: usize> From<[T; N]> for ViewKey {
    fn from(parts: [T; N]) -> Self {
        ViewKey(parts.into_iter().map(Into::into).collect())
    }
}

impl std::fmt::Display for ViewKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for (i, part) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{part}")?;
        }
        write!(f, "]")
    }
}

/// The standing views fed by [`project`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    /// `[site, bucket_path]` → job counts.
    JobsBySite,
    /// `[workflow, task, jobid, timestamp]` → job counts (detail + rollup).
    JobsByWorkflow,
    /// `[hour_bucket, site, state]` → latest transition sample per cell.
    SiteHourly,
    /// `[workflow, step]` → error roll-up.
    ErrorsByStep,
    /// `[workflow, dataset]` → output size/event sums.
    OutputsByDataset,
    /// `[agent_url, thread]` → latest log line.
    LatestLogs,
    /// `[campaign]` → request counts by lifecycle state.
    RequestsByCampaign,
    /// `[clipboard_state]` → clipboard item counts.
    ClipboardByState,
}

crate::simple_display! {
    View {
        JobsBySite => "jobs_by_site",
        JobsByWorkflow => "jobs_by_workflow",
        SiteHourly => "site_hourly",
        ErrorsByStep => "errors_by_step",
        OutputsByDataset => "outputs_by_dataset",
        LatestLogs => "latest_logs",
        RequestsByCampaign => "requests_by_campaign",
        ClipboardByState => "clipboard_by_state",
    }
}

impl View {
    pub const ALL: [View; 8] = [
        View::JobsBySite,
        View::JobsByWorkflow,
        View::SiteHourly,
        View::ErrorsByStep,
        View::OutputsByDataset,
        View::LatestLogs,
        View::RequestsByCampaign,
        View::ClipboardByState,
    ];
}

/// The latest log line for one (agent, thread) cell; merged latest-wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSample {
    pub severity: Severity,
    pub message: String,
    pub timestamp: u64,
}

impl LogSample {
    /// Latest-wins; ties keep the incumbent.
    pub fn keep_newer(&mut self, other: &LogSample) {
        if other.timestamp > self.timestamp {
            *self = other.clone();
        }
    }
}

/// A partial aggregate: either one raw emission or a previously-combined
/// reduction. Raw rows and reductions are distinct variants where the merge
/// semantics differ between the two levels (`count` is +1 per raw row,
/// += sub-count per reduction).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Partial {
    /// Job counts; raw emissions carry a single-job summary.
    Jobs(StateSummary),
    /// One raw error row.
    Error(JobError),
    /// Reduced error roll-up.
    Errors(ErrorSummary),
    /// One raw output-file row.
    Output(OutputFile),
    /// Reduced output roll-up.
    Outputs(OutputSummary),
    /// Log line; merged latest-wins at both levels.
    Log(LogSample),
    /// Request counts by state.
    Requests(RequestSummary),
    /// Clipboard item counts by state.
    Clipboard(ClipboardSummary),
    /// Hourly window cell; merged last-write-wins at both levels.
    Window(WindowSample),
}

impl Partial {
    /// Aggregation family; partials only combine within one family.
    pub fn family(&self) -> &'static str {
        match self {
            Partial::Jobs(_) => "jobs",
            Partial::Error(_) | Partial::Errors(_) => "errors",
            Partial::Output(_) | Partial::Outputs(_) => "outputs",
            Partial::Log(_) => "logs",
            Partial::Requests(_) => "requests",
            Partial::Clipboard(_) => "clipboard",
            Partial::Window(_) => "windows",
        }
    }
}

/// One keyed emission from [`project`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Emission {
    pub view: View,
    pub key: ViewKey,
    pub value: Partial,
}

impl Emission {
    fn new(view: View, key: impl Into<ViewKey>, value: Partial) -> Self {
        Self {
            view,
            key: key.into(),
            value,
        }
    }
}

const UNKNOWN_SITE: &str = "unknown";

/// Derive all view emissions for one document.
///
/// Pure and stateless; one emission per repeated sub-structure (per step
/// error, per output file, per transition) is legal and expected.
pub fn project(doc: &Document) -> Vec<Emission> {
    let mut emissions = Vec::new();
    match &doc.kind {
        DocKind::Job(job) => {
            let effective = job.transitions.effective_state_with(job.site.is_some());
            let site: SmolStr = job
                .transitions
                .last_known_location()
                .cloned()
                .or_else(|| job.site.clone())
                .unwrap_or_else(|| UNKNOWN_SITE.into());
            let summary = StateSummary::of(effective);

            emissions.push(Emission::new(
                View::JobsBySite,
                [
                    KeyPart::from(site.clone()),
                    KeyPart::from(effective.bucket_path()),
                ],
                Partial::Jobs(summary),
            ));

            let last_ts = job.transitions.last().map(|t| t.timestamp).unwrap_or(0);
            emissions.push(Emission::new(
                View::JobsByWorkflow,
                ViewKey(vec![
                    job.workflow.clone().into(),
                    job.task.clone().into(),
                    job.jobid.into(),
                    last_ts.into(),
                ]),
                Partial::Jobs(summary),
            ));

            for transition in job.transitions.iter() {
                let cell_site = transition
                    .location
                    .clone()
                    .unwrap_or_else(|| site.clone());
                emissions.push(Emission::new(
                    View::SiteHourly,
                    ViewKey(vec![
                        bucket_index(transition.timestamp, HOUR_SECS).into(),
                        cell_site.into(),
                        transition.new_state.to_string().into(),
                    ]),
                    Partial::Window(WindowSample::new(
                        doc.id.as_str(),
                        transition.timestamp,
                    )),
                ));
            }

            for error in &job.errors {
                emissions.push(Emission::new(
                    View::ErrorsByStep,
                    [
                        KeyPart::from(job.workflow.clone()),
                        KeyPart::from(error.step.clone()),
                    ],
                    Partial::Error(error.clone()),
                ));
            }
            for file in &job.output {
                emissions.push(Emission::new(
                    View::OutputsByDataset,
                    [
                        KeyPart::from(job.workflow.clone()),
                        KeyPart::from(file.dataset.clone()),
                    ],
                    Partial::Output(file.clone()),
                ));
            }
        }
        DocKind::Request(request) => {
            emissions.push(Emission::new(
                View::RequestsByCampaign,
                [KeyPart::from(request.campaign.clone())],
                Partial::Requests(RequestSummary::of(request.transitions.current_state())),
            ));
        }
        DocKind::Fwjr(fwjr) => {
            for error in &fwjr.errors {
                emissions.push(Emission::new(
                    View::ErrorsByStep,
                    [
                        KeyPart::from(fwjr.workflow.clone()),
                        KeyPart::from(error.step.clone()),
                    ],
                    Partial::Error(error.clone()),
                ));
            }
            for file in &fwjr.output {
                emissions.push(Emission::new(
                    View::OutputsByDataset,
                    [
                        KeyPart::from(fwjr.workflow.clone()),
                        KeyPart::from(file.dataset.clone()),
                    ],
                    Partial::Output(file.clone()),
                ));
            }
        }
        DocKind::LogEntry(log) => {
            emissions.push(Emission::new(
                View::LatestLogs,
                [
                    KeyPart::from(log.agent_url.clone()),
                    KeyPart::from(log.thread.clone()),
                ],
                Partial::Log(LogSample {
                    severity: log.severity,
                    message: log.message.clone(),
                    timestamp: log.timestamp,
                }),
            ));
        }
        DocKind::Clipboard(item) => {
            emissions.push(Emission::new(
                View::ClipboardByState,
                [KeyPart::from(item.state.to_string())],
                Partial::Clipboard(ClipboardSummary::of(item.state)),
            ));
        }
    }
    emissions
}

/// Combining an empty partial list; nothing to produce.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CombineError {
    #[error("no partials to combine")]
    Empty,
}

/// Merge partial aggregates sharing a key.
///
/// `rereduce = false` combines raw per-document emissions; `rereduce = true`
/// combines previously-combined partials. The distinction carries the count
/// semantics (+1 per raw row vs += sub-count) and is checked against the
/// variant actually received.
///
/// Partials from a different family than the first are a programming-contract
/// violation: fatal in debug builds, skipped with a warning in release so one
/// entity's bad data cannot abort aggregation of the rest.
pub fn combine(parts: &[Partial], rereduce: bool) -> Result<Partial, CombineError> {
    let mut iter = parts.iter();
    let first = iter.next().ok_or(CombineError::Empty)?;
    let mut acc = Accumulator::seed(first, rereduce);
    for part in iter {
        let absorbed = acc.absorb(part, rereduce);
        debug_assert!(
            absorbed,
            "cannot combine {} partial into {} aggregate",
            part.family(),
            acc.family()
        );
        if !absorbed {
            tracing::warn!(
                expected = acc.family(),
                found = part.family(),
                "skipping incompatible partial in combine"
            );
        }
    }
    Ok(acc.finish())
}

enum Accumulator {
    Jobs(StateSummary),
    Errors(ErrorSummary),
    Outputs(OutputSummary),
    Log(LogSample),
    Requests(RequestSummary),
    Clipboard(ClipboardSummary),
    Window(WindowSample),
}

impl Accumulator {
    fn seed(first: &Partial, rereduce: bool) -> Self {
        match first {
            Partial::Jobs(s) => Accumulator::Jobs(*s),
            Partial::Error(row) => {
                debug_assert!(!rereduce, "raw error row in rereduce");
                let mut summary = ErrorSummary::default();
                summary.absorb_row(row.kind, row.timestamp, &row.message);
                Accumulator::Errors(summary)
            }
            Partial::Errors(s) => Accumulator::Errors(s.clone()),
            Partial::Output(file) => {
                debug_assert!(!rereduce, "raw output row in rereduce");
                let mut summary = OutputSummary::default();
                summary.absorb_row(&file.dataset, file.size, file.events);
                Accumulator::Outputs(summary)
            }
            Partial::Outputs(s) => Accumulator::Outputs(s.clone()),
            Partial::Log(sample) => Accumulator::Log(sample.clone()),
            Partial::Requests(s) => Accumulator::Requests(s.clone()),
            Partial::Clipboard(s) => Accumulator::Clipboard(s.clone()),
            Partial::Window(sample) => Accumulator::Window(sample.clone()),
        }
    }

    /// Fold one partial in. Returns false when the partial belongs to a
    /// different family and was not absorbed.
    fn absorb(&mut self, part: &Partial, rereduce: bool) -> bool {
        match (self, part) {
            (Accumulator::Jobs(acc), Partial::Jobs(s)) => acc.merge(s),
            (Accumulator::Errors(acc), Partial::Error(row)) => {
                debug_assert!(!rereduce, "raw error row in rereduce");
                acc.absorb_row(row.kind, row.timestamp, &row.message);
            }
            (Accumulator::Errors(acc), Partial::Errors(s)) => acc.absorb(s),
            (Accumulator::Outputs(acc), Partial::Output(file)) => {
                debug_assert!(!rereduce, "raw output row in rereduce");
                acc.absorb_row(&file.dataset, file.size, file.events);
            }
            (Accumulator::Outputs(acc), Partial::Outputs(s)) => acc.absorb(s),
            (Accumulator::Log(acc), Partial::Log(sample)) => acc.keep_newer(sample),
            (Accumulator::Requests(acc), Partial::Requests(s)) => acc.merge(s),
            (Accumulator::Clipboard(acc), Partial::Clipboard(s)) => acc.merge(s),
            (Accumulator::Window(acc), Partial::Window(sample)) => acc.keep_newer(sample),
            _ => return false,
        }
        true
    }

    fn family(&self) -> &'static str {
        match self {
            Accumulator::Jobs(_) => "jobs",
            Accumulator::Errors(_) => "errors",
            Accumulator::Outputs(_) => "outputs",
            Accumulator::Log(_) => "logs",
            Accumulator::Requests(_) => "requests",
            Accumulator::Clipboard(_) => "clipboard",
            Accumulator::Window(_) => "windows",
        }
    }

    fn finish(self) -> Partial {
        match self {
            Accumulator::Jobs(s) => Partial::Jobs(s),
            Accumulator::Errors(s) => Partial::Errors(s),
            Accumulator::Outputs(s) => Partial::Outputs(s),
            Accumulator::Log(s) => Partial::Log(s),
            Accumulator::Requests(s) => Partial::Requests(s),
            Accumulator::Clipboard(s) => Partial::Clipboard(s),
            Accumulator::Window(s) => Partial::Window(s),
        }
    }
}

#[cfg(test)]
#[path = "aggregate_tests.rs"]
mod tests;
