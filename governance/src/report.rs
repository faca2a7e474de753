//! Per-option audit output.

use crate::error::AuditError;
use serde::Serialize;
use watchdog_types::{ReconciliationResult, ReportedWeight, Verdict, VoteOption};

/// Everything learned about one vote option.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OptionReport {
    pub option: VoteOption,
    /// One result per ballot, in forum listing order.
    pub results: Vec<ReconciliationResult>,
    /// The option total as the forum advertises it, if it does.
    pub reported_total_from_forum: Option<ReportedWeight>,
    /// Sum of every ballot's reported weight.
    pub reported_total_from_ballots: ReportedWeight,
}

impl OptionReport {
    pub fn count(&self, verdict: Verdict) -> usize {
        self.results.iter().filter(|r| r.verdict == verdict).count()
    }

    pub fn computed_total(&self) -> u64 {
        self.results
            .iter()
            .fold(0u64, |acc, r| acc.saturating_add(r.computed_weight))
    }
}

/// What happened to one option of a thread.
#[derive(Debug)]
pub enum OptionOutcome {
    Audited(OptionReport),
    /// The option was empty or its ballots could not be listed.
    Skipped { option: VoteOption, reason: AuditError },
}

impl OptionOutcome {
    pub fn option(&self) -> &VoteOption {
        match self {
            Self::Audited(report) => &report.option,
            Self::Skipped { option, .. } => option,
        }
    }

    pub fn report(&self) -> Option<&OptionReport> {
        match self {
            Self::Audited(report) => Some(report),
            Self::Skipped { .. } => None,
        }
    }
}
