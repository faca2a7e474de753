//! Per-address and per-voter reconciliation outcomes.

use crate::address::CkbAddress;
use crate::amount::ReportedWeight;
use serde::{Deserialize, Serialize};

/// How the explorer lookup for one address ended.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum LookupStatus {
    /// The explorer knows the address; its weight is authoritative.
    Found,
    /// The explorer answered 404. Contributes zero.
    NotFound,
    /// The lookup could not be completed (retries exhausted, bad payload).
    /// Contributes zero, but the weight is not authoritative.
    Failed(String),
}

impl LookupStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Found => "found",
            Self::NotFound => "not_found",
            Self::Failed(_) => "failed",
        }
    }
}

/// Weight attributed to one resolved address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightBreakdown {
    pub address: CkbAddress,
    /// Whole CKB in deposit cells, floored.
    pub computed_weight: u64,
    /// Number of deposit cells that contributed.
    pub deposit_cells: usize,
    pub status: LookupStatus,
}

impl WeightBreakdown {
    pub fn found(address: CkbAddress, computed_weight: u64, deposit_cells: usize) -> Self {
        Self {
            address,
            computed_weight,
            deposit_cells,
            status: LookupStatus::Found,
        }
    }

    pub fn not_found(address: CkbAddress) -> Self {
        Self {
            address,
            computed_weight: 0,
            deposit_cells: 0,
            status: LookupStatus::NotFound,
        }
    }

    pub fn failed(address: CkbAddress, reason: impl Into<String>) -> Self {
        Self {
            address,
            computed_weight: 0,
            deposit_cells: 0,
            status: LookupStatus::Failed(reason.into()),
        }
    }

    /// Whether the explorer knew this address.
    pub fn is_found(&self) -> bool {
        matches!(self.status, LookupStatus::Found)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, LookupStatus::Failed(_))
    }
}

/// Classification of a reconciliation result for operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Floored weights agree and every lookup succeeded.
    Match,
    /// Floored weights disagree and every lookup succeeded.
    Discrepancy,
    /// At least one lookup failed upstream, so neither agreement nor a
    /// mismatch is confirmed.
    Incomplete,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Match => "match",
            Self::Discrepancy => "discrepancy",
            Self::Incomplete => "incomplete",
        }
    }
}

/// The audit record for one voter on one option.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    pub user_id: Option<u64>,
    pub nickname: String,
    pub reported_weight: ReportedWeight,
    /// Sum of `breakdown[*].computed_weight`.
    pub computed_weight: u64,
    pub breakdown: Vec<WeightBreakdown>,
    /// `floor(reported_weight) != computed_weight`.
    pub need_review: bool,
    /// The profile lookup itself failed, so bindings may be missing.
    pub profile_failed: bool,
    pub verdict: Verdict,
}

impl ReconciliationResult {
    /// Whether any upstream lookup for this voter failed.
    pub fn has_lookup_failure(&self) -> bool {
        self.profile_failed || self.breakdown.iter().any(WeightBreakdown::is_failed)
    }
}
