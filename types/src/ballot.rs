//! Forum-side vote records.

use crate::amount::ReportedWeight;
use serde::{Deserialize, Serialize};

/// One option of a poll, as listed by the forum.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VoteOption {
    pub option_id: u64,
    /// Display label ("Yes", "No", ...).
    pub label: String,
    /// Number of voters the forum reports for this option.
    pub vote_count: u64,
    /// Sum of weights the forum reports for this option, when supplied.
    pub total_reported_weight: Option<ReportedWeight>,
}

/// A single voter's ballot for one option. Immutable once fetched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VoterBallot {
    /// Forum user id. Absent ids resolve to no bindings.
    pub user_id: Option<u64>,
    pub nickname: String,
    /// The weight the forum recorded for this vote.
    pub reported_weight: ReportedWeight,
    /// Vote time exactly as the forum formats it.
    pub vote_timestamp: String,
}
