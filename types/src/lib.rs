//! Fundamental types for the DAO vote watchdog.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! addresses, capacity amounts, network identifiers, ballots, bindings and
//! reconciliation results.

pub mod address;
pub mod amount;
pub mod ballot;
pub mod binding;
pub mod error;
pub mod network;
pub mod outcome;

pub use address::CkbAddress;
pub use amount::{ReportedWeight, Shannons, SHANNONS_PER_CKB};
pub use ballot::{VoteOption, VoterBallot};
pub use binding::AddressBinding;
pub use error::TypesError;
pub use network::NetworkId;
pub use outcome::{LookupStatus, ReconciliationResult, Verdict, WeightBreakdown};
