//! Vote-weight reconciliation for Nervos DAO governance polls.
//!
//! Flow: vote option → ballots → per voter: profile bindings →
//! [`AddressResolver`] → addresses → [`DepositAggregator`] per address →
//! [`reconcile`] → [`ReconciliationResult`](watchdog_types::ReconciliationResult).
//!
//! Key principle: a voter's weight is the sum over its addresses of the
//! floored whole-CKB value of their Nervos DAO deposit cells. The forum's
//! recorded weight must equal it after flooring.

pub mod aggregator;
pub mod engine;
pub mod error;
pub mod report;
pub mod resolver;

pub use aggregator::{DepositAggregator, LiveCellPages, DEFAULT_MAX_PAGES, DEPOSIT_CELL_TYPE};
pub use engine::{reconcile, ReconciliationEngine};
pub use error::{AuditError, BindingError, LookupError};
pub use report::{OptionOutcome, OptionReport};
pub use resolver::{AddressResolver, Resolution};
