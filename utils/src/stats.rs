//! Run counters for the end-of-run summary.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

pub const VOTERS: &str = "voters";
pub const ADDRESSES_FOUND: &str = "addresses_found";
pub const ADDRESSES_NOT_FOUND: &str = "addresses_not_found";
pub const ADDRESSES_FAILED: &str = "addresses_failed";
pub const BINDINGS_SKIPPED: &str = "bindings_skipped";
pub const DISCREPANCIES: &str = "discrepancies";
pub const INCOMPLETE: &str = "incomplete";
pub const OPTIONS_SKIPPED: &str = "options_skipped";

/// Every counter the audit run maintains, in summary order.
pub const RUN_COUNTERS: &[&str] = &[
    VOTERS,
    ADDRESSES_FOUND,
    ADDRESSES_NOT_FOUND,
    ADDRESSES_FAILED,
    BINDINGS_SKIPPED,
    DISCREPANCIES,
    INCOMPLETE,
    OPTIONS_SKIPPED,
];

/// A thread-safe counter collection. Unknown names are ignored.
pub struct StatsCounter {
    names: Vec<&'static str>,
    counters: BTreeMap<&'static str, AtomicU64>,
}

impl StatsCounter {
    pub fn new(names: &[&'static str]) -> Self {
        let counters = names.iter().map(|&name| (name, AtomicU64::new(0))).collect();
        Self {
            names: names.to_vec(),
            counters,
        }
    }

    /// Counters for an audit run.
    pub fn for_run() -> Self {
        Self::new(RUN_COUNTERS)
    }

    pub fn increment(&self, name: &str) {
        self.add(name, 1);
    }

    pub fn add(&self, name: &str, value: u64) {
        if let Some(counter) = self.counters.get(name) {
            counter.fetch_add(value, Ordering::Relaxed);
        }
    }

    pub fn get(&self, name: &str) -> u64 {
        self.counters
            .get(name)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// `name=value` pairs in registration order.
    pub fn summary(&self) -> String {
        self.names
            .iter()
            .map(|name| format!("{name}={}", self.get(name)))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for StatsCounter {
    fn default() -> Self {
        Self::for_run()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_known_names_only() {
        let stats = StatsCounter::for_run();
        stats.increment(VOTERS);
        stats.add(ADDRESSES_FOUND, 3);
        stats.increment("unknown");
        assert_eq!(stats.get(VOTERS), 1);
        assert_eq!(stats.get(ADDRESSES_FOUND), 3);
        assert_eq!(stats.get("unknown"), 0);
    }

    #[test]
    fn summary_keeps_registration_order() {
        let stats = StatsCounter::new(&[DISCREPANCIES, VOTERS]);
        stats.add(VOTERS, 2);
        assert_eq!(stats.summary(), "discrepancies=0 voters=2");
    }
}
