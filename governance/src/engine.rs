//! Reconciliation engine: checks forum vote weights against on-chain deposits.
//!
//! Per voter: profile bindings → addresses → deposit weight per address →
//! compare with the weight the forum recorded. Everything runs sequentially
//! and failures are contained: a failed address never stops its voter, a
//! failed voter never stops its option, a failed option never stops its thread.

use crate::aggregator::DepositAggregator;
use crate::error::AuditError;
use crate::report::{OptionOutcome, OptionReport};
use crate::resolver::AddressResolver;
use tracing::{info, warn};
use watchdog_client::{ForumApi, HttpTransport};
use watchdog_types::{
    LookupStatus, ReconciliationResult, ReportedWeight, Verdict, VoteOption, VoterBallot, WeightBreakdown,
};
use watchdog_utils::stats::{self, StatsCounter};

/// Relative tolerance when comparing float totals from the forum.
const TOTAL_TOLERANCE: f64 = 1e-6;

/// Build the audit record for one voter from its per-address breakdown.
///
/// `computed_weight` is the sum of the per-address floored weights;
/// `need_review` is set when it differs from the floored reported weight.
/// Any failed lookup makes the verdict `Incomplete`, even when the weights agree.
pub fn reconcile(ballot: &VoterBallot, breakdown: Vec<WeightBreakdown>, profile_failed: bool) -> ReconciliationResult {
    let computed_weight = breakdown
        .iter()
        .fold(0u64, |acc, b| acc.saturating_add(b.computed_weight));
    let need_review = ballot.reported_weight.floored() != i128::from(computed_weight);
    let lookup_failed = profile_failed || breakdown.iter().any(WeightBreakdown::is_failed);
    let verdict = match (need_review, lookup_failed) {
        (_, true) => Verdict::Incomplete,
        (false, false) => Verdict::Match,
        (true, false) => Verdict::Discrepancy,
    };

    ReconciliationResult {
        user_id: ballot.user_id,
        nickname: ballot.nickname.clone(),
        reported_weight: ballot.reported_weight,
        computed_weight,
        breakdown,
        need_review,
        profile_failed,
        verdict,
    }
}

fn totals_differ(a: f64, b: f64) -> bool {
    (a - b).abs() > TOTAL_TOLERANCE * a.abs().max(b.abs()).max(1.0)
}

pub struct ReconciliationEngine<T> {
    forum: ForumApi<T>,
    resolver: AddressResolver,
    aggregator: DepositAggregator<T>,
    stats: StatsCounter,
}

impl<T: HttpTransport> ReconciliationEngine<T> {
    pub fn new(forum: ForumApi<T>, resolver: AddressResolver, aggregator: DepositAggregator<T>) -> Self {
        Self {
            forum,
            resolver,
            aggregator,
            stats: StatsCounter::for_run(),
        }
    }

    /// Counters accumulated over every audit run through this engine.
    pub fn stats(&self) -> &StatsCounter {
        &self.stats
    }

    /// Audit one ballot: look up the voter's bindings and weigh every address.
    pub async fn audit_voter(&self, ballot: &VoterBallot) -> ReconciliationResult {
        let (bindings, profile_failed) = match ballot.user_id {
            None => (Vec::new(), false),
            Some(user_id) => match self.forum.profile_bindings(user_id).await {
                Ok(bindings) => (bindings, false),
                Err(e) => {
                    warn!(user_id, error = %e, "profile lookup failed");
                    (Vec::new(), true)
                }
            },
        };

        let resolution = self.resolver.resolve_counted(&bindings);
        self.stats.add(stats::BINDINGS_SKIPPED, resolution.skipped as u64);

        let mut breakdown = Vec::with_capacity(resolution.addresses.len());
        for address in &resolution.addresses {
            let entry = self.aggregator.aggregate(address).await;
            self.stats.increment(match entry.status {
                LookupStatus::Found => stats::ADDRESSES_FOUND,
                LookupStatus::NotFound => stats::ADDRESSES_NOT_FOUND,
                LookupStatus::Failed(_) => stats::ADDRESSES_FAILED,
            });
            breakdown.push(entry);
        }

        let result = reconcile(ballot, breakdown, profile_failed);
        self.stats.increment(stats::VOTERS);
        match result.verdict {
            Verdict::Match => {}
            Verdict::Discrepancy => self.stats.increment(stats::DISCREPANCIES),
            Verdict::Incomplete => self.stats.increment(stats::INCOMPLETE),
        }
        info!(
            user_id = ?result.user_id,
            nickname = %result.nickname,
            reported = %result.reported_weight,
            computed = result.computed_weight,
            addresses = result.breakdown.len(),
            verdict = result.verdict.as_str(),
            "audited voter"
        );
        result
    }

    /// Audit every ballot cast for `option`.
    pub async fn audit_option(&self, option: &VoteOption) -> Result<OptionReport, AuditError> {
        info!(option_id = option.option_id, label = %option.label, "auditing option");
        let ballots = self
            .forum
            .all_ballots(option.option_id)
            .await
            .map_err(|source| AuditError::Fatal {
                option_id: option.option_id,
                source,
            })?;
        if ballots.is_empty() {
            return Err(AuditError::OptionEmpty(option.option_id));
        }
        if option.vote_count != 0 && option.vote_count != ballots.len() as u64 {
            warn!(
                option_id = option.option_id,
                advertised = option.vote_count,
                listed = ballots.len(),
                "ballot count differs from the forum's voter count"
            );
        }

        let ballot_total: f64 = ballots.iter().map(|b| b.reported_weight.value()).sum();
        if let Some(forum_total) = option.total_reported_weight {
            if totals_differ(forum_total.value(), ballot_total) {
                warn!(
                    option_id = option.option_id,
                    forum_total = forum_total.value(),
                    ballot_total,
                    "option total differs from the sum of its ballots"
                );
            }
        }

        let mut results = Vec::with_capacity(ballots.len());
        for ballot in &ballots {
            results.push(self.audit_voter(ballot).await);
        }

        let report = OptionReport {
            option: option.clone(),
            results,
            reported_total_from_forum: option.total_reported_weight,
            reported_total_from_ballots: ReportedWeight::new(ballot_total),
        };
        info!(
            option_id = option.option_id,
            voters = report.results.len(),
            discrepancies = report.count(Verdict::Discrepancy),
            incomplete = report.count(Verdict::Incomplete),
            "option audited"
        );
        Ok(report)
    }

    /// Audit every option of a thread's poll.
    ///
    /// Only an unresolvable thread is an error; options that are empty or whose
    /// ballots cannot be listed come back as [`OptionOutcome::Skipped`].
    pub async fn audit_thread(&self, thread_id: u64) -> Result<Vec<OptionOutcome>, AuditError> {
        let options = self
            .forum
            .vote_options(thread_id)
            .await
            .map_err(|source| AuditError::ThreadUnresolvable { thread_id, source })?;
        info!(thread_id, options = options.len(), "auditing thread");

        let mut outcomes = Vec::with_capacity(options.len());
        for option in options {
            match self.audit_option(&option).await {
                Ok(report) => outcomes.push(OptionOutcome::Audited(report)),
                Err(reason) => {
                    warn!(option_id = option.option_id, error = %reason, "skipping option");
                    self.stats.increment(stats::OPTIONS_SKIPPED);
                    outcomes.push(OptionOutcome::Skipped { option, reason });
                }
            }
        }
        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::DEFAULT_MAX_PAGES;
    use proptest::prelude::*;
    use std::sync::Arc;
    use std::time::Duration;
    use watchdog_client::{ExplorerApi, ExplorerConfig, ForumConfig, RateLimitedRetryingClient, RetryPolicy};
    use watchdog_nullables::fixtures::{
        ballot_page, ballots_page, deposit_cells, empty_ballot_page, explorer_page, forum_error, live_cells,
        profile, profile_of, thread, thread_of,
    };
    use watchdog_nullables::NullTransport;
    use watchdog_types::{CkbAddress, NetworkId};

    const ONE_CKB: u128 = 100_000_000;
    const ADDR_A: &str = "ckb1qzda0cr08m85hc8jlnfp3zer7xulejywt49kt2rr0vthywaa50xwsqfkcv576ccddnn4quf2ga65xee2m26h7nqmzxl9m";
    const ADDR_B_SHORT: &str = "ckb1qyqt8xaupvm8837nv3gtc9x0ekkj64vud3jqfwyw5v";
    const ADDR_B: &str = "ckb1qzda0cr08m85hc8jlnfp3zer7xulejywt49kt2rr0vthywaa50xwsqdnnw7qkdnnclfkg59uzn8umtfd2kwxceqxwquc4";
    const METAMASK: &str = "0xf93178475F922083335B91c4B9a70E66172A8391";
    const METAMASK_PW_LOCK: &str = "ckb1qzl58smqy32hnrq6vxjedcxe2fugvnz497h7yvwqvwel40uh4rltcq0ex9uywhujyzpnxku3cju6wrnxzu4g8ygkgw0rr";

    fn engine(transport: NullTransport) -> ReconciliationEngine<NullTransport> {
        let client = Arc::new(RateLimitedRetryingClient::new(
            transport,
            Duration::ZERO,
            RetryPolicy {
                max_retries: 1,
                backoff: Duration::ZERO,
            },
        ));
        let forum = ForumApi::new(
            Arc::clone(&client),
            ForumConfig {
                api_base: "http://forum.test/api".into(),
                ..ForumConfig::default()
            },
        );
        let explorer = ExplorerApi::new(
            client,
            ExplorerConfig {
                api_base: "http://explorer.test/api/v1".into(),
                page_size: 20,
            },
        );
        ReconciliationEngine::new(
            forum,
            AddressResolver::new(NetworkId::Mainnet),
            DepositAggregator::with_max_pages(explorer, DEFAULT_MAX_PAGES),
        )
    }

    fn ballot(user_id: u64, weight: f64) -> VoterBallot {
        VoterBallot {
            user_id: Some(user_id),
            nickname: format!("user{user_id}"),
            reported_weight: ReportedWeight::new(weight),
            vote_timestamp: "2025-10-01 12:00:00".into(),
        }
    }

    fn found(address: &str, weight: u64) -> WeightBreakdown {
        WeightBreakdown::found(CkbAddress::new(address), weight, 1)
    }

    #[test]
    fn test_reconcile_sums_breakdown() {
        let result = reconcile(&ballot(1, 300.0), vec![found(ADDR_A, 100), found(ADDR_B, 200)], false);
        assert_eq!(result.computed_weight, 300);
        assert!(!result.need_review);
        assert_eq!(result.verdict, Verdict::Match);
    }

    #[test]
    fn test_reconcile_floors_reported_weight() {
        let result = reconcile(&ballot(1, 300.99), vec![found(ADDR_A, 300)], false);
        assert!(!result.need_review);
    }

    #[test]
    fn test_mismatch_with_clean_lookups_is_discrepancy() {
        let result = reconcile(&ballot(1, 301.0), vec![found(ADDR_A, 300)], false);
        assert!(result.need_review);
        assert_eq!(result.verdict, Verdict::Discrepancy);
    }

    #[test]
    fn test_mismatch_with_failed_lookup_is_incomplete() {
        let breakdown = vec![found(ADDR_A, 300), WeightBreakdown::failed(CkbAddress::new(ADDR_B), "timeout")];
        let result = reconcile(&ballot(1, 500.0), breakdown, false);
        assert_eq!(result.verdict, Verdict::Incomplete);

        let result = reconcile(&ballot(1, 500.0), Vec::new(), true);
        assert_eq!(result.verdict, Verdict::Incomplete);
        assert!(result.has_lookup_failure());
    }

    #[test]
    fn test_agreeing_weights_with_failed_lookup_are_incomplete() {
        let result = reconcile(&ballot(1, 0.0), Vec::new(), true);
        assert!(!result.need_review);
        assert_eq!(result.verdict, Verdict::Incomplete);

        let breakdown = vec![found(ADDR_A, 300), WeightBreakdown::failed(CkbAddress::new(ADDR_B), "timeout")];
        let result = reconcile(&ballot(1, 300.0), breakdown, false);
        assert!(!result.need_review);
        assert_eq!(result.verdict, Verdict::Incomplete);
    }

    #[tokio::test]
    async fn test_scenario_a_weights_agree() {
        let transport = NullTransport::new()
            .respond_json(&profile_of(1), profile(&[ADDR_A], Some(METAMASK)))
            .respond_json(&explorer_page(ADDR_A, 1), deposit_cells(1, 1_000_000 * ONE_CKB))
            .respond_json(&explorer_page(METAMASK_PW_LOCK, 1), deposit_cells(1, 996_228 * ONE_CKB + 12_345));
        let result = engine(transport).audit_voter(&ballot(1, 1_996_228.0)).await;
        assert_eq!(result.computed_weight, 1_996_228);
        assert!(!result.need_review);
        assert_eq!(result.breakdown.len(), 2);
        assert_eq!(result.breakdown[1].address.as_str(), METAMASK_PW_LOCK);
    }

    #[tokio::test]
    async fn test_scenario_b_all_addresses_unknown() {
        let transport = NullTransport::new().respond_json(&profile_of(2), profile(&[ADDR_A, ADDR_B], None));
        let engine = engine(transport);
        let result = engine.audit_voter(&ballot(2, 100.0)).await;
        assert_eq!(result.computed_weight, 0);
        assert!(result.need_review);
        assert_eq!(result.verdict, Verdict::Discrepancy);
        assert!(result.breakdown.iter().all(|b| b.status == LookupStatus::NotFound));
        assert_eq!(engine.stats().get(stats::ADDRESSES_NOT_FOUND), 2);
    }

    #[tokio::test]
    async fn test_scenario_c_one_found_one_missing() {
        let transport = NullTransport::new()
            .respond_json(&profile_of(3), profile(&[ADDR_A, ADDR_B], None))
            .respond_json(&explorer_page(ADDR_A, 1), deposit_cells(2, 293_453 * ONE_CKB));
        let result = engine(transport).audit_voter(&ballot(3, 586_906.0)).await;
        assert_eq!(result.computed_weight, 586_906);
        assert_eq!(result.breakdown.len(), 2);
        assert_eq!(result.breakdown.iter().filter(|b| !b.is_found()).count(), 1);
        assert!(!result.need_review);
    }

    #[tokio::test]
    async fn test_two_encodings_of_one_lock_are_weighed_once() {
        let transport = NullTransport::new()
            .respond_json(&profile_of(9), profile(&[ADDR_B_SHORT, ADDR_B], None))
            .respond_json(&explorer_page(ADDR_B, 1), deposit_cells(1, 1_000 * ONE_CKB));
        let engine = engine(transport);
        let result = engine.audit_voter(&ballot(9, 1_000.0)).await;
        assert_eq!(result.breakdown.len(), 1);
        assert_eq!(result.breakdown[0].address.as_str(), ADDR_B);
        assert_eq!(result.computed_weight, 1_000);
        assert!(!result.need_review);
        assert_eq!(result.verdict, Verdict::Match);
    }

    #[tokio::test]
    async fn test_failed_address_does_not_stop_voter() {
        let transport = NullTransport::new()
            .respond_json(&profile_of(4), profile(&[ADDR_A, ADDR_B], None))
            .respond_status(&explorer_page(ADDR_A, 1), 503)
            .respond_json(&explorer_page(ADDR_B, 1), deposit_cells(1, 50 * ONE_CKB));
        let result = engine(transport).audit_voter(&ballot(4, 100.0)).await;
        assert!(result.breakdown[0].is_failed());
        assert_eq!(result.breakdown[1].computed_weight, 50);
        assert_eq!(result.computed_weight, 50);
        assert_eq!(result.verdict, Verdict::Incomplete);
    }

    #[tokio::test]
    async fn test_profile_failure_is_contained() {
        let transport = NullTransport::new().respond_status(&profile_of(5), 500);
        let result = engine(transport).audit_voter(&ballot(5, 10.0)).await;
        assert!(result.profile_failed);
        assert!(result.breakdown.is_empty());
        assert_eq!(result.verdict, Verdict::Incomplete);
    }

    #[tokio::test]
    async fn test_ballot_without_user_id_has_no_addresses() {
        let transport = NullTransport::new();
        let engine = engine(transport);
        let mut anonymous = ballot(0, 0.0);
        anonymous.user_id = None;
        let result = engine.audit_voter(&anonymous).await;
        assert!(result.breakdown.is_empty());
        assert!(!result.profile_failed);
        assert_eq!(result.verdict, Verdict::Match);
    }

    #[tokio::test]
    async fn test_malformed_bindings_are_counted_and_skipped() {
        let transport = NullTransport::new()
            .respond_json(&profile_of(6), profile(&["garbage", ADDR_A], Some("0xdead")))
            .respond_json(&explorer_page(ADDR_A, 1), live_cells(&[]));
        let engine = engine(transport);
        let result = engine.audit_voter(&ballot(6, 0.0)).await;
        assert_eq!(result.breakdown.len(), 1);
        assert_eq!(engine.stats().get(stats::BINDINGS_SKIPPED), 2);
    }

    #[tokio::test]
    async fn test_audit_option_lists_every_page_of_ballots() {
        let transport = NullTransport::new()
            .respond_json(&ballots_page(7, 1), ballot_page(&[(1, "alice", 100.0), (2, "bob", 5.0)]))
            .respond_json(&ballots_page(7, 2), ballot_page(&[(3, "carol", 0.0)]))
            .respond_json(&ballots_page(7, 3), empty_ballot_page())
            .respond_json(&profile_of(1), profile(&[ADDR_A], None))
            .respond_json(&profile_of(2), profile(&[], None))
            .respond_json(&profile_of(3), profile(&[], None))
            .respond_json(&explorer_page(ADDR_A, 1), deposit_cells(1, 100 * ONE_CKB));
        let engine = engine(transport);
        let option = VoteOption {
            option_id: 7,
            label: "Yes".into(),
            vote_count: 3,
            total_reported_weight: Some(ReportedWeight::new(105.0)),
        };
        let report = engine.audit_option(&option).await.unwrap();
        assert_eq!(report.results.len(), 3);
        assert_eq!(report.results[0].verdict, Verdict::Match);
        assert_eq!(report.results[1].verdict, Verdict::Discrepancy);
        assert_eq!(report.results[2].verdict, Verdict::Match);
        assert_eq!(report.reported_total_from_ballots, ReportedWeight::new(105.0));
        assert_eq!(report.computed_total(), 100);
        assert_eq!(engine.stats().get(stats::VOTERS), 3);
        assert_eq!(engine.stats().get(stats::DISCREPANCIES), 1);
    }

    #[tokio::test]
    async fn test_empty_option_is_reported() {
        let transport = NullTransport::new().respond_json(&ballots_page(8, 1), empty_ballot_page());
        let option = VoteOption {
            option_id: 8,
            label: "No".into(),
            vote_count: 0,
            total_reported_weight: None,
        };
        assert!(matches!(
            engine(transport).audit_option(&option).await,
            Err(AuditError::OptionEmpty(8))
        ));
    }

    #[tokio::test]
    async fn test_thread_skips_failed_options_and_continues() {
        let transport = NullTransport::new()
            .respond_json(&thread_of(66568), thread(&[(10, "Yes", 1, 100.0), (11, "No", 0, 0.0), (12, "Abstain", 1, 0.0)]))
            .respond_json(&ballots_page(10, 1), ballot_page(&[(1, "alice", 100.0)]))
            .respond_json(&ballots_page(10, 2), empty_ballot_page())
            .respond_json(&ballots_page(11, 1), empty_ballot_page())
            .respond_json(&ballots_page(12, 1), forum_error(50000, "server busy"))
            .respond_json(&profile_of(1), profile(&[ADDR_A], None))
            .respond_json(&explorer_page(ADDR_A, 1), deposit_cells(1, 100 * ONE_CKB));
        let engine = engine(transport);
        let outcomes = engine.audit_thread(66568).await.unwrap();
        assert_eq!(outcomes.len(), 3);
        assert!(matches!(&outcomes[0], OptionOutcome::Audited(r) if r.results.len() == 1));
        assert!(matches!(
            &outcomes[1],
            OptionOutcome::Skipped { reason: AuditError::OptionEmpty(11), .. }
        ));
        assert!(matches!(
            &outcomes[2],
            OptionOutcome::Skipped { reason: AuditError::Fatal { option_id: 12, .. }, .. }
        ));
        assert_eq!(engine.stats().get(stats::OPTIONS_SKIPPED), 2);
    }

    #[tokio::test]
    async fn test_unresolvable_thread_aborts() {
        let transport = NullTransport::new();
        assert!(matches!(
            engine(transport).audit_thread(1).await,
            Err(AuditError::ThreadUnresolvable { thread_id: 1, .. })
        ));
    }

    fn arb_breakdown() -> impl Strategy<Value = Vec<WeightBreakdown>> {
        prop::collection::vec(
            (0u64..10_000_000, 0u8..3).prop_map(|(weight, kind)| {
                let address = CkbAddress::new(ADDR_A);
                match kind {
                    0 => WeightBreakdown::found(address, weight, 1),
                    1 => WeightBreakdown::not_found(address),
                    _ => WeightBreakdown::failed(address, "exhausted"),
                }
            }),
            0..8,
        )
    }

    proptest! {
        #[test]
        fn prop_computed_weight_is_sum_of_breakdown(
            breakdown in arb_breakdown(),
            reported in 0.0f64..100_000_000.0,
            profile_failed in any::<bool>(),
        ) {
            let expected: u64 = breakdown.iter().map(|b| b.computed_weight).sum();
            let result = reconcile(&ballot(1, reported), breakdown, profile_failed);
            prop_assert_eq!(result.computed_weight, expected);
            prop_assert_eq!(result.need_review, reported.floor() as i128 != i128::from(expected));
            let failed = result.has_lookup_failure();
            prop_assert_eq!(result.verdict == Verdict::Match, !result.need_review && !failed);
            prop_assert_eq!(result.verdict == Verdict::Incomplete, failed);
        }
    }
}
