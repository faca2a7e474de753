//! Report sinks: persist each audited option as CSV and JSON.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;
use watchdog_governance::OptionReport;
use watchdog_types::{ReconciliationResult, ReportedWeight, VoteOption};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("report I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Consumes finished option reports.
pub trait ReportSink {
    /// Persist one option's results, returning the files written.
    fn write(&mut self, thread_id: u64, report: &OptionReport) -> Result<Vec<PathBuf>, ReportError>;
}

/// One CSV line: a voter's address, or the voter alone if it has none.
#[derive(Debug, Serialize)]
struct ReportRow<'a> {
    nickname: &'a str,
    #[serde(rename = "userid")]
    user_id: Option<u64>,
    #[serde(rename = "total weight(metaforo)")]
    reported_weight: ReportedWeight,
    #[serde(rename = "total weight(on chain, floored)")]
    computed_weight: u64,
    need_review: bool,
    verdict: &'static str,
    address: &'a str,
    #[serde(rename = "address weight(floored)")]
    address_weight: Option<u64>,
    status: &'static str,
    explorer_url: String,
}

fn rows<'a>(result: &'a ReconciliationResult, explorer_web_base: &str) -> Vec<ReportRow<'a>> {
    let row = |address: &'a str, address_weight, status, explorer_url| ReportRow {
        nickname: &result.nickname,
        user_id: result.user_id,
        reported_weight: result.reported_weight,
        computed_weight: result.computed_weight,
        need_review: result.need_review,
        verdict: result.verdict.as_str(),
        address,
        address_weight,
        status,
        explorer_url,
    };
    if result.breakdown.is_empty() {
        let status = if result.profile_failed { "profile_failed" } else { "" };
        return vec![row("", None, status, String::new())];
    }
    result
        .breakdown
        .iter()
        .map(|b| {
            row(
                b.address.as_str(),
                Some(b.computed_weight),
                b.status.as_str(),
                b.address.explorer_url(explorer_web_base),
            )
        })
        .collect()
}

#[derive(Serialize)]
struct JsonReport<'a> {
    thread_id: u64,
    generated_at: u64,
    option: &'a VoteOption,
    reported_total_from_forum: Option<ReportedWeight>,
    reported_total_from_ballots: ReportedWeight,
    computed_total: u64,
    results: &'a [ReconciliationResult],
}

/// Keep letters, digits, `_` and `-`; everything else becomes `_`.
pub fn sanitise_label(label: &str) -> String {
    label
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect()
}

/// Writes `{output_dir}/{thread_id}/{label}_{timestamp}.{csv,json}`.
pub struct FileReportSink {
    output_dir: PathBuf,
    explorer_web_base: String,
    /// Unix seconds of the run, shared by every file it writes.
    timestamp: u64,
}

impl FileReportSink {
    pub fn new(output_dir: impl Into<PathBuf>, explorer_web_base: impl Into<String>, timestamp: u64) -> Self {
        Self {
            output_dir: output_dir.into(),
            explorer_web_base: explorer_web_base.into(),
            timestamp,
        }
    }

    fn stem(&self, option: &VoteOption) -> String {
        let label = sanitise_label(&option.label);
        let label = if label.is_empty() {
            format!("option_{}", option.option_id)
        } else {
            label
        };
        format!("{label}_{}", self.timestamp)
    }

    fn write_csv(&self, path: &Path, report: &OptionReport) -> Result<(), ReportError> {
        let mut writer = csv::Writer::from_path(path)?;
        for result in &report.results {
            for row in rows(result, &self.explorer_web_base) {
                writer.serialize(row)?;
            }
        }
        writer.flush()?;
        Ok(())
    }

    fn write_json(&self, path: &Path, thread_id: u64, report: &OptionReport) -> Result<(), ReportError> {
        let document = JsonReport {
            thread_id,
            generated_at: self.timestamp,
            option: &report.option,
            reported_total_from_forum: report.reported_total_from_forum,
            reported_total_from_ballots: report.reported_total_from_ballots,
            computed_total: report.computed_total(),
            results: &report.results,
        };
        fs::write(path, serde_json::to_vec_pretty(&document)?)?;
        Ok(())
    }
}

impl ReportSink for FileReportSink {
    fn write(&mut self, thread_id: u64, report: &OptionReport) -> Result<Vec<PathBuf>, ReportError> {
        let dir = self.output_dir.join(thread_id.to_string());
        fs::create_dir_all(&dir)?;
        let stem = self.stem(&report.option);
        let csv_path = dir.join(format!("{stem}.csv"));
        let json_path = dir.join(format!("{stem}.json"));

        self.write_csv(&csv_path, report)?;
        self.write_json(&json_path, thread_id, report)?;
        info!(csv = %csv_path.display(), json = %json_path.display(), "report written");
        Ok(vec![csv_path, json_path])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use watchdog_governance::reconcile;
    use watchdog_types::{CkbAddress, VoterBallot, WeightBreakdown};

    const ADDR: &str = "ckb1qyqt8xaupvm8837nv3gtc9x0ekkj64vud3jqfwyw5v";

    fn sample_report() -> OptionReport {
        let alice = VoterBallot {
            user_id: Some(1),
            nickname: "alice".into(),
            reported_weight: ReportedWeight::new(100.0),
            vote_timestamp: "2025-10-01".into(),
        };
        let bob = VoterBallot {
            user_id: Some(2),
            nickname: "bob".into(),
            reported_weight: ReportedWeight::new(7.0),
            vote_timestamp: "2025-10-02".into(),
        };
        OptionReport {
            option: VoteOption {
                option_id: 101,
                label: "Yes, approve!".into(),
                vote_count: 2,
                total_reported_weight: Some(ReportedWeight::new(107.0)),
            },
            results: vec![
                reconcile(&alice, vec![WeightBreakdown::found(CkbAddress::new(ADDR), 100, 1)], false),
                reconcile(&bob, Vec::new(), false),
            ],
            reported_total_from_forum: Some(ReportedWeight::new(107.0)),
            reported_total_from_ballots: ReportedWeight::new(107.0),
        }
    }

    #[test]
    fn sanitises_labels() {
        assert_eq!(sanitise_label("Yes, approve!"), "Yes__approve_");
        assert_eq!(sanitise_label("no-change_2"), "no-change_2");
        assert_eq!(sanitise_label(" a/b "), "a_b");
    }

    #[test]
    fn writes_csv_and_json_under_thread_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = FileReportSink::new(dir.path(), "https://explorer.app5.org", 1_700_000_000);
        let files = sink.write(66568, &sample_report()).unwrap();

        let csv_path = dir.path().join("66568").join("Yes__approve__1700000000.csv");
        let json_path = dir.path().join("66568").join("Yes__approve__1700000000.json");
        assert_eq!(files, vec![csv_path.clone(), json_path.clone()]);

        let csv = std::fs::read_to_string(&csv_path).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("nickname,userid,total weight(metaforo)"));
        assert!(lines[1].contains(ADDR));
        assert!(lines[1].contains(&format!("https://explorer.app5.org/address/{ADDR}")));
        assert!(lines[1].contains(",match,"));
        assert!(lines[2].starts_with("bob,2,7.0,0,true,discrepancy,,"));

        let json: serde_json::Value = serde_json::from_slice(&std::fs::read(&json_path).unwrap()).unwrap();
        assert_eq!(json["thread_id"], 66568);
        assert_eq!(json["computed_total"], 100);
        assert_eq!(json["results"].as_array().unwrap().len(), 2);
        assert_eq!(json["results"][1]["verdict"], "discrepancy");
    }

    #[test]
    fn empty_label_falls_back_to_option_id() {
        let sink = FileReportSink::new("/tmp", "", 5);
        let option = VoteOption {
            option_id: 9,
            label: String::new(),
            vote_count: 0,
            total_reported_weight: None,
        };
        assert_eq!(sink.stem(&option), "option_9_5");
    }
}
