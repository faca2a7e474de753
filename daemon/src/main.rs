//! DAO vote watchdog entry point: one audit run per invocation.

mod cli;
mod config;
mod report;

use anyhow::Context;
use clap::Parser;
use cli::{AuditTarget, Cli, Command};
use config::WatchdogConfig;
use report::{FileReportSink, ReportSink};
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use watchdog_client::{ExplorerApi, ForumApi, HttpTransport, RateLimitedRetryingClient, ReqwestTransport};
use watchdog_governance::{AddressResolver, DepositAggregator, OptionOutcome, ReconciliationEngine};
use watchdog_types::VoteOption;
use watchdog_utils::{format_duration, init_logging};

async fn run_audit<T: HttpTransport>(
    engine: &ReconciliationEngine<T>,
    sink: &mut impl ReportSink,
    target: AuditTarget,
) -> anyhow::Result<()> {
    let (report_dir, outcomes) = match target {
        AuditTarget::Thread(thread_id) => (thread_id, engine.audit_thread(thread_id).await?),
        AuditTarget::Option(option_id) => {
            let option = VoteOption {
                option_id,
                label: option_id.to_string(),
                vote_count: 0,
                total_reported_weight: None,
            };
            let outcome = match engine.audit_option(&option).await {
                Ok(report) => OptionOutcome::Audited(report),
                Err(reason) => OptionOutcome::Skipped { option, reason },
            };
            (option_id, vec![outcome])
        }
    };

    for outcome in &outcomes {
        match outcome {
            OptionOutcome::Audited(report) => {
                sink.write(report_dir, report)
                    .with_context(|| format!("writing report for option {}", report.option.option_id))?;
            }
            OptionOutcome::Skipped { option, reason } => {
                tracing::warn!(option_id = option.option_id, label = %option.label, "no report: {reason}");
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => WatchdogConfig::from_toml_file(path)?,
        None => WatchdogConfig::default(),
    };
    cli.apply(&mut config);
    config.validate()?;

    let target = match &cli.command {
        Command::Config => {
            print!("{}", config.to_toml_string()?);
            return Ok(());
        }
        Command::Audit(args) => args.target().map_err(anyhow::Error::msg)?,
    };

    init_logging(config.log_format, &config.log_level).map_err(anyhow::Error::msg)?;
    if let Some(path) = &cli.config {
        tracing::info!("Loaded config from {}", path.display());
    }

    let started = Instant::now();
    let client = Arc::new(RateLimitedRetryingClient::new(
        ReqwestTransport::with_timeout(config.request_timeout())?,
        config.request_spacing(),
        config.retry_policy(),
    ));
    let engine = ReconciliationEngine::new(
        ForumApi::new(Arc::clone(&client), config.forum()),
        AddressResolver::new(config.network),
        DepositAggregator::with_max_pages(ExplorerApi::new(client, config.explorer()), config.max_pages),
    );

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    let mut sink = FileReportSink::new(&config.output_dir, config.explorer_web_base.as_str(), timestamp);

    tracing::info!(
        network = config.network.as_str(),
        output_dir = %config.output_dir.display(),
        "starting audit of {target:?}"
    );
    run_audit(&engine, &mut sink, target).await?;

    tracing::info!(
        elapsed = %format_duration(started.elapsed()),
        "audit finished: {}",
        engine.stats().summary()
    );
    Ok(())
}
