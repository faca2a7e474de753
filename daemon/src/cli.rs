//! Command-line interface.

use crate::config::WatchdogConfig;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use watchdog_types::NetworkId;
use watchdog_utils::LogFormat;

#[derive(Parser, Debug)]
#[command(name = "watchdog", version, about = "Audit DAO vote weights against Nervos DAO deposits")]
pub struct Cli {
    /// Network the voters' addresses belong to: "mainnet" or "testnet".
    #[arg(long, env = "WATCHDOG_NETWORK")]
    pub network: Option<NetworkId>,

    /// Directory reports are written to.
    #[arg(long, env = "WATCHDOG_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Forum API base URL.
    #[arg(long, env = "WATCHDOG_FORUM_API")]
    pub forum_api: Option<String>,

    /// Explorer API base URL.
    #[arg(long, env = "WATCHDOG_EXPLORER_API")]
    pub explorer_api: Option<String>,

    /// Minimum delay between outbound calls, in milliseconds.
    #[arg(long, env = "WATCHDOG_REQUEST_SPACING_MS")]
    pub request_spacing_ms: Option<u64>,

    /// Retries per failed call.
    #[arg(long, env = "WATCHDOG_MAX_RETRIES")]
    pub max_retries: Option<u32>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "WATCHDOG_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "WATCHDOG_LOG_FORMAT")]
    pub log_format: Option<LogFormat>,

    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "WATCHDOG_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Audit every option of a poll, or a single option.
    Audit(AuditArgs),
    /// Print the effective configuration as TOML.
    Config,
}

#[derive(Args, Debug)]
pub struct AuditArgs {
    /// Forum thread URL or numeric thread id.
    #[arg(required_unless_present = "option", conflicts_with = "option")]
    pub thread: Option<String>,

    /// Audit a single poll option by id instead of a whole thread.
    #[arg(long)]
    pub option: Option<u64>,
}

/// What a run audits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuditTarget {
    Thread(u64),
    Option(u64),
}

impl AuditArgs {
    pub fn target(&self) -> Result<AuditTarget, String> {
        match (&self.thread, self.option) {
            (_, Some(option_id)) => Ok(AuditTarget::Option(option_id)),
            (Some(thread), None) => parse_thread_id(thread)
                .map(AuditTarget::Thread)
                .ok_or_else(|| format!("cannot find a thread id in {thread:?}")),
            (None, None) => Err("a thread URL, thread id or --option is required".into()),
        }
    }
}

/// Extract the trailing thread id from a forum URL or a bare number.
///
/// `https://dao.ckb.community/thread/vot-some-proposal-66568` gives `66568`.
pub fn parse_thread_id(input: &str) -> Option<u64> {
    let path = input
        .trim()
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim_end_matches('/');
    let digits_start = path
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i)?;
    path[digits_start..].parse().ok()
}

impl Cli {
    /// Overlay flags and env vars on top of file (or default) configuration.
    pub fn apply(&self, config: &mut WatchdogConfig) {
        if let Some(network) = self.network {
            config.network = network;
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(base) = &self.forum_api {
            config.forum_api_base = base.clone();
        }
        if let Some(base) = &self.explorer_api {
            config.explorer_api_base = Some(base.clone());
        }
        if let Some(ms) = self.request_spacing_ms {
            config.request_spacing_ms = ms;
        }
        if let Some(retries) = self.max_retries {
            config.max_retries = retries;
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(format) = self.log_format {
            config.log_format = format;
        }
    }
}
