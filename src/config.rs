//! Environment settings and report flag validation.
//!
//! All validation runs before any network call; the first violated rule
//! wins. The validated [`ReportConfig`] is built once from the parsed
//! flags and passed by reference into the rest of the pipeline.

use std::env;
use std::time::Duration;

use anyhow::{Result, anyhow};
use clap::Args;
use thiserror::Error;
use tracing::warn;

use crate::query::IssueState;
use crate::render::OutputFormat;

/// Default HTTP timeout for GitLab API calls.
pub const DEFAULT_API_TIMEOUT: Duration = Duration::from_secs(30);

/// Advisory bounds; timeouts outside them only produce a warning.
const TIMEOUT_WARN_SHORT: Duration = Duration::from_secs(5);
const TIMEOUT_WARN_LONG: Duration = Duration::from_secs(300);

/// Errors for invalid flag values or combinations.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum FlagError {
    #[error("invalid --state value: {0} (must be opened, closed, or all)")]
    InvalidStateValue(String),

    #[error("invalid --format value: {0} (must be plain, table, or markdown)")]
    InvalidFormatValue(String),

    #[error("--created or --updated requires --interval to be set")]
    IntervalRequired,

    #[error("--created and --updated cannot be used together")]
    CreatedUpdatedConflict,

    #[error("invalid --api-timeout value: {0}")]
    InvalidTimeout(String),

    #[error("--api-timeout must be positive")]
    NonPositiveTimeout,
}

/// Flags shared by the `project` and `group` subcommands.
#[derive(Args, Debug, Clone, Default)]
pub struct ReportFlags {
    /// Date interval: '2024-01-01..2024-01-31', a single day, or '30d'
    #[arg(short = 'i', long)]
    pub interval: Option<String>,

    /// Filter issues by creation date (requires --interval)
    #[arg(long)]
    pub created: bool,

    /// Filter issues by update date (requires --interval)
    #[arg(long)]
    pub updated: bool,

    /// Filter by state: opened, closed, all
    #[arg(long)]
    pub state: Option<String>,

    /// Output format: plain, table, markdown
    #[arg(long)]
    pub format: Option<String>,

    /// Only issues assigned to the current user
    #[arg(long)]
    pub mine: bool,

    /// Log level: debug, info, warn, error
    #[arg(long = "log-level")]
    pub log_level: Option<String>,

    /// Enable debug logging (shorthand for --log-level=debug)
    #[arg(short = 'd', long)]
    pub debug: bool,

    /// Enable verbose logging (shorthand for --log-level=info)
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// HTTP timeout for API calls, e.g. '30s' (GITLAB_API_TIMEOUT when unset)
    #[arg(long = "api-timeout")]
    pub api_timeout: Option<String>,
}

/// GitLab connection settings read from the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Private API token (`GITLAB_TOKEN`)
    pub token: String,

    /// Instance base URL (`GITLAB_URI`, defaults to gitlab.com)
    pub base_url: String,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let token = env::var("GITLAB_TOKEN")
            .ok()
            .filter(|token| !token.is_empty())
            .ok_or_else(|| anyhow!("GITLAB_TOKEN environment variable is not set"))?;
        let base_url = env::var("GITLAB_URI")
            .ok()
            .filter(|uri| !uri.is_empty())
            .unwrap_or_else(|| "https://gitlab.com".to_string());
        Ok(Self { token, base_url })
    }
}

/// Validated report configuration built once from the parsed flags.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportConfig {
    pub interval: Option<String>,
    pub created: bool,
    pub updated: bool,
    pub state: IssueState,
    pub format: OutputFormat,
    pub mine: bool,
    pub log_level: String,
    pub timeout: Duration,
}

impl ReportConfig {
    /// Reconcile and validate the raw flags.
    pub fn from_flags(flags: &ReportFlags) -> Result<Self, FlagError> {
        let log_level = reconcile_log_level(flags);

        let state = match flags.state.as_deref() {
            None | Some("") => IssueState::All,
            Some(value) => IssueState::from_flag(value)
                .ok_or_else(|| FlagError::InvalidStateValue(value.to_string()))?,
        };

        let format = match flags.format.as_deref() {
            None | Some("") => OutputFormat::Plain,
            Some(value) => OutputFormat::from_flag(value)
                .ok_or_else(|| FlagError::InvalidFormatValue(value.to_string()))?,
        };

        if (flags.created || flags.updated) && flags.interval.is_none() {
            return Err(FlagError::IntervalRequired);
        }
        if flags.created && flags.updated {
            return Err(FlagError::CreatedUpdatedConflict);
        }

        let timeout = resolve_timeout(flags.api_timeout.as_deref())?;

        Ok(Self {
            interval: flags.interval.clone(),
            created: flags.created,
            updated: flags.updated,
            state,
            format,
            mine: flags.mine,
            log_level,
            timeout,
        })
    }
}

/// `--debug` and `--verbose` override an explicit `--log-level`; debug
/// takes precedence over verbose.
///
/// Callers install the subscriber from this value before running flag
/// validation, so the advisory timeout warnings are not lost.
pub fn reconcile_log_level(flags: &ReportFlags) -> String {
    if flags.debug {
        "debug".to_string()
    } else if flags.verbose {
        "info".to_string()
    } else {
        flags.log_level.clone().unwrap_or_else(|| "error".to_string())
    }
}

/// Timeout precedence: `--api-timeout` flag, then `GITLAB_API_TIMEOUT`,
/// then the 30s default. Only the flag value is a hard error when it
/// cannot be parsed; a bad environment value falls back with a warning.
pub(crate) fn resolve_timeout(flag: Option<&str>) -> Result<Duration, FlagError> {
    let timeout = match flag {
        Some(value) => {
            if value.trim().starts_with('-') {
                return Err(FlagError::NonPositiveTimeout);
            }
            parse_duration(value).ok_or_else(|| FlagError::InvalidTimeout(value.to_string()))?
        }
        None => match env::var("GITLAB_API_TIMEOUT") {
            Ok(value) if !value.is_empty() => match parse_duration(&value) {
                Some(timeout) => timeout,
                None => {
                    warn!(
                        "invalid GITLAB_API_TIMEOUT value '{value}', using default {}s",
                        DEFAULT_API_TIMEOUT.as_secs()
                    );
                    DEFAULT_API_TIMEOUT
                }
            },
            _ => DEFAULT_API_TIMEOUT,
        },
    };

    if timeout.is_zero() {
        return Err(FlagError::NonPositiveTimeout);
    }
    if timeout < TIMEOUT_WARN_SHORT {
        warn!(
            "--api-timeout is very short ({}ms), may cause false timeouts",
            timeout.as_millis()
        );
    }
    if timeout > TIMEOUT_WARN_LONG {
        warn!(
            "--api-timeout is very long ({}s), consider using a shorter timeout",
            timeout.as_secs()
        );
    }
    Ok(timeout)
}

/// Parse a duration like "30s", "5m", "250ms", "1h", or plain seconds.
pub fn parse_duration(value: &str) -> Option<Duration> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    let unit_start = value.find(|c: char| c.is_ascii_alphabetic())?;
    let amount: u64 = value[..unit_start].parse().ok()?;
    match &value[unit_start..] {
        "ms" => Some(Duration::from_millis(amount)),
        "s" => Some(Duration::from_secs(amount)),
        "m" => amount.checked_mul(60).map(Duration::from_secs),
        "h" => amount.checked_mul(3600).map(Duration::from_secs),
        _ => None,
    }
}
