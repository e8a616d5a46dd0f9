//! gitlab-issue-report - GitLab issue reporting CLI
//!
//! Retrieves issues of a GitLab project or group, filters them by date
//! range, state, and assignee, and renders them as plain text, a table,
//! or Markdown.
//!
//! # Modules
//!
//! - [`config`] - environment settings and flag validation
//! - [`query`] - filter directives and query composition
//! - [`gitlab`] - paginated REST API client
//! - [`render`] - report output formats
//! - [`interval`] - `--interval` date range parsing

pub mod cli;
pub mod commands;
pub mod config;
pub mod git_utils;
pub mod gitlab;
pub mod interval;
pub mod query;
pub mod render;

// Re-export commonly used types
pub use config::{ReportConfig, ReportFlags, Settings};
pub use gitlab::{GitLabClient, Issue};
pub use query::{IssueQuery, IssueState};
pub use render::{OutputFormat, RenderContext};

use tracing_subscriber::EnvFilter;

/// Initialize logging to stderr at the given level.
///
/// Reports go to stdout, so diagnostics must stay on stderr.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("error"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}
