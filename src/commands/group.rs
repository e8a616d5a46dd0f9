//! Group report command

use anyhow::Result;
use tracing::warn;

use crate::commands::fetch_report_issues;
use crate::config::{self, ReportConfig, ReportFlags, Settings};
use crate::gitlab::GitLabClient;
use crate::render::RenderContext;

/// Report issues of a group. Group results span multiple projects, so
/// the render context carries a per-project path table.
pub fn run_group(group_id: u64, flags: &ReportFlags) -> Result<()> {
    // Logging must exist before validation, which emits warnings.
    crate::init_logging(&config::reconcile_log_level(flags));
    let config = ReportConfig::from_flags(flags)?;

    let settings = Settings::from_env()?;
    let client = GitLabClient::new(&settings, config.timeout);

    let issues = fetch_report_issues(&client, &config, 0, group_id)?;

    let context = match client.group_path(group_id) {
        Ok(path) => {
            let project_paths = client.project_paths_for_issues(&issues);
            Some(RenderContext::Group {
                path,
                project_paths,
            })
        }
        Err(err) => {
            warn!("Failed to resolve path of group {group_id}: {err:#}");
            None
        }
    };

    let stdout = std::io::stdout();
    config
        .format
        .render(&issues, context.as_ref(), &mut stdout.lock())
}
