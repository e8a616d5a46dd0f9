//! Project report command

use anyhow::Result;
use tracing::{info, warn};

use crate::commands::fetch_report_issues;
use crate::config::{self, ReportConfig, ReportFlags, Settings};
use crate::git_utils;
use crate::gitlab::{GitLabClient, HttpClient};
use crate::render::RenderContext;

/// Report issues of a project, auto-detecting it from the git remote
/// origin when no ID was given.
pub fn run_project(project_id: Option<u64>, flags: &ReportFlags) -> Result<()> {
    // Logging must exist before validation, which emits warnings.
    crate::init_logging(&config::reconcile_log_level(flags));
    let config = ReportConfig::from_flags(flags)?;

    let settings = Settings::from_env()?;
    let client = GitLabClient::new(&settings, config.timeout);

    let project_id = match project_id {
        Some(id) => id,
        None => detect_project_id(&client)?,
    };

    let issues = fetch_report_issues(&client, &config, project_id, 0)?;

    // Path resolution is best-effort; fall back to a context-less report.
    let context = match client.project_path(project_id) {
        Ok(path) => Some(RenderContext::Project { path }),
        Err(err) => {
            warn!("Failed to resolve path of project {project_id}: {err:#}");
            None
        }
    };

    let stdout = std::io::stdout();
    config
        .format
        .render(&issues, context.as_ref(), &mut stdout.lock())
}

fn detect_project_id<H: HttpClient>(client: &GitLabClient<H>) -> Result<u64> {
    let origin = git_utils::remote_origin_url()?;
    let project = client.find_project_by_remote(&origin)?;
    info!(
        "Project found: {} (ID {})",
        project.path_with_namespace, project.id
    );
    Ok(project.id)
}
