//! Git remote discovery for project auto-detection.

use std::process::Command;

use anyhow::{Context, Result, anyhow};
use tracing::debug;

/// Read the remote origin URL of the enclosing git repository.
pub fn remote_origin_url() -> Result<String> {
    let output = Command::new("git")
        .args(["config", "--get", "remote.origin.url"])
        .output()
        .context("failed to run git")?;

    if !output.status.success() {
        return Err(anyhow!("git repository or remote origin not found"));
    }

    let url = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if url.is_empty() {
        return Err(anyhow!("remote origin URL is empty"));
    }
    debug!("remote origin: {url}");
    Ok(url)
}

/// Derive the project name from a remote URL.
///
/// `git@gitlab.com:ns/tool.git` and `https://gitlab.com/ns/tool.git`
/// both yield `tool`.
pub fn project_name_from_url(url: &str) -> String {
    let trimmed = url.trim_end_matches('/').trim_end_matches(".git");
    trimmed
        .rsplit(['/', ':'])
        .next()
        .unwrap_or(trimmed)
        .to_string()
}
