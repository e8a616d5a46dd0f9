//! Whoami command

use anyhow::Result;

use crate::config::{self, Settings};
use crate::gitlab::GitLabClient;

/// Print the authenticated user's identity.
pub fn run_whoami() -> Result<()> {
    // Timeout resolution may warn about GITLAB_API_TIMEOUT.
    crate::init_logging("warn");
    let settings = Settings::from_env()?;
    let timeout = config::resolve_timeout(None)?;
    let client = GitLabClient::new(&settings, timeout);

    let user = client.current_user()?;
    println!("Username: {}", user.username);
    println!("Full Name: {}", user.name);
    println!("Email: {}", user.email.as_deref().unwrap_or("-"));
    println!("User ID: {}", user.id);
    Ok(())
}
