//! CLI argument parsing

use clap::{Parser, Subcommand};

use crate::config::ReportFlags;

#[derive(Parser)]
#[command(name = "gitlab-issue-report")]
#[command(author, version, about = "Report issues of a GitLab project or group")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Get issues of a GitLab project
    Project {
        /// Project ID (auto-detected from the git remote origin if not set)
        #[arg(short = 'p', long = "project-id")]
        project_id: Option<u64>,

        #[command(flatten)]
        flags: ReportFlags,
    },
    /// Get issues of a GitLab group
    Group {
        /// Group ID
        #[arg(short = 'g', long = "group-id")]
        group_id: u64,

        #[command(flatten)]
        flags: ReportFlags,
    },
    /// Display information about the authenticated GitLab user
    Whoami,
    /// Print version
    Version,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_project_with_flags() {
        let cli = Cli::try_parse_from([
            "gitlab-issue-report",
            "project",
            "-p",
            "42",
            "--interval",
            "30d",
            "--created",
            "--state",
            "opened",
            "--format",
            "markdown",
        ])
        .unwrap();

        match cli.command {
            Commands::Project { project_id, flags } => {
                assert_eq!(project_id, Some(42));
                assert_eq!(flags.interval.as_deref(), Some("30d"));
                assert!(flags.created);
                assert_eq!(flags.state.as_deref(), Some("opened"));
                assert_eq!(flags.format.as_deref(), Some("markdown"));
            }
            _ => panic!("expected project command"),
        }
    }

    #[test]
    fn test_parse_project_without_id() {
        let cli = Cli::try_parse_from(["gitlab-issue-report", "project"]).unwrap();
        match cli.command {
            Commands::Project { project_id, .. } => assert_eq!(project_id, None),
            _ => panic!("expected project command"),
        }
    }

    #[test]
    fn test_group_id_is_mandatory() {
        assert!(Cli::try_parse_from(["gitlab-issue-report", "group"]).is_err());
    }

    #[test]
    fn test_parse_group() {
        let cli =
            Cli::try_parse_from(["gitlab-issue-report", "group", "-g", "7", "--mine"]).unwrap();
        match cli.command {
            Commands::Group { group_id, flags } => {
                assert_eq!(group_id, 7);
                assert!(flags.mine);
            }
            _ => panic!("expected group command"),
        }
    }

    #[test]
    fn test_parse_whoami() {
        let cli = Cli::try_parse_from(["gitlab-issue-report", "whoami"]).unwrap();
        assert!(matches!(cli.command, Commands::Whoami));
    }
}
