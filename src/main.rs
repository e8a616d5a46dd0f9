//! gitlab-issue-report entry point

use clap::Parser;
use gitlab_issue_report::cli::{Cli, Commands};
use gitlab_issue_report::commands;

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Project { project_id, flags } => commands::run_project(project_id, &flags),
        Commands::Group { group_id, flags } => commands::run_group(group_id, &flags),
        Commands::Whoami => commands::run_whoami(),
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    };

    if let Err(err) = result {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}
