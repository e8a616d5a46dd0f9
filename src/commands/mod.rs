//! Command implementations

pub mod group;
pub mod project;
pub mod whoami;

pub use group::run_group;
pub use project::run_project;
pub use whoami::run_whoami;

use anyhow::Result;

use crate::config::ReportConfig;
use crate::gitlab::{GitLabClient, HttpClient, Issue};
use crate::interval::parse_interval;
use crate::query::{FilterParams, IssueQuery, build_directives};

/// Shared fetch path for the project and group commands: parse the
/// interval, compose directives, and run the paginated fetch.
pub(crate) fn fetch_report_issues<H: HttpClient>(
    client: &GitLabClient<H>,
    config: &ReportConfig,
    project_id: u64,
    group_id: u64,
) -> Result<Vec<Issue>> {
    let (begin, end) = match &config.interval {
        Some(spec) => {
            let (begin, end) = parse_interval(spec)?;
            (Some(begin), Some(end))
        }
        None => (None, None),
    };

    let params = FilterParams {
        project_id,
        group_id,
        begin,
        end,
        created: config.created,
        updated: config.updated,
        state: config.state,
        mine: config.mine,
    };
    let directives = build_directives(&params, || {
        client.current_user().map(|user| user.username)
    })?;
    let query = IssueQuery::from_directives(directives)?;
    client.fetch_issues(&query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gitlab::{Headers, HttpResponse, MockHttpClient};
    use crate::query::IssueState;
    use std::time::Duration;

    fn report_config(interval: Option<&str>) -> ReportConfig {
        ReportConfig {
            interval: interval.map(String::from),
            created: false,
            updated: false,
            state: IssueState::All,
            format: crate::render::OutputFormat::Plain,
            mine: false,
            log_level: "error".to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    fn empty_page() -> HttpResponse {
        HttpResponse {
            status: 200,
            body: "[]".to_string(),
            headers: Headers::new(),
        }
    }

    #[test]
    fn test_fetch_report_issues_project() {
        let mut mock = MockHttpClient::new();
        mock.expect_get()
            .withf(|url: &str, _: &Headers| url.contains("/projects/42/issues"))
            .times(1)
            .returning(|_, _| Ok(empty_page()));

        let client = GitLabClient::with_http_client("https://gitlab.com", "token", mock);
        let issues = fetch_report_issues(&client, &report_config(None), 42, 0).unwrap();
        assert!(issues.is_empty());
    }

    #[test]
    fn test_fetch_report_issues_interval_becomes_updated_filter() {
        let mut mock = MockHttpClient::new();
        mock.expect_get()
            .withf(|url: &str, _: &Headers| {
                url.contains("updated_after=2024-01-01T00:00:00Z")
                    && url.contains("updated_before=2024-01-31T23:59:59Z")
            })
            .times(1)
            .returning(|_, _| Ok(empty_page()));

        let client = GitLabClient::with_http_client("https://gitlab.com", "token", mock);
        let config = report_config(Some("2024-01-01..2024-01-31"));
        fetch_report_issues(&client, &config, 42, 0).unwrap();
    }

    #[test]
    fn test_fetch_report_issues_created_filter() {
        let mut mock = MockHttpClient::new();
        mock.expect_get()
            .withf(|url: &str, _: &Headers| {
                url.contains("created_after=") && !url.contains("updated_after=")
            })
            .times(1)
            .returning(|_, _| Ok(empty_page()));

        let client = GitLabClient::with_http_client("https://gitlab.com", "token", mock);
        let mut config = report_config(Some("2024-01-01..2024-01-31"));
        config.created = true;
        fetch_report_issues(&client, &config, 42, 0).unwrap();
    }

    #[test]
    fn test_fetch_report_issues_bad_interval_fails_before_fetch() {
        let mock = MockHttpClient::new();
        let client = GitLabClient::with_http_client("https://gitlab.com", "token", mock);
        let config = report_config(Some("not-a-date"));
        assert!(fetch_report_issues(&client, &config, 42, 0).is_err());
    }

    #[test]
    fn test_fetch_report_issues_mine_resolves_user_first() {
        let mut mock = MockHttpClient::new();
        mock.expect_get()
            .withf(|url: &str, _: &Headers| url.ends_with("/api/v4/user"))
            .times(1)
            .returning(|_, _| {
                Ok(HttpResponse {
                    status: 200,
                    body: r#"{"id": 9, "username": "alice", "name": "Alice"}"#.to_string(),
                    headers: Headers::new(),
                })
            });
        mock.expect_get()
            .withf(|url: &str, _: &Headers| url.contains("assignee_username=alice"))
            .times(1)
            .returning(|_, _| Ok(empty_page()));

        let client = GitLabClient::with_http_client("https://gitlab.com", "token", mock);
        let mut config = report_config(None);
        config.mine = true;
        fetch_report_issues(&client, &config, 42, 0).unwrap();
    }
}
