//! GitLab REST API client.
//!
//! Provides paginated issue retrieval for projects and groups plus the
//! metadata lookups used to annotate reports.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Utc};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Deserialize;
use tracing::{debug, warn};

#[cfg(test)]
use mockall::automock;

use crate::config::Settings;
use crate::query::{IssueQuery, Scope};

/// Page size for paginated API requests.
const PER_PAGE: u32 = 100;

/// A single issue, reduced to the fields the tool displays.
#[derive(Debug, Clone, Deserialize)]
pub struct Issue {
    /// Global issue ID
    pub id: u64,

    /// ID of the project the issue belongs to
    pub project_id: u64,

    /// Issue title
    pub title: String,

    /// Issue state ("opened" or "closed")
    pub state: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last-update timestamp
    pub updated_at: DateTime<Utc>,
}

/// The authenticated user, as returned by `GET /user`.
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    /// Numeric user ID
    pub id: u64,

    /// Login name
    pub username: String,

    /// Display name
    pub name: String,

    /// Primary email (may be hidden by the instance)
    #[serde(default)]
    pub email: Option<String>,
}

/// Project fields used for path resolution and remote matching.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectSummary {
    /// Numeric project ID
    pub id: u64,

    /// Namespaced path, e.g. "group/project"
    pub path_with_namespace: String,

    /// SSH clone URL
    #[serde(default)]
    pub ssh_url_to_repo: String,

    /// HTTP clone URL
    #[serde(default)]
    pub http_url_to_repo: String,
}

#[derive(Debug, Clone, Deserialize)]
struct GroupSummary {
    full_path: String,
}

/// One page of an issue listing plus the pagination cursor.
#[derive(Debug, Clone)]
pub struct IssuePage {
    pub issues: Vec<Issue>,

    /// Next page number from the `x-next-page` header; `None` on the
    /// last page.
    pub next_page: Option<u32>,
}

/// HTTP response abstraction for testing
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
    pub headers: Headers,
}

impl HttpResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// HTTP headers type
pub type Headers = Vec<(String, String)>;

/// Trait for HTTP operations (allows mocking)
#[cfg_attr(test, automock)]
pub trait HttpClient: Send + Sync {
    /// Send a GET request
    fn get(&self, url: &str, headers: Headers) -> Result<HttpResponse>;
}

/// Real HTTP client using ureq, with a per-request timeout.
pub struct UreqHttpClient {
    agent: ureq::Agent,
}

impl UreqHttpClient {
    pub fn with_timeout(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self { agent }
    }
}

impl HttpClient for UreqHttpClient {
    fn get(&self, url: &str, headers: Headers) -> Result<HttpResponse> {
        let mut request = self.agent.get(url);
        for (key, value) in &headers {
            request = request.set(key, value);
        }
        // Non-2xx responses surface as ureq::Error::Status; keep them as
        // plain responses so the caller decides how to report them.
        let response = match request.call() {
            Ok(response) => response,
            Err(ureq::Error::Status(_, response)) => response,
            Err(err) => return Err(err).context("HTTP GET failed"),
        };
        let status = response.status();
        let response_headers: Headers = response
            .headers_names()
            .into_iter()
            .filter_map(|name| {
                let value = response.header(&name)?.to_string();
                Some((name, value))
            })
            .collect();
        let body = response
            .into_string()
            .context("Failed to read response body")?;
        Ok(HttpResponse {
            status,
            body,
            headers: response_headers,
        })
    }
}

/// GitLab API client
pub struct GitLabClient<H: HttpClient = UreqHttpClient> {
    /// Instance base URL without trailing slash
    base_url: String,

    /// Private API token
    token: String,

    /// HTTP client
    http: H,
}

impl GitLabClient<UreqHttpClient> {
    /// Create a new client from environment settings.
    pub fn new(settings: &Settings, timeout: Duration) -> Self {
        Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            token: settings.token.clone(),
            http: UreqHttpClient::with_timeout(timeout),
        }
    }
}

impl<H: HttpClient> GitLabClient<H> {
    /// Create client with custom HTTP client (for testing)
    pub fn with_http_client(base_url: &str, token: &str, http: H) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            http,
        }
    }

    /// Build common headers for requests
    fn build_headers(&self) -> Headers {
        vec![
            ("Accept".to_string(), "application/json".to_string()),
            ("User-Agent".to_string(), "gitlab-issue-report".to_string()),
            ("PRIVATE-TOKEN".to_string(), self.token.clone()),
        ]
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api/v4/{}", self.base_url, path)
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.http.get(url, self.build_headers())?;
        if response.status >= 400 {
            bail!("GitLab API returned HTTP {}", response.status);
        }
        serde_json::from_str(&response.body).context("Failed to parse response")
    }

    /// Fetch all issues matching the query, following pagination to the
    /// last page.
    ///
    /// Any single page failure aborts the whole operation; no partial
    /// result is returned.
    pub fn fetch_issues(&self, query: &IssueQuery) -> Result<Vec<Issue>> {
        let scope = query.scope()?;
        let mut all_issues = Vec::new();
        let mut page = 1;
        loop {
            let issue_page =
                self.list_issues_page(query, scope, page).with_context(|| match scope {
                    Scope::Project(id) => {
                        format!("failed to list issues of project {id} (page {page})")
                    }
                    Scope::Group(id) => {
                        format!("failed to list issues of group {id} (page {page})")
                    }
                })?;
            all_issues.extend(issue_page.issues);
            match issue_page.next_page {
                Some(next) => page = next,
                None => break,
            }
        }
        debug!("fetched {} issues", all_issues.len());
        Ok(all_issues)
    }

    /// Fetch one page of the issue listing.
    fn list_issues_page(&self, query: &IssueQuery, scope: Scope, page: u32) -> Result<IssuePage> {
        let url = issues_url(&self.base_url, query, scope, page);
        debug!("GET {url}");
        let response = self.http.get(&url, self.build_headers())?;
        if response.status >= 400 {
            bail!("GitLab API returned HTTP {}", response.status);
        }
        let issues: Vec<Issue> =
            serde_json::from_str(&response.body).context("Failed to parse issues response")?;
        let next_page = response
            .header("x-next-page")
            .and_then(|value| value.trim().parse::<u32>().ok())
            .filter(|&page| page != 0);
        Ok(IssuePage { issues, next_page })
    }

    /// Resolve a project's namespaced path.
    pub fn project_path(&self, project_id: u64) -> Result<String> {
        let project: ProjectSummary = self
            .get_json(&self.api_url(&format!("projects/{project_id}")))
            .with_context(|| format!("failed to get project {project_id}"))?;
        Ok(project.path_with_namespace)
    }

    /// Resolve a group's full path.
    pub fn group_path(&self, group_id: u64) -> Result<String> {
        let group: GroupSummary = self
            .get_json(&self.api_url(&format!("groups/{group_id}")))
            .with_context(|| format!("failed to get group {group_id}"))?;
        Ok(group.full_path)
    }

    /// Resolve each distinct project referenced by the issues, once per
    /// project. Failed lookups are kept with an `ID:<n>` placeholder so
    /// the report still has a value for every row.
    pub fn project_paths_for_issues(&self, issues: &[Issue]) -> HashMap<u64, String> {
        let mut project_ids: Vec<u64> = issues.iter().map(|issue| issue.project_id).collect();
        project_ids.sort_unstable();
        project_ids.dedup();

        let mut paths = HashMap::new();
        for project_id in project_ids {
            match self.project_path(project_id) {
                Ok(path) => {
                    paths.insert(project_id, path);
                }
                Err(err) => {
                    warn!("Failed to fetch path for project {project_id}: {err:#}");
                    paths.insert(project_id, format!("ID:{project_id}"));
                }
            }
        }
        paths
    }

    /// Fetch the authenticated user.
    pub fn current_user(&self) -> Result<User> {
        self.get_json(&self.api_url("user"))
            .context("failed to fetch current user information")
    }

    /// Search projects by name.
    pub fn search_projects(&self, name: &str) -> Result<Vec<ProjectSummary>> {
        let encoded = utf8_percent_encode(name, NON_ALPHANUMERIC);
        let url = self.api_url(&format!("projects?search={encoded}&per_page={PER_PAGE}"));
        self.get_json(&url)
            .with_context(|| format!("failed to search for project '{name}'"))
    }

    /// Find the project whose repository URL matches the remote origin.
    pub fn find_project_by_remote(&self, remote_origin: &str) -> Result<ProjectSummary> {
        let name = crate::git_utils::project_name_from_url(remote_origin);
        debug!("searching for project '{name}'");
        let projects = self.search_projects(&name)?;
        projects
            .into_iter()
            .find(|project| {
                project.ssh_url_to_repo == remote_origin
                    || project.http_url_to_repo == remote_origin
            })
            .ok_or_else(|| anyhow!("no GitLab project matches remote origin {remote_origin}"))
    }

    /// Get the instance base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Build the URL for one page of an issue listing. Filters are static
/// for the whole query and identical on every page.
fn issues_url(base_url: &str, query: &IssueQuery, scope: Scope, page: u32) -> String {
    let path = match scope {
        Scope::Project(id) => format!("projects/{id}/issues"),
        Scope::Group(id) => format!("groups/{id}/issues"),
    };

    let mut params = vec![format!("per_page={PER_PAGE}"), format!("page={page}")];
    if let Some(state) = query.state.as_param() {
        params.push(format!("state={state}"));
    }
    if let Some(range) = &query.created {
        if let Some(after) = range.after {
            params.push(format!("created_after={}", format_api_time(after)));
        }
        if let Some(before) = range.before {
            params.push(format!("created_before={}", format_api_time(before)));
        }
    }
    if let Some(range) = &query.updated {
        if let Some(after) = range.after {
            params.push(format!("updated_after={}", format_api_time(after)));
        }
        if let Some(before) = range.before {
            params.push(format!("updated_before={}", format_api_time(before)));
        }
    }
    if let Some(assignee) = &query.assignee {
        params.push(format!("assignee_username={assignee}"));
    }

    format!("{base_url}/api/v4/{path}?{}", params.join("&"))
}

/// RFC3339 with a Z suffix, safe to embed in a query string.
fn format_api_time(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
