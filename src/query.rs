//! Issue query composition.
//!
//! User intent is translated into an ordered list of filter directives,
//! which are then folded into an [`IssueQuery`]. The query re-validates
//! its scope before any fetch as a backstop for the CLI layer.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Scope validation errors, detected at fetch time even though the CLI
/// layer should prevent them.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum QueryError {
    #[error("project ID or group ID must be set")]
    MissingScopeId,

    #[error("project ID and group ID cannot be set at the same time")]
    ConflictingScopeId,
}

/// Issue state filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IssueState {
    Opened,
    Closed,
    #[default]
    All,
}

impl IssueState {
    /// Parse a `--state` flag value.
    pub fn from_flag(value: &str) -> Option<Self> {
        match value {
            "opened" => Some(Self::Opened),
            "closed" => Some(Self::Closed),
            "all" => Some(Self::All),
            _ => None,
        }
    }

    /// Query-parameter value. `All` is the server default and maps to no
    /// parameter at all.
    pub fn as_param(self) -> Option<&'static str> {
        match self {
            Self::Opened => Some("opened"),
            Self::Closed => Some("closed"),
            Self::All => None,
        }
    }
}

/// Inclusive date range; an unset bound is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub after: Option<DateTime<Utc>>,
    pub before: Option<DateTime<Utc>>,
}

/// A single filter directive emitted by the option builder.
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    ForProject(u64),
    ForGroup(u64),
    CreatedBetween(DateRange),
    UpdatedBetween(DateRange),
    WithState(IssueState),
    AssignedTo(String),
}

/// Which API resource scope a query targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Project(u64),
    Group(u64),
}

/// Accumulated filter state for one fetch operation.
///
/// Constructed fresh per invocation via [`IssueQuery::from_directives`];
/// immutable once fetching begins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IssueQuery {
    pub project_id: u64,
    pub group_id: u64,
    pub state: IssueState,
    pub created: Option<DateRange>,
    pub updated: Option<DateRange>,
    pub assignee: Option<String>,
}

impl IssueQuery {
    /// Fold directives into a validated query.
    pub fn from_directives(directives: Vec<Directive>) -> Result<Self, QueryError> {
        let mut query = Self::default();
        for directive in directives {
            query.apply(directive);
        }
        query.validate()?;
        Ok(query)
    }

    fn apply(&mut self, directive: Directive) {
        match directive {
            Directive::ForProject(id) => self.project_id = id,
            Directive::ForGroup(id) => self.group_id = id,
            Directive::CreatedBetween(range) => self.created = Some(range),
            Directive::UpdatedBetween(range) => self.updated = Some(range),
            Directive::WithState(state) => self.state = state,
            Directive::AssignedTo(username) => self.assignee = Some(username),
        }
    }

    /// Exactly one of project ID / group ID must be set.
    pub fn validate(&self) -> Result<(), QueryError> {
        self.scope().map(|_| ())
    }

    pub fn scope(&self) -> Result<Scope, QueryError> {
        match (self.project_id, self.group_id) {
            (0, 0) => Err(QueryError::MissingScopeId),
            (p, 0) => Ok(Scope::Project(p)),
            (0, g) => Ok(Scope::Group(g)),
            _ => Err(QueryError::ConflictingScopeId),
        }
    }
}

/// Raw filter intent for one report invocation, as collected from the CLI.
#[derive(Debug, Clone, Default)]
pub struct FilterParams {
    pub project_id: u64,
    pub group_id: u64,
    pub begin: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub created: bool,
    pub updated: bool,
    pub state: IssueState,
    pub mine: bool,
}

/// Build the ordered directive list for a report.
///
/// `current_username` is only invoked when the mine flag is set; its
/// failure is a hard error, a fetch never proceeds without a resolved
/// username when one was requested.
pub fn build_directives<F>(params: &FilterParams, current_username: F) -> Result<Vec<Directive>>
where
    F: FnOnce() -> Result<String>,
{
    let mut directives = Vec::new();

    if params.project_id != 0 {
        directives.push(Directive::ForProject(params.project_id));
    } else if params.group_id != 0 {
        directives.push(Directive::ForGroup(params.group_id));
    }

    if let Some(begin) = params.begin {
        let range = DateRange {
            after: Some(begin),
            before: params.end,
        };
        if params.created && !params.updated {
            directives.push(Directive::CreatedBetween(range));
        } else if !params.created {
            // Updated is the documented default when an interval is given
            // without an explicit --created/--updated choice.
            directives.push(Directive::UpdatedBetween(range));
        }
        // Both set is rejected by flag validation before we get here.
    }

    match params.state {
        IssueState::All => {}
        state => directives.push(Directive::WithState(state)),
    }

    if params.mine {
        let username =
            current_username().context("failed to resolve current user for --mine")?;
        directives.push(Directive::AssignedTo(username));
    }

    Ok(directives)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn no_user() -> Result<String> {
        panic!("current user lookup should not be called");
    }

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_state_from_flag() {
        assert_eq!(IssueState::from_flag("opened"), Some(IssueState::Opened));
        assert_eq!(IssueState::from_flag("closed"), Some(IssueState::Closed));
        assert_eq!(IssueState::from_flag("all"), Some(IssueState::All));
        assert_eq!(IssueState::from_flag("open"), None);
        assert_eq!(IssueState::from_flag("OPENED"), None);
    }

    #[test]
    fn test_state_all_has_no_param() {
        assert_eq!(IssueState::All.as_param(), None);
        assert_eq!(IssueState::Opened.as_param(), Some("opened"));
        assert_eq!(IssueState::Closed.as_param(), Some("closed"));
    }

    #[test]
    fn test_build_directives_project_scope() {
        let params = FilterParams {
            project_id: 42,
            ..Default::default()
        };
        let directives = build_directives(&params, no_user).unwrap();
        assert_eq!(directives, vec![Directive::ForProject(42)]);
    }

    #[test]
    fn test_build_directives_group_scope() {
        let params = FilterParams {
            group_id: 7,
            ..Default::default()
        };
        let directives = build_directives(&params, no_user).unwrap();
        assert_eq!(directives, vec![Directive::ForGroup(7)]);
    }

    #[test]
    fn test_build_directives_never_two_scopes() {
        let params = FilterParams {
            project_id: 42,
            group_id: 7,
            ..Default::default()
        };
        let directives = build_directives(&params, no_user).unwrap();
        let scopes = directives
            .iter()
            .filter(|d| matches!(d, Directive::ForProject(_) | Directive::ForGroup(_)))
            .count();
        assert_eq!(scopes, 1);
        assert_eq!(directives[0], Directive::ForProject(42));
    }

    #[test]
    fn test_build_directives_state_all_emits_nothing() {
        let params = FilterParams {
            project_id: 1,
            state: IssueState::All,
            ..Default::default()
        };
        let directives = build_directives(&params, no_user).unwrap();
        assert!(!directives
            .iter()
            .any(|d| matches!(d, Directive::WithState(_))));
    }

    #[test]
    fn test_build_directives_opened_state() {
        let params = FilterParams {
            project_id: 1,
            state: IssueState::Opened,
            ..Default::default()
        };
        let directives = build_directives(&params, no_user).unwrap();
        assert!(directives.contains(&Directive::WithState(IssueState::Opened)));
    }

    #[test]
    fn test_build_directives_created_filter() {
        let params = FilterParams {
            project_id: 1,
            begin: Some(utc(2024, 1, 1)),
            end: Some(utc(2024, 1, 31)),
            created: true,
            ..Default::default()
        };
        let directives = build_directives(&params, no_user).unwrap();
        assert!(directives
            .iter()
            .any(|d| matches!(d, Directive::CreatedBetween(_))));
        assert!(!directives
            .iter()
            .any(|d| matches!(d, Directive::UpdatedBetween(_))));
    }

    #[test]
    fn test_build_directives_defaults_to_updated() {
        // Interval given, neither --created nor --updated.
        let params = FilterParams {
            project_id: 1,
            begin: Some(utc(2024, 1, 1)),
            end: Some(utc(2024, 1, 31)),
            ..Default::default()
        };
        let directives = build_directives(&params, no_user).unwrap();
        assert!(directives
            .iter()
            .any(|d| matches!(d, Directive::UpdatedBetween(_))));
    }

    #[test]
    fn test_build_directives_no_interval_no_date_directive() {
        let params = FilterParams {
            project_id: 1,
            ..Default::default()
        };
        let directives = build_directives(&params, no_user).unwrap();
        assert!(!directives.iter().any(|d| matches!(
            d,
            Directive::CreatedBetween(_) | Directive::UpdatedBetween(_)
        )));
    }

    #[test]
    fn test_build_directives_mine_resolves_user() {
        let params = FilterParams {
            project_id: 1,
            mine: true,
            ..Default::default()
        };
        let directives =
            build_directives(&params, || Ok("alice".to_string())).unwrap();
        assert!(directives.contains(&Directive::AssignedTo("alice".to_string())));
    }

    #[test]
    fn test_build_directives_mine_lookup_failure_is_fatal() {
        let params = FilterParams {
            project_id: 1,
            mine: true,
            ..Default::default()
        };
        let result = build_directives(&params, || Err(anyhow::anyhow!("network error")));
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("failed to resolve current user"));
    }

    #[test]
    fn test_query_missing_scope() {
        let query = IssueQuery::default();
        assert_eq!(query.validate(), Err(QueryError::MissingScopeId));
    }

    #[test]
    fn test_query_conflicting_scope() {
        let query = IssueQuery {
            project_id: 1,
            group_id: 2,
            ..Default::default()
        };
        assert_eq!(query.validate(), Err(QueryError::ConflictingScopeId));
    }

    #[test]
    fn test_query_from_directives() {
        let range = DateRange {
            after: Some(utc(2024, 1, 1)),
            before: Some(utc(2024, 1, 31)),
        };
        let query = IssueQuery::from_directives(vec![
            Directive::ForProject(42),
            Directive::UpdatedBetween(range),
            Directive::WithState(IssueState::Opened),
            Directive::AssignedTo("bob".to_string()),
        ])
        .unwrap();

        assert_eq!(query.scope(), Ok(Scope::Project(42)));
        assert_eq!(query.updated, Some(range));
        assert!(query.created.is_none());
        assert_eq!(query.state, IssueState::Opened);
        assert_eq!(query.assignee.as_deref(), Some("bob"));
    }

    #[test]
    fn test_query_from_directives_rejects_empty() {
        let result = IssueQuery::from_directives(vec![Directive::WithState(
            IssueState::Closed,
        )]);
        assert_eq!(result.unwrap_err(), QueryError::MissingScopeId);
    }

    #[test]
    fn test_query_from_directives_rejects_both_scopes() {
        let result = IssueQuery::from_directives(vec![
            Directive::ForProject(1),
            Directive::ForGroup(2),
        ]);
        assert_eq!(result.unwrap_err(), QueryError::ConflictingScopeId);
    }
}
