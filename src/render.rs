//! Issue report rendering.
//!
//! Three output formats share the same escaping and truncation rules and
//! can optionally be annotated with project/group context.

use std::collections::HashMap;
use std::io::Write;

use anyhow::{Context, Result};
use comfy_table::{Cell, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};

use crate::gitlab::Issue;

/// Maximum title width for plain and table output.
const MAX_TITLE_WIDTH: usize = 70;

/// Narrower title width when a Project column is also shown.
const MAX_TITLE_WIDTH_WITH_PROJECT: usize = 30;

/// Width of the Project column in plain output.
const PROJECT_COLUMN_WIDTH: usize = 30;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Plain,
    Table,
    Markdown,
}

impl OutputFormat {
    /// Parse a `--format` flag value.
    pub fn from_flag(value: &str) -> Option<Self> {
        match value {
            "plain" => Some(Self::Plain),
            "table" => Some(Self::Table),
            "markdown" => Some(Self::Markdown),
            _ => None,
        }
    }

    /// Render the issues to the writer, optionally annotated with
    /// project or group context.
    pub fn render(
        self,
        issues: &[Issue],
        context: Option<&RenderContext>,
        writer: &mut dyn Write,
    ) -> Result<()> {
        match self {
            Self::Plain => render_plain(issues, context, writer),
            Self::Table => render_table(issues, context, writer),
            Self::Markdown => render_markdown(issues, context, writer),
        }
    }
}

/// Contextual annotation for a rendered report. Never mutates issue
/// data; only adds header and Project column information.
#[derive(Debug, Clone)]
pub enum RenderContext {
    /// Single-project query; path like "namespace/project".
    Project { path: String },

    /// Group query spanning multiple projects, with the resolved
    /// project-ID to path mapping.
    Group {
        path: String,
        project_paths: HashMap<u64, String>,
    },
}

impl RenderContext {
    fn header_line(&self) -> String {
        match self {
            Self::Project { path } => format!("Project: {path}"),
            Self::Group { path, .. } => format!("Group: {path}"),
        }
    }

    /// Group results span projects, so those reports get a Project
    /// column per row.
    fn has_project_column(&self) -> bool {
        matches!(self, Self::Group { .. })
    }

    fn project_label(&self, project_id: u64) -> String {
        match self {
            Self::Group { project_paths, .. } => project_paths
                .get(&project_id)
                .cloned()
                .unwrap_or_else(|| format!("ID:{project_id}")),
            Self::Project { .. } => String::new(),
        }
    }
}

fn render_plain(
    issues: &[Issue],
    context: Option<&RenderContext>,
    writer: &mut dyn Write,
) -> Result<()> {
    if let Some(ctx) = context {
        writeln!(writer, "{}", ctx.header_line()).context("failed to write report header")?;
    }

    if let Some(ctx) = context.filter(|c| c.has_project_column()) {
        writeln!(
            writer,
            "{:<pw$} {:<tw$} {:>10} {:<12} {:<12}",
            "Project",
            "Title",
            "State",
            "Created At",
            "Updated At",
            pw = PROJECT_COLUMN_WIDTH,
            tw = MAX_TITLE_WIDTH_WITH_PROJECT,
        )
        .context("failed to write header")?;
        for issue in issues {
            writeln!(
                writer,
                "{:<pw$} {:<tw$} {:>10} {:<12} {:<12}",
                truncate(&ctx.project_label(issue.project_id), PROJECT_COLUMN_WIDTH),
                truncate(&issue.title, MAX_TITLE_WIDTH_WITH_PROJECT),
                issue.state,
                issue.created_at.format(DATE_FORMAT),
                issue.updated_at.format(DATE_FORMAT),
                pw = PROJECT_COLUMN_WIDTH,
                tw = MAX_TITLE_WIDTH_WITH_PROJECT,
            )
            .context("failed to write issue")?;
        }
    } else {
        writeln!(
            writer,
            "{:<tw$} {:>10} {:<12} {:<12}",
            "Title",
            "State",
            "Created At",
            "Updated At",
            tw = MAX_TITLE_WIDTH,
        )
        .context("failed to write header")?;
        for issue in issues {
            writeln!(
                writer,
                "{:<tw$} {:>10} {:<12} {:<12}",
                truncate(&issue.title, MAX_TITLE_WIDTH),
                issue.state,
                issue.created_at.format(DATE_FORMAT),
                issue.updated_at.format(DATE_FORMAT),
                tw = MAX_TITLE_WIDTH,
            )
            .context("failed to write issue")?;
        }
    }
    Ok(())
}

fn render_table(
    issues: &[Issue],
    context: Option<&RenderContext>,
    writer: &mut dyn Write,
) -> Result<()> {
    if let Some(ctx) = context {
        writeln!(writer, "{}", ctx.header_line()).context("failed to write report header")?;
    }

    let with_project = context.is_some_and(RenderContext::has_project_column);
    let title_width = if with_project {
        MAX_TITLE_WIDTH_WITH_PROJECT
    } else {
        MAX_TITLE_WIDTH
    };

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    if with_project {
        table.set_header(vec!["Project", "Title", "State", "CreatedAt", "UpdatedAt"]);
    } else {
        table.set_header(vec!["Title", "State", "CreatedAt", "UpdatedAt"]);
    }

    for issue in issues {
        let mut row = Vec::new();
        if let Some(ctx) = context.filter(|c| c.has_project_column()) {
            row.push(Cell::new(ctx.project_label(issue.project_id)));
        }
        row.push(Cell::new(truncate(&issue.title, title_width)));
        row.push(Cell::new(&issue.state));
        row.push(Cell::new(issue.created_at.format(DATE_FORMAT)));
        row.push(Cell::new(issue.updated_at.format(DATE_FORMAT)));
        table.add_row(row);
    }

    writeln!(writer, "{table}").context("failed to render table")
}

fn render_markdown(
    issues: &[Issue],
    context: Option<&RenderContext>,
    writer: &mut dyn Write,
) -> Result<()> {
    let title = match context {
        None => "# GitLab Issues Report".to_string(),
        Some(RenderContext::Project { path }) => format!("# GitLab Issues Report: {path}"),
        Some(RenderContext::Group { path, .. }) => format!("# GitLab Issues Report: {path}"),
    };

    if issues.is_empty() {
        writeln!(writer, "{title}\n\nNo issues found.")
            .context("failed to write empty report")?;
        return Ok(());
    }

    writeln!(writer, "{title}\n").context("failed to write title")?;

    let with_project = context.is_some_and(RenderContext::has_project_column);
    if with_project {
        writeln!(writer, "| Project | Title | State | Created At | Updated At |")
            .context("failed to write table header")?;
        writeln!(writer, "|---------|-------|-------|------------|------------|")
            .context("failed to write table separator")?;
    } else {
        writeln!(writer, "| Title | State | Created At | Updated At |")
            .context("failed to write table header")?;
        writeln!(writer, "|-------|-------|------------|------------|")
            .context("failed to write table separator")?;
    }

    for issue in issues {
        let title = escape_markdown(&issue.title);
        let created = issue.created_at.format(DATE_FORMAT);
        let updated = issue.updated_at.format(DATE_FORMAT);
        if let Some(ctx) = context.filter(|c| c.has_project_column()) {
            writeln!(
                writer,
                "| {} | {} | {} | {} | {} |",
                escape_markdown(&ctx.project_label(issue.project_id)),
                title,
                issue.state,
                created,
                updated,
            )
            .context("failed to write issue row")?;
        } else {
            writeln!(
                writer,
                "| {title} | {} | {created} | {updated} |",
                issue.state
            )
            .context("failed to write issue row")?;
        }
    }
    Ok(())
}

/// Escape pipes for Markdown table cells and flatten line breaks to
/// spaces. Escaping is applied to titles only and is idempotent: an
/// already escaped pipe is left untouched.
fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    let mut prev = '\0';
    for c in text.chars() {
        match c {
            '|' if prev != '\\' => escaped.push_str("\\|"),
            '\n' | '\r' => escaped.push(' '),
            _ => escaped.push(c),
        }
        prev = c;
    }
    escaped
}

/// Truncate to `width` characters; a zero width never truncates, and a
/// string of exactly `width` characters is returned unchanged.
fn truncate(text: &str, width: usize) -> String {
    if width == 0 || text.chars().count() <= width {
        return text.to_string();
    }
    text.chars().take(width).collect()
}
