//! HTML generation for the archive.
//!
//! Both pages are self-contained: inline CSS, inline script, no external
//! assets. Plain-text fields are escaped; description and comment bodies are
//! rich text from the tracker and are inserted as-is so their markup survives.

use crate::domain::model::{Comment, Issue};
use chrono::{DateTime, FixedOffset};

pub const INDEX_PAGE_NAME: &str = "index.html";

/// Badge colour for missing or unrecognised priorities.
pub const DEFAULT_PRIORITY_COLOR: &str = "#ff5722";

const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

const ISSUE_STYLES: &str = r#"
        body { font-family: Arial, sans-serif; margin: 20px; line-height: 1.6; }
        .issue-header { background: #f5f5f5; padding: 20px; border-radius: 5px; margin-bottom: 20px; }
        .issue-key { font-size: 24px; font-weight: bold; color: #0052cc; }
        .issue-summary { font-size: 18px; margin: 10px 0; }
        .issue-details { display: grid; grid-template-columns: 1fr 1fr; gap: 20px; margin-bottom: 20px; }
        .detail-group { background: #f9f9f9; padding: 15px; border-radius: 5px; }
        .detail-label { font-weight: bold; color: #333; }
        .detail-value { margin-top: 5px; }
        .description { background: #fff; padding: 20px; border: 1px solid #ddd; border-radius: 5px; margin-bottom: 20px; }
        .comments-section { background: #fff; padding: 20px; border: 1px solid #ddd; border-radius: 5px; }
        .comment { background: #f9f9f9; padding: 15px; margin-bottom: 10px; border-radius: 5px; }
        .comment-author { font-weight: bold; color: #0052cc; }
        .comment-date { color: #666; font-size: 0.9em; }
        .comment-body { margin-top: 10px; }
        .status { padding: 5px 10px; border-radius: 3px; color: white; font-weight: bold; }
        .priority { padding: 5px 10px; border-radius: 3px; color: white; font-weight: bold; }
"#;

const INDEX_STYLES: &str = r#"
        body { font-family: Arial, sans-serif; margin: 20px; }
        .header { background: #0052cc; color: white; padding: 20px; border-radius: 5px; margin-bottom: 20px; }
        .search-box { margin-bottom: 20px; }
        .search-box input { width: 300px; padding: 10px; border: 1px solid #ddd; border-radius: 3px; }
        .issues-table { width: 100%; border-collapse: collapse; }
        .issues-table th, .issues-table td { padding: 10px; text-align: left; border-bottom: 1px solid #ddd; }
        .issues-table th { background: #f5f5f5; }
        .issues-table tr:hover { background: #f9f9f9; }
        .issue-key { color: #0052cc; text-decoration: none; font-weight: bold; }
        .issue-key:hover { text-decoration: underline; }
        .status { padding: 5px 10px; border-radius: 3px; color: white; font-weight: bold; }
        .priority { padding: 5px 10px; border-radius: 3px; color: white; font-weight: bold; }
"#;

const FILTER_SCRIPT: &str = r#"
        function filterIssues() {
            const input = document.getElementById('searchInput');
            const filter = input.value.toLowerCase();
            const table = document.getElementById('issuesTable');
            const rows = table.getElementsByTagName('tr');

            for (let i = 1; i < rows.length; i++) {
                const cells = rows[i].getElementsByTagName('td');
                let found = false;

                for (let j = 0; j < cells.length; j++) {
                    if (cells[j].textContent.toLowerCase().includes(filter)) {
                        found = true;
                        break;
                    }
                }

                rows[i].style.display = found ? '' : 'none';
            }
        }
"#;

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Parses RFC 3339 as well as Jira's `2024-01-01T00:00:00.000+0000`.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .ok()
}

fn format_timestamp(raw: &str, format: &str) -> String {
    if raw.trim().is_empty() {
        return "Unknown".to_string();
    }
    match parse_timestamp(raw) {
        Some(timestamp) => timestamp.format(format).to_string(),
        None => raw.to_string(),
    }
}

pub fn format_date_time(raw: &str) -> String {
    format_timestamp(raw, DATE_TIME_FORMAT)
}

pub fn format_date(raw: &str) -> String {
    format_timestamp(raw, DATE_FORMAT)
}

pub fn priority_label(priority: Option<&str>) -> &str {
    priority.unwrap_or("None")
}

pub fn priority_color(priority: Option<&str>) -> &'static str {
    match priority.map(|p| p.to_ascii_lowercase()).as_deref() {
        Some("blocker" | "highest" | "critical") => "#de350b",
        Some("high" | "major") => "#ff7452",
        Some("medium") => "#ffab00",
        Some("low" | "minor") => "#36b37e",
        Some("lowest" | "trivial") => "#97a0af",
        _ => DEFAULT_PRIORITY_COLOR,
    }
}

fn reporter_label(issue: &Issue) -> &str {
    issue.reporter.as_deref().unwrap_or("Unknown")
}

fn assignee_label(issue: &Issue) -> &str {
    issue.assignee.as_deref().unwrap_or("Unassigned")
}

fn status_badge(issue: &Issue) -> String {
    format!(
        r#"<span class="status" style="background-color: {color}">{name}</span>"#,
        color = html_escape(&issue.status.category_color),
        name = html_escape(&issue.status.name),
    )
}

fn priority_badge(issue: &Issue) -> String {
    let priority = issue.priority.as_deref();
    format!(
        r#"<span class="priority" style="background-color: {color}">{name}</span>"#,
        color = priority_color(priority),
        name = html_escape(priority_label(priority)),
    )
}

fn detail_group(label: &str, value: &str) -> String {
    format!(
        r#"
        <div class="detail-group">
            <div class="detail-label">{label}:</div>
            <div class="detail-value">{value}</div>
        </div>"#
    )
}

fn render_comments(comments: &[Comment]) -> String {
    if comments.is_empty() {
        return String::new();
    }

    let items: String = comments
        .iter()
        .map(|comment| {
            format!(
                r#"
        <div class="comment">
            <div class="comment-author">{author}</div>
            <div class="comment-date">{date}</div>
            <div class="comment-body">{body}</div>
        </div>"#,
                author = html_escape(&comment.author),
                date = html_escape(&format_date_time(&comment.created)),
                body = comment.body,
            )
        })
        .collect();

    format!(
        r#"
    <div class="comments-section">
        <h3>Comments</h3>{items}
    </div>"#
    )
}

fn render_description(description: Option<&str>) -> String {
    match description {
        Some(text) if !text.is_empty() => format!(
            r#"
    <div class="description">
        <h3>Description</h3>
        <div>{text}</div>
    </div>"#
        ),
        _ => String::new(),
    }
}

pub fn render_issue_page(issue: &Issue, comments: &[Comment]) -> String {
    let key = html_escape(&issue.key);
    let summary = html_escape(&issue.summary);

    let details = [
        detail_group("Status", &status_badge(issue)),
        detail_group("Priority", &priority_badge(issue)),
        detail_group("Issue Type", &html_escape(&issue.issue_type)),
        detail_group("Reporter", &html_escape(reporter_label(issue))),
        detail_group("Assignee", &html_escape(assignee_label(issue))),
        detail_group("Created", &html_escape(&format_date_time(&issue.created))),
        detail_group("Updated", &html_escape(&format_date_time(&issue.updated))),
        detail_group("Project", &html_escape(&issue.project)),
    ]
    .concat();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{key} - {summary}</title>
    <style>{styles}    </style>
</head>
<body>
    <div class="issue-header">
        <div class="issue-key">{key}</div>
        <div class="issue-summary">{summary}</div>
    </div>

    <div class="issue-details">{details}
    </div>
{description}{comments}
</body>
</html>
"#,
        styles = ISSUE_STYLES,
        description = render_description(issue.description.as_deref()),
        comments = render_comments(comments),
    )
}

fn index_row(issue: &Issue) -> String {
    let key = html_escape(&issue.key);
    format!(
        r#"
            <tr>
                <td><a href="{page}" class="issue-key">{key}</a></td>
                <td>{summary}</td>
                <td>{status}</td>
                <td>{priority}</td>
                <td>{assignee}</td>
                <td>{created}</td>
                <td>{updated}</td>
            </tr>"#,
        page = html_escape(&issue.page_name()),
        summary = html_escape(&issue.summary),
        status = status_badge(issue),
        priority = priority_badge(issue),
        assignee = html_escape(assignee_label(issue)),
        created = html_escape(&format_date(&issue.created)),
        updated = html_escape(&format_date(&issue.updated)),
    )
}

pub fn render_index_page(issues: &[Issue]) -> String {
    let rows: String = issues.iter().map(index_row).collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Jira Issues Archive</title>
    <style>{styles}    </style>
</head>
<body>
    <div class="header">
        <h1>Jira Issues Archive</h1>
        <p>Total Issues: {count}</p>
    </div>

    <div class="search-box">
        <input type="text" id="searchInput" placeholder="Search by issue key, summary, or assignee..." onkeyup="filterIssues()">
    </div>

    <table class="issues-table" id="issuesTable">
        <thead>
            <tr>
                <th>Key</th>
                <th>Summary</th>
                <th>Status</th>
                <th>Priority</th>
                <th>Assignee</th>
                <th>Created</th>
                <th>Updated</th>
            </tr>
        </thead>
        <tbody>{rows}
        </tbody>
    </table>

    <script>{script}    </script>
</body>
</html>
"#,
        styles = INDEX_STYLES,
        count = issues.len(),
        script = FILTER_SCRIPT,
    )
}
