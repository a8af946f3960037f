use crate::utils::error::{ArchiverError, Result};
use crate::utils::validation::Validate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fallback for statuses whose category carries no colour.
pub const DEFAULT_STATUS_COLOR: &str = "#0052cc";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    pub tracker_base_url: String,
    pub auth_token: String,
    pub query: String,
}

/// Body of `POST /api/export`. Fields are optional on the wire so that
/// absent and `null` values both surface as missing parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportPayload {
    #[serde(default)]
    pub jira_url: Option<String>,
    #[serde(default)]
    pub jira_cookie: Option<String>,
    #[serde(default)]
    pub jql: Option<String>,
}

impl TryFrom<ExportPayload> for ExportRequest {
    type Error = ArchiverError;

    fn try_from(payload: ExportPayload) -> Result<Self> {
        let request = ExportRequest {
            tracker_base_url: payload.jira_url.unwrap_or_default(),
            auth_token: payload.jira_cookie.unwrap_or_default(),
            query: payload.jql.unwrap_or_default(),
        };
        request.validate()?;
        Ok(request)
    }
}

impl Validate for ExportRequest {
    fn validate(&self) -> Result<()> {
        let fields = [
            ("jiraUrl", &self.tracker_base_url),
            ("jiraCookie", &self.auth_token),
            ("jql", &self.query),
        ];
        let missing: Vec<String> = fields
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| name.to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ArchiverError::MissingParameters { fields: missing })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueStatus {
    pub name: String,
    pub category_color: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub key: String,
    pub summary: String,
    pub status: IssueStatus,
    pub priority: Option<String>,
    pub issue_type: String,
    pub reporter: Option<String>,
    pub assignee: Option<String>,
    pub project: String,
    pub created: String,
    pub updated: String,
    pub description: Option<String>,
}

impl Issue {
    /// Archive entry name for the issue page. Characters outside
    /// `[A-Za-z0-9_-]` become `_`, so the entry always sits at the archive root.
    pub fn page_name(&self) -> String {
        let stem: String = self
            .key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        format!("{}.html", stem)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub author: String,
    pub created: String,
    pub body: String,
}

// ---- Jira REST v2 wire shapes ----

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub issues: Vec<RawIssue>,
    #[serde(default)]
    pub total: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentsResponse {
    #[serde(default)]
    pub comments: Vec<RawComment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawIssue {
    pub key: String,
    #[serde(default)]
    pub fields: RawFields,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFields {
    pub summary: Option<String>,
    pub status: Option<RawStatus>,
    pub priority: Option<NamedEntity>,
    #[serde(rename = "issuetype")]
    pub issue_type: Option<NamedEntity>,
    pub reporter: Option<RawUser>,
    pub assignee: Option<RawUser>,
    pub project: Option<NamedEntity>,
    pub created: Option<String>,
    pub updated: Option<String>,
    #[serde(default)]
    pub description: Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStatus {
    pub name: Option<String>,
    pub status_category: Option<RawStatusCategory>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStatusCategory {
    pub color_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamedEntity {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawUser {
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawComment {
    pub author: Option<RawUser>,
    pub created: Option<String>,
    #[serde(default)]
    pub body: Value,
}

/// Rich text arrives either as wiki/HTML markup (v2) or as a document
/// object (v3); objects are kept as their JSON text.
fn rich_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) if text.is_empty() => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    }
}

fn entity_name(entity: Option<NamedEntity>) -> Option<String> {
    entity.and_then(|e| e.name)
}

fn display_name(user: Option<RawUser>) -> Option<String> {
    user.and_then(|u| u.display_name)
}

impl From<RawIssue> for Issue {
    fn from(raw: RawIssue) -> Self {
        let fields = raw.fields;
        let status = match fields.status {
            Some(status) => IssueStatus {
                name: status.name.unwrap_or_else(|| "Unknown".to_string()),
                category_color: status
                    .status_category
                    .and_then(|c| c.color_name)
                    .unwrap_or_else(|| DEFAULT_STATUS_COLOR.to_string()),
            },
            None => IssueStatus {
                name: "Unknown".to_string(),
                category_color: DEFAULT_STATUS_COLOR.to_string(),
            },
        };

        Issue {
            key: raw.key,
            summary: fields.summary.unwrap_or_else(|| "No summary".to_string()),
            status,
            priority: entity_name(fields.priority),
            issue_type: entity_name(fields.issue_type).unwrap_or_else(|| "Unknown".to_string()),
            reporter: display_name(fields.reporter),
            assignee: display_name(fields.assignee),
            project: entity_name(fields.project).unwrap_or_else(|| "Unknown".to_string()),
            created: fields.created.unwrap_or_default(),
            updated: fields.updated.unwrap_or_default(),
            description: rich_text(fields.description),
        }
    }
}

impl From<RawComment> for Comment {
    fn from(raw: RawComment) -> Self {
        Comment {
            author: display_name(raw.author).unwrap_or_else(|| "Unknown".to_string()),
            created: raw.created.unwrap_or_default(),
            body: rich_text(raw.body).unwrap_or_default(),
        }
    }
}
