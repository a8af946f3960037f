//! Client for the tracker's REST v2 search / issue / comment endpoints.

use crate::domain::model::{
    Comment, CommentsResponse, ExportRequest, Issue, RawIssue, SearchResponse,
};
use crate::domain::ports::IssueSource;
use crate::utils::error::{ArchiverError, Result};
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, COOKIE};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

pub const DEFAULT_MAX_RESULTS: u32 = 1000;

/// Remote error bodies are often full HTML login pages.
const MAX_ERROR_BODY_CHARS: usize = 500;

pub fn build_http_client(timeout: Duration) -> Result<Client> {
    let client = Client::builder()
        .timeout(timeout)
        .user_agent(concat!("jira-archiver/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

/// One client per export request; the underlying `reqwest::Client` is
/// shared so connections are pooled across requests.
#[derive(Clone)]
pub struct JiraClient {
    http: Client,
    base_url: String,
    cookie: String,
    max_results: u32,
}

impl JiraClient {
    pub fn new(http: Client, base_url: &str, cookie: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            cookie: cookie.to_string(),
            max_results: DEFAULT_MAX_RESULTS,
        }
    }

    pub fn for_request(http: Client, request: &ExportRequest, max_results: u32) -> Self {
        Self::new(http, &request.tracker_base_url, &request.auth_token).with_max_results(max_results)
    }

    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Base URL plus path segments; each segment is percent-encoded, so an
    /// issue key can never add path levels.
    fn endpoint(&self, segments: &[&str]) -> std::result::Result<Url, String> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| format!("Invalid tracker URL {}: {}", self.base_url, e))?;
        url.path_segments_mut()
            .map_err(|_| format!("Invalid tracker URL {}: cannot be a base", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> std::result::Result<T, String>
    where
        T: DeserializeOwned,
    {
        let url = self.endpoint(segments)?;
        tracing::debug!("Making API request to: {}", url);

        let response = self
            .http
            .get(url)
            .query(query)
            .header(COOKIE, &self.cookie)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        tracing::debug!("API response status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body: String = body.trim().chars().take(MAX_ERROR_BODY_CHARS).collect();
            return Err(if body.is_empty() {
                format!("HTTP {}", status)
            } else {
                format!("HTTP {}: {}", status, body)
            });
        }

        response.json::<T>().await.map_err(|e| e.to_string())
    }

    pub async fn search_issues(&self, jql: &str) -> Result<Vec<Issue>> {
        let query = [
            ("jql", jql.to_string()),
            ("maxResults", self.max_results.to_string()),
            ("fields", "*all".to_string()),
        ];
        let response: SearchResponse = self
            .get_json(&["rest", "api", "2", "search"], &query)
            .await
            .map_err(|message| ArchiverError::SourceUnavailable { message })?;

        let returned = response.issues.len();
        if let Some(total) = response.total {
            if total > returned as u64 {
                tracing::warn!(
                    "⚠️ Search matched {} issues, only the first {} are exported",
                    total,
                    returned
                );
            }
        }

        Ok(response.issues.into_iter().map(Issue::from).collect())
    }

    pub async fn get_issue(&self, issue_key: &str) -> Result<Issue> {
        let raw: RawIssue = self
            .get_json(
                &["rest", "api", "2", "issue", issue_key],
                &[("fields", "*all".to_string())],
            )
            .await
            .map_err(|message| ArchiverError::IssueFetchFailed {
                issue_key: issue_key.to_string(),
                message,
            })?;
        Ok(Issue::from(raw))
    }

    pub async fn get_issue_comments(&self, issue_key: &str) -> Result<Vec<Comment>> {
        let response: CommentsResponse = self
            .get_json(&["rest", "api", "2", "issue", issue_key, "comment"], &[])
            .await
            .map_err(|message| ArchiverError::CommentFetchFailed {
                issue_key: issue_key.to_string(),
                message,
            })?;
        Ok(response.comments.into_iter().map(Comment::from).collect())
    }
}

#[async_trait]
impl IssueSource for JiraClient {
    async fn search(&self, query: &str) -> Result<Vec<Issue>> {
        self.search_issues(query).await
    }

    async fn get_comments(&self, issue_key: &str) -> Result<Vec<Comment>> {
        self.get_issue_comments(issue_key).await
    }
}
