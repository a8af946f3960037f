use httpmock::prelude::*;
use jira_archiver::core::IssueSource;
use jira_archiver::{ArchiverError, JiraClient};
use serde_json::json;

fn issue_json(key: &str) -> serde_json::Value {
    json!({
        "key": key,
        "fields": {
            "summary": format!("Summary {}", key),
            "status": {"name": "In Progress", "statusCategory": {"colorName": "yellow"}},
            "priority": {"name": "High"},
            "issuetype": {"name": "Story"},
            "reporter": {"displayName": "Rita Reporter"},
            "assignee": {"displayName": "Al Assignee"},
            "project": {"name": "Alpha"},
            "created": "2024-01-01T09:30:00.000+0000",
            "updated": "2024-01-02T10:00:00.000+0000",
            "description": "h1. Details"
        }
    })
}

#[tokio::test]
async fn test_search_sends_query_cap_and_cookie() {
    let server = MockServer::start_async().await;
    let search_mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/rest/api/2/search")
                .query_param("jql", "project = ABC ORDER BY created")
                .query_param("maxResults", "1000")
                .query_param("fields", "*all")
                .header("Cookie", "JSESSIONID=abc; atlassian.xsrf.token=xyz");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(json!({
                    "total": 2,
                    "issues": [issue_json("ABC-2"), issue_json("ABC-1")]
                }));
        })
        .await;

    let client = JiraClient::new(
        reqwest::Client::new(),
        &format!("{}/", server.base_url()),
        "JSESSIONID=abc; atlassian.xsrf.token=xyz",
    );
    let issues = client.search("project = ABC ORDER BY created").await.unwrap();

    search_mock.assert_async().await;
    let keys: Vec<&str> = issues.iter().map(|i| i.key.as_str()).collect();
    assert_eq!(keys, vec!["ABC-2", "ABC-1"]);
    assert_eq!(issues[0].status.category_color, "yellow");
    assert_eq!(issues[0].priority.as_deref(), Some("High"));
    assert_eq!(issues[0].assignee.as_deref(), Some("Al Assignee"));
    assert_eq!(issues[0].description.as_deref(), Some("h1. Details"));
}

#[tokio::test]
async fn test_search_uses_configured_cap() {
    let server = MockServer::start_async().await;
    let search_mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/rest/api/2/search")
                .query_param("maxResults", "25");
            then.status(200)
                .json_body(json!({"total": 90, "issues": [issue_json("ABC-1")]}));
        })
        .await;

    let client = JiraClient::new(reqwest::Client::new(), &server.base_url(), "c=1")
        .with_max_results(25);
    let issues = client.search_issues("project=ABC").await.unwrap();

    search_mock.assert_async().await;
    assert_eq!(issues.len(), 1);
}

#[tokio::test]
async fn test_search_without_issues_field_is_empty() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/rest/api/2/search");
            then.status(200).json_body(json!({"total": 0}));
        })
        .await;

    let client = JiraClient::new(reqwest::Client::new(), &server.base_url(), "c=1");
    assert!(client.search_issues("project=NONE").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_search_failure_carries_remote_error_text() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/rest/api/2/search");
            then.status(400)
                .json_body(json!({"errorMessages": ["Field 'projct' does not exist"]}));
        })
        .await;

    let client = JiraClient::new(reqwest::Client::new(), &server.base_url(), "c=1");
    let err = client.search_issues("projct = ABC").await.unwrap_err();

    match err {
        ArchiverError::SourceUnavailable { message } => {
            assert!(message.starts_with("HTTP 400"));
            assert!(message.contains("Field 'projct' does not exist"));
        }
        other => panic!("expected SourceUnavailable, got {:?}", other),
    }
}

#[tokio::test]
async fn test_search_transport_error_is_source_unavailable() {
    // Nothing listens on port 9 (discard) in the test environment.
    let client = JiraClient::new(reqwest::Client::new(), "http://127.0.0.1:9", "c=1");
    let err = client.search_issues("project=ABC").await.unwrap_err();
    assert!(matches!(err, ArchiverError::SourceUnavailable { .. }));
}

#[tokio::test]
async fn test_get_comments_in_source_order() {
    let server = MockServer::start_async().await;
    let comments_mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/rest/api/2/issue/ABC-1/comment")
                .header("Cookie", "c=1");
            then.status(200).json_body(json!({
                "comments": [
                    {"author": {"displayName": "First"}, "created": "2024-01-01T00:00:00.000+0000", "body": "one"},
                    {"author": null, "created": "2024-01-02T00:00:00.000+0000", "body": "two"}
                ]
            }));
        })
        .await;

    let client = JiraClient::new(reqwest::Client::new(), &server.base_url(), "c=1");
    let comments = client.get_comments("ABC-1").await.unwrap();

    comments_mock.assert_async().await;
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0].author, "First");
    assert_eq!(comments[0].body, "one");
    assert_eq!(comments[1].author, "Unknown");
}

#[tokio::test]
async fn test_get_comments_failure_names_issue() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/rest/api/2/issue/ABC-9/comment");
            then.status(404);
        })
        .await;

    let client = JiraClient::new(reqwest::Client::new(), &server.base_url(), "c=1");
    let err = client.get_comments("ABC-9").await.unwrap_err();

    match err {
        ArchiverError::CommentFetchFailed { issue_key, message } => {
            assert_eq!(issue_key, "ABC-9");
            assert!(message.starts_with("HTTP 404"));
        }
        other => panic!("expected CommentFetchFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_get_issue_requests_all_fields() {
    let server = MockServer::start_async().await;
    let issue_mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/rest/api/2/issue/ABC-7")
                .query_param("fields", "*all");
            then.status(200).json_body(issue_json("ABC-7"));
        })
        .await;

    let client = JiraClient::new(reqwest::Client::new(), &server.base_url(), "c=1");
    let issue = client.get_issue("ABC-7").await.unwrap();

    issue_mock.assert_async().await;
    assert_eq!(issue.key, "ABC-7");
    assert_eq!(issue.reporter.as_deref(), Some("Rita Reporter"));
}
