//! HTTP boundary: `POST /api/export` answers with a zip of HTML pages.

use crate::adapters::archive::{ChunkSender, ZipArchiveWriter};
use crate::adapters::jira::{build_http_client, JiraClient};
use crate::core::export::{ExportOptions, ExportPipeline};
use crate::core::ConfigProvider;
use crate::domain::model::{ExportPayload, ExportRequest};
use crate::utils::error::{ArchiverError, ErrorCategory, Result};
use crate::utils::monitor::SystemMonitor;
use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use futures_util::stream;
use serde::Serialize;
use std::io;
use std::sync::Arc;
use tokio::net::TcpListener;

pub const EXPORT_PATH: &str = "/api/export";

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
        .into_response()
}

impl ArchiverError {
    pub fn status_code(&self) -> StatusCode {
        match self.category() {
            ErrorCategory::Request => StatusCode::BAD_REQUEST,
            ErrorCategory::NotFound => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ArchiverError {
    fn into_response(self) -> Response {
        error_response(self.status_code(), self.to_string())
    }
}

struct Shared {
    http: reqwest::Client,
    max_results: u32,
    options: ExportOptions,
    archive_filename: String,
    compression_level: i64,
    monitor: SystemMonitor,
}

/// Process-wide state. Only the HTTP connection pool is shared between
/// export requests; everything else is per request.
#[derive(Clone)]
pub struct AppState {
    shared: Arc<Shared>,
}

impl AppState {
    pub fn new<C: ConfigProvider>(config: &C, monitor_enabled: bool) -> Result<Self> {
        let http = build_http_client(config.request_timeout())?;
        Ok(Self {
            shared: Arc::new(Shared {
                http,
                max_results: config.max_results(),
                options: ExportOptions::from_config(config),
                archive_filename: config.archive_filename().to_string(),
                compression_level: config.compression_level(),
                monitor: SystemMonitor::new(monitor_enabled),
            }),
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(EXPORT_PATH, post(export_handler))
        .with_state(state)
}

async fn export_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ExportPayload>, JsonRejection>,
) -> Response {
    let payload = match payload {
        Ok(Json(payload)) => payload,
        Err(rejection) => {
            tracing::warn!("Rejected export request: {}", rejection.body_text());
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Invalid request body: {}", rejection.body_text()),
            );
        }
    };

    match run_export(&state, payload).await {
        Ok(response) => response,
        Err(e) => {
            match e.status_code() {
                StatusCode::INTERNAL_SERVER_ERROR => {
                    tracing::error!("❌ Export failed: {}", e);
                    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
                }
                _ => tracing::info!("Export request not fulfilled: {}", e),
            }
            e.into_response()
        }
    }
}

/// Validates and searches, then commits the response and streams the zip
/// while pages are still being rendered. Only failures up to the search
/// produce a JSON error.
async fn run_export(state: &AppState, payload: ExportPayload) -> Result<Response> {
    let shared = Arc::clone(&state.shared);
    let request = ExportRequest::try_from(payload)?;
    tracing::info!(
        "📤 Export requested from {} (jql: {})",
        request.tracker_base_url,
        request.query
    );

    let client = JiraClient::for_request(shared.http.clone(), &request, shared.max_results);
    let mut pipeline = ExportPipeline::new(client, shared.options);

    let issues = pipeline.search(&request).await?;
    shared.monitor.log_stats("Search");

    let (sender, receiver) = ChunkSender::channel();
    let errors = sender.error_handle();
    let sink = ZipArchiveWriter::streaming(sender, shared.compression_level);
    let filename = shared.archive_filename.clone();

    tokio::spawn(async move {
        match pipeline.write_archive(&issues, sink).await {
            Ok(output) => {
                shared.monitor.log_stats("Archive");
                if !output.summary.degraded_pages.is_empty() {
                    tracing::warn!(
                        "⚠️ {} of {} pages exported without comments",
                        output.summary.degraded_pages.len(),
                        output.summary.issues
                    );
                }
                tracing::info!(
                    "✅ Sent {} ({} entries)",
                    shared.archive_filename,
                    output.summary.entries
                );
            }
            Err(e) => {
                // 回應已送出，只能中斷串流
                tracing::error!("❌ Archive stream aborted: {}", e);
                let _ = errors.send(Err(io::Error::other(e.to_string())));
            }
        }
    });

    let chunks = stream::unfold(receiver, |mut receiver| async move {
        receiver.recv().await.map(|chunk| (chunk, receiver))
    });

    let headers = [
        (header::CONTENT_TYPE, "application/zip".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        ),
    ];
    Ok((StatusCode::OK, headers, Body::from_stream(chunks)).into_response())
}

/// Serves on an already bound listener until ctrl-c.
pub async fn serve_on(listener: TcpListener, state: AppState) -> Result<()> {
    tracing::info!("🚀 Server running on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("Server stopped.");
    Ok(())
}

pub async fn serve(bind_address: &str, state: AppState) -> Result<()> {
    let listener = TcpListener::bind(bind_address).await?;
    serve_on(listener, state).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Unable to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_per_category() {
        let missing = ArchiverError::MissingParameters { fields: vec![] };
        assert_eq!(missing.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ArchiverError::NoIssuesFound.status_code(),
            StatusCode::NOT_FOUND
        );
        let upstream = ArchiverError::SourceUnavailable {
            message: "HTTP 502".to_string(),
        };
        assert_eq!(upstream.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
