use crate::core::render::{render_index_page, render_issue_page, INDEX_PAGE_NAME};
use crate::domain::model::{ExportRequest, Issue};
use crate::domain::ports::{ArchiveSink, ConfigProvider, IssueSource};
use crate::utils::error::{ArchiverError, Result};
use crate::utils::validation::Validate;
use futures_util::stream::{self, StreamExt};
use futures_util::FutureExt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportState {
    Idle,
    Searching,
    NoResults,
    Rendering,
    Streaming,
    Done,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentsOutcome {
    Loaded(usize),
    /// Comments could not be fetched; the page was rendered without them.
    Unavailable(String),
}

/// A rendered page for one issue. Always present, possibly degraded.
#[derive(Debug, Clone)]
pub struct IssuePage {
    pub name: String,
    pub html: String,
    pub comments: CommentsOutcome,
}

impl IssuePage {
    pub fn is_degraded(&self) -> bool {
        matches!(self.comments, CommentsOutcome::Unavailable(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub issues: usize,
    pub entries: usize,
    pub degraded_pages: Vec<String>,
    pub skipped_duplicates: Vec<String>,
}

#[derive(Debug)]
pub struct ExportOutput<T> {
    pub archive: T,
    pub summary: ExportSummary,
}

#[derive(Debug, Clone, Copy)]
pub struct ExportOptions {
    pub concurrent_requests: usize,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            concurrent_requests: 1,
        }
    }
}

impl ExportOptions {
    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C) -> Self {
        Self {
            concurrent_requests: config.concurrent_requests().max(1),
        }
    }
}

pub struct ExportPipeline<S: IssueSource> {
    source: S,
    options: ExportOptions,
    state: ExportState,
}

impl<S: IssueSource> ExportPipeline<S> {
    pub fn new(source: S, options: ExportOptions) -> Self {
        Self {
            source,
            options,
            state: ExportState::Idle,
        }
    }

    pub fn state(&self) -> ExportState {
        self.state
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    fn transition(&mut self, next: ExportState) {
        tracing::debug!("Export state {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    fn fail(&mut self, error: ArchiverError) -> ArchiverError {
        self.transition(ExportState::Failed);
        error
    }

    /// Runs the search. Anything that fails here fails before an archive
    /// exists, so callers can still answer with a structured error.
    pub async fn search(&mut self, request: &ExportRequest) -> Result<Vec<Issue>> {
        if let Err(e) = request.validate() {
            return Err(self.fail(e));
        }

        self.transition(ExportState::Searching);
        tracing::info!("🔍 Searching issues with JQL: {}", request.query);

        let issues = match self.source.search(&request.query).await {
            Ok(issues) => issues,
            Err(e) => {
                tracing::error!("❌ Search failed: {}", e);
                return Err(self.fail(e));
            }
        };

        if issues.is_empty() {
            self.transition(ExportState::NoResults);
            tracing::info!("No issues matched the query");
            return Err(ArchiverError::NoIssuesFound);
        }

        tracing::info!("📥 Found {} issues", issues.len());
        Ok(issues)
    }

    async fn render_issue(&self, issue: &Issue) -> IssuePage {
        let (comments, outcome) = match self.source.get_comments(&issue.key).await {
            Ok(comments) => {
                let count = comments.len();
                (comments, CommentsOutcome::Loaded(count))
            }
            Err(e) => {
                tracing::warn!("⚠️ {}, exporting without comments", e);
                (Vec::new(), CommentsOutcome::Unavailable(e.to_string()))
            }
        };

        IssuePage {
            name: issue.page_name(),
            html: render_issue_page(issue, &comments),
            comments: outcome,
        }
    }

    /// Writes the index followed by one page per issue, in search order.
    pub async fn write_archive<A: ArchiveSink>(
        &mut self,
        issues: &[Issue],
        mut sink: A,
    ) -> Result<ExportOutput<A::Output>> {
        self.transition(ExportState::Rendering);
        let mut summary = ExportSummary {
            issues: issues.len(),
            ..ExportSummary::default()
        };

        let index = render_index_page(issues);
        self.transition(ExportState::Streaming);
        if let Err(e) = sink.append(INDEX_PAGE_NAME, &index) {
            return Err(self.fail(e));
        }
        summary.entries += 1;

        let concurrency = self.options.concurrent_requests.max(1);
        let failure = {
            let this = &*self;
            let pending: Vec<_> = issues
                .iter()
                .map(|issue| this.render_issue(issue).boxed())
                .collect();
            // buffered() 會依原始順序產出結果，即使請求並行
            let mut pages = stream::iter(pending).buffered(concurrency);

            let mut failure = None;
            while let Some(page) = pages.next().await {
                if page.is_degraded() {
                    summary.degraded_pages.push(page.name.clone());
                }

                match sink.append(&page.name, &page.html) {
                    Ok(()) => summary.entries += 1,
                    Err(ArchiverError::DuplicateEntry { name }) => {
                        tracing::warn!("⚠️ Skipping duplicate archive entry {}", name);
                        summary.skipped_duplicates.push(name);
                    }
                    Err(e) => {
                        failure = Some(e);
                        break;
                    }
                }
            }
            failure
        };

        if let Some(e) = failure {
            return Err(self.fail(e));
        }

        let archive = match sink.finish() {
            Ok(archive) => archive,
            Err(e) => return Err(self.fail(e)),
        };
        self.transition(ExportState::Done);

        tracing::info!(
            "📦 Archive complete: {} entries, {} pages without comments",
            summary.entries,
            summary.degraded_pages.len()
        );
        Ok(ExportOutput { archive, summary })
    }

    pub async fn run<A: ArchiveSink>(
        &mut self,
        request: &ExportRequest,
        sink: A,
    ) -> Result<ExportOutput<A::Output>> {
        let issues = self.search(request).await?;
        self.write_archive(&issues, sink).await
    }
}
