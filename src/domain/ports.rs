use crate::domain::model::{Comment, Issue};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Destination for a finished archive.
pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn max_results(&self) -> u32;
    fn request_timeout(&self) -> Duration;
    fn concurrent_requests(&self) -> usize;
    fn archive_filename(&self) -> &str;
    fn compression_level(&self) -> i64;
}

/// Read side of the remote tracker.
#[async_trait]
pub trait IssueSource: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<Issue>>;
    async fn get_comments(&self, issue_key: &str) -> Result<Vec<Comment>>;
}

/// Append-only archive of named text entries.
pub trait ArchiveSink {
    type Output;

    fn append(&mut self, name: &str, contents: &str) -> Result<()>;
    fn finish(self) -> Result<Self::Output>;
}
