pub mod export;
pub mod render;

pub use crate::domain::model::{Comment, ExportRequest, Issue};
pub use crate::domain::ports::{ArchiveSink, ConfigProvider, IssueSource, Storage};
pub use crate::utils::error::Result;
