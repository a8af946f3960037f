pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod server;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::{ExportArgs, ServeArgs};

pub use crate::adapters::{JiraClient, ZipArchiveWriter};
pub use crate::config::{cli::LocalStorage, toml_config::TomlConfig};
pub use crate::core::export::{ExportOptions, ExportPipeline, ExportState, ExportSummary};
pub use crate::core::render::{render_index_page, render_issue_page};
pub use crate::domain::model::{Comment, ExportRequest, Issue};
pub use crate::server::{router, AppState};
pub use crate::utils::error::{ArchiverError, Result};
