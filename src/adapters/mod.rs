// Adapters layer: concrete implementations for external systems (tracker http, zip archive).

pub mod archive;
pub mod jira;

pub use archive::ZipArchiveWriter;
pub use jira::JiraClient;
