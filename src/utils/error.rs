use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArchiverError {
    #[error("Missing required parameters")]
    MissingParameters { fields: Vec<String> },

    #[error("No issues found for the given JQL")]
    NoIssuesFound,

    #[error("Failed to search issues: {message}")]
    SourceUnavailable { message: String },

    #[error("Failed to get issue {issue_key}: {message}")]
    IssueFetchFailed { issue_key: String, message: String },

    #[error("Failed to get comments for {issue_key}: {message}")]
    CommentFetchFailed { issue_key: String, message: String },

    #[error("Duplicate archive entry: {name}")]
    DuplicateEntry { name: String },

    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Request,
    NotFound,
    Upstream,
    Archive,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ArchiverError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ArchiverError::MissingParameters { .. } => ErrorCategory::Request,
            ArchiverError::NoIssuesFound => ErrorCategory::NotFound,
            ArchiverError::SourceUnavailable { .. }
            | ArchiverError::IssueFetchFailed { .. }
            | ArchiverError::CommentFetchFailed { .. }
            | ArchiverError::ApiError(_) => ErrorCategory::Upstream,
            ArchiverError::DuplicateEntry { .. } | ArchiverError::ZipError(_) => {
                ErrorCategory::Archive
            }
            ArchiverError::ConfigError { .. }
            | ArchiverError::InvalidConfigValueError { .. }
            | ArchiverError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            ArchiverError::IoError(_) | ArchiverError::SerializationError(_) => {
                ErrorCategory::System
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 單一 issue 的問題不會中斷匯出
            ArchiverError::CommentFetchFailed { .. } | ArchiverError::DuplicateEntry { .. } => {
                ErrorSeverity::Low
            }
            ArchiverError::NoIssuesFound
            | ArchiverError::SourceUnavailable { .. }
            | ArchiverError::IssueFetchFailed { .. }
            | ArchiverError::ApiError(_) => ErrorSeverity::Medium,
            ArchiverError::MissingParameters { .. }
            | ArchiverError::ConfigError { .. }
            | ArchiverError::InvalidConfigValueError { .. }
            | ArchiverError::ConfigValidationError { .. }
            | ArchiverError::SerializationError(_) => ErrorSeverity::High,
            ArchiverError::ZipError(_) | ArchiverError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Request => "Provide the tracker URL, session cookie and JQL query",
            ErrorCategory::NotFound => "Check the JQL query in the tracker's issue search first",
            ErrorCategory::Upstream => {
                "Check the tracker URL and refresh the session cookie, then retry"
            }
            ErrorCategory::Archive => "Retry the export; check free memory and disk space",
            ErrorCategory::Configuration => "Fix the configuration file or command-line flags",
            ErrorCategory::System => "Check file permissions and available disk space",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ArchiverError::MissingParameters { fields } if !fields.is_empty() => {
                format!("Missing required parameters: {}", fields.join(", "))
            }
            ArchiverError::SourceUnavailable { message } => {
                format!("The tracker could not be searched ({})", message)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ArchiverError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_match_api_contract() {
        let missing = ArchiverError::MissingParameters {
            fields: vec!["jql".to_string()],
        };
        assert_eq!(missing.to_string(), "Missing required parameters");
        assert_eq!(
            ArchiverError::NoIssuesFound.to_string(),
            "No issues found for the given JQL"
        );
    }

    #[test]
    fn test_categories_and_severity() {
        let upstream = ArchiverError::SourceUnavailable {
            message: "HTTP 401 Unauthorized: denied".to_string(),
        };
        assert_eq!(upstream.category(), ErrorCategory::Upstream);
        assert_eq!(upstream.severity(), ErrorSeverity::Medium);

        let comments = ArchiverError::CommentFetchFailed {
            issue_key: "ABC-1".to_string(),
            message: "timeout".to_string(),
        };
        assert_eq!(comments.severity(), ErrorSeverity::Low);
        assert_eq!(
            comments.to_string(),
            "Failed to get comments for ABC-1: timeout"
        );
    }

    #[test]
    fn test_user_friendly_message_lists_fields() {
        let missing = ArchiverError::MissingParameters {
            fields: vec!["jiraUrl".to_string(), "jql".to_string()],
        };
        assert_eq!(
            missing.user_friendly_message(),
            "Missing required parameters: jiraUrl, jql"
        );
    }
}
