use crate::adapters::archive::DEFAULT_COMPRESSION_LEVEL;
use crate::adapters::jira::DEFAULT_MAX_RESULTS;
use crate::core::ConfigProvider;
use crate::utils::error::{ArchiverError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const MAX_CONCURRENT_REQUESTS: usize = 32;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub server: ServerConfig,
    pub tracker: TrackerConfig,
    pub archive: ArchiveConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Search result cap; anything beyond it is not exported.
    pub max_results: u32,
    pub timeout_seconds: u64,
    pub concurrent_requests: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_MAX_RESULTS,
            timeout_seconds: 30,
            concurrent_requests: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    pub filename: String,
    pub compression_level: i64,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            filename: "jira-export.zip".to_string(),
            compression_level: DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub log_format: String,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            log_format: "compact".to_string(),
        }
    }
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ArchiverError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ArchiverError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${ARCHIVER_PORT})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ArchiverError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("server.host", &self.server.host)?;
        validation::validate_positive_number("server.port", self.server.port as usize, 1)?;

        validation::validate_positive_number(
            "tracker.max_results",
            self.tracker.max_results as usize,
            1,
        )?;
        validation::validate_positive_number(
            "tracker.timeout_seconds",
            self.tracker.timeout_seconds as usize,
            1,
        )?;
        validation::validate_range(
            "tracker.concurrent_requests",
            self.tracker.concurrent_requests,
            1,
            MAX_CONCURRENT_REQUESTS,
        )?;

        validation::validate_file_name("archive.filename", &self.archive.filename)?;
        validation::validate_range(
            "archive.compression_level",
            self.archive.compression_level,
            1,
            9,
        )?;

        let valid_formats = ["compact", "json"];
        if !valid_formats.contains(&self.monitoring.log_format.as_str()) {
            return Err(ArchiverError::InvalidConfigValueError {
                field: "monitoring.log_format".to_string(),
                value: self.monitoring.log_format.clone(),
                reason: format!(
                    "Unsupported format. Valid formats: {}",
                    valid_formats.join(", ")
                ),
            });
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.enabled
    }
}

impl ConfigProvider for TomlConfig {
    fn max_results(&self) -> u32 {
        self.tracker.max_results
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.tracker.timeout_seconds)
    }

    fn concurrent_requests(&self) -> usize {
        self.tracker.concurrent_requests
    }

    fn archive_filename(&self) -> &str {
        &self.archive.filename
    }

    fn compression_level(&self) -> i64 {
        self.archive.compression_level
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_toml_config() {
        let toml_content = r#"
[server]
host = "127.0.0.1"
port = 8080

[tracker]
max_results = 200
timeout_seconds = 10
concurrent_requests = 4

[archive]
filename = "snapshot.zip"
compression_level = 6

[monitoring]
enabled = true
log_format = "json"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.max_results(), 200);
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.concurrent_requests(), 4);
        assert_eq!(config.archive_filename(), "snapshot.zip");
        assert_eq!(config.compression_level(), 6);
        assert!(config.monitoring_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:3000");
        assert_eq!(config.max_results(), 1000);
        assert_eq!(config.concurrent_requests(), 1);
        assert_eq!(config.archive_filename(), "jira-export.zip");
        assert_eq!(config.compression_level(), 9);
        assert!(!config.monitoring_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("JIRA_ARCHIVER_TEST_PORT", "4321");

        let toml_content = r#"
[server]
port = ${JIRA_ARCHIVER_TEST_PORT}
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.server.port, 4321);

        std::env::remove_var("JIRA_ARCHIVER_TEST_PORT");
    }

    #[test]
    fn test_config_validation() {
        let config = TomlConfig::from_toml_str(
            r#"
[tracker]
concurrent_requests = 0
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());

        let config = TomlConfig::from_toml_str(
            r#"
[archive]
filename = "../escape.zip"
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());

        let config = TomlConfig::from_toml_str(
            r#"
[monitoring]
log_format = "xml"
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_reports_parse_error() {
        let err = TomlConfig::from_toml_str("[server\nport = 1").unwrap_err();
        assert!(matches!(err, ArchiverError::ConfigValidationError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();

        let toml_content = r#"
[archive]
filename = "from-file.zip"
"#;

        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.archive.filename, "from-file.zip");
    }
}
