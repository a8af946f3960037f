pub mod cli;
pub mod toml_config;

use crate::utils::error::Result;
use crate::utils::validation::Validate;
use toml_config::TomlConfig;

#[cfg(feature = "cli")]
use clap::Parser;

fn load_base_config(path: Option<&str>) -> Result<TomlConfig> {
    match path {
        Some(path) => TomlConfig::from_file(path),
        None => Ok(TomlConfig::default()),
    }
}

/// Flags for the HTTP server. Command-line values override the file.
#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "jira-archiver")]
#[command(about = "Serve offline HTML snapshots of Jira issue searches as zip archives")]
pub struct ServeArgs {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    #[arg(long)]
    pub host: Option<String>,

    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// Parallel comment fetches per export
    #[arg(long)]
    pub concurrent_requests: Option<usize>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU and memory usage per export phase")]
    pub monitor: bool,
}

#[cfg(feature = "cli")]
impl ServeArgs {
    pub fn load_config(&self) -> Result<TomlConfig> {
        let mut config = load_base_config(self.config.as_deref())?;

        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(concurrent) = self.concurrent_requests {
            config.tracker.concurrent_requests = concurrent;
        }
        if self.monitor {
            config.monitoring.enabled = true;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Flags for a single export written to disk.
#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "jira-export")]
#[command(about = "Export Jira issues matching a JQL query into a zip of HTML pages")]
pub struct ExportArgs {
    /// Tracker base URL, e.g. https://jira.example.com
    #[arg(long)]
    pub jira_url: String,

    /// Session cookie header value, sent verbatim
    #[arg(long, env = "JIRA_COOKIE", hide_env_values = true)]
    pub cookie: String,

    #[arg(long)]
    pub jql: String,

    #[arg(short, long, default_value = "./output")]
    pub output_dir: String,

    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    #[arg(long)]
    pub concurrent_requests: Option<usize>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU and memory usage per export phase")]
    pub monitor: bool,
}

#[cfg(feature = "cli")]
impl ExportArgs {
    pub fn load_config(&self) -> Result<TomlConfig> {
        let mut config = load_base_config(self.config.as_deref())?;

        if let Some(concurrent) = self.concurrent_requests {
            config.tracker.concurrent_requests = concurrent;
        }
        if self.monitor {
            config.monitoring.enabled = true;
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(feature = "cli")]
impl Validate for ExportArgs {
    fn validate(&self) -> Result<()> {
        use crate::utils::validation::*;

        validate_url("jira_url", &self.jira_url)?;
        validate_non_empty_string("cookie", &self.cookie)?;
        validate_non_empty_string("jql", &self.jql)?;
        validate_path("output_dir", &self.output_dir)?;
        Ok(())
    }
}
