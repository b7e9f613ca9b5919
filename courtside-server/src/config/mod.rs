//! Configuration management for the courtside server.
//!
//! Settings are layered, later sources winning:
//! 1. Default values
//! 2. Config file (`courtside.toml`, `--config` or `COURTSIDE_CONFIG`)
//! 3. Environment variables (`OPENAI_*`)
//! 4. Command-line flags
//!
//! The OpenAI API key only ever comes from `OPENAI_API_KEY`.

mod schema;

pub use schema::{
    ConfigIssue, HttpConfig, IssueLevel, OpenAISettings, ServerConfig, TeamsConfig,
    UpstreamErrorMode,
};

use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Config file used when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "courtside.toml";

/// Error type for configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    /// Missing required setting.
    #[error("missing required config: {0}")]
    MissingField(String),
    /// Validation found errors.
    #[error("invalid configuration: {}", join_issues(.0))]
    Invalid(Vec<ConfigIssue>),
}

fn join_issues(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Resolve the config file path, falling back to [`DEFAULT_CONFIG_FILE`].
#[must_use]
pub fn config_path(explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// Load configuration from a specific path.
///
/// A missing file yields the defaults.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub async fn load_config_from(path: &Path) -> ConfigResult<ServerConfig> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "config file not found, using defaults");
            return Ok(ServerConfig::default());
        }
        Err(e) => return Err(e.into()),
    };
    let config: ServerConfig = toml::from_str(&content)?;
    debug!(path = %path.display(), "loaded config file");

    Ok(config)
}

/// Read the OpenAI API key from the environment.
///
/// # Errors
///
/// Returns [`ConfigError::MissingField`] when `OPENAI_API_KEY` is unset or
/// blank.
pub fn api_key_from_env() -> ConfigResult<String> {
    std::env::var("OPENAI_API_KEY")
        .ok()
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingField("OPENAI_API_KEY".to_string()))
}

/// Fail on error-level issues and log the rest.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] when any issue is an error.
pub fn check(config: &ServerConfig) -> ConfigResult<()> {
    let (errors, warnings): (Vec<_>, Vec<_>) = config
        .validate()
        .into_iter()
        .partition(|issue| issue.level == IssueLevel::Error);

    for warning in &warnings {
        tracing::warn!(path = %warning.path, "{}", warning.message);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Invalid(errors))
    }
}
