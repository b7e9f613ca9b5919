//! Configuration schema definitions.
//!
//! Type-safe configuration structures with defaults, environment overlay and
//! validation.

use courtside::{ErrorPolicy, OpenAIConfig, Team};
use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: HttpConfig,

    /// Upstream model settings.
    #[serde(default)]
    pub openai: OpenAISettings,

    /// Team listing behavior.
    #[serde(default)]
    pub teams: TeamsConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpConfig {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,
    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Per-request timeout in seconds; slower requests answer 408.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    8080
}

const fn default_request_timeout() -> u64 {
    60
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl HttpConfig {
    /// `host:port` string for binding.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// OpenAI settings. The API key is never read from the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OpenAISettings {
    /// API base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model name.
    #[serde(default = "default_model")]
    pub model: String,
    /// Upstream HTTP timeout in seconds.
    #[serde(default = "default_openai_timeout")]
    pub timeout_secs: u64,
    /// Organization ID.
    #[serde(default)]
    pub organization: Option<String>,
}

fn default_base_url() -> String {
    OpenAIConfig::DEFAULT_BASE_URL.to_string()
}

fn default_model() -> String {
    OpenAIConfig::DEFAULT_MODEL.to_string()
}

const fn default_openai_timeout() -> u64 {
    OpenAIConfig::DEFAULT_TIMEOUT_SECS
}

impl Default for OpenAISettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            timeout_secs: default_openai_timeout(),
            organization: None,
        }
    }
}

impl OpenAISettings {
    /// Build the client configuration with the given API key.
    #[must_use]
    pub fn client_config(&self, api_key: impl Into<String>) -> OpenAIConfig {
        let mut config = OpenAIConfig::new(api_key)
            .with_base_url(&self.base_url)
            .with_model(&self.model)
            .with_timeout(self.timeout_secs);
        if let Some(org) = &self.organization {
            config = config.with_organization(org);
        }
        config
    }
}

/// What to do when the upstream model call fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpstreamErrorMode {
    /// Surface every failure as an HTTP error.
    #[default]
    Propagate,
    /// Answer rate-limited and unavailable failures with `teams.fallback`.
    Fallback,
}

/// Team listing configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TeamsConfig {
    /// Failure handling mode.
    #[serde(default)]
    pub on_upstream_error: UpstreamErrorMode,
    /// Teams served in fallback mode.
    #[serde(default)]
    pub fallback: Vec<Team>,
}

impl TeamsConfig {
    /// The [`ErrorPolicy`] this configuration selects.
    #[must_use]
    pub fn policy(&self) -> ErrorPolicy {
        match self.on_upstream_error {
            UpstreamErrorMode::Propagate => ErrorPolicy::Propagate,
            UpstreamErrorMode::Fallback => ErrorPolicy::Fallback(self.fallback.clone()),
        }
    }
}

impl ServerConfig {
    /// Validate the configuration and return any issues found.
    #[must_use]
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if self.server.request_timeout_secs == 0 {
            issues.push(ConfigIssue::error(
                "server.request_timeout_secs",
                "Request timeout must be at least 1 second",
            ));
        }

        if self.server.port == 0 {
            issues.push(ConfigIssue::warning(
                "server.port",
                "Port 0 binds a random free port",
            ));
        }

        if !(self.openai.base_url.starts_with("http://")
            || self.openai.base_url.starts_with("https://"))
        {
            issues.push(ConfigIssue::error(
                "openai.base_url",
                format!("Not an http(s) URL: {}", self.openai.base_url),
            ));
        }

        if self.openai.model.trim().is_empty() {
            issues.push(ConfigIssue::error("openai.model", "Model must not be empty"));
        }

        if self.openai.timeout_secs == 0 {
            issues.push(ConfigIssue::error(
                "openai.timeout_secs",
                "Upstream timeout must be at least 1 second",
            ));
        }

        match self.teams.on_upstream_error {
            UpstreamErrorMode::Fallback if self.teams.fallback.is_empty() => {
                issues.push(ConfigIssue::error(
                    "teams.fallback",
                    "Fallback mode needs at least one team",
                ));
            }
            UpstreamErrorMode::Propagate if !self.teams.fallback.is_empty() => {
                issues.push(ConfigIssue::warning(
                    "teams.fallback",
                    "Fallback teams are ignored unless on_upstream_error = \"fallback\"",
                ));
            }
            _ => {}
        }

        for (index, team) in self.teams.fallback.iter().enumerate() {
            if !team.is_complete() {
                issues.push(ConfigIssue::error(
                    format!("teams.fallback[{index}]"),
                    "teamName and city must not be empty",
                ));
            }
        }

        issues
    }

    /// Merge environment variables into the configuration.
    #[must_use]
    pub fn with_env(self) -> Self {
        self.with_env_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`with_env`](Self::with_env) with an injectable lookup.
    #[must_use]
    pub fn with_env_lookup(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup("OPENAI_BASE_URL").filter(|v| !v.is_empty()) {
            self.openai.base_url = url;
        }
        if let Some(model) = lookup("OPENAI_MODEL").filter(|v| !v.is_empty()) {
            self.openai.model = model;
        }
        if let Some(org) = lookup("OPENAI_ORGANIZATION").filter(|v| !v.is_empty()) {
            self.openai.organization = Some(org);
        }
        self
    }
}

/// Configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigIssue {
    /// Issue severity level.
    pub level: IssueLevel,
    /// Configuration path (e.g., "teams.fallback").
    pub path: String,
    /// Human-readable message.
    pub message: String,
}

impl ConfigIssue {
    /// Create an error-level issue.
    #[must_use]
    pub fn error(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: IssueLevel::Error,
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a warning-level issue.
    #[must_use]
    pub fn warning(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: IssueLevel::Warning,
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.level {
            IssueLevel::Error => "ERROR",
            IssueLevel::Warning => "WARN",
        };
        write!(f, "[{}] {}: {}", prefix, self.path, self.message)
    }
}

/// Severity level for configuration issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueLevel {
    /// Error that prevents the server from starting.
    Error,
    /// Warning about potential issues.
    Warning,
}
