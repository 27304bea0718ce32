use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default model identifier handed to the agent loop when the turn payload
/// does not carry one.
pub const DEFAULT_MODEL_ID: &str = "anthropic.claude-3-5-sonnet-20240620-v1:0";

/// Root configuration structure for deckhand.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Model identifier passed to the agent loop
    pub model_id: String,

    /// Directory scanned for skill bundles
    pub skills_dir: PathBuf,

    /// Object-storage settings
    pub storage: StorageConfig,

    /// Web-search settings
    pub search: SearchConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_id: DEFAULT_MODEL_ID.to_string(),
            skills_dir: PathBuf::from("skills"),
            storage: StorageConfig::default(),
            search: SearchConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML string
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(toml_str).map_err(|e| crate::Error::Config(format!("TOML parse error: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.model_id.trim().is_empty() {
            return Err(crate::Error::Config(ConfigError::EmptyModelId.to_string()));
        }

        if self.search.max_results == 0 {
            return Err(crate::Error::Config(ConfigError::InvalidSearchLimit.to_string()));
        }

        Ok(())
    }

    /// Get example configuration (as a string)
    pub fn example() -> &'static str {
        r#"# Deckhand Configuration Example
# Copy this file to deckhand.toml and customize as needed

# Model identifier passed to the agent loop
model_id = "anthropic.claude-3-5-sonnet-20240620-v1:0"

# Directory scanned for skill bundles (each subdirectory with a SKILL.md)
skills_dir = "skills"

[storage]
# Default output bucket (optional; DECKHAND_OUTPUT_BUCKET overrides)
# output_bucket = "deckhand-output-123456789012"
# AWS region hint (optional; AWS_REGION overrides)
# region = "us-east-1"
# Prefix used when scanning for a bucket if none is configured
bucket_prefix = "deckhand-output-"

[search]
# Search backend: "duckduckgo" (no key required) or "perplexity"
backend = "duckduckgo"
# API key for keyed backends (optional; DECKHAND_SEARCH_API_KEY overrides)
# api_key = "your-api-key-here"
# Maximum result blocks returned per query
max_results = 5

[logging]
# Log level for stderr: trace, debug, info, warn, error
level = "warn"
# Output format: "pretty", "json", or "compact"
format = "pretty"

[logging.file]
# Enable daily-rolling file logs under ~/.deckhand/logs/
enabled = false
"#
    }
}

/// Object-storage settings consumed by the upload/download adapters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// Default output bucket; first fallback after an explicit argument
    pub output_bucket: Option<String>,

    /// Region hint for the storage client
    pub region: Option<String>,

    /// Name prefix used when scanning available buckets as a last resort
    pub bucket_prefix: String,

    /// Local scratch directory for downloads
    pub scratch_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            output_bucket: None,
            region: None,
            bucket_prefix: "deckhand-output-".to_string(),
            scratch_dir: std::env::temp_dir().join("deckhand"),
        }
    }
}

impl StorageConfig {
    /// Configured bucket, with the `DECKHAND_OUTPUT_BUCKET` environment
    /// variable taking precedence over the file value.
    pub fn resolved_bucket(&self) -> Option<String> {
        std::env::var("DECKHAND_OUTPUT_BUCKET")
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| self.output_bucket.clone())
    }

    /// Region hint, with `AWS_REGION`/`AWS_DEFAULT_REGION` taking precedence.
    pub fn resolved_region(&self) -> Option<String> {
        std::env::var("AWS_REGION")
            .or_else(|_| std::env::var("AWS_DEFAULT_REGION"))
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| self.region.clone())
    }
}

/// Web-search backend selection.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SearchBackend {
    /// HTML scrape of the DuckDuckGo results page, no key required
    #[default]
    DuckDuckGo,
    /// Perplexity chat-completions API, requires an API key
    Perplexity,
}

/// Web-search settings consumed by the search adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    /// Which backend answers queries
    pub backend: SearchBackend,

    /// API key for keyed backends
    pub api_key: Option<String>,

    /// Maximum result blocks per query
    pub max_results: usize,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { backend: SearchBackend::default(), api_key: None, max_results: 5, timeout_secs: 30 }
    }
}

impl SearchConfig {
    /// Configured API key, with `DECKHAND_SEARCH_API_KEY` taking precedence.
    pub fn resolved_api_key(&self) -> Option<String> {
        std::env::var("DECKHAND_SEARCH_API_KEY")
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| self.api_key.clone())
    }
}

/// Logging section of deckhand.toml.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default log level for stderr output
    pub level: String,

    /// Output format: pretty, json, compact
    pub format: String,

    /// File logging settings
    pub file: FileLoggingConfig,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "warn".to_string(), format: "pretty".to_string(), file: FileLoggingConfig::default() }
    }
}

/// File logging settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileLoggingConfig {
    /// Enable daily-rolling file logs
    pub enabled: bool,

    /// Custom log directory (defaults to ~/.deckhand/logs)
    pub directory: Option<PathBuf>,
}

/// Configuration-specific errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Model id must be non-empty
    #[error("model_id must not be empty")]
    EmptyModelId,

    /// Search result limit must be positive
    #[error("search.max_results must be greater than zero")]
    InvalidSearchLimit,

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    TomlParse(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::TomlParse(err.to_string())
    }
}
