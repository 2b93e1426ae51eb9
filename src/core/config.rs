//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::error::ImportError;

pub const DEFAULT_SAMPLE_DATA_DIR: &str = "product/sample_data";
pub const DEFAULT_QUESTIONS_CSV: &str = "product/packs/saas_core/questions.csv";
const DEFAULT_REQUEST_DELAY_MS: u64 = 100;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Environment variable overriding the config file location
pub const CONFIG_PATH_ENV: &str = "NOTION_BOOTSTRAP_CONFIG";
pub const TOKEN_ENV: &str = "NOTION_TOKEN";

/// Importer configuration with layered hierarchy
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Integration token
    pub token: Option<String>,

    /// Base URL of the Notion API, up to and including `/v1`
    pub api_base: Option<String>,

    /// Value of the `Notion-Version` header
    pub notion_version: Option<String>,

    pub sample_data_dir: Option<PathBuf>,

    pub questions_csv: Option<PathBuf>,

    /// Pause between inserts, in milliseconds
    pub request_delay_ms: Option<u64>,

    /// Per-request timeout, in seconds
    pub timeout_secs: Option<u64>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load() -> Self {
        let mut config = Config::default();

        // Config file (NOTION_BOOTSTRAP_CONFIG, else ~/.config/notion-bootstrap/config.yaml)
        if let Some(path) = Self::config_path() {
            if path.exists() {
                match Self::from_file(&path) {
                    Ok(file) => config.merge(file),
                    Err(err) => tracing::warn!(path = %path.display(), "ignoring config file: {}", err),
                }
            }
        }

        // Environment variables
        if let Ok(base) = std::env::var("NOTION_API_BASE") {
            config.api_base = Some(base);
        }
        if let Ok(version) = std::env::var("NOTION_VERSION") {
            config.notion_version = Some(version);
        }

        config
    }

    /// Parse a single YAML config file
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
        if contents.trim().is_empty() {
            return Ok(Config::default());
        }
        serde_yml::from_str(&contents).map_err(|e| e.to_string())
    }

    /// Path of the config file in effect
    pub fn config_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Some(PathBuf::from(path));
        }
        directories::ProjectDirs::from("", "", "notion-bootstrap")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.token.is_some() {
            self.token = other.token;
        }
        if other.api_base.is_some() {
            self.api_base = other.api_base;
        }
        if other.notion_version.is_some() {
            self.notion_version = other.notion_version;
        }
        if other.sample_data_dir.is_some() {
            self.sample_data_dir = other.sample_data_dir;
        }
        if other.questions_csv.is_some() {
            self.questions_csv = other.questions_csv;
        }
        if other.request_delay_ms.is_some() {
            self.request_delay_ms = other.request_delay_ms;
        }
        if other.timeout_secs.is_some() {
            self.timeout_secs = other.timeout_secs;
        }
    }

    pub fn sample_data_dir(&self) -> PathBuf {
        self.sample_data_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SAMPLE_DATA_DIR))
    }

    pub fn questions_csv(&self) -> PathBuf {
        self.questions_csv
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_QUESTIONS_CSV))
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms.unwrap_or(DEFAULT_REQUEST_DELAY_MS))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }
}

/// Where a token may come from, in precedence order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Flag,
    Env,
    ConfigFile,
    Prompt,
}

impl std::fmt::Display for TokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TokenSource::Flag => "--token",
            TokenSource::Env => TOKEN_ENV,
            TokenSource::ConfigFile => "config file",
            TokenSource::Prompt => "prompt",
        };
        write!(f, "{}", name)
    }
}

/// Pick the first non-blank token from the candidates.
///
/// `prompt` is only invoked when no other source supplies one.
pub fn resolve_token<F>(
    candidates: [(TokenSource, Option<String>); 3],
    prompt: Option<F>,
) -> Result<(String, TokenSource), ImportError>
where
    F: FnOnce() -> Option<String>,
{
    let non_blank = |value: Option<String>| {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    for (source, value) in candidates {
        if let Some(token) = non_blank(value) {
            return Ok((token, source));
        }
    }

    prompt
        .and_then(|ask| non_blank(ask()))
        .map(|token| (token, TokenSource::Prompt))
        .ok_or(ImportError::AuthError)
}
