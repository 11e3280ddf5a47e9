//! Application configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. an explicit `--config` path
//! 2. `$MAILSINDEX_CONFIG` (environment variable)
//! 3. `~/.config/mailsindex/config.toml` (Linux/macOS)
//!    `%APPDATA%\mailsindex\config.toml` (Windows)
//! 4. Built-in defaults
//!
//! Server credentials can then be overridden with `MAILSINDEX_URL`,
//! `MAILSINDEX_USER` and `MAILSINDEX_PASSWORD`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{IndexerError, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General behavior settings.
    pub general: GeneralConfig,
    /// Index service endpoint and credentials.
    pub server: ServerConfig,
    /// Document field names and index mapping.
    pub schema: SchemaConfig,
    /// How corpus paths map to users and folders.
    pub layout: LayoutConfig,
    /// Ingestion pacing and error policy.
    pub ingest: IngestConfig,
}

/// General behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Override cache directory for logs.
    pub cache_dir: Option<PathBuf>,
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
}

/// Index service endpoint and credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the index service (without the `/api` suffix).
    pub url: String,
    /// Name of the target index.
    pub index: String,
    /// Basic auth user.
    pub username: String,
    /// Basic auth password.
    pub password: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

/// Document field names and index mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Name of the field holding the logical folder ("folder" or "category").
    pub folder_field: String,
    /// Timestamp format declared on the `date` field mapping.
    pub date_format: String,
}

/// How corpus paths map to users and folders.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Minimum number of directory segments below the corpus root
    /// (user + at least one folder).
    pub min_depth: usize,
    /// Trailing directory segments left out of the folder name.
    pub trailing_segments: usize,
}

/// Ingestion pacing and error policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Pause after each network call, in milliseconds.
    pub request_delay_ms: u64,
    /// Log and continue on filesystem walk/read errors instead of aborting.
    pub continue_on_walk_error: bool,
}

// ── Default implementations ─────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            log_level: "info".to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:4080".to_string(),
            index: "mailsIndex".to_string(),
            username: "admin".to_string(),
            password: String::new(),
            timeout_secs: 30,
        }
    }
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            folder_field: "folder".to_string(),
            date_format: "2006-01-02T15:04:05Z07:00".to_string(),
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            min_depth: 2,
            trailing_segments: 0,
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            request_delay_ms: 10,
            continue_on_walk_error: false,
        }
    }
}

impl Config {
    /// Check invariants that serde defaults cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.server.url.trim().is_empty() {
            return Err(IndexerError::Config("server.url must not be empty".into()));
        }
        if self.server.index.trim().is_empty() || self.server.index.contains('/') {
            return Err(IndexerError::Config(format!(
                "server.index '{}' is not a valid index name",
                self.server.index
            )));
        }
        let reserved = ["_id", "username", "date", "content"];
        if self.schema.folder_field.is_empty() || reserved.contains(&self.schema.folder_field.as_str())
        {
            return Err(IndexerError::Config(format!(
                "schema.folder_field '{}' clashes with another document field",
                self.schema.folder_field
            )));
        }
        if self.layout.min_depth < 2 {
            return Err(IndexerError::Config(
                "layout.min_depth must be at least 2 (user + folder)".into(),
            ));
        }
        if self.layout.trailing_segments >= self.layout.min_depth - 1 {
            return Err(IndexerError::Config(
                "layout.trailing_segments would leave no folder segment".into(),
            ));
        }
        Ok(())
    }

    /// Apply `MAILSINDEX_URL`, `MAILSINDEX_USER` and `MAILSINDEX_PASSWORD`.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("MAILSINDEX_URL") {
            self.server.url = url;
        }
        if let Some(user) = lookup("MAILSINDEX_USER") {
            self.server.username = user;
        }
        if let Some(password) = lookup("MAILSINDEX_PASSWORD") {
            self.server.password = password;
        }
    }
}

// ── Load ────────────────────────────────────────────────────────

/// Load configuration, searching standard locations.
///
/// An explicit path must exist and parse. A file found in a standard location
/// that cannot be read or parsed is ignored with a warning and the defaults
/// are used.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let mut config = match explicit {
        Some(path) => read_config_file(path)?,
        None => load_standard_config(),
    };
    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}

fn read_config_file(path: &Path) -> Result<Config> {
    let contents = std::fs::read_to_string(path).map_err(|e| IndexerError::io(path, e))?;
    let cfg = toml::from_str::<Config>(&contents)
        .map_err(|e| IndexerError::Config(format!("{}: {e}", path.display())))?;
    tracing::info!(path = %path.display(), "Loaded config");
    Ok(cfg)
}

fn load_standard_config() -> Config {
    if let Some(path) = config_file_path() {
        if path.exists() {
            match read_config_file(&path) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Failed to load config, using defaults"
                    );
                }
            }
        }
    }
    Config::default()
}

/// Determine the config file path (checking env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var("MAILSINDEX_CONFIG") {
        return Some(PathBuf::from(env_path));
    }

    dirs::config_dir().map(|d| d.join("mailsindex").join("config.toml"))
}

/// Return the cache directory for logs.
pub fn cache_dir(config: &Config) -> PathBuf {
    if let Some(ref dir) = config.general.cache_dir {
        return dir.clone();
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mailsindex")
}
