//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::time::Clock;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub index: IndexConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub generator: GeneratorConfig,

    #[serde(default)]
    pub clock: ClockConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub cors_origins: Vec<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_request_timeout() -> u64 {
    60
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl ApiConfig {
    /// Create config with custom host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Upstream agenda configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_agenda_uid")]
    pub agenda_uid: String,

    /// API key for the v2 API; without it the public JSON export is used
    pub api_key: Option<String>,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_legacy_base_url")]
    pub legacy_base_url: String,

    #[serde(default = "default_page_limit")]
    pub limit: u32,

    /// Events whose last session ended earlier than this many days ago are dropped
    #[serde(default = "default_recent_days")]
    pub recent_days: i64,

    /// Language read from localized fields
    #[serde(default = "default_lang")]
    pub lang: String,

    /// Serve a synthetic event instead of calling the agenda
    #[serde(default)]
    pub mock: bool,

    #[serde(default = "default_source_timeout")]
    pub request_timeout_secs: u64,
}

fn default_agenda_uid() -> String {
    "826334".to_string()
}

fn default_api_base_url() -> String {
    "https://api.openagenda.com/v2".to_string()
}

fn default_legacy_base_url() -> String {
    "https://openagenda.com/agendas".to_string()
}

fn default_page_limit() -> u32 {
    100
}

fn default_recent_days() -> i64 {
    365
}

fn default_lang() -> String {
    "fr".to_string()
}

fn default_source_timeout() -> u64 {
    10
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            agenda_uid: default_agenda_uid(),
            api_key: None,
            api_base_url: default_api_base_url(),
            legacy_base_url: default_legacy_base_url(),
            limit: default_page_limit(),
            recent_days: default_recent_days(),
            lang: default_lang(),
            mock: false,
            request_timeout_secs: default_source_timeout(),
        }
    }
}

/// Where snapshots and the persisted index live
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_data_dir() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("almanac").to_string_lossy().to_string())
        .unwrap_or_else(|| "./almanac_data".to_string())
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl CatalogConfig {
    /// `data_dir` with a leading `~/` expanded to the home directory
    pub fn data_path(&self) -> PathBuf {
        match (self.data_dir.strip_prefix("~/"), dirs::home_dir()) {
            (Some(rest), Some(home)) => home.join(rest),
            _ => PathBuf::from(&self.data_dir),
        }
    }
}

/// Chunking and retrieval settings
#[derive(Debug, Clone, Deserialize)]
pub struct IndexConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Candidates fetched from the index per question, before temporal filtering
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

fn default_top_k() -> usize {
    8
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            top_k: default_top_k(),
        }
    }
}

/// Which embedding backend to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// Mistral when an API key is configured, local hashing otherwise
    #[default]
    Auto,
    Mistral,
    Hashing,
}

/// Embedding backend configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub provider: EmbeddingProvider,

    pub api_key: Option<String>,

    #[serde(default = "default_mistral_url")]
    pub base_url: String,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Vector size of the local hashing embedder
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,

    #[serde(default = "default_embedding_timeout")]
    pub request_timeout_secs: u64,
}

fn default_mistral_url() -> String {
    "https://api.mistral.ai".to_string()
}

fn default_embedding_model() -> String {
    "mistral-embed".to_string()
}

fn default_dimensions() -> usize {
    384
}

fn default_embedding_timeout() -> u64 {
    30
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::default(),
            api_key: None,
            base_url: default_mistral_url(),
            model: default_embedding_model(),
            dimensions: default_dimensions(),
            request_timeout_secs: default_embedding_timeout(),
        }
    }
}

impl EmbeddingConfig {
    /// API key, ignoring empty values and the sample placeholder
    pub fn usable_api_key(&self) -> Option<&str> {
        usable_key(self.api_key.as_deref())
    }
}

/// Answer generator configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratorConfig {
    pub api_key: Option<String>,

    #[serde(default = "default_mistral_url")]
    pub base_url: String,

    #[serde(default = "default_chat_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_generator_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_chat_model() -> String {
    "mistral-small-latest".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_generator_timeout() -> u64 {
    60
}

fn default_max_retries() -> u32 {
    3
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_mistral_url(),
            model: default_chat_model(),
            temperature: default_temperature(),
            request_timeout_secs: default_generator_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl GeneratorConfig {
    /// API key, ignoring empty values and the sample placeholder
    pub fn usable_api_key(&self) -> Option<&str> {
        usable_key(self.api_key.as_deref())
    }
}

const PLACEHOLDER_KEYS: &[&str] = &["votre_cle_mistral_ici", "your_api_key_here", "changeme"];

fn usable_key(key: Option<&str>) -> Option<&str> {
    key.map(str::trim)
        .filter(|k| !k.is_empty() && !PLACEHOLDER_KEYS.contains(k))
}

/// Catalog wall clock
#[derive(Debug, Clone, Deserialize)]
pub struct ClockConfig {
    /// UTC offset used for day, week and month boundaries
    #[serde(default = "default_utc_offset")]
    pub utc_offset: String,
}

fn default_utc_offset() -> String {
    "+01:00".to_string()
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            utc_offset: default_utc_offset(),
        }
    }
}

impl ClockConfig {
    pub fn clock(&self) -> Result<Clock, ConfigError> {
        self.utc_offset
            .parse()
            .map_err(|error| ConfigError::Invalid {
                field: "clock.utc_offset".to_string(),
                error,
            })
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("almanac").join("config.toml")),
            Some(PathBuf::from("/etc/almanac/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Catalog clock built from `clock.utc_offset`
    pub fn clock(&self) -> Result<Clock, ConfigError> {
        self.clock.clock()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        // API overrides
        if let Ok(host) = std::env::var("ALMANAC_API_HOST") {
            self.api.host = host;
        }
        if let Some(port) = env_parse("ALMANAC_API_PORT") {
            self.api.port = port;
        }

        // Catalog overrides
        if let Ok(data_dir) = std::env::var("ALMANAC_DATA_DIR") {
            self.catalog.data_dir = data_dir;
        }
        if let Some(top_k) = env_parse("ALMANAC_TOP_K") {
            self.index.top_k = top_k;
        }
        if let Ok(offset) = std::env::var("ALMANAC_UTC_OFFSET") {
            self.clock.utc_offset = offset;
        }

        // Upstream agenda overrides
        if let Ok(key) = std::env::var("OPENAGENDA_API_KEY") {
            self.source.api_key = Some(key).filter(|k| !k.trim().is_empty());
        }
        if let Ok(uid) = std::env::var("OPENAGENDA_AGENDA_UID") {
            self.source.agenda_uid = uid;
        }
        if let Ok(mock) = std::env::var("MOCK_DATA") {
            self.source.mock = mock.eq_ignore_ascii_case("true") || mock == "1";
        }

        // One Mistral key serves both embeddings and generation
        if let Ok(key) = std::env::var("MISTRAL_API_KEY") {
            self.embedding.api_key = Some(key.clone());
            self.generator.api_key = Some(key);
        }

        // Logging overrides
        if let Ok(level) = std::env::var("ALMANAC_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("ALMANAC_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring invalid value for {}: {:?}", name, raw);
            None
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Invalid value for {field}: {error}")]
    Invalid { field: String, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Almanac Configuration
#
# Environment variables override these settings:
# - ALMANAC_API_HOST, ALMANAC_API_PORT
# - ALMANAC_DATA_DIR, ALMANAC_TOP_K, ALMANAC_UTC_OFFSET
# - ALMANAC_LOG_LEVEL, ALMANAC_LOG_FORMAT
# - OPENAGENDA_API_KEY, OPENAGENDA_AGENDA_UID, MOCK_DATA
# - MISTRAL_API_KEY (embeddings and generation)

[api]
host = "0.0.0.0"
port = 8000
# Allowed CORS origins (empty = permissive)
cors_origins = []
request_timeout_secs = 60

[source]
# OpenAgenda agenda to index
agenda_uid = "826334"
# api_key = ""
api_base_url = "https://api.openagenda.com/v2"
legacy_base_url = "https://openagenda.com/agendas"
limit = 100
# Drop events whose last session ended more than this many days ago
recent_days = 365
# Language read from localized fields
lang = "fr"
# Serve a synthetic event instead of calling OpenAgenda
mock = false
request_timeout_secs = 10

[catalog]
# Directory holding raw_events.json, events.json and index.bin
data_dir = "~/.local/share/almanac"

[index]
chunk_size = 1000
chunk_overlap = 200
# Candidates retrieved per question before temporal filtering
top_k = 8

[embedding]
# auto: Mistral when an API key is set, local hashing embedder otherwise
provider = "auto"
base_url = "https://api.mistral.ai"
model = "mistral-embed"
dimensions = 384
request_timeout_secs = 30

[generator]
base_url = "https://api.mistral.ai"
model = "mistral-small-latest"
temperature = 0.2
request_timeout_secs = 60
max_retries = 3

[clock]
# Offset used for "tomorrow", "this weekend", month boundaries
utc_offset = "+01:00"

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_parses() {
        let config: Config = toml::from_str(&generate_default_config()).unwrap();

        assert_eq!(config.api.port, 8000);
        assert_eq!(config.source.agenda_uid, "826334");
        assert_eq!(config.index.chunk_size, 1000);
        assert_eq!(config.index.chunk_overlap, 200);
        assert_eq!(config.embedding.provider, EmbeddingProvider::Auto);
        assert_eq!(config.clock().unwrap().offset().local_minus_utc(), 3600);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[index]\ntop_k = 3\n\n[embedding]\nprovider = \"hashing\"").unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.index.top_k, 3);
        assert_eq!(config.index.chunk_size, 1000);
        assert_eq!(config.embedding.provider, EmbeddingProvider::Hashing);
        assert_eq!(config.source.lang, "fr");
    }

    #[test]
    fn test_invalid_file_reports_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[index\ntop_k = ").unwrap();

        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_data_path_expands_home() {
        let config = CatalogConfig {
            data_dir: "~/almanac".to_string(),
        };
        if let Some(home) = dirs::home_dir() {
            assert_eq!(config.data_path(), home.join("almanac"));
        }

        let plain = CatalogConfig {
            data_dir: "/var/lib/almanac".to_string(),
        };
        assert_eq!(plain.data_path(), PathBuf::from("/var/lib/almanac"));
    }

    #[test]
    fn test_invalid_offset() {
        let config = ClockConfig {
            utc_offset: "Paris".to_string(),
        };
        assert!(matches!(config.clock(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_placeholder_keys_are_not_usable() {
        let mut config = GeneratorConfig::default();
        assert_eq!(config.usable_api_key(), None);

        config.api_key = Some("votre_cle_mistral_ici".to_string());
        assert_eq!(config.usable_api_key(), None);

        config.api_key = Some("  ".to_string());
        assert_eq!(config.usable_api_key(), None);

        config.api_key = Some("sk-live".to_string());
        assert_eq!(config.usable_api_key(), Some("sk-live"));
    }
}
