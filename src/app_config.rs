use anyhow::{anyhow, Context, Result};
use log::{warn, LevelFilter};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Language of the text to translate
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Language to translate into
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Case-insensitive suffix of the files to process
    #[serde(default = "default_file_extension")]
    pub file_extension: String,

    /// Checkpoint file, relative to the working directory
    #[serde(default = "default_progress_file")]
    pub progress_file: String,

    /// Bytes read from the start of a file for whole-file detection
    #[serde(default = "default_sample_bytes")]
    pub sample_bytes: usize,

    /// Per-line confidence under which UTF-8 is assumed
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,

    /// Rows per translation batch and checkpoint step
    #[serde(default = "default_rows_per_batch")]
    pub rows_per_batch: usize,

    /// Translation config
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Re-derive GBK text from cells decoded as Latin-1
    #[serde(default = "default_true")]
    pub repair_mojibake: bool,

    /// Logging config
    #[serde(default)]
    pub log: LogConfig,
}

/// Kind of translation backend
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Public Google web translation endpoint
    #[default]
    Google,
    /// MyMemory translation API
    MyMemory,
}

impl BackendKind {
    /// Capitalized backend name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Google => "Google",
            Self::MyMemory => "MyMemory",
        }
    }

    /// Lowercase backend identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Google => "google".to_string(),
            Self::MyMemory => "mymemory".to_string(),
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "mymemory" => Ok(Self::MyMemory),
            _ => Err(anyhow!("Invalid backend type: {}", s)),
        }
    }
}

/// One entry of the failover ring
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BackendConfig {
    /// Backend type
    #[serde(rename = "type")]
    pub kind: BackendKind,

    /// Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    /// Whether the backend takes part in the ring
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Contact address sent to services that grant higher quotas with one
    #[serde(default)]
    pub email: Option<String>,
}

impl BackendConfig {
    /// Backend config with the default endpoint for `kind`
    pub fn new(kind: BackendKind) -> Self {
        let endpoint = match kind {
            BackendKind::Google => default_google_endpoint(),
            BackendKind::MyMemory => default_mymemory_endpoint(),
        };
        Self {
            kind,
            endpoint,
            enabled: true,
            email: None,
        }
    }

    /// Configured endpoint, or the default one when left empty
    pub fn get_endpoint(&self) -> String {
        if self.endpoint.trim().is_empty() {
            Self::new(self.kind).endpoint
        } else {
            self.endpoint.clone()
        }
    }
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Backends tried in order, then in rotation
    #[serde(default = "default_backends")]
    pub backends: Vec<BackendConfig>,

    /// Upper bound of texts sent in one call
    #[serde(default = "default_max_texts_per_request")]
    pub max_texts_per_request: usize,

    /// Attempts per backend before failing over
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Pause between attempts on the same backend
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Pause after every batch that reached a backend
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    /// HTTP timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Whether translations are memoized for the run
    #[serde(default = "default_true")]
    pub cache_enabled: bool,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            backends: default_backends(),
            max_texts_per_request: default_max_texts_per_request(),
            retry_count: default_retry_count(),
            retry_delay_ms: default_retry_delay_ms(),
            request_delay_ms: default_request_delay_ms(),
            timeout_secs: default_timeout_secs(),
            cache_enabled: true,
        }
    }
}

impl TranslationConfig {
    /// Backends taking part in the ring, in order
    pub fn enabled_backends(&self) -> impl Iterator<Item = &BackendConfig> {
        self.backends.iter().filter(|b| b.enabled)
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Equivalent `log` filter
    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            Self::Error => LevelFilter::Error,
            Self::Warn => LevelFilter::Warn,
            Self::Info => LevelFilter::Info,
            Self::Debug => LevelFilter::Debug,
            Self::Trace => LevelFilter::Trace,
        }
    }
}

/// Console and rotating-file logging settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LogConfig {
    /// Console level
    #[serde(default)]
    pub level: LogLevel,

    /// Log file path; empty disables the file sink
    #[serde(default = "default_log_file")]
    pub file: String,

    /// File level
    #[serde(default = "default_file_level")]
    pub file_level: LogLevel,

    /// Size at which the log file is rotated
    #[serde(default = "default_log_max_bytes")]
    pub max_bytes: u64,

    /// Rotated files kept
    #[serde(default = "default_log_backup_count")]
    pub backup_count: u32,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            file: default_log_file(),
            file_level: default_file_level(),
            max_bytes: default_log_max_bytes(),
            backup_count: default_log_backup_count(),
        }
    }
}

fn default_source_language() -> String {
    "zh-CN".to_string()
}

fn default_target_language() -> String {
    "en".to_string()
}

fn default_file_extension() -> String {
    ".csv".to_string()
}

fn default_progress_file() -> String {
    "translation_progress.json".to_string()
}

fn default_sample_bytes() -> usize {
    crate::encoding::sniffer::DEFAULT_SAMPLE_BYTES
}

fn default_min_confidence() -> f32 {
    crate::encoding::decoder::DEFAULT_MIN_CONFIDENCE
}

fn default_rows_per_batch() -> usize {
    10
}

fn default_backends() -> Vec<BackendConfig> {
    vec![
        BackendConfig::new(BackendKind::Google),
        BackendConfig::new(BackendKind::MyMemory),
    ]
}

fn default_max_texts_per_request() -> usize {
    100
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    3000
}

fn default_request_delay_ms() -> u64 {
    1000
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_google_endpoint() -> String {
    "https://translate.googleapis.com/translate_a/single".to_string()
}

fn default_mymemory_endpoint() -> String {
    "https://api.mymemory.translated.net/get".to_string()
}

fn default_log_file() -> String {
    "translation.log".to_string()
}

fn default_file_level() -> LogLevel {
    LogLevel::Debug
}

fn default_log_max_bytes() -> u64 {
    5 * 1024 * 1024
}

fn default_log_backup_count() -> u32 {
    3
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        crate::language_utils::validate_language_tag(&self.source_language)
            .context("Invalid source language")?;
        crate::language_utils::validate_language_tag(&self.target_language)
            .context("Invalid target language")?;

        if self.file_extension.trim().is_empty() {
            return Err(anyhow!("File extension must not be empty"));
        }
        if self.rows_per_batch == 0 {
            return Err(anyhow!("rows_per_batch must be greater than zero"));
        }
        if self.translation.max_texts_per_request == 0 {
            return Err(anyhow!("max_texts_per_request must be greater than zero"));
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(anyhow!(
                "min_confidence must be between 0 and 1, got {}",
                self.min_confidence
            ));
        }

        for backend in self.translation.enabled_backends() {
            let endpoint = backend.get_endpoint();
            url::Url::parse(&endpoint).with_context(|| {
                format!(
                    "Invalid endpoint for {} backend: {}",
                    backend.kind.display_name(),
                    endpoint
                )
            })?;
        }

        Ok(())
    }

    /// Load `path`, writing the default configuration there first if it is missing
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            return Ok(config);
        }

        warn!(
            "Config file not found at '{}', creating default config.",
            path.display()
        );
        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        fs::write(path, config_json).with_context(|| {
            format!("Failed to write default config to file: {}", path.display())
        })?;
        Ok(config)
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_language: default_target_language(),
            file_extension: default_file_extension(),
            progress_file: default_progress_file(),
            sample_bytes: default_sample_bytes(),
            min_confidence: default_min_confidence(),
            rows_per_batch: default_rows_per_batch(),
            translation: TranslationConfig::default(),
            repair_mojibake: true,
            log: LogConfig::default(),
        }
    }
}
