#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

use crate::prompt::{DEFAULT_TEMPLATE, PromptTemplate};

pub const CONFIG_FILE_NAME: &str = "faq-qa.toml";
pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";
pub const DEFAULT_SAMPLE_QUESTION: &str = "Do you have javascript course?";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub ollama: OllamaConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub answer: AnswerConfig,
    #[serde(skip)]
    pub base_dir: PathBuf,
}

/// Location and shape of the FAQ spreadsheet
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SourceConfig {
    pub path: PathBuf,
    /// WHATWG encoding label, e.g. `windows-1252` or `utf-8`
    pub encoding: String,
    /// Column whose value identifies a row
    pub key_column: String,
    pub delimiter: char,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("codebasics_faqs.csv"),
            encoding: "windows-1252".to_string(),
            key_column: "prompt".to_string(),
            delimiter: ',',
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IndexConfig {
    pub path: PathBuf,
    pub table: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("faq_index"),
            table: "faqs".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OllamaConfig {
    pub protocol: String,
    pub host: String,
    pub port: u16,
    pub model: String,
    pub batch_size: u32,
    pub timeout_seconds: u64,
    pub retry_attempts: u32,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            protocol: "http".to_string(),
            host: "localhost".to_string(),
            port: 11434,
            model: "nomic-embed-text:latest".to_string(),
            batch_size: 64,
            timeout_seconds: 120,
            retry_attempts: 1,
        }
    }
}

/// Hosted language model settings. The API key is never stored here, see [`Credentials`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_seconds: u64,
    pub retry_attempts: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-2.5-flash".to_string(),
            temperature: 0.2,
            timeout_seconds: 120,
            retry_attempts: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
    /// Minimum cosine similarity a document needs to be used as context
    pub score_threshold: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 4,
            score_threshold: 0.7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnswerConfig {
    pub prompt_template: String,
    pub sample_question: String,
}

impl Default for AnswerConfig {
    fn default() -> Self {
        Self {
            prompt_template: DEFAULT_TEMPLATE.to_string(),
            sample_question: DEFAULT_SAMPLE_QUESTION.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing credential: environment variable {0} is not set")]
    MissingCredential(&'static str),
    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),
    #[error("Invalid port: {0} (must be between 1 and 65535)")]
    InvalidPort(u16),
    #[error("Invalid protocol: {0} (must be 'http' or 'https')")]
    InvalidProtocol(String),
    #[error("Invalid batch size: {0} (must be between 1 and 1000)")]
    InvalidBatchSize(u32),
    #[error("Invalid model name: {0} (cannot be empty)")]
    InvalidModel(String),
    #[error("Invalid timeout: {0} (must be between 1 and 3600 seconds)")]
    InvalidTimeout(u64),
    #[error("Invalid retry attempts: {0} (must be between 1 and 10)")]
    InvalidRetryAttempts(u32),
    #[error("Unknown text encoding: {0}")]
    InvalidEncoding(String),
    #[error("Invalid key column: {0:?} (cannot be empty)")]
    InvalidKeyColumn(String),
    #[error("Invalid delimiter: {0:?} (must be a single ASCII character)")]
    InvalidDelimiter(char),
    #[error("Invalid table name: {0:?} (cannot be empty)")]
    InvalidTable(String),
    #[error("Invalid score threshold: {0} (must be between 0.0 and 1.0)")]
    InvalidScoreThreshold(f32),
    #[error("Invalid top_k: {0} (must be between 1 and 100)")]
    InvalidTopK(usize),
    #[error("Invalid temperature: {0} (must be between 0.0 and 2.0)")]
    InvalidTemperature(f32),
    #[error("Invalid prompt template: {0}")]
    InvalidTemplate(String),
}

impl Default for Config {
    #[inline]
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            index: IndexConfig::default(),
            ollama: OllamaConfig::default(),
            llm: LlmConfig::default(),
            retrieval: RetrievalConfig::default(),
            answer: AnswerConfig::default(),
            base_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Load `faq-qa.toml` from `base_dir`, falling back to defaults when it does not exist
    #[inline]
    pub fn load<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let config_path = base_dir.as_ref().join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            return Ok(Self {
                base_dir: base_dir.as_ref().to_path_buf(),
                ..Self::default()
            });
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;
        config.base_dir = base_dir.as_ref().to_path_buf();

        config
            .validate()
            .with_context(|| "Configuration validation failed")?;

        Ok(config)
    }

    #[inline]
    pub fn save(&self) -> Result<()> {
        self.validate()
            .context("Configuration validation failed before saving")?;

        let base_dir = self.get_base_dir();

        fs::create_dir_all(base_dir)
            .with_context(|| format!("Failed to create base directory: {}", base_dir.display()))?;

        let config_path = self.config_file_path();
        let content = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    #[inline]
    pub fn get_base_dir(&self) -> &Path {
        &self.base_dir
    }

    #[inline]
    pub fn config_file_path(&self) -> PathBuf {
        self.get_base_dir().join(CONFIG_FILE_NAME)
    }

    /// Path of the FAQ spreadsheet, resolved against the base directory
    #[inline]
    pub fn source_path(&self) -> PathBuf {
        self.resolve(&self.source.path)
    }

    /// Directory holding the persisted vector index
    #[inline]
    pub fn index_path(&self) -> PathBuf {
        self.resolve(&self.index.path)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.get_base_dir().join(path)
        }
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.source.validate()?;
        self.index.validate()?;
        self.ollama.validate()?;
        self.llm.validate()?;
        self.retrieval.validate()?;
        self.answer.validate()?;
        Ok(())
    }
}

impl SourceConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if encoding_rs::Encoding::for_label(self.encoding.trim().as_bytes()).is_none() {
            return Err(ConfigError::InvalidEncoding(self.encoding.clone()));
        }

        if self.key_column.trim().is_empty() {
            return Err(ConfigError::InvalidKeyColumn(self.key_column.clone()));
        }

        self.delimiter_byte()?;
        Ok(())
    }

    /// The delimiter as the single byte the CSV reader expects
    pub fn delimiter_byte(&self) -> Result<u8, ConfigError> {
        if self.delimiter.is_ascii() && !self.delimiter.is_ascii_alphanumeric() {
            Ok(self.delimiter as u8)
        } else {
            Err(ConfigError::InvalidDelimiter(self.delimiter))
        }
    }
}

impl IndexConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.table.trim().is_empty() {
            return Err(ConfigError::InvalidTable(self.table.clone()));
        }
        Ok(())
    }
}

impl OllamaConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.protocol != "http" && self.protocol != "https" {
            return Err(ConfigError::InvalidProtocol(self.protocol.clone()));
        }

        let url_str = format!("{}://{}:{}", self.protocol, self.host, self.port);
        Url::parse(&url_str).map_err(|_| ConfigError::InvalidUrl(url_str))?;

        if self.port == 0 {
            return Err(ConfigError::InvalidPort(self.port));
        }

        if self.model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.model.clone()));
        }

        if self.batch_size == 0 || self.batch_size > 1000 {
            return Err(ConfigError::InvalidBatchSize(self.batch_size));
        }

        validate_timeout(self.timeout_seconds)?;
        validate_retry_attempts(self.retry_attempts)?;

        Ok(())
    }

    pub fn ollama_url(&self) -> Result<Url, ConfigError> {
        let url_str = format!("{}://{}:{}", self.protocol, self.host, self.port);
        Url::parse(&url_str).map_err(|_| ConfigError::InvalidUrl(url_str))
    }
}

impl LlmConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.base_url()?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidProtocol(url.scheme().to_string()));
        }

        if self.model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.model.clone()));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::InvalidTemperature(self.temperature));
        }

        validate_timeout(self.timeout_seconds)?;
        validate_retry_attempts(self.retry_attempts)?;

        Ok(())
    }

    pub fn base_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.base_url).map_err(|_| ConfigError::InvalidUrl(self.base_url.clone()))
    }
}

impl RetrievalConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.score_threshold) {
            return Err(ConfigError::InvalidScoreThreshold(self.score_threshold));
        }

        if !(1..=100).contains(&self.top_k) {
            return Err(ConfigError::InvalidTopK(self.top_k));
        }

        Ok(())
    }
}

impl AnswerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        PromptTemplate::new(self.prompt_template.as_str())
            .map_err(|e| ConfigError::InvalidTemplate(e.to_string()))?;
        Ok(())
    }
}

fn validate_timeout(timeout_seconds: u64) -> Result<(), ConfigError> {
    if !(1..=3600).contains(&timeout_seconds) {
        return Err(ConfigError::InvalidTimeout(timeout_seconds));
    }
    Ok(())
}

fn validate_retry_attempts(attempts: u32) -> Result<(), ConfigError> {
    if !(1..=10).contains(&attempts) {
        return Err(ConfigError::InvalidRetryAttempts(attempts));
    }
    Ok(())
}

/// API credential for the hosted language model, read once at startup
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    api_key: String,
}

impl Credentials {
    #[inline]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }

    /// Read the credential from `GOOGLE_API_KEY`
    #[inline]
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_var(API_KEY_ENV)
    }

    #[inline]
    pub fn from_var(name: &'static str) -> Result<Self, ConfigError> {
        match std::env::var(name) {
            Ok(value) if !value.trim().is_empty() => Ok(Self::new(value.trim())),
            _ => Err(ConfigError::MissingCredential(name)),
        }
    }

    #[inline]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

impl fmt::Debug for Credentials {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .finish()
    }
}
