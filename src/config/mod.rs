// Configuration management module
// TOML settings plus the startup credential

pub mod settings;

pub use settings::{
    API_KEY_ENV, AnswerConfig, CONFIG_FILE_NAME, Config, ConfigError, Credentials,
    DEFAULT_SAMPLE_QUESTION, IndexConfig, LlmConfig, OllamaConfig, RetrievalConfig, SourceConfig,
};
