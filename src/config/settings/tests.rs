use super::*;
use serial_test::serial;
use tempfile::TempDir;

#[test]
fn default_config() {
    let config = Config::default();
    assert_eq!(config.source.path, PathBuf::from("codebasics_faqs.csv"));
    assert_eq!(config.source.encoding, "windows-1252");
    assert_eq!(config.source.key_column, "prompt");
    assert_eq!(config.index.path, PathBuf::from("faq_index"));
    assert_eq!(config.ollama.protocol, "http");
    assert_eq!(config.ollama.host, "localhost");
    assert_eq!(config.ollama.port, 11434);
    assert_eq!(config.ollama.model, "nomic-embed-text:latest");
    assert_eq!(config.ollama.batch_size, 64);
    assert!((config.llm.temperature - 0.2).abs() < f32::EPSILON);
    assert!((config.retrieval.score_threshold - 0.7).abs() < f32::EPSILON);
    assert_eq!(config.retrieval.top_k, 4);
    assert_eq!(config.answer.sample_question, DEFAULT_SAMPLE_QUESTION);
}

#[test]
fn config_validation() {
    let config = Config::default();
    assert!(config.validate().is_ok());

    let mut invalid_config = config.clone();
    invalid_config.ollama.protocol = "ftp".to_string();
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.ollama.port = 0;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.ollama.batch_size = 1001;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.source.encoding = "klingon-8".to_string();
    assert!(matches!(
        invalid_config.validate(),
        Err(ConfigError::InvalidEncoding(_))
    ));

    let mut invalid_config = config.clone();
    invalid_config.source.key_column = "  ".to_string();
    assert!(matches!(
        invalid_config.validate(),
        Err(ConfigError::InvalidKeyColumn(_))
    ));

    let mut invalid_config = config.clone();
    invalid_config.source.delimiter = 'é';
    assert!(matches!(
        invalid_config.validate(),
        Err(ConfigError::InvalidDelimiter('é'))
    ));

    let mut invalid_config = config.clone();
    invalid_config.retrieval.score_threshold = 1.5;
    assert!(matches!(
        invalid_config.validate(),
        Err(ConfigError::InvalidScoreThreshold(_))
    ));

    let mut invalid_config = config.clone();
    invalid_config.retrieval.top_k = 0;
    assert!(matches!(
        invalid_config.validate(),
        Err(ConfigError::InvalidTopK(0))
    ));

    let mut invalid_config = config.clone();
    invalid_config.llm.temperature = -0.1;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.llm.base_url = "not a url".to_string();
    assert!(matches!(
        invalid_config.validate(),
        Err(ConfigError::InvalidUrl(_))
    ));

    let mut invalid_config = config.clone();
    invalid_config.llm.retry_attempts = 0;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config;
    invalid_config.answer.prompt_template = "Only {question} here".to_string();
    assert!(matches!(
        invalid_config.validate(),
        Err(ConfigError::InvalidTemplate(_))
    ));
}

#[test]
fn ollama_url_generation() {
    let config = Config::default();
    let url = config
        .ollama
        .ollama_url()
        .expect("should generate ollama_url successfully");
    assert_eq!(url.as_str(), "http://localhost:11434/");
}

#[test]
fn relative_paths_resolve_against_base_dir() {
    let config = Config {
        base_dir: PathBuf::from("/srv/faq"),
        ..Config::default()
    };

    assert_eq!(
        config.source_path(),
        PathBuf::from("/srv/faq/codebasics_faqs.csv")
    );
    assert_eq!(config.index_path(), PathBuf::from("/srv/faq/faq_index"));

    let mut absolute = config;
    absolute.index.path = PathBuf::from("/var/lib/faq_index");
    assert_eq!(absolute.index_path(), PathBuf::from("/var/lib/faq_index"));
}

#[test]
fn toml_serialization() {
    let config = Config::default();
    let toml_str = toml::to_string(&config).expect("should serialize toml correctly");
    let parsed_config: Config = toml::from_str(&toml_str).expect("should parse toml correctly");
    assert_eq!(config, parsed_config);
}

#[test]
fn partial_toml_uses_section_defaults() {
    let parsed: Config = toml::from_str(
        r#"
[source]
path = "faqs.csv"
encoding = "utf-8"

[retrieval]
score_threshold = 0.5
"#,
    )
    .expect("should parse partial toml");

    assert_eq!(parsed.source.path, PathBuf::from("faqs.csv"));
    assert_eq!(parsed.source.encoding, "utf-8");
    assert_eq!(parsed.source.key_column, "prompt");
    assert_eq!(parsed.retrieval.top_k, 4);
    assert!((parsed.retrieval.score_threshold - 0.5).abs() < f32::EPSILON);
    assert_eq!(parsed.ollama, OllamaConfig::default());
}

#[test]
fn ollama_fields_are_checked_by_validate() {
    let config = OllamaConfig {
        host: "example.com".to_string(),
        model: "new-model".to_string(),
        batch_size: 128,
        ..OllamaConfig::default()
    };
    assert!(config.validate().is_ok());

    let blank_model = OllamaConfig {
        model: "  ".to_string(),
        ..config.clone()
    };
    assert!(matches!(
        blank_model.validate(),
        Err(ConfigError::InvalidModel(_))
    ));

    let bad_host = OllamaConfig {
        host: "bad host".to_string(),
        ..config.clone()
    };
    assert!(matches!(bad_host.validate(), Err(ConfigError::InvalidUrl(_))));

    let oversized = OllamaConfig {
        batch_size: 1001,
        ..config
    };
    assert!(matches!(
        oversized.validate(),
        Err(ConfigError::InvalidBatchSize(1001))
    ));
}

#[test]
fn load_missing_config() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = Config::load(temp_dir.path()).expect("should load config successfully");
    assert_eq!(config.get_base_dir(), temp_dir.path());
    assert_eq!(config.source, SourceConfig::default());
    assert_eq!(config.retrieval, RetrievalConfig::default());
}

#[test]
fn save_and_load_round_trip() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let mut config = Config {
        base_dir: temp_dir.path().to_path_buf(),
        ..Config::default()
    };
    config.source.encoding = "utf-8".to_string();
    config.retrieval.top_k = 2;
    config.save().expect("should save config");

    let loaded = Config::load(temp_dir.path()).expect("should load saved config");
    assert_eq!(loaded, config);
}

#[test]
fn load_rejects_invalid_file() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    fs::write(
        temp_dir.path().join(CONFIG_FILE_NAME),
        "[retrieval]\nscore_threshold = 3.0\n",
    )
    .expect("should write config file");

    assert!(Config::load(temp_dir.path()).is_err());
}

#[test]
fn load_reports_malformed_toml_with_path() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    fs::write(
        temp_dir.path().join(CONFIG_FILE_NAME),
        "[retrieval\ntop_k = 2\n",
    )
    .expect("should write config file");

    let err = Config::load(temp_dir.path()).expect_err("malformed TOML should fail");
    let message = format!("{:#}", err);
    assert!(message.contains("Failed to parse config file"));
    assert!(message.contains(CONFIG_FILE_NAME));
}

#[test]
fn credentials_debug_is_redacted() {
    let credentials = Credentials::new("secret-key");
    let debug = format!("{:?}", credentials);
    assert!(!debug.contains("secret-key"));
    assert_eq!(credentials.api_key(), "secret-key");
}

#[test]
#[serial]
fn missing_credential_is_an_error() {
    let result = Credentials::from_var("FAQ_QA_TEST_UNSET_CREDENTIAL");
    assert!(matches!(
        result,
        Err(ConfigError::MissingCredential("FAQ_QA_TEST_UNSET_CREDENTIAL"))
    ));
}

#[test]
#[serial]
fn credential_read_from_environment() {
    // SAFETY: tests touching the environment are serialized.
    unsafe {
        std::env::set_var("FAQ_QA_TEST_CREDENTIAL", "  key-123  ");
    }
    let credentials =
        Credentials::from_var("FAQ_QA_TEST_CREDENTIAL").expect("credential should be read");
    assert_eq!(credentials.api_key(), "key-123");

    // SAFETY: tests touching the environment are serialized.
    unsafe {
        std::env::set_var("FAQ_QA_TEST_CREDENTIAL", "   ");
    }
    assert!(Credentials::from_var("FAQ_QA_TEST_CREDENTIAL").is_err());

    // SAFETY: tests touching the environment are serialized.
    unsafe {
        std::env::remove_var("FAQ_QA_TEST_CREDENTIAL");
    }
}
