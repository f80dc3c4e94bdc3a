use super::data::Config;
use super::io::ConfigError;
use crate::core::preferences::{Language, ThemeKind};
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn missing_file_yields_defaults() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config = Config::load_from_path(&temp_dir.path().join("absent.toml")).expect("load failed");

    assert_eq!(config, Config::default());
    assert_eq!(config.model(), "gemini-1.5-flash");
    assert_eq!(
        config.base_url(),
        "https://generativelanguage.googleapis.com/v1beta"
    );
    assert_eq!(config.theme(), ThemeKind::Light);
    assert_eq!(config.language(), Language::En);
    assert!(config.markdown_enabled());
    assert!(config.syntax_enabled());
    assert_eq!(config.request_timeout(), Duration::from_secs(60));
    assert_eq!(config.generation_config().max_output_tokens, 2048);
}

#[test]
fn save_then_load_preserves_values() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("nested").join("config.toml");

    let mut config = Config {
        model: Some("gemini-1.5-pro".to_string()),
        theme: Some(ThemeKind::Dark),
        language: Some(Language::Hi),
        markdown: Some(false),
        request_timeout_secs: Some(15),
        ..Default::default()
    };
    config.generation.temperature = Some(0.2);
    config.save_to_path(&config_path).expect("save failed");

    let loaded = Config::load_from_path(&config_path).expect("load failed");
    assert_eq!(loaded, config);
    assert_eq!(loaded.generation_config().temperature, 0.2);
    assert_eq!(loaded.generation_config().top_k, 1);
    assert_eq!(loaded.request_timeout(), Duration::from_secs(15));
}

#[test]
fn unset_fields_are_not_written() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("config.toml");

    Config {
        theme: Some(ThemeKind::Dark),
        ..Default::default()
    }
    .save_to_path(&config_path)
    .expect("save failed");

    let written = std::fs::read_to_string(&config_path).expect("read failed");
    assert_eq!(written.trim(), "theme = \"dark\"");
}

#[test]
fn parses_generation_table() {
    let config: Config = toml::from_str(
        r#"
model = "gemini-test"
language = "es"

[generation]
top_p = 0.5
max_output_tokens = 512
"#,
    )
    .expect("parse failed");

    let generation = config.generation_config();
    assert_eq!(config.model(), "gemini-test");
    assert_eq!(config.language(), Language::Es);
    assert_eq!(generation.top_p, 0.5);
    assert_eq!(generation.max_output_tokens, 512);
    assert_eq!(generation.temperature, 0.9);
}

#[test]
fn invalid_toml_reports_the_path() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(&config_path, "theme = [").expect("write failed");

    let err = Config::load_from_path(&config_path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains("config.toml"));
}

#[test]
fn unknown_theme_is_a_parse_error() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(&config_path, "theme = \"solarized\"").expect("write failed");

    assert!(matches!(
        Config::load_from_path(&config_path),
        Err(ConfigError::Parse { .. })
    ));
}

#[test]
fn zero_timeout_falls_back_to_default() {
    let config = Config {
        request_timeout_secs: Some(0),
        ..Default::default()
    };
    assert_eq!(config.request_timeout(), Duration::from_secs(60));
}

#[test]
fn describe_marks_defaults() {
    let config = Config {
        model: Some("gemini-test".to_string()),
        ..Default::default()
    };
    let lines = config.describe();
    assert!(lines.contains(&"  model: gemini-test".to_string()));
    assert!(lines.contains(&"  theme: light (default)".to_string()));
}
