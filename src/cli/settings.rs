//! `set` / `unset` handling for the persistent defaults.

use std::str::FromStr;

use thiserror::Error;

use crate::core::config::data::DEFAULT_REQUEST_TIMEOUT_SECS;
use crate::core::config::Config;
use crate::core::preferences::{Language, ThemeKind};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingError {
    #[error("Unknown config key: {0} (expected one of: {keys})", keys = ConfigKey::names().join(", "))]
    UnknownKey(String),
    #[error("Missing value. Example: {example}")]
    MissingValue { example: &'static str },
    #[error("Invalid boolean value: {0}. Use 'on' or 'off' (also accepts true/false, yes/no)")]
    InvalidBoolean(String),
    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    Model,
    BaseUrl,
    Theme,
    Language,
    Markdown,
    Syntax,
    Timeout,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 7] = [
        ConfigKey::Model,
        ConfigKey::BaseUrl,
        ConfigKey::Theme,
        ConfigKey::Language,
        ConfigKey::Markdown,
        ConfigKey::Syntax,
        ConfigKey::Timeout,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ConfigKey::Model => "model",
            ConfigKey::BaseUrl => "base-url",
            ConfigKey::Theme => "theme",
            ConfigKey::Language => "language",
            ConfigKey::Markdown => "markdown",
            ConfigKey::Syntax => "syntax",
            ConfigKey::Timeout => "timeout",
        }
    }

    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|key| key.name()).collect()
    }

    fn example(self) -> &'static str {
        match self {
            ConfigKey::Model => "palaver set model gemini-1.5-pro",
            ConfigKey::BaseUrl => {
                "palaver set base-url https://generativelanguage.googleapis.com/v1beta"
            }
            ConfigKey::Theme => "palaver set theme dark",
            ConfigKey::Language => "palaver set language es",
            ConfigKey::Markdown => "palaver set markdown off",
            ConfigKey::Syntax => "palaver set syntax off",
            ConfigKey::Timeout => "palaver set timeout 90",
        }
    }
}

impl FromStr for ConfigKey {
    type Err = SettingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|key| key.name() == normalized)
            .ok_or_else(|| SettingError::UnknownKey(s.to_string()))
    }
}

/// Accepts on/off, true/false, yes/no and 1/0, case-insensitively.
pub fn parse_bool(input: &str) -> Option<bool> {
    match input.trim().to_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Some(true),
        "off" | "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

fn format_bool(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

/// Apply `key = value` to `config` and return the confirmation line.
pub fn set_value(config: &mut Config, key: ConfigKey, value: &str) -> Result<String, SettingError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(SettingError::MissingValue {
            example: key.example(),
        });
    }

    let display = match key {
        ConfigKey::Model => {
            config.model = Some(value.to_string());
            value.to_string()
        }
        ConfigKey::BaseUrl => {
            reqwest::Url::parse(value).map_err(|err| SettingError::InvalidValue {
                key: key.name(),
                reason: err.to_string(),
            })?;
            let trimmed = value.trim_end_matches('/').to_string();
            config.base_url = Some(trimmed.clone());
            trimmed
        }
        ConfigKey::Theme => {
            let theme = ThemeKind::from_str(value).map_err(|reason| SettingError::InvalidValue {
                key: key.name(),
                reason,
            })?;
            config.theme = Some(theme);
            theme.to_string()
        }
        ConfigKey::Language => {
            let language =
                Language::from_str(value).map_err(|reason| SettingError::InvalidValue {
                    key: key.name(),
                    reason,
                })?;
            config.language = Some(language);
            format!("{} ({})", language.code(), language.display_name())
        }
        ConfigKey::Markdown | ConfigKey::Syntax => {
            let flag =
                parse_bool(value).ok_or_else(|| SettingError::InvalidBoolean(value.to_string()))?;
            if key == ConfigKey::Markdown {
                config.markdown = Some(flag);
            } else {
                config.syntax = Some(flag);
            }
            format_bool(flag).to_string()
        }
        ConfigKey::Timeout => {
            let secs = value
                .trim_end_matches('s')
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| SettingError::InvalidValue {
                    key: key.name(),
                    reason: format!("'{value}' is not a positive number of seconds"),
                })?;
            config.request_timeout_secs = Some(secs);
            format!("{secs}s")
        }
    };

    Ok(format!("✅ Set {} to: {display}", key.name()))
}

/// Clear `key` so the built-in default applies again.
pub fn unset_value(config: &mut Config, key: ConfigKey) -> String {
    match key {
        ConfigKey::Model => config.model = None,
        ConfigKey::BaseUrl => config.base_url = None,
        ConfigKey::Theme => config.theme = None,
        ConfigKey::Language => config.language = None,
        ConfigKey::Markdown => config.markdown = None,
        ConfigKey::Syntax => config.syntax = None,
        ConfigKey::Timeout => config.request_timeout_secs = None,
    }
    let default = match key {
        ConfigKey::Model => config.model().to_string(),
        ConfigKey::BaseUrl => config.base_url().to_string(),
        ConfigKey::Theme => config.theme().to_string(),
        ConfigKey::Language => config.language().to_string(),
        ConfigKey::Markdown => format_bool(config.markdown_enabled()).to_string(),
        ConfigKey::Syntax => format_bool(config.syntax_enabled()).to_string(),
        ConfigKey::Timeout => format!("{DEFAULT_REQUEST_TIMEOUT_SECS}s"),
    };
    format!("✅ Unset {} (will use default: {default})", key.name())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_parse_with_either_separator() {
        assert_eq!("base-url".parse::<ConfigKey>(), Ok(ConfigKey::BaseUrl));
        assert_eq!("BASE_URL".parse::<ConfigKey>(), Ok(ConfigKey::BaseUrl));
        assert_eq!(
            "provider".parse::<ConfigKey>(),
            Err(SettingError::UnknownKey("provider".into()))
        );
    }

    #[test]
    fn unknown_key_message_lists_valid_keys() {
        let message = SettingError::UnknownKey("nope".into()).to_string();
        assert!(message.contains("model"));
        assert!(message.contains("timeout"));
    }

    #[test]
    fn parse_bool_accepts_common_spellings() {
        assert_eq!(parse_bool("ON"), Some(true));
        assert_eq!(parse_bool("no"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn set_updates_typed_fields() {
        let mut config = Config::default();
        set_value(&mut config, ConfigKey::Theme, "Dark").unwrap();
        set_value(&mut config, ConfigKey::Language, "hindi").unwrap();
        set_value(&mut config, ConfigKey::Markdown, "off").unwrap();
        set_value(&mut config, ConfigKey::Timeout, "90s").unwrap();
        let message = set_value(&mut config, ConfigKey::BaseUrl, "http://localhost:8080/v1/").unwrap();

        assert_eq!(config.theme, Some(ThemeKind::Dark));
        assert_eq!(config.language, Some(Language::Hi));
        assert_eq!(config.markdown, Some(false));
        assert_eq!(config.request_timeout_secs, Some(90));
        assert_eq!(config.base_url.as_deref(), Some("http://localhost:8080/v1"));
        assert!(message.contains("base-url"));
    }

    #[test]
    fn invalid_values_leave_config_untouched() {
        let mut config = Config::default();
        assert!(matches!(
            set_value(&mut config, ConfigKey::Theme, "purple"),
            Err(SettingError::InvalidValue { key: "theme", .. })
        ));
        assert!(matches!(
            set_value(&mut config, ConfigKey::Syntax, "sometimes"),
            Err(SettingError::InvalidBoolean(_))
        ));
        assert!(matches!(
            set_value(&mut config, ConfigKey::Timeout, "0"),
            Err(SettingError::InvalidValue { key: "timeout", .. })
        ));
        assert!(matches!(
            set_value(&mut config, ConfigKey::BaseUrl, "not a url"),
            Err(SettingError::InvalidValue { .. })
        ));
        assert!(matches!(
            set_value(&mut config, ConfigKey::Model, "  "),
            Err(SettingError::MissingValue { .. })
        ));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn unset_restores_defaults() {
        let mut config = Config::default();
        set_value(&mut config, ConfigKey::Model, "gemini-1.5-pro").unwrap();
        let message = unset_value(&mut config, ConfigKey::Model);
        assert_eq!(config.model, None);
        assert!(message.contains(crate::core::gemini::DEFAULT_MODEL));
    }
}
