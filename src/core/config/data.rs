use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::api::GenerationConfig;
use crate::core::gemini::{DEFAULT_BASE_URL, DEFAULT_GENERATION, DEFAULT_MODEL};
use crate::core::preferences::{Language, ThemeKind};

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Persistent user defaults. Every field is optional so that unset values
/// fall back to built-in defaults and are not written back out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<ThemeKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markdown: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub syntax: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,
    #[serde(default, skip_serializing_if = "GenerationSettings::is_empty")]
    pub generation: GenerationSettings,
}

/// Sampling overrides for the `[generation]` table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

impl GenerationSettings {
    pub fn is_empty(&self) -> bool {
        *self == GenerationSettings::default()
    }

    pub fn resolve(&self) -> GenerationConfig {
        GenerationConfig {
            temperature: self.temperature.unwrap_or(DEFAULT_GENERATION.temperature),
            top_k: self.top_k.unwrap_or(DEFAULT_GENERATION.top_k),
            top_p: self.top_p.unwrap_or(DEFAULT_GENERATION.top_p),
            max_output_tokens: self
                .max_output_tokens
                .unwrap_or(DEFAULT_GENERATION.max_output_tokens),
        }
    }
}

impl Config {
    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn theme(&self) -> ThemeKind {
        self.theme.unwrap_or_default()
    }

    pub fn language(&self) -> Language {
        self.language.unwrap_or_default()
    }

    pub fn markdown_enabled(&self) -> bool {
        self.markdown.unwrap_or(true)
    }

    pub fn syntax_enabled(&self) -> bool {
        self.syntax.unwrap_or(true)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    pub fn generation_config(&self) -> GenerationConfig {
        self.generation.resolve()
    }
}

pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
