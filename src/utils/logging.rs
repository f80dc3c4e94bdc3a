//! Diagnostic log setup.
//!
//! The chat UI owns the terminal, so its diagnostics go to a file. One-shot
//! commands log to stderr.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use directories::ProjectDirs;
use tracing_subscriber::EnvFilter;

use crate::core::config::path_display;

pub const LOG_ENV_VAR: &str = "PALAVER_LOG";
const DEFAULT_FILTER: &str = "warn";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    File(PathBuf),
    Stderr,
}

pub fn default_log_path() -> Option<PathBuf> {
    ProjectDirs::from("org", "palaver", "palaver")
        .map(|dirs| dirs.data_local_dir().join("palaver.log"))
}

/// Pick the first filter that parses from the environment value, the
/// configured value and the built-in default. Rejected inputs are returned so
/// the caller can report them.
pub fn resolve_filter(
    env_value: Option<&str>,
    configured: Option<&str>,
) -> (EnvFilter, Vec<String>) {
    let mut rejected = Vec::new();
    for (origin, candidate) in [(LOG_ENV_VAR, env_value), ("log_filter", configured)] {
        let Some(candidate) = candidate.map(str::trim).filter(|c| !c.is_empty()) else {
            continue;
        };
        match EnvFilter::try_new(candidate) {
            Ok(filter) => return (filter, rejected),
            Err(err) => rejected.push(format!("ignoring invalid {origin} '{candidate}': {err}")),
        }
    }
    (EnvFilter::new(DEFAULT_FILTER), rejected)
}

fn open_log_file(path: &Path) -> Result<std::fs::File, Box<dyn std::error::Error>> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|err| format!("Failed to open log file {}: {err}", path_display(path)).into())
}

/// Install the global subscriber. A second call is a no-op.
pub fn init(target: &LogTarget, configured: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let env_value = std::env::var(LOG_ENV_VAR).ok();
    let (filter, rejected) = resolve_filter(env_value.as_deref(), configured);
    for warning in &rejected {
        eprintln!("⚠️  {warning}");
    }

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = match target {
        LogTarget::File(path) => {
            let file = open_log_file(path)?;
            builder
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .try_init()
        }
        LogTarget::Stderr => builder.with_writer(std::io::stderr).try_init(),
    };
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_filter_takes_precedence() {
        let (filter, rejected) = resolve_filter(Some("palaver=debug"), Some("info"));
        assert_eq!(filter.to_string().to_ascii_lowercase(), "palaver=debug");
        assert!(rejected.is_empty());
    }

    #[test]
    fn invalid_filters_fall_back_with_warnings() {
        let (filter, rejected) = resolve_filter(Some("palaver=loud"), Some("info"));
        assert_eq!(filter.to_string().to_ascii_lowercase(), "info");
        assert_eq!(rejected.len(), 1);
        assert!(rejected[0].contains(LOG_ENV_VAR));

        let (filter, rejected) = resolve_filter(Some("palaver=loud"), Some("palaver=quiet"));
        assert_eq!(filter.to_string().to_ascii_lowercase(), "warn");
        assert_eq!(rejected.len(), 2);
    }

    #[test]
    fn blank_values_are_skipped() {
        let (filter, rejected) = resolve_filter(Some("  "), None);
        assert_eq!(filter.to_string().to_ascii_lowercase(), "warn");
        assert!(rejected.is_empty());
    }

    #[test]
    fn log_file_is_created_with_parents() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let path = dir.path().join("logs").join("palaver.log");
        open_log_file(&path).expect("open");
        assert!(path.exists());
    }
}
