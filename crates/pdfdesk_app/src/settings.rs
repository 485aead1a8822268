use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::LevelFilter;
use pdfdesk_core::{IntakePolicy, DEFAULT_MAX_FILE_BYTES, DEFAULT_MERGE_MAX_FILES};
use pdfdesk_engine::{EngineSettings, TransportSettings};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::platform::logging::LogDestination;

/// Looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "pdfdesk.ron";
pub const API_URL_ENV: &str = "PDFDESK_API_URL";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("could not read settings from {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("could not parse settings in {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: ron::error::SpannedError,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_url: String,
    pub output_dir: PathBuf,
    pub merge_max_files: usize,
    pub max_file_bytes: u64,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub max_response_bytes: u64,
    pub progress_tick_ms: u64,
    pub success_notice_delay_ms: u64,
    pub log_destination: LogDestination,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000".to_string(),
            output_dir: PathBuf::from("./output"),
            merge_max_files: DEFAULT_MERGE_MAX_FILES,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            connect_timeout_secs: 10,
            request_timeout_secs: 120,
            max_response_bytes: 200 * 1024 * 1024,
            progress_tick_ms: 500,
            success_notice_delay_ms: 500,
            log_destination: LogDestination::File,
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Reads settings from `explicit`, or from [`DEFAULT_CONFIG_FILE`] when present.
    ///
    /// An explicitly named file must exist; the default one may be absent.
    pub fn load(explicit: Option<&Path>) -> Result<Self, SettingsError> {
        let (path, required) = match explicit {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };
        match fs::read_to_string(&path) {
            Ok(text) => Self::parse(&text).map_err(|source| SettingsError::Parse { path, source }),
            Err(err) if err.kind() == io::ErrorKind::NotFound && !required => {
                Ok(Settings::default())
            }
            Err(source) => Err(SettingsError::Read { path, source }),
        }
    }

    pub fn parse(text: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(text)
    }

    /// Applies environment overrides through `lookup` (normally `std::env::var`).
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(API_URL_ENV).filter(|url| !url.trim().is_empty()) {
            self.api_url = url.trim().to_string();
        }
    }

    /// Applies command line overrides; these win over file and environment.
    pub fn apply_overrides(&mut self, api_url: Option<String>, output_dir: Option<PathBuf>) {
        if let Some(url) = api_url {
            self.api_url = url;
        }
        if let Some(dir) = output_dir {
            self.output_dir = dir;
        }
    }

    /// Unknown level names fall back to `Info`.
    pub fn level_filter(&self) -> LevelFilter {
        self.log_level.trim().parse().unwrap_or(LevelFilter::Info)
    }

    pub fn intake_policy(&self) -> IntakePolicy {
        IntakePolicy {
            merge_max_files: self.merge_max_files,
            max_file_bytes: self.max_file_bytes,
        }
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            transport: TransportSettings {
                base_url: self.api_url.clone(),
                connect_timeout: Duration::from_secs(self.connect_timeout_secs),
                request_timeout: Duration::from_secs(self.request_timeout_secs),
                max_bytes: self.max_response_bytes,
            },
            tick_interval: Duration::from_millis(self.progress_tick_ms.max(1)),
            notice_delay: Duration::from_millis(self.success_notice_delay_ms),
            output_dir: self.output_dir.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn partial_file_keeps_defaults_for_the_rest() {
        let settings = Settings::parse(
            r#"(api_url: "http://pdf.internal:9000", merge_max_files: 4, log_destination: Both)"#,
        )
        .unwrap();
        assert_eq!(settings.api_url, "http://pdf.internal:9000");
        assert_eq!(settings.merge_max_files, 4);
        assert_eq!(settings.log_destination, LogDestination::Both);
        assert_eq!(settings.max_file_bytes, 50 * 1024 * 1024);
        assert_eq!(settings.output_dir, PathBuf::from("./output"));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope.ron");
        assert!(matches!(
            Settings::load(Some(&missing)),
            Err(SettingsError::Read { .. })
        ));
    }

    #[test]
    fn explicit_file_is_read() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("desk.ron");
        fs::write(&path, r#"(progress_tick_ms: 250, log_level: "debug")"#).unwrap();
        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.progress_tick_ms, 250);
        assert_eq!(settings.level_filter(), LevelFilter::Debug);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("desk.ron");
        fs::write(&path, "(api_url: 42").unwrap();
        assert!(matches!(
            Settings::load(Some(&path)),
            Err(SettingsError::Parse { .. })
        ));
    }

    #[test]
    fn cli_beats_environment_beats_file() {
        let mut settings = Settings::parse(r#"(api_url: "http://from-file")"#).unwrap();
        settings.apply_env(|key| (key == API_URL_ENV).then(|| "http://from-env".to_string()));
        assert_eq!(settings.api_url, "http://from-env");

        settings.apply_overrides(Some("http://from-cli".to_string()), None);
        assert_eq!(settings.api_url, "http://from-cli");
    }

    #[test]
    fn blank_environment_value_is_ignored() {
        let mut settings = Settings::default();
        settings.apply_env(|_| Some("   ".to_string()));
        assert_eq!(settings.api_url, "http://localhost:8000");
    }

    #[test]
    fn unknown_level_falls_back_to_info() {
        let settings = Settings {
            log_level: "chatty".to_string(),
            ..Settings::default()
        };
        assert_eq!(settings.level_filter(), LevelFilter::Info);
    }

    #[test]
    fn engine_settings_follow_fields() {
        let settings = Settings {
            request_timeout_secs: 30,
            success_notice_delay_ms: 0,
            ..Settings::default()
        };
        let engine = settings.engine_settings();
        assert_eq!(engine.transport.request_timeout, Duration::from_secs(30));
        assert_eq!(engine.notice_delay, Duration::ZERO);
        assert_eq!(engine.tick_interval, Duration::from_millis(500));
        assert_eq!(settings.intake_policy(), IntakePolicy::default());
    }
}
