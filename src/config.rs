// Copyright 2024-2026 Telemetry Relay Contributors
// SPDX-License-Identifier: Apache-2.0

//! Telemetry configuration: defaults, `telemetry.toml` discovery, and
//! environment overrides.
//!
//! Unrecognized keys in the file are ignored; missing keys take defaults.
//! Invalid environment values fall back to the loaded value without failing.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |---|---|---|
//! | `TELEMETRY_ENABLE` | false | Forward events to the hook |
//! | `TELEMETRY_MIN_LOG_LEVEL` | warn | Least severe level forwarded |
//! | `TELEMETRY_REPORT_HISTORY_LEVEL` | error | Least severe level carrying history |
//! | `TELEMETRY_HISTORY_DEPTH` | 100 | Lines kept in the history ring |
//! | `TELEMETRY_QUEUE_DEPTH` | 256 | Envelopes buffered before dropping |
//! | `TELEMETRY_NAME` | hostname | Instance name stamped on envelopes |

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::severity::Severity;
use crate::telemetry::DEFAULT_HISTORY_DEPTH;

/// File name looked up in data and global directories.
pub const CONFIG_FILE_NAME: &str = "telemetry.toml";

/// Errors from reading or writing the config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to encode config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Per-session telemetry configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub enable: bool,
    /// Echo events through the base logger output as well.
    pub send_to_log: bool,
    /// Remote collector endpoint. Opaque to this crate.
    pub uri: String,
    /// Instance name stamped on envelopes.
    pub name: String,
    /// Stable node identifier.
    pub guid: String,
    pub min_log_level: Severity,
    pub report_history_level: Severity,
    pub log_history_depth: usize,
    pub queue_depth: usize,
    pub user_name: String,
    pub password: String,
    /// Where this config was read from or will be saved to.
    #[serde(skip)]
    pub file_path: Option<PathBuf>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enable: false,
            send_to_log: false,
            uri: String::new(),
            name: default_instance_name(),
            guid: Uuid::new_v4().to_string(),
            min_log_level: Severity::Warn,
            report_history_level: Severity::Error,
            log_history_depth: DEFAULT_HISTORY_DEPTH,
            queue_depth: 256,
            user_name: String::new(),
            password: String::new(),
            file_path: None,
        }
    }
}

fn default_instance_name() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_default()
}

impl TelemetryConfig {
    /// Read a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: TelemetryConfig =
            toml::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.file_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Locate `telemetry.toml` in `data_dir`, then `global_dir`.
    ///
    /// When neither exists, returns defaults with `file_path` set to the
    /// global location. Nothing is written.
    pub fn load_or_default(data_dir: Option<&Path>, global_dir: &Path) -> Result<Self, ConfigError> {
        let candidates = data_dir
            .into_iter()
            .chain(std::iter::once(global_dir))
            .map(|dir| dir.join(CONFIG_FILE_NAME));

        for path in candidates {
            if path.is_file() {
                tracing::debug!(path = %path.display(), "Loading telemetry config");
                return Self::load(&path);
            }
        }

        Ok(Self {
            file_path: Some(global_dir.join(CONFIG_FILE_NAME)),
            ..Self::default()
        })
    }

    /// Write this config as TOML, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let text = toml::to_string_pretty(self)?;
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(path, text).map_err(io_err)
    }

    /// Apply `TELEMETRY_*` environment overrides.
    pub fn apply_env_overrides(&mut self) {
        self.enable = parse_bool("TELEMETRY_ENABLE", self.enable);
        self.min_log_level = parse_severity("TELEMETRY_MIN_LOG_LEVEL", self.min_log_level);
        self.report_history_level =
            parse_severity("TELEMETRY_REPORT_HISTORY_LEVEL", self.report_history_level);
        self.log_history_depth = parse_usize("TELEMETRY_HISTORY_DEPTH", self.log_history_depth);
        self.queue_depth = parse_usize("TELEMETRY_QUEUE_DEPTH", self.queue_depth).max(1);
        if let Ok(name) = std::env::var("TELEMETRY_NAME") {
            if !name.is_empty() {
                self.name = name;
            }
        }
    }

    /// Report likely misconfigurations. Empty means valid.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if !self.report_history_level.is_at_least(self.min_log_level) {
            warnings.push(format!(
                "report_history_level ({}) is less severe than min_log_level ({}); \
                 history will only attach to records that are forwarded",
                self.report_history_level, self.min_log_level
            ));
        }
        if self.log_history_depth == 0 {
            warnings.push("log_history_depth is 0; no history will be attached".to_string());
        }
        if self.guid.is_empty() {
            warnings.push("guid is empty; envelopes cannot be attributed to a node".to_string());
        }
        if self.enable && self.uri.is_empty() {
            warnings.push("telemetry is enabled but uri is empty".to_string());
        }

        warnings
    }
}

/// Parse a `usize` env var, returning `default` on missing or invalid.
fn parse_usize(key: &str, default: usize) -> usize {
    match std::env::var(key) {
        Ok(val) => val.parse::<usize>().unwrap_or(default),
        Err(_) => default,
    }
}

/// Parse a boolean env var (`1/0`, `true/false`, `yes/no`).
fn parse_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(val) => match val.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}

/// Parse a severity env var, returning `default` on missing or invalid.
fn parse_severity(key: &str, default: Severity) -> Severity {
    match std::env::var(key) {
        Ok(val) => val.parse::<Severity>().unwrap_or(default),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Serialize env-mutating tests to avoid cross-test pollution.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const ENV_KEYS: &[&str] = &[
        "TELEMETRY_ENABLE",
        "TELEMETRY_MIN_LOG_LEVEL",
        "TELEMETRY_REPORT_HISTORY_LEVEL",
        "TELEMETRY_HISTORY_DEPTH",
        "TELEMETRY_QUEUE_DEPTH",
        "TELEMETRY_NAME",
    ];

    fn clear_env_vars() {
        for k in ENV_KEYS {
            std::env::remove_var(k);
        }
    }

    #[test]
    fn test_defaults_are_conservative() {
        let cfg = TelemetryConfig::default();
        assert!(!cfg.enable);
        assert_eq!(cfg.min_log_level, Severity::Warn);
        assert_eq!(cfg.report_history_level, Severity::Error);
        assert_eq!(cfg.log_history_depth, DEFAULT_HISTORY_DEPTH);
        assert!(Uuid::parse_str(&cfg.guid).is_ok());
    }

    #[test]
    fn test_env_vars_override_defaults() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env_vars();
        std::env::set_var("TELEMETRY_ENABLE", "true");
        std::env::set_var("TELEMETRY_MIN_LOG_LEVEL", "info");
        std::env::set_var("TELEMETRY_REPORT_HISTORY_LEVEL", "WARNING");
        std::env::set_var("TELEMETRY_HISTORY_DEPTH", "10");
        std::env::set_var("TELEMETRY_NAME", "relay-7");
        let mut cfg = TelemetryConfig::default();
        cfg.apply_env_overrides();
        assert!(cfg.enable);
        assert_eq!(cfg.min_log_level, Severity::Info);
        assert_eq!(cfg.report_history_level, Severity::Warn);
        assert_eq!(cfg.log_history_depth, 10);
        assert_eq!(cfg.name, "relay-7");
        clear_env_vars();
    }

    #[test]
    fn test_invalid_env_falls_back() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env_vars();
        std::env::set_var("TELEMETRY_ENABLE", "maybe");
        std::env::set_var("TELEMETRY_MIN_LOG_LEVEL", "loud");
        std::env::set_var("TELEMETRY_HISTORY_DEPTH", "lots");
        std::env::set_var("TELEMETRY_QUEUE_DEPTH", "0");
        let mut cfg = TelemetryConfig::default();
        cfg.apply_env_overrides();
        assert!(!cfg.enable);
        assert_eq!(cfg.min_log_level, Severity::Warn);
        assert_eq!(cfg.log_history_depth, DEFAULT_HISTORY_DEPTH);
        assert_eq!(cfg.queue_depth, 1, "queue depth has a floor");
        clear_env_vars();
    }

    #[test]
    fn test_validate_flags_inverted_thresholds() {
        let cfg = TelemetryConfig {
            min_log_level: Severity::Error,
            report_history_level: Severity::Info,
            ..Default::default()
        };
        let warnings = cfg.validate();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("report_history_level"));
    }

    #[test]
    fn test_validate_defaults_clean() {
        assert!(TelemetryConfig::default().validate().is_empty());
    }
}
