// Copyright 2024-2026 Telemetry Relay Contributors
// SPDX-License-Identifier: Apache-2.0

//! Config CLI subcommands: show, defaults, validate, init.
//!
//! Configuration is read from `telemetry.toml` in the data directory or the
//! global directory, then `TELEMETRY_*` environment overrides are applied.

use std::path::Path;

use crate::config::{ConfigError, TelemetryConfig};

/// Load the effective config for the CLI.
pub fn load_effective(data_dir: Option<&Path>, global_dir: &Path) -> Result<TelemetryConfig, ConfigError> {
    let mut cfg = TelemetryConfig::load_or_default(data_dir, global_dir)?;
    cfg.apply_env_overrides();
    Ok(cfg)
}

/// Print effective config as key-value pairs to stdout.
pub fn run_show(data_dir: Option<&Path>, global_dir: &Path) -> i32 {
    match load_effective(data_dir, global_dir) {
        Ok(cfg) => {
            print!("{}", render_config(&cfg));
            0
        }
        Err(e) => {
            eprintln!("ERROR: {}", e);
            2
        }
    }
}

/// Print default config values (no file, no env overrides) to stdout.
pub fn run_defaults() {
    print!("{}", render_config(&TelemetryConfig::default()));
}

/// Validate configuration for obvious misconfigurations.
///
/// Returns 0 if valid, 1 if any warnings are found, 2 if it cannot be read.
pub fn run_validate(data_dir: Option<&Path>, global_dir: &Path) -> i32 {
    let cfg = match load_effective(data_dir, global_dir) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            return 2;
        }
    };

    let warnings = cfg.validate();
    for warning in &warnings {
        eprintln!("WARNING: {}", warning);
    }

    if warnings.is_empty() {
        println!("Configuration is valid.");
        0
    } else {
        1
    }
}

/// Write a default config to the global directory unless one exists.
pub fn run_init(global_dir: &Path) -> i32 {
    let cfg = match TelemetryConfig::load_or_default(None, global_dir) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            return 2;
        }
    };
    let Some(path) = cfg.file_path.clone() else {
        return 2;
    };
    if path.is_file() {
        println!("Config already exists at {}", path.display());
        return 0;
    }
    match cfg.save(&path) {
        Ok(()) => {
            println!("Wrote {}", path.display());
            0
        }
        Err(e) => {
            eprintln!("ERROR: {}", e);
            2
        }
    }
}

fn render_config(cfg: &TelemetryConfig) -> String {
    let mut out = String::new();
    let mut line = |key: &str, value: &dyn std::fmt::Display| {
        out.push_str(&format!("{}={}\n", key, value));
    };
    line("enable", &cfg.enable);
    line("send_to_log", &cfg.send_to_log);
    line("uri", &cfg.uri);
    line("name", &cfg.name);
    line("guid", &cfg.guid);
    line("min_log_level", &cfg.min_log_level);
    line("report_history_level", &cfg.report_history_level);
    line("log_history_depth", &cfg.log_history_depth);
    line("queue_depth", &cfg.queue_depth);
    line("user_name", &cfg.user_name);
    // Never echo the credential itself.
    line("password", &if cfg.password.is_empty() { "" } else { "********" });
    out
}
