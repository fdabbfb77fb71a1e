// Copyright 2024-2026 Telemetry Relay Contributors
// SPDX-License-Identifier: Apache-2.0

//! CLI module for telemetry-relay commands.
//!
//! ## Usage
//!
//! ```bash
//! telemetry-relay-cli config show        # Effective config (file + env)
//! telemetry-relay-cli config validate    # Exit 0 if no warnings
//! telemetry-relay-cli heartbeat          # Emit one heartbeat envelope to stdout
//! ```

pub mod config_cmd;
pub mod heartbeat;

use std::path::PathBuf;

pub use heartbeat::run_heartbeat;

/// Default directory searched for `telemetry.toml`.
pub const DEFAULT_CONFIG_DIR: &str = ".";

/// Get the global config directory from environment or use default.
pub fn get_config_dir() -> PathBuf {
    std::env::var("TELEMETRY_CONFIG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_DIR))
}
