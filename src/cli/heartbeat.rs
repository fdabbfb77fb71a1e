// Copyright 2024-2026 Telemetry Relay Contributors
// SPDX-License-Identifier: Apache-2.0

//! `heartbeat` subcommand: emit one heartbeat envelope as a JSON line.
//!
//! Useful for checking what a collector will receive for the current config.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use super::config_cmd::load_effective;
use crate::logger::Logger;
use crate::telemetry::schema::{category, event, BuildInfo, HeartbeatEventDetails};
use crate::telemetry::{self, JsonLinesHook, TelemetryState};

/// Build info for this binary.
pub fn build_info() -> BuildInfo {
    BuildInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        version_num: version_num(env!("CARGO_PKG_VERSION")),
        channel: option_env!("TELEMETRY_RELAY_CHANNEL").unwrap_or("dev").to_string(),
        branch: option_env!("TELEMETRY_RELAY_BRANCH").unwrap_or_default().to_string(),
        commit_hash: option_env!("TELEMETRY_RELAY_COMMIT").unwrap_or_default().to_string(),
    }
}

/// `1.2.3` -> `1002003`.
fn version_num(version: &str) -> String {
    let mut parts = version.split('.').map(|p| p.parse::<u64>().unwrap_or(0));
    let major = parts.next().unwrap_or(0);
    let minor = parts.next().unwrap_or(0);
    let patch = parts.next().unwrap_or(0);
    (major * 1_000_000 + minor * 1_000 + patch).to_string()
}

/// Emit a heartbeat to stdout. Returns a process exit code.
pub fn run_heartbeat(data_dir: Option<&Path>, global_dir: &Path) -> i32 {
    let mut config = match load_effective(data_dir, global_dir) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            return 2;
        }
    };
    config.enable = true;

    let state = match TelemetryState::create(config, |_| Ok::<_, std::io::Error>(JsonLinesHook::stdout())) {
        Ok(state) => Arc::new(state),
        Err(e) => {
            eprintln!("ERROR: {}", e);
            return 1;
        }
    };

    let logger = Logger::new();
    telemetry::attach(&state, &logger);

    let details = HeartbeatEventDetails {
        info: build_info(),
        metrics: BTreeMap::from([("history-depth".to_string(), state.config().log_history_depth as f64)]),
    };
    logger.log_event(category::APPLICATION_STATE, event::HEARTBEAT, Some(&details));
    state.flush();
    0
}
