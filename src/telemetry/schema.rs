// Copyright 2024-2026 Telemetry Relay Contributors
// SPDX-License-Identifier: Apache-2.0

//! Telemetry event schema.
//!
//! Key names here are consumed by downstream dashboards and must stay fixed.
//! New fields may be added; existing keys and nesting may not change.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::envelope::MetricDetails;

/// Top-level event categories.
pub mod category {
    pub const APPLICATION_STATE: &str = "ApplicationState";
    pub const NETWORK: &str = "Network";
    pub const HOST_APPLICATION_STATE: &str = "HostApplicationState";
}

/// Event names within a category.
pub mod event {
    pub const STARTUP: &str = "Startup";
    pub const SHUTDOWN: &str = "Shutdown";
    pub const HEARTBEAT: &str = "Heartbeat";
    pub const CONNECT_PEER: &str = "ConnectPeer";
    pub const DISCONNECT_PEER: &str = "DisconnectPeer";
}

/// Build identification carried by lifecycle events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BuildInfo {
    pub version: String,
    pub version_num: String,
    pub channel: String,
    pub branch: String,
    pub commit_hash: String,
}

/// Periodic liveness report.
///
/// Renders as `{"version": .., "version-num": .., "channel": .., "branch": ..,
/// "commit-hash": .., "m": {..}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeartbeatEventDetails {
    #[serde(flatten)]
    pub info: BuildInfo,
    #[serde(rename = "m")]
    pub metrics: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StartupEventDetails {
    #[serde(flatten)]
    pub info: BuildInfo,
    pub instance: String,
    pub command_line_args: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ShutdownEventDetails {
    pub uptime_secs: u64,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PeerEventDetails {
    pub address: String,
    pub incoming: bool,
    pub instance_name: String,
}

/// Named metrics map, reported through `log_metrics`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    #[serde(skip)]
    pub name: String,
    #[serde(rename = "m")]
    pub values: BTreeMap<String, f64>,
}

impl MetricsSnapshot {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: f64) -> Self {
        self.values.insert(key.into(), value);
        self
    }
}

impl MetricDetails for MetricsSnapshot {
    fn identifier(&self) -> &str {
        &self.name
    }
}
