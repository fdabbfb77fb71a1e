// Copyright 2024-2026 Telemetry Relay Contributors
// SPDX-License-Identifier: Apache-2.0

//! Severity model for log records and telemetry gating.
//!
//! Severities are ordered most-severe first: `Panic < Fatal < Error < Warn <
//! Info < Debug`. A record at severity `S` passes a threshold `L` when `S` is
//! at least as severe as `L`, i.e. `S <= L` in this ordering.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Log record severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Unrecoverable programmer error; the caller unwinds after logging.
    Panic = 0,
    /// Unrecoverable runtime error; the process exits after logging.
    Fatal = 1,
    /// Operation failed.
    Error = 2,
    /// Potential issue.
    #[serde(alias = "warning")]
    Warn = 3,
    /// Normal operation.
    Info = 4,
    /// Developer detail.
    Debug = 5,
}

impl Severity {
    /// All severities, most severe first.
    pub const ALL: [Severity; 6] = [
        Severity::Panic,
        Severity::Fatal,
        Severity::Error,
        Severity::Warn,
        Severity::Info,
        Severity::Debug,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Panic => "panic",
            Self::Fatal => "fatal",
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }

    /// Position in the fixed ordering (0 = most severe).
    pub fn ordinal(&self) -> u8 {
        *self as u8
    }

    /// True if `self` is at least as severe as `threshold`.
    pub fn is_at_least(&self, threshold: Severity) -> bool {
        allows(threshold, *self)
    }

    /// Severities that pass `min`, most severe first.
    pub fn levels_at_or_above(min: Severity) -> Vec<Severity> {
        Self::ALL
            .iter()
            .copied()
            .filter(|level| allows(min, *level))
            .collect()
    }
}

/// Returns true iff `actual` is at least as severe as `configured`.
pub fn allows(configured: Severity, actual: Severity) -> bool {
    actual.ordinal() <= configured.ordinal()
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a severity name cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown severity: {0}")]
pub struct ParseSeverityError(pub String);

impl FromStr for Severity {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "panic" => Ok(Self::Panic),
            "fatal" => Ok(Self::Fatal),
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            _ => Err(ParseSeverityError(s.to_string())),
        }
    }
}
