// Copyright 2024-2026 Telemetry Relay Contributors
// SPDX-License-Identifier: Apache-2.0

//! Structured records flowing from the logger into telemetry.
//!
//! A [`LogRecord`] is what the base logger hands over for every emitted line.
//! An [`Envelope`] is the serialization-ready record forwarded to a hook.
//!
//! # Wire keys
//!
//! Envelope keys are part of the downstream contract and never change:
//!
//! | Key | Content |
//! |---|---|
//! | `time` | RFC 3339 timestamp |
//! | `level` | lowercase severity |
//! | `message` | rendered message |
//! | `session` | telemetry session id |
//! | `instance` | instance name (omitted when empty) |
//! | `v` | telemetry version |
//! | `category`, `identifier` | event addressing (omitted for plain log lines) |
//! | `details` | event payload (omitted when absent) |
//! | `metrics` | metrics payload (omitted when absent) |
//! | `log` | prior log lines (omitted below the history threshold) |
//! | `fields` | logger context fields (omitted when empty) |

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::severity::Severity;

/// Logger context fields, ordered for stable rendering.
pub type Fields = BTreeMap<String, Value>;

/// Version stamped into every envelope under `v`.
pub const TELEMETRY_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Message prefix of synthetic stack-trace records.
pub const STACK_PREFIX: &str = "[Stack]";

/// Placeholder for calls that carry no details payload.
pub const NO_DETAILS: Option<&'static ()> = None;

/// Builds the message body for an event or metric.
///
/// The same composition is used everywhere a telemetry message is built, so
/// consumers can reconstruct it from category and name alone.
pub fn build_message(category: &str, name: &str) -> String {
    format!("/{}/{}", category, name)
}

/// A metrics payload that names itself.
pub trait MetricDetails: Serialize {
    /// Metric identifier, used as the second message component.
    fn identifier(&self) -> &str;
}

/// Whether a record came from the caller or was synthesized alongside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordKind {
    #[default]
    Primary,
    /// Call-stack annotation emitted with Error-or-more-severe calls.
    StackTrace,
}

/// One emitted log line as seen by telemetry.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub time: DateTime<Utc>,
    pub severity: Severity,
    pub message: String,
    pub fields: Fields,
    pub kind: RecordKind,
}

impl LogRecord {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            time: Utc::now(),
            severity,
            message: message.into(),
            fields: Fields::new(),
            kind: RecordKind::Primary,
        }
    }

    /// Synthetic stack-trace record at Error severity.
    pub fn stack_trace(trace: impl std::fmt::Display) -> Self {
        Self {
            kind: RecordKind::StackTrace,
            ..Self::new(Severity::Error, format!("{} {}", STACK_PREFIX, trace))
        }
    }

    pub fn with_fields(mut self, fields: Fields) -> Self {
        self.fields = fields;
        self
    }

    pub fn is_stack_trace(&self) -> bool {
        self.kind == RecordKind::StackTrace
    }

    /// Single-line rendering kept in the history ring.
    pub fn render_line(&self) -> String {
        let mut line = format!(
            "{} [{}] {}",
            self.time.to_rfc3339_opts(SecondsFormat::Millis, true),
            self.severity.as_str().to_ascii_uppercase(),
            self.message
        );
        for (key, value) in &self.fields {
            line.push(' ');
            line.push_str(key);
            line.push('=');
            match value {
                Value::String(s) => line.push_str(s),
                other => line.push_str(&other.to_string()),
            }
        }
        line
    }
}

/// Serialization-ready telemetry record handed to a hook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub time: DateTime<Utc>,
    pub level: Severity,
    pub message: String,
    pub session: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub instance: String,
    #[serde(rename = "v")]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Value>,
    #[serde(rename = "log", default, skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Fields::is_empty")]
    pub fields: Fields,
}

impl Envelope {
    /// Envelope mirroring a plain log record.
    pub fn from_record(record: &LogRecord, session: &str, instance: &str) -> Self {
        Self {
            time: record.time,
            level: record.severity,
            message: record.message.clone(),
            session: session.to_string(),
            instance: instance.to_string(),
            version: TELEMETRY_VERSION.to_string(),
            category: None,
            identifier: None,
            details: None,
            metrics: None,
            history: None,
            fields: record.fields.clone(),
        }
    }

    pub fn has_history(&self) -> bool {
        self.history.is_some()
    }

    /// Convert to JSON for transmission.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Convert to a JSON document for inspection.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// Render any payload into its structural JSON form.
///
/// Returns `None` when the payload fails to serialize; the failure is logged
/// and the envelope is sent without it.
pub(crate) fn render_payload<T>(payload: &T, key: &'static str) -> Option<Value>
where
    T: Serialize + ?Sized,
{
    match serde_json::to_value(payload) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, error = %e, "Dropping unserializable telemetry payload");
            None
        }
    }
}
