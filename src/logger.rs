// Copyright 2024-2026 Telemetry Relay Contributors
// SPDX-License-Identifier: Apache-2.0

//! Base logger with an optional telemetry mirror.
//!
//! Output goes through `tracing`; whatever subscriber is installed decides
//! formatting and destination. When a [`TelemetryState`] is attached, every
//! emitted record is also mirrored into it. Loggers derived with
//! [`Logger::with_field`] share level and telemetry with their parent.

use std::backtrace::Backtrace;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;

use crate::severity::Severity;
use crate::telemetry::{build_message, Fields, LogRecord, MetricDetails, TelemetryState};

struct LoggerShared {
    level: RwLock<Severity>,
    telemetry: RwLock<Option<Arc<TelemetryState>>>,
}

#[derive(Clone)]
pub struct Logger {
    shared: Arc<LoggerShared>,
    fields: Fields,
}

impl Logger {
    /// Logger emitting Info and more severe records.
    pub fn new() -> Self {
        Self::with_level(Severity::Info)
    }

    pub fn with_level(level: Severity) -> Self {
        Self {
            shared: Arc::new(LoggerShared {
                level: RwLock::new(level),
                telemetry: RwLock::new(None),
            }),
            fields: Fields::new(),
        }
    }

    pub fn level(&self) -> Severity {
        *self.shared.level.read()
    }

    pub fn set_level(&self, level: Severity) {
        *self.shared.level.write() = level;
    }

    pub fn is_enabled_for(&self, severity: Severity) -> bool {
        severity.is_at_least(self.level())
    }

    /// Derived logger carrying an extra context field.
    pub fn with_field(&self, key: impl Into<String>, value: impl Into<Value>) -> Logger {
        let mut derived = self.clone();
        derived.fields.insert(key.into(), value.into());
        derived
    }

    /// Derived logger carrying extra context fields.
    pub fn with_fields(&self, fields: Fields) -> Logger {
        let mut derived = self.clone();
        derived.fields.extend(fields);
        derived
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn debug(&self, message: impl fmt::Display) {
        self.log(Severity::Debug, message.to_string());
    }

    pub fn info(&self, message: impl fmt::Display) {
        self.log(Severity::Info, message.to_string());
    }

    pub fn warn(&self, message: impl fmt::Display) {
        self.log(Severity::Warn, message.to_string());
    }

    pub fn error(&self, message: impl fmt::Display) {
        self.log(Severity::Error, message.to_string());
    }

    /// Log, flush telemetry, and exit the process with status 1.
    pub fn fatal(&self, message: impl fmt::Display) -> ! {
        self.log(Severity::Fatal, message.to_string());
        self.flush_telemetry();
        std::process::exit(1);
    }

    /// Log, flush telemetry, and panic with `message`.
    pub fn panic(&self, message: impl fmt::Display) -> ! {
        let message = message.to_string();
        self.log(Severity::Panic, message.clone());
        self.flush_telemetry();
        panic!("{}", message);
    }

    fn log(&self, severity: Severity, message: String) {
        if !self.is_enabled_for(severity) {
            return;
        }
        if severity.is_at_least(Severity::Error) {
            let trace = Backtrace::force_capture();
            self.emit(LogRecord::stack_trace(trace).with_fields(self.fields.clone()));
        }
        self.emit(LogRecord::new(severity, message).with_fields(self.fields.clone()));
    }

    fn emit(&self, record: LogRecord) {
        write_output(&record);
        if let Some(telemetry) = self.telemetry() {
            telemetry.mirror(&record);
        }
    }

    /// Mirror subsequent records into `state`. Emits nothing itself.
    pub fn attach_telemetry(&self, state: Arc<TelemetryState>) {
        *self.shared.telemetry.write() = Some(state);
    }

    /// Stop mirroring. Output is unaffected.
    pub fn detach_telemetry(&self) -> Option<Arc<TelemetryState>> {
        self.shared.telemetry.write().take()
    }

    pub fn telemetry(&self) -> Option<Arc<TelemetryState>> {
        self.shared.telemetry.read().clone()
    }

    /// True if a state is attached and enabled.
    pub fn telemetry_enabled(&self) -> bool {
        self.telemetry().map(|t| t.is_enabled()).unwrap_or(false)
    }

    pub fn flush_telemetry(&self) {
        if let Some(telemetry) = self.telemetry() {
            telemetry.flush();
        }
    }

    /// Forward an event through the attached state with this logger's fields.
    pub fn log_event<D>(&self, category: &str, event: &str, details: Option<&D>)
    where
        D: Serialize + ?Sized,
    {
        let Some(telemetry) = self.telemetry() else {
            return;
        };
        if telemetry.config().send_to_log {
            self.echo(build_message(category, event));
        }
        telemetry.log_event_with_fields(&self.fields, category, event, details);
    }

    /// Forward a metrics report through the attached state with this
    /// logger's fields. Nothing happens without metrics.
    pub fn log_metrics<M, D>(&self, category: &str, metrics: Option<&M>, details: Option<&D>)
    where
        M: MetricDetails + ?Sized,
        D: Serialize + ?Sized,
    {
        let Some(telemetry) = self.telemetry() else {
            return;
        };
        let Some(metrics) = metrics else {
            return;
        };
        if telemetry.config().send_to_log {
            self.echo(build_message(category, metrics.identifier()));
        }
        telemetry.log_metrics_with_fields(&self.fields, category, Some(metrics), details);
    }

    /// Output-only line; never mirrored.
    fn echo(&self, message: String) {
        if self.is_enabled_for(Severity::Info) {
            write_output(&LogRecord::new(Severity::Info, message).with_fields(self.fields.clone()));
        }
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("level", &self.level())
            .field("fields", &self.fields)
            .field("telemetry_attached", &self.telemetry().is_some())
            .finish()
    }
}

fn render_fields(fields: &Fields) -> String {
    fields
        .iter()
        .map(|(k, v)| match v {
            Value::String(s) => format!("{}={}", k, s),
            other => format!("{}={}", k, other),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn write_output(record: &LogRecord) {
    let fields = render_fields(&record.fields);
    let severity = record.severity.as_str();
    match record.severity {
        Severity::Panic | Severity::Fatal | Severity::Error => {
            tracing::error!(severity, fields = %fields, "{}", record.message)
        }
        Severity::Warn => tracing::warn!(severity, fields = %fields, "{}", record.message),
        Severity::Info => tracing::info!(severity, fields = %fields, "{}", record.message),
        Severity::Debug => tracing::debug!(severity, fields = %fields, "{}", record.message),
    }
}
