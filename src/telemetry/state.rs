// Copyright 2024-2026 Telemetry Relay Contributors
// SPDX-License-Identifier: Apache-2.0

//! Telemetry orchestrator.
//!
//! Decides per call whether an envelope is forwarded, attaches history to
//! severe records, and hands envelopes to the hook. One mutex per state
//! guards the enabled flag and the history ring; dispatch happens while it is
//! held so envelopes leave in the order calls arrived.

use std::error::Error as StdError;

use parking_lot::Mutex;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use super::async_hook::{AsyncHook, AsyncHookConfig};
use super::envelope::{
    build_message, render_payload, Envelope, Fields, LogRecord, MetricDetails,
};
use super::history::HistoryRing;
use super::hook::TelemetryHook;
use crate::config::TelemetryConfig;
use crate::severity::{allows, Severity};

/// Errors from constructing a [`TelemetryState`].
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The hook factory failed. Displays exactly as the factory's error.
    #[error(transparent)]
    HookFactory(Box<dyn StdError + Send + Sync>),

    #[error("Failed to start telemetry worker: {0}")]
    Worker(#[source] std::io::Error),
}

struct DispatchState {
    enabled: bool,
    history: HistoryRing,
}

/// Whether a dispatch goes through the severity gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gate {
    /// Logger mirroring: `min_log_level` and hook levels apply.
    Severity,
    /// Explicit events and metrics: forwarded whenever enabled.
    Always,
}

/// Telemetry pipeline for one session.
pub struct TelemetryState {
    config: TelemetryConfig,
    session: String,
    hook: AsyncHook,
    dispatch: Mutex<DispatchState>,
}

impl TelemetryState {
    /// Build a state whose hook comes from `factory`.
    ///
    /// `factory` is called exactly once. Its error is returned unchanged in
    /// message. The produced hook is wrapped in an [`AsyncHook`] advertising
    /// the hook's own levels that `config.min_log_level` also allows.
    pub fn create<F, H, E>(config: TelemetryConfig, factory: F) -> Result<Self, TelemetryError>
    where
        F: FnOnce(&TelemetryConfig) -> Result<H, E>,
        H: TelemetryHook + 'static,
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        let inner = factory(&config).map_err(|e| TelemetryError::HookFactory(e.into()))?;

        let levels: Vec<Severity> = Severity::levels_at_or_above(config.min_log_level)
            .into_iter()
            .filter(|level| inner.levels().contains(level))
            .collect();
        let hook = AsyncHook::spawn(
            Box::new(inner),
            levels,
            AsyncHookConfig {
                queue_depth: config.queue_depth,
                ..Default::default()
            },
        )
        .map_err(TelemetryError::Worker)?;

        let session = Uuid::new_v4().to_string();
        tracing::debug!(
            session = %session,
            enabled = config.enable,
            min_log_level = %config.min_log_level,
            report_history_level = %config.report_history_level,
            "Telemetry state created"
        );

        Ok(Self {
            dispatch: Mutex::new(DispatchState {
                enabled: config.enable,
                history: HistoryRing::new(config.log_history_depth),
            }),
            config,
            session,
            hook,
        })
    }

    pub fn config(&self) -> &TelemetryConfig {
        &self.config
    }

    /// Identifier of this telemetry session.
    pub fn session(&self) -> &str {
        &self.session
    }

    pub fn is_enabled(&self) -> bool {
        self.dispatch.lock().enabled
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.dispatch.lock().enabled = enabled;
    }

    /// Snapshot of the history ring.
    pub fn history(&self) -> Vec<String> {
        self.dispatch.lock().history.snapshot()
    }

    /// Forward one event. Forwarded whenever telemetry is enabled, with or
    /// without details.
    pub fn log_event<D>(&self, category: &str, event: &str, details: Option<&D>)
    where
        D: Serialize + ?Sized,
    {
        self.log_event_with_fields(&Fields::new(), category, event, details);
    }

    /// Forward one metrics report. A missing or `null` metrics value means
    /// nothing to report and forwards nothing.
    pub fn log_metrics<M, D>(&self, category: &str, metrics: Option<&M>, details: Option<&D>)
    where
        M: MetricDetails + ?Sized,
        D: Serialize + ?Sized,
    {
        self.log_metrics_with_fields(&Fields::new(), category, metrics, details);
    }

    pub(crate) fn log_event_with_fields<D>(
        &self,
        fields: &Fields,
        category: &str,
        event: &str,
        details: Option<&D>,
    ) where
        D: Serialize + ?Sized,
    {
        let record = LogRecord::new(Severity::Info, build_message(category, event))
            .with_fields(fields.clone());
        let mut envelope = self.envelope_for(&record);
        envelope.category = Some(category.to_string());
        envelope.identifier = Some(event.to_string());
        envelope.details = render_details(details);
        self.dispatch(&record, envelope, Gate::Always);
    }

    pub(crate) fn log_metrics_with_fields<M, D>(
        &self,
        fields: &Fields,
        category: &str,
        metrics: Option<&M>,
        details: Option<&D>,
    ) where
        M: MetricDetails + ?Sized,
        D: Serialize + ?Sized,
    {
        let Some(metrics) = metrics else {
            return;
        };
        let rendered = match render_payload(metrics, "metrics") {
            Some(serde_json::Value::Null) | None => {
                metrics::counter!("telemetry_metrics_empty_total").increment(1);
                return;
            }
            Some(value) => value,
        };

        let identifier = metrics.identifier();
        let record = LogRecord::new(Severity::Info, build_message(category, identifier))
            .with_fields(fields.clone());
        let mut envelope = self.envelope_for(&record);
        envelope.category = Some(category.to_string());
        envelope.identifier = Some(identifier.to_string());
        envelope.metrics = Some(rendered);
        envelope.details = render_details(details);
        self.dispatch(&record, envelope, Gate::Always);
    }

    /// Mirror a record emitted by the base logger.
    pub fn mirror(&self, record: &LogRecord) {
        let envelope = self.envelope_for(record);
        self.dispatch(record, envelope, Gate::Severity);
    }

    /// Block until every envelope handed to the hook so far is processed.
    pub fn flush(&self) {
        self.hook.flush();
    }

    /// Delivery counters of the underlying hook.
    pub fn hook_stats(&self) -> super::AsyncHookStats {
        self.hook.stats()
    }

    fn envelope_for(&self, record: &LogRecord) -> Envelope {
        Envelope::from_record(record, &self.session, &self.config.name)
    }

    fn dispatch(&self, record: &LogRecord, mut envelope: Envelope, gate: Gate) {
        let mut state = self.dispatch.lock();

        let severity = record.severity;
        let forward = state.enabled
            && match gate {
                Gate::Always => true,
                Gate::Severity => {
                    allows(self.config.min_log_level, severity)
                        && self.hook.levels().contains(&severity)
                }
            };

        // Stack traces pass through untracked and without history.
        if !record.is_stack_trace() {
            if forward && allows(self.config.report_history_level, severity) {
                envelope.history = Some(state.history.snapshot());
            }
            state.history.append(record.render_line());
        }

        if !forward {
            metrics::counter!("telemetry_records_suppressed_total").increment(1);
            return;
        }

        match self.hook.fire(envelope) {
            Ok(()) => {
                metrics::counter!("telemetry_envelopes_forwarded_total", "level" => severity.as_str())
                    .increment(1);
            }
            Err(e) => {
                tracing::warn!(error = %e, level = %severity, "Telemetry hook rejected envelope");
            }
        }
    }
}

/// Structural details, or `None` when absent or rendering to `null`.
fn render_details<D>(details: Option<&D>) -> Option<serde_json::Value>
where
    D: Serialize + ?Sized,
{
    details
        .and_then(|d| render_payload(d, "details"))
        .filter(|value| !value.is_null())
}

impl Drop for TelemetryState {
    fn drop(&mut self) {
        self.hook.close();
    }
}

impl std::fmt::Debug for TelemetryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryState")
            .field("session", &self.session)
            .field("enabled", &self.is_enabled())
            .field("min_log_level", &self.config.min_log_level)
            .field("report_history_level", &self.config.report_history_level)
            .finish()
    }
}
