// Copyright 2024-2026 Telemetry Relay Contributors
// SPDX-License-Identifier: Apache-2.0

//! Telemetry pipeline: envelopes, history, hooks and the orchestrating state.
//!
//! Records mirrored from a [`Logger`](crate::Logger) are gated by severity,
//! optionally annotated with recent history, and handed to a hook. Explicit
//! events and metrics bypass the severity gate but respect the enabled flag.

mod async_hook;
mod envelope;
mod history;
mod hook;
mod json_hook;
mod logging;
pub mod schema;
mod state;

pub use async_hook::{AsyncHook, AsyncHookConfig, AsyncHookStats};
pub use envelope::{
    build_message, Envelope, Fields, LogRecord, MetricDetails, RecordKind, NO_DETAILS,
    STACK_PREFIX, TELEMETRY_VERSION,
};
pub use history::{HistoryRing, DEFAULT_HISTORY_DEPTH};
pub use hook::{HookError, MockHook, TelemetryHook};
pub use json_hook::JsonLinesHook;
pub use logging::{init_logging, LogConfig, LogError, LogFormat};
pub use state::{TelemetryError, TelemetryState};

use std::sync::Arc;

use crate::logger::Logger;

/// Wire `state` into `logger`. Emits nothing; later calls on `logger` and
/// its derived loggers are mirrored.
pub fn attach(state: &Arc<TelemetryState>, logger: &Logger) {
    logger.attach_telemetry(state.clone());
}

/// Remove any telemetry state from `logger`.
pub fn detach(logger: &Logger) {
    logger.detach_telemetry();
}
