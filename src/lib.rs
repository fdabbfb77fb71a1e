// Copyright 2024-2026 Telemetry Relay Contributors
// SPDX-License-Identifier: Apache-2.0

//! Telemetry Relay
//!
//! A level-gated telemetry pipeline that sits behind a structured logger.
//! Every log call can be mirrored into a [`TelemetryState`], which decides
//! whether an envelope is forwarded to a delivery hook and whether recent
//! history is attached to it.
//!
//! # Pipeline
//!
//! - **Severity gating**: mirrored records are forwarded only when at least
//!   as severe as `min_log_level`. Explicit events and metrics are forwarded
//!   whenever telemetry is enabled.
//! - **History**: every record is kept in a bounded ring; records at least as
//!   severe as `report_history_level` carry a snapshot of the lines before
//!   them. Synthetic stack-trace records never do.
//! - **Hooks**: envelopes go to a [`TelemetryHook`] behind a buffered
//!   [`AsyncHook`]; [`TelemetryState::flush`] drains it.
//! - **Schema**: envelope keys and payload keys are fixed; see
//!   [`telemetry::schema`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use telemetry_relay::telemetry::{self, schema, MockHook, NO_DETAILS};
//! use telemetry_relay::{Logger, Severity, TelemetryConfig, TelemetryState};
//!
//! let config = TelemetryConfig {
//!     enable: true,
//!     min_log_level: Severity::Warn,
//!     ..Default::default()
//! };
//! let mock = Arc::new(MockHook::new(config.min_log_level));
//! let hook = mock.clone();
//! let state = Arc::new(
//!     TelemetryState::create(config, move |_| Ok::<_, std::io::Error>(hook)).unwrap(),
//! );
//!
//! let logger = Logger::new();
//! telemetry::attach(&state, &logger);
//! logger.info("not forwarded");
//! logger.warn("forwarded");
//! logger.log_event(schema::category::APPLICATION_STATE, schema::event::STARTUP, NO_DETAILS);
//!
//! state.flush();
//! assert_eq!(mock.entries(), vec!["forwarded", "/ApplicationState/Startup"]);
//! ```

pub mod cli;
pub mod config;
pub mod logger;
pub mod severity;
pub mod telemetry;

pub use config::{ConfigError, TelemetryConfig};
pub use logger::Logger;
pub use severity::{allows, Severity};
pub use telemetry::{
    AsyncHook, Envelope, HookError, LogRecord, TelemetryError, TelemetryHook, TelemetryState,
};
