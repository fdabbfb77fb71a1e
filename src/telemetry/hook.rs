// Copyright 2024-2026 Telemetry Relay Contributors
// SPDX-License-Identifier: Apache-2.0

//! Delivery hook abstraction.
//!
//! A hook receives envelopes from `TelemetryState`. Hooks are invoked from
//! arbitrary threads and must return promptly; slow delivery belongs behind
//! an [`AsyncHook`](super::AsyncHook).

use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;

use super::envelope::Envelope;
use crate::severity::Severity;

/// Errors reported by a hook when it cannot accept an envelope.
#[derive(Debug, Error)]
pub enum HookError {
    #[error("Hook is closed")]
    Closed,

    #[error("Hook I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Envelope serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Hook rejected envelope: {0}")]
    Rejected(String),
}

/// Pluggable telemetry sink.
pub trait TelemetryHook: Send + Sync {
    /// Accept one envelope.
    fn fire(&self, envelope: Envelope) -> Result<(), HookError>;

    /// Severities this hook wants to receive.
    fn levels(&self) -> &[Severity];

    /// Block until previously fired envelopes are processed.
    fn flush(&self) {}
}

impl<H: TelemetryHook + ?Sized> TelemetryHook for Arc<H> {
    fn fire(&self, envelope: Envelope) -> Result<(), HookError> {
        (**self).fire(envelope)
    }

    fn levels(&self) -> &[Severity] {
        (**self).levels()
    }

    fn flush(&self) {
        (**self).flush()
    }
}

impl<H: TelemetryHook + ?Sized> TelemetryHook for Box<H> {
    fn fire(&self, envelope: Envelope) -> Result<(), HookError> {
        (**self).fire(envelope)
    }

    fn levels(&self) -> &[Severity] {
        (**self).levels()
    }

    fn flush(&self) {
        (**self).flush()
    }
}

type FireCallback = Box<dyn Fn(&Envelope) + Send + Sync>;

#[derive(Default)]
struct MockRecords {
    messages: Vec<String>,
    envelopes: Vec<Envelope>,
}

/// In-memory hook that records everything it is fired with.
pub struct MockHook {
    levels: Vec<Severity>,
    records: Mutex<MockRecords>,
    callback: Option<FireCallback>,
}

impl MockHook {
    /// Hook advertising every severity at least as severe as `min`.
    pub fn new(min: Severity) -> Self {
        Self {
            levels: Severity::levels_at_or_above(min),
            records: Mutex::new(MockRecords::default()),
            callback: None,
        }
    }

    /// Invoke `callback` with each envelope before it is recorded.
    pub fn with_callback(mut self, callback: impl Fn(&Envelope) + Send + Sync + 'static) -> Self {
        self.callback = Some(Box::new(callback));
        self
    }

    /// Messages of all fired envelopes, in order.
    pub fn entries(&self) -> Vec<String> {
        self.records.lock().messages.clone()
    }

    /// All fired envelopes, in order.
    pub fn envelopes(&self) -> Vec<Envelope> {
        self.records.lock().envelopes.clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TelemetryHook for MockHook {
    fn fire(&self, envelope: Envelope) -> Result<(), HookError> {
        if let Some(callback) = &self.callback {
            callback(&envelope);
        }
        let mut records = self.records.lock();
        records.messages.push(envelope.message.clone());
        records.envelopes.push(envelope);
        Ok(())
    }

    fn levels(&self) -> &[Severity] {
        &self.levels
    }
}

impl std::fmt::Debug for MockHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockHook")
            .field("levels", &self.levels)
            .field("fired", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::envelope::LogRecord;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn envelope(message: &str) -> Envelope {
        Envelope::from_record(&LogRecord::new(Severity::Warn, message), "session", "")
    }

    #[test]
    fn test_mock_levels_follow_minimum() {
        let hook = MockHook::new(Severity::Error);
        assert_eq!(
            hook.levels(),
            &[Severity::Panic, Severity::Fatal, Severity::Error]
        );
    }

    #[test]
    fn test_mock_records_in_order() {
        let hook = MockHook::new(Severity::Debug);
        hook.fire(envelope("first")).unwrap();
        hook.fire(envelope("second")).unwrap();
        assert_eq!(hook.entries(), vec!["first", "second"]);
        assert_eq!(hook.envelopes()[1].message, "second");
    }

    #[test]
    fn test_mock_callback_invoked() {
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_clone = seen.clone();
        let hook = MockHook::new(Severity::Debug).with_callback(move |_| {
            seen_clone.fetch_add(1, Ordering::SeqCst);
        });
        hook.fire(envelope("x")).unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_arc_forwarding() {
        let hook = Arc::new(MockHook::new(Severity::Info));
        let as_trait: Box<dyn TelemetryHook> = Box::new(hook.clone());
        as_trait.fire(envelope("via arc")).unwrap();
        assert_eq!(hook.len(), 1);
    }

    #[test]
    fn test_hook_error_display() {
        assert_eq!(HookError::Closed.to_string(), "Hook is closed");
        assert!(HookError::Rejected("quota".into()).to_string().contains("quota"));
    }
}
