// Copyright 2024-2026 Telemetry Relay Contributors
// SPDX-License-Identifier: Apache-2.0

//! Hook that writes each envelope as one JSON line.
//!
//! Intended as a local sink (stdout or a spool file) that an external
//! shipper picks up. Writes are synchronous, so wrap it in an
//! [`AsyncHook`](super::AsyncHook) when the writer can be slow.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use parking_lot::Mutex;

use super::envelope::Envelope;
use super::hook::{HookError, TelemetryHook};
use crate::severity::Severity;

pub struct JsonLinesHook<W: Write + Send> {
    writer: Mutex<W>,
    levels: Vec<Severity>,
}

impl<W: Write + Send> JsonLinesHook<W> {
    /// Wrap `writer`, accepting every severity.
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
            levels: Severity::ALL.to_vec(),
        }
    }

    /// Consume the hook and return the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl JsonLinesHook<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl JsonLinesHook<File> {
    /// Append to the file at `path`, creating it if needed.
    pub fn append_to(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(file))
    }
}

impl<W: Write + Send> TelemetryHook for JsonLinesHook<W> {
    fn fire(&self, envelope: Envelope) -> Result<(), HookError> {
        let mut line = serde_json::to_vec(&envelope)?;
        line.push(b'\n');
        self.writer.lock().write_all(&line)?;
        Ok(())
    }

    fn levels(&self) -> &[Severity] {
        &self.levels
    }

    fn flush(&self) {
        if let Err(e) = self.writer.lock().flush() {
            tracing::warn!(error = %e, "Failed to flush telemetry writer");
        }
    }
}
