// Copyright 2024-2026 Telemetry Relay Contributors
// SPDX-License-Identifier: Apache-2.0

//! Bounded buffer of recent log lines.
//!
//! The ring has no lock of its own; the owning `TelemetryState` keeps it
//! behind the same mutex that orders dispatch.

use std::collections::VecDeque;

/// Default number of lines retained.
pub const DEFAULT_HISTORY_DEPTH: usize = 100;

#[derive(Debug, Clone)]
pub struct HistoryRing {
    lines: VecDeque<String>,
    capacity: usize,
}

impl HistoryRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            // Cap the up-front allocation; large depths grow on demand.
            lines: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    /// Append a line, evicting the oldest entries beyond capacity.
    pub fn append(&mut self, line: impl Into<String>) {
        if self.capacity == 0 {
            return;
        }
        while self.lines.len() >= self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line.into());
    }

    /// Owned copy of the current contents, oldest first.
    pub fn snapshot(&self) -> Vec<String> {
        self.lines.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

impl Default for HistoryRing {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_DEPTH)
    }
}
