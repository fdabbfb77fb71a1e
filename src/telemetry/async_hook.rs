// Copyright 2024-2026 Telemetry Relay Contributors
// SPDX-License-Identifier: Apache-2.0

//! Buffered hook that delivers on a dedicated worker thread.
//!
//! `fire` only enqueues, so log callers never wait on delivery. Envelopes
//! reach the wrapped hook in submission order. `flush` waits until every
//! envelope submitted before the call has been delivered or dropped.

use std::collections::VecDeque;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::{Condvar, Mutex};

use super::envelope::Envelope;
use super::hook::{HookError, TelemetryHook};
use crate::severity::Severity;

/// Configuration for the async hook.
#[derive(Debug, Clone)]
pub struct AsyncHookConfig {
    /// Maximum envelopes waiting for delivery. The oldest is dropped when full.
    pub queue_depth: usize,
    /// Worker thread name.
    pub thread_name: String,
}

impl Default for AsyncHookConfig {
    fn default() -> Self {
        Self {
            queue_depth: 256,
            thread_name: "telemetry-hook".to_string(),
        }
    }
}

/// Delivery counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AsyncHookStats {
    pub submitted: u64,
    pub delivered: u64,
    pub failed: u64,
    pub dropped: u64,
}

struct Queue {
    pending: VecDeque<Envelope>,
    stats: AsyncHookStats,
    closed: bool,
    worker_alive: bool,
}

impl Queue {
    /// Envelopes that left the queue one way or another.
    fn processed(&self) -> u64 {
        self.stats.delivered + self.stats.failed + self.stats.dropped
    }
}

struct Shared {
    queue: Mutex<Queue>,
    work_ready: Condvar,
    drained: Condvar,
    inner: Box<dyn TelemetryHook>,
}

/// Marks the worker gone even if the wrapped hook panics.
struct WorkerExit(Arc<Shared>);

impl Drop for WorkerExit {
    fn drop(&mut self) {
        self.0.queue.lock().worker_alive = false;
        self.0.drained.notify_all();
    }
}

/// Hook wrapper with a bounded queue and a single delivery thread.
pub struct AsyncHook {
    shared: Arc<Shared>,
    levels: Vec<Severity>,
    queue_depth: usize,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl AsyncHook {
    /// Start the worker thread delivering to `inner`.
    pub fn spawn(
        inner: Box<dyn TelemetryHook>,
        levels: Vec<Severity>,
        config: AsyncHookConfig,
    ) -> std::io::Result<Self> {
        let shared = Arc::new(Shared {
            queue: Mutex::new(Queue {
                pending: VecDeque::with_capacity(config.queue_depth.min(1024)),
                stats: AsyncHookStats::default(),
                closed: false,
                worker_alive: true,
            }),
            work_ready: Condvar::new(),
            drained: Condvar::new(),
            inner,
        });

        let worker_shared = shared.clone();
        let handle = thread::Builder::new()
            .name(config.thread_name)
            .spawn(move || Self::worker_loop(worker_shared))?;

        Ok(Self {
            shared,
            levels,
            queue_depth: config.queue_depth.max(1),
            worker: Mutex::new(Some(handle)),
        })
    }

    fn worker_loop(shared: Arc<Shared>) {
        let _exit = WorkerExit(shared.clone());

        loop {
            let envelope = {
                let mut queue = shared.queue.lock();
                loop {
                    if let Some(envelope) = queue.pending.pop_front() {
                        break envelope;
                    }
                    if queue.closed {
                        return;
                    }
                    shared.work_ready.wait(&mut queue);
                }
            };

            let result = shared.inner.fire(envelope);

            let mut queue = shared.queue.lock();
            match result {
                Ok(()) => queue.stats.delivered += 1,
                Err(e) => {
                    queue.stats.failed += 1;
                    metrics::counter!("telemetry_envelopes_failed_total").increment(1);
                    tracing::warn!(error = %e, "Telemetry hook failed to deliver envelope");
                }
            }
            drop(queue);
            shared.drained.notify_all();
        }
    }

    /// Snapshot of delivery counters.
    pub fn stats(&self) -> AsyncHookStats {
        self.shared.queue.lock().stats
    }

    /// Envelopes waiting for the worker.
    pub fn pending(&self) -> usize {
        self.shared.queue.lock().pending.len()
    }

    /// Stop accepting envelopes, deliver what is queued, and join the worker.
    pub fn close(&self) {
        {
            let mut queue = self.shared.queue.lock();
            if queue.closed {
                return;
            }
            queue.closed = true;
        }
        self.shared.work_ready.notify_all();

        if let Some(handle) = self.worker.lock().take() {
            if handle.join().is_err() {
                tracing::error!("Telemetry hook worker panicked");
            }
        }
        self.shared.inner.flush();
    }
}

impl TelemetryHook for AsyncHook {
    fn fire(&self, envelope: Envelope) -> Result<(), HookError> {
        let mut queue = self.shared.queue.lock();
        if queue.closed || !queue.worker_alive {
            return Err(HookError::Closed);
        }

        let mut dropped = false;
        if queue.pending.len() >= self.queue_depth {
            queue.pending.pop_front();
            queue.stats.dropped += 1;
            dropped = true;
        }
        queue.pending.push_back(envelope);
        queue.stats.submitted += 1;
        drop(queue);

        if dropped {
            metrics::counter!("telemetry_envelopes_dropped_total").increment(1);
            tracing::warn!(
                queue_depth = self.queue_depth,
                "Telemetry queue full, dropped oldest envelope"
            );
            self.shared.drained.notify_all();
        }
        self.shared.work_ready.notify_one();
        Ok(())
    }

    fn levels(&self) -> &[Severity] {
        &self.levels
    }

    fn flush(&self) {
        {
            let mut queue = self.shared.queue.lock();
            let target = queue.stats.submitted;
            while queue.processed() < target && queue.worker_alive {
                self.shared.drained.wait(&mut queue);
            }
        }
        self.shared.inner.flush();
    }
}

impl Drop for AsyncHook {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for AsyncHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncHook")
            .field("levels", &self.levels)
            .field("queue_depth", &self.queue_depth)
            .field("stats", &self.stats())
            .finish()
    }
}
