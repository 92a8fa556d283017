//! Notification port — where the orchestrator publishes lifecycle stages
//!
//! The transport is owned by the caller and injected at construction. A few
//! ready-made ports cover logging, recording and channel hand-off.

use std::sync::Arc;

use crossbeam_channel::Sender;
use parking_lot::Mutex;
use rf_stage::{Stage, StageEvent, StageTrace};

/// Publish capability for spin lifecycle events
pub trait NotificationPort {
    fn publish(&self, event: StageEvent);
}

impl<P: NotificationPort + ?Sized> NotificationPort for Arc<P> {
    fn publish(&self, event: StageEvent) {
        (**self).publish(event)
    }
}

impl<P: NotificationPort + ?Sized> NotificationPort for Box<P> {
    fn publish(&self, event: StageEvent) {
        (**self).publish(event)
    }
}

/// Publish to both ports, in order
impl<A: NotificationPort, B: NotificationPort> NotificationPort for (A, B) {
    fn publish(&self, event: StageEvent) {
        self.0.publish(event.clone());
        self.1.publish(event);
    }
}

/// Hand events to another thread; a closed channel drops them
impl NotificationPort for Sender<StageEvent> {
    fn publish(&self, event: StageEvent) {
        if self.send(event).is_err() {
            log::debug!("Notification channel closed, event dropped");
        }
    }
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPort;

impl NotificationPort for NullPort {
    fn publish(&self, _event: StageEvent) {}
}

/// Writes each event to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogPort;

impl NotificationPort for LogPort {
    fn publish(&self, event: StageEvent) {
        match event.stage {
            Stage::WinDetected => log::info!(
                "[{:>8.1}ms] {} (roll {:?} < {:?}, margin {:.4})",
                event.timestamp_ms,
                event.stage,
                event.payload.win_roll,
                event.payload.win_chance,
                event.payload.win_margin()
            ),
            Stage::SpinStarted | Stage::SpinStopped => {
                log::info!("[{:>8.1}ms] {}", event.timestamp_ms, event.stage)
            }
            _ => log::debug!("[{:>8.1}ms] {}", event.timestamp_ms, event.stage),
        }
    }
}

/// Records events into one [`StageTrace`] per spin
///
/// Cloning shares the underlying storage, so a test or UI can keep a clone
/// while the orchestrator owns another.
#[derive(Debug, Clone, Default)]
pub struct RecordingPort {
    traces: Arc<Mutex<Vec<StageTrace>>>,
}

impl RecordingPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every recorded trace
    pub fn traces(&self) -> Vec<StageTrace> {
        self.traces.lock().clone()
    }

    /// Snapshot of every recorded event, across spins
    pub fn events(&self) -> Vec<StageEvent> {
        self.traces
            .lock()
            .iter()
            .flat_map(|t| t.events.iter().cloned())
            .collect()
    }

    /// Type names of every recorded event, in order
    pub fn type_names(&self) -> Vec<&'static str> {
        self.traces
            .lock()
            .iter()
            .flat_map(|t| t.events.iter().map(|e| e.type_name()))
            .collect()
    }

    pub fn clear(&self) {
        self.traces.lock().clear();
    }
}

impl NotificationPort for RecordingPort {
    fn publish(&self, event: StageEvent) {
        let mut traces = self.traces.lock();

        let opens_trace = matches!(event.stage, Stage::SpinStarted) || traces.is_empty();
        if opens_trace {
            let mut trace = StageTrace::new(format!("trace-{:06}", traces.len() + 1));
            trace.spin_id = event.payload.spin_id;
            traces.push(trace);
        }

        if let Some(trace) = traces.last_mut() {
            trace.push(event);
        }
    }
}
