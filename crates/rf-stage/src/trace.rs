//! StageTrace — The sequence of stage events for one spin
//!
//! A trace captures the full timeline of a spin round.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::StageEvent;
use crate::stage::Stage;

/// A complete trace of stage events for one spin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageTrace {
    /// Unique identifier for this trace
    pub trace_id: String,

    /// Spin this trace belongs to
    #[serde(default)]
    pub spin_id: Option<u64>,

    /// All events in publication order
    pub events: Vec<StageEvent>,

    /// When this trace was opened
    pub recorded_at: DateTime<Utc>,

    /// Custom metadata
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl StageTrace {
    /// Create a new empty trace
    pub fn new(trace_id: impl Into<String>) -> Self {
        Self {
            trace_id: trace_id.into(),
            spin_id: None,
            events: Vec::new(),
            recorded_at: Utc::now(),
            metadata: serde_json::Map::new(),
        }
    }

    /// Add an event to the trace
    pub fn push(&mut self, event: StageEvent) {
        self.events.push(event);
    }

    /// Set spin ID
    pub fn with_spin(mut self, spin_id: u64) -> Self {
        self.spin_id = Some(spin_id);
        self
    }

    /// Add metadata
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Get total duration in milliseconds
    pub fn duration_ms(&self) -> f64 {
        match (self.events.first(), self.events.last()) {
            (Some(first), Some(last)) => last.timestamp_ms - first.timestamp_ms,
            _ => 0.0,
        }
    }

    /// Get events by stage type name
    pub fn events_by_type(&self, type_name: &str) -> Vec<&StageEvent> {
        self.events
            .iter()
            .filter(|e| e.stage.type_name() == type_name)
            .collect()
    }

    /// Check if trace contains a specific stage type
    pub fn has_stage(&self, type_name: &str) -> bool {
        self.events.iter().any(|e| e.stage.type_name() == type_name)
    }

    /// Reel indices of a per-reel stage type, in publication order
    pub fn reel_order(&self, type_name: &str) -> Vec<usize> {
        self.events_by_type(type_name)
            .into_iter()
            .filter_map(|e| e.stage.reel_index())
            .collect()
    }

    /// Timestamps of a stage type, in publication order
    pub fn timestamps(&self, type_name: &str) -> Vec<f64> {
        self.events_by_type(type_name)
            .into_iter()
            .map(|e| e.timestamp_ms)
            .collect()
    }

    /// Check if the spin was flagged as a win
    pub fn is_win(&self) -> bool {
        self.has_stage("win_detected")
    }

    /// Validate trace has required stages
    pub fn validate(&self) -> TraceValidation {
        let chronological = self
            .events
            .windows(2)
            .all(|pair| pair[0].timestamp_ms <= pair[1].timestamp_ms);

        TraceValidation {
            has_spin_started: matches!(
                self.events.first().map(|e| &e.stage),
                Some(Stage::SpinStarted)
            ),
            has_spin_stopped: matches!(
                self.events.last().map(|e| &e.stage),
                Some(Stage::SpinStopped)
            ),
            reel_starts: self.events_by_type("reel_spin_start").len(),
            reel_stops: self.events_by_type("reel_stop_requested").len(),
            reel_settles: self.events_by_type("reel_settled").len(),
            chronological,
        }
    }
}

/// Result of trace validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceValidation {
    /// First event is `SpinStarted`
    pub has_spin_started: bool,
    /// Last event is `SpinStopped`
    pub has_spin_stopped: bool,
    pub reel_starts: usize,
    pub reel_stops: usize,
    pub reel_settles: usize,
    /// Timestamps never go backwards
    pub chronological: bool,
}

impl TraceValidation {
    /// A complete spin over `reel_count` reels
    pub fn is_complete(&self, reel_count: usize) -> bool {
        self.has_spin_started
            && self.has_spin_stopped
            && self.reel_starts == reel_count
            && self.reel_stops == reel_count
            && self.reel_settles == reel_count
            && self.chronological
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::StagePayload;

    fn sample_trace() -> StageTrace {
        let mut trace = StageTrace::new("trace-1").with_spin(1);
        trace.push(StageEvent::new(Stage::SpinStarted, 0.0));
        trace.push(StageEvent::new(Stage::ReelSpinStart { reel_index: 0 }, 0.0));
        trace.push(StageEvent::new(Stage::ReelSpinStart { reel_index: 1 }, 200.0));
        trace.push(StageEvent::new(Stage::ReelStopRequested { reel_index: 0 }, 700.0));
        trace.push(StageEvent::new(Stage::ReelStopRequested { reel_index: 1 }, 1100.0));
        trace.push(StageEvent::new(
            Stage::ReelSettled {
                reel_index: 0,
                symbols: vec![],
            },
            800.0,
        ));
        trace.push(StageEvent::new(
            Stage::ReelSettled {
                reel_index: 1,
                symbols: vec![],
            },
            1200.0,
        ));
        trace.push(StageEvent::with_payload(
            Stage::WinDetected,
            1600.0,
            StagePayload::for_spin(1).win_roll(0.1, 0.3),
        ));
        trace.push(StageEvent::new(Stage::SpinStopped, 1600.0));
        trace
    }

    #[test]
    fn test_trace_queries() {
        let trace = sample_trace();

        assert_eq!(trace.duration_ms(), 1600.0);
        assert_eq!(trace.reel_order("reel_spin_start"), vec![0, 1]);
        assert_eq!(trace.timestamps("reel_stop_requested"), vec![700.0, 1100.0]);
        assert!(trace.is_win());
    }

    #[test]
    fn test_trace_validation() {
        let trace = sample_trace();
        let validation = trace.validate();

        // Settle at 800 is published after the stop at 1100 in this sample
        assert!(!validation.chronological);
        assert!(validation.has_spin_started);
        assert!(validation.has_spin_stopped);
        assert_eq!(validation.reel_settles, 2);
        assert!(!validation.is_complete(2));
    }

    #[test]
    fn test_trace_metadata_serializes() {
        let trace = StageTrace::new("spin-1")
            .with_metadata("profile", "turbo".into())
            .with_metadata("seed", serde_json::json!(7));

        let json = serde_json::to_value(&trace).unwrap();
        assert_eq!(json["metadata"]["profile"], "turbo");
        assert_eq!(json["metadata"]["seed"], 7);
    }

    #[test]
    fn test_empty_trace() {
        let trace = StageTrace::new("empty");
        assert_eq!(trace.duration_ms(), 0.0);
        assert!(!trace.validate().has_spin_started);
    }
}
