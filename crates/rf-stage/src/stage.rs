//! Stage — The lifecycle moments of a spin
//!
//! A Stage is NOT an animation and NOT a timer callback.
//! A Stage is the SEMANTIC MEANING of a moment in the spin flow.

use serde::{Deserialize, Serialize};

/// Canonical spin stage published by the orchestrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Stage {
    // ═══════════════════════════════════════════════════════════════════════
    // SPIN LIFECYCLE
    // ═══════════════════════════════════════════════════════════════════════
    /// Spin accepted, reel starts are being scheduled
    SpinStarted,

    /// A single reel was told to start spinning
    ReelSpinStart {
        /// Which reel (0-indexed)
        reel_index: usize,
    },

    /// A single reel was told to stop (it keeps decelerating on its own)
    ReelStopRequested {
        /// Which reel (0-indexed)
        reel_index: usize,
    },

    /// A reel snapped onto the grid and is idle again
    ReelSettled {
        /// Which reel (0-indexed)
        reel_index: usize,
        /// Symbols on this reel, left to right
        #[serde(default)]
        symbols: Vec<String>,
    },

    /// Spin finished, ready for the next one
    SpinStopped,

    // ═══════════════════════════════════════════════════════════════════════
    // WIN
    // ═══════════════════════════════════════════════════════════════════════
    /// The win gate accepted this spin
    WinDetected,
}

/// Stage category for grouping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StageCategory {
    SpinLifecycle,
    Reel,
    Win,
}

impl Stage {
    /// Get the category of this stage
    pub fn category(&self) -> StageCategory {
        match self {
            Stage::SpinStarted | Stage::SpinStopped => StageCategory::SpinLifecycle,
            Stage::ReelSpinStart { .. }
            | Stage::ReelStopRequested { .. }
            | Stage::ReelSettled { .. } => StageCategory::Reel,
            Stage::WinDetected => StageCategory::Win,
        }
    }

    /// Get a simple string name for this stage type
    pub fn type_name(&self) -> &'static str {
        match self {
            Stage::SpinStarted => "spin_started",
            Stage::ReelSpinStart { .. } => "reel_spin_start",
            Stage::ReelStopRequested { .. } => "reel_stop_requested",
            Stage::ReelSettled { .. } => "reel_settled",
            Stage::SpinStopped => "spin_stopped",
            Stage::WinDetected => "win_detected",
        }
    }

    /// Reel index for per-reel stages
    pub fn reel_index(&self) -> Option<usize> {
        match self {
            Stage::ReelSpinStart { reel_index }
            | Stage::ReelStopRequested { reel_index }
            | Stage::ReelSettled { reel_index, .. } => Some(*reel_index),
            _ => None,
        }
    }

    /// Get all valid stage type names for validation
    pub fn all_type_names() -> &'static [&'static str] {
        &[
            "spin_started",
            "reel_spin_start",
            "reel_stop_requested",
            "reel_settled",
            "spin_stopped",
            "win_detected",
        ]
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.reel_index() {
            Some(index) => write!(f, "{}[{}]", self.type_name(), index),
            None => f.write_str(self.type_name()),
        }
    }
}
