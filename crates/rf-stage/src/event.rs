//! StageEvent — A stage occurrence with metadata
//!
//! Wraps a Stage with timing and payload.

use serde::{Deserialize, Serialize};

use crate::stage::Stage;

/// A stage event with full metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageEvent {
    /// The canonical stage
    pub stage: Stage,

    /// Timestamp in milliseconds (orchestrator clock, session relative)
    pub timestamp_ms: f64,

    /// Additional payload data
    #[serde(default)]
    pub payload: StagePayload,

    /// Custom tags for filtering/routing
    #[serde(default)]
    pub tags: Vec<String>,
}

impl StageEvent {
    /// Create a new stage event
    pub fn new(stage: Stage, timestamp_ms: f64) -> Self {
        Self {
            stage,
            timestamp_ms,
            payload: StagePayload::default(),
            tags: Vec::new(),
        }
    }

    /// Create with payload
    pub fn with_payload(stage: Stage, timestamp_ms: f64, payload: StagePayload) -> Self {
        Self {
            stage,
            timestamp_ms,
            payload,
            tags: Vec::new(),
        }
    }

    /// Add a tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Get stage type name
    pub fn type_name(&self) -> &'static str {
        self.stage.type_name()
    }
}

/// Additional payload data for a stage event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StagePayload {
    /// Spin this event belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spin_id: Option<u64>,

    // ═══ WIN DATA ═══
    /// Uniform sample drawn by the win gate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub win_roll: Option<f64>,

    /// Probability the gate was asked to accept
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub win_chance: Option<f64>,

    // ═══ REEL DATA ═══
    /// Final visible symbols (reels × slots, left to right)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reel_symbols: Option<Vec<Vec<String>>>,
}

impl StagePayload {
    /// Create empty payload
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a payload tagged with a spin id
    pub fn for_spin(spin_id: u64) -> Self {
        Self {
            spin_id: Some(spin_id),
            ..Default::default()
        }
    }

    /// Builder: set win gate roll and chance
    pub fn win_roll(mut self, roll: f64, chance: f64) -> Self {
        self.win_roll = Some(roll);
        self.win_chance = Some(chance);
        self
    }

    /// Builder: set reel symbols
    pub fn reel_symbols(mut self, symbols: Vec<Vec<String>>) -> Self {
        self.reel_symbols = Some(symbols);
        self
    }

    /// How far under the chance the roll landed (0 when missing or a loss)
    pub fn win_margin(&self) -> f64 {
        match (self.win_roll, self.win_chance) {
            (Some(roll), Some(chance)) if roll < chance => chance - roll,
            _ => 0.0,
        }
    }
}
