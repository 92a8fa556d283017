//! Slot machine configuration
//!
//! Every tunable of the reel motion and spin sequencing lives here. All
//! sections deserialize with defaults, so a partial JSON/YAML file only needs
//! the values it changes.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SlotError, SlotResult};
use crate::symbols::SymbolSet;
use crate::timing::TimingConfig;

/// Reel geometry and symbol set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReelConfig {
    /// Number of reels driven by the orchestrator
    pub reel_count: usize,
    /// Slots per reel strip
    pub symbol_count: usize,
    /// Grid cell size (position units between neighbouring slots)
    pub symbol_size: f64,
    /// Symbol identifiers drawn uniformly when a slot is (re)filled
    pub symbols: SymbolSet,
}

impl Default for ReelConfig {
    fn default() -> Self {
        Self {
            reel_count: 4,
            symbol_count: 6,
            symbol_size: 150.0,
            symbols: SymbolSet::default(),
        }
    }
}

impl ReelConfig {
    /// Position at which a moving slot is recycled to the left edge
    pub fn wrap_boundary(&self) -> f64 {
        self.symbol_count as f64 * self.symbol_size
    }

    pub fn validate(&self) -> SlotResult<()> {
        if self.reel_count == 0 {
            return Err(SlotError::invalid("reel_count must be at least 1"));
        }
        if self.symbol_count == 0 {
            return Err(SlotError::invalid("symbol_count must be at least 1"));
        }
        positive("symbol_size", self.symbol_size)
    }
}

/// How settle targets are derived when a reel comes to rest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettleAnchor {
    /// Leftmost slot rounded to the nearest grid line, others follow at `size` steps
    #[default]
    RoundedLeftmost,
    /// Slot `i` lands on `i * size`
    Origin,
}

/// Reel motion constants (speeds are position units per frame)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Velocity set by `start_spin`
    pub spin_speed: f64,
    /// Multiplicative speed decay applied on each decelerating tick
    pub decay_rate: f64,
    /// Speed below which the reel stops and begins settling
    pub stop_speed_threshold: f64,
    /// Easing factor toward settle targets (scaled by frame delta)
    pub settle_easing: f64,
    /// Max positional error at which the reel snaps onto its targets
    pub settle_threshold: f64,
    /// Settle target formula
    pub settle_anchor: SettleAnchor,
}

impl MotionConfig {
    pub fn validate(&self) -> SlotResult<()> {
        positive("spin_speed", self.spin_speed)?;
        if !(self.decay_rate > 0.0 && self.decay_rate < 1.0) {
            return Err(SlotError::invalid(format!(
                "decay_rate must be in (0, 1), got {}",
                self.decay_rate
            )));
        }
        positive("stop_speed_threshold", self.stop_speed_threshold)?;
        positive("settle_easing", self.settle_easing)?;
        positive("settle_threshold", self.settle_threshold)
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            spin_speed: 50.0,
            decay_rate: 0.25,
            stop_speed_threshold: 0.95,
            settle_easing: 0.3,
            settle_threshold: 0.5,
            settle_anchor: SettleAnchor::RoundedLeftmost,
        }
    }
}

/// Win gate configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WinConfig {
    /// Probability that a completed spin is flagged as a win
    pub win_chance: f64,
}

impl Default for WinConfig {
    fn default() -> Self {
        Self { win_chance: 0.3 }
    }
}

/// Complete slot configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotConfig {
    pub reels: ReelConfig,
    pub motion: MotionConfig,
    pub timing: TimingConfig,
    pub win: WinConfig,
    /// Seed for every RNG in the session (entropy when absent)
    pub seed: Option<u64>,
}

impl SlotConfig {
    /// Builder: fix the session seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Builder: replace timing
    pub fn with_timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }

    /// Builder: set win chance
    pub fn with_win_chance(mut self, win_chance: f64) -> Self {
        self.win.win_chance = win_chance;
        self
    }

    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> SlotResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a YAML config
    pub fn from_yaml(yaml: &str) -> SlotResult<Self> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file, picking the format from its extension
    pub fn load(path: impl AsRef<Path>) -> SlotResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json(&text),
            Some("yaml") | Some("yml") => Self::from_yaml(&text),
            other => Err(SlotError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }

    /// Reject configurations that would produce degenerate runtime behavior
    pub fn validate(&self) -> SlotResult<()> {
        self.reels.validate()?;
        self.motion.validate()?;
        self.timing.validate()?;

        let chance = self.win.win_chance;
        if !(0.0..=1.0).contains(&chance) {
            return Err(SlotError::invalid(format!(
                "win_chance must be in [0, 1], got {}",
                chance
            )));
        }

        Ok(())
    }
}

pub(crate) fn positive(name: &str, value: f64) -> SlotResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SlotError::invalid(format!(
            "{} must be a positive finite number, got {}",
            name, value
        )))
    }
}
