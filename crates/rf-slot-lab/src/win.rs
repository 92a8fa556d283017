//! Win gate — the binary win/no-win decision of a completed spin

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Outcome of one roll of the win gate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WinRoll {
    /// Uniform sample in [0, 1)
    pub sample: f64,
    /// Probability the gate was asked to accept
    pub chance: f64,
    pub won: bool,
}

/// Roll the gate with any RNG: true iff a uniform sample is below `chance`
pub fn resolve_with<R: Rng + ?Sized>(rng: &mut R, chance: f64) -> WinRoll {
    let sample: f64 = rng.random();
    WinRoll {
        sample,
        chance,
        won: sample < chance,
    }
}

/// Seedable win gate
#[derive(Debug, Clone)]
pub struct WinResolver {
    rng: ChaCha8Rng,
}

impl WinResolver {
    /// Gate seeded from the OS
    pub fn new() -> Self {
        Self {
            rng: ChaCha8Rng::from_os_rng(),
        }
    }

    /// Reproducible gate
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// true iff one uniform sample in [0, 1) is below `chance`
    pub fn resolve(&mut self, chance: f64) -> bool {
        self.roll(chance).won
    }

    /// Like [`WinResolver::resolve`], keeping the sample
    pub fn roll(&mut self, chance: f64) -> WinRoll {
        resolve_with(&mut self.rng, chance)
    }
}

impl Default for WinResolver {
    fn default() -> Self {
        Self::new()
    }
}
