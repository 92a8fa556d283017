//! Reel — spin, decelerate and settle state machine
//!
//! ```text
//!            start_spin            stop_spin          speed < threshold
//!   Idle ───────────────▶ Spinning ─────────▶ Decelerating ─────────────▶ Settling
//!    ▲                                                                       │
//!    └─────────────────────── max error < settle_threshold ─────────────────┘
//! ```
//!
//! Motion is driven only by [`Reel::tick`]; `start_spin` / `stop_spin` are
//! requests that take effect on the following ticks.

use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::config::{positive, MotionConfig, ReelConfig, SettleAnchor};
use crate::error::{SlotError, SlotResult};
use crate::symbols::{SymbolId, SymbolSet, SymbolStrip};

/// Observable reel state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReelState {
    Idle,
    Spinning,
    /// Stop requested, speed decaying
    Decelerating,
    /// Easing onto grid targets
    Settling,
}

/// Internal phase; settle targets only exist while settling
#[derive(Debug, Clone, PartialEq)]
enum ReelPhase {
    Idle,
    Spinning,
    Decelerating,
    /// Targets are index-aligned with the strip's spatial order
    Settling { targets: Vec<f64> },
}

/// What a tick did, for the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReelEvent {
    None,
    /// Slots recycled to the left edge this tick
    Recycled(usize),
    /// Speed hit zero, settle targets computed
    SettleBegan,
    /// Snapped onto the grid, reel is idle
    Settled,
}

/// One reel: a strip plus its motion state
#[derive(Debug, Clone)]
pub struct Reel {
    index: usize,
    strip: SymbolStrip,
    symbols: SymbolSet,
    symbol_size: f64,
    boundary: f64,
    motion: MotionConfig,
    speed: f64,
    phase: ReelPhase,
    rng: ChaCha8Rng,
}

impl Reel {
    /// Build reel `index` with a freshly drawn strip
    pub fn new(
        index: usize,
        reels: &ReelConfig,
        motion: &MotionConfig,
        mut rng: ChaCha8Rng,
    ) -> SlotResult<Self> {
        if reels.symbol_count == 0 {
            return Err(SlotError::invalid("symbol_count must be at least 1"));
        }
        positive("symbol_size", reels.symbol_size)?;
        motion.validate()?;

        if reels.symbols.is_empty() {
            log::warn!(
                "Reel {} has an empty symbol set, using '{}'",
                index,
                SymbolId::fallback()
            );
        }

        let strip = SymbolStrip::create(
            reels.symbol_count,
            reels.symbol_size,
            &reels.symbols,
            &mut rng,
        );

        Ok(Self {
            index,
            strip,
            symbols: reels.symbols.clone(),
            symbol_size: reels.symbol_size,
            boundary: reels.wrap_boundary(),
            motion: motion.clone(),
            speed: 0.0,
            phase: ReelPhase::Idle,
            rng,
        })
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // COMMANDS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Start spinning at full speed. Ignored while already spinning or
    /// decelerating; abandons an unfinished settle.
    pub fn start_spin(&mut self) -> bool {
        match self.phase {
            ReelPhase::Spinning | ReelPhase::Decelerating => {
                log::debug!("Reel {} already spinning, start ignored", self.index);
                false
            }
            ReelPhase::Idle | ReelPhase::Settling { .. } => {
                self.phase = ReelPhase::Spinning;
                self.speed = self.motion.spin_speed;
                log::debug!("Reel {} spinning at {}", self.index, self.speed);
                true
            }
        }
    }

    /// Request a stop; the reel decelerates and settles on its own.
    /// Ignored unless spinning.
    pub fn stop_spin(&mut self) -> bool {
        match self.phase {
            ReelPhase::Spinning => {
                self.phase = ReelPhase::Decelerating;
                log::debug!("Reel {} stopping", self.index);
                true
            }
            _ => {
                log::debug!("Reel {} not spinning, stop ignored", self.index);
                false
            }
        }
    }

    /// Advance motion by `delta` frames
    pub fn tick(&mut self, delta: f64) -> ReelEvent {
        if !(delta.is_finite() && delta > 0.0) {
            return ReelEvent::None;
        }

        match self.phase {
            ReelPhase::Idle => ReelEvent::None,
            ReelPhase::Spinning | ReelPhase::Decelerating => self.spin_step(delta),
            ReelPhase::Settling { .. } => self.settle_step(delta),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // MOTION
    // ═══════════════════════════════════════════════════════════════════════════

    fn spin_step(&mut self, delta: f64) -> ReelEvent {
        self.strip.advance(self.speed * delta);
        let recycled = self.strip.wrap_if_beyond(
            self.boundary,
            self.symbol_size,
            &self.symbols,
            &mut self.rng,
        );

        if self.phase == ReelPhase::Decelerating {
            self.speed *= self.motion.decay_rate;
            if self.speed < self.motion.stop_speed_threshold {
                self.speed = 0.0;
                self.begin_settle();
                return ReelEvent::SettleBegan;
            }
        }

        if recycled > 0 {
            ReelEvent::Recycled(recycled)
        } else {
            ReelEvent::None
        }
    }

    fn begin_settle(&mut self) {
        self.strip.sort_by_offset();

        let size = self.symbol_size;
        let base = match self.motion.settle_anchor {
            SettleAnchor::RoundedLeftmost => self
                .strip
                .slot(0)
                .map(|s| (s.offset / size).round() * size)
                .unwrap_or(0.0),
            SettleAnchor::Origin => 0.0,
        };

        let targets = (0..self.strip.len())
            .map(|rank| base + rank as f64 * size)
            .collect();

        log::debug!("Reel {} settling from base {}", self.index, base);
        self.phase = ReelPhase::Settling { targets };
    }

    fn settle_step(&mut self, delta: f64) -> ReelEvent {
        let Reel {
            strip,
            phase,
            motion,
            ..
        } = &mut *self;
        let ReelPhase::Settling { targets } = phase else {
            return ReelEvent::None;
        };

        let t = (motion.settle_easing * delta).min(1.0);
        let mut max_error: f64 = 0.0;

        for (rank, &target) in targets.iter().enumerate() {
            let offset = strip.offset_mut(rank);
            *offset += (target - *offset) * t;
            // Residual after this tick's easing
            max_error = max_error.max((target - *offset).abs());
        }

        if max_error >= motion.settle_threshold {
            return ReelEvent::None;
        }

        for (rank, &target) in targets.iter().enumerate() {
            *strip.offset_mut(rank) = target;
        }
        self.phase = ReelPhase::Idle;
        log::debug!("Reel {} settled", self.index);
        ReelEvent::Settled
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // QUERIES
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn state(&self) -> ReelState {
        match self.phase {
            ReelPhase::Idle => ReelState::Idle,
            ReelPhase::Spinning => ReelState::Spinning,
            ReelPhase::Decelerating => ReelState::Decelerating,
            ReelPhase::Settling { .. } => ReelState::Settling,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.phase == ReelPhase::Idle
    }

    /// Current velocity (position units per frame)
    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn strip(&self) -> &SymbolStrip {
        &self.strip
    }

    /// Settle targets, left to right (only while settling)
    pub fn settle_targets(&self) -> Option<&[f64]> {
        match &self.phase {
            ReelPhase::Settling { targets } => Some(targets),
            _ => None,
        }
    }

    /// Largest distance between a slot and its settle target
    pub fn settle_error(&self) -> Option<f64> {
        self.settle_targets().map(|targets| {
            targets
                .iter()
                .zip(self.strip.offsets())
                .map(|(target, offset)| (target - offset).abs())
                .fold(0.0, f64::max)
        })
    }

    /// Symbols left to right
    pub fn symbols(&self) -> Vec<SymbolId> {
        self.strip.symbols()
    }

    /// Symbols whose slot lies inside `[0, boundary)`, left to right
    pub fn visible_symbols(&self) -> Vec<SymbolId> {
        self.strip
            .spatial()
            .filter(|s| s.offset >= 0.0 && s.offset < self.boundary)
            .map(|s| s.symbol.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::SymbolSlot;
    use approx::assert_relative_eq;
    use rand::SeedableRng;

    fn reel_with(reels: ReelConfig, motion: MotionConfig) -> Reel {
        Reel::new(0, &reels, &motion, ChaCha8Rng::seed_from_u64(7)).unwrap()
    }

    fn reel() -> Reel {
        reel_with(ReelConfig::default(), MotionConfig::default())
    }

    fn run_until_idle(reel: &mut Reel, delta: f64) -> usize {
        let mut ticks = 0;
        while !reel.is_idle() {
            reel.tick(delta);
            ticks += 1;
            assert!(ticks < 10_000, "reel never settled");
        }
        ticks
    }

    fn assert_on_grid(reel: &Reel) {
        let offsets = reel.strip().offsets();
        for pair in offsets.windows(2) {
            assert_eq!(pair[1] - pair[0], 150.0);
        }
        assert_eq!(offsets[0] % 150.0, 0.0);
    }

    #[test]
    fn test_starts_idle() {
        let reel = reel();
        assert_eq!(reel.state(), ReelState::Idle);
        assert_eq!(reel.speed(), 0.0);
        assert!(reel.settle_targets().is_none());
        assert_eq!(reel.strip().len(), 6);
    }

    #[test]
    fn test_rejects_bad_geometry() {
        let motion = MotionConfig::default();
        let rng = || ChaCha8Rng::seed_from_u64(0);

        let mut reels = ReelConfig::default();
        reels.symbol_count = 0;
        assert!(Reel::new(0, &reels, &motion, rng()).is_err());

        let mut reels = ReelConfig::default();
        reels.symbol_size = 0.0;
        assert!(Reel::new(0, &reels, &motion, rng()).is_err());
    }

    #[test]
    fn test_start_spin_sets_speed() {
        let mut reel = reel();
        assert!(reel.start_spin());
        assert_eq!(reel.state(), ReelState::Spinning);
        assert_eq!(reel.speed(), 50.0);
    }

    #[test]
    fn test_idle_tick_is_noop() {
        let mut reel = reel();
        let before = reel.strip().clone();

        for delta in [0.0, 0.5, 1.0, 3.0, 1000.0] {
            assert_eq!(reel.tick(delta), ReelEvent::None);
        }
        assert_eq!(reel.strip(), &before);
        assert_eq!(reel.state(), ReelState::Idle);
    }

    #[test]
    fn test_guards() {
        let mut reel = reel();
        assert!(!reel.stop_spin());
        assert_eq!(reel.state(), ReelState::Idle);

        assert!(reel.start_spin());
        reel.tick(1.0);
        assert!(!reel.start_spin());
        assert_eq!(reel.state(), ReelState::Spinning);

        assert!(reel.stop_spin());
        assert_eq!(reel.state(), ReelState::Decelerating);
        assert!(!reel.start_spin());
        assert!(!reel.stop_spin());
        assert_eq!(reel.speed(), 50.0);
    }

    #[test]
    fn test_spinning_moves_and_wraps() {
        let mut reel = reel();
        reel.start_spin();

        reel.tick(1.0);
        assert_eq!(
            reel.strip().offsets(),
            vec![50.0, 200.0, 350.0, 500.0, 650.0, 800.0]
        );

        reel.tick(1.0);
        reel.tick(1.0);
        // 750 + 150 reached the 900 boundary and moved to 150 - 150
        assert_eq!(
            reel.strip().offsets(),
            vec![0.0, 150.0, 300.0, 450.0, 600.0, 750.0]
        );
        assert_eq!(reel.strip().order()[0], 5);
    }

    #[test]
    fn test_spinning_never_stops_on_its_own() {
        let mut reel = reel();
        reel.start_spin();
        for _ in 0..1000 {
            reel.tick(1.0);
        }
        assert_eq!(reel.state(), ReelState::Spinning);
        assert_eq!(reel.speed(), 50.0);
        assert_eq!(reel.strip().len(), 6);
    }

    #[test]
    fn test_decay_is_monotonic_until_settle() {
        let mut reel = reel();
        reel.start_spin();
        reel.tick(1.0);
        reel.stop_spin();

        let mut previous = reel.speed();
        loop {
            let event = reel.tick(1.0);
            if reel.state() == ReelState::Settling {
                assert_eq!(event, ReelEvent::SettleBegan);
                assert_eq!(reel.speed(), 0.0);
                assert!(reel.settle_targets().is_some());
                break;
            }
            assert!(reel.speed() < previous);
            assert!(reel.speed() >= 0.95);
            previous = reel.speed();
        }
    }

    #[test]
    fn test_default_decay_settles_on_third_tick() {
        let mut reel = reel();
        reel.start_spin();
        reel.stop_spin();

        // 50 -> 12.5 -> 3.125 -> 0.78125
        reel.tick(1.0);
        assert_relative_eq!(reel.speed(), 12.5);
        reel.tick(1.0);
        assert_relative_eq!(reel.speed(), 3.125);
        assert_eq!(reel.tick(1.0), ReelEvent::SettleBegan);
        assert_eq!(reel.speed(), 0.0);
    }

    #[test]
    fn test_settle_converges_onto_grid() {
        let mut reel = reel();
        reel.start_spin();
        for _ in 0..7 {
            reel.tick(1.0);
        }
        reel.stop_spin();

        while reel.state() != ReelState::Settling {
            reel.tick(1.0);
        }

        let targets = reel.settle_targets().unwrap().to_vec();
        assert_eq!(targets.len(), reel.strip().len());

        let mut previous = reel.settle_error().unwrap();
        let mut ticks = 0;
        loop {
            let event = reel.tick(1.0);
            ticks += 1;
            if event == ReelEvent::Settled {
                break;
            }
            let error = reel.settle_error().unwrap();
            assert!(error <= previous);
            previous = error;
            assert!(ticks < 1000);
        }

        assert_eq!(reel.state(), ReelState::Idle);
        assert!(reel.settle_targets().is_none());
        assert_eq!(reel.strip().offsets(), targets);
        assert_on_grid(&reel);
    }

    #[test]
    fn test_settle_from_arbitrary_offsets() {
        let mut reel = reel();
        reel.strip = SymbolStrip::from_slots(
            [437.0, -12.5, 880.0, 101.0, 260.0, 612.25]
                .into_iter()
                .map(|offset| SymbolSlot {
                    offset,
                    symbol: SymbolId::new("symbol1.png"),
                })
                .collect(),
        );
        reel.begin_settle();

        // Leftmost -12.5 rounds to the 0 grid line
        assert_eq!(
            reel.settle_targets().unwrap(),
            &[0.0, 150.0, 300.0, 450.0, 600.0, 750.0]
        );
        run_until_idle(&mut reel, 1.0);
        assert_eq!(
            reel.strip().offsets(),
            vec![0.0, 150.0, 300.0, 450.0, 600.0, 750.0]
        );
        // The slot that started rightmost is still rightmost
        assert_eq!(reel.strip().order()[5], 2);
    }

    #[test]
    fn test_full_easing_step_settles_at_once() {
        let mut reel = reel();
        reel.strip.advance(-100.0);
        reel.begin_settle();

        // 0.3 * 4.0 >= 1 moves every slot onto its target in one tick
        assert_eq!(reel.tick(4.0), ReelEvent::Settled);
        assert_eq!(reel.state(), ReelState::Idle);
        assert_eq!(reel.strip().offsets()[0], -150.0);
    }

    #[test]
    fn test_rounded_leftmost_anchor() {
        let mut reel = reel();
        reel.strip.advance(-100.0);
        reel.begin_settle();

        // -100 rounds to -150
        assert_eq!(reel.settle_targets().unwrap()[0], -150.0);
        assert_eq!(reel.settle_targets().unwrap()[5], 600.0);
    }

    #[test]
    fn test_origin_anchor() {
        let motion = MotionConfig {
            settle_anchor: SettleAnchor::Origin,
            ..MotionConfig::default()
        };
        let mut reel = reel_with(ReelConfig::default(), motion);
        reel.strip.advance(-100.0);
        reel.begin_settle();

        assert_eq!(
            reel.settle_targets().unwrap(),
            &[0.0, 150.0, 300.0, 450.0, 600.0, 750.0]
        );
    }

    #[test]
    fn test_large_delta_snaps_immediately() {
        let mut reel = reel();
        reel.strip.advance(40.0);
        reel.begin_settle();

        // easing * delta >= 1 moves straight onto the targets
        assert_eq!(reel.tick(10.0), ReelEvent::Settled);
        assert_on_grid(&reel);
    }

    #[test]
    fn test_long_frame_keeps_strip_on_screen() {
        let mut reel = reel();
        reel.start_spin();

        // 50 * 50 = 2500 units in one step, almost three laps
        reel.tick(50.0);
        let offsets = reel.strip().offsets();
        assert!(offsets.iter().all(|&o| (0.0..900.0).contains(&o)), "{:?}", offsets);
        assert_eq!(reel.visible_symbols().len(), 6);
    }

    #[test]
    fn test_long_frame_while_stopping_settles_on_screen() {
        let mut reel = reel();
        reel.start_spin();
        reel.tick(1.0);
        reel.stop_spin();

        for delta in [40.0, 90.0, 90.0] {
            reel.tick(delta);
        }
        run_until_idle(&mut reel, 90.0);

        assert_on_grid(&reel);
        assert!(reel.visible_symbols().len() >= 5);
        assert!(reel.strip().offsets().iter().all(|&o| (-150.0..=900.0).contains(&o)));
    }

    #[test]
    fn test_restart_during_settle() {
        let mut reel = reel();
        reel.strip.advance(40.0);
        reel.begin_settle();

        assert!(reel.start_spin());
        assert_eq!(reel.state(), ReelState::Spinning);
        assert!(reel.settle_targets().is_none());
    }

    #[test]
    fn test_ignores_bad_delta() {
        let mut reel = reel();
        reel.start_spin();
        let before = reel.strip().offsets();

        assert_eq!(reel.tick(-1.0), ReelEvent::None);
        assert_eq!(reel.tick(f64::NAN), ReelEvent::None);
        assert_eq!(reel.tick(f64::INFINITY), ReelEvent::None);
        assert_eq!(reel.strip().offsets(), before);
    }

    #[test]
    fn test_full_cycle_keeps_symbols_in_set() {
        let reels = ReelConfig {
            symbols: SymbolSet::from_names(["a", "b", "c"]),
            ..ReelConfig::default()
        };
        let mut reel = reel_with(reels.clone(), MotionConfig::default());

        reel.start_spin();
        for _ in 0..50 {
            reel.tick(0.8);
        }
        reel.stop_spin();
        run_until_idle(&mut reel, 0.8);

        assert_on_grid(&reel);
        assert!(reel.symbols().iter().all(|s| reels.symbols.contains(s)));
        assert!(reel.visible_symbols().len() <= 6);
    }
}
