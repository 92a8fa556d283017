//! Spin orchestrator — staggered start/stop across reels plus the win gate
//!
//! ```text
//! spin()
//!   ├── StartReel(i)        at i · stagger_start
//!   └── BeginStopSequence   at final + (N-1) · stagger_start
//!         └── StopReel(i)   at i · stagger_stop
//!               └── Finalize (after last stop) at final
//!                     └── waits for every reel to settle, then rolls the gate
//! ```
//!
//! Timers and reel motion are driven separately: [`SpinOrchestrator::advance_time`]
//! fires due actions, [`SpinOrchestrator::tick`] moves reels.
//! [`SpinOrchestrator::update`] does both from one wall-clock step.

use std::sync::Arc;

use parking_lot::Mutex;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rf_stage::{Stage, StageEvent, StagePayload};
use serde::{Deserialize, Serialize};

use crate::config::SlotConfig;
use crate::error::SlotResult;
use crate::notify::NotificationPort;
use crate::reel::{Reel, ReelEvent};
use crate::symbols::SymbolId;
use crate::timing::{FrameClock, TimerQueue};
use crate::win::{WinResolver, WinRoll};

/// Orchestrator shared between threads (e.g. UI and frame driver)
pub type SharedOrchestrator = Arc<Mutex<SpinOrchestrator>>;

/// Delayed action executed by the orchestrator's timer queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpinAction {
    StartReel(usize),
    BeginStopSequence,
    StopReel(usize),
    Finalize,
}

/// Result of one completed spin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinOutcome {
    pub spin_id: u64,
    pub won: bool,
    pub roll: WinRoll,
    /// Visible symbols per reel, left to right
    pub symbols: Vec<Vec<SymbolId>>,
    /// Queue time at which the spin finalized
    pub finished_at_ms: f64,
}

/// Session statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub total_spins: u64,
    pub wins: u64,
    pub losses: u64,
    /// Spins rejected because one was already running or reels were moving
    pub rejected_spins: u64,
}

impl SessionStats {
    /// Calculate hit rate (percent)
    pub fn hit_rate(&self) -> f64 {
        if self.total_spins > 0 {
            (self.wins as f64 / self.total_spins as f64) * 100.0
        } else {
            0.0
        }
    }

    fn record(&mut self, won: bool) {
        self.total_spins += 1;
        if won {
            self.wins += 1;
        } else {
            self.losses += 1;
        }
    }
}

/// Owns the reel set and sequences spins across it
pub struct SpinOrchestrator {
    config: SlotConfig,
    reels: Vec<Reel>,
    timers: TimerQueue<SpinAction>,
    frame_clock: FrameClock,
    resolver: WinResolver,
    port: Box<dyn NotificationPort + Send>,
    is_spinning: bool,
    /// Finalize timer fired while a reel was still settling
    finalize_pending: bool,
    spin_count: u64,
    stats: SessionStats,
}

impl SpinOrchestrator {
    /// Validate `config` and build the reel set
    pub fn new(
        config: SlotConfig,
        port: impl NotificationPort + Send + 'static,
    ) -> SlotResult<Self> {
        config.validate()?;

        let mut master = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_os_rng(),
        };

        let reels = (0..config.reels.reel_count)
            .map(|index| {
                let rng = ChaCha8Rng::seed_from_u64(master.random());
                Reel::new(index, &config.reels, &config.motion, rng)
            })
            .collect::<SlotResult<Vec<_>>>()?;
        let resolver = WinResolver::seeded(master.random());

        log::debug!(
            "Orchestrator ready: {} reels x {} symbols, seed {:?}",
            reels.len(),
            config.reels.symbol_count,
            config.seed
        );

        Ok(Self {
            frame_clock: FrameClock::new(config.timing.target_fps),
            config,
            reels,
            timers: TimerQueue::new(),
            resolver,
            port: Box::new(port),
            is_spinning: false,
            finalize_pending: false,
            spin_count: 0,
            stats: SessionStats::default(),
        })
    }

    /// Wrap into a [`SharedOrchestrator`]
    pub fn into_shared(self) -> SharedOrchestrator {
        Arc::new(Mutex::new(self))
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SPIN CONTROL
    // ═══════════════════════════════════════════════════════════════════════════

    /// Request a spin. Returns the spin id, or `None` if one is running or
    /// a reel has not come to rest since [`SpinOrchestrator::shutdown`].
    pub fn spin(&mut self) -> Option<u64> {
        if self.is_spinning {
            log::warn!("Spin {} still running, request ignored", self.spin_count);
            self.stats.rejected_spins += 1;
            return None;
        }
        if !self.all_idle() {
            log::warn!("Reels still coming to rest, spin request ignored");
            self.stats.rejected_spins += 1;
            return None;
        }

        let stale = self.timers.cancel_all();
        if stale > 0 {
            log::debug!("Dropped {} stale timers", stale);
        }

        self.is_spinning = true;
        self.finalize_pending = false;
        self.spin_count += 1;
        let spin_id = self.spin_count;

        self.publish(Stage::SpinStarted, StagePayload::for_spin(spin_id));

        let reel_count = self.reels.len();
        for index in 0..reel_count {
            let delay = self.config.timing.start_offset(index);
            self.timers.schedule(delay, SpinAction::StartReel(index));
        }
        let stop_at = self.config.timing.stop_sequence_offset(reel_count);
        self.timers.schedule(stop_at, SpinAction::BeginStopSequence);

        log::info!(
            "Spin {} started at {:.1}ms (stops from +{:.0}ms)",
            spin_id,
            self.timers.now_ms(),
            stop_at
        );
        Some(spin_id)
    }

    /// Fire every timer due within `elapsed_ms`
    pub fn advance_time(&mut self, elapsed_ms: f64) -> Option<SpinOutcome> {
        if !(elapsed_ms.is_finite() && elapsed_ms >= 0.0) {
            return None;
        }

        let until = self.timers.now_ms() + elapsed_ms;
        let mut outcome = None;
        while let Some(action) = self.timers.pop_due(until) {
            if let Some(done) = self.execute(action) {
                outcome = Some(done);
            }
        }
        self.timers.finish_advance(until);
        outcome
    }

    /// Move every reel by `delta` frames
    pub fn tick(&mut self, delta: f64) -> Option<SpinOutcome> {
        let settled: Vec<usize> = self
            .reels
            .iter_mut()
            .filter_map(|reel| (reel.tick(delta) == ReelEvent::Settled).then_some(reel.index()))
            .collect();

        for index in settled {
            let symbols = self.reels[index]
                .visible_symbols()
                .into_iter()
                .map(|s| s.to_string())
                .collect();
            self.publish(
                Stage::ReelSettled {
                    reel_index: index,
                    symbols,
                },
                StagePayload::for_spin(self.spin_count),
            );
        }

        if self.finalize_pending && self.all_idle() {
            return Some(self.finalize());
        }
        None
    }

    /// One wall-clock step: timers first, then motion
    pub fn update(&mut self, elapsed_ms: f64) -> Option<SpinOutcome> {
        let fired = self.advance_time(elapsed_ms);
        let ticked = self.tick(self.frame_clock.delta(elapsed_ms));
        fired.or(ticked)
    }

    /// Drive `update(frame_ms)` until the running spin finalizes or
    /// `timeout_ms` of queue time has passed
    pub fn run_until_stopped(&mut self, frame_ms: f64, timeout_ms: f64) -> Option<SpinOutcome> {
        if !(frame_ms.is_finite() && frame_ms > 0.0) {
            return None;
        }

        let deadline = self.timers.now_ms() + timeout_ms;
        while self.is_spinning && self.timers.now_ms() < deadline {
            if let Some(outcome) = self.update(frame_ms) {
                return Some(outcome);
            }
        }

        if self.is_spinning {
            log::warn!(
                "Spin {} still running after {:.0}ms",
                self.spin_count,
                timeout_ms
            );
        }
        None
    }

    /// Cancel every pending timer and bring the reels to rest.
    /// Returns how many timers were cancelled.
    pub fn shutdown(&mut self) -> usize {
        let cancelled = self.timers.cancel_all();
        for reel in &mut self.reels {
            reel.stop_spin();
        }
        self.is_spinning = false;
        self.finalize_pending = false;

        if cancelled > 0 {
            log::warn!("Shutdown cancelled {} pending timers", cancelled);
        }
        cancelled
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // ACTIONS
    // ═══════════════════════════════════════════════════════════════════════════

    fn execute(&mut self, action: SpinAction) -> Option<SpinOutcome> {
        log::debug!("[{:>8.1}ms] {:?}", self.timers.now_ms(), action);
        let last = self.reels.len().saturating_sub(1);

        match action {
            SpinAction::StartReel(index) => {
                let started = self.reels.get_mut(index).is_some_and(Reel::start_spin);
                if started {
                    self.publish(
                        Stage::ReelSpinStart { reel_index: index },
                        StagePayload::for_spin(self.spin_count),
                    );
                }
            }
            SpinAction::BeginStopSequence => {
                for index in 0..self.reels.len() {
                    let delay = index as f64 * self.config.timing.stagger_stop_delay_ms;
                    self.timers.schedule(delay, SpinAction::StopReel(index));
                }
            }
            SpinAction::StopReel(index) => {
                let stopped = self.reels.get_mut(index).is_some_and(Reel::stop_spin);
                if stopped {
                    self.publish(
                        Stage::ReelStopRequested { reel_index: index },
                        StagePayload::for_spin(self.spin_count),
                    );
                }
                if index == last {
                    self.timers
                        .schedule(self.config.timing.final_delay_ms, SpinAction::Finalize);
                }
            }
            SpinAction::Finalize => {
                if self.all_idle() {
                    return Some(self.finalize());
                }
                log::debug!("Finalize waiting for reels to settle");
                self.finalize_pending = true;
            }
        }
        None
    }

    fn finalize(&mut self) -> SpinOutcome {
        self.finalize_pending = false;

        let spin_id = self.spin_count;
        let roll = self.resolver.roll(self.config.win.win_chance);
        let symbols = self.visible_symbols();

        if roll.won {
            let names = symbols
                .iter()
                .map(|reel| reel.iter().map(|s| s.to_string()).collect())
                .collect();
            self.publish(
                Stage::WinDetected,
                StagePayload::for_spin(spin_id)
                    .win_roll(roll.sample, roll.chance)
                    .reel_symbols(names),
            );
        }
        self.publish(Stage::SpinStopped, StagePayload::for_spin(spin_id));

        self.is_spinning = false;
        self.stats.record(roll.won);

        let finished_at_ms = self.timers.now_ms();
        log::info!(
            "Spin {} finished at {:.1}ms: {}",
            spin_id,
            finished_at_ms,
            if roll.won { "win" } else { "no win" }
        );

        SpinOutcome {
            spin_id,
            won: roll.won,
            roll,
            symbols,
            finished_at_ms,
        }
    }

    fn publish(&self, stage: Stage, payload: StagePayload) {
        let event = StageEvent::with_payload(stage, self.timers.now_ms(), payload)
            .with_tag(self.config.timing.profile.name());
        self.port.publish(event);
    }

    fn all_idle(&self) -> bool {
        self.reels.iter().all(Reel::is_idle)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // QUERIES
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn reels(&self) -> &[Reel] {
        &self.reels
    }

    pub fn reel(&self, index: usize) -> Option<&Reel> {
        self.reels.get(index)
    }

    pub fn is_spinning(&self) -> bool {
        self.is_spinning
    }

    /// Timers not yet fired
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Pending actions with their absolute deadlines, in firing order
    pub fn scheduled(&self) -> Vec<(f64, SpinAction)> {
        self.timers
            .iter()
            .map(|p| (p.execute_at_ms, p.action))
            .collect()
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn config(&self) -> &SlotConfig {
        &self.config
    }

    /// Queue clock (ms since construction)
    pub fn now_ms(&self) -> f64 {
        self.timers.now_ms()
    }

    /// Id of the current (or last) spin, 0 before the first
    pub fn spin_count(&self) -> u64 {
        self.spin_count
    }

    pub fn frame_clock(&self) -> FrameClock {
        self.frame_clock
    }

    /// Visible symbols per reel, left to right
    pub fn visible_symbols(&self) -> Vec<Vec<SymbolId>> {
        self.reels.iter().map(Reel::visible_symbols).collect()
    }
}

impl std::fmt::Debug for SpinOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpinOrchestrator")
            .field("reels", &self.reels.len())
            .field("is_spinning", &self.is_spinning)
            .field("pending_timers", &self.timers.len())
            .field("spin_count", &self.spin_count)
            .field("now_ms", &self.timers.now_ms())
            .finish()
    }
}

impl Drop for SpinOrchestrator {
    fn drop(&mut self) {
        let cancelled = self.timers.cancel_all();
        if cancelled > 0 {
            log::warn!("Orchestrator dropped with {} pending timers", cancelled);
        }
    }
}
