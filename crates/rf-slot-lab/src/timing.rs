//! Timing profiles, frame clock and the delayed-action queue

use serde::{Deserialize, Serialize};

use crate::config::positive;
use crate::error::{SlotError, SlotResult};

/// Timing profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingProfile {
    /// Normal gameplay timing
    #[default]
    Normal,
    /// Fast/Turbo mode
    Turbo,
    /// Studio mode (wide gaps for audio sync checks)
    Studio,
    /// Custom values or scaled profile
    Custom,
}

impl TimingProfile {
    /// Lowercase name, as used in config files and event tags
    pub fn name(&self) -> &'static str {
        match self {
            TimingProfile::Normal => "normal",
            TimingProfile::Turbo => "turbo",
            TimingProfile::Studio => "studio",
            TimingProfile::Custom => "custom",
        }
    }
}

/// Stagger and settle-allowance delays for a spin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Profile type
    pub profile: TimingProfile,

    /// Delay between successive reel starts (ms)
    pub stagger_start_delay_ms: f64,

    /// Delay between successive reel stop commands (ms)
    pub stagger_stop_delay_ms: f64,

    /// Spin time before the stop sequence, and settle allowance after the last stop (ms)
    pub final_delay_ms: f64,

    /// Frame rate at which one tick has `delta == 1.0`
    pub target_fps: f64,
}

impl TimingConfig {
    /// Normal gameplay timing
    pub fn normal() -> Self {
        Self {
            profile: TimingProfile::Normal,
            stagger_start_delay_ms: 200.0,
            stagger_stop_delay_ms: 400.0,
            final_delay_ms: 500.0,
            target_fps: 60.0,
        }
    }

    /// Turbo mode
    pub fn turbo() -> Self {
        Self {
            profile: TimingProfile::Turbo,
            stagger_start_delay_ms: 80.0,
            stagger_stop_delay_ms: 150.0,
            final_delay_ms: 300.0,
            target_fps: 60.0,
        }
    }

    /// Studio mode (optimized for audio testing - clearly separated reel stops)
    pub fn studio() -> Self {
        Self {
            profile: TimingProfile::Studio,
            stagger_start_delay_ms: 250.0,
            stagger_stop_delay_ms: 600.0,
            final_delay_ms: 800.0,
            target_fps: 60.0,
        }
    }

    /// Get config for profile
    pub fn from_profile(profile: TimingProfile) -> Self {
        match profile {
            TimingProfile::Normal => Self::normal(),
            TimingProfile::Turbo => Self::turbo(),
            TimingProfile::Studio => Self::studio(),
            TimingProfile::Custom => Self::normal(),
        }
    }

    /// Scale every delay by factor (< 1.0 = faster)
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            profile: TimingProfile::Custom,
            stagger_start_delay_ms: self.stagger_start_delay_ms * factor,
            stagger_stop_delay_ms: self.stagger_stop_delay_ms * factor,
            final_delay_ms: self.final_delay_ms * factor,
            target_fps: self.target_fps,
        }
    }

    /// When reel `index` is told to start, relative to the spin request
    pub fn start_offset(&self, index: usize) -> f64 {
        index as f64 * self.stagger_start_delay_ms
    }

    /// When the stop sequence begins, relative to the spin request
    pub fn stop_sequence_offset(&self, reel_count: usize) -> f64 {
        self.final_delay_ms + reel_count.saturating_sub(1) as f64 * self.stagger_start_delay_ms
    }

    /// Earliest finalize time, relative to the spin request
    pub fn finalize_offset(&self, reel_count: usize) -> f64 {
        self.stop_sequence_offset(reel_count)
            + reel_count.saturating_sub(1) as f64 * self.stagger_stop_delay_ms
            + self.final_delay_ms
    }

    pub fn validate(&self) -> SlotResult<()> {
        for (name, value) in [
            ("stagger_start_delay_ms", self.stagger_start_delay_ms),
            ("stagger_stop_delay_ms", self.stagger_stop_delay_ms),
            ("final_delay_ms", self.final_delay_ms),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(SlotError::invalid(format!(
                    "{} must be a non-negative finite number, got {}",
                    name, value
                )));
            }
        }
        positive("target_fps", self.target_fps)
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self::normal()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// FRAME CLOCK
// ═══════════════════════════════════════════════════════════════════════════════

/// Converts wall-clock milliseconds into frame-fraction deltas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameClock {
    frame_ms: f64,
}

impl FrameClock {
    pub fn new(target_fps: f64) -> Self {
        Self {
            frame_ms: 1000.0 / target_fps,
        }
    }

    /// Duration of one nominal frame
    pub fn frame_ms(&self) -> f64 {
        self.frame_ms
    }

    /// Frame delta for `elapsed_ms` (1.0 == one nominal frame)
    pub fn delta(&self, elapsed_ms: f64) -> f64 {
        elapsed_ms / self.frame_ms
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TIMER QUEUE
// ═══════════════════════════════════════════════════════════════════════════════

/// Handle for a scheduled action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// Action scheduled for future execution
#[derive(Debug, Clone)]
pub struct PendingAction<A> {
    pub id: TimerId,
    /// Absolute queue time at which to execute (ms)
    pub execute_at_ms: f64,
    pub action: A,
}

/// Cancellable delayed actions, fired in deadline order
///
/// The queue owns its clock. Time only moves through [`TimerQueue::pop_due`]
/// and [`TimerQueue::finish_advance`], so actions scheduled while handling a
/// fired action are placed relative to that action's deadline.
#[derive(Debug, Clone)]
pub struct TimerQueue<A> {
    /// Sorted by deadline; equal deadlines keep scheduling order
    pending: Vec<PendingAction<A>>,
    now_ms: f64,
    next_id: u64,
}

impl<A> TimerQueue<A> {
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
            now_ms: 0.0,
            next_id: 0,
        }
    }

    /// Current queue time
    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    /// Schedule `action` to run `delay_ms` from now
    pub fn schedule(&mut self, delay_ms: f64, action: A) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;

        let execute_at_ms = self.now_ms + delay_ms.max(0.0);

        let at = self
            .pending
            .partition_point(|p| p.execute_at_ms <= execute_at_ms);
        self.pending.insert(
            at,
            PendingAction {
                id,
                execute_at_ms,
                action,
            },
        );
        id
    }

    /// Cancel one action. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.pending.iter().position(|p| p.id == id) {
            Some(index) => {
                self.pending.remove(index);
                true
            }
            None => false,
        }
    }

    /// Cancel everything. Returns how many actions were dropped.
    pub fn cancel_all(&mut self) -> usize {
        let count = self.pending.len();
        self.pending.clear();
        count
    }

    /// Pop the earliest action due at or before `until_ms`, moving the clock
    /// to its deadline
    pub fn pop_due(&mut self, until_ms: f64) -> Option<A> {
        let due = self
            .pending
            .first()
            .is_some_and(|p| p.execute_at_ms <= until_ms);
        if !due {
            return None;
        }

        let pending = self.pending.remove(0);
        self.now_ms = self.now_ms.max(pending.execute_at_ms);
        Some(pending.action)
    }

    /// Move the clock to `until_ms` once every due action has been popped
    pub fn finish_advance(&mut self, until_ms: f64) {
        self.now_ms = self.now_ms.max(until_ms);
    }

    /// Deadline of the next action
    pub fn next_deadline(&self) -> Option<f64> {
        self.pending.first().map(|p| p.execute_at_ms)
    }

    /// Pending actions in firing order
    pub fn iter(&self) -> impl Iterator<Item = &PendingAction<A>> {
        self.pending.iter()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<A> Default for TimerQueue<A> {
    fn default() -> Self {
        Self::new()
    }
}
