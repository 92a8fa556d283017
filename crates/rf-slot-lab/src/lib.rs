//! # rf-slot-lab — Reel motion and spin orchestration
//!
//! Drives a row of horizontally scrolling reels through a staggered
//! start / stop / settle cycle and gates each completed spin with a
//! configurable win probability.
//!
//! ## Architecture
//!
//! ```text
//! SpinOrchestrator
//!     │
//!     ├── TimerQueue<SpinAction>   (staggered start/stop, finalize)
//!     ├── Reel × N
//!     │     └── SymbolStrip        (slots, wrap, settle order)
//!     ├── WinResolver              (win/no-win gate)
//!     └── NotificationPort         (SpinStarted … WinDetected … SpinStopped)
//!           │
//!           v
//!     StageEvent → StageTrace
//! ```
//!
//! ## Usage
//!
//! ```no_run
//! use rf_slot_lab::{LogPort, SlotConfig, SpinOrchestrator};
//!
//! let mut slot = SpinOrchestrator::new(SlotConfig::default().with_seed(7), LogPort)?;
//! let frame_ms = slot.frame_clock().frame_ms();
//!
//! slot.spin();
//! if let Some(outcome) = slot.run_until_stopped(frame_ms, 10_000.0) {
//!     println!("spin {} won: {}", outcome.spin_id, outcome.won);
//! }
//! # Ok::<(), rf_slot_lab::SlotError>(())
//! ```

pub mod config;
pub mod error;
pub mod notify;
pub mod orchestrator;
pub mod reel;
pub mod symbols;
pub mod timing;
pub mod win;

pub use config::*;
pub use error::*;
pub use notify::*;
pub use orchestrator::*;
pub use reel::*;
pub use symbols::*;
pub use timing::*;
pub use win::*;
