//! # rf-stage — Spin lifecycle stages
//!
//! Defines the semantic moments a spin passes through, as seen by the
//! collaborators that listen to the reel orchestrator (UI, audio, analytics).
//!
//! ## Flow
//!
//! ```text
//! SpinStarted
//!     ├── ReelSpinStart { 0..N }       (staggered)
//!     ├── ReelStopRequested { 0..N }   (staggered)
//!     ├── ReelSettled { 0..N }         (as each reel snaps to the grid)
//!     ├── WinDetected                  (only when the win gate accepts)
//!     └── SpinStopped
//! ```
//!
//! Stages are wrapped in [`StageEvent`]s carrying a timestamp and payload,
//! and a whole spin can be captured as a [`StageTrace`].

pub mod event;
pub mod stage;
pub mod trace;

pub use event::*;
pub use stage::*;
pub use trace::*;
