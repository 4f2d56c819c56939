//! sudoku-progress - progress notifications for live puzzle sessions
//!
//! Observes a frequently-mutated puzzle-solving session and reports its state
//! to an external observer: a remote HTTP endpoint, or the contexts that embed
//! the session (parent, opener). Reports are change-driven with a periodic
//! heartbeat, and a final report is guaranteed when the puzzle completes.
//!
//! # Architecture
//!
//! ```text
//!   collaborator (puzzle UI)            heartbeat task
//!   on_grid_change / completion         (every interval)
//!            │                                │
//!            ▼                                ▼
//!   ┌──────────────────────────────────────────────────┐
//!   │ ProgressTracker  (state lock: active flag,       │
//!   │                   ChangeDetector, last grid)     │
//!   └──────────────────────────────────────────────────┘
//!            │ snapshot::extract
//!            ▼
//!   ┌──────────────────┐     ┌─────────────────────────┐
//!   │ Transport        │────▶│ Network: POST JSON      │
//!   │ (chosen once)    │     │ Message: parent, opener │
//!   └──────────────────┘     └─────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`params`] - launch parameter parsing into a [`TrackerConfig`]
//! - [`grid`] - the read-only grid view the tracker depends on
//! - [`snapshot`] - projection of a grid view into a [`ProgressRecord`]
//! - [`detector`] - change detection between reports
//! - [`transport`] - network and message delivery
//! - [`tracker`] - lifecycle, heartbeat and the collaborator-facing API
//! - [`replay`] - JSON-lines event stream driving a tracker (used by `sp`)
//! - [`config`] - configuration file loading
//! - [`cli`] - command-line interface
//!
//! # Example
//!
//! ```ignore
//! use sudoku_progress::{Config, EmbeddingContexts, TrackerConfig, create_progress_tracker};
//!
//! let tracker = TrackerConfig::from_query("session=abc&notify=https://bot.example/progress")
//!     .and_then(|params| create_progress_tracker(params, EmbeddingContexts::default(), &Config::default()));
//! if let Some(tracker) = tracker {
//!     tracker.on_grid_change(&grid);
//!     tracker.send_completion_update(&grid);
//! }
//! ```

pub mod cli;
pub mod clock;
pub mod config;
pub mod detector;
pub mod error;
pub mod grid;
pub mod params;
pub mod record;
pub mod replay;
pub mod snapshot;
pub mod tracker;
pub mod transport;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use detector::{ChangeDetector, ChangeReason};
pub use error::TransportError;
pub use grid::{Cell, CellView, Fingerprint, GridSnapshot, GridStateView, Timing};
pub use params::{DEFAULT_UPDATE_INTERVAL_MS, TrackerConfig};
pub use record::{FinalResult, GameState, MESSAGE_TYPE, MessageEnvelope, NetworkPayload, PencilMarks, ProgressRecord};
pub use replay::{ReplayEvent, ReplaySummary};
pub use snapshot::{EMPTY_CELL, elapsed_ms, extract, extract_completion};
pub use tracker::{ProgressTracker, create_progress_tracker};
pub use transport::{
    ChannelContext, EmbeddingContext, EmbeddingContexts, MessageTransport, NetworkTransport, Transport, TransportMode,
    WriterContext,
};

#[cfg(unix)]
pub use transport::SocketContext;
