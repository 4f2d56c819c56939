//! ProgressTracker - lifecycle, heartbeat and the collaborator-facing API
//!
//! Two producers feed one transport: the collaborator's `on_grid_change`
//! calls and a heartbeat task ticking every `update_interval_ms`. Both go
//! through the same state lock, so the active flag, the change detector and
//! the last observed grid are only ever touched by one trigger at a time.
//!
//! ```text
//!   Active ──destroy()───────────────▶ Inactive
//!     │                                   ▲
//!     └──send_completion_update(grid)─────┘  (one final record first)
//! ```

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::detector::ChangeDetector;
use crate::grid::{GridSnapshot, GridStateView};
use crate::params::TrackerConfig;
use crate::snapshot::{extract, extract_completion};
use crate::transport::{EmbeddingContexts, MessageTransport, NetworkTransport, Transport, TransportMode};

/// Mutable state guarded by the tracker's lock
#[derive(Debug, Default)]
struct TrackerState {
    active: bool,
    detector: ChangeDetector,
    last_grid: Option<GridSnapshot>,
    sent: u64,
}

/// Everything the heartbeat task shares with the tracker handle
struct Shared {
    config: TrackerConfig,
    transport: Transport,
    clock: Arc<dyn Clock>,
    state: Mutex<TrackerState>,
}

impl Shared {
    /// One heartbeat tick; returns `false` once the tracker is inactive
    fn heartbeat_tick(&self) -> bool {
        let mut state = self.state.lock();
        if !state.active {
            return false;
        }

        let Some(grid) = state.last_grid.as_ref() else {
            debug!(session_id = %self.config.session_id, "heartbeat: no grid observed yet");
            return true;
        };

        let record = extract(grid, &self.config.session_id, self.clock.now_ms());
        self.transport.dispatch(record, false);
        state.sent += 1;
        true
    }
}

/// Reports the progress of one puzzle session
///
/// Created Active; becomes Inactive for good after [`destroy`](Self::destroy)
/// or [`send_completion_update`](Self::send_completion_update). Dropping the
/// tracker destroys it.
pub struct ProgressTracker {
    shared: Arc<Shared>,
    heartbeat: Mutex<Option<JoinHandle<()>>>,
}

impl ProgressTracker {
    /// Start tracking; `None` when the config has no session id
    pub fn create(config: TrackerConfig, transport: Transport) -> Option<Self> {
        Self::with_clock(config, transport, Arc::new(SystemClock))
    }

    /// Like [`create`](Self::create) with an explicit clock
    pub fn with_clock(config: TrackerConfig, transport: Transport, clock: Arc<dyn Clock>) -> Option<Self> {
        if config.session_id.is_empty() {
            debug!("ProgressTracker::with_clock: empty session id, not tracking");
            return None;
        }

        info!(
            session_id = %config.session_id,
            mode = %transport.mode(),
            interval_ms = config.update_interval_ms,
            "Progress tracking started"
        );

        let shared = Arc::new(Shared {
            config,
            transport,
            clock,
            state: Mutex::new(TrackerState {
                active: true,
                ..Default::default()
            }),
        });
        let heartbeat = spawn_heartbeat(&shared);

        Some(Self {
            shared,
            heartbeat: Mutex::new(heartbeat),
        })
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.shared.config
    }

    pub fn session_id(&self) -> &str {
        &self.shared.config.session_id
    }

    pub fn is_active(&self) -> bool {
        self.shared.state.lock().active
    }

    /// Number of records handed to the transport so far
    pub fn sent_count(&self) -> u64 {
        self.shared.state.lock().sent
    }

    /// Observe a grid mutation; reports it if it changed meaningfully
    pub fn on_grid_change<G: GridStateView + ?Sized>(&self, grid: &G) {
        let mut state = self.shared.state.lock();
        if !state.active {
            return;
        }

        state.last_grid = Some(GridSnapshot::capture(grid));

        let Some(reason) = state.detector.observe(grid) else {
            return;
        };

        let immediate = grid.is_solved();
        debug!(session_id = %self.session_id(), %reason, immediate, "on_grid_change: sending update");
        let record = extract(grid, self.session_id(), self.shared.clock.now_ms());
        self.shared.transport.dispatch(record, immediate);
        state.sent += 1;
    }

    /// Send the terminal record and stop tracking; no-op when inactive
    pub fn send_completion_update<G: GridStateView + ?Sized>(&self, grid: &G) {
        {
            let mut state = self.shared.state.lock();
            if !state.active {
                debug!(session_id = %self.session_id(), "send_completion_update: already inactive");
                return;
            }

            let record = extract_completion(grid, self.session_id(), self.shared.clock.now_ms());
            info!(
                session_id = %self.session_id(),
                final_result = ?record.game_state.final_result,
                completion_ms = ?record.game_state.completion_time,
                "Sending completion update"
            );
            self.shared.transport.dispatch(record, true);
            state.sent += 1;
            state.active = false;
        }
        self.disarm_heartbeat();
    }

    /// Stop tracking; safe to call any number of times
    pub fn destroy(&self) {
        let was_active = std::mem::replace(&mut self.shared.state.lock().active, false);
        self.disarm_heartbeat();
        if was_active {
            info!(session_id = %self.session_id(), "Progress tracking stopped");
        }
    }

    fn disarm_heartbeat(&self) {
        if let Some(handle) = self.heartbeat.lock().take() {
            debug!(session_id = %self.session_id(), "disarm_heartbeat: aborting heartbeat task");
            handle.abort();
        }
    }
}

impl Drop for ProgressTracker {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl std::fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("config", &self.shared.config)
            .field("mode", &self.shared.transport.mode())
            .field("active", &self.is_active())
            .finish()
    }
}

/// Arm the heartbeat, first tick one full period from now
fn spawn_heartbeat(shared: &Arc<Shared>) -> Option<JoinHandle<()>> {
    if !shared.config.heartbeat_enabled() {
        debug!("spawn_heartbeat: interval is 0, heartbeat disabled");
        return None;
    }

    let handle = match tokio::runtime::Handle::try_current() {
        Ok(handle) => handle,
        Err(e) => {
            warn!(error = %e, "No async runtime available, heartbeat disabled");
            return None;
        }
    };

    let period = Duration::from_millis(shared.config.update_interval_ms);
    let Some(first_tick) = Instant::now().checked_add(period) else {
        warn!(interval_ms = shared.config.update_interval_ms, "Heartbeat interval out of range, heartbeat disabled");
        return None;
    };
    let weak = Arc::downgrade(shared);
    Some(handle.spawn(run_heartbeat(weak, first_tick, period)))
}

async fn run_heartbeat(shared: Weak<Shared>, first_tick: Instant, period: Duration) {
    let mut interval = tokio::time::interval_at(first_tick, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        let Some(shared) = shared.upgrade() else {
            break;
        };
        if !shared.heartbeat_tick() {
            break;
        }
    }
    debug!("run_heartbeat: stopped");
}

/// Build a tracker from launch parameters and the addressable contexts
///
/// `contexts` only matter in message mode; `settings` supplies transport
/// timeouts. Returns `None` when there is no session to track.
pub fn create_progress_tracker(
    config: TrackerConfig,
    contexts: EmbeddingContexts,
    settings: &Config,
) -> Option<ProgressTracker> {
    let transport = match config.transport_mode {
        TransportMode::Network => {
            Transport::Network(NetworkTransport::new(config.notification_target.clone(), &settings.network))
        }
        TransportMode::Message => Transport::Message(MessageTransport::new(contexts)),
    };
    ProgressTracker::create(config, transport)
}
