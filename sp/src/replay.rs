//! Replay a recorded session against a tracker
//!
//! The `sp replay` command reads one event per line:
//!
//! ```text
//! {"event":"change","grid":{...}}
//! {"event":"complete","grid":{...}}
//! {"event":"destroy"}
//! ```
//!
//! `grid` is a [`GridSnapshot`] in its camelCase JSON form. Blank lines are
//! skipped; a malformed line is logged and skipped rather than ending the run.

use std::time::Duration;

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

use crate::grid::GridSnapshot;
use crate::tracker::ProgressTracker;

/// One line of a replay stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum ReplayEvent {
    /// The grid mutated
    Change { grid: GridSnapshot },
    /// The puzzle ended; sends the terminal record
    Complete { grid: GridSnapshot },
    /// The session was torn down
    Destroy,
}

impl ReplayEvent {
    /// Parse one line; `Ok(None)` for a blank line
    pub fn parse(line: &str) -> Result<Option<Self>, serde_json::Error> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        serde_json::from_str(line).map(Some)
    }

    /// Feed the event to `tracker`
    pub fn apply(&self, tracker: &ProgressTracker) {
        match self {
            ReplayEvent::Change { grid } => tracker.on_grid_change(grid),
            ReplayEvent::Complete { grid } => tracker.send_completion_update(grid),
            ReplayEvent::Destroy => tracker.destroy(),
        }
    }
}

/// Counters reported at the end of a replay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub applied: usize,
    pub skipped: usize,
}

/// Apply every event from `reader` in order, pausing `delay` after each one
///
/// Stops early once the tracker goes inactive; later events could not be
/// reported anyway.
pub async fn replay<R>(tracker: &ProgressTracker, reader: R, delay: Duration) -> Result<ReplaySummary>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut summary = ReplaySummary::default();
    let mut line_no = 0usize;

    while let Some(line) = lines.next_line().await.context("Failed to read replay input")? {
        line_no += 1;
        let event = match ReplayEvent::parse(&line) {
            Ok(Some(event)) => event,
            Ok(None) => continue,
            Err(e) => {
                warn!(line = line_no, error = %e, "Skipping malformed replay event");
                summary.skipped += 1;
                continue;
            }
        };

        debug!(line = line_no, ?event, "replay: applying event");
        event.apply(tracker);
        summary.applied += 1;

        if !tracker.is_active() {
            debug!(line = line_no, "replay: tracker inactive, stopping");
            break;
        }
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    Ok(summary)
}
