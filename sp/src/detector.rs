//! Change detection between reports

use tracing::debug;

use crate::grid::{Fingerprint, GridStateView};

/// Why a grid mutation has to be reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeReason {
    /// Fingerprint differs from the last one sent (or nothing was sent yet)
    Fingerprint,
    /// The grid reports itself solved; always reported
    Solved,
    /// Paused/running flipped since the last report
    PauseToggled,
}

impl std::fmt::Display for ChangeReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ChangeReason::Fingerprint => "fingerprint",
            ChangeReason::Solved => "solved",
            ChangeReason::PauseToggled => "pause-toggled",
        };
        f.write_str(name)
    }
}

/// Remembers what was last reported and decides whether a new grid differs
#[derive(Debug, Clone, Default)]
pub struct ChangeDetector {
    last_fingerprint: Option<Fingerprint>,
    last_paused: Option<bool>,
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide whether `grid` must be reported, without recording anything
    pub fn evaluate<G: GridStateView + ?Sized>(&self, grid: &G) -> Option<ChangeReason> {
        let fingerprint = grid.fingerprint();
        if self.last_fingerprint.as_ref() != Some(&fingerprint) {
            return Some(ChangeReason::Fingerprint);
        }
        if grid.is_solved() {
            return Some(ChangeReason::Solved);
        }
        if self.last_paused != Some(grid.is_paused()) {
            return Some(ChangeReason::PauseToggled);
        }
        None
    }

    /// Record `grid` as the last state sent
    pub fn acknowledge<G: GridStateView + ?Sized>(&mut self, grid: &G) {
        self.last_fingerprint = Some(grid.fingerprint());
        self.last_paused = Some(grid.is_paused());
    }

    /// Evaluate and, when a report is due, acknowledge it in one step
    pub fn observe<G: GridStateView + ?Sized>(&mut self, grid: &G) -> Option<ChangeReason> {
        let reason = self.evaluate(grid);
        if let Some(reason) = reason {
            debug!(%reason, fingerprint = %grid.fingerprint(), "ChangeDetector::observe: report due");
            self.acknowledge(grid);
        }
        reason
    }

    pub fn last_fingerprint(&self) -> Option<&Fingerprint> {
        self.last_fingerprint.as_ref()
    }
}
