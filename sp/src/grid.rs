//! Read-only grid view the tracker depends on
//!
//! The puzzle UI owns the grid state. The tracker only reads it through
//! [`GridStateView`], so any representation works as long as it can answer
//! these accessors. [`GridSnapshot`] is the owned implementation: the tracker
//! captures one per observed mutation so the heartbeat can re-send it later.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Opaque mutation version of a grid
///
/// Only ever compared for equality; the tracker never interprets it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Fingerprint {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Fingerprint {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Session timing, all values in epoch milliseconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timing {
    /// When the session started; `None` if it never started
    #[serde(default)]
    pub start_time: Option<i64>,
    /// When the session finished
    #[serde(default)]
    pub end_time: Option<i64>,
    /// When the session was paused, if it is paused now
    #[serde(default)]
    pub paused_at: Option<i64>,
    /// When the current unpaused interval began
    #[serde(default)]
    pub interval_start_time: Option<i64>,
}

/// Borrowed view of one cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellView<'a> {
    /// Position of the cell in the grid
    pub index: usize,
    /// Resolved digit; `None` for an empty cell
    pub digit: Option<u8>,
    /// Inner (center) candidate marks, in any order
    pub inner: &'a [u8],
    /// Outer (corner) candidate marks, in any order
    pub outer: &'a [u8],
}

/// Read accessors the tracker needs from a grid
pub trait GridStateView {
    /// Cells in grid order
    fn cells(&self) -> Box<dyn Iterator<Item = CellView<'_>> + '_>;

    /// The puzzle's given digits
    fn initial_digits(&self) -> &str;

    /// Digits whose every placement is filled in
    fn completed_digits(&self) -> BTreeSet<u8>;

    fn has_errors(&self) -> bool;

    fn mode(&self) -> &str;

    fn difficulty_level(&self) -> Option<&str>;

    fn is_solved(&self) -> bool;

    /// Number of hints handed out so far
    fn hints_used(&self) -> usize;

    fn timing(&self) -> Timing;

    fn fingerprint(&self) -> Fingerprint;

    fn is_paused(&self) -> bool {
        self.timing().paused_at.is_some()
    }
}

/// Owned cell record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    pub index: usize,
    #[serde(default)]
    pub digit: Option<u8>,
    #[serde(default)]
    pub inner_pencils: Vec<u8>,
    #[serde(default)]
    pub outer_pencils: Vec<u8>,
}

impl Cell {
    pub fn new(index: usize, digit: Option<u8>) -> Self {
        Self {
            index,
            digit,
            ..Default::default()
        }
    }

    pub fn with_inner(mut self, marks: &[u8]) -> Self {
        self.inner_pencils = marks.to_vec();
        self
    }

    pub fn with_outer(mut self, marks: &[u8]) -> Self {
        self.outer_pencils = marks.to_vec();
        self
    }
}

/// Owned grid state
///
/// Deserializes from the camelCase JSON the puzzle UI keeps, e.g.
/// `{"cells":[...],"initialDigits":"...","solved":false,"currentSnapshot":"..."}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GridSnapshot {
    pub cells: Vec<Cell>,
    pub initial_digits: String,
    pub completed_digits: BTreeSet<u8>,
    pub has_errors: bool,
    pub mode: String,
    pub difficulty_level: Option<String>,
    pub solved: bool,
    pub hints_used: usize,
    #[serde(flatten)]
    pub timing: Timing,
    pub current_snapshot: Fingerprint,
}

impl GridSnapshot {
    /// Copy everything the tracker reads out of any grid view
    pub fn capture<G: GridStateView + ?Sized>(grid: &G) -> Self {
        Self {
            cells: grid
                .cells()
                .map(|cell| Cell {
                    index: cell.index,
                    digit: cell.digit,
                    inner_pencils: cell.inner.to_vec(),
                    outer_pencils: cell.outer.to_vec(),
                })
                .collect(),
            initial_digits: grid.initial_digits().to_string(),
            completed_digits: grid.completed_digits(),
            has_errors: grid.has_errors(),
            mode: grid.mode().to_string(),
            difficulty_level: grid.difficulty_level().map(str::to_string),
            solved: grid.is_solved(),
            hints_used: grid.hints_used(),
            timing: grid.timing(),
            current_snapshot: grid.fingerprint(),
        }
    }
}

impl GridStateView for GridSnapshot {
    fn cells(&self) -> Box<dyn Iterator<Item = CellView<'_>> + '_> {
        Box::new(self.cells.iter().map(|cell| CellView {
            index: cell.index,
            digit: cell.digit,
            inner: &cell.inner_pencils,
            outer: &cell.outer_pencils,
        }))
    }

    fn initial_digits(&self) -> &str {
        &self.initial_digits
    }

    fn completed_digits(&self) -> BTreeSet<u8> {
        self.completed_digits.clone()
    }

    fn has_errors(&self) -> bool {
        self.has_errors
    }

    fn mode(&self) -> &str {
        &self.mode
    }

    fn difficulty_level(&self) -> Option<&str> {
        self.difficulty_level.as_deref()
    }

    fn is_solved(&self) -> bool {
        self.solved
    }

    fn hints_used(&self) -> usize {
        self.hints_used
    }

    fn timing(&self) -> Timing {
        self.timing
    }

    fn fingerprint(&self) -> Fingerprint {
        self.current_snapshot.clone()
    }
}
