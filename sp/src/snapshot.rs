//! Projection of a grid view into a progress record

use std::collections::BTreeMap;

use tracing::debug;

use crate::grid::{GridStateView, Timing};
use crate::record::{FinalResult, GameState, PencilMarks, ProgressRecord};

/// Placeholder for an empty cell in `currentDigits`
pub const EMPTY_CELL: char = '0';

/// Solving time in milliseconds
///
/// Priority: not started, then finished (frozen final duration), then paused
/// (frozen at the pause instant, current interval only), then running.
/// A missing interval start falls back to the start time.
pub fn elapsed_ms(timing: &Timing, now_ms: i64) -> u64 {
    let Some(start) = timing.start_time else {
        return 0;
    };

    let interval_start = timing.interval_start_time.unwrap_or(start);
    let elapsed = if let Some(end) = timing.end_time {
        end.saturating_sub(start)
    } else if let Some(paused_at) = timing.paused_at {
        paused_at.saturating_sub(interval_start)
    } else {
        now_ms.saturating_sub(interval_start)
    };

    u64::try_from(elapsed).unwrap_or(0)
}

/// Build the progress record for `grid` as seen at `now_ms`
pub fn extract<G: GridStateView + ?Sized>(grid: &G, session_id: &str, now_ms: i64) -> ProgressRecord {
    let mut current_digits = String::new();
    let mut pencil_marks = PencilMarks::default();

    for cell in grid.cells() {
        current_digits.push(render_digit(cell.digit));
        insert_marks(&mut pencil_marks.inner, cell.index, cell.inner);
        insert_marks(&mut pencil_marks.outer, cell.index, cell.outer);
    }

    let timing = grid.timing();
    let record = ProgressRecord {
        session_id: session_id.to_string(),
        timestamp: now_ms,
        game_state: GameState {
            current_digits,
            initial_digits: grid.initial_digits().to_string(),
            elapsed_time: elapsed_ms(&timing, now_ms),
            is_paused: timing.paused_at.is_some(),
            is_complete: grid.is_solved(),
            hints_used: grid.hints_used(),
            pencil_marks,
            completed_digits: grid.completed_digits().into_iter().collect(),
            has_errors: grid.has_errors(),
            mode: grid.mode().to_string(),
            difficulty_level: grid.difficulty_level().map(str::to_string),
            completion_time: None,
            final_result: None,
        },
    };

    debug!(
        %session_id,
        elapsed_ms = record.game_state.elapsed_time,
        is_complete = record.game_state.is_complete,
        "extract: built progress record"
    );
    record
}

/// Terminal record: [`extract`] plus `completionTime` and `finalResult`
pub fn extract_completion<G: GridStateView + ?Sized>(grid: &G, session_id: &str, now_ms: i64) -> ProgressRecord {
    let mut record = extract(grid, session_id, now_ms);
    record.game_state.completion_time = Some(record.game_state.elapsed_time);
    record.game_state.final_result = Some(FinalResult::from_solved(grid.is_solved()));
    record
}

fn render_digit(digit: Option<u8>) -> char {
    digit
        .filter(|d| *d != 0)
        .and_then(|d| char::from_digit(u32::from(d), 10))
        .unwrap_or(EMPTY_CELL)
}

fn insert_marks(target: &mut BTreeMap<usize, Vec<u8>>, index: usize, marks: &[u8]) {
    if marks.is_empty() {
        return;
    }
    let mut sorted = marks.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    target.insert(index, sorted);
}
