//! Streak transition function.
//!
//! Pure state machine mapping a habit's streak state plus a toggle direction
//! to its next streak state. The calendar used for period comparisons is the
//! time zone carried by `now`; no clock is read here.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::period::{is_prior_period, same_period};
use super::{Frequency, Habit};

/// Which way a toggle flips a habit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleDirection {
    Complete,
    Uncomplete,
}

impl ToggleDirection {
    /// Direction of a toggle applied to a habit whose completion flag is `is_completed`.
    pub fn flipping(is_completed: bool) -> Self {
        if is_completed {
            ToggleDirection::Uncomplete
        } else {
            ToggleDirection::Complete
        }
    }
}

/// Streak fields of a habit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StreakState {
    pub current_streak: u32,
    pub last_completed_at: Option<DateTime<Utc>>,
}

/// Compute the next streak state.
///
/// Completing sets `last_completed_at` to `now` and:
/// - starts at 1 when there was no prior completion,
/// - adds 1 when the prior completion is in the same period (restoring an
///   un-completion made earlier in that period) or in the previous period,
/// - restarts at 1 after a gap of two or more periods.
///
/// Un-completing subtracts 1 (never below 0) and leaves `last_completed_at`
/// untouched, so a re-completion in the same period takes the "same period"
/// branch and restores the count.
///
/// Completing twice without an un-completion in between inflates the streak;
/// callers other than [`StreakEngine`](super::StreakEngine) must keep to the
/// alternating pattern.
pub fn transition<Tz: TimeZone>(
    frequency: Frequency,
    state: &StreakState,
    direction: ToggleDirection,
    now: &DateTime<Tz>,
) -> StreakState {
    match direction {
        ToggleDirection::Complete => {
            let current_streak = match state.last_completed_at {
                None => 1,
                Some(last) => {
                    let last = last.with_timezone(&now.timezone());
                    if same_period(frequency, &last, now) || is_prior_period(frequency, &last, now) {
                        state.current_streak.saturating_add(1)
                    } else {
                        1
                    }
                }
            };
            tracing::debug!(
                frequency = %frequency,
                before = state.current_streak,
                after = current_streak,
                "streak completed"
            );
            StreakState {
                current_streak,
                last_completed_at: Some(now.with_timezone(&Utc)),
            }
        }
        ToggleDirection::Uncomplete => StreakState {
            current_streak: state.current_streak.saturating_sub(1),
            last_completed_at: state.last_completed_at,
        },
    }
}

/// Fold a sequence of toggles through [`transition`], returning every
/// intermediate state (not including `initial`).
///
/// The events are trusted as given; no flip-only check is applied.
pub fn simulate<Tz, I>(frequency: Frequency, initial: StreakState, events: I) -> Vec<StreakState>
where
    Tz: TimeZone,
    I: IntoIterator<Item = (ToggleDirection, DateTime<Tz>)>,
{
    let mut state = initial;
    events
        .into_iter()
        .map(|(direction, at)| {
            state = transition(frequency, &state, direction, &at);
            state
        })
        .collect()
}

/// Where a stored streak stands relative to `now`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakStatus {
    /// Never completed
    None,
    /// Last completion is in the current period
    Active,
    /// Last completion is in the previous period; completing now extends it
    AtRisk,
    /// Gap of two or more periods; the next completion restarts at 1
    Broken,
}

pub fn streak_status<Tz: TimeZone>(
    frequency: Frequency,
    last_completed_at: Option<DateTime<Utc>>,
    now: &DateTime<Tz>,
) -> StreakStatus {
    let Some(last) = last_completed_at else {
        return StreakStatus::None;
    };
    let last = last.with_timezone(&now.timezone());
    if same_period(frequency, &last, now) {
        StreakStatus::Active
    } else if is_prior_period(frequency, &last, now) {
        StreakStatus::AtRisk
    } else {
        StreakStatus::Broken
    }
}

/// Streak as it should be displayed at `now`: a broken streak reads as 0.
pub fn live_streak<Tz: TimeZone>(habit: &Habit, now: &DateTime<Tz>) -> u32 {
    match streak_status(habit.frequency, habit.last_completed_at, now) {
        StreakStatus::Broken => 0,
        _ => habit.current_streak,
    }
}
