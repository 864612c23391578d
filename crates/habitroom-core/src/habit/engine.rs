//! Toggle orchestrator.
//!
//! Loads a habit, runs the streak transition, writes the new state back and
//! reconciles the completion ledger, all inside one unit of work. The clock
//! is always supplied by the caller.

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use serde::{Deserialize, Serialize};

use super::ledger;
use super::period::period_start;
use super::store::{HabitStore, LedgerStore, UnitOfWork};
use super::streak::{live_streak, streak_status, transition, StreakStatus, ToggleDirection};
use super::{CompletionLogEntry, Habit, HabitStateUpdate};
use crate::error::{CoreError, Result};
use crate::storage::EngineConfig;

/// Read-only view of where a habit's streak stands at some instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitStatus {
    pub habit: Habit,
    pub status: StreakStatus,
    /// Stored streak, or 0 when the streak is broken
    pub live_streak: u32,
    /// First day of the period `now` falls in
    pub period_start: NaiveDate,
}

/// Streak engine over a store providing habits, a ledger and transactions.
pub struct StreakEngine<S> {
    store: S,
    offset: FixedOffset,
}

impl<S> StreakEngine<S>
where
    S: HabitStore + LedgerStore + UnitOfWork,
{
    /// Engine evaluating calendar periods in UTC.
    pub fn new(store: S) -> Self {
        Self {
            store,
            offset: Utc.fix(),
        }
    }

    /// Engine evaluating calendar periods in the configured offset.
    ///
    /// # Errors
    /// Returns an error if the configured offset is out of range.
    pub fn with_config(store: S, config: &EngineConfig) -> Result<Self> {
        Ok(Self {
            store,
            offset: config.utc_offset()?,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Flip a habit's completion for the period containing `now`.
    ///
    /// Completing extends or restarts the streak and appends a ledger entry;
    /// un-completing decrements the streak and removes today's ledger entries.
    ///
    /// # Errors
    /// [`CoreError::NotFound`] if the habit does not exist; storage failures
    /// otherwise. Nothing is written when an error is returned.
    pub fn toggle(&self, habit_id: &str, now: DateTime<Utc>) -> Result<Habit> {
        let now = now.with_timezone(&self.offset);
        self.store.atomically(|store| {
            let habit = Self::load(store, habit_id)?;
            Self::flip(store, habit, &now)
        })
    }

    /// Put a habit into the requested completion state.
    ///
    /// A no-op when the habit is already there; otherwise identical to
    /// [`toggle`](Self::toggle).
    pub fn set_completed(&self, habit_id: &str, completed: bool, now: DateTime<Utc>) -> Result<Habit> {
        let now = now.with_timezone(&self.offset);
        self.store.atomically(|store| {
            let habit = Self::load(store, habit_id)?;
            if habit.is_completed == completed {
                tracing::debug!(habit_id, completed, "habit already in requested state");
                return Ok(habit);
            }
            Self::flip(store, habit, &now)
        })
    }

    /// Ledger entries of a habit, oldest first.
    pub fn history(&self, habit_id: &str) -> Result<Vec<CompletionLogEntry>> {
        Self::load(&self.store, habit_id)?;
        self.store.entries_for(habit_id)
    }

    /// Streak status of a habit at `now`, without writing anything.
    pub fn status(&self, habit_id: &str, now: DateTime<Utc>) -> Result<HabitStatus> {
        let habit = Self::load(&self.store, habit_id)?;
        Ok(self.status_of(habit, now))
    }

    /// Status of every stored habit at `now`.
    pub fn statuses(&self, now: DateTime<Utc>) -> Result<Vec<HabitStatus>> {
        Ok(self
            .store
            .list_habits()?
            .into_iter()
            .map(|habit| self.status_of(habit, now))
            .collect())
    }

    fn status_of(&self, habit: Habit, now: DateTime<Utc>) -> HabitStatus {
        let now = now.with_timezone(&self.offset);
        HabitStatus {
            status: streak_status(habit.frequency, habit.last_completed_at, &now),
            live_streak: live_streak(&habit, &now),
            period_start: period_start(habit.frequency, now.date_naive()),
            habit,
        }
    }

    fn load(store: &S, habit_id: &str) -> Result<Habit> {
        store
            .get_habit(habit_id)?
            .ok_or_else(|| CoreError::not_found(habit_id))
    }

    fn flip(store: &S, habit: Habit, now: &DateTime<FixedOffset>) -> Result<Habit> {
        let direction = ToggleDirection::flipping(habit.is_completed);
        let next = transition(habit.frequency, &habit.streak_state(), direction, now);
        let update = HabitStateUpdate {
            is_completed: !habit.is_completed,
            current_streak: next.current_streak,
            last_completed_at: next.last_completed_at,
        };

        store.update_habit_state(&habit.id, &update)?;
        match direction {
            ToggleDirection::Complete => {
                ledger::append(store, &habit.id, now)?;
            }
            ToggleDirection::Uncomplete => {
                ledger::remove_for_today(store, &habit.id, now)?;
            }
        }

        tracing::info!(
            habit_id = %habit.id,
            ?direction,
            streak_before = habit.current_streak,
            streak_after = update.current_streak,
            "habit toggled"
        );
        Ok(habit.with_update(&update))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::habit::{Frequency, MemoryStore};
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 9, 30, 0).unwrap()
    }

    fn engine_with(habit: &Habit) -> StreakEngine<MemoryStore> {
        let store = MemoryStore::new();
        store.insert_habit(habit).unwrap();
        StreakEngine::new(store)
    }

    #[test]
    fn toggle_flips_completion() {
        let habit = Habit::new("Floss", Frequency::Daily);
        let engine = engine_with(&habit);

        let done = engine.toggle(&habit.id, at(2024, 1, 10)).unwrap();
        assert!(done.is_completed);
        assert_eq!(done.current_streak, 1);
        assert_eq!(done.last_completed_at, Some(at(2024, 1, 10)));
        assert_eq!(engine.history(&habit.id).unwrap().len(), 1);

        let undone = engine.toggle(&habit.id, at(2024, 1, 10)).unwrap();
        assert!(!undone.is_completed);
        assert_eq!(undone.current_streak, 0);
        assert_eq!(undone.last_completed_at, Some(at(2024, 1, 10)));
        assert!(engine.history(&habit.id).unwrap().is_empty());
    }

    #[test]
    fn toggle_missing_habit_is_not_found() {
        let engine = StreakEngine::new(MemoryStore::new());
        let err = engine.toggle("nope", at(2024, 1, 10)).unwrap_err();
        assert!(matches!(err, CoreError::NotFound { habit_id } if habit_id == "nope"));
    }

    #[test]
    fn set_completed_is_idempotent() {
        let habit = Habit::new("Meditate", Frequency::Daily);
        let engine = engine_with(&habit);

        let first = engine.set_completed(&habit.id, true, at(2024, 1, 10)).unwrap();
        let second = engine.set_completed(&habit.id, true, at(2024, 1, 10)).unwrap();
        assert_eq!(first, second);
        assert_eq!(second.current_streak, 1);
        assert_eq!(engine.history(&habit.id).unwrap().len(), 1);

        let cleared = engine.set_completed(&habit.id, false, at(2024, 1, 10)).unwrap();
        assert!(!cleared.is_completed);
        assert_eq!(cleared.current_streak, 0);
    }

    #[test]
    fn set_not_completed_on_open_habit_writes_nothing() {
        let mut habit = Habit::new("Journal", Frequency::Daily);
        habit.current_streak = 3;
        habit.last_completed_at = Some(at(2024, 1, 9));
        let engine = engine_with(&habit);

        let same = engine.set_completed(&habit.id, false, at(2024, 1, 10)).unwrap();
        assert_eq!(same, habit);
        assert_eq!(engine.store().get_habit(&habit.id).unwrap(), Some(habit.clone()));
        assert!(engine.history(&habit.id).unwrap().is_empty());
    }

    #[test]
    fn status_reports_live_streak() {
        let mut habit = Habit::new("Call mom", Frequency::Weekly);
        habit.current_streak = 5;
        habit.last_completed_at = Some(at(2024, 1, 1));
        let engine = engine_with(&habit);

        let status = engine.status(&habit.id, at(2024, 1, 10)).unwrap();
        assert_eq!(status.status, StreakStatus::AtRisk);
        assert_eq!(status.live_streak, 5);
        assert_eq!(status.period_start, NaiveDate::from_ymd_opt(2024, 1, 8).unwrap());

        let status = engine.status(&habit.id, at(2024, 1, 20)).unwrap();
        assert_eq!(status.status, StreakStatus::Broken);
        assert_eq!(status.live_streak, 0);
        // status never writes
        assert_eq!(engine.store().get_habit(&habit.id).unwrap().unwrap().current_streak, 5);
    }

    #[test]
    fn configured_offset_shifts_periods() {
        let mut habit = Habit::new("Water plants", Frequency::Daily);
        habit.current_streak = 1;
        habit.last_completed_at = Some(Utc.with_ymd_and_hms(2024, 1, 10, 10, 0, 0).unwrap());
        let store = MemoryStore::new();
        store.insert_habit(&habit).unwrap();

        let engine = StreakEngine::with_config(
            store,
            &EngineConfig {
                utc_offset_minutes: 9 * 60,
            },
        )
        .unwrap();
        // 20:00Z is the next calendar day at UTC+9
        let done = engine
            .toggle(&habit.id, Utc.with_ymd_and_hms(2024, 1, 10, 20, 0, 0).unwrap())
            .unwrap();
        assert_eq!(done.current_streak, 2);
    }

    #[test]
    fn invalid_offset_is_rejected() {
        let result = StreakEngine::with_config(
            MemoryStore::new(),
            &EngineConfig {
                utc_offset_minutes: 24 * 60,
            },
        );
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }
}
