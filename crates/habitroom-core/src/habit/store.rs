//! Storage seams consumed by the streak engine.
//!
//! The engine needs a habit store, a ledger store, and a way to run both
//! writes as one all-or-nothing unit. [`HabitDb`](crate::storage::HabitDb)
//! implements these over SQLite; [`MemoryStore`] keeps everything in process.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use std::thread::{self, ThreadId};

use chrono::{DateTime, Utc};

use super::{CompletionLogEntry, Habit, HabitStateUpdate};
use crate::error::{CoreError, DatabaseError, Result};

pub trait HabitStore {
    /// Insert a habit in whatever state it carries.
    fn insert_habit(&self, habit: &Habit) -> Result<()>;

    fn get_habit(&self, habit_id: &str) -> Result<Option<Habit>>;

    fn list_habits(&self) -> Result<Vec<Habit>>;

    /// Overwrite the streak fields of a habit.
    ///
    /// # Errors
    /// Returns [`CoreError::NotFound`] if no habit has this id.
    fn update_habit_state(&self, habit_id: &str, update: &HabitStateUpdate) -> Result<()>;
}

pub trait LedgerStore {
    fn insert_entry(&self, entry: &CompletionLogEntry) -> Result<()>;

    /// Delete entries of `habit_id` logged in `[start, end)`. Returns how many went.
    fn delete_entries_between(
        &self,
        habit_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<usize>;

    /// All entries of a habit, oldest first.
    fn entries_for(&self, habit_id: &str) -> Result<Vec<CompletionLogEntry>>;
}

/// All-or-nothing execution of a group of store operations.
pub trait UnitOfWork {
    /// Run `f` so that either all of its writes land or none do.
    ///
    /// Concurrent units of work on the same store are serialized. Calls must
    /// not be nested.
    fn atomically<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Self) -> Result<T>;
}

/// Reverse of one write made inside a unit of work.
#[derive(Debug)]
enum Undo {
    Habit { id: String, previous: Option<Habit> },
    InsertedEntry { id: String },
    DeletedEntries(Vec<CompletionLogEntry>),
}

#[derive(Debug, Default)]
struct MemoryState {
    habits: BTreeMap<String, Habit>,
    entries: Vec<CompletionLogEntry>,
    /// Thread running the open unit of work, with the undo log of its writes
    journal: Option<(ThreadId, Vec<Undo>)>,
}

impl MemoryState {
    fn record(&mut self, undo: Undo) {
        if let Some((owner, log)) = &mut self.journal {
            if *owner == thread::current().id() {
                log.push(undo);
            }
        }
    }

    fn rewind(&mut self, log: Vec<Undo>) {
        for undo in log.into_iter().rev() {
            match undo {
                Undo::Habit { id, previous: Some(habit) } => {
                    self.habits.insert(id, habit);
                }
                Undo::Habit { id, previous: None } => {
                    self.habits.remove(&id);
                }
                Undo::InsertedEntry { id } => self.entries.retain(|e| e.id != id),
                Undo::DeletedEntries(entries) => self.entries.extend(entries),
            }
        }
    }
}

/// Process-local store. A unit of work journals its own writes and replays
/// the journal backwards when the closure fails; writes from other threads
/// are left alone.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    unit: Mutex<()>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| DatabaseError::Unavailable("memory store poisoned".into()).into())
    }
}

impl HabitStore for MemoryStore {
    fn insert_habit(&self, habit: &Habit) -> Result<()> {
        let mut state = self.state()?;
        let previous = state.habits.insert(habit.id.clone(), habit.clone());
        state.record(Undo::Habit {
            id: habit.id.clone(),
            previous,
        });
        Ok(())
    }

    fn get_habit(&self, habit_id: &str) -> Result<Option<Habit>> {
        Ok(self.state()?.habits.get(habit_id).cloned())
    }

    fn list_habits(&self) -> Result<Vec<Habit>> {
        Ok(self.state()?.habits.values().cloned().collect())
    }

    fn update_habit_state(&self, habit_id: &str, update: &HabitStateUpdate) -> Result<()> {
        let mut state = self.state()?;
        let habit = state
            .habits
            .get_mut(habit_id)
            .ok_or_else(|| CoreError::not_found(habit_id))?;
        let previous = habit.clone();
        *habit = previous.clone().with_update(update);
        state.record(Undo::Habit {
            id: habit_id.to_string(),
            previous: Some(previous),
        });
        Ok(())
    }
}

impl LedgerStore for MemoryStore {
    fn insert_entry(&self, entry: &CompletionLogEntry) -> Result<()> {
        let mut state = self.state()?;
        state.entries.push(entry.clone());
        state.record(Undo::InsertedEntry {
            id: entry.id.clone(),
        });
        Ok(())
    }

    fn delete_entries_between(
        &self,
        habit_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<usize> {
        let mut state = self.state()?;
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut state.entries)
            .into_iter()
            .partition(|e| e.habit_id == habit_id && e.logged_at >= start && e.logged_at < end);
        state.entries = kept;
        let count = removed.len();
        if count > 0 {
            state.record(Undo::DeletedEntries(removed));
        }
        Ok(count)
    }

    fn entries_for(&self, habit_id: &str) -> Result<Vec<CompletionLogEntry>> {
        let mut entries: Vec<_> = self
            .state()?
            .entries
            .iter()
            .filter(|e| e.habit_id == habit_id)
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.logged_at);
        Ok(entries)
    }
}

impl UnitOfWork for MemoryStore {
    fn atomically<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Self) -> Result<T>,
    {
        let _unit = self
            .unit
            .lock()
            .map_err(|_| DatabaseError::Unavailable("memory store poisoned".into()))?;
        self.state()?.journal = Some((thread::current().id(), Vec::new()));

        let result = f(self);

        let mut state = self.state()?;
        let log = state.journal.take().map(|(_, log)| log).unwrap_or_default();
        if result.is_err() {
            tracing::debug!(writes = log.len(), "rolling back memory unit of work");
            state.rewind(log);
        }
        result
    }
}
