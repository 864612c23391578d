//! Recurring habits and their completion streaks.
//!
//! - [`period`]: calendar-period alignment per [`Frequency`]
//! - [`streak`]: the pure streak transition function
//! - [`ledger`]: append-only completion log helpers
//! - [`store`]: storage seams plus an in-memory implementation
//! - [`engine`]: the toggle orchestrator tying it all together

pub mod engine;
pub mod ledger;
pub mod period;
pub mod store;
pub mod streak;

pub use engine::{HabitStatus, StreakEngine};
pub use ledger::day_window;
pub use period::{is_prior_period, period_index, period_start, same_period};
pub use store::{HabitStore, LedgerStore, MemoryStore, UnitOfWork};
pub use streak::{
    live_streak, simulate, streak_status, transition, StreakState, StreakStatus, ToggleDirection,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How often a habit is expected to be completed.
///
/// Parsing is permissive: anything unrecognized becomes [`Frequency::Daily`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", from = "String")]
pub enum Frequency {
    #[default]
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl Frequency {
    pub const ALL: [Frequency; 5] = [
        Frequency::Daily,
        Frequency::Weekly,
        Frequency::Monthly,
        Frequency::Quarterly,
        Frequency::Yearly,
    ];

    /// Parse a stored or user-supplied frequency, falling back to daily.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "DAILY" => Frequency::Daily,
            "WEEKLY" => Frequency::Weekly,
            "MONTHLY" => Frequency::Monthly,
            "QUARTERLY" => Frequency::Quarterly,
            "YEARLY" => Frequency::Yearly,
            other => {
                tracing::debug!(frequency = other, "unrecognized frequency, using DAILY");
                Frequency::Daily
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "DAILY",
            Frequency::Weekly => "WEEKLY",
            Frequency::Monthly => "MONTHLY",
            Frequency::Quarterly => "QUARTERLY",
            Frequency::Yearly => "YEARLY",
        }
    }
}

impl From<String> for Frequency {
    fn from(value: String) -> Self {
        Frequency::parse_lenient(&value)
    }
}

impl From<Option<&str>> for Frequency {
    fn from(value: Option<&str>) -> Self {
        value.map(Frequency::parse_lenient).unwrap_or_default()
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recurring action item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Habit {
    pub id: String,
    pub title: String,
    pub frequency: Frequency,
    /// Whether the current period has been marked done
    pub is_completed: bool,
    pub current_streak: u32,
    pub last_completed_at: Option<DateTime<Utc>>,
}

impl Habit {
    /// A fresh habit: no completions, zero streak.
    pub fn new(title: impl Into<String>, frequency: Frequency) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            frequency,
            is_completed: false,
            current_streak: 0,
            last_completed_at: None,
        }
    }

    pub fn streak_state(&self) -> StreakState {
        StreakState {
            current_streak: self.current_streak,
            last_completed_at: self.last_completed_at,
        }
    }

    /// Snapshot of this habit after `update` has been persisted.
    pub fn with_update(mut self, update: &HabitStateUpdate) -> Self {
        self.is_completed = update.is_completed;
        self.current_streak = update.current_streak;
        self.last_completed_at = update.last_completed_at;
        self
    }
}

/// The mutable slice of a habit written back by a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitStateUpdate {
    pub is_completed: bool,
    pub current_streak: u32,
    pub last_completed_at: Option<DateTime<Utc>>,
}

/// One completion event in a habit's ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionLogEntry {
    pub id: String,
    pub habit_id: String,
    pub logged_at: DateTime<Utc>,
    pub value: i64,
}

impl CompletionLogEntry {
    pub fn new(habit_id: impl Into<String>, logged_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            habit_id: habit_id.into(),
            logged_at,
            value: 1,
        }
    }
}
