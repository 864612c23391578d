//! # Habitroom Core Library
//!
//! Core logic for tracking recurring habits: deciding, each time a habit is
//! marked done or undone, what its streak becomes and whether a completion
//! record should exist for the current period. The CLI is a thin layer over
//! this crate.
//!
//! ## Architecture
//!
//! - **Period oracle**: same-period / prior-period checks per frequency
//!   (day, ISO week, month, quarter, year)
//! - **Streak transition**: a pure function of streak state, direction and an
//!   explicit `now`
//! - **Completion ledger**: append-only audit trail of completions
//! - **Toggle orchestrator**: [`StreakEngine`], which runs the above inside
//!   one storage transaction
//! - **Storage**: SQLite via [`HabitDb`], or [`MemoryStore`] in process, plus
//!   TOML configuration
//!
//! ## Key Components
//!
//! - [`StreakEngine`]: toggle / set-completed entry points
//! - [`transition`]: pure streak state machine
//! - [`HabitDb`]: SQLite persistence
//! - [`Config`]: application configuration

pub mod error;
pub mod habit;
pub mod storage;

pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use habit::{
    is_prior_period, live_streak, same_period, simulate, streak_status, transition,
    CompletionLogEntry, Frequency, Habit, HabitStateUpdate, HabitStatus, HabitStore,
    LedgerStore, MemoryStore, StreakEngine, StreakState, StreakStatus, ToggleDirection,
    UnitOfWork,
};
pub use storage::{Config, HabitDb};
