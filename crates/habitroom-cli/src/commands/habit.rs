//! Habit commands: seeding, toggling and inspecting streaks.

use clap::Subcommand;
use habitroom_core::{Config, Frequency, Habit, HabitDb, HabitStore, StreakEngine};
use serde::Serialize;

use super::resolve_at;

#[derive(Subcommand)]
pub enum HabitAction {
    /// Create a new habit
    Add {
        /// Habit title
        title: String,
        /// daily, weekly, monthly, quarterly or yearly (unknown values mean daily)
        #[arg(long, default_value = "daily")]
        frequency: String,
    },
    /// List habits with their streak status
    List {
        /// Evaluate status at this time (RFC 3339 or YYYY-MM-DD)
        #[arg(long)]
        at: Option<String>,
    },
    /// Show one habit with its streak status
    Get {
        /// Habit ID
        id: String,
        #[arg(long)]
        at: Option<String>,
    },
    /// Flip a habit between done and not done for the current period
    Toggle {
        /// Habit ID
        id: String,
        /// Toggle as of this time (RFC 3339 or YYYY-MM-DD)
        #[arg(long)]
        at: Option<String>,
    },
    /// Mark a habit done or not done; does nothing if it already is
    Set {
        /// Habit ID
        id: String,
        /// Desired state
        #[arg(long, action = clap::ArgAction::Set)]
        completed: bool,
        #[arg(long)]
        at: Option<String>,
    },
    /// Show a habit's completion ledger
    Log {
        /// Habit ID
        id: String,
    },
}

/// Listing row; fields hidden by the display config are left out.
#[derive(Serialize)]
struct HabitView {
    #[serde(flatten)]
    habit: Habit,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<habitroom_core::StreakStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    period_start: Option<chrono::NaiveDate>,
}

impl HabitView {
    fn new(status: habitroom_core::HabitStatus, config: &Config) -> Self {
        let mut habit = status.habit;
        if config.display.live_streaks {
            habit.current_streak = status.live_streak;
        }
        let show = config.display.show_status;
        Self {
            habit,
            status: show.then_some(status.status),
            period_start: show.then_some(status.period_start),
        }
    }
}

pub fn run(action: HabitAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let engine = StreakEngine::with_config(HabitDb::open()?, &config.engine)?;
    let offset = engine.offset();

    match action {
        HabitAction::Add { title, frequency } => {
            let habit = Habit::new(title, Frequency::parse_lenient(&frequency));
            engine.store().insert_habit(&habit)?;
            eprintln!("Habit created: {}", habit.id);
            println!("{}", serde_json::to_string_pretty(&habit)?);
        }
        HabitAction::List { at } => {
            let now = resolve_at(at.as_deref(), offset)?;
            let views: Vec<_> = engine
                .statuses(now)?
                .into_iter()
                .map(|status| HabitView::new(status, &config))
                .collect();
            println!("{}", serde_json::to_string_pretty(&views)?);
        }
        HabitAction::Get { id, at } => {
            let now = resolve_at(at.as_deref(), offset)?;
            let view = HabitView::new(engine.status(&id, now)?, &config);
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        HabitAction::Toggle { id, at } => {
            let now = resolve_at(at.as_deref(), offset)?;
            let habit = engine.toggle(&id, now)?;
            println!("{}", serde_json::to_string_pretty(&habit)?);
        }
        HabitAction::Set { id, completed, at } => {
            let now = resolve_at(at.as_deref(), offset)?;
            let habit = engine.set_completed(&id, completed, now)?;
            println!("{}", serde_json::to_string_pretty(&habit)?);
        }
        HabitAction::Log { id } => {
            let entries = engine.history(&id)?;
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
    }
    Ok(())
}
