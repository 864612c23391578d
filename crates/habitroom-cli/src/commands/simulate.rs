//! Offline streak simulation.

use chrono::{DateTime, Utc};
use clap::Args;
use habitroom_core::{simulate, Config, Frequency, StreakState, ToggleDirection};
use serde::Serialize;

use super::resolve_at;

#[derive(Args)]
pub struct SimulateArgs {
    /// Habit frequency
    #[arg(long, default_value = "daily")]
    frequency: String,
    /// Starting streak
    #[arg(long, default_value_t = 0)]
    streak: u32,
    /// Starting last-completed time (RFC 3339 or YYYY-MM-DD)
    #[arg(long)]
    last: Option<String>,
    /// Events as `complete@TIME` or `uncomplete@TIME`, applied in order
    #[arg(required = true)]
    events: Vec<String>,
}

#[derive(Serialize)]
struct Step {
    direction: ToggleDirection,
    at: DateTime<Utc>,
    #[serde(flatten)]
    state: StreakState,
}

pub fn run(args: SimulateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let offset = config.engine.utc_offset()?;
    let frequency = Frequency::parse_lenient(&args.frequency);

    if args.last.is_none() && args.streak > 0 {
        return Err("--streak needs --last: a streak implies a last completion".into());
    }
    let initial = StreakState {
        current_streak: args.streak,
        last_completed_at: args
            .last
            .as_deref()
            .map(|raw| resolve_at(Some(raw), offset))
            .transpose()?,
    };

    let mut events = Vec::with_capacity(args.events.len());
    for raw in &args.events {
        let (direction, at) = raw
            .split_once('@')
            .ok_or_else(|| format!("invalid event '{raw}': expected DIRECTION@TIME"))?;
        let direction = match direction.to_ascii_lowercase().as_str() {
            "complete" | "c" => ToggleDirection::Complete,
            "uncomplete" | "u" => ToggleDirection::Uncomplete,
            other => return Err(format!("invalid direction '{other}'").into()),
        };
        let at = resolve_at(Some(at), offset)?;
        events.push((direction, at.with_timezone(&offset)));
    }

    let states = simulate(frequency, initial, events.iter().cloned());
    let steps: Vec<_> = events
        .iter()
        .zip(states)
        .map(|((direction, at), state)| Step {
            direction: *direction,
            at: at.with_timezone(&Utc),
            state,
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&steps)?);
    Ok(())
}
