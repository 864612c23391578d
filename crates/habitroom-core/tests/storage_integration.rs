//! File-backed storage: persistence across reopen, rollback of partial
//! toggles, and serialized toggles from several connections.

use std::thread;

use chrono::{DateTime, Duration, TimeZone, Utc};
use habitroom_core::{
    CoreError, Frequency, Habit, HabitDb, HabitStore, LedgerStore, StreakEngine,
};

fn at(d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, d, h, 0, 0).unwrap()
}

#[test]
fn state_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("habitroom.db");

    let habit = Habit::new("Practice piano", Frequency::Daily);
    {
        let db = HabitDb::open_at(&path).unwrap();
        db.insert_habit(&habit).unwrap();
        let engine = StreakEngine::new(db);
        engine.toggle(&habit.id, at(10, 7)).unwrap();
    }

    let engine = StreakEngine::new(HabitDb::open_at(&path).unwrap());
    let reloaded = engine.store().get_habit(&habit.id).unwrap().unwrap();
    assert!(reloaded.is_completed);
    assert_eq!(reloaded.current_streak, 1);
    assert_eq!(reloaded.last_completed_at, Some(at(10, 7)));

    // Next day: un-complete the stale flag, then complete again
    engine.toggle(&habit.id, at(11, 7)).unwrap();
    let habit = engine.toggle(&habit.id, at(11, 8)).unwrap();
    assert_eq!(habit.current_streak, 1);
    assert_eq!(engine.history(&habit.id).unwrap().len(), 2);
}

#[test]
fn failed_ledger_write_rolls_back_habit_update() {
    let db = HabitDb::open_memory().unwrap();
    let habit = Habit::new("Stretch", Frequency::Daily);
    db.insert_habit(&habit).unwrap();
    db.conn().execute_batch("DROP TABLE habit_logs;").unwrap();
    let engine = StreakEngine::new(db);

    let err = engine.toggle(&habit.id, at(10, 7)).unwrap_err();
    assert!(matches!(err, CoreError::Storage(_)));

    let stored = engine.store().get_habit(&habit.id).unwrap().unwrap();
    assert_eq!(stored, habit);
}

#[test]
fn concurrent_toggles_are_serialized() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("habitroom.db");

    let habit = Habit::new("Drink water", Frequency::Daily);
    HabitDb::open_at(&path).unwrap().insert_habit(&habit).unwrap();

    let workers: Vec<_> = (0..4)
        .map(|worker| {
            let path = path.clone();
            let id = habit.id.clone();
            thread::spawn(move || {
                let engine = StreakEngine::new(HabitDb::open_at(&path).unwrap());
                for i in 0..10 {
                    let now = at(10, 6) + Duration::minutes(worker * 10 + i);
                    engine.toggle(&id, now).unwrap();
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    // 40 flips on one day: every completion was matched by an un-completion
    let db = HabitDb::open_at(&path).unwrap();
    let stored = db.get_habit(&habit.id).unwrap().unwrap();
    assert!(!stored.is_completed);
    assert_eq!(stored.current_streak, 0);
    assert!(db.entries_for(&habit.id).unwrap().is_empty());
}
