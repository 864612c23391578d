//! SQLite-based storage for habits and their completion ledger.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};

use super::data_dir;
use super::migrations;
use crate::error::{CoreError, DatabaseError, Result};
use crate::habit::{
    CompletionLogEntry, Frequency, Habit, HabitStateUpdate, HabitStore, LedgerStore, UnitOfWork,
};

/// Format a timestamp for storage. Fixed width, so text order is time order.
fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(table: &'static str, raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            DatabaseError::CorruptRow {
                table,
                message: format!("bad timestamp '{raw}': {e}"),
            }
            .into()
        })
}

/// Raw habit row, decoded in a second step so bad timestamps surface as errors.
struct HabitRow {
    id: String,
    title: String,
    frequency: String,
    is_completed: bool,
    current_streak: u32,
    last_completed_at: Option<String>,
}

impl HabitRow {
    const COLUMNS: &'static str =
        "id, title, frequency, is_completed, current_streak, last_completed_at";

    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            frequency: row.get(2)?,
            is_completed: row.get(3)?,
            current_streak: row.get(4)?,
            last_completed_at: row.get(5)?,
        })
    }

    fn into_habit(self) -> Result<Habit> {
        let last_completed_at = self
            .last_completed_at
            .as_deref()
            .map(|raw| parse_timestamp("habits", raw))
            .transpose()?;
        Ok(Habit {
            id: self.id,
            title: self.title,
            frequency: Frequency::parse_lenient(&self.frequency),
            is_completed: self.is_completed,
            current_streak: self.current_streak,
            last_completed_at,
        })
    }
}

/// SQLite database for habit storage.
pub struct HabitDb {
    conn: Connection,
}

impl HabitDb {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `<data_dir>/habitroom.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        Self::open_at(&data_dir()?.join("habitroom.db"))
    }

    /// Open (or create) the database file at `path`.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::with_connection(conn)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        migrations::migrate(&conn)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }
}

impl HabitStore for HabitDb {
    fn insert_habit(&self, habit: &Habit) -> Result<()> {
        self.conn.execute(
            "INSERT INTO habits (id, title, frequency, is_completed, current_streak, last_completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                habit.id,
                habit.title,
                habit.frequency.as_str(),
                habit.is_completed,
                habit.current_streak,
                habit.last_completed_at.map(format_timestamp),
            ],
        )?;
        Ok(())
    }

    fn get_habit(&self, habit_id: &str) -> Result<Option<Habit>> {
        let sql = format!("SELECT {} FROM habits WHERE id = ?1", HabitRow::COLUMNS);
        self.conn
            .query_row(&sql, params![habit_id], HabitRow::from_row)
            .optional()?
            .map(HabitRow::into_habit)
            .transpose()
    }

    fn list_habits(&self) -> Result<Vec<Habit>> {
        let sql = format!("SELECT {} FROM habits ORDER BY title, id", HabitRow::COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], HabitRow::from_row)?;
        let mut habits = Vec::new();
        for row in rows {
            habits.push(row?.into_habit()?);
        }
        Ok(habits)
    }

    fn update_habit_state(&self, habit_id: &str, update: &HabitStateUpdate) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE habits
             SET is_completed = ?2, current_streak = ?3, last_completed_at = ?4
             WHERE id = ?1",
            params![
                habit_id,
                update.is_completed,
                update.current_streak,
                update.last_completed_at.map(format_timestamp),
            ],
        )?;
        if changed == 0 {
            return Err(CoreError::not_found(habit_id));
        }
        Ok(())
    }
}

impl LedgerStore for HabitDb {
    fn insert_entry(&self, entry: &CompletionLogEntry) -> Result<()> {
        self.conn.execute(
            "INSERT INTO habit_logs (id, habit_id, logged_at, value) VALUES (?1, ?2, ?3, ?4)",
            params![
                entry.id,
                entry.habit_id,
                format_timestamp(entry.logged_at),
                entry.value,
            ],
        )?;
        Ok(())
    }

    fn delete_entries_between(
        &self,
        habit_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<usize> {
        let removed = self.conn.execute(
            "DELETE FROM habit_logs WHERE habit_id = ?1 AND logged_at >= ?2 AND logged_at < ?3",
            params![habit_id, format_timestamp(start), format_timestamp(end)],
        )?;
        Ok(removed)
    }

    fn entries_for(&self, habit_id: &str) -> Result<Vec<CompletionLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, habit_id, logged_at, value FROM habit_logs
             WHERE habit_id = ?1
             ORDER BY logged_at, id",
        )?;
        let rows = stmt.query_map(params![habit_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (id, habit_id, logged_at, value) = row?;
            entries.push(CompletionLogEntry {
                id,
                habit_id,
                logged_at: parse_timestamp("habit_logs", &logged_at)?,
                value,
            });
        }
        Ok(entries)
    }
}

impl UnitOfWork for HabitDb {
    /// Runs `f` inside a `BEGIN IMMEDIATE` transaction: the write lock is
    /// taken before `f` reads anything, which serializes toggles across
    /// connections. Dropping the transaction on error rolls it back.
    fn atomically<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Self) -> Result<T>,
    {
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;
        let value = f(self)?;
        tx.commit()?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, h, 0, 0).unwrap()
    }

    #[test]
    fn insert_and_get_habit() {
        let db = HabitDb::open_memory().unwrap();
        let mut habit = Habit::new("Journal", Frequency::Quarterly);
        habit.current_streak = 2;
        habit.last_completed_at = Some(at(3, 7));
        db.insert_habit(&habit).unwrap();

        assert_eq!(db.get_habit(&habit.id).unwrap(), Some(habit));
        assert!(db.get_habit("missing").unwrap().is_none());
    }

    #[test]
    fn unknown_stored_frequency_reads_as_daily() {
        let db = HabitDb::open_memory().unwrap();
        db.conn()
            .execute(
                "INSERT INTO habits (id, title, frequency) VALUES ('h', 'Odd', 'BIWEEKLY')",
                [],
            )
            .unwrap();
        assert_eq!(db.get_habit("h").unwrap().unwrap().frequency, Frequency::Daily);
    }

    #[test]
    fn corrupt_timestamp_is_an_error() {
        let db = HabitDb::open_memory().unwrap();
        db.conn()
            .execute(
                "INSERT INTO habits (id, last_completed_at) VALUES ('h', 'yesterday')",
                [],
            )
            .unwrap();
        let err = db.get_habit("h").unwrap_err();
        assert!(matches!(
            err,
            CoreError::Storage(DatabaseError::CorruptRow { table: "habits", .. })
        ));
    }

    #[test]
    fn update_state_round_trips() {
        let db = HabitDb::open_memory().unwrap();
        let habit = Habit::new("Run", Frequency::Daily);
        db.insert_habit(&habit).unwrap();

        let update = HabitStateUpdate {
            is_completed: true,
            current_streak: 9,
            last_completed_at: Some(at(10, 6)),
        };
        db.update_habit_state(&habit.id, &update).unwrap();
        assert_eq!(db.get_habit(&habit.id).unwrap(), Some(habit.with_update(&update)));
    }

    #[test]
    fn update_missing_habit_is_not_found() {
        let db = HabitDb::open_memory().unwrap();
        let update = HabitStateUpdate {
            is_completed: false,
            current_streak: 0,
            last_completed_at: None,
        };
        assert!(matches!(
            db.update_habit_state("ghost", &update),
            Err(CoreError::NotFound { .. })
        ));
    }

    #[test]
    fn ledger_range_delete_is_half_open() {
        let db = HabitDb::open_memory().unwrap();
        let habit = Habit::new("Run", Frequency::Daily);
        db.insert_habit(&habit).unwrap();
        for ts in [at(9, 23), at(10, 0), at(10, 23), at(11, 0)] {
            db.insert_entry(&CompletionLogEntry::new(&habit.id, ts)).unwrap();
        }

        let removed = db.delete_entries_between(&habit.id, at(10, 0), at(11, 0)).unwrap();
        assert_eq!(removed, 2);
        let left: Vec<_> = db
            .entries_for(&habit.id)
            .unwrap()
            .into_iter()
            .map(|e| e.logged_at)
            .collect();
        assert_eq!(left, vec![at(9, 23), at(11, 0)]);
    }

    #[test]
    fn list_orders_by_title() {
        let db = HabitDb::open_memory().unwrap();
        db.insert_habit(&Habit::new("Yoga", Frequency::Weekly)).unwrap();
        db.insert_habit(&Habit::new("Budget", Frequency::Monthly)).unwrap();
        let titles: Vec<_> = db.list_habits().unwrap().into_iter().map(|h| h.title).collect();
        assert_eq!(titles, vec!["Budget", "Yoga"]);
    }

    #[test]
    fn failed_unit_of_work_rolls_back() {
        let db = HabitDb::open_memory().unwrap();
        let habit = Habit::new("Run", Frequency::Daily);
        db.insert_habit(&habit).unwrap();

        let result: Result<()> = db.atomically(|db| {
            db.insert_entry(&CompletionLogEntry::new(&habit.id, at(10, 8)))?;
            Err(CoreError::Unauthorized("not yours".into()))
        });

        assert!(matches!(result, Err(CoreError::Unauthorized(_))));
        assert!(db.entries_for(&habit.id).unwrap().is_empty());
    }
}
