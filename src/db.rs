use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::expense::{Expense, NewExpense};

/// Schema migrations, applied in order. The index of the last applied entry
/// (plus one) is stored in `PRAGMA user_version`.
const MIGRATIONS: &[&str] = &[
    // 1: expenses table. Amount is TEXT so SQLite never coerces it to REAL.
    "CREATE TABLE IF NOT EXISTS expenses (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        description TEXT NOT NULL,
        amount TEXT NOT NULL,
        date TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_expenses_date ON expenses(date);",
];

/// Bring the schema up to date. Returns how many migrations were applied.
pub fn setup_database(conn: &Connection) -> Result<usize> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    let current: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    let mut applied = 0;

    for (index, sql) in MIGRATIONS.iter().enumerate().skip(current.max(0) as usize) {
        let version = index as i64 + 1;
        conn.execute_batch(sql)?;
        conn.pragma_update(None, "user_version", version)?;
        info!(version, "applied schema migration");
        applied += 1;
    }

    Ok(applied)
}

/// Latest schema version known to this build.
pub fn schema_version() -> i64 {
    MIGRATIONS.len() as i64
}

/// Persistence context over the `expenses` table.
///
/// Cloning is cheap: clones share the same connection.
#[derive(Clone)]
pub struct ExpenseContext {
    conn: Arc<Mutex<Connection>>,
}

impl ExpenseContext {
    /// Open (or create) the database at `path` and migrate it.
    /// The path `:memory:` opens a private in-memory database.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path == Path::new(":memory:") {
            return Self::open_in_memory();
        }
        Self::from_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    pub fn from_connection(conn: Connection) -> Result<Self> {
        setup_database(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| Error::Poisoned)
    }

    /// Every stored expense, in insertion order.
    pub fn list(&self) -> Result<Vec<Expense>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, description, amount, date
             FROM expenses
             ORDER BY id",
        )?;

        let rows = stmt
            .query_map([], read_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter().map(StoredExpense::decode).collect()
    }

    pub fn find(&self, id: i64) -> Result<Option<Expense>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT id, description, amount, date FROM expenses WHERE id = ?1",
                [id],
                read_row,
            )
            .optional()?;

        row.map(StoredExpense::decode).transpose()
    }

    /// Persist one expense and return it with its assigned id.
    pub fn add(&self, expense: &NewExpense) -> Result<Expense> {
        let conn = self.lock()?;
        let id = insert(&conn, expense)?;
        debug!(id, "inserted expense");
        Ok(expense.clone().with_id(id))
    }

    /// Persist a batch in one transaction; nothing is stored if any insert fails.
    pub fn add_all(&self, expenses: &[NewExpense]) -> Result<usize> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        for expense in expenses {
            insert(&tx, expense)?;
        }

        tx.commit()?;
        info!(count = expenses.len(), "inserted expense batch");
        Ok(expenses.len())
    }

    pub fn count(&self) -> Result<i64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM expenses", [], |row| row.get(0))?;
        Ok(count)
    }
}

fn insert(conn: &Connection, expense: &NewExpense) -> Result<i64> {
    conn.execute(
        "INSERT INTO expenses (description, amount, date) VALUES (?1, ?2, ?3)",
        params![
            expense.description,
            expense.amount.to_string(),
            expense.date.to_rfc3339(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Raw column values before decimal and timestamp parsing.
struct StoredExpense {
    id: i64,
    description: String,
    amount: String,
    date: String,
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<StoredExpense> {
    Ok(StoredExpense {
        id: row.get(0)?,
        description: row.get(1)?,
        amount: row.get(2)?,
        date: row.get(3)?,
    })
}

impl StoredExpense {
    fn decode(self) -> Result<Expense> {
        let amount = Decimal::from_str(&self.amount).map_err(|e| Error::Decode {
            column: "amount",
            value: self.amount.clone(),
            reason: e.to_string(),
        })?;
        let date = DateTime::parse_from_rfc3339(&self.date)
            .map_err(|e| Error::Decode {
                column: "date",
                value: self.date.clone(),
                reason: e.to_string(),
            })?
            .with_timezone(&Utc);

        Ok(Expense {
            id: self.id,
            description: self.description,
            amount,
            date,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample(description: &str, cents: i64, day: u32) -> NewExpense {
        NewExpense::new(
            description,
            Decimal::new(cents, 2),
            Utc.with_ymd_and_hms(2024, 12, day, 12, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_created_expense_appears_in_list() {
        let ctx = ExpenseContext::open_in_memory().unwrap();

        let created = ctx.add(&sample("Groceries", 4599, 31)).unwrap();
        let listed = ctx.list().unwrap();

        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0], created);
        assert_eq!(created.description, "Groceries");
        assert_eq!(created.amount, Decimal::new(4599, 2));
    }

    #[test]
    fn test_ids_are_assigned_in_order() {
        let ctx = ExpenseContext::open_in_memory().unwrap();

        let first = ctx.add(&sample("Coffee", 350, 1)).unwrap();
        let second = ctx.add(&sample("Lunch", 1275, 2)).unwrap();

        assert!(second.id > first.id);
        let ids: Vec<i64> = ctx.list().unwrap().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[test]
    fn test_find_missing_returns_none() {
        let ctx = ExpenseContext::open_in_memory().unwrap();
        let created = ctx.add(&sample("Books", 2000, 5)).unwrap();

        assert_eq!(ctx.find(created.id).unwrap(), Some(created.clone()));
        assert_eq!(ctx.find(created.id + 100).unwrap(), None);
    }

    #[test]
    fn test_decimal_scale_survives_storage() {
        let ctx = ExpenseContext::open_in_memory().unwrap();
        let precise = NewExpense::new(
            "Fuel",
            Decimal::from_str("0.1000").unwrap(),
            Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
        );

        let created = ctx.add(&precise).unwrap();
        let stored = ctx.find(created.id).unwrap().unwrap();

        assert_eq!(stored.amount.to_string(), "0.1000");
    }

    #[test]
    fn test_add_all_counts_batch() {
        let ctx = ExpenseContext::open_in_memory().unwrap();
        let batch = vec![sample("A", 100, 1), sample("B", 200, 2), sample("C", 300, 3)];

        assert_eq!(ctx.add_all(&batch).unwrap(), 3);
        assert_eq!(ctx.count().unwrap(), 3);
    }

    #[test]
    fn test_add_all_rolls_back_on_failure() {
        let ctx = ExpenseContext::open_in_memory().unwrap();
        {
            let conn = ctx.lock().unwrap();
            conn.execute_batch(
                "CREATE TRIGGER reject_bad BEFORE INSERT ON expenses
                 WHEN NEW.description = 'BAD'
                 BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
            )
            .unwrap();
        }
        let batch = vec![sample("Fine", 100, 1), sample("BAD", 200, 2)];

        assert!(matches!(ctx.add_all(&batch), Err(Error::Database(_))));
        assert_eq!(ctx.count().unwrap(), 0);
    }

    #[test]
    fn test_poisoned_lock_is_storage_error() {
        let ctx = ExpenseContext::open_in_memory().unwrap();
        let shared = ctx.clone();

        let handle = std::thread::spawn(move || {
            let _guard = shared.conn.lock().unwrap();
            panic!("poison the connection lock");
        });
        assert!(handle.join().is_err());

        assert!(matches!(ctx.list(), Err(Error::Poisoned)));
        assert!(matches!(ctx.add(&sample("After", 100, 1)), Err(Error::Poisoned)));
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        assert_eq!(setup_database(&conn).unwrap(), MIGRATIONS.len());
        assert_eq!(setup_database(&conn).unwrap(), 0);

        let version: i64 = conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, schema_version());
    }

    #[test]
    fn test_corrupt_amount_is_reported() {
        let ctx = ExpenseContext::open_in_memory().unwrap();
        {
            let conn = ctx.lock().unwrap();
            conn.execute(
                "INSERT INTO expenses (description, amount, date) VALUES ('Bad', 'abc', '2024-01-01T00:00:00+00:00')",
                [],
            )
            .unwrap();
        }

        match ctx.list() {
            Err(Error::Decode { column, .. }) => assert_eq!(column, "amount"),
            other => panic!("expected decode error, got {:?}", other),
        }
    }

    #[test]
    fn test_reopen_file_database_keeps_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("expenses.db");

        let created = {
            let ctx = ExpenseContext::open(&path).unwrap();
            ctx.add(&sample("Rent", 120000, 1)).unwrap()
        };

        let reopened = ExpenseContext::open(&path).unwrap();
        assert_eq!(reopened.list().unwrap(), vec![created]);
    }
}
