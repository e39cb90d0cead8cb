//! Clinic database
//!
//! The database lives at `.pochita/clinic.db` by default. Every mutation
//! runs inside [`Database::write`], which opens an IMMEDIATE transaction:
//! the write lock is taken before the first read, so a validation query
//! and the write that depends on it cannot interleave with another writer.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior};
use tracing::{debug, info};

use crate::error::Result;

/// SQLite-backed clinic store
pub struct Database {
    /// Path to the SQLite file, None for in-memory databases
    path: Option<PathBuf>,

    /// Database connection
    conn: Connection,
}

impl Database {
    /// Schema version - bump when the schema changes
    const SCHEMA_VERSION: i32 = 1;

    /// How long a writer waits for another process holding the lock
    const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

    /// Opens or creates the database at `path`
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL lets readers proceed while a request holds the write lock
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        let mut db = Self {
            path: Some(path.to_path_buf()),
            conn,
        };
        db.configure()?;
        db.ensure_schema()?;

        debug!(path = %path.display(), "database opened");
        Ok(db)
    }

    /// Opens a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let mut db = Self {
            path: None,
            conn: Connection::open_in_memory()?,
        };
        db.configure()?;
        db.ensure_schema()?;
        Ok(db)
    }

    fn configure(&self) -> Result<()> {
        self.conn.busy_timeout(Self::BUSY_TIMEOUT)?;
        // Needed for client cascade and service SET NULL
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(())
    }

    /// Ensures the schema is up to date
    fn ensure_schema(&mut self) -> Result<()> {
        let current_version = self.schema_version()?;

        if current_version < Self::SCHEMA_VERSION {
            info!(from = current_version, to = Self::SCHEMA_VERSION, "migrating schema");
            self.create_schema()?;
        }

        Ok(())
    }

    /// Gets the current schema version
    fn schema_version(&self) -> Result<i32> {
        let result: Option<i32> = self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .optional()?;

        Ok(result.unwrap_or(0))
    }

    /// Creates the schema
    fn create_schema(&mut self) -> Result<()> {
        let tx = self.conn.transaction()?;

        tx.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS clients (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                rut TEXT NOT NULL DEFAULT '',
                phone TEXT NOT NULL DEFAULT '',
                address TEXT NOT NULL DEFAULT '',
                receives_news INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS pets (
                id INTEGER PRIMARY KEY,
                client_id INTEGER NOT NULL REFERENCES clients(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                species TEXT NOT NULL DEFAULT '',
                breed TEXT,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS staff (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                rut TEXT NOT NULL DEFAULT '',
                phone TEXT NOT NULL DEFAULT '',
                role TEXT NOT NULL,
                specialty TEXT,
                shift TEXT,
                company TEXT,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS services (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                duration_min INTEGER NOT NULL DEFAULT 15 CHECK (duration_min > 0),
                price INTEGER
            );

            CREATE TABLE IF NOT EXISTS availability_blocks (
                id INTEGER PRIMARY KEY,
                veterinarian_id INTEGER NOT NULL REFERENCES staff(id) ON DELETE CASCADE,
                date TEXT NOT NULL,
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                CHECK (end_time > start_time)
            );

            CREATE TABLE IF NOT EXISTS blocked_days (
                id INTEGER PRIMARY KEY,
                veterinarian_id INTEGER NOT NULL REFERENCES staff(id) ON DELETE CASCADE,
                date TEXT NOT NULL,
                reason TEXT,
                created_at TEXT NOT NULL,
                UNIQUE (veterinarian_id, date)
            );

            CREATE TABLE IF NOT EXISTS appointments (
                id INTEGER PRIMARY KEY,
                veterinarian_id INTEGER NOT NULL REFERENCES staff(id) ON DELETE CASCADE,
                client_id INTEGER NOT NULL REFERENCES clients(id) ON DELETE CASCADE,
                pet_id INTEGER NOT NULL REFERENCES pets(id) ON DELETE CASCADE,
                service_id INTEGER REFERENCES services(id) ON DELETE SET NULL,
                date TEXT NOT NULL,
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL,
                status TEXT NOT NULL,
                notes TEXT NOT NULL DEFAULT '',
                cancellation_reason TEXT,
                cancelled_by TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_pets_client ON pets(client_id);
            CREATE INDEX IF NOT EXISTS idx_blocks_vet_date ON availability_blocks(veterinarian_id, date);
            CREATE INDEX IF NOT EXISTS idx_appointments_date ON appointments(date, start_time);
            CREATE INDEX IF NOT EXISTS idx_appointments_vet ON appointments(veterinarian_id, date);
            CREATE INDEX IF NOT EXISTS idx_appointments_client ON appointments(client_id);
            CREATE INDEX IF NOT EXISTS idx_appointments_status ON appointments(status, updated_at);
            ",
        )?;

        tx.execute_batch(&format!("PRAGMA user_version = {}", Self::SCHEMA_VERSION))?;
        tx.commit()?;

        Ok(())
    }

    /// Runs `f` inside one IMMEDIATE transaction
    ///
    /// The transaction commits when `f` returns `Ok` and rolls back when it
    /// returns `Err`, so a failed request leaves no partial writes behind.
    pub fn write<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        match f(&tx) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(e) => {
                debug!(error = %e, "rolling back transaction");
                tx.rollback()?;
                Err(e)
            }
        }
    }

    /// Connection for read-only queries
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Returns the path to the database file, None when in memory
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use tempfile::TempDir;

    fn count(db: &Database, table: &str) -> i64 {
        db.conn()
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn database_creation_sets_schema_version() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clinic.db");
        let db = Database::open(&path).unwrap();

        assert!(path.exists());
        assert_eq!(db.path(), Some(path.as_path()));
        assert_eq!(db.schema_version().unwrap(), Database::SCHEMA_VERSION);
    }

    #[test]
    fn reopening_keeps_data() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clinic.db");

        {
            let mut db = Database::open(&path).unwrap();
            db.write(|tx| {
                tx.execute(
                    "INSERT INTO services (name, duration_min) VALUES ('Consulta', 30)",
                    [],
                )?;
                Ok(())
            })
            .unwrap();
        }

        let db = Database::open(&path).unwrap();
        assert_eq!(count(&db, "services"), 1);
    }

    #[test]
    fn failed_write_rolls_back() {
        let mut db = Database::open_in_memory().unwrap();

        let result: Result<()> = db.write(|tx| {
            tx.execute(
                "INSERT INTO services (name, duration_min) VALUES ('Consulta', 30)",
                [],
            )?;
            Err(Error::Forbidden {
                role: crate::domain::Role::Client,
                operation: "test",
            })
        });

        assert!(result.is_err());
        assert_eq!(count(&db, "services"), 0);
    }

    #[test]
    fn foreign_keys_are_enforced() {
        let mut db = Database::open_in_memory().unwrap();

        let result = db.write(|tx| {
            tx.execute(
                "INSERT INTO pets (client_id, name, created_at) VALUES (99, 'Luna', '2025-06-01 10:00:00')",
                [],
            )?;
            Ok(())
        });

        assert!(matches!(result, Err(Error::Storage(_))));
    }
}
