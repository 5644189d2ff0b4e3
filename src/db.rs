//! Database module
//!
//! Durable key-value settings backed by sqlite.

mod schema;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use schema::SCHEMA;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type DbResult<T> = Result<T, DbError>;

/// Thread-safe database handle
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    #[allow(dead_code)] // Used in tests
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn run_migrations(&self) -> DbResult<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // ==================== Settings Operations ====================

    /// Get a setting value by key
    pub fn get_setting(&self, key: &str) -> DbResult<Option<String>> {
        let conn = self.conn();
        let value = conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Insert or replace a setting
    pub fn set_setting(&self, key: &str, value: &str) -> DbResult<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Remove a setting. Returns whether a row was deleted.
    pub fn delete_setting(&self, key: &str) -> DbResult<bool> {
        let conn = self.conn();
        let deleted = conn.execute("DELETE FROM settings WHERE key = ?1", params![key])?;
        Ok(deleted > 0)
    }
}
