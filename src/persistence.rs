//! SQLite persistence layer for settings and the goal ledger.

use crate::engine::SettingsProvider;
use crate::models::Settings;
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to create database directory")]
    DirectoryCreation,
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Byte-oriented key-value storage used by the goal tracker.
pub trait KeyValueStore {
    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Rc<T> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        (**self).set(key, value)
    }
}

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens the database in the user's data directory, initializing tables if needed.
    pub fn new() -> Result<Self, DatabaseError> {
        Self::open(&Self::db_path())
    }

    /// Opens (or creates) a database file at `path`.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|_| DatabaseError::DirectoryCreation)?;
        }

        let conn = Connection::open(path)?;
        Self::initialize_tables(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing).
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        Self::initialize_tables(&conn)?;
        Ok(Self { conn })
    }

    fn initialize_tables(conn: &Connection) -> Result<(), DatabaseError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value BLOB NOT NULL
            );
        "#,
        )?;
        Ok(())
    }

    fn db_path() -> PathBuf {
        ProjectDirs::from("com", "focusbar", "Focusbar")
            .map(|dirs| dirs.data_dir().join("focusbar.db"))
            .unwrap_or_else(|| PathBuf::from("focusbar.db"))
    }

    /// Loads settings from the database, returning defaults if not found.
    pub fn load_settings(&self) -> Result<Settings, DatabaseError> {
        let json: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key = 'config'",
                [],
                |row| row.get(0),
            )
            .optional()?;

        match json {
            Some(j) => Ok(serde_json::from_str(&j)?),
            None => Ok(Settings::default()),
        }
    }

    /// Saves settings to the database.
    pub fn save_settings(&self, settings: &Settings) -> Result<(), DatabaseError> {
        let json = serde_json::to_string(settings)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES ('config', ?)",
            [&json],
        )?;
        Ok(())
    }
}

impl KeyValueStore for Database {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?", [key], |row| {
                row.get::<_, Vec<u8>>(0)
            })
            .optional()
            .map_err(DatabaseError::from)?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO kv (key, value) VALUES (?, ?)",
                params![key, value],
            )
            .map_err(DatabaseError::from)?;
        Ok(())
    }
}

impl SettingsProvider for Database {
    fn settings(&self) -> Settings {
        match self.load_settings() {
            Ok(settings) => settings,
            Err(e) => {
                warn!(error = %e, "Stored settings unreadable, using defaults");
                Settings::default()
            }
        }
    }
}
