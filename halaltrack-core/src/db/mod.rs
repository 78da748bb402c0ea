//! SQLite-backed row store for tasks, checklists, accounts and settings.

mod schema;
mod settings;
mod tasks;
mod users;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use directories::ProjectDirs;
use rusqlite::types::Type;
use rusqlite::Connection;
use uuid::Uuid;

pub use schema::SCHEMA_VERSION;
pub use users::{synthetic_email, AuthError, EMAIL_DOMAIN};

/// Shared handle to the database. Cloning shares the same connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database at {}", path.display()))?;
        tracing::debug!("Opened database at {}", path.display());
        Self::from_connection(conn)
    }

    /// Open the database in the platform data directory.
    pub fn open_default() -> Result<Self> {
        let path = Self::default_path()
            .ok_or_else(|| anyhow!("Could not determine data directory"))?;
        Self::open(path)
    }

    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "halaltrack", "halaltrack")
            .map(|dirs| dirs.data_dir().join("halaltrack.db"))
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .context("Failed to enable foreign keys")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        self.with_conn(|conn| {
            let current: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
            if current > SCHEMA_VERSION {
                return Err(anyhow!(
                    "Database schema version {} is newer than supported version {}",
                    current,
                    SCHEMA_VERSION
                ));
            }
            if current < 1 {
                conn.execute_batch(schema::SCHEMA)
                    .context("Failed to create tables")?;
                conn.execute_batch(&format!("PRAGMA user_version = {}", SCHEMA_VERSION))?;
                tracing::info!("Migrated database to schema version {}", SCHEMA_VERSION);
            }
            Ok(())
        })
    }

    pub(crate) fn with_conn<T>(&self, f: impl FnOnce(&mut Connection) -> Result<T>) -> Result<T> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| anyhow!("Database lock poisoned: {}", e))?;
        f(&mut conn)
    }
}

// Timestamps are stored with a fixed nanosecond width so text order is time order.
pub(crate) fn fmt_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub(crate) fn parse_time(idx: usize, value: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn parse_uuid(idx: usize, value: String) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(&value)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn parse_enum<T>(
    idx: usize,
    value: String,
    parse: impl Fn(&str) -> Option<T>,
) -> rusqlite::Result<T> {
    parse(&value).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("unexpected value '{}'", value).into(),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn migrate_is_idempotent() {
        let db = Database::open_memory().unwrap();
        db.migrate().unwrap();
        db.migrate().unwrap();

        let version: i64 = db
            .with_conn(|conn| Ok(conn.query_row("PRAGMA user_version", [], |row| row.get(0))?))
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn rejects_newer_schema() {
        let db = Database::open_memory().unwrap();
        db.with_conn(|conn| Ok(conn.execute_batch("PRAGMA user_version = 99")?))
            .unwrap();
        assert!(db.migrate().is_err());
    }

    #[test]
    fn open_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("halaltrack.db");

        let db = Database::open(&path).unwrap();
        db.migrate().unwrap();

        assert!(path.exists());
    }

    #[test]
    fn time_format_sorts_lexically() {
        let early = DateTime::parse_from_rfc3339("2026-01-01T00:00:05.5Z").unwrap().with_timezone(&Utc);
        let late = DateTime::parse_from_rfc3339("2026-01-01T00:00:05.123456789Z").unwrap().with_timezone(&Utc);
        assert!(early > late);
        assert!(fmt_time(early) > fmt_time(late));
        assert_eq!(parse_time(0, fmt_time(late)).unwrap(), late);
    }
}
