use rusqlite::{Connection, OpenFlags};

use crate::config::DatabaseConfig;
use crate::database::Database;
use crate::dialect::Dialect;
use crate::error::TrackerDbError;

use super::engine::SqliteEngine;

/// Where and how to open a `SQLite` database.
#[derive(Debug, Clone)]
pub struct SqliteOptions {
    /// File path, or `None` for a private in-memory database.
    pub db_path: Option<String>,
    /// Create the file if it does not exist.
    pub create: bool,
    pub config: DatabaseConfig,
}

impl SqliteOptions {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: Some(db_path.into()),
            create: false,
            config: DatabaseConfig::default().with_dialect(Dialect::sqlite()),
        }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            db_path: None,
            ..Self::new(String::new())
        }
    }

    /// Open the connection and wrap it in a [`Database`].
    ///
    /// # Errors
    /// Returns `TrackerDbError::SqliteError` if the file cannot be opened.
    pub fn open(self) -> Result<Database, TrackerDbError> {
        let conn = match &self.db_path {
            None => Connection::open_in_memory()?,
            Some(path) => {
                let mut flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX;
                if self.create {
                    flags |= OpenFlags::SQLITE_OPEN_CREATE;
                }
                Connection::open_with_flags(path, flags)?
            }
        };
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Database::new(SqliteEngine::new(conn), self.config))
    }
}

/// Fluent builder for `SQLite` options.
#[derive(Debug, Clone)]
pub struct SqliteOptionsBuilder {
    opts: SqliteOptions,
}

impl SqliteOptionsBuilder {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            opts: SqliteOptions::new(db_path),
        }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            opts: SqliteOptions::in_memory(),
        }
    }

    #[must_use]
    pub fn create(mut self, create: bool) -> Self {
        self.opts.create = create;
        self
    }

    /// Replace the database settings; the dialect should stay SQLite-compatible.
    #[must_use]
    pub fn config(mut self, config: DatabaseConfig) -> Self {
        self.opts.config = config;
        self
    }

    #[must_use]
    pub fn finish(self) -> SqliteOptions {
        self.opts
    }

    /// # Errors
    ///
    /// Returns `TrackerDbError` if the connection cannot be opened.
    pub fn build(self) -> Result<Database, TrackerDbError> {
        self.finish().open()
    }
}

impl Database {
    #[must_use]
    pub fn sqlite_builder(db_path: impl Into<String>) -> SqliteOptionsBuilder {
        SqliteOptionsBuilder::new(db_path)
    }

    /// Open a private in-memory `SQLite` database.
    ///
    /// # Errors
    /// Returns `TrackerDbError::SqliteError` if `SQLite` cannot allocate it.
    pub fn sqlite_in_memory() -> Result<Database, TrackerDbError> {
        SqliteOptions::in_memory().open()
    }
}
