use rusqlite::Connection;
use tracing::debug;

use crate::engine::SqlEngine;
use crate::error::TrackerDbError;
use crate::statement::{ExecuteOutcome, StatementKind};

use super::query::build_record_set;

/// [`SqlEngine`] over a single rusqlite connection.
///
/// Transactions are driven with explicit `BEGIN`/`COMMIT`/`ROLLBACK`, so the
/// connection stays in autocommit mode between them.
#[derive(Debug)]
pub struct SqliteEngine {
    conn: Option<Connection>,
}

impl SqliteEngine {
    #[must_use]
    pub fn new(conn: Connection) -> Self {
        Self { conn: Some(conn) }
    }

    fn conn(&mut self) -> Result<&mut Connection, TrackerDbError> {
        self.conn.as_mut().ok_or(TrackerDbError::DatabaseClosed)
    }
}

impl SqlEngine for SqliteEngine {
    fn begin_transaction(&mut self) -> Result<(), TrackerDbError> {
        self.conn()?.execute_batch("BEGIN")?;
        Ok(())
    }

    fn commit_transaction(&mut self) -> Result<(), TrackerDbError> {
        self.conn()?.execute_batch("COMMIT")?;
        Ok(())
    }

    fn rollback_transaction(&mut self) -> Result<(), TrackerDbError> {
        self.conn()?.execute_batch("ROLLBACK")?;
        Ok(())
    }

    fn execute_sql(
        &mut self,
        sql: &str,
        kind: StatementKind,
    ) -> Result<ExecuteOutcome, TrackerDbError> {
        let conn = self.conn()?;
        match kind {
            StatementKind::Insert => {
                let inserted = conn.execute(sql, [])?;
                let rowid = (inserted > 0).then(|| conn.last_insert_rowid());
                Ok(ExecuteOutcome::Inserted(rowid))
            }
            StatementKind::Select => {
                let mut stmt = conn.prepare(sql)?;
                Ok(ExecuteOutcome::Records(build_record_set(&mut stmt)?))
            }
            StatementKind::Generic => Ok(ExecuteOutcome::Affected(conn.execute(sql, [])?)),
        }
    }

    fn close(&mut self) -> Result<(), TrackerDbError> {
        if let Some(conn) = self.conn.take() {
            conn.close().map_err(|(_, err)| TrackerDbError::SqliteError(err))?;
            debug!("sqlite connection closed");
        }
        Ok(())
    }
}
