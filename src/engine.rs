use crate::error::TrackerDbError;
use crate::statement::{ExecuteOutcome, StatementKind};

/// The capabilities a concrete engine adapter supplies.
///
/// These are the only points of contact with a native database. Adapters must
/// report every native failure as a `TrackerDbError`; driver error types never
/// cross this boundary.
pub trait SqlEngine {
    /// # Errors
    /// Returns `TrackerDbError` if the engine refuses to open a transaction.
    fn begin_transaction(&mut self) -> Result<(), TrackerDbError>;

    /// # Errors
    /// Returns `TrackerDbError` if the commit fails; the transaction is then
    /// still open and must be rolled back.
    fn commit_transaction(&mut self) -> Result<(), TrackerDbError>;

    /// # Errors
    /// Returns `TrackerDbError` if the rollback fails.
    fn rollback_transaction(&mut self) -> Result<(), TrackerDbError>;

    /// Run one fully prepared statement. `kind` says which outcome is expected:
    /// the new row id for inserts, a record set for selects, an affected-row
    /// count otherwise.
    ///
    /// # Errors
    /// Returns `TrackerDbError` if the engine rejects or fails the statement.
    fn execute_sql(
        &mut self,
        sql: &str,
        kind: StatementKind,
    ) -> Result<ExecuteOutcome, TrackerDbError>;

    /// Release the native connection.
    ///
    /// # Errors
    /// Returns `TrackerDbError` if the engine fails to close cleanly.
    fn close(&mut self) -> Result<(), TrackerDbError> {
        Ok(())
    }
}

impl<E: SqlEngine + ?Sized> SqlEngine for Box<E> {
    fn begin_transaction(&mut self) -> Result<(), TrackerDbError> {
        (**self).begin_transaction()
    }

    fn commit_transaction(&mut self) -> Result<(), TrackerDbError> {
        (**self).commit_transaction()
    }

    fn rollback_transaction(&mut self) -> Result<(), TrackerDbError> {
        (**self).rollback_transaction()
    }

    fn execute_sql(
        &mut self,
        sql: &str,
        kind: StatementKind,
    ) -> Result<ExecuteOutcome, TrackerDbError> {
        (**self).execute_sql(sql, kind)
    }

    fn close(&mut self) -> Result<(), TrackerDbError> {
        (**self).close()
    }
}
