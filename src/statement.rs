use chrono::NaiveDateTime;

use crate::database::Database;
use crate::error::TrackerDbError;
use crate::results::RecordSet;
use crate::translation::{CompiledStatement, compile_template};
use crate::types::{Oid, SqlDataType, SqlValue};

/// What a statement does, decided once from its leading keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    /// Returns the new row id when the table has an auto-assigned key.
    Insert,
    /// Returns a [`RecordSet`].
    Select,
    /// UPDATE, DELETE, DDL and anything else: returns an affected-row count.
    Generic,
}

impl StatementKind {
    /// Classify by the first keyword (trimmed, case-insensitive).
    #[must_use]
    pub fn classify(template: &str) -> Self {
        let keyword: String = template
            .trim_start()
            .chars()
            .take_while(char::is_ascii_alphabetic)
            .collect();
        if keyword.eq_ignore_ascii_case("INSERT") {
            StatementKind::Insert
        } else if keyword.eq_ignore_ascii_case("SELECT") {
            StatementKind::Select
        } else {
            StatementKind::Generic
        }
    }
}

/// Result of executing a statement, one variant per [`StatementKind`].
#[derive(Debug, Clone)]
pub enum ExecuteOutcome {
    Inserted(Option<Oid>),
    Records(RecordSet),
    Affected(usize),
}

/// A positional parameter slot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameter {
    name: Option<String>,
    data_type: Option<SqlDataType>,
    value: Option<SqlValue>,
}

impl Parameter {
    /// Placeholders are positional, so this is always `None` today.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// `None` until a typed setter has been called.
    #[must_use]
    pub fn data_type(&self) -> Option<SqlDataType> {
        self.data_type
    }

    /// `None` while unbound; `Some(SqlValue::Null)` once bound to NULL.
    #[must_use]
    pub fn value(&self) -> Option<&SqlValue> {
        self.value.as_ref()
    }

    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.value.is_some()
    }
}

/// A compiled, parameterised statement bound to one [`Database`].
///
/// ```rust
/// use tracker_sql::prelude::*;
/// use tracker_sql::test_utils::ScriptedEngine;
///
/// let db = Database::new(ScriptedEngine::new(), DatabaseConfig::default());
/// let mut stmt = db.create_statement("UPDATE [t] SET [name] = ? WHERE [pk] = ?")?;
/// stmt.set_string(0, Some("O'Brien"))?;
/// stmt.set_int(1, Some(7))?;
/// assert_eq!(stmt.prepared_sql()?, r#"UPDATE "t" SET "name" = 'O''Brien' WHERE "pk" = 7"#);
/// # Ok::<(), TrackerDbError>(())
/// ```
#[derive(Debug)]
pub struct Statement {
    db: Database,
    template: String,
    kind: StatementKind,
    compiled: CompiledStatement,
    parameters: Vec<Parameter>,
    prepared_sql: Option<String>,
}

impl Statement {
    pub(crate) fn new(db: Database, template: &str) -> Result<Self, TrackerDbError> {
        let compiled = compile_template(template, &db.config().dialect)?;
        let parameters = vec![Parameter::default(); compiled.parameter_count()];
        Ok(Self {
            kind: StatementKind::classify(template),
            template: template.to_owned(),
            db,
            compiled,
            parameters,
            prepared_sql: None,
        })
    }

    #[must_use]
    pub fn database(&self) -> &Database {
        &self.db
    }

    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    #[must_use]
    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    #[must_use]
    pub fn compiled(&self) -> &CompiledStatement {
        &self.compiled
    }

    #[must_use]
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Bind parameter `index`; `SqlValue::Null` is allowed for any type.
    ///
    /// # Errors
    /// Returns `TrackerDbError::ParameterError` if `index` is out of range.
    pub fn bind(
        &mut self,
        index: usize,
        data_type: SqlDataType,
        value: SqlValue,
    ) -> Result<(), TrackerDbError> {
        let count = self.parameters.len();
        let parameter = self.parameters.get_mut(index).ok_or_else(|| {
            TrackerDbError::ParameterError(format!(
                "parameter index {index} out of range; statement has {count}"
            ))
        })?;
        parameter.data_type = Some(data_type);
        parameter.value = Some(value);
        self.prepared_sql = None;
        Ok(())
    }

    /// # Errors
    /// Returns `TrackerDbError::ParameterError` if `index` is out of range.
    pub fn set_int(&mut self, index: usize, value: Option<i64>) -> Result<(), TrackerDbError> {
        self.bind(index, SqlDataType::Integer, value.into())
    }

    /// # Errors
    /// Returns `TrackerDbError::ParameterError` if `index` is out of range.
    pub fn set_real(&mut self, index: usize, value: Option<f64>) -> Result<(), TrackerDbError> {
        self.bind(index, SqlDataType::Real, value.into())
    }

    /// # Errors
    /// Returns `TrackerDbError::ParameterError` if `index` is out of range.
    pub fn set_string(&mut self, index: usize, value: Option<&str>) -> Result<(), TrackerDbError> {
        self.bind(index, SqlDataType::String, value.into())
    }

    /// # Errors
    /// Returns `TrackerDbError::ParameterError` if `index` is out of range.
    pub fn set_bool(&mut self, index: usize, value: Option<bool>) -> Result<(), TrackerDbError> {
        self.bind(index, SqlDataType::Boolean, value.into())
    }

    /// # Errors
    /// Returns `TrackerDbError::ParameterError` if `index` is out of range.
    pub fn set_timestamp(
        &mut self,
        index: usize,
        value: Option<NaiveDateTime>,
    ) -> Result<(), TrackerDbError> {
        self.bind(index, SqlDataType::Timestamp, value.into())
    }

    /// Bind an already-typed value, inferring the declared type from it.
    ///
    /// # Errors
    /// Returns `TrackerDbError::ParameterError` if `index` is out of range or the
    /// value is a blob.
    pub fn set_value(&mut self, index: usize, value: SqlValue) -> Result<(), TrackerDbError> {
        let data_type = match &value {
            SqlValue::Int(_) => SqlDataType::Integer,
            SqlValue::Float(_) => SqlDataType::Real,
            SqlValue::Text(_) | SqlValue::Null => SqlDataType::String,
            SqlValue::Bool(_) => SqlDataType::Boolean,
            SqlValue::Timestamp(_) => SqlDataType::Timestamp,
            SqlValue::Blob(_) => {
                return Err(TrackerDbError::ParameterError(
                    "blob parameters are not supported".into(),
                ));
            }
        };
        self.bind(index, data_type, value)
    }

    /// Binding by name is not supported; placeholders are positional.
    ///
    /// # Errors
    /// Always returns `TrackerDbError::Unimplemented`.
    pub fn set_by_name(&mut self, name: &str, _value: SqlValue) -> Result<(), TrackerDbError> {
        Err(TrackerDbError::Unimplemented(format!(
            "binding parameter {name:?} by name"
        )))
    }

    /// Whether prepared text is currently cached.
    #[must_use]
    pub fn has_prepared_sql(&self) -> bool {
        self.prepared_sql.is_some()
    }

    /// The engine SQL with every parameter resolved. Computed on first use after
    /// a (re)bind and cached until the next bind.
    ///
    /// # Errors
    /// Returns `TrackerDbError::ParameterError` if a parameter is unbound, or a
    /// formatting error from the dialect.
    pub fn prepared_sql(&mut self) -> Result<&str, TrackerDbError> {
        if self.prepared_sql.is_none() {
            let mut values = Vec::with_capacity(self.parameters.len());
            for (slot, parameter) in self.compiled.parameter_slots().iter().zip(&self.parameters) {
                let value = parameter.value.clone().ok_or_else(|| {
                    TrackerDbError::ParameterError(format!(
                        "parameter {} (offset {}) is not bound",
                        slot.index, slot.offset
                    ))
                })?;
                values.push(value);
            }
            let sql = self.compiled.to_sql(&values, &self.db.config().dialect)?;
            self.prepared_sql = Some(sql);
        }
        Ok(self.prepared_sql.as_deref().unwrap_or_default())
    }

    /// Execute against the owning database.
    ///
    /// # Errors
    /// Returns `TrackerDbError` if preparation fails, the database is closed or
    /// the engine fails.
    pub fn execute(&mut self) -> Result<ExecuteOutcome, TrackerDbError> {
        let kind = self.kind;
        let db = self.db.clone();
        let sql = self.prepared_sql()?;
        db.run_sql(sql, kind)
    }

    /// Execute an INSERT, returning the assigned row id if any.
    ///
    /// # Errors
    /// Returns `TrackerDbError::ExecutionError` if this is not an INSERT.
    pub fn execute_insert(&mut self) -> Result<Option<Oid>, TrackerDbError> {
        match self.expect_kind(StatementKind::Insert)?.execute()? {
            ExecuteOutcome::Inserted(oid) => Ok(oid),
            other => Err(unexpected_outcome(&other)),
        }
    }

    /// Execute a SELECT.
    ///
    /// # Errors
    /// Returns `TrackerDbError::ExecutionError` if this is not a SELECT.
    pub fn execute_query(&mut self) -> Result<RecordSet, TrackerDbError> {
        match self.expect_kind(StatementKind::Select)?.execute()? {
            ExecuteOutcome::Records(records) => Ok(records),
            other => Err(unexpected_outcome(&other)),
        }
    }

    /// Execute an UPDATE/DELETE/DDL statement, returning the affected-row count.
    ///
    /// # Errors
    /// Returns `TrackerDbError::ExecutionError` if this is an INSERT or SELECT.
    pub fn execute_update(&mut self) -> Result<usize, TrackerDbError> {
        match self.expect_kind(StatementKind::Generic)?.execute()? {
            ExecuteOutcome::Affected(count) => Ok(count),
            other => Err(unexpected_outcome(&other)),
        }
    }

    fn expect_kind(&mut self, expected: StatementKind) -> Result<&mut Self, TrackerDbError> {
        if self.kind == expected {
            Ok(self)
        } else {
            Err(TrackerDbError::ExecutionError(format!(
                "expected a {expected:?} statement, got {:?}: {}",
                self.kind, self.template
            )))
        }
    }
}

fn unexpected_outcome(outcome: &ExecuteOutcome) -> TrackerDbError {
    TrackerDbError::ExecutionError(format!("engine returned an unexpected outcome: {outcome:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::test_utils::ScriptedEngine;

    fn db() -> Database {
        Database::new(ScriptedEngine::new(), DatabaseConfig::default())
    }

    #[test]
    fn classifies_leading_keyword() {
        assert_eq!(StatementKind::classify("  insert into t values (1)"), StatementKind::Insert);
        assert_eq!(StatementKind::classify("\nSelect 1"), StatementKind::Select);
        assert_eq!(StatementKind::classify("SELECTED"), StatementKind::Generic);
        assert_eq!(StatementKind::classify("UPDATE t SET a = 1"), StatementKind::Generic);
        assert_eq!(StatementKind::classify(""), StatementKind::Generic);
    }

    #[test]
    fn bracket_template_compiles_to_default_quoting() {
        let db = db();
        let mut stmt = db.create_statement("SELECT * FROM [t] WHERE [c] = ?").unwrap();
        stmt.set_string(0, Some("x")).unwrap();
        assert_eq!(stmt.prepared_sql().unwrap(), r#"SELECT * FROM "t" WHERE "c" = 'x'"#);
    }

    #[test]
    fn prepared_sql_is_cached_until_rebind() {
        let db = db();
        let mut stmt = db.create_statement("UPDATE t SET a = ? WHERE b = ?").unwrap();
        stmt.set_int(0, Some(1)).unwrap();
        stmt.set_bool(1, Some(false)).unwrap();
        assert!(!stmt.has_prepared_sql());
        let first = stmt.prepared_sql().unwrap().to_owned();
        assert!(stmt.has_prepared_sql());
        assert_eq!(stmt.prepared_sql().unwrap(), first);

        stmt.set_int(0, Some(2)).unwrap();
        assert!(!stmt.has_prepared_sql());
        let second = stmt.prepared_sql().unwrap().to_owned();
        assert_ne!(first, second);
        assert_eq!(second, "UPDATE t SET a = 2 WHERE b = 'N'");
    }

    #[test]
    fn null_formats_for_every_type() {
        let db = db();
        let mut stmt = db.create_statement("INSERT INTO t VALUES (?, ?, ?, ?, ?)").unwrap();
        stmt.set_int(0, None).unwrap();
        stmt.set_real(1, None).unwrap();
        stmt.set_string(2, None).unwrap();
        stmt.set_bool(3, None).unwrap();
        stmt.set_timestamp(4, None).unwrap();
        assert_eq!(
            stmt.prepared_sql().unwrap(),
            "INSERT INTO t VALUES (NULL, NULL, NULL, NULL, NULL)"
        );
        assert_eq!(stmt.parameters()[3].data_type(), Some(SqlDataType::Boolean));
    }

    #[test]
    fn unbound_and_out_of_range_parameters() {
        let db = db();
        let mut stmt = db.create_statement("SELECT ? , ?").unwrap();
        stmt.set_int(0, Some(1)).unwrap();
        assert!(!stmt.parameters()[1].is_bound());
        assert!(matches!(
            stmt.prepared_sql(),
            Err(TrackerDbError::ParameterError(_))
        ));
        assert!(matches!(
            stmt.set_int(2, Some(1)),
            Err(TrackerDbError::ParameterError(_))
        ));
    }

    #[test]
    fn binding_by_name_is_unimplemented() {
        let db = db();
        let mut stmt = db.create_statement("SELECT ?").unwrap();
        assert!(stmt.parameters()[0].name().is_none());
        assert!(matches!(
            stmt.set_by_name("id", SqlValue::Int(1)),
            Err(TrackerDbError::Unimplemented(_))
        ));
    }

    #[test]
    fn non_ascii_string_parameter_is_unimplemented() {
        let db = db();
        let mut stmt = db.create_statement("SELECT ?").unwrap();
        stmt.set_string(0, Some("naïve")).unwrap();
        assert!(matches!(
            stmt.prepared_sql(),
            Err(TrackerDbError::Unimplemented(_))
        ));
    }

    #[test]
    fn typed_execute_rejects_other_kinds() {
        let db = db();
        let mut stmt = db.create_statement("DELETE FROM t").unwrap();
        assert!(matches!(
            stmt.execute_query(),
            Err(TrackerDbError::ExecutionError(_))
        ));
        assert_eq!(stmt.execute_update().unwrap(), 1);
    }

    #[test]
    fn fully_bound_sql_has_no_placeholders_and_balanced_quotes() {
        let db = db();
        let mut stmt = db
            .create_statement("INSERT INTO [t] ([a], [b], [c]) VALUES (?, '?', ?)")
            .unwrap();
        stmt.set_string(0, Some("it's")).unwrap();
        stmt.set_string(1, Some("a?b")).unwrap();
        let sql = stmt.prepared_sql().unwrap().to_owned();
        let outside_quotes: String = sql
            .split('\'')
            .step_by(2)
            .collect::<Vec<_>>()
            .concat();
        assert!(!outside_quotes.contains('?'));
        assert_eq!(sql.matches('\'').count() % 2, 0);
        assert_eq!(sql.matches('"').count() % 2, 0);
    }
}
