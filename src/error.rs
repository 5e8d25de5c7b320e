use thiserror::Error;

use crate::types::Oid;

/// Lexical failures found while compiling a template or splitting a script.
///
/// These are always raised before anything reaches the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("quote mismatch: {quote} opened at offset {offset} is never closed")]
    QuoteMismatch { quote: char, offset: usize },

    #[error("block comment opened at offset {offset} is never closed")]
    UnterminatedComment { offset: usize },

    #[error("unsupported character {character:?} in a string literal")]
    UnsupportedCharacter { character: char },
}

#[derive(Debug, Error)]
pub enum TrackerDbError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Parameter error: {0}")]
    ParameterError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error("The database is closed")]
    DatabaseClosed,

    #[error("A transaction is already active on this database")]
    TransactionAlreadyActive,

    #[error("No transaction is active on this database")]
    NoActiveTransaction,

    #[error("{type_name} {oid} is dead")]
    ObjectDead { type_name: &'static str, oid: Oid },

    #[error("Invalid {type_name}.{property}: {value:?}")]
    InvalidProperty {
        type_name: &'static str,
        property: &'static str,
        value: String,
    },

    #[error("Objects from different databases cannot be combined")]
    IncompatibleObject,

    #[error("{kind} {key} does not exist")]
    DoesNotExist { kind: &'static str, key: String },

    #[error("{original}; rollback also failed: {rollback}")]
    RollbackFailed {
        #[source]
        original: Box<TrackerDbError>,
        rollback: Box<TrackerDbError>,
    },

    #[error("Unimplemented feature: {0}")]
    Unimplemented(String),
}

impl TrackerDbError {
    /// Wrap any engine-side failure so driver error types never leak.
    pub fn engine(err: impl std::fmt::Display) -> Self {
        TrackerDbError::Engine(err.to_string())
    }

    #[must_use]
    pub fn is_object_dead(&self) -> bool {
        matches!(self, TrackerDbError::ObjectDead { .. })
    }
}
