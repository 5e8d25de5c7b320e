//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::activity_type::ActivityType;
pub use crate::config::DatabaseConfig;
pub use crate::database::Database;
pub use crate::dialect::{Dialect, DialectKind, LiteralEscapes};
pub use crate::engine::SqlEngine;
pub use crate::error::{ParseError, TrackerDbError};
pub use crate::notifications::{Notification, NotificationHandler};
pub use crate::object::{DatabaseObject, ObjectSchema};
pub use crate::results::{ColumnKey, Record, RecordSet};
pub use crate::statement::{ExecuteOutcome, Statement, StatementKind};
pub use crate::translation::{CompiledStatement, compile_template, split_script};
pub use crate::types::{Oid, SqlDataType, SqlValue};
pub use crate::user::User;

#[cfg(feature = "sqlite")]
pub use crate::sqlite::{SqliteEngine, SqliteOptions, install_schema};
