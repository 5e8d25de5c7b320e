//! Engine-neutral SQL statements and stored-object proxies.
//!
//! Templates are written once with portable quoting (`'literal'`, `[identifier]`,
//! `?` placeholders) and rendered for a [`Dialect`]. A [`Database`] wraps one
//! [`SqlEngine`] adapter and adds transactions, an identity cache of
//! [`DatabaseObject`] proxies with TTL-bounded property caches, and a
//! commit-gated notification queue.
//!
//! ```rust
//! use tracker_sql::prelude::*;
//!
//! let statements = split_script("CREATE TABLE [t] ([c] TEXT); INSERT INTO [t] VALUES ('O''Brien')")?;
//! assert_eq!(statements.len(), 2);
//! # Ok::<(), TrackerDbError>(())
//! ```

pub mod activity_type;
pub mod clock;
pub mod config;
pub mod database;
pub mod dialect;
pub mod engine;
pub mod error;
pub mod notifications;
pub mod object;
pub mod prelude;
pub mod results;
pub mod statement;
pub mod translation;
pub mod types;
pub mod user;
pub mod validation;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use activity_type::ActivityType;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{DatabaseConfig, DatabaseConfigBuilder};
pub use database::Database;
pub use dialect::{Dialect, DialectKind, LiteralEscapes};
pub use engine::SqlEngine;
pub use error::{ParseError, TrackerDbError};
pub use notifications::{Notification, NotificationHandler};
pub use object::{DatabaseObject, ObjectSchema};
pub use results::{ColumnKey, Record, RecordSet};
pub use statement::{ExecuteOutcome, Statement, StatementKind};
pub use types::{Oid, SqlDataType, SqlValue};
pub use user::User;
