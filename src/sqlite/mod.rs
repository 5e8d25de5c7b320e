// SQLite adapter, split into:
// - config: connection options and the builder that opens a `Database`
// - query: row extraction into `RecordSet`s
// - engine: the `SqlEngine` implementation over one rusqlite connection
// - schema: DDL for the tracker tables

pub mod config;
pub mod engine;
pub mod query;
pub mod schema;

pub use config::{SqliteOptions, SqliteOptionsBuilder};
pub use engine::SqliteEngine;
pub use query::build_record_set;
pub use schema::{TRACKER_SCHEMA, install_schema};
