use crate::database::Database;
use crate::error::TrackerDbError;

/// Tables backing the tracker's stored objects. Every object owns one row in
/// `objects`, which assigns its oid; the entity tables reuse that key.
pub const TRACKER_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS [objects] (
    [pk] INTEGER PRIMARY KEY AUTOINCREMENT,
    [object_type_name] VARCHAR(32) NOT NULL
);
CREATE TABLE IF NOT EXISTS [activity_types] (
    [pk] INTEGER NOT NULL PRIMARY KEY REFERENCES [objects]([pk]),
    [name] VARCHAR(127) NOT NULL UNIQUE,
    [description] TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS [users] (
    [pk] INTEGER NOT NULL PRIMARY KEY REFERENCES [objects]([pk]),
    [enabled] CHAR(1) NOT NULL,
    [real_name] VARCHAR(127) NOT NULL,
    [inactivity_timeout] INTEGER,
    [email_addresses] TEXT
);
";

/// Create the tracker tables if they are missing.
///
/// # Errors
/// Returns `TrackerDbError` if any DDL statement fails; nothing is created then.
pub fn install_schema(db: &Database) -> Result<usize, TrackerDbError> {
    db.execute_script(TRACKER_SCHEMA)
}
