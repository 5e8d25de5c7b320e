use crate::database::Database;
use crate::error::TrackerDbError;
use crate::notifications::Notification;
use crate::object::{DatabaseObject, ObjectSchema};
use crate::types::{Oid, SqlDataType, SqlValue};
use crate::validation::{UserValidator, Validator};

pub static USER_SCHEMA: ObjectSchema = ObjectSchema {
    type_name: UserValidator::TYPE_NAME,
    table: "users",
    key_column: "pk",
    columns: &[
        "pk",
        "enabled",
        "real_name",
        "inactivity_timeout",
        "email_addresses",
    ],
    registry_table: Some("objects"),
};

/// A person known to the tracker.
#[derive(Debug, Clone)]
pub struct User {
    object: DatabaseObject,
}

// e-mail addresses are stored newline-separated, NULL when there are none
fn join_addresses(addresses: &[String]) -> SqlValue {
    if addresses.is_empty() {
        SqlValue::Null
    } else {
        SqlValue::Text(addresses.join("\n"))
    }
}

impl User {
    pub const TYPE_NAME: &'static str = UserValidator::TYPE_NAME;

    /// # Errors
    /// Returns `TrackerDbError::InvalidProperty` before touching the engine if
    /// any value is invalid, or any engine error (after rollback).
    pub fn create(
        db: &Database,
        real_name: &str,
        enabled: bool,
        inactivity_timeout: Option<u32>,
        email_addresses: &[String],
    ) -> Result<Self, TrackerDbError> {
        UserValidator::real_name(real_name)?;
        UserValidator::inactivity_timeout(inactivity_timeout)?;
        UserValidator::email_addresses(email_addresses)?;

        db.transaction(|db| {
            let mut stmt =
                db.create_statement("INSERT INTO [objects] ([object_type_name]) VALUES (?)")?;
            stmt.set_string(0, Some(Self::TYPE_NAME))?;
            let oid = stmt.execute_insert()?.ok_or_else(|| {
                TrackerDbError::ExecutionError("engine assigned no oid".into())
            })?;

            let mut stmt = db.create_statement(
                "INSERT INTO [users] ([pk], [enabled], [real_name], [inactivity_timeout], [email_addresses]) \
                 VALUES (?, ?, ?, ?, ?)",
            )?;
            stmt.set_int(0, Some(oid))?;
            stmt.set_bool(1, Some(enabled))?;
            stmt.set_string(2, Some(real_name))?;
            stmt.set_int(3, inactivity_timeout.map(i64::from))?;
            stmt.bind(4, SqlDataType::String, join_addresses(email_addresses))?;
            stmt.execute_insert()?;

            let user = Self::get(db, oid)?;
            db.stage_notification(Notification::Created {
                type_name: Self::TYPE_NAME,
                oid,
            });
            Ok(user)
        })
    }

    /// # Errors
    /// Returns `TrackerDbError::DatabaseClosed`, or `ExecutionError` if `oid`
    /// is live as a different type.
    pub fn get(db: &Database, oid: Oid) -> Result<Self, TrackerDbError> {
        db.object(oid, &USER_SCHEMA).map(|object| Self { object })
    }

    #[must_use]
    pub fn oid(&self) -> Oid {
        self.object.oid()
    }

    #[must_use]
    pub fn object(&self) -> &DatabaseObject {
        &self.object
    }

    /// # Errors
    /// Returns `TrackerDbError::ObjectDead` if the row is gone.
    pub fn enabled(&self) -> Result<bool, TrackerDbError> {
        let value = self
            .object
            .get_or_reload("enabled")?
            .convert(SqlDataType::Boolean)?;
        Ok(value.as_bool().unwrap_or(false))
    }

    /// # Errors
    /// Returns `TrackerDbError::ObjectDead` if the row is gone.
    pub fn real_name(&self) -> Result<String, TrackerDbError> {
        let value = self.object.get_or_reload("real_name")?;
        Ok(value.as_text().unwrap_or_default().to_owned())
    }

    /// # Errors
    /// Returns `TrackerDbError::ObjectDead` if the row is gone.
    pub fn inactivity_timeout(&self) -> Result<Option<u32>, TrackerDbError> {
        let value = self
            .object
            .get_or_reload("inactivity_timeout")?
            .convert(SqlDataType::Integer)?;
        Ok(value.as_int().and_then(|t| u32::try_from(t).ok()))
    }

    /// # Errors
    /// Returns `TrackerDbError::ObjectDead` if the row is gone.
    pub fn email_addresses(&self) -> Result<Vec<String>, TrackerDbError> {
        let value = self.object.get_or_reload("email_addresses")?;
        Ok(value
            .as_text()
            .map(|text| text.split('\n').map(str::to_owned).collect())
            .unwrap_or_default())
    }

    /// # Errors
    /// Returns `TrackerDbError::ObjectDead` if the row is gone.
    pub fn set_enabled(&self, enabled: bool) -> Result<(), TrackerDbError> {
        self.object.set_property("enabled", SqlValue::Bool(enabled))
    }

    /// # Errors
    /// Returns `TrackerDbError::InvalidProperty` or `ObjectDead`.
    pub fn set_real_name(&self, real_name: &str) -> Result<(), TrackerDbError> {
        UserValidator::real_name(real_name)?;
        self.object.set_property("real_name", real_name.into())
    }

    /// # Errors
    /// Returns `TrackerDbError::InvalidProperty` or `ObjectDead`.
    pub fn set_inactivity_timeout(&self, timeout: Option<u32>) -> Result<(), TrackerDbError> {
        UserValidator::inactivity_timeout(timeout)?;
        self.object
            .set_property("inactivity_timeout", timeout.map(i64::from).into())
    }

    /// # Errors
    /// Returns `TrackerDbError::InvalidProperty` or `ObjectDead`.
    pub fn set_email_addresses(&self, addresses: &[String]) -> Result<(), TrackerDbError> {
        UserValidator::email_addresses(addresses)?;
        self.object
            .set_property("email_addresses", join_addresses(addresses))
    }

    /// # Errors
    /// Returns `TrackerDbError::ObjectDead` if already destroyed.
    pub fn destroy(&self) -> Result<(), TrackerDbError> {
        self.object.destroy()
    }
}
