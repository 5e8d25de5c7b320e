use crate::database::Database;
use crate::error::TrackerDbError;
use crate::notifications::Notification;
use crate::object::{DatabaseObject, ObjectSchema};
use crate::types::{Oid, SqlDataType};
use crate::validation::{ActivityTypeValidator, Validator};

pub static ACTIVITY_TYPE_SCHEMA: ObjectSchema = ObjectSchema {
    type_name: ActivityTypeValidator::TYPE_NAME,
    table: "activity_types",
    key_column: "pk",
    columns: &["pk", "name", "description"],
    registry_table: Some("objects"),
};

/// A named kind of activity.
///
/// ```rust
/// use tracker_sql::prelude::*;
/// use tracker_sql::test_utils::ScriptedEngine;
///
/// let db = Database::new(ScriptedEngine::new(), DatabaseConfig::default());
/// let err = ActivityType::create(&db, "  padded", "").unwrap_err();
/// assert!(matches!(err, TrackerDbError::InvalidProperty { property: "name", .. }));
/// ```
#[derive(Debug, Clone)]
pub struct ActivityType {
    object: DatabaseObject,
}

impl ActivityType {
    pub const TYPE_NAME: &'static str = ActivityTypeValidator::TYPE_NAME;

    /// Insert a new activity type and queue a `Created` notification.
    ///
    /// # Errors
    /// Returns `TrackerDbError::InvalidProperty` before touching the engine if
    /// either value is invalid, or any engine error (after rollback).
    pub fn create(db: &Database, name: &str, description: &str) -> Result<Self, TrackerDbError> {
        ActivityTypeValidator::name(name)?;
        ActivityTypeValidator::description(description)?;

        db.transaction(|db| {
            let mut stmt =
                db.create_statement("INSERT INTO [objects] ([object_type_name]) VALUES (?)")?;
            stmt.set_string(0, Some(Self::TYPE_NAME))?;
            let oid = stmt.execute_insert()?.ok_or_else(|| {
                TrackerDbError::ExecutionError("engine assigned no oid".into())
            })?;

            let mut stmt = db.create_statement(
                "INSERT INTO [activity_types] ([pk], [name], [description]) VALUES (?, ?, ?)",
            )?;
            stmt.set_int(0, Some(oid))?;
            stmt.set_string(1, Some(name))?;
            stmt.set_string(2, Some(description))?;
            stmt.execute_insert()?;

            let activity_type = Self::get(db, oid)?;
            db.stage_notification(Notification::Created {
                type_name: Self::TYPE_NAME,
                oid,
            });
            Ok(activity_type)
        })
    }

    /// The proxy for `oid`; the row is not read until a property is.
    ///
    /// # Errors
    /// Returns `TrackerDbError::DatabaseClosed`, or `ExecutionError` if `oid`
    /// is live as a different type.
    pub fn get(db: &Database, oid: Oid) -> Result<Self, TrackerDbError> {
        db.object(oid, &ACTIVITY_TYPE_SCHEMA)
            .map(|object| Self { object })
    }

    /// Every stored activity type, in oid order.
    ///
    /// # Errors
    /// Returns `TrackerDbError` if the query fails.
    pub fn all(db: &Database) -> Result<Vec<Self>, TrackerDbError> {
        let records = db
            .create_statement("SELECT [pk] FROM [activity_types] ORDER BY [pk]")?
            .execute_query()?;
        records
            .iter()
            .map(|record| {
                let oid = record
                    .get_as(0usize, SqlDataType::Integer)?
                    .as_int()
                    .ok_or_else(|| TrackerDbError::ExecutionError("NULL activity type key".into()))?;
                Self::get(db, oid)
            })
            .collect()
    }

    /// Look an activity type up by its exact name.
    ///
    /// # Errors
    /// Returns `TrackerDbError::DoesNotExist` if no activity type has that name.
    pub fn find(db: &Database, name: &str) -> Result<Self, TrackerDbError> {
        let mut stmt =
            db.create_statement("SELECT [pk] FROM [activity_types] WHERE [name] = ?")?;
        stmt.set_string(0, Some(name))?;
        let records = stmt.execute_query()?;
        let oid = records
            .get(0)
            .map(|record| record.get_as(0usize, SqlDataType::Integer))
            .transpose()?
            .and_then(|value| value.as_int())
            .ok_or_else(|| TrackerDbError::DoesNotExist {
                kind: Self::TYPE_NAME,
                key: name.to_owned(),
            })?;
        Self::get(db, oid)
    }

    #[must_use]
    pub fn oid(&self) -> Oid {
        self.object.oid()
    }

    #[must_use]
    pub fn object(&self) -> &DatabaseObject {
        &self.object
    }

    #[must_use]
    pub fn is_live(&self) -> bool {
        self.object.is_live()
    }

    /// # Errors
    /// Returns `TrackerDbError::ObjectDead` if the row is gone.
    pub fn name(&self) -> Result<String, TrackerDbError> {
        let value = self.object.get_or_reload("name")?;
        Ok(value.as_text().unwrap_or_default().to_owned())
    }

    /// # Errors
    /// Returns `TrackerDbError::ObjectDead` if the row is gone.
    pub fn description(&self) -> Result<String, TrackerDbError> {
        let value = self.object.get_or_reload("description")?;
        Ok(value.as_text().unwrap_or_default().to_owned())
    }

    /// # Errors
    /// Returns `TrackerDbError::InvalidProperty` for an invalid name, or
    /// `ObjectDead` if the row is gone.
    pub fn set_name(&self, name: &str) -> Result<(), TrackerDbError> {
        ActivityTypeValidator::name(name)?;
        self.object.set_property("name", name.into())
    }

    /// # Errors
    /// Returns `TrackerDbError::InvalidProperty` for an invalid description, or
    /// `ObjectDead` if the row is gone.
    pub fn set_description(&self, description: &str) -> Result<(), TrackerDbError> {
        ActivityTypeValidator::description(description)?;
        self.object.set_property("description", description.into())
    }

    /// # Errors
    /// Returns `TrackerDbError::ObjectDead` if already destroyed.
    pub fn destroy(&self) -> Result<(), TrackerDbError> {
        self.object.destroy()
    }
}
