use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use std::time::Instant;

use tracing::{trace, warn};

use crate::database::Database;
use crate::error::TrackerDbError;
use crate::notifications::Notification;
use crate::types::{Oid, SqlValue};

/// Static description of the table behind a proxy type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectSchema {
    pub type_name: &'static str,
    pub table: &'static str,
    pub key_column: &'static str,
    /// Writable columns; the key column is included.
    pub columns: &'static [&'static str],
    /// Shared `objects` table holding one row per stored object, keyed by the
    /// same oid. Rows there are deleted together with the entity row.
    pub registry_table: Option<&'static str>,
}

impl ObjectSchema {
    fn has_column(&self, column: &str) -> bool {
        self.columns.contains(&column)
    }
}

/// Column values copied from the row, trusted until `expires_at`.
#[derive(Debug, Clone, Default)]
pub struct PropertyCache {
    values: HashMap<String, SqlValue>,
    expires_at: Option<Instant>,
}

impl PropertyCache {
    #[must_use]
    pub fn is_fresh(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|expires_at| now < expires_at)
    }

    #[must_use]
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.values.get(column)
    }

    fn invalidate(&mut self) {
        self.expires_at = None;
    }
}

pub(crate) struct ObjectState {
    db: Database,
    oid: Oid,
    schema: &'static ObjectSchema,
    live: Cell<bool>,
    cache: RefCell<PropertyCache>,
}

impl ObjectState {
    pub(crate) fn new(db: Database, oid: Oid, schema: &'static ObjectSchema) -> Self {
        Self {
            db,
            oid,
            schema,
            live: Cell::new(true),
            cache: RefCell::new(PropertyCache::default()),
        }
    }
}

impl Drop for ObjectState {
    fn drop(&mut self) {
        self.db.forget_object(self.oid, std::ptr::from_ref(self));
    }
}

/// Proxy for one stored row.
///
/// Proxies are obtained from [`Database::object`], which guarantees that at
/// most one proxy per oid is alive at a time; clones share that identity.
#[derive(Clone)]
pub struct DatabaseObject {
    state: Rc<ObjectState>,
}

impl std::fmt::Debug for DatabaseObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseObject")
            .field("type_name", &self.type_name())
            .field("oid", &self.oid())
            .field("live", &self.is_live())
            .finish()
    }
}

impl DatabaseObject {
    pub(crate) fn from_state(state: Rc<ObjectState>) -> Self {
        Self { state }
    }

    #[must_use]
    pub fn oid(&self) -> Oid {
        self.state.oid
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.state.schema.type_name
    }

    #[must_use]
    pub fn schema(&self) -> &'static ObjectSchema {
        self.state.schema
    }

    #[must_use]
    pub fn database(&self) -> &Database {
        &self.state.db
    }

    /// A proxy dies when its row is found missing, when it is destroyed, or
    /// when its database closes; it never comes back.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.state.live.get()
    }

    /// Identity, not value, comparison.
    #[must_use]
    pub fn same_object(&self, other: &DatabaseObject) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }

    // a closed database has already killed every proxy
    fn ensure_live(&self) -> Result<(), TrackerDbError> {
        if !self.is_live() {
            return Err(self.dead());
        }
        self.database().ensure_open()
    }

    pub(crate) fn downgrade(&self) -> Weak<ObjectState> {
        Rc::downgrade(&self.state)
    }

    fn dead(&self) -> TrackerDbError {
        TrackerDbError::ObjectDead {
            type_name: self.type_name(),
            oid: self.oid(),
        }
    }

    pub(crate) fn mark_dead(&self) {
        if self.state.live.replace(false) {
            warn!(type_name = self.type_name(), oid = self.oid(), "proxy marked dead");
        }
        self.state.cache.borrow_mut().invalidate();
        self.database().forget_object(self.oid(), Rc::as_ptr(&self.state));
    }

    /// Force the next [`DatabaseObject::refresh_if_stale`] to reload.
    pub fn invalidate_property_cache(&self) {
        self.state.cache.borrow_mut().invalidate();
    }

    /// The cached value of `column` without touching the engine; `None` if the
    /// column has not been loaded.
    #[must_use]
    pub fn cached_property(&self, column: &str) -> Option<SqlValue> {
        self.state.cache.borrow().get(column).cloned()
    }

    /// Reload the row if the cache is empty or expired.
    ///
    /// # Errors
    /// Returns `TrackerDbError::ObjectDead` if the row is gone (the proxy stays
    /// dead from then on), or an engine error.
    pub fn refresh_if_stale(&self) -> Result<(), TrackerDbError> {
        self.ensure_live()?;
        let now = self.database().clock().now();
        if self.state.cache.borrow().is_fresh(now) {
            trace!(type_name = self.type_name(), oid = self.oid(), "property cache hit");
            return Ok(());
        }
        self.reload(now)
    }

    fn reload(&self, now: Instant) -> Result<(), TrackerDbError> {
        let schema = self.schema();
        let mut stmt = self.database().create_statement(&format!(
            "SELECT * FROM [{}] WHERE [{}] = ?",
            schema.table, schema.key_column
        ))?;
        stmt.set_int(0, Some(self.oid()))?;
        let records = stmt.execute_query()?;
        let Some(record) = records.get(0) else {
            self.mark_dead();
            return Err(self.dead());
        };
        let values = records
            .columns()
            .iter()
            .cloned()
            .zip(record.values().iter().cloned())
            .collect();
        let ttl = self.database().config().property_cache_ttl();
        *self.state.cache.borrow_mut() = PropertyCache {
            values,
            expires_at: Some(now + ttl),
        };
        trace!(type_name = self.type_name(), oid = self.oid(), "property cache reloaded");
        Ok(())
    }

    /// Refresh if stale, then read `column` from the cache.
    ///
    /// # Errors
    /// Returns `TrackerDbError::DoesNotExist` for a column the row does not
    /// have, or any [`DatabaseObject::refresh_if_stale`] error.
    pub fn get_or_reload(&self, column: &str) -> Result<SqlValue, TrackerDbError> {
        self.refresh_if_stale()?;
        self.cached_property(column)
            .ok_or_else(|| TrackerDbError::DoesNotExist {
                kind: "property",
                key: format!("{}.{column}", self.type_name()),
            })
    }

    /// Write one column and queue a `Modified` notification.
    ///
    /// # Errors
    /// Returns `TrackerDbError::DoesNotExist` for a column outside the schema,
    /// `ObjectDead` if the row is gone, or an engine error.
    pub fn set_property(&self, column: &'static str, value: SqlValue) -> Result<(), TrackerDbError> {
        self.ensure_live()?;
        let schema = self.schema();
        if !schema.has_column(column) || column == schema.key_column {
            return Err(TrackerDbError::DoesNotExist {
                kind: "property",
                key: format!("{}.{column}", schema.type_name),
            });
        }
        self.database().transaction(|db| {
            let mut stmt = db.create_statement(&format!(
                "UPDATE [{}] SET [{column}] = ? WHERE [{}] = ?",
                schema.table, schema.key_column
            ))?;
            stmt.set_value(0, value.clone())?;
            stmt.set_int(1, Some(self.oid()))?;
            if stmt.execute_update()? == 0 {
                self.mark_dead();
                return Err(self.dead());
            }
            self.state
                .cache
                .borrow_mut()
                .values
                .insert(column.to_owned(), value);
            db.stage_notification(Notification::Modified {
                type_name: schema.type_name,
                oid: self.oid(),
                property: column,
            });
            Ok(())
        })
    }

    /// Point `column` at another stored object.
    ///
    /// # Errors
    /// Returns `TrackerDbError::IncompatibleObject` if `target` belongs to a
    /// different database, `ObjectDead` if either side is dead, or any
    /// [`DatabaseObject::set_property`] error.
    pub fn set_reference(
        &self,
        column: &'static str,
        target: &DatabaseObject,
    ) -> Result<(), TrackerDbError> {
        if !self.database().same_database(target.database()) {
            return Err(TrackerDbError::IncompatibleObject);
        }
        target.ensure_live()?;
        self.set_property(column, SqlValue::Int(target.oid()))
    }

    /// Delete the row (and its registry row) and queue a `Destroyed`
    /// notification. The proxy dies when the transaction commits.
    ///
    /// # Errors
    /// Returns `TrackerDbError::ObjectDead` if the row was already gone, or an
    /// engine error.
    pub fn destroy(&self) -> Result<(), TrackerDbError> {
        self.ensure_live()?;
        let schema = self.schema();
        self.database().transaction(|db| {
            let mut stmt = db.create_statement(&format!(
                "DELETE FROM [{}] WHERE [{}] = ?",
                schema.table, schema.key_column
            ))?;
            stmt.set_int(0, Some(self.oid()))?;
            let deleted = stmt.execute_update()?;
            if let Some(registry) = schema.registry_table {
                let mut stmt = db.create_statement(&format!(
                    "DELETE FROM [{registry}] WHERE [{}] = ?",
                    schema.key_column
                ))?;
                stmt.set_int(0, Some(self.oid()))?;
                stmt.execute_update()?;
            }
            if deleted == 0 {
                self.mark_dead();
                return Err(self.dead());
            }
            db.stage_notification(Notification::Destroyed {
                type_name: schema.type_name,
                oid: self.oid(),
            });
            db.mark_dead_on_commit(self);
            Ok(())
        })
    }
}
