use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, trace, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::DatabaseConfig;
use crate::engine::SqlEngine;
use crate::error::TrackerDbError;
use crate::notifications::{Notification, NotificationHandler, NotificationQueue};
use crate::object::{DatabaseObject, ObjectSchema, ObjectState};
use crate::statement::{ExecuteOutcome, Statement, StatementKind};
use crate::translation::split_script;
use crate::types::Oid;

/// Handle to one open database.
///
/// Cloning is cheap and every clone refers to the same engine, identity map and
/// notification queue. A `Database` is single-threaded; it is neither `Send`
/// nor `Sync`.
#[derive(Clone)]
pub struct Database {
    inner: Rc<DatabaseInner>,
}

struct DatabaseInner {
    config: DatabaseConfig,
    engine: RefCell<Box<dyn SqlEngine>>,
    clock: Rc<dyn Clock>,
    open: Cell<bool>,
    in_transaction: Cell<bool>,
    // weak so the map never keeps a proxy alive
    objects: RefCell<HashMap<Oid, Weak<ObjectState>>>,
    // destroyed inside the open transaction; they die when it commits
    doomed: RefCell<Vec<Weak<ObjectState>>>,
    notifications: RefCell<NotificationQueue>,
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("config", &self.inner.config)
            .field("open", &self.inner.open.get())
            .field("in_transaction", &self.inner.in_transaction.get())
            .field("live_objects", &self.live_object_count())
            .finish_non_exhaustive()
    }
}

impl Database {
    /// Wrap an engine adapter, using the system clock for cache expiry.
    pub fn new(engine: impl SqlEngine + 'static, config: DatabaseConfig) -> Self {
        Self::with_clock(engine, config, Rc::new(SystemClock))
    }

    /// Wrap an engine adapter with an explicit time source.
    pub fn with_clock(
        engine: impl SqlEngine + 'static,
        config: DatabaseConfig,
        clock: Rc<dyn Clock>,
    ) -> Self {
        Self {
            inner: Rc::new(DatabaseInner {
                config,
                engine: RefCell::new(Box::new(engine)),
                clock,
                open: Cell::new(true),
                in_transaction: Cell::new(false),
                objects: RefCell::new(HashMap::new()),
                doomed: RefCell::new(Vec::new()),
                notifications: RefCell::new(NotificationQueue::default()),
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &DatabaseConfig {
        &self.inner.config
    }

    pub(crate) fn clock(&self) -> &dyn Clock {
        self.inner.clock.as_ref()
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.inner.open.get()
    }

    #[must_use]
    pub fn in_transaction(&self) -> bool {
        self.inner.in_transaction.get()
    }

    /// Whether two handles refer to the same database.
    #[must_use]
    pub fn same_database(&self, other: &Database) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn ensure_open(&self) -> Result<(), TrackerDbError> {
        if self.is_open() {
            Ok(())
        } else {
            Err(TrackerDbError::DatabaseClosed)
        }
    }

    /// Compile `template` into a statement bound to this database.
    ///
    /// # Errors
    /// Returns `TrackerDbError::DatabaseClosed` or a parse error.
    pub fn create_statement(&self, template: &str) -> Result<Statement, TrackerDbError> {
        self.ensure_open()?;
        Statement::new(self.clone(), template.trim())
    }

    /// Run engine-native SQL as-is, without template translation.
    ///
    /// # Errors
    /// Returns `TrackerDbError` if the database is closed or the engine fails.
    pub fn execute_sql(&self, sql: &str) -> Result<usize, TrackerDbError> {
        match self.run_sql(sql, StatementKind::Generic)? {
            ExecuteOutcome::Affected(count) => Ok(count),
            ExecuteOutcome::Inserted(_) => Ok(1),
            ExecuteOutcome::Records(records) => Ok(records.len()),
        }
    }

    pub(crate) fn run_sql(
        &self,
        sql: &str,
        kind: StatementKind,
    ) -> Result<ExecuteOutcome, TrackerDbError> {
        self.ensure_open()?;
        debug!(?kind, sql, "executing");
        self.inner.engine.borrow_mut().execute_sql(sql, kind)
    }

    /// # Errors
    /// Returns `TrackerDbError::TransactionAlreadyActive` if one is open; nested
    /// transactions are not supported.
    pub fn begin_transaction(&self) -> Result<(), TrackerDbError> {
        self.ensure_open()?;
        if self.in_transaction() {
            return Err(TrackerDbError::TransactionAlreadyActive);
        }
        self.inner.engine.borrow_mut().begin_transaction()?;
        self.inner.in_transaction.set(true);
        debug!("transaction started");
        Ok(())
    }

    /// Commit, publish the notifications staged inside the transaction and kill
    /// the proxies destroyed in it.
    ///
    /// # Errors
    /// Returns `TrackerDbError::NoActiveTransaction` without an open transaction.
    /// If the engine fails to commit, the transaction stays open.
    pub fn commit_transaction(&self) -> Result<(), TrackerDbError> {
        self.ensure_open()?;
        if !self.in_transaction() {
            return Err(TrackerDbError::NoActiveTransaction);
        }
        self.inner.engine.borrow_mut().commit_transaction()?;
        self.inner.in_transaction.set(false);
        self.inner.notifications.borrow_mut().publish_staged();
        let doomed = self.inner.doomed.take();
        for state in doomed.iter().filter_map(Weak::upgrade) {
            DatabaseObject::from_state(state).mark_dead();
        }
        debug!("transaction committed");
        Ok(())
    }

    /// Roll back, drop staged notifications and invalidate every live
    /// proxy's property cache. The transaction is over even if the engine fails.
    ///
    /// # Errors
    /// Returns `TrackerDbError::NoActiveTransaction` without an open transaction,
    /// or the engine's rollback failure.
    pub fn rollback_transaction(&self) -> Result<(), TrackerDbError> {
        self.ensure_open()?;
        if !self.in_transaction() {
            return Err(TrackerDbError::NoActiveTransaction);
        }
        let result = self.inner.engine.borrow_mut().rollback_transaction();
        self.inner.in_transaction.set(false);
        self.inner.notifications.borrow_mut().discard_staged();
        self.inner.doomed.borrow_mut().clear();
        for object in self.live_objects() {
            object.invalidate_property_cache();
        }
        debug!(ok = result.is_ok(), "transaction rolled back");
        result
    }

    /// Run `f` inside a transaction: commit on `Ok`, roll back on `Err` and
    /// return the original error. If a transaction is already open, `f` joins it
    /// and the outer owner decides the outcome.
    ///
    /// # Errors
    /// Returns the error from `f`, a begin/commit failure, or
    /// `TrackerDbError::RollbackFailed` when the rollback fails too.
    pub fn transaction<T>(
        &self,
        f: impl FnOnce(&Database) -> Result<T, TrackerDbError>,
    ) -> Result<T, TrackerDbError> {
        if self.in_transaction() {
            return f(self);
        }
        self.begin_transaction()?;
        let outcome = f(self).and_then(|value| self.commit_transaction().map(|()| value));
        outcome.map_err(|original| self.rollback_after(original))
    }

    fn rollback_after(&self, original: TrackerDbError) -> TrackerDbError {
        match self.rollback_transaction() {
            Ok(()) => original,
            Err(rollback) => {
                warn!(%original, %rollback, "rollback failed");
                TrackerDbError::RollbackFailed {
                    original: Box::new(original),
                    rollback: Box::new(rollback),
                }
            }
        }
    }

    /// Run a `;`-separated script atomically, returning the number of statements
    /// executed. Every statement is lexed and prepared before the engine sees
    /// anything; an empty script touches nothing.
    ///
    /// # Errors
    /// Returns a parse error before any native call, the first failing
    /// statement's error after rollback, or `TrackerDbError::RollbackFailed`.
    pub fn execute_script(&self, script: &str) -> Result<usize, TrackerDbError> {
        self.ensure_open()?;
        let mut statements = split_script(script)?
            .iter()
            .map(|sql| self.create_statement(sql))
            .collect::<Result<Vec<_>, _>>()?;
        if statements.is_empty() {
            return Ok(0);
        }
        for statement in &mut statements {
            statement.prepared_sql()?;
        }
        self.transaction(|_| {
            for statement in &mut statements {
                statement.execute()?;
            }
            Ok(statements.len())
        })
    }

    /// The proxy for `oid`: the already-live one if any, otherwise a new one
    /// registered in the identity map. No I/O happens here.
    ///
    /// # Errors
    /// Returns `TrackerDbError::DatabaseClosed`, or `ExecutionError` if `oid` is
    /// live under a different type.
    pub fn object(
        &self,
        oid: Oid,
        schema: &'static ObjectSchema,
    ) -> Result<DatabaseObject, TrackerDbError> {
        self.ensure_open()?;
        let mut objects = self.inner.objects.borrow_mut();
        if let Some(state) = objects.get(&oid).and_then(Weak::upgrade) {
            let object = DatabaseObject::from_state(state);
            if object.type_name() != schema.type_name {
                return Err(TrackerDbError::ExecutionError(format!(
                    "object {oid} is a {}, not a {}",
                    object.type_name(),
                    schema.type_name
                )));
            }
            trace!(oid, type_name = schema.type_name, "identity map hit");
            return Ok(object);
        }
        let state = Rc::new(ObjectState::new(self.clone(), oid, schema));
        objects.insert(oid, Rc::downgrade(&state));
        trace!(oid, type_name = schema.type_name, "proxy registered");
        Ok(DatabaseObject::from_state(state))
    }

    /// Number of proxies currently alive.
    #[must_use]
    pub fn live_object_count(&self) -> usize {
        self.inner
            .objects
            .borrow()
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    fn live_objects(&self) -> Vec<DatabaseObject> {
        self.inner
            .objects
            .borrow()
            .values()
            .filter_map(Weak::upgrade)
            .map(DatabaseObject::from_state)
            .collect()
    }

    /// Drop the identity-map entry for `oid` if it no longer points at a live
    /// proxy, or at exactly `state`.
    pub(crate) fn forget_object(&self, oid: Oid, state: *const ObjectState) {
        // may run from a Drop while the map is already borrowed
        let Ok(mut objects) = self.inner.objects.try_borrow_mut() else {
            return;
        };
        let stale = objects
            .get(&oid)
            .is_some_and(|weak| weak.strong_count() == 0 || std::ptr::eq(weak.as_ptr(), state));
        if stale {
            objects.remove(&oid);
        }
    }

    /// Mark `object` dead once the open transaction commits, or right away
    /// outside a transaction. A rollback spares it.
    pub(crate) fn mark_dead_on_commit(&self, object: &DatabaseObject) {
        if self.in_transaction() {
            self.inner.doomed.borrow_mut().push(object.downgrade());
        } else {
            object.mark_dead();
        }
    }

    /// Queue a notification; it is held back until commit when a transaction is open.
    pub(crate) fn stage_notification(&self, notification: Notification) {
        let in_transaction = self.in_transaction();
        trace!(?notification, in_transaction, "notification staged");
        self.inner
            .notifications
            .borrow_mut()
            .stage(notification, in_transaction);
    }

    /// Drain the committed notifications in the order they were raised.
    #[must_use]
    pub fn take_notifications(&self) -> Vec<Notification> {
        self.inner.notifications.borrow_mut().drain()
    }

    /// Drain the committed notifications into `handler`, returning how many were delivered.
    pub fn dispatch_notifications(&self, handler: &mut impl NotificationHandler) -> usize {
        let notifications = self.take_notifications();
        for notification in &notifications {
            handler.handle(notification);
        }
        notifications.len()
    }

    /// Close the database. Every proxy is marked dead, an open transaction is
    /// abandoned and the engine is closed. Closing twice is a no-op.
    ///
    /// # Errors
    /// Returns the engine's close failure.
    pub fn close(&self) -> Result<(), TrackerDbError> {
        if !self.is_open() {
            return Ok(());
        }
        self.inner.open.set(false);
        let objects = self.live_objects();
        self.inner.objects.borrow_mut().clear();
        for object in &objects {
            object.mark_dead();
        }
        drop(objects);

        let mut engine = self.inner.engine.borrow_mut();
        if self.inner.in_transaction.replace(false) {
            if let Err(err) = engine.rollback_transaction() {
                warn!(%err, "rollback on close failed");
            }
        }
        self.inner.notifications.borrow_mut().discard_staged();
        self.inner.doomed.borrow_mut().clear();
        debug!("database closed");
        engine.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ObjectSchema;
    use crate::test_utils::{EngineEvent, ScriptedEngine};

    static THING: ObjectSchema = ObjectSchema {
        type_name: "Thing",
        table: "things",
        key_column: "pk",
        columns: &["pk", "label"],
        registry_table: None,
    };

    fn db() -> (Database, crate::test_utils::EngineLog) {
        let engine = ScriptedEngine::new();
        let log = engine.log();
        (Database::new(engine, DatabaseConfig::default()), log)
    }

    #[test]
    fn nested_begin_is_rejected() {
        let (db, _) = db();
        db.begin_transaction().unwrap();
        assert!(matches!(
            db.begin_transaction(),
            Err(TrackerDbError::TransactionAlreadyActive)
        ));
        db.commit_transaction().unwrap();
        assert!(matches!(
            db.commit_transaction(),
            Err(TrackerDbError::NoActiveTransaction)
        ));
        assert!(matches!(
            db.rollback_transaction(),
            Err(TrackerDbError::NoActiveTransaction)
        ));
    }

    #[test]
    fn transaction_helper_joins_an_open_transaction() {
        let (db, log) = db();
        db.begin_transaction().unwrap();
        db.transaction(|db| db.execute_sql("UPDATE t SET a = 1")).unwrap();
        assert!(db.in_transaction());
        db.rollback_transaction().unwrap();
        assert_eq!(
            log.events(),
            vec![
                EngineEvent::Begin,
                EngineEvent::Execute {
                    sql: "UPDATE t SET a = 1".into(),
                    kind: StatementKind::Generic
                },
                EngineEvent::Rollback,
            ]
        );
    }

    #[test]
    fn empty_script_skips_the_transaction() {
        let (db, log) = db();
        assert_eq!(db.execute_script(" ;; -- nothing\n").unwrap(), 0);
        assert!(log.events().is_empty());
    }

    #[test]
    fn script_parse_errors_happen_before_any_native_call() {
        let (db, log) = db();
        assert!(matches!(
            db.execute_script("INSERT INTO t VALUES (1); INSERT INTO t VALUES ('x)"),
            Err(TrackerDbError::Parse(_))
        ));
        assert!(matches!(
            db.execute_script("UPDATE t SET a = ?"),
            Err(TrackerDbError::ParameterError(_))
        ));
        assert!(log.events().is_empty());
    }

    #[test]
    fn identity_map_forgets_dropped_proxies() {
        let (db, _) = db();
        let a = db.object(5, &THING).unwrap();
        let b = db.object(5, &THING).unwrap();
        assert!(a.same_object(&b));
        assert_eq!(db.live_object_count(), 1);
        drop(a);
        drop(b);
        assert_eq!(db.live_object_count(), 0);
        assert!(db.inner.objects.borrow().is_empty());
    }

    #[test]
    fn close_is_idempotent_and_final() {
        let (db, log) = db();
        let object = db.object(1, &THING).unwrap();
        db.close().unwrap();
        db.close().unwrap();
        assert!(!object.is_live());
        assert!(matches!(
            db.create_statement("SELECT 1"),
            Err(TrackerDbError::DatabaseClosed)
        ));
        assert!(matches!(
            db.begin_transaction(),
            Err(TrackerDbError::DatabaseClosed)
        ));
        assert_eq!(log.events(), vec![EngineEvent::Close]);
    }
}
