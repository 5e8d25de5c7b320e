use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::engine::SqlEngine;
use crate::error::TrackerDbError;
use crate::results::RecordSet;
use crate::statement::{ExecuteOutcome, StatementKind};
use crate::types::Oid;

/// Everything the fake engine was asked to do, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Begin,
    Commit,
    Rollback,
    Execute { sql: String, kind: StatementKind },
    Close,
}

/// Shared view of a [`ScriptedEngine`]'s event log, usable after the engine
/// has been moved into a `Database`.
#[derive(Debug, Clone, Default)]
pub struct EngineLog(Rc<RefCell<Vec<EngineEvent>>>);

impl EngineLog {
    fn push(&self, event: EngineEvent) {
        self.0.borrow_mut().push(event);
    }

    #[must_use]
    pub fn events(&self) -> Vec<EngineEvent> {
        self.0.borrow().clone()
    }

    /// The SQL text of every executed statement.
    #[must_use]
    pub fn executed(&self) -> Vec<String> {
        self.0
            .borrow()
            .iter()
            .filter_map(|event| match event {
                EngineEvent::Execute { sql, .. } => Some(sql.clone()),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn count_kind(&self, kind: StatementKind) -> usize {
        self.0
            .borrow()
            .iter()
            .filter(|event| matches!(event, EngineEvent::Execute { kind: k, .. } if *k == kind))
            .count()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

/// Decides the outcome of each executed statement.
pub type Responder = Box<dyn FnMut(&str, StatementKind) -> Result<ExecuteOutcome, TrackerDbError>>;

/// A [`SqlEngine`] that records calls instead of talking to a database.
///
/// By default inserts get increasing row ids starting at 1, selects return
/// an empty record set and everything else reports one affected row.
pub struct ScriptedEngine {
    log: EngineLog,
    responder: Option<Responder>,
    next_oid: Cell<Oid>,
    fail_rollback: bool,
}

impl Default for ScriptedEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ScriptedEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedEngine")
            .field("log", &self.log)
            .field("fail_rollback", &self.fail_rollback)
            .finish_non_exhaustive()
    }
}

impl ScriptedEngine {
    #[must_use]
    pub fn new() -> Self {
        Self {
            log: EngineLog::default(),
            responder: None,
            next_oid: Cell::new(1),
            fail_rollback: false,
        }
    }

    /// Replace the default outcomes.
    #[must_use]
    pub fn with_responder(
        mut self,
        responder: impl FnMut(&str, StatementKind) -> Result<ExecuteOutcome, TrackerDbError> + 'static,
    ) -> Self {
        self.responder = Some(Box::new(responder));
        self
    }

    /// Make every statement whose SQL contains `needle` fail with an engine error.
    #[must_use]
    pub fn failing_on(self, needle: &str) -> Self {
        let needle = needle.to_owned();
        let mut next_oid: Oid = 0;
        self.with_responder(move |sql, kind| {
            if sql.contains(&needle) {
                return Err(TrackerDbError::engine(format!("scripted failure: {sql}")));
            }
            Ok(match kind {
                StatementKind::Insert => {
                    next_oid += 1;
                    ExecuteOutcome::Inserted(Some(next_oid))
                }
                StatementKind::Select => ExecuteOutcome::Records(RecordSet::default()),
                StatementKind::Generic => ExecuteOutcome::Affected(1),
            })
        })
    }

    /// Make `rollback_transaction` fail.
    #[must_use]
    pub fn failing_rollback(mut self) -> Self {
        self.fail_rollback = true;
        self
    }

    #[must_use]
    pub fn log(&self) -> EngineLog {
        self.log.clone()
    }

    fn default_outcome(&self, kind: StatementKind) -> ExecuteOutcome {
        match kind {
            StatementKind::Insert => {
                let oid = self.next_oid.get();
                self.next_oid.set(oid + 1);
                ExecuteOutcome::Inserted(Some(oid))
            }
            StatementKind::Select => ExecuteOutcome::Records(RecordSet::default()),
            StatementKind::Generic => ExecuteOutcome::Affected(1),
        }
    }
}

impl SqlEngine for ScriptedEngine {
    fn begin_transaction(&mut self) -> Result<(), TrackerDbError> {
        self.log.push(EngineEvent::Begin);
        Ok(())
    }

    fn commit_transaction(&mut self) -> Result<(), TrackerDbError> {
        self.log.push(EngineEvent::Commit);
        Ok(())
    }

    fn rollback_transaction(&mut self) -> Result<(), TrackerDbError> {
        self.log.push(EngineEvent::Rollback);
        if self.fail_rollback {
            Err(TrackerDbError::engine("scripted rollback failure"))
        } else {
            Ok(())
        }
    }

    fn execute_sql(
        &mut self,
        sql: &str,
        kind: StatementKind,
    ) -> Result<ExecuteOutcome, TrackerDbError> {
        self.log.push(EngineEvent::Execute {
            sql: sql.to_owned(),
            kind,
        });
        match self.responder.as_mut() {
            Some(responder) => responder(sql, kind),
            None => Ok(self.default_outcome(kind)),
        }
    }

    fn close(&mut self) -> Result<(), TrackerDbError> {
        self.log.push(EngineEvent::Close);
        Ok(())
    }
}
