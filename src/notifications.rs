use std::collections::VecDeque;

use crate::types::Oid;

/// A committed change to a stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Created {
        type_name: &'static str,
        oid: Oid,
    },
    Modified {
        type_name: &'static str,
        oid: Oid,
        property: &'static str,
    },
    Destroyed {
        type_name: &'static str,
        oid: Oid,
    },
}

impl Notification {
    #[must_use]
    pub fn oid(&self) -> Oid {
        match self {
            Notification::Created { oid, .. }
            | Notification::Modified { oid, .. }
            | Notification::Destroyed { oid, .. } => *oid,
        }
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Notification::Created { type_name, .. }
            | Notification::Modified { type_name, .. }
            | Notification::Destroyed { type_name, .. } => type_name,
        }
    }
}

/// Receives notifications drained from a database; every method defaults to a no-op.
pub trait NotificationHandler {
    fn on_created(&mut self, _type_name: &'static str, _oid: Oid) {}

    fn on_modified(&mut self, _type_name: &'static str, _oid: Oid, _property: &'static str) {}

    fn on_destroyed(&mut self, _type_name: &'static str, _oid: Oid) {}

    fn handle(&mut self, notification: &Notification) {
        match *notification {
            Notification::Created { type_name, oid } => self.on_created(type_name, oid),
            Notification::Modified {
                type_name,
                oid,
                property,
            } => self.on_modified(type_name, oid, property),
            Notification::Destroyed { type_name, oid } => self.on_destroyed(type_name, oid),
        }
    }
}

/// Staged notifications become visible only once their transaction commits.
#[derive(Debug, Default)]
pub(crate) struct NotificationQueue {
    staged: Vec<Notification>,
    published: VecDeque<Notification>,
}

impl NotificationQueue {
    pub(crate) fn stage(&mut self, notification: Notification, in_transaction: bool) {
        if in_transaction {
            self.staged.push(notification);
        } else {
            self.published.push_back(notification);
        }
    }

    pub(crate) fn publish_staged(&mut self) {
        self.published.extend(self.staged.drain(..));
    }

    pub(crate) fn discard_staged(&mut self) {
        self.staged.clear();
    }

    pub(crate) fn drain(&mut self) -> Vec<Notification> {
        self.published.drain(..).collect()
    }

    #[cfg(test)]
    pub(crate) fn pending(&self) -> usize {
        self.published.len()
    }
}
