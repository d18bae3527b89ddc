//! Event ingress and change-log egress types, per spec §6: the shape the
//! manager feeds into [`crate::item_state::ItemState::refresh`], and the
//! record a session accumulates while dirty for the commit sweep.

use crate::ids::{ItemId, NodeId, Path, QName};
use crate::status::Status;

/// The kind of external change an [`Event`] reports.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EventKind {
    NodeAdded,
    NodeRemoved,
    PropertyAdded,
    PropertyChanged,
    PropertyRemoved,
    ChildReordered,
}

/// One externally observed change, fed to the affected workspace state's
/// `refresh`. `before_id` is populated only for `ChildReordered` (the id the
/// reordered child now precedes, or `None` for "moved to the end").
#[derive(Clone, Debug)]
pub struct Event {
    pub kind: EventKind,
    pub id: ItemId,
    pub name: QName,
    pub path: Path,
    pub before_id: Option<NodeId>,
}

impl Event {
    pub fn new(kind: EventKind, id: ItemId, name: QName, path: Path) -> Self {
        Self {
            kind,
            id,
            name,
            path,
            before_id: None,
        }
    }

    pub fn reorder(id: ItemId, name: QName, path: Path, before_id: Option<NodeId>) -> Self {
        Self {
            kind: EventKind::ChildReordered,
            id,
            name,
            path,
            before_id,
        }
    }
}

/// The ordered record of changes a session has accumulated since its last
/// commit or discard. Never reordered; entries are appended in the order
/// the underlying state transitions occurred.
#[derive(Clone, Debug, Default)]
pub struct ChangeLog {
    events: Vec<Event>,
}

impl ChangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    pub fn extend(&mut self, other: ChangeLog) {
        self.events.extend(other.events);
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

/// The result of driving a [`ChangeLog`] through commit: which ids settled
/// into which terminal-for-this-cycle status, so a caller can report what
/// happened without re-walking the item-state tree.
#[derive(Clone, Debug, Default)]
pub struct CommitOutcome {
    pub settled: Vec<(ItemId, Status)>,
}

impl CommitOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, id: ItemId, status: Status) {
        self.settled.push((id, status));
    }
}
