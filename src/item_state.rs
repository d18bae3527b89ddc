//! The dual-layer item state: status, listener protocol, parent link,
//! overlayed link, path construction and the status-transition gate.
//!
//! Node-only data (child collection, property-name set, type names,
//! structural diffing) lives in [`crate::node_state`] as an extension of the
//! same `ItemState` type, following the tagged-variant design noted in
//! spec §9 in place of the source's class hierarchy: `ItemState` carries a
//! `Payload` tag instead of `NodeState`/`PropertyState` being separate types.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, Weak};

use crate::child_collection::ChildNodeEntries;
use crate::error::{Error, Result};
use crate::event::{ChangeLog, CommitOutcome, Event, EventKind};
use crate::ids::{malformed_path, ItemId, NodeId, Path, PathElement, PropertyId, QName};
use crate::listener::{ListenerSet, NodeStateListener, StatusChangeListener};
use crate::status::{validate_transition, Layer, Status};

/// Opaque node-type definition, set post-construction by the resolver.
/// Schema validation is out of scope; this only records the definition's
/// name for diagnostics and the `protected` flag some callers need.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeDefinition {
    pub name: QName,
    pub protected: bool,
}

/// Opaque property-type definition, set post-construction by the resolver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyDefinition {
    pub name: QName,
    pub multiple: bool,
    pub protected: bool,
}

/// A property value. Schema validation beyond this shape is out of scope;
/// the core only needs to store, diff, and hand values back unexamined.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    String(String),
    Long(i64),
    Double(f64),
    Boolean(bool),
    /// Opaque timestamp, not parsed or validated by the core.
    Date(String),
    Binary(Vec<u8>),
}

/// The child collection and property-name set are each held behind an `Arc`
/// so that `pull_from_overlayed` can share them with the overlayed twin by
/// cloning the `Arc` (a refcount bump, not a deep copy) and the first
/// mutation after sharing pays for a private copy via `Arc::make_mut` — the
/// copy-on-write discipline spec §3/§4.4 describes.
pub(crate) struct NodePayload {
    pub primary_type: Mutex<QName>,
    pub mixin_types: Mutex<Vec<QName>>,
    pub definition: Mutex<Option<Arc<NodeDefinition>>>,
    pub children: Mutex<Arc<ChildNodeEntries>>,
    pub property_names: Mutex<Arc<HashSet<QName>>>,
    pub node_listeners: ListenerSet<dyn NodeStateListener>,
}

pub(crate) struct PropertyPayload {
    pub values: Mutex<Vec<PropertyValue>>,
    pub definition: Mutex<Option<Arc<PropertyDefinition>>>,
}

pub(crate) enum Payload {
    Node(NodePayload),
    Property(PropertyPayload),
}

/// An item state: either a workspace state (the cache of what the server last
/// reported) or a session state (an editable overlay of a workspace state).
pub struct ItemState {
    id: ItemId,
    /// Name as seen from the parent's child collection / property-name set.
    /// The root node's name is the empty unqualified name.
    name: QName,
    is_workspace: bool,
    status: Mutex<Status>,
    /// Weak: the child -> parent edge must never keep the parent alive.
    parent: Mutex<Option<Weak<ItemState>>>,
    /// Strong: a session state owns a reference to its workspace twin.
    overlayed: Mutex<Option<Arc<ItemState>>>,
    listeners: ListenerSet<dyn StatusChangeListener>,
    payload: Payload,
    /// Lets an `&self` method (in particular the `StatusChangeListener`
    /// callback, which the trait signature hands us as `&self`) recover its
    /// own `Arc<Self>` to call the `self: &Arc<Self>` methods that drive
    /// recursive status transitions. Populated via `Arc::new_cyclic`, since
    /// `self: &Arc<Self>` is not part of Rust's stable arbitrary-self-types
    /// allowlist and so isn't available as a receiver directly.
    self_weak: Weak<ItemState>,
}

impl ItemState {
    fn new(
        id: ItemId,
        name: QName,
        is_workspace: bool,
        status: Status,
        payload: Payload,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            id,
            name,
            is_workspace,
            status: Mutex::new(status),
            parent: Mutex::new(None),
            overlayed: Mutex::new(None),
            listeners: ListenerSet::new(),
            payload,
            self_weak: weak.clone(),
        })
    }

    fn self_arc(&self) -> Arc<ItemState> {
        self.self_weak
            .upgrade()
            .expect("an ItemState always holds a strong reference to itself while reachable")
    }

    /// Creates a workspace node state, as the item-state factory would on
    /// first resolution.
    pub fn new_workspace_node(
        id: NodeId,
        name: QName,
        primary_type: QName,
        mixin_types: Vec<QName>,
    ) -> Arc<Self> {
        Self::new(
            ItemId::Node(id),
            name,
            true,
            Status::Existing,
            Payload::Node(NodePayload {
                primary_type: Mutex::new(primary_type),
                mixin_types: Mutex::new(mixin_types),
                definition: Mutex::new(None),
                children: Mutex::new(Arc::new(ChildNodeEntries::new())),
                property_names: Mutex::new(Arc::new(HashSet::new())),
                node_listeners: ListenerSet::new(),
            }),
        )
    }

    /// Creates a workspace property state.
    pub fn new_workspace_property(id: PropertyId, values: Vec<PropertyValue>) -> Arc<Self> {
        let name = id.name.clone();
        Self::new(
            ItemId::Property(id),
            name,
            true,
            Status::Existing,
            Payload::Property(PropertyPayload {
                values: Mutex::new(values),
                definition: Mutex::new(None),
            }),
        )
    }

    /// Creates a brand-new (status `New`) session node state with no
    /// overlayed workspace twin, as user code does when adding a child.
    pub fn new_session_node(
        id: NodeId,
        name: QName,
        primary_type: QName,
        mixin_types: Vec<QName>,
    ) -> Arc<Self> {
        Self::new(
            ItemId::Node(id),
            name,
            false,
            Status::New,
            Payload::Node(NodePayload {
                primary_type: Mutex::new(primary_type),
                mixin_types: Mutex::new(mixin_types),
                definition: Mutex::new(None),
                children: Mutex::new(Arc::new(ChildNodeEntries::new())),
                property_names: Mutex::new(Arc::new(HashSet::new())),
                node_listeners: ListenerSet::new(),
            }),
        )
    }

    /// Creates a brand-new (status `New`) session property state.
    pub fn new_session_property(id: PropertyId, values: Vec<PropertyValue>) -> Arc<Self> {
        let name = id.name.clone();
        Self::new(
            ItemId::Property(id),
            name,
            false,
            Status::New,
            Payload::Property(PropertyPayload {
                values: Mutex::new(values),
                definition: Mutex::new(None),
            }),
        )
    }

    /// Creates a session node state that immediately connects to its
    /// workspace twin, pulling a shared copy-on-write view of its data.
    pub fn new_session_node_overlaying(
        self_arc_name: QName,
        overlayed: &Arc<ItemState>,
    ) -> Result<Arc<Self>> {
        let node = overlayed.as_node()?;
        let id = match &overlayed.id {
            ItemId::Node(id) => id.clone(),
            ItemId::Property(_) => {
                return Err(Error::IllegalState(
                    "cannot overlay a property state as a node state".into(),
                ))
            }
        };
        let state = Self::new(
            ItemId::Node(id),
            self_arc_name,
            false,
            Status::Existing,
            Payload::Node(NodePayload {
                primary_type: Mutex::new(node.primary_type.lock().unwrap().clone()),
                mixin_types: Mutex::new(node.mixin_types.lock().unwrap().clone()),
                definition: Mutex::new(node.definition.lock().unwrap().clone()),
                children: Mutex::new(Arc::new(ChildNodeEntries::new())),
                property_names: Mutex::new(Arc::new(HashSet::new())),
                node_listeners: ListenerSet::new(),
            }),
        );
        state.connect(overlayed.clone())?;
        Ok(state)
    }

    pub fn id(&self) -> &ItemId {
        &self.id
    }

    pub fn name(&self) -> &QName {
        &self.name
    }

    pub fn is_workspace(&self) -> bool {
        self.is_workspace
    }

    pub fn is_node(&self) -> bool {
        matches!(self.payload, Payload::Node(_))
    }

    fn layer(&self) -> Layer {
        if self.is_workspace {
            Layer::Workspace
        } else {
            Layer::Session
        }
    }

    pub(crate) fn as_node(&self) -> Result<&NodePayload> {
        match &self.payload {
            Payload::Node(n) => Ok(n),
            Payload::Property(_) => Err(Error::IllegalState(format!(
                "{} is a property state, not a node state",
                self.id
            ))),
        }
    }

    pub(crate) fn as_property(&self) -> Result<&PropertyPayload> {
        match &self.payload {
            Payload::Property(p) => Ok(p),
            Payload::Node(_) => Err(Error::IllegalState(format!(
                "{} is a node state, not a property state",
                self.id
            ))),
        }
    }

    pub fn status(&self) -> Status {
        *self.status.lock().expect("status lock poisoned")
    }

    pub fn parent(&self) -> Option<Arc<ItemState>> {
        self.parent
            .lock()
            .expect("parent lock poisoned")
            .as_ref()
            .and_then(Weak::upgrade)
    }

    pub fn set_parent(&self, parent: Option<&Arc<ItemState>>) {
        *self.parent.lock().expect("parent lock poisoned") = parent.map(Arc::downgrade);
    }

    pub fn overlayed(&self) -> Option<Arc<ItemState>> {
        self.overlayed.lock().expect("overlayed lock poisoned").clone()
    }

    /// Registers a status-change listener, weakly.
    pub fn add_status_listener(&self, listener: Weak<dyn StatusChangeListener>) {
        self.listeners.add(listener);
    }

    pub fn remove_status_listener(&self, listener: &Weak<dyn StatusChangeListener>) {
        self.listeners.remove(listener);
    }

    /// The `setStatus` contract of spec §4.3: no-op if unchanged, reject from
    /// a terminal status, validate against the layer's transition table,
    /// update, snapshot-then-notify outside the lock, then collapse the
    /// transient `Modified` pulse back to `Existing`.
    pub fn set_status(self: &Arc<Self>, new: Status) -> Result<()> {
        let previous = {
            let mut guard = self.status.lock().expect("status lock poisoned");
            let previous = *guard;
            if previous == new {
                return Ok(());
            }
            if previous.is_terminal() {
                return Err(Error::IllegalState(format!(
                    "{} is in terminal status {previous}, cannot transition to {new}",
                    self.id
                )));
            }
            validate_transition(self.layer(), previous, new)?;
            *guard = new;
            previous
        };

        log::trace!("{} status {previous} -> {new}", self.id);
        self.notify_status_changed(previous);

        if new == Status::Modified {
            let mut guard = self.status.lock().expect("status lock poisoned");
            if *guard == Status::Modified {
                *guard = Status::Existing;
            }
        }
        Ok(())
    }

    fn notify_status_changed(self: &Arc<Self>, previous: Status) {
        for listener in self.listeners.snapshot() {
            listener.status_changed(self, previous);
        }
    }

    /// `connect(overlayed)`: one-shot — legal only on a session state
    /// targeting a workspace state, rebinding to a different workspace state
    /// is rejected, re-connecting to the same target is a no-op.
    pub fn connect(self: &Arc<Self>, overlayed: Arc<ItemState>) -> Result<()> {
        if self.is_workspace {
            return Err(Error::IllegalState(
                "connect is only valid on a session state".into(),
            ));
        }
        if !overlayed.is_workspace {
            return Err(Error::IllegalState(
                "a session state can only connect to a workspace state".into(),
            ));
        }

        let already = {
            let guard = self.overlayed.lock().expect("overlayed lock poisoned");
            guard.clone()
        };

        match already {
            Some(existing) if Arc::ptr_eq(&existing, &overlayed) => {
                log::debug!("{} connect is a no-op (already connected)", self.id);
                Ok(())
            }
            Some(_) => {
                log::debug!("{} rejected rebinding to a different workspace state", self.id);
                Err(Error::IllegalState(format!(
                    "{} is already connected to a different workspace state",
                    self.id
                )))
            }
            None => {
                *self.overlayed.lock().expect("overlayed lock poisoned") = Some(overlayed.clone());
                overlayed
                    .listeners
                    .add(Arc::downgrade(self) as Weak<dyn StatusChangeListener>);
                self.pull_from_overlayed(&overlayed)?;
                log::debug!("{} connected to workspace state", self.id);
                Ok(())
            }
        }
    }

    /// Re-synchronizes this session state's owned data from its overlayed
    /// workspace twin by cloning the `Arc` handle to each collection — a
    /// refcount bump, not a deep copy. Either twin's first mutation after
    /// this call pays for a private copy via `Arc::make_mut`.
    fn pull_from_overlayed(&self, overlayed: &ItemState) -> Result<()> {
        match (&self.payload, &overlayed.payload) {
            (Payload::Node(mine), Payload::Node(theirs)) => {
                *mine.primary_type.lock().unwrap() = theirs.primary_type.lock().unwrap().clone();
                *mine.mixin_types.lock().unwrap() = theirs.mixin_types.lock().unwrap().clone();
                *mine.definition.lock().unwrap() = theirs.definition.lock().unwrap().clone();

                *mine.children.lock().unwrap() = Arc::clone(&theirs.children.lock().unwrap());
                *mine.property_names.lock().unwrap() =
                    Arc::clone(&theirs.property_names.lock().unwrap());
                Ok(())
            }
            (Payload::Property(mine), Payload::Property(theirs)) => {
                *mine.values.lock().unwrap() = theirs.values.lock().unwrap().clone();
                *mine.definition.lock().unwrap() = theirs.definition.lock().unwrap().clone();
                Ok(())
            }
            _ => Err(Error::IllegalState(
                "cannot connect a node state to a property state or vice versa".into(),
            )),
        }
    }

    /// Re-synchronizes from the connected workspace twin. A no-op (returns
    /// `Ok`) if there is no overlayed state.
    pub fn resync(&self) -> Result<()> {
        let overlayed = self.overlayed();
        match overlayed {
            Some(overlayed) => self.pull_from_overlayed(&overlayed),
            None => Ok(()),
        }
    }

    /// Reacts to a status change observed on the connected workspace twin.
    /// Only the combinations named in spec §4.3/§8 are handled; anything
    /// else is deliberately a no-op rather than an invented transition.
    fn react_to_overlayed_status_change(self: &Arc<Self>, workspace_status: Status) {
        let mine = self.status();
        match (mine, workspace_status) {
            (Status::ExistingModified, Status::Removed) => {
                let _ = self.set_status(Status::StaleDestroyed);
            }
            (Status::ExistingModified, Status::Modified) => {
                let _ = self.set_status(Status::StaleModified);
            }
            (Status::Existing, Status::Modified) | (Status::Invalidated, Status::Modified) => {
                let _ = self.resync();
                let _ = self.set_status(Status::Modified);
            }
            (Status::Existing, Status::Invalidated) => {
                let _ = self.set_status(Status::Invalidated);
            }
            _ => {}
        }
    }

    /// Feeds an externally observed change into this workspace state: it
    /// mutates its own data per the event, then transitions status
    /// (typically a `Modified` pulse, or `Removed` for a self-destruct
    /// event). Valid only on a workspace state. On a mutation failure the
    /// state is left at its pre-refresh status and the error propagates —
    /// refresh never leaves a state in an intermediate status.
    pub fn refresh(self: &Arc<Self>, event: &Event) -> Result<()> {
        if !self.is_workspace {
            return Err(Error::IllegalState(
                "refresh is only valid on a workspace state".into(),
            ));
        }
        log::debug!("{} refresh: {:?}", self.id, event.kind);
        match self.apply_refresh_event(event) {
            Ok(Some(new_status)) => self.set_status(new_status),
            Ok(None) => Ok(()),
            Err(e) => {
                log::warn!("{} refresh failed: {e}", self.id);
                Err(e)
            }
        }
    }

    /// Mutates this state's payload per `event` and reports the status it
    /// should transition to, without performing the transition itself (so
    /// `refresh` can keep status unchanged on error).
    fn apply_refresh_event(&self, event: &Event) -> Result<Option<Status>> {
        if event.id == self.id {
            return match event.kind {
                EventKind::NodeRemoved | EventKind::PropertyRemoved => Ok(Some(Status::Removed)),
                EventKind::PropertyChanged => Ok(Some(Status::Modified)),
                _ => Ok(None),
            };
        }

        let node = match &self.payload {
            Payload::Node(node) => node,
            Payload::Property(_) => {
                return Err(Error::IllegalState(format!(
                    "{} is a property state and cannot receive a structural refresh event about {}",
                    self.id, event.id
                )))
            }
        };

        match event.kind {
            EventKind::NodeAdded => {
                let ItemId::Node(child_id) = &event.id else {
                    return Err(Error::IllegalArgument(
                        "NodeAdded event id must be a node id".into(),
                    ));
                };
                let mut children = node.children.lock().unwrap();
                Arc::make_mut(&mut children).add(event.name.clone(), child_id.clone());
                Ok(Some(Status::Modified))
            }
            EventKind::NodeRemoved => {
                let ItemId::Node(child_id) = &event.id else {
                    return Err(Error::IllegalArgument(
                        "NodeRemoved event id must be a node id".into(),
                    ));
                };
                let mut children = node.children.lock().unwrap();
                Arc::make_mut(&mut children).remove_by_id(child_id);
                Ok(Some(Status::Modified))
            }
            EventKind::ChildReordered => {
                let ItemId::Node(child_id) = &event.id else {
                    return Err(Error::IllegalArgument(
                        "ChildReordered event id must be a node id".into(),
                    ));
                };
                let mut children = node.children.lock().unwrap();
                Arc::make_mut(&mut children).move_before(child_id, event.before_id.as_ref());
                Ok(Some(Status::Modified))
            }
            EventKind::PropertyAdded => {
                let mut names = node.property_names.lock().unwrap();
                Arc::make_mut(&mut names).insert(event.name.clone());
                Ok(Some(Status::Modified))
            }
            EventKind::PropertyRemoved => {
                let mut names = node.property_names.lock().unwrap();
                Arc::make_mut(&mut names).remove(&event.name);
                Ok(Some(Status::Modified))
            }
            EventKind::PropertyChanged => Ok(Some(Status::Modified)),
        }
    }

    /// The `collectTransientStates`/commit-egress counterpart: drives this
    /// session state to its post-commit status.
    pub fn apply_commit(self: &Arc<Self>) -> Result<()> {
        match self.status() {
            Status::New => self.set_status(Status::Existing),
            Status::ExistingModified => self.set_status(Status::Existing),
            Status::ExistingRemoved => self.set_status(Status::Removed),
            _ => Ok(()),
        }
    }

    /// The change-log egress from spec §6: the outer session assembles a
    /// [`ChangeLog`] across the whole commit sweep and calls this on each
    /// touched session state, driving it to its post-commit status. A state
    /// the log doesn't mention is left untouched and absent from the
    /// returned [`CommitOutcome`].
    pub fn apply_change_log(self: &Arc<Self>, log: &ChangeLog) -> Result<CommitOutcome> {
        let mut outcome = CommitOutcome::new();
        if log.iter().any(|event| event.id == self.id) {
            self.apply_commit()?;
            outcome.record(self.id.clone(), self.status());
        }
        Ok(outcome)
    }

    /// Discards this session state's pending change.
    pub fn discard(self: &Arc<Self>) -> Result<()> {
        match self.status() {
            Status::New => self.set_status(Status::Removed),
            Status::ExistingModified => {
                self.resync()?;
                self.set_status(Status::Existing)
            }
            _ => Ok(()),
        }
    }

    /// Marks this session state as dirty. Rejected on a stale or removed
    /// state, per spec §7 ("marking a stale state modified, marking a
    /// removed state modified" are `IllegalState`).
    pub fn mark_modified(self: &Arc<Self>) -> Result<()> {
        match self.status() {
            Status::Existing => self.set_status(Status::ExistingModified),
            Status::ExistingModified => Ok(()),
            other => Err(Error::IllegalState(format!(
                "cannot mark {} modified from status {other}",
                self.id
            ))),
        }
    }

    /// Marks this session state as removed by the user.
    pub fn mark_removed(self: &Arc<Self>) -> Result<()> {
        match self.status() {
            Status::Existing | Status::ExistingModified => {
                self.set_status(Status::ExistingRemoved)
            }
            other => Err(Error::IllegalState(format!(
                "cannot remove {} from status {other}",
                self.id
            ))),
        }
    }

    /// Reverts this state synchronously: `EXISTING_MODIFIED -> EXISTING`
    /// (resyncing first), `EXISTING_REMOVED -> EXISTING`, otherwise a no-op.
    /// Used by `revert(affected)` walking dirty descendants per spec §5.
    pub fn revert(self: &Arc<Self>) -> Result<()> {
        match self.status() {
            Status::ExistingModified => {
                self.resync()?;
                self.set_status(Status::Existing)
            }
            Status::ExistingRemoved => self.set_status(Status::Existing),
            _ => Ok(()),
        }
    }

    pub fn is_dirty(&self) -> bool {
        matches!(
            self.status(),
            Status::New
                | Status::ExistingModified
                | Status::ExistingRemoved
                | Status::StaleModified
                | Status::StaleDestroyed
        )
    }

    /// Builds this item's path bottom-up: recurse to the parent (the root
    /// yields the root path), then append this item's step. A node step
    /// carries its same-name-sibling index (elided when it equals the
    /// default of 1); a property step never carries an index.
    pub fn path(self: &Arc<Self>) -> Result<Path> {
        let Some(parent) = self.parent() else {
            return Ok(Path::root());
        };

        let parent_path = parent.path()?;

        if self.is_node() {
            let index = {
                let node = parent.as_node()?;
                let children = node.children.lock().expect("children lock poisoned");
                let my_id = match &self.id {
                    ItemId::Node(id) => id,
                    ItemId::Property(_) => {
                        return Err(malformed_path("node item carries a property id"))
                    }
                };
                children.index_of(my_id)
            };
            let index = match index {
                Some(1) | None => None,
                Some(n) => std::num::NonZeroU32::new(n),
            };
            Ok(parent_path.child(PathElement::new(self.name.clone(), index)))
        } else {
            Ok(parent_path.child(PathElement::new(self.name.clone(), None)))
        }
    }
}

impl StatusChangeListener for ItemState {
    /// A connected session state is registered as a listener on its
    /// overlayed workspace state (see `connect`); this fires when that
    /// workspace state's status changes, `state` being the workspace state
    /// itself and `self` being the session state reacting to it.
    fn status_changed(&self, state: &Arc<ItemState>, _previous_status: Status) {
        self.self_arc().react_to_overlayed_status_change(state.status());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uuid(n: u128) -> NodeId {
        NodeId::Uuid(uuid::Uuid::from_u128(n))
    }

    #[test]
    fn set_status_noop_when_unchanged() {
        let ws = ItemState::new_workspace_node(uuid(1), QName::unqualified("a"), QName::unqualified("nt:base"), vec![]);
        ws.set_status(Status::Existing).unwrap();
        assert_eq!(ws.status(), Status::Existing);
    }

    #[test]
    fn set_status_rejects_terminal() {
        let ws = ItemState::new_workspace_node(uuid(1), QName::unqualified("a"), QName::unqualified("nt:base"), vec![]);
        ws.set_status(Status::Removed).unwrap();
        assert!(ws.set_status(Status::Invalidated).is_err());
        assert_eq!(ws.status(), Status::Removed);
    }

    #[test]
    fn modified_pulse_collapses_to_existing() {
        let ws = ItemState::new_workspace_node(uuid(1), QName::unqualified("a"), QName::unqualified("nt:base"), vec![]);
        ws.set_status(Status::Modified).unwrap();
        assert_eq!(ws.status(), Status::Existing);
    }

    #[test]
    fn connect_is_one_shot() {
        let ws1 = ItemState::new_workspace_node(uuid(1), QName::unqualified("a"), QName::unqualified("nt:base"), vec![]);
        let ws2 = ItemState::new_workspace_node(uuid(2), QName::unqualified("a"), QName::unqualified("nt:base"), vec![]);
        let session = ItemState::new_session_node(uuid(1), QName::unqualified("a"), QName::unqualified("nt:base"), vec![]);

        session.connect(ws1.clone()).unwrap();
        assert!(session.connect(ws2).is_err());
        session.connect(ws1).unwrap(); // no-op, same target
    }

    #[test]
    fn root_path_is_empty() {
        let ws = ItemState::new_workspace_node(uuid(1), QName::unqualified(""), QName::unqualified("nt:base"), vec![]);
        assert!(ws.path().unwrap().is_root());
    }

    #[test]
    fn child_path_elides_default_index() {
        let root = ItemState::new_workspace_node(uuid(1), QName::unqualified(""), QName::unqualified("nt:base"), vec![]);
        let child = ItemState::new_workspace_node(uuid(2), QName::unqualified("foo"), QName::unqualified("nt:base"), vec![]);
        child.set_parent(Some(&root));
        root.seed_child_node_entry(QName::unqualified("foo"), uuid(2)).unwrap();

        let path = child.path().unwrap();
        assert_eq!(path.elements().len(), 1);
        assert_eq!(path.elements()[0].index, None);
    }

    #[test]
    fn second_sibling_path_carries_explicit_index() {
        let root = ItemState::new_workspace_node(uuid(1), QName::unqualified(""), QName::unqualified("nt:base"), vec![]);
        let first = ItemState::new_workspace_node(uuid(2), QName::unqualified("foo"), QName::unqualified("nt:base"), vec![]);
        let second = ItemState::new_workspace_node(uuid(3), QName::unqualified("foo"), QName::unqualified("nt:base"), vec![]);
        first.set_parent(Some(&root));
        second.set_parent(Some(&root));
        root.seed_child_node_entry(QName::unqualified("foo"), uuid(2)).unwrap();
        root.seed_child_node_entry(QName::unqualified("foo"), uuid(3)).unwrap();

        let path = second.path().unwrap();
        assert_eq!(path.elements()[0].effective_index(), 2);
    }

    #[test]
    fn copy_on_write_isolation() {
        let ws = ItemState::new_workspace_node(uuid(1), QName::unqualified(""), QName::unqualified("nt:base"), vec![]);
        ws.seed_child_node_entry(QName::unqualified("foo"), uuid(2)).unwrap();

        let session = ItemState::new_session_node_overlaying(QName::unqualified(""), &ws).unwrap();
        session.add_child_node_entry(QName::unqualified("bar"), uuid(3)).unwrap();

        assert_eq!(ws.child_node_entries().unwrap().len(), 1);
        assert_eq!(session.child_node_entries().unwrap().len(), 2);
    }

    #[test]
    fn apply_change_log_settles_only_the_states_it_touches() {
        let new_node = ItemState::new_session_node(uuid(5), QName::unqualified("n"), QName::unqualified("nt:base"), vec![]);
        let untouched = ItemState::new_session_node(uuid(6), QName::unqualified("m"), QName::unqualified("nt:base"), vec![]);

        let mut log = ChangeLog::new();
        log.push(Event::new(
            EventKind::NodeAdded,
            new_node.id().clone(),
            QName::unqualified("n"),
            crate::ids::Path::root(),
        ));

        let outcome = new_node.apply_change_log(&log).unwrap();
        assert_eq!(new_node.status(), Status::Existing);
        assert_eq!(outcome.settled, vec![(new_node.id().clone(), Status::Existing)]);

        let outcome = untouched.apply_change_log(&log).unwrap();
        assert_eq!(untouched.status(), Status::New);
        assert!(outcome.settled.is_empty());
    }
}
