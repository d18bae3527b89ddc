//! Node-specific operations layered on [`ItemState`]'s `Payload::Node` case:
//! property-name set management, child-collection mutation, and the
//! structural diff (added/removed properties, added/removed/reordered
//! children) a session node state computes against its overlayed workspace
//! twin, per spec §4.4/§8.

use std::collections::HashSet;
use std::sync::{Arc, Weak};

use crate::child_collection::{ChildNodeEntries, ChildNodeEntry};
use crate::error::Result;
use crate::ids::{NodeId, QName};
use crate::item_state::ItemState;
use crate::listener::NodeStateListener;
use crate::status::Status;

impl ItemState {
    pub fn primary_type(&self) -> Result<QName> {
        Ok(self.as_node()?.primary_type.lock().unwrap().clone())
    }

    pub fn set_primary_type(self: &Arc<Self>, primary_type: QName) -> Result<()> {
        *self.as_node()?.primary_type.lock().unwrap() = primary_type;
        self.mark_modified()
    }

    pub fn mixin_types(&self) -> Result<Vec<QName>> {
        Ok(self.as_node()?.mixin_types.lock().unwrap().clone())
    }

    pub fn set_mixin_types(self: &Arc<Self>, mixin_types: Vec<QName>) -> Result<()> {
        *self.as_node()?.mixin_types.lock().unwrap() = mixin_types;
        self.mark_modified()
    }

    pub fn has_property_name(&self, name: &QName) -> Result<bool> {
        Ok(self.as_node()?.property_names.lock().unwrap().contains(name))
    }

    /// A cheap, shared snapshot of this node's children: cloning the
    /// returned `Arc` bumps a refcount rather than copying the collection.
    pub fn child_node_entries(&self) -> Result<Arc<ChildNodeEntries>> {
        Ok(self.as_node()?.children.lock().unwrap().clone())
    }

    /// Runs `f` against a private, mutable view of this node's children,
    /// cloning out of whatever it was sharing with its overlayed twin on
    /// the first mutation after sharing (`Arc::make_mut`'s refcount check),
    /// and leaving it in place on every call after that. This is the
    /// copy-on-write discipline spec §3/§4.4 describes.
    fn with_children_mut<R>(&self, f: impl FnOnce(&mut ChildNodeEntries) -> R) -> Result<R> {
        let node = self.as_node()?;
        let mut guard = node.children.lock().unwrap();
        Ok(f(Arc::make_mut(&mut guard)))
    }

    fn with_property_names_mut<R>(&self, f: impl FnOnce(&mut HashSet<QName>) -> R) -> Result<R> {
        let node = self.as_node()?;
        let mut guard = node.property_names.lock().unwrap();
        Ok(f(Arc::make_mut(&mut guard)))
    }

    pub fn add_property_name(self: &Arc<Self>, name: QName) -> Result<()> {
        self.with_property_names_mut(|names| names.insert(name))?;
        self.mark_modified()
    }

    /// Populates a property name outside the dirty-tracking protocol, as the
    /// item-state factory does when first materializing a workspace state
    /// from the underlying repository (a workspace state's content arrives
    /// fully formed; it is never "modified" into existence).
    pub fn seed_property_name(&self, name: QName) -> Result<()> {
        self.with_property_names_mut(|names| names.insert(name))?;
        Ok(())
    }

    /// Populates a child entry outside the dirty-tracking protocol, mirroring
    /// [`Self::seed_property_name`].
    pub fn seed_child_node_entry(&self, name: QName, id: NodeId) -> Result<()> {
        self.with_children_mut(|children| children.add(name, id))?;
        Ok(())
    }

    pub fn remove_property_name(self: &Arc<Self>, name: &QName) -> Result<bool> {
        let removed = self.with_property_names_mut(|names| names.remove(name))?;
        if removed {
            self.mark_modified()?;
        }
        Ok(removed)
    }

    /// Appends a new child entry and fires [`NodeStateListener::node_added`]
    /// to this node's listeners.
    pub fn add_child_node_entry(self: &Arc<Self>, name: QName, id: NodeId) -> Result<()> {
        let (entry, index) = self.with_children_mut(|children| {
            let entry = children.add(name.clone(), id.clone());
            let index = children.index_of(&entry.id).unwrap_or(1);
            (entry, index)
        })?;
        self.mark_modified()?;
        for listener in self.as_node()?.node_listeners.snapshot() {
            listener.node_added(self, (entry.name.clone(), index), entry.id.clone());
        }
        Ok(())
    }

    /// Removes a child by id and fires [`NodeStateListener::node_removed`]
    /// with the index it held just before removal.
    pub fn remove_child_node_entry(self: &Arc<Self>, id: &NodeId) -> Result<Option<ChildNodeEntry>> {
        let (removed, index) = self.with_children_mut(|children| {
            let index = children.index_of(id).unwrap_or(0);
            (children.remove_by_id(id), index)
        })?;
        if let Some(entry) = &removed {
            self.mark_modified()?;
            for listener in self.as_node()?.node_listeners.snapshot() {
                listener.node_removed(self, (entry.name.clone(), index), entry.id.clone());
            }
        }
        Ok(removed)
    }

    /// `renameChildNodeEntry(oldName, index, newName)`: removes the entry at
    /// the named 1-based SNS position and re-adds it under `new_name` at the
    /// tail of that name's group, firing `node_removed` then `node_added`.
    /// Returns `false` if the old entry was absent.
    pub fn rename_child_node_entry(
        self: &Arc<Self>,
        old_name: &QName,
        index: u32,
        new_name: QName,
    ) -> Result<bool> {
        let removed = self.with_children_mut(|children| children.remove_by_name_index(old_name, index))??;
        let Some(entry) = removed else {
            return Ok(false);
        };

        self.mark_modified()?;
        for listener in self.as_node()?.node_listeners.snapshot() {
            listener.node_removed(self, (entry.name.clone(), index), entry.id.clone());
        }

        let new_index = self.with_children_mut(|children| {
            children.add(new_name.clone(), entry.id.clone());
            children.index_of(&entry.id).unwrap_or(1)
        })?;
        for listener in self.as_node()?.node_listeners.snapshot() {
            listener.node_added(self, (new_name.clone(), new_index), entry.id.clone());
        }
        Ok(true)
    }

    pub fn add_node_listener(&self, listener: Weak<dyn NodeStateListener>) -> Result<()> {
        self.as_node()?.node_listeners.add(listener);
        Ok(())
    }

    pub fn remove_node_listener(&self, listener: &Weak<dyn NodeStateListener>) -> Result<()> {
        self.as_node()?.node_listeners.remove(listener);
        Ok(())
    }

    /// Property names present here but not on the overlayed workspace twin.
    /// Empty (never an error) if there is no overlayed twin, per spec §4.4's
    /// diff operations being defined only relative to a connected state.
    pub fn added_property_names(&self) -> Result<Vec<QName>> {
        let Some(overlayed) = self.overlayed() else {
            return Ok(Vec::new());
        };
        let mine = self.as_node()?.property_names.lock().unwrap();
        let theirs = overlayed.as_node()?.property_names.lock().unwrap();
        Ok(mine.difference(&theirs).cloned().collect())
    }

    pub fn removed_property_names(&self) -> Result<Vec<QName>> {
        let Some(overlayed) = self.overlayed() else {
            return Ok(Vec::new());
        };
        let mine = self.as_node()?.property_names.lock().unwrap();
        let theirs = overlayed.as_node()?.property_names.lock().unwrap();
        Ok(theirs.difference(&mine).cloned().collect())
    }

    pub fn added_child_node_entries(&self) -> Result<Vec<ChildNodeEntry>> {
        let Some(overlayed) = self.overlayed() else {
            return Ok(Vec::new());
        };
        let mine = self.as_node()?.children.lock().unwrap();
        let theirs = overlayed.as_node()?.children.lock().unwrap();
        Ok(mine.remove_all(&theirs))
    }

    pub fn removed_child_node_entries(&self) -> Result<Vec<ChildNodeEntry>> {
        let Some(overlayed) = self.overlayed() else {
            return Ok(Vec::new());
        };
        let mine = self.as_node()?.children.lock().unwrap();
        let theirs = overlayed.as_node()?.children.lock().unwrap();
        Ok(theirs.remove_all(&mine))
    }

    pub fn reordered_child_node_entries(&self) -> Result<Vec<ChildNodeEntry>> {
        let Some(overlayed) = self.overlayed() else {
            return Ok(Vec::new());
        };
        let mine = self.as_node()?.children.lock().unwrap();
        let theirs = overlayed.as_node()?.children.lock().unwrap();
        Ok(mine.reordered_vs(&theirs))
    }

    pub fn has_structural_changes(&self) -> Result<bool> {
        Ok(!self.added_property_names()?.is_empty()
            || !self.removed_property_names()?.is_empty()
            || !self.added_child_node_entries()?.is_empty()
            || !self.removed_child_node_entries()?.is_empty()
            || !self.reordered_child_node_entries()?.is_empty())
    }
}

impl NodeStateListener for ItemState {
    fn node_added(&self, parent: &Arc<ItemState>, name_index: (QName, u32), id: NodeId) {
        let _ = (self, parent, name_index, id);
    }

    fn node_removed(&self, parent: &Arc<ItemState>, name_index: (QName, u32), id: NodeId) {
        let _ = (self, parent, name_index, id);
    }

    fn nodes_replaced(&self, parent: &Arc<ItemState>) {
        let _ = (self, parent);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uuid(n: u128) -> NodeId {
        NodeId::Uuid(uuid::Uuid::from_u128(n))
    }

    fn root_node() -> Arc<ItemState> {
        ItemState::new_workspace_node(
            uuid(1),
            QName::unqualified(""),
            QName::unqualified("nt:base"),
            vec![],
        )
    }

    #[test]
    fn add_and_remove_child_mark_modified_and_set_status() {
        let ws = root_node();
        let session = ItemState::new_session_node_overlaying(QName::unqualified(""), &ws).unwrap();
        assert_eq!(session.status(), Status::Existing);

        session.add_child_node_entry(QName::unqualified("a"), uuid(2)).unwrap();
        assert_eq!(session.status(), Status::ExistingModified);

        session.remove_child_node_entry(&uuid(2)).unwrap();
        assert_eq!(session.status(), Status::ExistingModified);
    }

    #[test]
    fn diff_reports_added_and_removed_children() {
        let ws = root_node();
        ws.seed_child_node_entry(QName::unqualified("keep"), uuid(2)).unwrap();
        let session = ItemState::new_session_node_overlaying(QName::unqualified(""), &ws).unwrap();

        session.add_child_node_entry(QName::unqualified("new"), uuid(3)).unwrap();
        session.remove_child_node_entry(&uuid(2)).unwrap();

        let added = session.added_child_node_entries().unwrap();
        let removed = session.removed_child_node_entries().unwrap();
        assert_eq!(added.len(), 1);
        assert_eq!(added[0].id, uuid(3));
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].id, uuid(2));
    }

    #[test]
    fn diff_is_empty_without_overlayed_twin() {
        let session = ItemState::new_session_node(
            uuid(1),
            QName::unqualified(""),
            QName::unqualified("nt:base"),
            vec![],
        );
        assert!(session.added_child_node_entries().unwrap().is_empty());
        assert!(!session.has_structural_changes().unwrap());
    }

    #[test]
    fn rename_moves_entry_to_new_name_group() {
        let ws = root_node();
        let session = ItemState::new_session_node_overlaying(QName::unqualified(""), &ws).unwrap();
        session.add_child_node_entry(QName::unqualified("a"), uuid(2)).unwrap();

        let renamed = session
            .rename_child_node_entry(&QName::unqualified("a"), 1, QName::unqualified("b"))
            .unwrap();
        assert!(renamed);

        let children = session.child_node_entries().unwrap();
        assert!(children.get_by_name(&QName::unqualified("a")).is_empty());
        assert_eq!(children.get_by_name(&QName::unqualified("b")).len(), 1);
    }

    #[test]
    fn rename_absent_entry_returns_false() {
        let session = root_node();
        let renamed = session
            .rename_child_node_entry(&QName::unqualified("nope"), 1, QName::unqualified("b"))
            .unwrap();
        assert!(!renamed);
    }
}
