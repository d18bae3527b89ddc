//! Insertion-ordered, same-name-sibling-aware collection of a node's children.
//!
//! Supports O(1) lookup by id, O(1) lookup of the SNS list for a name, and
//! ordered iteration in insertion order. Shallow-clonable: entries are small
//! value types, so cloning the outer `Vec`/index structures is already a full
//! copy with no aliasing, which is the Rust equivalent of the source's
//! "clone the structure, share the entries" contract.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::ids::{NodeId, QName};

/// One child: its name, its id, and (implicitly) its position — both in
/// overall insertion order and within its same-name-sibling group. The SNS
/// index is never stored on the entry; it is always re-derived from the
/// entry's position in its name group, per spec §4.1.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ChildNodeEntry {
    pub name: QName,
    pub id: NodeId,
}

impl ChildNodeEntry {
    pub fn new(name: QName, id: NodeId) -> Self {
        Self { name, id }
    }
}

/// Ordered multimap of a node's children, keyed by id with a secondary
/// same-name-sibling index keyed by name.
#[derive(Clone, Debug, Default)]
pub struct ChildNodeEntries {
    /// Insertion order, source of truth for iteration.
    order: Vec<ChildNodeEntry>,
    /// name -> indexes into `order`, in insertion order within the group.
    by_name: HashMap<QName, Vec<usize>>,
    /// id -> index into `order`, for O(1) lookup/removal by id per spec §4.1.
    by_id: HashMap<NodeId, usize>,
}

impl ChildNodeEntries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Ordered iteration over all entries, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ChildNodeEntry> {
        self.order.iter()
    }

    pub fn get_by_id(&self, id: &NodeId) -> Option<&ChildNodeEntry> {
        self.by_id.get(id).map(|&i| &self.order[i])
    }

    /// All entries sharing `name`, in insertion order. Empty if none exist.
    pub fn get_by_name(&self, name: &QName) -> Vec<&ChildNodeEntry> {
        self.by_name
            .get(name)
            .into_iter()
            .flat_map(|idxs| idxs.iter().map(|&i| &self.order[i]))
            .collect()
    }

    /// The entry at 1-based same-name-sibling position `index`, or `None` if
    /// out of range. Fails with [`Error::IllegalArgument`] if `index < 1`.
    pub fn get(&self, name: &QName, index: u32) -> Result<Option<&ChildNodeEntry>> {
        if index < 1 {
            return Err(Error::IllegalArgument(format!(
                "same-name-sibling index must be >= 1, got {index}"
            )));
        }
        let Some(idxs) = self.by_name.get(name) else {
            return Ok(None);
        };
        Ok(idxs
            .get((index - 1) as usize)
            .map(|&i| &self.order[i]))
    }

    /// The 1-based same-name-sibling index of `id` among its name group.
    /// Re-derived on every call per spec §4.1, never cached on the entry.
    pub fn index_of(&self, id: &NodeId) -> Option<u32> {
        let entry = self.get_by_id(id)?;
        let idxs = self.by_name.get(&entry.name)?;
        idxs.iter()
            .position(|&i| self.order[i].id == *id)
            .map(|pos| (pos + 1) as u32)
    }

    /// Appends a new entry, joining an existing same-name-sibling group if
    /// one exists under `name`, or starting a singleton group otherwise.
    pub fn add(&mut self, name: QName, id: NodeId) -> ChildNodeEntry {
        let entry = ChildNodeEntry::new(name.clone(), id.clone());
        let pos = self.order.len();
        self.order.push(entry.clone());
        self.by_name.entry(name).or_default().push(pos);
        self.by_id.insert(id, pos);
        entry
    }

    /// Removes the entry at 1-based SNS position `index` under `name`.
    /// Returns `None` if absent. `index < 1` is an [`Error::IllegalArgument`].
    pub fn remove_by_name_index(
        &mut self,
        name: &QName,
        index: u32,
    ) -> Result<Option<ChildNodeEntry>> {
        if index < 1 {
            return Err(Error::IllegalArgument(format!(
                "same-name-sibling index must be >= 1, got {index}"
            )));
        }
        let Some(idxs) = self.by_name.get(name) else {
            return Ok(None);
        };
        let Some(&order_idx) = idxs.get((index - 1) as usize) else {
            return Ok(None);
        };
        Ok(self.remove_at(order_idx))
    }

    pub fn remove_by_id(&mut self, id: &NodeId) -> Option<ChildNodeEntry> {
        let order_idx = *self.by_id.get(id)?;
        self.remove_at(order_idx)
    }

    pub fn remove_entry(&mut self, entry: &ChildNodeEntry) -> Option<ChildNodeEntry> {
        self.remove_by_id(&entry.id)
    }

    fn remove_at(&mut self, order_idx: usize) -> Option<ChildNodeEntry> {
        if order_idx >= self.order.len() {
            return None;
        }
        let removed = self.order.remove(order_idx);

        // Shift every by_name/by_id index that pointed past the removed
        // slot, and drop the removed slot's own index from its group;
        // collapse an empty group entirely.
        let mut drop_group = false;
        if let Some(idxs) = self.by_name.get_mut(&removed.name) {
            idxs.retain(|&i| i != order_idx);
            for i in idxs.iter_mut() {
                if *i > order_idx {
                    *i -= 1;
                }
            }
            drop_group = idxs.is_empty();
        }
        if drop_group {
            self.by_name.remove(&removed.name);
        }
        for (name, idxs) in self.by_name.iter_mut() {
            if *name == removed.name {
                continue;
            }
            for i in idxs.iter_mut() {
                if *i > order_idx {
                    *i -= 1;
                }
            }
        }

        self.by_id.remove(&removed.id);
        for i in self.by_id.values_mut() {
            if *i > order_idx {
                *i -= 1;
            }
        }

        Some(removed)
    }

    /// Entries present in `self` but not in `other`, "present" judged by
    /// `(name, id)` equivalence (ignoring SNS index), order preserved.
    pub fn remove_all(&self, other: &ChildNodeEntries) -> Vec<ChildNodeEntry> {
        self.order
            .iter()
            .filter(|e| other.get_by_id(&e.id).map(|o| &o.name) != Some(&e.name))
            .cloned()
            .collect()
    }

    /// Entries present in both `self` and `other`, by the same equivalence as
    /// [`Self::remove_all`], in `self`'s order.
    pub fn retain_all(&self, other: &ChildNodeEntries) -> Vec<ChildNodeEntry> {
        self.order
            .iter()
            .filter(|e| other.get_by_id(&e.id).map(|o| &o.name) == Some(&e.name))
            .cloned()
            .collect()
    }

    /// Relocates the entry for `id` to immediately before the entry for
    /// `before` (or to the end, if `before` is `None` or unknown). Returns
    /// `false` if `id` is absent. Used to apply a `ChildReordered` refresh
    /// event to a workspace state's child collection.
    pub fn move_before(&mut self, id: &NodeId, before: Option<&NodeId>) -> bool {
        let Some(removed) = self.remove_by_id(id) else {
            return false;
        };
        let insert_at = before
            .and_then(|b| self.by_id.get(b).copied())
            .unwrap_or(self.order.len());
        self.order.insert(insert_at, removed);
        self.rebuild_indices();
        true
    }

    fn rebuild_indices(&mut self) {
        self.by_name.clear();
        self.by_id.clear();
        for (i, entry) in self.order.iter().enumerate() {
            self.by_name.entry(entry.name.clone()).or_default().push(i);
            self.by_id.insert(entry.id.clone(), i);
        }
    }

    /// Detects entries whose relative position changed between `self`
    /// ("current") and `other` ("overlayed").
    ///
    /// Forms the ordered intersection of both sides (by `(name, id)`
    /// equivalence) and walks them in lockstep; wherever they diverge at
    /// position `i`, the current entry is reported as reordered and all
    /// occurrences of its id are dropped from both lists before continuing
    /// from the same `i` (removal shifts the lists). Not guaranteed minimal,
    /// but stable and non-empty iff order actually differs — see spec §4.1
    /// and §8 property 8.
    pub fn reordered_vs(&self, other: &ChildNodeEntries) -> Vec<ChildNodeEntry> {
        let mut current = self.retain_all(other);
        let mut overlayed = other.retain_all(self);
        let mut reordered = Vec::new();

        let mut i = 0;
        while i < current.len() && i < overlayed.len() {
            if current[i].id == overlayed[i].id {
                i += 1;
                continue;
            }
            let displaced = current[i].clone();
            let id = displaced.id.clone();
            reordered.push(displaced);
            current.retain(|e| e.id != id);
            overlayed.retain(|e| e.id != id);
            // do not advance i: removal shifted everything at/after i down
        }

        reordered
    }
}
