//! A lazily-resolved, weakly-cached reference from a parent node state to a
//! child, addressable either by stable id or by a path step evaluated
//! against the parent at resolution time.

use std::sync::{Arc, Mutex, Weak};

use crate::error::Result;
use crate::ids::{NodeId, QName};
use crate::item_state::ItemState;

/// How a child is addressed. `ByPathStep` is for children that lack a stable
/// [`NodeId`] of their own and must be located by name/index under the
/// parent at resolution time (see [`NodeId::Relative`]).
#[derive(Clone, Debug)]
enum Address {
    ById(NodeId),
    ByPathStep { name: QName, index: u32 },
}

/// Resolves a child [`ItemState`] on demand and caches the result weakly: a
/// resolution survives as long as something else keeps the child state
/// alive, but never pins it in memory by itself.
pub struct ChildNodeReference {
    address: Address,
    cached: Mutex<Weak<ItemState>>,
}

/// Resolves a [`ChildNodeReference`] against its parent. Implemented by
/// whatever owns the parent's child collection (typically the item-state
/// manager), since resolving a `ByPathStep` reference needs the parent's
/// current child collection, not just the reference itself.
pub trait ResolveChild {
    fn resolve_child(&self, parent: &Arc<ItemState>, address: &ChildNodeReference) -> Result<Option<Arc<ItemState>>>;
}

impl ChildNodeReference {
    pub fn by_id(id: NodeId) -> Self {
        Self {
            address: Address::ById(id),
            cached: Mutex::new(Weak::new()),
        }
    }

    pub fn by_path_step(name: QName, index: u32) -> Self {
        Self {
            address: Address::ByPathStep { name, index },
            cached: Mutex::new(Weak::new()),
        }
    }

    pub fn id(&self) -> Option<&NodeId> {
        match &self.address {
            Address::ById(id) => Some(id),
            Address::ByPathStep { .. } => None,
        }
    }

    /// Returns the cached resolution if still alive, without invoking the
    /// resolver.
    pub fn cached(&self) -> Option<Arc<ItemState>> {
        self.cached.lock().expect("cache lock poisoned").upgrade()
    }

    /// Resolves the reference, consulting the weak cache first and falling
    /// back to `resolver` on a cache miss (including a cache entry whose
    /// target has since been dropped).
    pub fn resolve(
        &self,
        parent: &Arc<ItemState>,
        resolver: &dyn ResolveChild,
    ) -> Result<Option<Arc<ItemState>>> {
        if let Some(hit) = self.cached() {
            return Ok(Some(hit));
        }
        let resolved = resolver.resolve_child(parent, self)?;
        if let Some(state) = &resolved {
            *self.cached.lock().expect("cache lock poisoned") = Arc::downgrade(state);
        }
        Ok(resolved)
    }

    pub(crate) fn address_name_index(&self) -> Option<(&QName, u32)> {
        match &self.address {
            Address::ByPathStep { name, index } => Some((name, *index)),
            Address::ById(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::QName;

    struct ById(Arc<ItemState>);

    impl ResolveChild for ById {
        fn resolve_child(
            &self,
            _parent: &Arc<ItemState>,
            _address: &ChildNodeReference,
        ) -> Result<Option<Arc<ItemState>>> {
            Ok(Some(self.0.clone()))
        }
    }

    #[test]
    fn resolution_is_cached_weakly() {
        let parent = ItemState::new_workspace_node(
            NodeId::new_uuid(),
            QName::unqualified(""),
            QName::unqualified("nt:base"),
            vec![],
        );
        let child_id = NodeId::new_uuid();
        let child = ItemState::new_workspace_node(
            child_id.clone(),
            QName::unqualified("c"),
            QName::unqualified("nt:base"),
            vec![],
        );
        let reference = ChildNodeReference::by_id(child_id);
        let resolver = ById(child.clone());

        assert!(reference.cached().is_none());
        let resolved = reference.resolve(&parent, &resolver).unwrap().unwrap();
        assert!(Arc::ptr_eq(&resolved, &child));
        assert!(reference.cached().is_some());

        drop(child);
        drop(resolved);
        assert!(reference.cached().is_none());
    }
}
