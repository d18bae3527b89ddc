//! Collaborator traits the item-state core depends on but does not
//! implement: resolving workspace state from wherever the repository client
//! actually keeps it, and the child-reference resolver. An in-memory
//! implementation of each is provided for tests and as a default for small
//! embedders, mirroring the source's pattern of a pluggable storage/clock
//! seam backed by a trivial in-memory adapter.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::child_reference::ResolveChild;
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::event::{Event, EventKind};
use crate::ids::{ItemId, NodeId, QName};
use crate::item_state::ItemState;

/// Resolves workspace item state on demand. The core calls this exactly
/// when it needs a workspace state it doesn't already hold a reference to —
/// first resolution of a node, resolution of a child by id, refresh after
/// invalidation. Implementations typically wrap a network client or a local
/// cache; the core places no requirement on how `resolve` fetches data
/// beyond returning a workspace-layer [`ItemState`] (`is_workspace() ==
/// true`).
pub trait ItemStateFactory: Send + Sync {
    fn resolve(&self, id: &ItemId) -> Result<Arc<ItemState>>;

    /// Whether two node ids name the same underlying node. The default
    /// implementation falls back to value equality, which is correct for
    /// two [`NodeId::Uuid`] ids but always reports inequality across a
    /// `Uuid`/`Relative` pair or between differently-anchored `Relative`
    /// ids — exactly the case [`NodeId`]'s own `PartialEq` defers to this
    /// trait for (see its doc comment).
    fn same_node(&self, a: &NodeId, b: &NodeId) -> bool {
        a == b
    }
}

/// Tracks the set of live session states atop a shared set of workspace
/// states, dispatches refresh notifications, and drives commit/discard
/// across a changelog. This is the primary entry point a repository client
/// embeds; the core provides [`InMemoryItemStateManager`] as a reference
/// implementation exercised by the test suite.
pub trait ItemStateManager: Send + Sync {
    fn get_item_state(&self, id: &ItemId) -> Result<Arc<ItemState>>;
    fn has_item_state(&self, id: &ItemId) -> bool;

    /// Feeds an externally observed change into the named workspace state's
    /// `refresh`, which in turn propagates to any connected session states
    /// via [`crate::listener::StatusChangeListener`].
    fn refresh(&self, id: &ItemId, event: &Event) -> Result<()>;
}

/// A single workspace state slot plus every session state currently
/// connected to it, so the in-memory manager can propagate a workspace
/// status change to every session overlay in one pass.
struct Entry {
    workspace: Arc<ItemState>,
}

/// Reference [`ItemStateFactory`] + [`ItemStateManager`] implementation
/// backed by a `HashMap`. Sessions created through
/// [`InMemoryItemStateManager::new_session`] connect automatically; nothing
/// here is persisted and nothing is ever evicted, which is adequate for
/// tests and small embedded trees but not a production cache.
#[derive(Default)]
pub struct InMemoryItemStateManager {
    workspace: Mutex<HashMap<ItemId, Entry>>,
    config: EngineConfig,
}

impl InMemoryItemStateManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            workspace: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// Registers a workspace state under its own id, as the factory would
    /// after resolving it from the underlying repository.
    pub fn register_workspace(&self, state: Arc<ItemState>) -> Result<()> {
        if !state.is_workspace() {
            return Err(Error::IllegalArgument(
                "only a workspace state can be registered".into(),
            ));
        }
        let id = state.id().clone();
        self.workspace
            .lock()
            .expect("workspace map poisoned")
            .insert(id, Entry { workspace: state });
        Ok(())
    }

    /// Creates a new session node state overlaying the workspace state
    /// already registered under `id`.
    pub fn new_session_node(&self, id: &ItemId, name: QName) -> Result<Arc<ItemState>> {
        let workspace = self.get_item_state(id)?;
        ItemState::new_session_node_overlaying(name, &workspace)
    }
}

impl ItemStateFactory for InMemoryItemStateManager {
    fn resolve(&self, id: &ItemId) -> Result<Arc<ItemState>> {
        self.workspace
            .lock()
            .expect("workspace map poisoned")
            .get(id)
            .map(|entry| entry.workspace.clone())
            .ok_or_else(|| Error::NoSuchItem(id.to_string()))
    }
}

impl ItemStateManager for InMemoryItemStateManager {
    fn get_item_state(&self, id: &ItemId) -> Result<Arc<ItemState>> {
        self.resolve(id)
    }

    fn has_item_state(&self, id: &ItemId) -> bool {
        self.workspace
            .lock()
            .expect("workspace map poisoned")
            .contains_key(id)
    }

    fn refresh(&self, id: &ItemId, event: &Event) -> Result<()> {
        if event.kind == EventKind::ChildReordered && !self.config.reorder_detection_enabled {
            log::debug!("{id} ignoring ChildReordered event: reorder detection disabled");
            return Ok(());
        }
        let workspace = self.get_item_state(id)?;
        workspace.refresh(event)
    }
}

impl ResolveChild for InMemoryItemStateManager {
    fn resolve_child(
        &self,
        parent: &Arc<ItemState>,
        address: &crate::child_reference::ChildNodeReference,
    ) -> Result<Option<Arc<ItemState>>> {
        if let Some(id) = address.id() {
            let item_id = ItemId::Node(id.clone());
            return match self.get_item_state(&item_id) {
                Ok(state) => Ok(Some(state)),
                Err(Error::NoSuchItem(_)) => Ok(None),
                Err(e) => Err(e),
            };
        }
        let Some((name, index)) = address.address_name_index() else {
            return Ok(None);
        };
        let node = parent.as_node()?;
        let found_id = {
            let children = node.children.lock().expect("children lock poisoned");
            children.get(name, index)?.map(|entry| entry.id.clone())
        };
        match found_id {
            Some(id) => Ok(Some(self.get_item_state(&ItemId::Node(id))?)),
            None => Ok(None),
        }
    }
}
