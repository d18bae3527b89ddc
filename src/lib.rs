#![forbid(unsafe_code)]
//! Dual-layer item-state overlay and lifecycle engine for a hierarchical
//! content-repository client. A workspace state caches what the server last
//! reported for an item; a session state overlays it copy-on-write and
//! tracks the user's pending edits until commit or discard. This crate stays
//! independent of the transport and storage that actually talk to a
//! repository, so it can be embedded by a WASM binding, a local cache, or a
//! remote client alike.

pub mod child_collection;
pub mod child_reference;
pub mod config;
pub mod error;
pub mod event;
pub mod ids;
pub mod item_state;
pub mod listener;
pub mod node_state;
pub mod status;
pub mod traits;

pub use child_collection::{ChildNodeEntries, ChildNodeEntry};
pub use child_reference::{ChildNodeReference, ResolveChild};
pub use config::EngineConfig;
pub use error::{Error, Result};
pub use event::{ChangeLog, CommitOutcome, Event, EventKind};
pub use ids::{DefaultIdFactory, IdFactory, ItemId, NodeId, Path, PathElement, PropertyId, QName};
pub use item_state::{ItemState, NodeDefinition, PropertyDefinition, PropertyValue};
pub use listener::{ListenerSet, NodeStateListener, StatusChangeListener};
pub use status::{Layer, Status};
pub use traits::{InMemoryItemStateManager, ItemStateFactory, ItemStateManager};
