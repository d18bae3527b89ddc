//! Identifier and path value types: qualified names, paths, node ids and
//! property ids. All are plain, value-equal, cheaply cloned data — no
//! interning, no interior mutability.

use std::fmt;
use std::num::NonZeroU32;

use uuid::Uuid;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A namespace-qualified name, e.g. `{http://example.org}title`.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct QName {
    pub namespace: String,
    pub local: String,
}

impl QName {
    pub fn new(namespace: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            local: local.into(),
        }
    }

    /// A name in the empty (default) namespace.
    pub fn unqualified(local: impl Into<String>) -> Self {
        Self::new("", local)
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.local)
        } else {
            write!(f, "{{{}}}{}", self.namespace, self.local)
        }
    }
}

/// One step of a [`Path`]: a name plus an optional 1-based same-name-sibling
/// index. `index == None` is equivalent to index 1 (the default) and must be
/// elided when the path is textualized.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PathElement {
    pub name: QName,
    pub index: Option<NonZeroU32>,
}

impl PathElement {
    pub fn new(name: QName, index: Option<NonZeroU32>) -> Self {
        Self { name, index }
    }

    /// The effective 1-based index, defaulting to 1 when elided.
    pub fn effective_index(&self) -> u32 {
        self.index.map(NonZeroU32::get).unwrap_or(1)
    }
}

/// An absolute or relative path: an ordered sequence of [`PathElement`]s.
/// The root path is the empty sequence.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Path {
    elements: Vec<PathElement>,
}

impl Path {
    /// The root path (empty sequence of steps).
    pub fn root() -> Self {
        Self {
            elements: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn elements(&self) -> &[PathElement] {
        &self.elements
    }

    /// Returns a new path with `element` appended.
    pub fn child(&self, element: PathElement) -> Self {
        let mut elements = self.elements.clone();
        elements.push(element);
        Self { elements }
    }

    pub fn parent(&self) -> Option<Self> {
        if self.elements.is_empty() {
            return None;
        }
        let mut elements = self.elements.clone();
        elements.pop();
        Some(Self { elements })
    }

    pub fn depth(&self) -> usize {
        self.elements.len()
    }
}

/// Unique identifier for a node: either a stable UUID, or a path relative to
/// a UUID-anchored ancestor for nodes that lack stable identity.
///
/// Two [`NodeId`] values of the same variant compare by value. Comparing a
/// [`NodeId::Uuid`] against a [`NodeId::Relative`] anchored differently always
/// reports inequality at this layer: resolving whether they name the same
/// node requires the item-state manager (see `same_node` on the manager
/// collaborator) and is deliberately not attempted here.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NodeId {
    Uuid(Uuid),
    Relative { anchor: Uuid, path: Path },
}

impl NodeId {
    pub fn new_uuid() -> Self {
        NodeId::Uuid(Uuid::new_v4())
    }

    pub fn relative(anchor: Uuid, path: Path) -> Self {
        NodeId::Relative { anchor, path }
    }

    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            NodeId::Uuid(id) => Some(*id),
            NodeId::Relative { .. } => None,
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Uuid(id) => write!(f, "{id}"),
            NodeId::Relative { anchor, path } => write!(f, "{anchor}/{}", path.depth()),
        }
    }
}

/// Unique identifier for a property: its parent node id plus its qualified
/// name. Unique per workspace.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PropertyId {
    pub parent: NodeId,
    pub name: QName,
}

impl PropertyId {
    pub fn new(parent: NodeId, name: QName) -> Self {
        Self { parent, name }
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/@{}", self.parent, self.name)
    }
}

/// Identifies either a node or a property state, without committing to the
/// payload kind. Used where item-agnostic code (listeners, the manager) needs
/// a single id type.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ItemId {
    Node(NodeId),
    Property(PropertyId),
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemId::Node(id) => write!(f, "{id}"),
            ItemId::Property(id) => write!(f, "{id}"),
        }
    }
}

/// Mints property ids from a parent node id and a name. Kept as a trait so
/// callers can swap in a clock-independent id scheme without touching the
/// core; the core never needs a clock or randomness to name a property.
pub trait IdFactory: Send + Sync {
    fn new_property_id(&self, parent: &NodeId, name: &QName) -> PropertyId {
        PropertyId::new(parent.clone(), name.clone())
    }
}

/// The trivial id factory: property ids are exactly `(parent, name)`, which
/// is already globally unique per the data-model invariant in the spec.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultIdFactory;

impl IdFactory for DefaultIdFactory {}

pub(crate) fn malformed_path(reason: impl Into<String>) -> Error {
    Error::Repository(format!("malformed path: {}", reason.into()))
}
