//! Item status and the transition gate that guards [`crate::item_state::ItemState::set_status`].

use std::fmt;

use crate::error::{Error, Result};

/// Which layer a state belongs to. The legal transition set differs between
/// the two: workspace states are driven by external events, session states by
/// user edits and propagation from their workspace twin.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Layer {
    Workspace,
    Session,
}

/// Lifecycle status of an item state. `Modified` is a transient signaling
/// pulse: it is never observed at rest, only during a `statusChanged`
/// notification, and collapses back to `Existing` immediately afterward.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Status {
    New,
    Existing,
    ExistingModified,
    ExistingRemoved,
    StaleModified,
    StaleDestroyed,
    Removed,
    Invalidated,
    /// Transient marker; collapses to `Existing` as soon as listeners have
    /// been notified. Never observed outside a notification callback.
    Modified,
}

impl Status {
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Removed | Status::StaleDestroyed)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::New => "NEW",
            Status::Existing => "EXISTING",
            Status::ExistingModified => "EXISTING_MODIFIED",
            Status::ExistingRemoved => "EXISTING_REMOVED",
            Status::StaleModified => "STALE_MODIFIED",
            Status::StaleDestroyed => "STALE_DESTROYED",
            Status::Removed => "REMOVED",
            Status::Invalidated => "INVALIDATED",
            Status::Modified => "MODIFIED",
        };
        f.write_str(s)
    }
}

/// Validates a `from -> to` transition for the given layer against the
/// tables in spec §4.3. Returns `Ok(())` for legal transitions (including the
/// `from == to` no-op, handled by the caller before this is reached) and
/// `Err(Error::IllegalState | Error::IllegalArgument)` otherwise.
///
/// Terminal statuses are rejected unconditionally by the caller before this
/// function runs; this function only judges the non-terminal transition
/// table itself.
pub fn validate_transition(layer: Layer, from: Status, to: Status) -> Result<()> {
    let legal = match layer {
        Layer::Workspace => matches!(
            (from, to),
            (Status::Existing, Status::Modified)
                | (Status::Modified, Status::Existing)
                | (Status::Existing, Status::Removed)
                | (Status::Existing, Status::Invalidated)
                | (Status::Invalidated, Status::Existing)
        ),
        Layer::Session => matches!(
            (from, to),
            (Status::New, Status::Existing)
                | (Status::New, Status::Removed)
                | (Status::Existing, Status::ExistingModified)
                | (Status::Existing, Status::ExistingRemoved)
                | (Status::Existing, Status::Invalidated)
                | (Status::Existing, Status::Modified)
                | (Status::Modified, Status::Existing)
                | (Status::Invalidated, Status::Modified)
                | (Status::ExistingModified, Status::Existing)
                | (Status::ExistingModified, Status::StaleModified)
                | (Status::ExistingModified, Status::StaleDestroyed)
                | (Status::ExistingRemoved, Status::Removed)
        ),
    };

    if legal {
        Ok(())
    } else {
        Err(Error::IllegalArgument(format!(
            "illegal {layer:?} status transition {from} -> {to}"
        )))
    }
}
