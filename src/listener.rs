//! Weak, identity-semantics listener protocol shared by item states.
//!
//! Listeners are held weakly: a listener that disappears must not keep the
//! observed state alive, and must be silently pruned on iteration rather than
//! requiring explicit removal. The collection has its own lock, separate from
//! whatever lock guards the state being observed, and notifications are
//! delivered from a snapshot taken under that lock — the lock itself is
//! released before any callback runs, so a callback is free to call
//! `add`/`remove` on the very set notifying it without deadlocking or
//! corrupting the in-flight iteration.

use std::sync::{Arc, Mutex, Weak};

use crate::ids::NodeId;
use crate::item_state::ItemState;
use crate::status::Status;

/// Notified on every status transition of an observed item state, including
/// the transient `Modified` pulse.
pub trait StatusChangeListener: Send + Sync {
    fn status_changed(&self, state: &Arc<ItemState>, previous_status: Status);
}

/// Notified on structural changes to a node state's child collection.
pub trait NodeStateListener: Send + Sync {
    fn node_added(&self, parent: &Arc<ItemState>, name_index: (crate::ids::QName, u32), id: NodeId);
    fn node_removed(&self, parent: &Arc<ItemState>, name_index: (crate::ids::QName, u32), id: NodeId);
    fn nodes_replaced(&self, parent: &Arc<ItemState>);
}

/// A weak, identity-semantics (pointer-keyed, never equality-keyed) set of
/// listeners of type `L`.
pub struct ListenerSet<L: ?Sized> {
    listeners: Mutex<Vec<Weak<L>>>,
}

impl<L: ?Sized> Default for ListenerSet<L> {
    fn default() -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
        }
    }
}

impl<L: ?Sized> ListenerSet<L> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener. Serialized on the listener collection's own
    /// lock, independent of any per-state monitor.
    pub fn add(&self, listener: Weak<L>) {
        let mut guard = self.listeners.lock().expect("listener set poisoned");
        guard.push(listener);
    }

    /// Removes a previously registered listener by pointer identity. A
    /// listener already dropped (upgrade fails) is simply absent and this is
    /// a no-op.
    pub fn remove(&self, listener: &Weak<L>) {
        let mut guard = self.listeners.lock().expect("listener set poisoned");
        guard.retain(|existing| !weak_ptr_eq(existing, listener));
    }

    /// Takes a snapshot of currently-alive listeners under the lock, pruning
    /// dead weak handles in the same pass, then releases the lock. Safe for
    /// a listener callback to mutate this same set reentrantly: the mutation
    /// affects only future snapshots, never the one in flight.
    pub fn snapshot(&self) -> Vec<Arc<L>> {
        let mut guard = self.listeners.lock().expect("listener set poisoned");
        let mut alive = Vec::with_capacity(guard.len());
        guard.retain(|weak| match weak.upgrade() {
            Some(strong) => {
                alive.push(strong);
                true
            }
            None => false,
        });
        alive
    }

    pub fn len_including_dead(&self) -> usize {
        self.listeners.lock().expect("listener set poisoned").len()
    }
}

fn weak_ptr_eq<L: ?Sized>(a: &Weak<L>, b: &Weak<L>) -> bool {
    match (a.upgrade(), b.upgrade()) {
        (Some(a), Some(b)) => Arc::ptr_eq(&a, &b),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counter(AtomicUsize);

    impl StatusChangeListener for Counter {
        fn status_changed(&self, _state: &Arc<ItemState>, _previous_status: Status) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn dead_weak_handles_are_pruned_on_snapshot() {
        let set: ListenerSet<dyn StatusChangeListener> = ListenerSet::new();
        {
            let listener = Arc::new(Counter(AtomicUsize::new(0)));
            set.add(Arc::downgrade(&listener) as Weak<dyn StatusChangeListener>);
            assert_eq!(set.snapshot().len(), 1);
        }
        // listener dropped here
        assert_eq!(set.snapshot().len(), 0);
        assert_eq!(set.len_including_dead(), 0);
    }
}
