//! Subscription to node creation and modification events
//!
//! Listeners are held weakly: a listener that has been dropped is skipped and
//! forgotten at the next notification.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::Network;

/// Callbacks invoked by a [`Network`] when its nodes change
pub trait NodeListener {
    /// A node has been created; its fanins already exist
    fn on_add(&mut self, ntk: &Network, node: usize);

    /// A node has been replaced in place
    fn on_modify(&mut self, _ntk: &Network, _node: usize) {}

    /// The network has been rebuilt and all node indices changed
    fn on_rebuild(&mut self, _ntk: &Network) {}
}

/// Handle to an event subscription, to be given back to [`Network::unsubscribe`]
#[must_use]
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct EventHandle(usize);

/// Registry of the listeners of a network
#[derive(Default)]
pub(crate) struct Listeners {
    next_id: usize,
    entries: Vec<(usize, Weak<RefCell<dyn NodeListener>>)>,
}

impl Listeners {
    /// Register a new listener
    pub(crate) fn register(&mut self, listener: &Rc<RefCell<dyn NodeListener>>) -> EventHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push((id, Rc::downgrade(listener)));
        EventHandle(id)
    }

    /// Remove a listener; returns false if it was not registered
    pub(crate) fn release(&mut self, handle: EventHandle) -> bool {
        let len = self.entries.len();
        self.entries.retain(|(id, _)| *id != handle.0);
        self.entries.len() != len
    }

    /// Number of registered listeners that are still alive
    pub(crate) fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, l)| l.strong_count() > 0)
            .count()
    }

    /// Obtain the live listeners, dropping the dead ones
    pub(crate) fn active(&mut self) -> Vec<Rc<RefCell<dyn NodeListener>>> {
        self.entries.retain(|(_, l)| l.strong_count() > 0);
        self.entries.iter().filter_map(|(_, l)| l.upgrade()).collect()
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listeners({})", self.len())
    }
}
