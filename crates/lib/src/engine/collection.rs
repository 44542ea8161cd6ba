//! Ordered engine object container.
//!
//! [`ObjectCollection`] is the single place membership lives. Both the
//! managed collection and the engine itself mutate it, and every structural
//! change is reported to listeners synchronously after the container lock is
//! released.

use std::sync::{Arc, Mutex};

use handle_trait::Handle;

use super::{Comparator, EngineRef, Listener, ListenerKey, Listeners};
use crate::Identity;

/// Structural change of an [`ObjectCollection`].
#[derive(Debug, Clone)]
pub enum CollectionChange {
    Added(EngineRef),
    Removed(EngineRef),
}

impl CollectionChange {
    /// The object that was added or removed.
    pub fn element(&self) -> &EngineRef {
        match self {
            CollectionChange::Added(object) | CollectionChange::Removed(object) => object,
        }
    }
}

#[derive(Debug, Default)]
struct CollectionState {
    items: Mutex<Vec<EngineRef>>,
    listeners: Listeners<CollectionChange>,
}

/// Shared, ordered, mutable sequence of engine objects.
///
/// Cloning yields another handle to the same container.
#[derive(Clone, Debug, Default, Handle)]
pub struct ObjectCollection {
    inner: Arc<CollectionState>,
}

impl ObjectCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a container holding `items`, without emitting change events.
    pub fn from_vec(items: Vec<EngineRef>) -> Self {
        Self {
            inner: Arc::new(CollectionState {
                items: Mutex::new(items),
                listeners: Listeners::new(),
            }),
        }
    }

    /// Whether both handles refer to the same container.
    pub fn same_as(&self, other: &ObjectCollection) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Append an object.
    pub fn push(&self, object: EngineRef) {
        self.inner.items.lock().unwrap().push(Arc::clone(&object));
        self.inner.listeners.emit(&CollectionChange::Added(object));
    }

    /// Append an object unless a member with the same identity is present.
    ///
    /// The check and the append happen under one lock, so concurrent callers
    /// admitting the same identity always leave exactly one member.
    /// Returns whether the object was appended.
    pub fn push_unique(&self, object: EngineRef) -> bool {
        {
            let mut items = self.inner.items.lock().unwrap();
            let identity = object.identity();
            let duplicate = identity.is_some()
                && items.iter().any(|existing| existing.identity() == identity);
            if duplicate {
                return false;
            }
            items.push(Arc::clone(&object));
        }
        self.inner.listeners.emit(&CollectionChange::Added(object));
        true
    }

    /// Remove a specific object. Returns whether it was a member.
    pub fn remove(&self, object: &EngineRef) -> bool {
        let removed = {
            let mut items = self.inner.items.lock().unwrap();
            match items.iter().position(|item| Arc::ptr_eq(item, object)) {
                Some(index) => Some(items.remove(index)),
                None => None,
            }
        };
        match removed {
            Some(removed) => {
                self.inner.listeners.emit(&CollectionChange::Removed(removed));
                true
            }
            None => false,
        }
    }

    /// Remove the first member with the given identity.
    pub fn remove_by_identity(&self, identity: &Identity) -> Option<EngineRef> {
        let removed = {
            let mut items = self.inner.items.lock().unwrap();
            let index = items
                .iter()
                .position(|item| item.identity().as_ref() == Some(identity))?;
            items.remove(index)
        };
        self.inner
            .listeners
            .emit(&CollectionChange::Removed(Arc::clone(&removed)));
        Some(removed)
    }

    /// Remove every member, emitting a removal for each.
    pub fn clear(&self) {
        let removed = std::mem::take(&mut *self.inner.items.lock().unwrap());
        for object in removed {
            self.inner.listeners.emit(&CollectionChange::Removed(object));
        }
    }

    /// Stable sort in place. Does not emit change events.
    pub fn sort_by(&self, comparator: &Comparator) {
        self.inner
            .items
            .lock()
            .unwrap()
            .sort_by(|a, b| comparator(a, b));
    }

    /// First member matching `predicate`.
    pub fn find(&self, predicate: impl Fn(&EngineRef) -> bool) -> Option<EngineRef> {
        self.inner
            .items
            .lock()
            .unwrap()
            .iter()
            .find(|item| predicate(item))
            .cloned()
    }

    /// Snapshot of the current members, in order.
    pub fn to_vec(&self) -> Vec<EngineRef> {
        self.inner.items.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.items.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Register a structural change listener.
    pub fn listen(&self, listener: Listener<CollectionChange>) -> ListenerKey {
        self.inner.listeners.add(listener)
    }

    /// Remove a structural change listener.
    pub fn un_listen(&self, key: ListenerKey) -> bool {
        self.inner.listeners.remove(key)
    }
}

impl From<Vec<EngineRef>> for ObjectCollection {
    fn from(items: Vec<EngineRef>) -> Self {
        Self::from_vec(items)
    }
}
