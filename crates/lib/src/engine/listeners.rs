//! Listener registries for synchronous engine notifications.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicU64, Ordering},
};

/// Callback invoked with each emitted event.
pub type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Key returned on registration, used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerKey(u64);

/// A set of listeners for events of type `E`.
///
/// Listeners are invoked outside the registry lock, so a listener may
/// register or remove listeners, or mutate the object that emitted the event.
pub struct Listeners<E> {
    next_key: AtomicU64,
    entries: Mutex<Vec<(ListenerKey, Listener<E>)>>,
}

impl<E> Default for Listeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for Listeners<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{} listeners>", self.len())
    }
}

impl<E> Listeners<E> {
    pub fn new() -> Self {
        Self {
            next_key: AtomicU64::new(1),
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Register a listener.
    pub fn add(&self, listener: Listener<E>) -> ListenerKey {
        let key = ListenerKey(self.next_key.fetch_add(1, Ordering::Relaxed));
        self.entries.lock().unwrap().push((key, listener));
        key
    }

    /// Unregister a listener. Returns false if the key was unknown.
    pub fn remove(&self, key: ListenerKey) -> bool {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|(k, _)| *k != key);
        entries.len() != before
    }

    /// Invoke every listener registered at the time of the call.
    pub fn emit(&self, event: &E) {
        let snapshot: Vec<Listener<E>> = self
            .entries
            .lock()
            .unwrap()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in snapshot {
            listener(event);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
