//! Explicit service lookup for managed nodes.
//!
//! Nodes never reach into their parents directly. Instead each node is built
//! with a [`Context`] that carries the services it may depend on: the ancestor
//! map (which may not exist yet, see [`ServiceSlot`]), the enclosing
//! [`ManagedCollection`] it registers with on mount, the enclosing node, and
//! the shared [`SyncConfig`].

use std::sync::Arc;

use handle_trait::Handle;
use tokio::sync::watch;

use crate::{Identity, ManagedCollection, ManagedObject, SyncConfig, object::WeakManagedObject};

/// A service that may become available at some later point.
///
/// Cloning yields another handle to the same slot.
pub struct ServiceSlot<T> {
    tx: Arc<watch::Sender<Option<T>>>,
}

impl<T> Clone for ServiceSlot<T> {
    fn clone(&self) -> Self {
        Self {
            tx: Arc::clone(&self.tx),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for ServiceSlot<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ServiceSlot").field(&*self.tx.borrow()).finish()
    }
}

impl<T: Clone> Default for ServiceSlot<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: Clone> ServiceSlot<T> {
    /// A slot with no service yet.
    pub fn empty() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// A slot that already holds `value`.
    pub fn ready(value: T) -> Self {
        let (tx, _) = watch::channel(Some(value));
        Self { tx: Arc::new(tx) }
    }

    /// Make the service available, waking every waiter.
    pub fn provide(&self, value: T) {
        self.tx.send_replace(Some(value));
    }

    /// Withdraw the service.
    pub fn clear(&self) {
        self.tx.send_replace(None);
    }

    /// The service, if available now.
    pub fn get(&self) -> Option<T> {
        self.tx.borrow().clone()
    }

    pub fn is_available(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// Wait until the service is available.
    ///
    /// Never fails; waits indefinitely if the service never shows up.
    pub async fn wait(&self) -> T {
        let mut rx = self.tx.subscribe();
        loop {
            if let Some(value) = rx.borrow_and_update().clone() {
                return value;
            }
            if rx.changed().await.is_err() {
                // Unreachable while `self` holds the sender
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Ancestor map context a node needs before it can resolve.
#[derive(Debug, Clone, PartialEq)]
pub struct MapService {
    id: Identity,
}

impl MapService {
    pub fn new(id: impl Into<Identity>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &Identity {
        &self.id
    }
}

#[derive(Debug, Default)]
struct ContextInner {
    map: ServiceSlot<MapService>,
    collection: Option<ManagedCollection>,
    node: Option<WeakManagedObject>,
    config: SyncConfig,
}

/// Services visible to a node.
///
/// Contexts are immutable; the `with_*` methods derive a child context that
/// shares everything else with its parent.
#[derive(Clone, Debug, Default, Handle)]
pub struct Context {
    inner: Arc<ContextInner>,
}

impl Context {
    /// A root context with an empty map slot, no collection and default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// A root context using `config`.
    pub fn with_config(config: SyncConfig) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                config,
                ..Default::default()
            }),
        }
    }

    fn derive(&self, update: impl FnOnce(&mut ContextInner)) -> Self {
        let mut inner = ContextInner {
            map: self.inner.map.clone(),
            collection: self.inner.collection.clone(),
            node: self.inner.node.clone(),
            config: self.inner.config.clone(),
        };
        update(&mut inner);
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Child context using `slot` for the ancestor map.
    pub fn with_map_slot(&self, slot: ServiceSlot<MapService>) -> Self {
        self.derive(|inner| inner.map = slot)
    }

    /// Child context whose nodes register with `collection`.
    pub fn with_collection(&self, collection: ManagedCollection) -> Self {
        self.derive(|inner| inner.collection = Some(collection))
    }

    /// Child context with no enclosing collection.
    pub fn without_collection(&self) -> Self {
        self.derive(|inner| inner.collection = None)
    }

    /// Child context whose enclosing node is `node`.
    pub fn with_node(&self, node: &ManagedObject) -> Self {
        let weak = node.downgrade();
        self.derive(|inner| inner.node = Some(weak))
    }

    /// The ancestor map slot.
    pub fn map_slot(&self) -> &ServiceSlot<MapService> {
        &self.inner.map
    }

    /// The ancestor map, if available now.
    pub fn map(&self) -> Option<MapService> {
        self.inner.map.get()
    }

    /// The enclosing collection, if any.
    pub fn collection(&self) -> Option<&ManagedCollection> {
        self.inner.collection.as_ref()
    }

    /// The enclosing node, if any and still alive.
    pub fn node(&self) -> Option<ManagedObject> {
        self.inner.node.as_ref().and_then(WeakManagedObject::upgrade)
    }

    pub fn config(&self) -> &SyncConfig {
        &self.inner.config
    }
}
