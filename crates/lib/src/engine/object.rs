//! In-process engine object.

use std::sync::{
    Mutex,
    atomic::{AtomicU64, Ordering},
};

use super::{EngineObject, Listener, ListenerKey, Listeners, ObjectKind, PropertyChange};
use crate::Identity;

#[derive(Debug)]
struct ObjectState {
    identity: Option<Identity>,
    active: bool,
    priority: Option<f64>,
}

/// Engine object with identity, activation and priority properties.
///
/// Newly created objects are active, have no identity and no priority.
#[derive(Debug)]
pub struct BaseObject {
    kind: ObjectKind,
    name: String,
    state: Mutex<ObjectState>,
    listeners: Listeners<PropertyChange>,
    revision: AtomicU64,
}

impl BaseObject {
    pub fn new(kind: ObjectKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            state: Mutex::new(ObjectState {
                identity: None,
                active: true,
                priority: None,
            }),
            listeners: Listeners::new(),
            revision: AtomicU64::new(0),
        }
    }

    /// Create an interaction object.
    pub fn interaction(name: impl Into<String>) -> Self {
        Self::new(ObjectKind::Interaction, name)
    }

    pub fn with_identity(self, identity: impl Into<Identity>) -> Self {
        self.state.lock().unwrap().identity = Some(identity.into());
        self
    }

    pub fn with_priority(self, priority: f64) -> Self {
        self.state.lock().unwrap().priority = Some(priority);
        self
    }

    pub fn with_active(self, active: bool) -> Self {
        self.state.lock().unwrap().active = active;
        self
    }

    /// Number of registered change listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Apply `update` under the state lock and notify listeners if it
    /// reported a change.
    fn update(&self, update: impl FnOnce(&mut ObjectState) -> Option<PropertyChange>) {
        let change = update(&mut self.state.lock().unwrap());
        if let Some(change) = change {
            self.listeners.emit(&change);
        }
    }
}

impl EngineObject for BaseObject {
    fn kind(&self) -> ObjectKind {
        self.kind
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn identity(&self) -> Option<Identity> {
        self.state.lock().unwrap().identity.clone()
    }

    fn set_identity(&self, identity: Identity) {
        self.update(|state| {
            if state.identity.as_ref() == Some(&identity) {
                return None;
            }
            state.identity = Some(identity.clone());
            Some(PropertyChange::Identity(identity))
        });
    }

    fn active(&self) -> bool {
        self.state.lock().unwrap().active
    }

    fn set_active(&self, active: bool) {
        self.update(|state| {
            if state.active == active {
                return None;
            }
            state.active = active;
            Some(PropertyChange::Active(active))
        });
    }

    fn priority(&self) -> Option<f64> {
        self.state.lock().unwrap().priority
    }

    fn set_priority(&self, priority: f64) {
        self.update(|state| {
            if state.priority == Some(priority) {
                return None;
            }
            state.priority = Some(priority);
            Some(PropertyChange::Priority(priority))
        });
    }

    fn on_change(&self, listener: Listener<PropertyChange>) -> ListenerKey {
        self.listeners.add(listener)
    }

    fn un_listen(&self, key: ListenerKey) -> bool {
        self.listeners.remove(key)
    }

    fn changed(&self) {
        self.revision.fetch_add(1, Ordering::SeqCst);
    }

    fn revision(&self) -> u64 {
        self.revision.load(Ordering::SeqCst)
    }
}
