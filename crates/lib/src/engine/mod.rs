//! Engine object model.
//!
//! The mapping engine owns the actual objects this crate keeps in sync. This
//! module describes the slice of that object model the synchronization core
//! relies on: per-object identity, activation and priority with change
//! notification ([`EngineObject`]), and an ordered container that reports its
//! structural changes ([`ObjectCollection`]).
//!
//! [`BaseObject`] is a complete in-process implementation of [`EngineObject`],
//! used for the default interaction set and by tests.

use std::{cmp::Ordering, fmt::Debug, sync::Arc};

use crate::{Identity, constants::DEFAULT_PRIORITY, throttle::Coalesce};

pub mod collection;
pub mod defaults;
pub mod errors;
pub mod listeners;
pub mod object;

pub use collection::{CollectionChange, ObjectCollection};
pub use defaults::{DefaultInteractions, create_default_interactions};
pub use errors::EngineError;
pub use listeners::{Listener, ListenerKey, Listeners};
pub use object::BaseObject;

/// Shared reference to an engine object.
pub type EngineRef = Arc<dyn EngineObject>;

/// Ordering function over engine objects.
pub type Comparator = Arc<dyn Fn(&EngineRef, &EngineRef) -> Ordering + Send + Sync>;

/// Capability family of an engine object.
///
/// A collection only admits objects of the kind it was created for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// Map interaction (drag, zoom, select, ...).
    Interaction,
    /// Map control (zoom buttons, attribution, ...).
    Control,
    /// Map layer.
    Layer,
    /// Map overlay.
    Overlay,
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ObjectKind::Interaction => "interaction",
            ObjectKind::Control => "control",
            ObjectKind::Layer => "layer",
            ObjectKind::Overlay => "overlay",
        };
        f.write_str(name)
    }
}

/// Properties of an engine object the synchronization core observes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
    Identity,
    Active,
    Priority,
}

impl Property {
    /// Property name as used in `update:<name>` notifications.
    pub fn name(&self) -> &'static str {
        match self {
            Property::Identity => "id",
            Property::Active => "active",
            Property::Priority => "priority",
        }
    }
}

/// A single native property change, carrying the new value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyChange {
    Identity(Identity),
    Active(bool),
    Priority(f64),
}

impl PropertyChange {
    /// Which property changed.
    pub fn property(&self) -> Property {
        match self {
            PropertyChange::Identity(_) => Property::Identity,
            PropertyChange::Active(_) => Property::Active,
            PropertyChange::Priority(_) => Property::Priority,
        }
    }
}

impl Coalesce for PropertyChange {
    type Key = Property;

    fn coalesce_key(&self) -> Property {
        self.property()
    }
}

/// An externally owned, mutable engine object.
///
/// Mutators notify registered listeners synchronously, and only when the
/// stored value actually changes.
pub trait EngineObject: Send + Sync + Debug {
    /// Capability family of this object.
    fn kind(&self) -> ObjectKind;

    /// Human readable type name, e.g. `DragPan`.
    fn name(&self) -> &str;

    fn identity(&self) -> Option<Identity>;
    fn set_identity(&self, identity: Identity);

    fn active(&self) -> bool;
    fn set_active(&self, active: bool);

    /// Priority, if one was ever assigned.
    fn priority(&self) -> Option<f64>;
    fn set_priority(&self, priority: f64);

    /// Register a property change listener.
    fn on_change(&self, listener: Listener<PropertyChange>) -> ListenerKey;

    /// Remove a listener. Returns false if the key was unknown.
    fn un_listen(&self, key: ListenerKey) -> bool;

    /// Bump the generic [`EngineObject::revision`]. Property listeners are
    /// not notified.
    fn changed(&self);

    /// Generic change counter of the object.
    fn revision(&self) -> u64;
}

/// Priority used for ordering, treating an absent priority as the default.
pub fn effective_priority(object: &EngineRef) -> f64 {
    object.priority().unwrap_or(DEFAULT_PRIORITY)
}

/// Generic pre-flight initialization.
///
/// Assigns a generated identity if the object has none and defaults its
/// priority. Existing values are left untouched.
pub fn initialize_object(object: &EngineRef) {
    if object.identity().is_none() {
        object.set_identity(Identity::generate());
    }
    if object.priority().is_none() {
        object.set_priority(DEFAULT_PRIORITY);
    }
}

/// Default ordering: higher priority first.
///
/// Used with a stable sort, members of equal priority keep their relative
/// order.
pub fn default_comparator() -> Comparator {
    Arc::new(|a: &EngineRef, b: &EngineRef| {
        effective_priority(b).total_cmp(&effective_priority(a))
    })
}
