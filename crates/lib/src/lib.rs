//! Mapsync: keeps a declarative node tree in sync with an imperative map engine.
//! This library provides the synchronization core that sits between the two.
//!
//! ## Core Concepts
//!
//! * **Engine objects (`engine::EngineObject`)**: Externally owned, mutable objects (interactions, controls, layers) with an identity, an activation flag and a priority. `engine::ObjectCollection` is the ordered container the engine reads them from.
//! * **Managed objects (`object::ManagedObject`)**: A node wrapping exactly one lazily created engine object behind an asynchronous handle, with `init`/`mount`/`unmount`/`deinit`/`recreate`/`destroy` lifecycle hooks and a throttled bridge that folds native property changes back into the node.
//! * **Managed collections (`collection::ManagedCollection`)**: An ordered, identity-deduplicated, priority-sorted aggregate of engine objects contributed by nodes or supplied directly, republishing native membership changes as `member-added` / `member-removed` notifications.
//! * **Context (`context::Context`)**: The explicit service lookup through which a node finds its ancestor map and enclosing collection.
//! * **Configuration (`config::SyncConfig`)**: Throttle interval, `init` timeout and notification buffer sizes.

pub mod collection;
pub mod config;
pub mod constants;
pub mod context;
pub mod engine;
pub mod identity;
pub mod notify;
pub mod object;
pub mod revision;
pub mod throttle;
pub mod traits;

pub use collection::{CollectionEvent, InitialMembers, ManagedCollection, Member};
pub use config::SyncConfig;
pub use context::{Context, MapService, ServiceSlot};
pub use identity::Identity;
pub use notify::Emitter;
#[cfg(any(test, feature = "testing"))]
pub use object::GatedFactory;
pub use object::{
    FnFactory, InteractionFactory, ManagedObject, ObjectEvent, ObjectFactory, ObjectProps,
    WeakManagedObject,
};
pub use revision::Revision;
pub use throttle::{Coalesce, Throttle};
pub use traits::{EventBridged, Orderable, Resolvable};

/// Result type used throughout the Mapsync library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the Mapsync library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Structured errors from the object module
    #[error(transparent)]
    Object(object::ObjectError),

    /// Structured errors from the collection module
    #[error(transparent)]
    Collection(collection::CollectionError),

    /// Structured errors from engine object construction
    #[error(transparent)]
    Engine(engine::EngineError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Serialize(_) => "serialize",
            Error::Object(_) => "object",
            Error::Collection(_) => "collection",
            Error::Engine(_) => "engine",
        }
    }

    /// Check if this error reports a destroyed node.
    pub fn is_disposed(&self) -> bool {
        match self {
            Error::Object(object_err) => object_err.is_disposed(),
            _ => false,
        }
    }

    /// Check if this error indicates a timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Object(object_err) => object_err.is_timeout(),
            _ => false,
        }
    }

    /// Check if this error is a collection kind mismatch.
    pub fn is_type_mismatch(&self) -> bool {
        match self {
            Error::Collection(collection_err) => collection_err.is_type_mismatch(),
            _ => false,
        }
    }

    /// Check if this error is an engine object construction failure.
    pub fn is_construction_error(&self) -> bool {
        match self {
            Error::Engine(engine_err) => engine_err.is_construction_error(),
            _ => false,
        }
    }

    /// Check if this error is object-related.
    pub fn is_object_error(&self) -> bool {
        matches!(self, Error::Object(_))
    }

    /// Check if this error is collection-related.
    pub fn is_collection_error(&self) -> bool {
        matches!(self, Error::Collection(_))
    }

    /// Check if this error is engine-related.
    pub fn is_engine_error(&self) -> bool {
        matches!(self, Error::Engine(_))
    }
}
