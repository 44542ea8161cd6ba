use std::{sync::Arc, time::Duration};

use mapsync::{
    Context, InteractionFactory, ManagedCollection, ManagedObject, MapService, ObjectProps,
    engine::{BaseObject, EngineRef},
};

/// Creates a root context whose ancestor map is already available.
pub fn mapped_context() -> Context {
    let context = Context::new();
    context.map_slot().provide(MapService::new("map"));
    context
}

/// Creates a mapped context whose nodes register with `collection`.
pub fn collection_context(collection: &ManagedCollection) -> Context {
    mapped_context().with_collection(collection.clone())
}

/// Creates a raw interaction object with the given identity and priority.
pub fn interaction(id: &str, priority: f64) -> EngineRef {
    Arc::new(
        BaseObject::interaction(id)
            .with_identity(id)
            .with_priority(priority),
    )
}

/// Creates an unresolved interaction node.
pub fn interaction_node(context: &Context, id: &str, priority: f64) -> ManagedObject {
    ManagedObject::new(
        InteractionFactory::new("DragPan"),
        context.clone(),
        ObjectProps::default()
            .with_identity(id)
            .with_priority(priority),
    )
}

/// Creates, initializes and mounts an interaction node.
pub async fn mounted_node(context: &Context, id: &str, priority: f64) -> ManagedObject {
    let node = interaction_node(context, id, priority);
    node.init().await.expect("Failed to init node");
    node.mount().await.expect("Failed to mount node");
    node
}

/// Ordered identities of a collection, as strings.
pub fn ids(collection: &ManagedCollection) -> Vec<String> {
    collection
        .identities()
        .iter()
        .map(|id| id.to_string())
        .collect()
}

/// Lets the change throttle elapse and deferred notifications flush.
///
/// Only meaningful under a paused clock.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
