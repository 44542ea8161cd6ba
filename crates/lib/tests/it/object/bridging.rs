use std::{sync::Arc, time::Duration};

use mapsync::{
    Context, EventBridged, FnFactory, Identity, ManagedObject, MapService, ObjectEvent,
    ObjectProps, SyncConfig,
    engine::{BaseObject, EngineRef, Property, PropertyChange},
};

use crate::helpers::*;

#[tokio::test(start_paused = true)]
async fn test_rapid_native_changes_coalesce() {
    let node = interaction_node(&mapped_context(), "pan", 0.0);
    node.init().await.unwrap();
    let mut events = node.subscribe();
    let object = node.resolve().await.unwrap();

    for step in 1..=20 {
        object.set_priority(step as f64);
    }
    settle().await;

    assert_eq!(node.revision(), 1);
    assert_eq!(node.props().priority, 20.0);
    assert_eq!(
        events.try_recv().unwrap(),
        ObjectEvent::Update(PropertyChange::Priority(20.0))
    );
    assert!(events.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_changes_in_separate_intervals_are_separate() {
    let node = interaction_node(&mapped_context(), "pan", 0.0);
    node.init().await.unwrap();
    let object = node.resolve().await.unwrap();

    object.set_active(false);
    settle().await;
    object.set_active(true);
    settle().await;

    assert_eq!(node.revision(), 2);
    assert!(node.props().active);
}

#[tokio::test(start_paused = true)]
async fn test_identity_round_trip() {
    let node = interaction_node(&mapped_context(), "pan", 0.0);
    node.init().await.unwrap();
    let mut events = node.events();

    node.set_identity(42i64).await.unwrap();
    assert_eq!(node.identity().await.unwrap(), Some(Identity::from(42i64)));
    settle().await;
    assert_eq!(EventBridged::revision(&node), 1);
    let event = events.try_recv().unwrap();
    assert_eq!(event.name(), "update:id");
    assert_eq!(event.property(), Property::Identity);

    node.set_identity(42i64).await.unwrap();
    settle().await;
    assert_eq!(node.revision(), 1);
    assert!(events.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_custom_throttle_interval() {
    let config = SyncConfig::default().with_throttle_interval(Duration::from_millis(500));
    let context = Context::with_config(config);
    context.map_slot().provide(MapService::new("map"));
    let node = interaction_node(&context, "pan", 0.0);
    node.init().await.unwrap();
    let object = node.resolve().await.unwrap();

    object.set_priority(1.0);
    tokio::time::sleep(Duration::from_millis(100)).await;
    object.set_priority(2.0);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(node.revision(), 0);

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(node.revision(), 1);
    assert_eq!(node.props().priority, 2.0);
}

#[tokio::test(start_paused = true)]
async fn test_deinit_stops_bridging() {
    let node = interaction_node(&mapped_context(), "pan", 0.0);
    node.init().await.unwrap();
    let object = node.resolve().await.unwrap();

    node.deinit();
    object.set_priority(8.0);
    settle().await;

    assert_eq!(node.revision(), 0);
}

#[tokio::test]
async fn test_dropped_node_releases_engine_listener() {
    let shared = Arc::new(BaseObject::interaction("DragPan"));
    let factory = FnFactory::new({
        let shared = Arc::clone(&shared);
        move |_context: Context| {
            let object: EngineRef = shared.clone();
            async move { Ok(object) }
        }
    });
    let node = ManagedObject::new(factory, mapped_context(), ObjectProps::default());
    node.init().await.unwrap();
    assert_eq!(shared.listener_count(), 1);

    drop(node);
    assert_eq!(shared.listener_count(), 0);
}
