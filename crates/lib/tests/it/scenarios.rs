//! End-to-end scenarios over a small node tree: a map, an interaction
//! collection and interaction nodes declared under it.

use std::time::Duration;

use mapsync::{CollectionEvent, Context, ManagedCollection, MapService, SyncConfig};

use crate::helpers::*;

#[tokio::test]
async fn test_priority_scenario() {
    let collection = ManagedCollection::new();
    let a = interaction("a", 1.0);
    collection.add(&a).await.unwrap();
    collection.add(interaction("b", 5.0)).await.unwrap();
    collection.add(interaction("c", 1.0)).await.unwrap();
    assert_eq!(ids(&collection), vec!["b", "a", "c"]);

    a.set_priority(10.0);
    assert_eq!(ids(&collection), vec!["a", "b", "c"]);
}

#[tokio::test(start_paused = true)]
async fn test_tree_declared_before_map_exists() {
    let root = Context::with_config(SyncConfig::default());
    let collection = ManagedCollection::new();
    collection.init_members(false).await.unwrap();
    let context = root.with_collection(collection.clone());
    let mut events = collection.subscribe();

    // Children are declared and start their lifecycle before the map exists
    let nodes: Vec<_> = [("select", 2.0), ("draw", 5.0), ("modify", 1.0)]
        .into_iter()
        .map(|(id, priority)| interaction_node(&context, id, priority))
        .collect();
    let mut lifecycles = Vec::new();
    for node in &nodes {
        let node = node.clone();
        lifecycles.push(tokio::spawn(async move {
            node.init().await?;
            node.mount().await
        }));
    }

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(collection.is_empty());
    assert!(nodes.iter().all(|node| !node.is_resolved()));

    root.map_slot().provide(MapService::new("map"));
    for lifecycle in lifecycles {
        lifecycle.await.unwrap().unwrap();
    }
    settle().await;

    assert_eq!(ids(&collection), vec!["draw", "select", "modify"]);
    let mut added = 0;
    while let Ok(event) = events.try_recv() {
        assert!(matches!(event, CollectionEvent::MemberAdded(_)));
        added += 1;
    }
    assert_eq!(added, 3);

    // Reprioritize through the node, observe it on the node and in order
    nodes[2].set_priority(7.0).await.unwrap();
    settle().await;
    assert_eq!(ids(&collection), vec!["modify", "draw", "select"]);
    assert_eq!(nodes[2].props().priority, 7.0);
    assert_eq!(nodes[2].revision(), 1);

    // Tearing down one node removes exactly its object
    nodes[1].destroy().await.unwrap();
    assert_eq!(ids(&collection), vec!["modify", "select"]);
    settle().await;
    assert!(matches!(
        events.try_recv().unwrap(),
        CollectionEvent::MemberRemoved(_)
    ));
}

#[tokio::test(start_paused = true)]
async fn test_defaults_plus_declared_nodes() {
    let collection = ManagedCollection::new();
    collection.init_members(true).await.unwrap();
    let defaults = collection.len();
    let context = collection_context(&collection);

    let select = mounted_node(&context, "select", 10.0).await;
    assert_eq!(collection.len(), defaults + 1);
    assert_eq!(ids(&collection)[0], "select");

    select.set_active(false).await.unwrap();
    settle().await;
    assert!(!select.props().active);
    assert!(!collection.find_by_identity(&"select".into()).unwrap().active());

    select.unmount().await.unwrap();
    assert_eq!(collection.len(), defaults);
}
