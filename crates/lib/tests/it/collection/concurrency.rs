use mapsync::{GatedFactory, ManagedCollection, ManagedObject, ObjectProps};

use crate::helpers::*;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_duplicate_adds_leave_one_member() {
    for _ in 0..20 {
        let collection = ManagedCollection::new();
        let mut tasks = Vec::new();
        for priority in 0..8 {
            let collection = collection.clone();
            tasks.push(tokio::spawn(async move {
                collection.add(interaction("dup", priority as f64)).await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }
        assert_eq!(ids(&collection), vec!["dup"]);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_node_mounts_with_same_identity() {
    let collection = ManagedCollection::new();
    let context = collection_context(&collection);
    let nodes: Vec<ManagedObject> = (0..6)
        .map(|_| interaction_node(&context, "shared", 0.0))
        .collect();

    let mut tasks = Vec::new();
    for node in nodes.clone() {
        tasks.push(tokio::spawn(async move {
            node.init().await?;
            node.mount().await
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(collection.len(), 1);
    assert!(nodes.iter().all(|node| node.is_mounted()));
}

#[tokio::test]
async fn test_add_and_remove_before_resolution() {
    let collection = ManagedCollection::new();
    let factory = GatedFactory::new("Slow");
    let node = ManagedObject::new(
        factory.clone(),
        mapped_context(),
        ObjectProps::default().with_identity("slow"),
    );

    let init = tokio::spawn({
        let node = node.clone();
        async move { node.init().await }
    });
    let add = tokio::spawn({
        let collection = collection.clone();
        let node = node.clone();
        async move { collection.add(node).await }
    });
    while factory.calls() == 0 {
        tokio::task::yield_now().await;
    }
    assert!(collection.is_empty());

    factory.open();
    init.await.unwrap().unwrap();
    add.await.unwrap().unwrap();
    assert_eq!(ids(&collection), vec!["slow"]);

    collection.remove(&node).await.unwrap();
    collection.remove(&node).await.unwrap();
    assert!(collection.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_add_many_and_remove_many() {
    let collection = ManagedCollection::new();
    let context = mapped_context();
    let nodes: Vec<ManagedObject> = (0..10)
        .map(|index| interaction_node(&context, &format!("n{index}"), index as f64))
        .collect();
    for node in &nodes {
        node.init().await.unwrap();
    }

    collection.add_many(nodes.iter()).await.unwrap();
    assert_eq!(collection.len(), 10);
    assert_eq!(ids(&collection)[0], "n9");

    collection.remove_many(&nodes[..5]).await.unwrap();
    assert_eq!(ids(&collection), vec!["n9", "n8", "n7", "n6", "n5"]);
}
