use std::{cmp::Ordering, sync::Arc};

use mapsync::{
    ManagedCollection,
    engine::{Comparator, EngineRef, default_comparator},
};

use crate::helpers::*;

#[tokio::test]
async fn test_equal_priorities_keep_insertion_order() {
    let collection = ManagedCollection::new();
    for id in ["first", "second", "third", "fourth"] {
        collection.add(interaction(id, 2.0)).await.unwrap();
    }
    collection.add(interaction("top", 3.0)).await.unwrap();
    collection.add(interaction("bottom", 1.0)).await.unwrap();

    assert_eq!(
        ids(&collection),
        vec!["top", "first", "second", "third", "fourth", "bottom"]
    );
}

#[tokio::test]
async fn test_order_matches_stable_sort_after_every_change() {
    let collection = ManagedCollection::new();
    let members: Vec<EngineRef> = [("a", 1.0), ("b", 5.0), ("c", 1.0), ("d", 3.0), ("e", 5.0)]
        .into_iter()
        .map(|(id, priority)| interaction(id, priority))
        .collect();
    let comparator = default_comparator();

    let assert_sorted = |collection: &ManagedCollection| {
        let list = collection.list();
        assert!(
            list.windows(2)
                .all(|pair| comparator(&pair[0], &pair[1]) != Ordering::Greater)
        );
    };

    for member in &members {
        collection.add(member).await.unwrap();
        assert_sorted(&collection);
    }
    members[2].set_priority(9.0);
    assert_sorted(&collection);
    collection.remove(&members[1]).await.unwrap();
    assert_sorted(&collection);
    members[3].set_priority(-2.0);
    assert_sorted(&collection);

    assert_eq!(ids(&collection), vec!["c", "e", "a", "d"]);
}

#[tokio::test]
async fn test_node_priority_resorts_enclosing_collection() {
    let collection = ManagedCollection::new();
    let context = collection_context(&collection);
    let low = mounted_node(&context, "low", 1.0).await;
    mounted_node(&context, "high", 5.0).await;
    assert_eq!(ids(&collection), vec!["high", "low"]);

    low.set_priority(6.0).await.unwrap();
    assert_eq!(ids(&collection), vec!["low", "high"]);
}

#[tokio::test]
async fn test_engine_pushes_keep_order_and_identities() {
    let collection = ManagedCollection::new();
    collection.add(interaction("a", 1.0)).await.unwrap();
    collection.add(interaction("b", 5.0)).await.unwrap();
    let handle = collection.collection_handle();
    let comparator = default_comparator();
    let assert_invariants = |collection: &ManagedCollection| {
        let list = collection.list();
        assert!(
            list.windows(2)
                .all(|pair| comparator(&pair[0], &pair[1]) != Ordering::Greater)
        );
        let mut seen = ids(collection);
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), collection.len());
    };

    handle.push(interaction("hi", 9.0));
    assert_invariants(&collection);
    handle.push(interaction("a", 20.0));
    assert_invariants(&collection);
    handle.push(interaction("mid", 3.0));
    assert_invariants(&collection);

    assert_eq!(ids(&collection), vec!["hi", "b", "mid", "a"]);
}

#[tokio::test]
async fn test_engine_reorder_is_repaired_on_next_change() {
    let collection = ManagedCollection::new();
    collection.add(interaction("a", 1.0)).await.unwrap();
    collection.add(interaction("b", 5.0)).await.unwrap();

    // Reordering is not a membership change, so nothing is observed yet
    let reversed: Comparator = Arc::new(|a: &EngineRef, b: &EngineRef| {
        default_comparator()(b, a)
    });
    collection.collection_handle().sort_by(&reversed);

    collection.collection_handle().push(interaction("c", 3.0));
    assert_eq!(ids(&collection), vec!["b", "c", "a"]);
}

#[tokio::test]
async fn test_comparator_accessor() {
    let collection = ManagedCollection::new();
    let a = interaction("a", 1.0);
    let b = interaction("b", 2.0);
    assert_eq!(collection.comparator()(&a, &b), Ordering::Greater);
}
