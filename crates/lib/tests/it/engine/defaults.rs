use mapsync::{
    ManagedCollection,
    engine::{DefaultInteractions, create_default_interactions},
};

#[test]
fn test_toggles_from_json() {
    let options: DefaultInteractions =
        serde_json::from_str(r#"{ "double_click_zoom": false, "keyboard": false }"#).unwrap();
    assert_eq!(
        options.names(),
        vec![
            "DragRotate",
            "DragPan",
            "PinchRotate",
            "PinchZoom",
            "MouseWheelZoom",
            "DragZoom",
        ]
    );
    assert!(DefaultInteractions::none().names().is_empty());
}

#[tokio::test]
async fn test_default_set_gets_identities_on_admission() {
    let options = DefaultInteractions {
        pinch_rotate: false,
        pinch_zoom: false,
        ..DefaultInteractions::default()
    };
    let collection = ManagedCollection::new();
    collection.init_members(options.clone()).await.unwrap();

    let names: Vec<String> = collection
        .list()
        .iter()
        .map(|object| object.name().to_string())
        .collect();
    assert_eq!(names, options.names());
    assert!(collection.list().iter().all(|o| o.identity().is_some()));
    assert!(collection.list().iter().all(|o| o.priority() == Some(0.0)));

    // A fresh set never collides with generated identities
    let again = create_default_interactions(&options);
    collection.add_many(again.to_vec()).await.unwrap();
    assert_eq!(collection.len(), 2 * options.names().len());
}
