use std::sync::{Arc, Mutex};

use mapsync::{
    Identity,
    engine::{
        BaseObject, CollectionChange, EngineObject, EngineRef, ObjectCollection, ObjectKind,
        PropertyChange, initialize_object,
    },
};

#[test]
fn test_listener_may_mutate_the_emitting_object() {
    let object = Arc::new(BaseObject::interaction("DragPan"));
    let weak = Arc::downgrade(&object);
    object.on_change(Arc::new(move |change: &PropertyChange| {
        // Clamp negative priorities
        if let PropertyChange::Priority(priority) = change {
            if *priority < 0.0 {
                if let Some(object) = weak.upgrade() {
                    object.set_priority(0.0);
                }
            }
        }
    }));

    object.set_priority(-4.0);
    assert_eq!(object.priority(), Some(0.0));
}

#[test]
fn test_container_reports_engine_edits_in_order() {
    let collection = ObjectCollection::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    collection.listen(Arc::new(move |change: &CollectionChange| {
        let tag = match change {
            CollectionChange::Added(object) => format!("+{}", object.name()),
            CollectionChange::Removed(object) => format!("-{}", object.name()),
        };
        sink.lock().unwrap().push(tag);
    }));

    let pan: EngineRef = Arc::new(BaseObject::interaction("Pan"));
    let zoom: EngineRef = Arc::new(BaseObject::interaction("Zoom"));
    collection.push(Arc::clone(&pan));
    collection.push(Arc::clone(&zoom));
    collection.remove(&pan);
    collection.clear();

    assert_eq!(*seen.lock().unwrap(), vec!["+Pan", "+Zoom", "-Pan", "-Zoom"]);
}

#[test]
fn test_initialize_keeps_numeric_identity() {
    let object: EngineRef = Arc::new(
        BaseObject::new(ObjectKind::Control, "Attribution").with_identity(12i64),
    );
    initialize_object(&object);
    assert_eq!(object.identity(), Some(Identity::Num(12)));
    assert_eq!(object.identity().unwrap().as_num(), Some(12));
    assert_eq!(object.kind().to_string(), "control");
}
