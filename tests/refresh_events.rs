use itemstate_core::{
    EngineConfig, Event, EventKind, InMemoryItemStateManager, ItemId, ItemState,
    ItemStateManager, NodeId, Path, QName, Status,
};
use std::sync::Arc;

fn uuid(n: u128) -> NodeId {
    NodeId::Uuid(uuid::Uuid::from_u128(n))
}

fn registered_root(manager: &InMemoryItemStateManager) -> (ItemId, Arc<ItemState>) {
    let ws = ItemState::new_workspace_node(
        uuid(1),
        QName::unqualified(""),
        QName::unqualified("nt:base"),
        vec![],
    );
    let id = ws.id().clone();
    manager.register_workspace(ws).unwrap();
    let session = manager.new_session_node(&id, QName::unqualified("")).unwrap();
    (id, session)
}

#[test]
fn node_added_event_is_visible_through_a_connected_session() {
    let manager = InMemoryItemStateManager::new();
    let (id, session) = registered_root(&manager);

    manager
        .refresh(
            &id,
            &Event::new(
                EventKind::NodeAdded,
                ItemId::Node(uuid(2)),
                QName::unqualified("child"),
                Path::root(),
            ),
        )
        .unwrap();

    let children = session.child_node_entries().unwrap();
    assert_eq!(children.get_by_name(&QName::unqualified("child")).len(), 1);
}

#[test]
fn reorder_event_moves_the_entry_before_its_target() {
    let manager = InMemoryItemStateManager::new();
    let (id, session) = registered_root(&manager);

    for (i, name) in ["a", "b", "c"].iter().enumerate() {
        manager
            .refresh(
                &id,
                &Event::new(
                    EventKind::NodeAdded,
                    ItemId::Node(uuid(2 + i as u128)),
                    QName::unqualified(*name),
                    Path::root(),
                ),
            )
            .unwrap();
    }

    // Move "c" (uuid 4) to before "a" (uuid 2).
    manager
        .refresh(
            &id,
            &Event::reorder(ItemId::Node(uuid(4)), QName::unqualified("c"), Path::root(), Some(uuid(2))),
        )
        .unwrap();

    let children = session.child_node_entries().unwrap();
    let names: Vec<_> = children.iter().map(|e| e.name.clone()).collect();
    assert_eq!(
        names,
        vec![
            QName::unqualified("c"),
            QName::unqualified("a"),
            QName::unqualified("b"),
        ]
    );
}

#[test]
fn disabling_reorder_detection_leaves_child_order_untouched() {
    let manager = InMemoryItemStateManager::with_config(EngineConfig {
        reorder_detection_enabled: false,
    });
    let (id, session) = registered_root(&manager);

    manager
        .refresh(
            &id,
            &Event::new(
                EventKind::NodeAdded,
                ItemId::Node(uuid(2)),
                QName::unqualified("a"),
                Path::root(),
            ),
        )
        .unwrap();
    manager
        .refresh(
            &id,
            &Event::new(
                EventKind::NodeAdded,
                ItemId::Node(uuid(3)),
                QName::unqualified("b"),
                Path::root(),
            ),
        )
        .unwrap();
    manager
        .refresh(
            &id,
            &Event::reorder(ItemId::Node(uuid(3)), QName::unqualified("b"), Path::root(), Some(uuid(2))),
        )
        .unwrap();

    let children = session.child_node_entries().unwrap();
    let names: Vec<_> = children.iter().map(|e| e.name.clone()).collect();
    assert_eq!(names, vec![QName::unqualified("a"), QName::unqualified("b")]);
}

#[test]
fn self_targeted_node_removed_event_destroys_the_workspace_state() {
    let manager = InMemoryItemStateManager::new();
    let ws = ItemState::new_workspace_node(
        uuid(1),
        QName::unqualified(""),
        QName::unqualified("nt:base"),
        vec![],
    );
    let id = ws.id().clone();
    manager.register_workspace(ws.clone()).unwrap();

    manager
        .refresh(
            &id,
            &Event::new(EventKind::NodeRemoved, id.clone(), QName::unqualified(""), Path::root()),
        )
        .unwrap();

    assert_eq!(ws.status(), Status::Removed);
}

#[test]
fn refresh_on_a_property_state_rejects_structural_events_about_other_ids() {
    let manager = InMemoryItemStateManager::new();
    let ws = ItemState::new_workspace_property(
        itemstate_core::PropertyId::new(uuid(1), QName::unqualified("title")),
        vec![itemstate_core::PropertyValue::String("hi".into())],
    );
    let id = ws.id().clone();
    manager.register_workspace(ws).unwrap();

    let result = manager.refresh(
        &id,
        &Event::new(
            EventKind::NodeAdded,
            ItemId::Node(uuid(9)),
            QName::unqualified("child"),
            Path::root(),
        ),
    );
    assert!(result.is_err());
}
