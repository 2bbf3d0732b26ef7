use panedock::prelude::*;

fn dock() -> DockLayout {
    DockLayout::new(DockOptions {
        width: 1000.0,
        height: 500.0,
        ..DockOptions::default()
    })
    .unwrap()
}

#[test]
fn prelude_covers_a_typical_session() {
    let mut dock = dock();
    let left = dock
        .add_panel(PanelOptions::new("files", "tree"), None)
        .unwrap();
    let right = dock
        .add_panel(
            PanelOptions::new("editor", "text"),
            Some(DropTarget::panel("files", Direction::Right).into()),
        )
        .unwrap();

    assert_eq!(
        dock.group_geometry(left),
        Some(Rect::new(0.0, 0.0, 500.0, 500.0))
    );
    assert_eq!(
        dock.group_geometry(right),
        Some(Rect::new(500.0, 0.0, 500.0, 500.0))
    );

    dock.float_group(right, None).unwrap();
    assert!(matches!(
        dock.group(right).map(|g| g.location()),
        Some(Location::Floating(_))
    ));
    assert_eq!(
        dock.group_geometry(left),
        Some(Rect::new(0.0, 0.0, 1000.0, 500.0))
    );
}

#[test]
fn facade_round_trips_documents() {
    let mut dock = dock();
    dock.add_panel(PanelOptions::new("a", "x"), None).unwrap();
    dock.add_panel(
        PanelOptions::new("b", "x"),
        Some(DropTarget::panel("a", Direction::Below).into()),
    )
    .unwrap();
    let json = dock.to_json_string().unwrap();

    let mut restored = self::dock();
    restored.from_json_str(&json).unwrap();
    assert_eq!(restored.to_json_string().unwrap(), json);
    assert_eq!(
        panedock::DOCK_SCHEMA_VERSION,
        serde_json::from_str::<panedock::SerializedDock>(&json)
            .unwrap()
            .schema_version
    );
}

#[test]
fn errors_carry_a_kind() {
    let mut dock = dock();
    let err = dock.close_panel(&"missing".into()).unwrap_err();
    assert_eq!(err.kind(), DockErrorKind::NotFound);
}
