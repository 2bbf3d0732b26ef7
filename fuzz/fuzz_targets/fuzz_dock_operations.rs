#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use panedock_core::{GroupId, PanelId, Rect};
use panedock_dock::{
    DockLayout, DockOptions, DropDirection, DropTarget, GroupOptions, InMemoryWindowHost,
    PanelOptions, PanelPosition,
};

#[derive(Debug, Arbitrary)]
enum Op {
    AddPanel { anchor: u8, direction: u8 },
    AddFloating,
    ClosePanel { panel: u8 },
    MovePanel { panel: u8, anchor: u8, direction: u8 },
    MoveGroup { group: u8, anchor: u8, direction: u8 },
    Float { group: u8 },
    Dock { group: u8 },
    Popout { group: u8 },
    Maximize { group: u8 },
    ExitMaximized,
    Visible { group: u8, visible: bool },
    Resize { group: u8, width: u16, height: u16 },
    RemoveGroup { group: u8 },
    Layout { width: u16, height: u16 },
    Reload,
}

fn direction(raw: u8) -> DropDirection {
    match raw % 5 {
        0 => DropDirection::Left,
        1 => DropDirection::Right,
        2 => DropDirection::Above,
        3 => DropDirection::Below,
        _ => DropDirection::Within,
    }
}

fn pick_panel(dock: &DockLayout<InMemoryWindowHost>, raw: u8) -> Option<PanelId> {
    let panels: Vec<PanelId> = dock.panels().map(|panel| panel.id.clone()).collect();
    (!panels.is_empty()).then(|| panels[raw as usize % panels.len()].clone())
}

fn pick_group(dock: &DockLayout<InMemoryWindowHost>, raw: u8) -> Option<GroupId> {
    let groups: Vec<GroupId> = dock.groups().map(|group| group.id()).collect();
    (!groups.is_empty()).then(|| groups[raw as usize % groups.len()])
}

fn new_dock() -> DockLayout<InMemoryWindowHost> {
    let options = DockOptions {
        width: 1024.0,
        height: 768.0,
        ..DockOptions::default()
    };
    DockLayout::with_host(options, InMemoryWindowHost::with_capacity(3))
        .expect("default options are valid")
}

fuzz_target!(|ops: Vec<Op>| {
    if ops.len() > 48 {
        return;
    }
    let mut dock = new_dock();
    let mut next = 0u32;

    for op in ops {
        let before = dock.to_json_string().expect("layout serializes");
        let result = match op {
            Op::AddPanel { anchor, direction: d } => {
                next += 1;
                let position = pick_panel(&dock, anchor)
                    .map(|anchor| PanelPosition::from(DropTarget::panel(anchor, direction(d))));
                dock.add_panel(PanelOptions::new(format!("p{next}"), "fuzz"), position)
                    .map(drop)
            }
            Op::AddFloating => {
                next += 1;
                dock.add_panel(
                    PanelOptions::new(format!("p{next}"), "fuzz"),
                    Some(PanelPosition::Floating(Some(Rect::new(10.0, 10.0, 200.0, 150.0)))),
                )
                .map(drop)
            }
            Op::ClosePanel { panel } => match pick_panel(&dock, panel) {
                Some(panel) => dock.close_panel(&panel),
                None => continue,
            },
            Op::MovePanel { panel, anchor, direction: d } => {
                match (pick_panel(&dock, panel), pick_group(&dock, anchor)) {
                    (Some(panel), Some(anchor)) => {
                        dock.move_panel(&panel, DropTarget::group(anchor, direction(d)))
                    }
                    _ => continue,
                }
            }
            Op::MoveGroup { group, anchor, direction: d } => {
                match (pick_group(&dock, group), pick_group(&dock, anchor)) {
                    (Some(group), Some(anchor)) => {
                        dock.move_group(group, DropTarget::group(anchor, direction(d)))
                    }
                    _ => continue,
                }
            }
            Op::Float { group } => match pick_group(&dock, group) {
                Some(group) => dock.float_group(group, None),
                None => continue,
            },
            Op::Dock { group } => match pick_group(&dock, group) {
                Some(group) => dock.dock_group(group, None),
                None => continue,
            },
            Op::Popout { group } => match pick_group(&dock, group) {
                Some(group) => dock.popout_group(group).map(drop),
                None => continue,
            },
            Op::Maximize { group } => match pick_group(&dock, group) {
                Some(group) => dock.maximize_group(group),
                None => continue,
            },
            Op::ExitMaximized => dock.exit_maximized().map(drop),
            Op::Visible { group, visible } => match pick_group(&dock, group) {
                Some(group) => dock.set_group_visible(group, visible).map(drop),
                None => continue,
            },
            Op::Resize { group, width, height } => match pick_group(&dock, group) {
                Some(group) => {
                    dock.resize_group(group, Some(f64::from(width)), Some(f64::from(height)))
                }
                None => continue,
            },
            Op::RemoveGroup { group } => match pick_group(&dock, group) {
                Some(group) => dock.remove_group(group),
                None => continue,
            },
            Op::Layout { width, height } => {
                dock.layout(f64::from(width), f64::from(height));
                continue;
            }
            Op::Reload => {
                let mut restored = new_dock();
                restored.layout(dock.grid().width(), dock.grid().height());
                match restored.from_json_str(&before) {
                    Ok(()) => {
                        dock = restored;
                        continue;
                    }
                    Err(err) => panic!("saved layout failed to reload: {err}"),
                }
            }
        };

        if result.is_err() {
            let after = dock.to_json_string().expect("layout serializes");
            assert_eq!(after, before, "rejected operation changed the layout");
        }
    }

    let open = dock.host().open_windows().len();
    let popouts = dock
        .groups()
        .filter(|group| group.location().window().is_some())
        .count();
    assert_eq!(open, popouts, "window bookkeeping diverged");
});
