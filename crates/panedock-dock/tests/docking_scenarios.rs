//! Docking scenarios and random operation streams against `DockLayout`.
//!
//! The scripted tests pin tab membership, group lifetime and the
//! float-then-dock restore. The random streams mix every operation kind and
//! check after each step that active panels stay valid, the panel lookup
//! agrees with the groups, grid leaves match the in-grid groups, and that a
//! rejected operation changes nothing and emits nothing.

use std::cell::RefCell;
use std::rc::Rc;

use panedock_core::{Direction, GroupId, PanelId, Rect};
use panedock_dock::{
    DockError, DockErrorKind, DockEvent, DockLayout, DockOptions, DropDirection, DropReference,
    DropTarget, GroupOptions, InMemoryWindowHost, Location, LocationKind, PanelOptions,
    PanelPosition,
};
use panedock_layout::GridNode;
use proptest::prelude::*;

const WIDTH: f64 = 1200.0;
const HEIGHT: f64 = 800.0;
const TOLERANCE: f64 = 1e-6;

fn options() -> DockOptions {
    DockOptions {
        width: WIDTH,
        height: HEIGHT,
        ..DockOptions::default()
    }
}

fn panel(id: &str) -> PanelOptions {
    PanelOptions::new(id, "text")
}

fn pid(id: &str) -> PanelId {
    PanelId::from(id)
}

fn within(group: GroupId) -> Option<PanelPosition> {
    Some(DropTarget::group(group, DropDirection::Within).into())
}

fn next_to(panel: &str, direction: Direction) -> Option<PanelPosition> {
    Some(DropTarget::panel(panel, direction).into())
}

fn assert_rect_close(actual: Option<Rect>, expected: Option<Rect>) {
    match (actual, expected) {
        (Some(a), Some(e)) => {
            for (x, y) in [
                (a.x, e.x),
                (a.y, e.y),
                (a.width, e.width),
                (a.height, e.height),
            ] {
                assert!((x - y).abs() <= TOLERANCE, "{a:?} != {e:?}");
            }
        }
        (a, e) => assert_eq!(a, e),
    }
}

#[test]
fn within_position_joins_the_reference_group() {
    let mut dock = DockLayout::new(options()).unwrap();
    let g1 = dock.add_panel(panel("p1"), None).unwrap();
    let leaves = dock.grid().leaf_count();
    let g2 = dock
        .add_panel(
            panel("p2"),
            Some(DropTarget::panel("p1", DropDirection::Within).into()),
        )
        .unwrap();

    assert_eq!(g1, g2);
    let group = dock.group(g1).unwrap();
    assert_eq!(group.panels(), &[pid("p1"), pid("p2")]);
    assert_eq!(group.active_panel(), Some(&pid("p2")));
    assert_eq!(dock.grid().leaf_count(), leaves);
}

#[test]
fn closing_the_last_panel_collapses_its_branch() {
    let mut dock = DockLayout::new(options()).unwrap();
    let g1 = dock.add_panel(panel("a"), None).unwrap();
    let g2 = dock.add_panel(panel("b"), next_to("a", Direction::Right)).unwrap();
    let g3 = dock.add_panel(panel("c"), next_to("b", Direction::Below)).unwrap();
    assert_eq!(dock.grid().leaf_count(), 3);

    dock.close_panel(&pid("c")).unwrap();

    assert!(dock.group(g3).is_none());
    assert!(dock.panel(&pid("c")).is_none());
    let grid = dock.grid();
    let children = grid.children(grid.root()).unwrap();
    assert_eq!(children.len(), 2);
    let groups: Vec<GroupId> = children
        .iter()
        .map(|child| match grid.node(*child) {
            Some(GridNode::Leaf(leaf)) => leaf.data,
            other => panic!("expected a leaf, got {other:?}"),
        })
        .collect();
    assert_eq!(groups, vec![g1, g2]);
    grid.validate().unwrap();
}

#[test]
fn float_then_dock_restores_the_previous_grid() {
    let mut dock = DockLayout::new(options()).unwrap();
    let g1 = dock.add_panel(panel("a"), None).unwrap();
    let g2 = dock.add_panel(panel("b"), next_to("a", Direction::Right)).unwrap();
    let g3 = dock.add_panel(panel("c"), next_to("b", Direction::Below)).unwrap();
    dock.resize_group(g1, Some(420.0), None).unwrap();
    dock.resize_group(g2, None, Some(250.0)).unwrap();

    let shape = dock.grid().shape_hash();
    let before: Vec<Option<Rect>> = [g1, g2, g3]
        .iter()
        .map(|g| dock.group_geometry(*g))
        .collect();

    dock.float_group(g3, Some(Rect::new(50.0, 50.0, 300.0, 200.0)))
        .unwrap();
    assert_eq!(dock.grid().leaf_count(), 2);
    assert_eq!(
        dock.group(g3).unwrap().location().kind(),
        LocationKind::Floating
    );

    dock.dock_group(g3, None).unwrap();
    assert_eq!(dock.grid().shape_hash(), shape);
    for (group, expected) in [g1, g2, g3].iter().zip(before) {
        assert_rect_close(dock.group_geometry(*group), expected);
    }
}

#[test]
fn docking_after_grid_changes_lands_on_the_trailing_edge() {
    let mut dock = DockLayout::new(options()).unwrap();
    dock.add_panel(panel("a"), None).unwrap();
    let g2 = dock.add_panel(panel("b"), next_to("a", Direction::Below)).unwrap();
    dock.float_group(g2, None).unwrap();
    assert_eq!(
        dock.group_geometry(g2),
        Some(dock.options().floating_default)
    );
    dock.add_panel(panel("c"), next_to("a", Direction::Right)).unwrap();

    dock.dock_group(g2, None).unwrap();
    assert_eq!(dock.group(g2).unwrap().location(), &Location::Grid);
    let rect = dock.group_geometry(g2).unwrap();
    assert!((rect.right() - WIDTH).abs() <= TOLERANCE);
    dock.grid().validate().unwrap();
}

#[test]
fn docking_into_a_group_merges_tabs() {
    let mut dock = DockLayout::new(options()).unwrap();
    let g1 = dock.add_panel(panel("a"), None).unwrap();
    let floating = dock
        .add_panel(panel("b"), Some(PanelPosition::Floating(None)))
        .unwrap();
    dock.add_panel(panel("c"), None).unwrap();
    dock.move_panel(&pid("c"), DropTarget::group(g1, DropDirection::Within))
        .unwrap();
    assert!(
        dock.add_panel(panel("d"), within(floating))
            .is_err_and(|err| err.kind() == DockErrorKind::InvalidLocation)
    );

    dock.dock_group(floating, Some(DropTarget::group(g1, DropDirection::Within).at_index(0)))
        .unwrap();
    assert!(dock.group(floating).is_none());
    let group = dock.group(g1).unwrap();
    assert_eq!(group.panels(), &[pid("b"), pid("a"), pid("c")]);
    assert_eq!(group.active_panel(), Some(&pid("b")));
    assert_eq!(dock.group_of_panel(&pid("b")), Some(g1));
}

#[test]
fn moving_a_group_keeps_its_identity() {
    let mut dock = DockLayout::new(options()).unwrap();
    let g1 = dock.add_panel(panel("a"), None).unwrap();
    let g2 = dock.add_panel(panel("b"), next_to("a", Direction::Right)).unwrap();
    dock.move_group(g1, DropTarget::group(g2, Direction::Below))
        .unwrap();
    let top = dock.group_geometry(g2).unwrap();
    let bottom = dock.group_geometry(g1).unwrap();
    assert!(top.y < bottom.y);
    assert!((top.width - WIDTH).abs() <= TOLERANCE);
    assert!(
        dock.move_group(g1, DropTarget::group(g1, Direction::Left))
            .is_err_and(|err| err.kind() == DockErrorKind::InvalidLocation)
    );
}

#[test]
fn unknown_references_are_not_found() {
    let mut dock = DockLayout::new(options()).unwrap();
    let g = dock.add_panel(panel("a"), None).unwrap();
    let missing = GroupId::new(g.get() + 100).unwrap();
    for result in [
        dock.close_panel(&pid("nope")),
        dock.set_active_panel(&pid("nope")),
        dock.remove_group(missing),
        dock.float_group(missing, None),
        dock.move_panel(&pid("a"), DropTarget::panel("nope", Direction::Left)),
        dock.move_group(
            g,
            DropTarget {
                reference: DropReference::Root,
                direction: DropDirection::Within,
                index: None,
            },
        ),
    ] {
        assert_eq!(result.map_err(|e| e.kind()), Err(DockErrorKind::NotFound));
    }
}

#[test]
fn popout_windows_follow_the_group() {
    let mut dock = DockLayout::with_host(options(), InMemoryWindowHost::with_capacity(1)).unwrap();
    let g1 = dock.add_panel(panel("a"), None).unwrap();
    let g2 = dock.add_panel(panel("b"), next_to("a", Direction::Right)).unwrap();

    let handle = dock.popout_group(g1).unwrap();
    assert_eq!(dock.group(g1).unwrap().location().window(), Some(handle));
    let err = dock.popout_group(g2).unwrap_err();
    assert_eq!(err.kind(), DockErrorKind::DetachFailed);
    assert_eq!(dock.group(g2).unwrap().location(), &Location::Grid);

    assert!(
        dock.maximize_group(g1)
            .is_err_and(|err| err.kind() == DockErrorKind::InvalidLocation)
    );
    assert!(
        dock.resize_group(g1, Some(10.0), None)
            .is_err_and(|err| err.kind() == DockErrorKind::InvalidLocation)
    );

    dock.remove_group(g1).unwrap();
    assert!(dock.host().open_windows().is_empty());
    let second = dock.popout_group(g2).unwrap();
    assert_ne!(second, handle);
}

#[test]
fn hidden_groups_stay_hidden_across_maximize() {
    let mut dock = DockLayout::new(options()).unwrap();
    let g1 = dock.add_panel(panel("a"), None).unwrap();
    let g2 = dock.add_panel(panel("b"), next_to("a", Direction::Right)).unwrap();
    let g3 = dock.add_panel(panel("c"), next_to("b", Direction::Right)).unwrap();
    assert!(dock.set_group_visible(g2, false).unwrap());
    assert!(!dock.set_group_visible(g2, false).unwrap());

    dock.maximize_group(g3).unwrap();
    assert_eq!(dock.group_geometry(g1), None);
    assert!(dock.exit_maximized().unwrap());
    assert!(dock.group_geometry(g1).is_some());
    assert_eq!(dock.group_geometry(g2), None);
}

#[test]
fn events_describe_a_float() {
    let mut dock = DockLayout::new(options()).unwrap();
    let g1 = dock.add_panel(panel("a"), None).unwrap();
    let g2 = dock.add_panel(panel("b"), next_to("a", Direction::Right)).unwrap();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let subscription = dock.subscribe(move |event| sink.borrow_mut().push(event.clone()));

    let rect = Rect::new(10.0, 10.0, 200.0, 150.0);
    dock.float_group(g2, Some(rect)).unwrap();
    let events = seen.borrow().clone();
    assert_eq!(
        events[0],
        DockEvent::LocationChanged {
            group: g2,
            from: LocationKind::Grid,
            to: LocationKind::Floating,
        }
    );
    assert!(events.contains(&DockEvent::GeometryChanged {
        group: g2,
        rect: Some(rect),
    }));
    assert!(events.contains(&DockEvent::GeometryChanged {
        group: g1,
        rect: Some(Rect::new(0.0, 0.0, WIDTH, HEIGHT)),
    }));

    drop(subscription);
    dock.dock_group(g2, None).unwrap();
    assert_eq!(seen.borrow().len(), events.len());
}

#[test]
fn layout_resizes_emit_geometry() {
    let mut dock = DockLayout::new(DockOptions::default()).unwrap();
    let g = dock.add_panel(panel("a"), None).unwrap();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let _subscription = dock.subscribe(move |event| sink.borrow_mut().push(event.clone()));

    dock.layout(640.0, 480.0);
    assert_eq!(
        seen.borrow().as_slice(),
        &[DockEvent::GeometryChanged {
            group: g,
            rect: Some(Rect::new(0.0, 0.0, 640.0, 480.0)),
        }]
    );
    dock.layout(640.0, 480.0);
    assert_eq!(seen.borrow().len(), 1);
}

#[test]
fn empty_persistent_groups_can_be_filled_later() {
    let mut dock = DockLayout::new(options()).unwrap();
    let g = dock
        .add_group(GroupOptions {
            persistent: true,
            ..GroupOptions::default()
        })
        .unwrap();
    assert_eq!(dock.active_group(), Some(g));
    dock.add_panel(panel("a"), within(g)).unwrap();
    dock.move_panel(&pid("a"), DropTarget::root(Direction::Left))
        .unwrap();
    assert!(dock.group(g).unwrap().is_empty());
    assert_eq!(dock.grid().leaf_count(), 2);
}

// ---------------------------------------------------------------------------
// Random operation streams
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Lcg {
    state: u64,
}

impl Lcg {
    fn new(seed: u64) -> Self {
        Self {
            state: seed ^ 0xD1B5_4A32_D192_ED03,
        }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        self.state
    }

    fn choose_index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0);
        (self.next_u64() % len as u64) as usize
    }

    fn choose_bool(&mut self) -> bool {
        (self.next_u64() & 1) == 0
    }

    fn next_f64_range(&mut self, min: f64, max: f64) -> f64 {
        let unit = (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64;
        min + unit * (max - min)
    }
}

fn random_direction(rng: &mut Lcg) -> DropDirection {
    match rng.choose_index(5) {
        0 => DropDirection::Left,
        1 => DropDirection::Right,
        2 => DropDirection::Above,
        3 => DropDirection::Below,
        _ => DropDirection::Within,
    }
}

type Dock = DockLayout<InMemoryWindowHost>;

fn pick_group(dock: &Dock, rng: &mut Lcg) -> Option<GroupId> {
    let groups: Vec<GroupId> = dock.groups().map(|g| g.id()).collect();
    (!groups.is_empty()).then(|| groups[rng.choose_index(groups.len())])
}

fn pick_panel(dock: &Dock, rng: &mut Lcg) -> Option<PanelId> {
    let panels: Vec<PanelId> = dock.panels().map(|p| p.id.clone()).collect();
    (!panels.is_empty()).then(|| panels[rng.choose_index(panels.len())].clone())
}

fn random_target(dock: &Dock, rng: &mut Lcg) -> DropTarget {
    let direction = random_direction(rng);
    match rng.choose_index(3) {
        0 => match pick_panel(dock, rng) {
            Some(panel) => DropTarget::panel(panel, direction),
            None => DropTarget::root(Direction::Right),
        },
        1 => match pick_group(dock, rng) {
            Some(group) => DropTarget::group(group, direction),
            None => DropTarget::root(Direction::Below),
        },
        _ => DropTarget::root(direction.split().unwrap_or(Direction::Left)),
    }
}

/// Apply one random operation. `Ok(true)` when it was attempted and
/// succeeded, `Ok(false)` when there was nothing to apply it to.
fn apply_random(dock: &mut Dock, rng: &mut Lcg, counter: &mut u64) -> Result<bool, DockError> {
    let group = pick_group(dock, rng);
    let panel_id = pick_panel(dock, rng);
    match rng.choose_index(16) {
        0..=3 => {
            *counter += 1;
            let position = match rng.choose_index(4) {
                0 => None,
                1 => Some(PanelPosition::Floating(None)),
                _ => Some(random_target(dock, rng).into()),
            };
            dock.add_panel(panel(&format!("p{counter}")), position)?;
        }
        4 => {
            let Some(panel) = panel_id else { return Ok(false) };
            dock.close_panel(&panel)?;
        }
        5 => {
            let Some(panel) = panel_id else { return Ok(false) };
            let target = random_target(dock, rng);
            dock.move_panel(&panel, target)?;
        }
        6 => {
            let Some(group) = group else { return Ok(false) };
            let target = random_target(dock, rng);
            dock.move_group(group, target)?;
        }
        7 => {
            let Some(group) = group else { return Ok(false) };
            dock.float_group(group, None)?;
        }
        8 => {
            let Some(group) = group else { return Ok(false) };
            let target = rng.choose_bool().then(|| random_target(dock, rng));
            dock.dock_group(group, target)?;
        }
        9 => {
            let Some(group) = group else { return Ok(false) };
            dock.popout_group(group)?;
        }
        10 => {
            let Some(group) = group else { return Ok(false) };
            dock.maximize_group(group)?;
        }
        11 => {
            dock.exit_maximized()?;
        }
        12 => {
            let Some(group) = group else { return Ok(false) };
            let visible = rng.choose_bool();
            dock.set_group_visible(group, visible)?;
        }
        13 => {
            let Some(panel) = panel_id else { return Ok(false) };
            dock.set_active_panel(&panel)?;
        }
        14 => {
            let Some(group) = group else { return Ok(false) };
            let width = rng.next_f64_range(50.0, WIDTH);
            let height = rng.next_f64_range(50.0, HEIGHT);
            dock.resize_group(group, Some(width), Some(height))?;
        }
        _ => {
            let Some(group) = group else { return Ok(false) };
            let persistent = rng.choose_bool();
            dock.set_group_persistent(group, persistent)?;
        }
    }
    Ok(true)
}

fn assert_dock_invariants(dock: &Dock) {
    dock.grid().validate().unwrap();
    let mut panels = 0usize;
    let mut in_grid = 0usize;
    let mut maximized = 0usize;
    for group in dock.groups() {
        match group.active_panel() {
            None => assert!(group.is_empty(), "group {} lost its active panel", group.id()),
            Some(active) => assert!(group.contains(active)),
        }
        for panel in group.panels() {
            assert_eq!(dock.group_of_panel(panel), Some(group.id()));
            assert!(dock.panel(panel).is_some());
        }
        panels += group.len();
        assert!(
            !group.is_empty() || group.is_persistent(),
            "empty non-persistent group {} survived",
            group.id()
        );
        if group.location().is_in_grid() {
            in_grid += 1;
            assert!(dock.grid().find_leaf(&group.id()).is_some());
        }
        if group.location() == &Location::Maximized {
            maximized += 1;
        }
        if let Some(handle) = group.location().window() {
            assert!(dock.host().is_open(handle));
        }
    }
    assert_eq!(panels, dock.panels().count());
    assert_eq!(in_grid, dock.grid().leaf_count());
    assert!(maximized <= 1);
    assert_eq!(
        dock.host().open_windows().len(),
        dock.groups()
            .filter(|g| g.location().kind() == LocationKind::Popout)
            .count()
    );
    if let Some(active) = dock.active_group() {
        assert!(dock.group(active).is_some());
    }
}

fn run_stream(seed: u64, steps: usize) {
    let mut dock = DockLayout::with_host(options(), InMemoryWindowHost::with_capacity(3)).unwrap();
    let emitted = Rc::new(RefCell::new(0usize));
    let sink = Rc::clone(&emitted);
    let _subscription = dock.subscribe(move |_| *sink.borrow_mut() += 1);
    let mut rng = Lcg::new(seed);
    let mut counter = 0u64;

    for step in 0..steps {
        let before = dock.to_json_string().unwrap();
        let events = *emitted.borrow();
        let result = apply_random(&mut dock, &mut rng, &mut counter);
        if let Err(err) = result {
            assert_eq!(
                dock.to_json_string().unwrap(),
                before,
                "step {step}: rejected operation changed the layout ({err})"
            );
            assert_eq!(*emitted.borrow(), events, "step {step}: rejected operation emitted");
        }
        assert_dock_invariants(&dock);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn random_dock_streams_preserve_invariants(seed in any::<u64>(), steps in 10usize..120) {
        run_stream(seed, steps);
    }
}

#[test]
fn dock_seed_corpus_preserves_invariants() {
    for seed in [0u64, 1, 7, 42, 1337, 0xDEAD_BEEF, u64::MAX] {
        run_stream(seed, 200);
    }
}
