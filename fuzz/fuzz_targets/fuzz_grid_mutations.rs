#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use panedock_core::{Direction, Orientation};
use panedock_layout::{GridLeaf, Gridview, LeafConstraints, SizeConstraints};

#[derive(Debug, Arbitrary)]
enum Op {
    Split { leaf: u8, direction: u8, size: Option<u16> },
    RootEdge { direction: u8 },
    Remove { leaf: u8 },
    Move { source: u8, target: u8, direction: u8 },
    Resize { leaf: u8, width: Option<u16>, height: Option<u16> },
    Visible { leaf: u8, visible: bool },
    Constrain { leaf: u8, minimum: u8, maximum: Option<u16> },
    Maximize { leaf: u8 },
    ExitMaximized,
    Layout { width: u16, height: u16 },
}

#[derive(Debug, Arbitrary)]
struct Input {
    vertical: bool,
    proportional: bool,
    ops: Vec<Op>,
}

fn direction(raw: u8) -> Direction {
    match raw % 4 {
        0 => Direction::Left,
        1 => Direction::Right,
        2 => Direction::Above,
        _ => Direction::Below,
    }
}

fn path_of(grid: &Gridview<u32>, raw: u8) -> Option<Vec<usize>> {
    let leaves = grid.leaves();
    if leaves.is_empty() {
        return None;
    }
    let id = leaves[raw as usize % leaves.len()];
    grid.locate(id).ok()
}

fuzz_target!(|input: Input| {
    if input.ops.len() > 64 {
        return;
    }
    let orientation = if input.vertical {
        Orientation::Vertical
    } else {
        Orientation::Horizontal
    };
    let mut grid = Gridview::new(orientation, input.proportional);
    grid.layout(800.0, 600.0);
    let mut next = 0u32;

    for op in input.ops {
        let before = grid.state_hash();
        let result = match op {
            Op::Split { leaf, direction: d, size } => {
                next += 1;
                let item = GridLeaf::new(next);
                let size = size.map(f64::from);
                match path_of(&grid, leaf) {
                    Some(path) => grid.split_leaf(&path, direction(d), item, size).map(drop),
                    None => grid.insert_at_root_edge(direction(d), item, size).map(drop),
                }
            }
            Op::RootEdge { direction: d } => {
                next += 1;
                grid.insert_at_root_edge(direction(d), GridLeaf::new(next), None)
                    .map(drop)
            }
            Op::Remove { leaf } => match path_of(&grid, leaf) {
                Some(path) => grid.remove_leaf(&path).map(drop),
                None => continue,
            },
            Op::Move { source, target, direction: d } => {
                match (path_of(&grid, source), path_of(&grid, target)) {
                    (Some(source), Some(target)) => {
                        grid.move_leaf(&source, &target, direction(d)).map(drop)
                    }
                    _ => continue,
                }
            }
            Op::Resize { leaf, width, height } => match path_of(&grid, leaf) {
                Some(path) => grid.resize_leaf(
                    &path,
                    width.map(f64::from),
                    height.map(f64::from),
                ),
                None => continue,
            },
            Op::Visible { leaf, visible } => match path_of(&grid, leaf) {
                Some(path) => grid.set_leaf_visible(&path, visible).map(drop),
                None => continue,
            },
            Op::Constrain { leaf, minimum, maximum } => match path_of(&grid, leaf) {
                Some(path) => {
                    let Ok(axis) = SizeConstraints::new(
                        f64::from(minimum),
                        maximum.map_or(f64::INFINITY, f64::from),
                    ) else {
                        continue;
                    };
                    grid.set_leaf_constraints(&path, LeafConstraints::new(axis, axis))
                }
                None => continue,
            },
            Op::Maximize { leaf } => match path_of(&grid, leaf) {
                Some(path) => grid.maximize_leaf(&path),
                None => continue,
            },
            Op::ExitMaximized => grid.exit_maximized().map(drop),
            Op::Layout { width, height } => {
                grid.layout(f64::from(width), f64::from(height));
                Ok(())
            }
        };

        // A rejected mutation leaves the grid untouched.
        if result.is_err() {
            assert_eq!(grid.state_hash(), before, "failed mutation changed the grid");
        }
        grid.validate().expect("grid invariants violated");
    }

    grid.exit_maximized().expect("leaving maximize cannot fail");
    let doc = grid.serialize();
    if !grid.is_empty() {
        let restored = Gridview::deserialize(&doc, input.proportional)
            .expect("serialized grid must deserialize");
        assert_eq!(restored.leaf_count(), grid.leaf_count());
    }
});
