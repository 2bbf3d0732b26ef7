//! Conservation and containment properties of a single splitview under
//! arbitrary operation streams.

use panedock_layout::{
    LayoutPriority, Orientation, ResizeMode, SizeConstraints, Sizing, Splitview,
};
use proptest::prelude::*;

const EPSILON: f64 = 1e-6;

#[derive(Debug, Clone)]
enum SplitOp {
    Add { constraints: usize, sizing: u8, at: usize, size: f64 },
    Remove { at: usize },
    ResizeView { at: usize, size: f64 },
    ResizeSash { at: usize, delta: f64, mode: u8 },
    Visible { at: usize, visible: bool },
    Layout { extent: f64 },
}

fn palette(index: usize) -> SizeConstraints {
    let (minimum, maximum) = [
        (0.0, f64::INFINITY),
        (20.0, f64::INFINITY),
        (50.0, 300.0),
        (10.0, 120.0),
        (80.0, 80.0),
    ][index % 5];
    SizeConstraints::new(minimum, maximum).expect("palette entries are valid")
}

fn op_strategy() -> impl Strategy<Value = SplitOp> {
    prop_oneof![
        3 => (0usize..5, 0u8..3, 0usize..8, 0.0f64..400.0).prop_map(|(constraints, sizing, at, size)| {
            SplitOp::Add { constraints, sizing, at, size }
        }),
        1 => (0usize..8).prop_map(|at| SplitOp::Remove { at }),
        2 => (0usize..8, 0.0f64..600.0).prop_map(|(at, size)| SplitOp::ResizeView { at, size }),
        3 => (0usize..8, -400.0f64..400.0, 0u8..3)
            .prop_map(|(at, delta, mode)| SplitOp::ResizeSash { at, delta, mode }),
        1 => (0usize..8, any::<bool>()).prop_map(|(at, visible)| SplitOp::Visible { at, visible }),
        1 => (0.0f64..1600.0).prop_map(|extent| SplitOp::Layout { extent }),
    ]
}

fn mode(raw: u8) -> ResizeMode {
    match raw % 3 {
        0 => ResizeMode::SingleSide,
        1 => ResizeMode::RedistributeRight,
        _ => ResizeMode::BoundedBothSides,
    }
}

fn apply(split: &mut Splitview<u32>, op: &SplitOp, key: u32) {
    let len = split.len();
    match *op {
        SplitOp::Add { constraints, sizing, at, size } => {
            let sizing = match sizing {
                0 => Sizing::Exact(size),
                1 => Sizing::Distribute,
                _ if len > 0 => Sizing::Split(at % len),
                _ => Sizing::Distribute,
            };
            let _ = split.add_view(
                key,
                palette(constraints),
                LayoutPriority::Normal,
                sizing,
                at % (len + 1),
            );
        }
        SplitOp::Remove { at } if len > 0 => {
            let _ = split.remove_view(at % len);
        }
        SplitOp::ResizeView { at, size } if len > 0 => {
            let _ = split.resize_view(at % len, size);
        }
        SplitOp::ResizeSash { at, delta, mode: raw } if len > 1 => {
            let _ = split.resize_sash(at % (len - 1), delta, mode(raw));
        }
        SplitOp::Visible { at, visible } if len > 0 => {
            let _ = split.set_visible(at % len, visible);
        }
        SplitOp::Layout { extent } => split.layout(extent),
        _ => {}
    }
}

fn assert_contained(split: &Splitview<u32>) {
    for view in split.views().iter().filter(|view| view.is_visible()) {
        let c = view.constraints();
        assert!(
            view.size() + EPSILON >= c.minimum && view.size() <= c.maximum + EPSILON,
            "view {} size {} outside [{}, {}]",
            view.key(),
            view.size(),
            c.minimum,
            c.maximum
        );
    }
}

fn assert_conserved(split: &Splitview<u32>) {
    let any_visible = split.views().iter().any(|view| view.is_visible());
    let fits = split.minimum_size() <= split.extent() + EPSILON
        && split.maximum_size() + EPSILON >= split.extent();
    if any_visible && fits {
        assert!(
            (split.content_size() - split.extent()).abs() < EPSILON,
            "content {} != extent {} for {:?}",
            split.content_size(),
            split.extent(),
            split.sizes()
        );
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn operation_streams_conserve_extent_and_respect_constraints(
        proportional in any::<bool>(),
        extent in 200.0f64..1200.0,
        ops in prop::collection::vec(op_strategy(), 1..60),
    ) {
        let mut split = Splitview::new(Orientation::Horizontal, proportional);
        split.layout(extent);
        for (step, op) in ops.iter().enumerate() {
            apply(&mut split, op, step as u32);
            assert_contained(&split);
            assert_conserved(&split);
        }
    }

    #[test]
    fn sash_drags_never_change_content_size(
        sizes in prop::collection::vec(40.0f64..300.0, 2..7),
        drags in prop::collection::vec((0usize..6, -500.0f64..500.0, 0u8..3), 1..20),
    ) {
        let mut split = Splitview::new(Orientation::Vertical, false);
        for (index, size) in sizes.iter().enumerate() {
            split
                .add_view(
                    index as u32,
                    palette(index),
                    LayoutPriority::Normal,
                    Sizing::Exact(*size),
                    index,
                )
                .expect("valid view");
        }
        let before = split.content_size();
        for (sash, delta, raw) in drags {
            let sash = sash % (split.len() - 1);
            let bounds = split.delta_bounds(sash).expect("sash in range");
            let used = split.resize_sash(sash, delta, mode(raw)).expect("sash in range");
            prop_assert!(used.abs() <= delta.abs() + EPSILON);
            prop_assert!(used + EPSILON >= bounds.min && used <= bounds.max + EPSILON);
            prop_assert!((split.content_size() - before).abs() < EPSILON);
            assert_contained(&split);
        }
    }
}

#[test]
fn shrinking_below_minimums_clamps_instead_of_overflowing_views() {
    let mut split = Splitview::new(Orientation::Horizontal, true);
    split.layout(600.0);
    for key in 0..3 {
        split
            .add_view(key, palette(2), LayoutPriority::Normal, Sizing::Distribute, key as usize)
            .expect("valid view");
    }
    split.layout(90.0);
    assert_contained(&split);
    assert!(split.content_size() >= split.minimum_size() - EPSILON);
    split.layout(600.0);
    assert_contained(&split);
    assert_conserved(&split);
}
