//! Benchmarks for the sizing resolver, splitview layout and grid mutations.
//!
//! Run with: cargo bench -p panedock-layout

use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use panedock_layout::sizing::{self, SizingItem};
use panedock_layout::{
    Direction, GridLeaf, Gridview, LayoutPriority, Orientation, ResizeMode, SizeConstraints,
    Sizing, Splitview,
};
use std::hint::black_box;

fn items(count: usize) -> Vec<SizingItem> {
    (0..count)
        .map(|i| {
            let min = (i % 4) as f64 * 10.0;
            let constraints =
                SizeConstraints::new(min, min + 400.0).unwrap_or(SizeConstraints::UNBOUNDED);
            SizingItem::new(100.0 + (i % 7) as f64 * 15.0, constraints)
        })
        .collect()
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout/resolve");

    for count in [3, 16, 64, 256] {
        let items = items(count);
        let pivot = count / 2;
        for (name, mode) in [
            ("redistribute_right", ResizeMode::RedistributeRight),
            ("bounded_both_sides", ResizeMode::BoundedBothSides),
        ] {
            group.bench_with_input(BenchmarkId::new(name, count), &items, |b, items| {
                b.iter(|| black_box(sizing::resolve(items, pivot, 750.0, mode)))
            });
        }
        group.bench_with_input(BenchmarkId::new("delta_bounds", count), &items, |b, items| {
            b.iter(|| black_box(sizing::delta_bounds(items, pivot)))
        });
    }

    group.finish();
}

fn splitview(count: usize, proportional: bool) -> Splitview<usize> {
    let mut split = Splitview::new(Orientation::Horizontal, proportional);
    for i in 0..count {
        let priority = if i % 5 == 0 {
            LayoutPriority::High
        } else {
            LayoutPriority::Normal
        };
        let _ = split.add_view(
            i,
            SizeConstraints::UNBOUNDED,
            priority,
            Sizing::Exact(100.0),
            i,
        );
    }
    split.layout(count as f64 * 100.0);
    split
}

fn bench_splitview_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout/splitview");

    for count in [4, 32, 128] {
        for (name, proportional) in [("proportional", true), ("priority", false)] {
            group.bench_with_input(BenchmarkId::new(name, count), &count, |b, &count| {
                b.iter_batched(
                    || splitview(count, proportional),
                    |mut split| {
                        split.layout(count as f64 * 137.0);
                        black_box(split.sizes())
                    },
                    BatchSize::SmallInput,
                )
            });
        }
    }

    group.finish();
}

fn grid(leaves: usize) -> Gridview<usize> {
    let mut grid = Gridview::new(Orientation::Horizontal, true);
    grid.layout(1920.0, 1080.0);
    let _ = grid.insert_leaf(&[0], GridLeaf::new(0), Sizing::Distribute);
    for i in 1..leaves {
        let ids = grid.leaves();
        let target = ids[i % ids.len()];
        let Ok(path) = grid.locate(target) else {
            continue;
        };
        let direction = if i % 2 == 0 {
            Direction::Right
        } else {
            Direction::Below
        };
        let _ = grid.split_leaf(&path, direction, GridLeaf::new(i), None);
    }
    grid
}

fn bench_gridview(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout/gridview");

    for leaves in [4, 16, 64] {
        group.bench_with_input(BenchmarkId::new("split_leaf", leaves), &leaves, |b, &leaves| {
            b.iter_batched(
                || grid(leaves),
                |mut grid| {
                    let path = grid.locate(grid.leaves()[0]).unwrap_or_default();
                    black_box(grid.split_leaf(&path, Direction::Right, GridLeaf::new(usize::MAX), None))
                },
                BatchSize::SmallInput,
            )
        });
        group.bench_with_input(BenchmarkId::new("relayout", leaves), &leaves, |b, &leaves| {
            b.iter_batched(
                || grid(leaves),
                |mut grid| {
                    grid.layout(1280.0, 720.0);
                    black_box(grid.compute_layout())
                },
                BatchSize::SmallInput,
            )
        });
        let built = grid(leaves);
        group.bench_with_input(BenchmarkId::new("state_hash", leaves), &built, |b, grid| {
            b.iter(|| black_box(grid.state_hash()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_resolve, bench_splitview_layout, bench_gridview);
criterion_main!(benches);
