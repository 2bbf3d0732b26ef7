//! Sizing resolver.
//!
//! Pure functions over an ordered list of [`SizingItem`]s. Nothing here owns
//! state: callers snapshot their views, ask for new sizes, and write the
//! result back. All sizes are real numbers; [`round_to_pixels`] is the only
//! place that produces integers and it is meant for the render boundary.
//!
//! # Partitions
//!
//! A resize around `pivot` splits the visible items in two:
//!
//! * the *leading* partition, `0..=pivot`, walked from the pivot outward
//!   (`pivot`, `pivot - 1`, ...);
//! * the *trailing* partition, `pivot + 1..`, walked from the adjacent item
//!   outward (`pivot + 1`, `pivot + 2`, ...).
//!
//! Growth on one side is always paid for by the other, so the sum of visible
//! sizes never changes. Hidden items are skipped by every walk.

use serde::{Deserialize, Serialize};

use crate::error::LayoutError;

/// Tolerance used when comparing accumulated sizes.
pub const SIZE_EPSILON: f64 = 1e-6;

/// Tie-break used when free space is handed out or reclaimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutPriority {
    /// Absorbs slack last.
    Low,
    #[default]
    Normal,
    /// Absorbs slack first.
    High,
}

/// Minimum and maximum extent of one view along its splitview's axis.
///
/// An unbounded maximum is `f64::INFINITY`; on the wire it is written as an
/// absent field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeConstraints {
    #[serde(default)]
    pub minimum: f64,
    #[serde(
        default = "crate::serial::unbounded::infinite",
        with = "crate::serial::unbounded",
        skip_serializing_if = "crate::serial::unbounded::is_infinite"
    )]
    pub maximum: f64,
}

impl SizeConstraints {
    /// `0..=inf`.
    pub const UNBOUNDED: Self = Self {
        minimum: 0.0,
        maximum: f64::INFINITY,
    };

    /// Build validated constraints.
    pub fn new(minimum: f64, maximum: f64) -> Result<Self, LayoutError> {
        let constraints = Self { minimum, maximum };
        constraints.validate()?;
        Ok(constraints)
    }

    /// Constraints that pin a view to exactly `size`.
    pub fn fixed(size: f64) -> Result<Self, LayoutError> {
        Self::new(size, size)
    }

    /// Reject NaN, negative or infinite minimums, and `minimum > maximum`.
    pub fn validate(&self) -> Result<(), LayoutError> {
        let minimum_ok = self.minimum.is_finite() && self.minimum >= 0.0;
        let maximum_ok = !self.maximum.is_nan() && self.maximum >= self.minimum;
        if minimum_ok && maximum_ok {
            Ok(())
        } else {
            Err(LayoutError::InvalidConstraint {
                minimum: self.minimum,
                maximum: self.maximum,
            })
        }
    }

    #[must_use]
    pub fn clamp(&self, size: f64) -> f64 {
        size.max(self.minimum).min(self.maximum)
    }

    /// A locked view cannot be resized.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.minimum == self.maximum
    }

    #[must_use]
    pub fn contains(&self, size: f64) -> bool {
        size + SIZE_EPSILON >= self.minimum && size <= self.maximum + SIZE_EPSILON
    }
}

impl Default for SizeConstraints {
    fn default() -> Self {
        Self::UNBOUNDED
    }
}

/// Snapshot of one view as seen by the resolver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizingItem {
    pub size: f64,
    pub constraints: SizeConstraints,
    pub visible: bool,
    pub priority: LayoutPriority,
}

impl SizingItem {
    /// A visible, normal-priority item.
    #[must_use]
    pub fn new(size: f64, constraints: SizeConstraints) -> Self {
        Self {
            size,
            constraints,
            visible: true,
            priority: LayoutPriority::Normal,
        }
    }

    #[must_use]
    pub fn with_priority(mut self, priority: LayoutPriority) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}

/// How a resize is spread over the two partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResizeMode {
    /// Only the pivot itself changes on the leading side; the trailing
    /// partition pays, walking outward when the adjacent view saturates.
    SingleSide,
    /// Walk the whole leading partition, then compensate on the trailing
    /// partition. Anything the trailing side cannot absorb is given back.
    RedistributeRight,
    /// Clamp the delta to [`delta_bounds`] first, then redistribute. Used for
    /// live sash drags.
    BoundedBothSides,
}

/// New sizes plus the part of the requested delta that was applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub sizes: Vec<f64>,
    pub used_delta: f64,
}

/// Window of deltas a sash can move without saturating either side.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DeltaBounds {
    pub min: f64,
    pub max: f64,
}

impl DeltaBounds {
    #[must_use]
    pub fn clamp(&self, delta: f64) -> f64 {
        delta.max(self.min).min(self.max)
    }
}

fn visible_indices(items: &[SizingItem], range: impl Iterator<Item = usize>) -> Vec<usize> {
    range.filter(|&i| items[i].visible).collect()
}

fn leading_partition(items: &[SizingItem], pivot: usize, mode: ResizeMode) -> Vec<usize> {
    match mode {
        ResizeMode::SingleSide => visible_indices(items, std::iter::once(pivot)),
        ResizeMode::RedistributeRight | ResizeMode::BoundedBothSides => {
            visible_indices(items, (0..=pivot).rev())
        }
    }
}

fn trailing_partition(items: &[SizingItem], pivot: usize) -> Vec<usize> {
    visible_indices(items, pivot + 1..items.len())
}

/// Move `size` toward `size + delta` without crossing the constraint on the
/// side of travel. Never moves against the direction of `delta`.
fn step(constraints: &SizeConstraints, size: f64, delta: f64) -> f64 {
    if delta > 0.0 {
        (size + delta).min(constraints.maximum.max(size))
    } else {
        (size + delta).max(constraints.minimum.min(size))
    }
}

/// Apply `delta` to `order` one item at a time, each item taking as much as
/// its constraints allow. Returns the total applied.
pub fn apply_in_order(
    items: &[SizingItem],
    sizes: &mut [f64],
    order: &[usize],
    delta: f64,
) -> f64 {
    let mut remaining = delta;
    let mut applied = 0.0;
    for &index in order {
        if remaining == 0.0 {
            break;
        }
        let next = step(&items[index].constraints, sizes[index], remaining);
        let moved = next - sizes[index];
        sizes[index] = next;
        applied += moved;
        remaining -= moved;
    }
    applied
}

/// Spread `delta` over `candidates` in proportion to their current sizes,
/// re-spreading whatever saturated items could not take. Returns the part
/// that could not be placed.
pub fn apply_proportionally(
    items: &[SizingItem],
    sizes: &mut [f64],
    candidates: &[usize],
    delta: f64,
) -> f64 {
    let mut remaining = delta;
    for _ in 0..=candidates.len() {
        if remaining.abs() <= SIZE_EPSILON {
            break;
        }
        let open: Vec<usize> = candidates
            .iter()
            .copied()
            .filter(|&i| {
                let c = &items[i].constraints;
                if remaining > 0.0 {
                    sizes[i] + SIZE_EPSILON < c.maximum
                } else {
                    sizes[i] > c.minimum + SIZE_EPSILON
                }
            })
            .collect();
        if open.is_empty() {
            break;
        }
        let weight: f64 = open.iter().map(|&i| sizes[i]).sum();
        let mut moved_total = 0.0;
        for &index in &open {
            let share = if weight > SIZE_EPSILON {
                remaining * sizes[index] / weight
            } else {
                remaining / open.len() as f64
            };
            let next = step(&items[index].constraints, sizes[index], share);
            moved_total += next - sizes[index];
            sizes[index] = next;
        }
        remaining -= moved_total;
        if moved_total.abs() <= SIZE_EPSILON {
            break;
        }
    }
    remaining
}

fn bounds_over(items: &[SizingItem], leading: &[usize], trailing: &[usize]) -> DeltaBounds {
    if leading.is_empty() || trailing.is_empty() {
        return DeltaBounds::default();
    }
    let mut leading_min = 0.0;
    let mut leading_max = 0.0;
    for &i in leading {
        let item = &items[i];
        leading_min += item.constraints.minimum - item.size;
        leading_max += item.constraints.maximum - item.size;
    }
    let mut trailing_min = 0.0;
    let mut trailing_max = 0.0;
    for &i in trailing {
        let item = &items[i];
        trailing_min += item.size - item.constraints.maximum;
        trailing_max += item.size - item.constraints.minimum;
    }
    DeltaBounds {
        min: f64::max(leading_min, trailing_min).min(0.0),
        max: f64::min(leading_max, trailing_max).max(0.0),
    }
}

fn check_pivot(items: &[SizingItem], pivot: usize) -> Result<(), LayoutError> {
    if pivot >= items.len() {
        return Err(LayoutError::InvalidIndex {
            index: pivot,
            len: items.len(),
        });
    }
    Ok(())
}

/// Aggregate slack window for a sash after `pivot`.
///
/// `min` is the largest shrink (as a negative delta) and `max` the largest
/// growth the leading partition can take while the trailing partition pays.
pub fn delta_bounds(items: &[SizingItem], pivot: usize) -> Result<DeltaBounds, LayoutError> {
    if items.is_empty() {
        return Ok(DeltaBounds::default());
    }
    check_pivot(items, pivot)?;
    let leading = leading_partition(items, pivot, ResizeMode::RedistributeRight);
    let trailing = trailing_partition(items, pivot);
    Ok(bounds_over(items, &leading, &trailing))
}

/// Redistribute `delta` around `pivot`.
///
/// Positive deltas grow the leading partition. The returned `used_delta` is
/// what the leading partition actually gained; the trailing partition lost
/// exactly that much.
pub fn resolve(
    items: &[SizingItem],
    pivot: usize,
    delta: f64,
    mode: ResizeMode,
) -> Result<Resolution, LayoutError> {
    let mut sizes: Vec<f64> = items.iter().map(|item| item.size).collect();
    if items.is_empty() {
        return Ok(Resolution {
            sizes,
            used_delta: 0.0,
        });
    }
    check_pivot(items, pivot)?;
    if delta == 0.0 || !delta.is_finite() {
        return Ok(Resolution {
            sizes,
            used_delta: 0.0,
        });
    }

    let leading = leading_partition(items, pivot, mode);
    let trailing = trailing_partition(items, pivot);
    if leading.is_empty() || trailing.is_empty() {
        return Ok(Resolution {
            sizes,
            used_delta: 0.0,
        });
    }

    let target = match mode {
        ResizeMode::BoundedBothSides => bounds_over(items, &leading, &trailing).clamp(delta),
        ResizeMode::SingleSide | ResizeMode::RedistributeRight => delta,
    };

    let gained = apply_in_order(items, &mut sizes, &leading, target);
    let paid = -apply_in_order(items, &mut sizes, &trailing, -gained);

    if (paid - gained).abs() > SIZE_EPSILON {
        // Trailing side saturated: give the leading side only what was paid.
        for &i in &leading {
            sizes[i] = items[i].size;
        }
        apply_in_order(items, &mut sizes, &leading, paid);
    }

    Ok(Resolution {
        sizes,
        used_delta: paid,
    })
}

/// Visible indices in the order they receive (or give up) free space.
///
/// Right to left, `High` priority first and `Low` last; `lowest`, when given
/// and visible, goes after everything else.
#[must_use]
pub fn distribution_order(items: &[SizingItem], lowest: Option<usize>) -> Vec<usize> {
    let rightmost_first = visible_indices(items, (0..items.len()).rev());
    let mut order = Vec::with_capacity(rightmost_first.len());
    for priority in [
        LayoutPriority::High,
        LayoutPriority::Normal,
        LayoutPriority::Low,
    ] {
        order.extend(
            rightmost_first
                .iter()
                .copied()
                .filter(|&i| items[i].priority == priority && Some(i) != lowest),
        );
    }
    if let Some(lowest) = lowest
        && rightmost_first.contains(&lowest)
    {
        order.push(lowest);
    }
    order
}

/// Grow or shrink visible items until they fill `extent`.
///
/// Returns the new sizes and whatever could not be placed (positive when the
/// items cannot grow enough, negative when they cannot shrink enough).
#[must_use]
pub fn distribute_empty_space(
    items: &[SizingItem],
    extent: f64,
    lowest: Option<usize>,
) -> (Vec<f64>, f64) {
    let mut sizes: Vec<f64> = items.iter().map(|item| item.size).collect();
    let content: f64 = items.iter().filter(|i| i.visible).map(|i| i.size).sum();
    let empty = extent - content;
    let order = distribution_order(items, lowest);
    let applied = apply_in_order(items, &mut sizes, &order, empty);
    (sizes, empty - applied)
}

/// Floor every visible size to whole pixels and hand the rounding remainder
/// to the last visible item. Hidden items map to 0.
#[must_use]
pub fn round_to_pixels(items: &[SizingItem]) -> Vec<u64> {
    let mut pixels: Vec<u64> = items
        .iter()
        .map(|item| {
            if item.visible {
                item.size.max(0.0).floor() as u64
            } else {
                0
            }
        })
        .collect();
    let total: f64 = items.iter().filter(|i| i.visible).map(|i| i.size.max(0.0)).sum();
    let floored: u64 = pixels.iter().sum();
    let target = total.round() as u64;
    if let Some(last) = items.iter().rposition(|item| item.visible) {
        pixels[last] += target.saturating_sub(floored);
    }
    pixels
}
