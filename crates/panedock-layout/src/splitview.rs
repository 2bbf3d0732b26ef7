//! Single-axis splitview.
//!
//! A [`Splitview<K>`] is an ordered run of keyed views separated by sashes.
//! Sash positions are derived from view sizes and never stored. Every
//! mutation keeps the sum of visible sizes equal to the splitview's extent
//! whenever the constraints allow it; when they cannot be met the views
//! overflow or underflow and cropping is left to the renderer.
//!
//! With proportional layout, the share of each visible view is saved after
//! every user-driven change and reused on container resizes, so a sequence
//! of [`Splitview::layout`] calls never compounds clamping error.

use panedock_core::Orientation;

use crate::error::LayoutError;
use crate::sizing::{
    self, DeltaBounds, LayoutPriority, ResizeMode, SIZE_EPSILON, SizeConstraints, SizingItem,
};

/// Initial size policy for [`Splitview::add_view`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sizing {
    /// Request exactly this many pixels (clamped to the view's constraints).
    Exact(f64),
    /// Give every visible view an equal share after insertion.
    Distribute,
    /// Take half of the view currently at this index, which gives up the
    /// space first.
    Split(usize),
    /// Insert hidden, remembering this size for when the view is shown.
    Invisible(f64),
}

/// One view inside a splitview.
#[derive(Debug, Clone, PartialEq)]
pub struct View<K> {
    key: K,
    size: f64,
    constraints: SizeConstraints,
    visible: bool,
    priority: LayoutPriority,
}

impl<K> View<K> {
    /// Build a view. The size is not clamped here; the owning splitview
    /// enforces constraints.
    pub fn new(key: K, size: f64, constraints: SizeConstraints) -> Self {
        Self {
            key,
            size,
            constraints,
            visible: true,
            priority: LayoutPriority::Normal,
        }
    }

    #[must_use]
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    #[must_use]
    pub fn with_priority(mut self, priority: LayoutPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    /// Stored size. Hidden views keep the size they will be restored to.
    pub fn size(&self) -> f64 {
        self.size
    }

    pub fn constraints(&self) -> SizeConstraints {
        self.constraints
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn priority(&self) -> LayoutPriority {
        self.priority
    }

    fn as_item(&self) -> SizingItem {
        SizingItem {
            size: self.size,
            constraints: self.constraints,
            visible: self.visible,
            priority: self.priority,
        }
    }
}

/// Ordered keyed views along one axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Splitview<K> {
    orientation: Orientation,
    proportional: bool,
    views: Vec<View<K>>,
    extent: f64,
    laid_out: bool,
    proportions: Option<Vec<Option<f64>>>,
}

impl<K: Clone + PartialEq> Splitview<K> {
    #[must_use]
    pub fn new(orientation: Orientation, proportional: bool) -> Self {
        Self {
            orientation,
            proportional,
            views: Vec::new(),
            extent: 0.0,
            laid_out: false,
            proportions: None,
        }
    }

    /// Rebuild a splitview from existing views, e.g. when restoring a saved
    /// layout. The extent becomes the sum of the visible sizes.
    pub fn from_views(
        orientation: Orientation,
        proportional: bool,
        views: Vec<View<K>>,
    ) -> Result<Self, LayoutError> {
        for view in &views {
            view.constraints.validate()?;
        }
        let mut splitview = Self {
            orientation,
            proportional,
            views,
            extent: 0.0,
            laid_out: false,
            proportions: None,
        };
        splitview.extent = splitview.content_size();
        splitview.save_proportions();
        Ok(splitview)
    }

    #[must_use]
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    #[must_use]
    pub fn is_proportional(&self) -> bool {
        self.proportional
    }

    /// Extent last given by [`layout`](Self::layout), or grown by overflow.
    #[must_use]
    pub fn extent(&self) -> f64 {
        self.extent
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.views.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    pub fn views(&self) -> &[View<K>] {
        &self.views
    }

    pub fn view(&self, index: usize) -> Result<&View<K>, LayoutError> {
        self.views.get(index).ok_or(LayoutError::InvalidIndex {
            index,
            len: self.views.len(),
        })
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.views.iter().map(View::key)
    }

    pub fn index_of(&self, key: &K) -> Option<usize> {
        self.views.iter().position(|view| view.key == *key)
    }

    /// Stored sizes in order, hidden views included.
    #[must_use]
    pub fn sizes(&self) -> Vec<f64> {
        self.views.iter().map(View::size).collect()
    }

    /// Offset of the sash after each view but the last.
    #[must_use]
    pub fn sash_positions(&self) -> Vec<f64> {
        let mut offset = 0.0;
        let mut positions = Vec::with_capacity(self.views.len().saturating_sub(1));
        for view in self.views.iter().take(self.views.len().saturating_sub(1)) {
            if view.visible {
                offset += view.size;
            }
            positions.push(offset);
        }
        positions
    }

    /// Offset of each view's leading edge.
    #[must_use]
    pub fn offsets(&self) -> Vec<f64> {
        let mut offset = 0.0;
        self.views
            .iter()
            .map(|view| {
                let start = offset;
                if view.visible {
                    offset += view.size;
                }
                start
            })
            .collect()
    }

    /// Sum of visible sizes.
    #[must_use]
    pub fn content_size(&self) -> f64 {
        self.views.iter().filter(|v| v.visible).map(|v| v.size).sum()
    }

    #[must_use]
    pub fn minimum_size(&self) -> f64 {
        self.views
            .iter()
            .filter(|v| v.visible)
            .map(|v| v.constraints.minimum)
            .sum()
    }

    #[must_use]
    pub fn maximum_size(&self) -> f64 {
        self.views
            .iter()
            .filter(|v| v.visible)
            .map(|v| v.constraints.maximum)
            .sum()
    }

    /// Whole-pixel sizes for the renderer.
    #[must_use]
    pub fn pixel_sizes(&self) -> Vec<u64> {
        sizing::round_to_pixels(&self.items())
    }

    #[must_use]
    pub fn proportions(&self) -> Option<&[Option<f64>]> {
        self.proportions.as_deref()
    }

    fn items(&self) -> Vec<SizingItem> {
        self.views.iter().map(View::as_item).collect()
    }

    fn write_sizes(&mut self, sizes: &[f64]) {
        for (view, size) in self.views.iter_mut().zip(sizes) {
            view.size = *size;
        }
    }

    fn check_index(&self, index: usize) -> Result<(), LayoutError> {
        if index >= self.views.len() {
            return Err(LayoutError::InvalidIndex {
                index,
                len: self.views.len(),
            });
        }
        Ok(())
    }

    fn visible_indices(&self) -> Vec<usize> {
        (0..self.views.len())
            .filter(|&i| self.views[i].visible)
            .collect()
    }

    fn save_proportions(&mut self) {
        if !self.proportional {
            return;
        }
        let content = self.content_size();
        if content <= SIZE_EPSILON {
            return;
        }
        self.proportions = Some(
            self.views
                .iter()
                .map(|view| view.visible.then(|| view.size / content))
                .collect(),
        );
    }

    /// Push `delta` into the visible views other than `excluding`. A
    /// `preferred` view moves first; the rest follows the proportional or
    /// priority policy. Returns what could not be placed.
    fn rebalance(
        &mut self,
        delta: f64,
        excluding: Option<usize>,
        preferred: Option<usize>,
    ) -> f64 {
        let items = self.items();
        let mut sizes = self.sizes();
        let mut remaining = delta;
        if let Some(preferred) = preferred
            && Some(preferred) != excluding
            && items[preferred].visible
        {
            remaining -= sizing::apply_in_order(&items, &mut sizes, &[preferred], remaining);
        }
        if self.proportional {
            let candidates: Vec<usize> = self
                .visible_indices()
                .into_iter()
                .filter(|&i| Some(i) != excluding)
                .collect();
            remaining = sizing::apply_proportionally(&items, &mut sizes, &candidates, remaining);
        } else {
            let order: Vec<usize> = sizing::distribution_order(&items, None)
                .into_iter()
                .filter(|&i| Some(i) != excluding)
                .collect();
            remaining -= sizing::apply_in_order(&items, &mut sizes, &order, remaining);
        }
        self.write_sizes(&sizes);
        remaining
    }

    /// Find `size` pixels for the visible view at `index`: free space first,
    /// then the other views, then the view itself down to its minimum.
    /// Whatever is still missing grows the extent.
    fn make_room(&mut self, index: usize, preferred: Option<usize>) {
        if !self.laid_out {
            self.extent = self.content_size();
            return;
        }
        let content_without = self.content_size() - self.views[index].size;
        let free = (self.extent - content_without).max(0.0);
        let needed = self.views[index].size - free;
        if needed > SIZE_EPSILON {
            let short = -self.rebalance(-needed, Some(index), preferred);
            if short > SIZE_EPSILON {
                let view = &mut self.views[index];
                view.size = (view.size - short).max(view.constraints.minimum);
            }
        }
        let content = self.content_size();
        if content > self.extent {
            self.extent = content;
        } else if content + SIZE_EPSILON < self.extent {
            self.relayout(Some(index));
        }
    }

    fn relayout(&mut self, lowest: Option<usize>) {
        let (sizes, _) = sizing::distribute_empty_space(&self.items(), self.extent, lowest);
        self.write_sizes(&sizes);
    }

    /// Insert a view at `index` (`0..=len`).
    pub fn add_view(
        &mut self,
        key: K,
        constraints: SizeConstraints,
        priority: LayoutPriority,
        sizing: Sizing,
        index: usize,
    ) -> Result<(), LayoutError> {
        constraints.validate()?;
        if index > self.views.len() {
            return Err(LayoutError::InvalidIndex {
                index,
                len: self.views.len(),
            });
        }

        let (requested, visible, preferred) = match sizing {
            Sizing::Exact(size) => (size, true, None),
            Sizing::Invisible(size) => (size, false, None),
            Sizing::Distribute => {
                let share = self.extent / (self.visible_indices().len() + 1) as f64;
                (share, true, None)
            }
            Sizing::Split(reference) => {
                let reference_view = self.view(reference)?;
                let half = if reference_view.visible {
                    reference_view.size / 2.0
                } else {
                    0.0
                };
                let shifted = if reference >= index {
                    reference + 1
                } else {
                    reference
                };
                (half, true, Some(shifted))
            }
        };
        if !requested.is_finite() || requested < 0.0 {
            return Err(LayoutError::InvalidConstraint {
                minimum: constraints.minimum,
                maximum: requested,
            });
        }

        let view = View {
            key,
            size: constraints.clamp(requested),
            constraints,
            visible,
            priority,
        };
        self.views.insert(index, view);
        if visible {
            self.make_room(index, preferred);
        }
        if matches!(sizing, Sizing::Distribute) {
            self.distribute_view_sizes();
        } else {
            self.save_proportions();
        }
        Ok(())
    }

    /// Remove and return the view at `index`, giving its space to the rest.
    pub fn remove_view(&mut self, index: usize) -> Result<View<K>, LayoutError> {
        self.check_index(index)?;
        let removed = self.views.remove(index);
        if let Some(proportions) = self.proportions.as_mut()
            && index < proportions.len()
        {
            proportions.remove(index);
        }
        if removed.visible {
            self.release(removed.size, index);
        }
        self.save_proportions();
        Ok(removed)
    }

    /// Hand `freed` pixels to the remaining views after the view that used
    /// to sit at `index` went away, then fit the run back to the extent.
    fn release(&mut self, freed: f64, index: usize) {
        if !self.laid_out {
            self.extent = self.content_size();
            return;
        }
        let neighbour = if self.proportional {
            None
        } else {
            (0..index.min(self.views.len()))
                .rev()
                .find(|&i| self.views[i].visible)
                .or_else(|| (index..self.views.len()).find(|&i| self.views[i].visible))
        };
        let _ = self.rebalance(freed, None, neighbour);
        self.relayout(None);
    }

    /// Move the view at `from` so it ends up at `to`.
    pub fn move_view(&mut self, from: usize, to: usize) -> Result<(), LayoutError> {
        self.check_index(from)?;
        self.check_index(to)?;
        if from == to {
            return Ok(());
        }
        let view = self.views.remove(from);
        self.views.insert(to, view);
        self.save_proportions();
        Ok(())
    }

    /// Replace the key of the view at `index`, keeping its geometry.
    pub fn replace_key(&mut self, index: usize, key: K) -> Result<K, LayoutError> {
        self.check_index(index)?;
        Ok(std::mem::replace(&mut self.views[index].key, key))
    }

    /// Replace the view at `index` with `views`, which are expected to fill
    /// the same space. Used when a nested run is flattened into its parent.
    pub fn splice_view(&mut self, index: usize, views: Vec<View<K>>) -> Result<(), LayoutError> {
        self.check_index(index)?;
        for view in &views {
            view.constraints.validate()?;
        }
        let _ = self.views.splice(index..=index, views);
        if self.laid_out {
            self.relayout(None);
        } else {
            self.extent = self.content_size();
        }
        self.save_proportions();
        Ok(())
    }

    /// Take all views out, leaving the splitview empty.
    pub fn take_views(&mut self) -> Vec<View<K>> {
        self.proportions = None;
        std::mem::take(&mut self.views)
    }

    /// Set the size of the view at `index`, taking the difference from the
    /// views after it (or before it, for the last visible view).
    ///
    /// Locked views ignore the request. A hidden view only records the size
    /// it will be restored to.
    pub fn resize_view(&mut self, index: usize, size: f64) -> Result<(), LayoutError> {
        self.check_index(index)?;
        let view = &self.views[index];
        if view.constraints.is_locked() || !size.is_finite() {
            return Ok(());
        }
        let target = view.constraints.clamp(size);
        if !view.visible {
            self.views[index].size = target;
            return Ok(());
        }
        let delta = target - view.size;
        let visible = self.visible_indices();
        let (pivot, delta) = if visible.last() == Some(&index) {
            match visible.iter().rev().nth(1) {
                Some(&previous) => (previous, -delta),
                None => return Ok(()),
            }
        } else {
            (index, delta)
        };
        let resolution =
            sizing::resolve(&self.items(), pivot, delta, ResizeMode::RedistributeRight)?;
        self.write_sizes(&resolution.sizes);
        self.save_proportions();
        Ok(())
    }

    /// Drag the sash after view `sash` by `delta`. Returns the delta that
    /// was actually applied.
    pub fn resize_sash(
        &mut self,
        sash: usize,
        delta: f64,
        mode: ResizeMode,
    ) -> Result<f64, LayoutError> {
        if sash + 1 >= self.views.len() {
            return Err(LayoutError::InvalidIndex {
                index: sash,
                len: self.views.len().saturating_sub(1),
            });
        }
        let resolution = sizing::resolve(&self.items(), sash, delta, mode)?;
        self.write_sizes(&resolution.sizes);
        self.save_proportions();
        Ok(resolution.used_delta)
    }

    /// Slack window for the sash after view `sash`.
    pub fn delta_bounds(&self, sash: usize) -> Result<DeltaBounds, LayoutError> {
        if sash + 1 >= self.views.len() {
            return Err(LayoutError::InvalidIndex {
                index: sash,
                len: self.views.len().saturating_sub(1),
            });
        }
        sizing::delta_bounds(&self.items(), sash)
    }

    /// Fit the views to a new extent.
    ///
    /// Proportional splitviews rescale from their saved proportions when the
    /// extent changes; the rest let free space flow in priority order.
    pub fn layout(&mut self, extent: f64) {
        let extent = if extent.is_finite() { extent.max(0.0) } else { 0.0 };
        let changed = !self.laid_out || (extent - self.extent).abs() > SIZE_EPSILON;
        self.extent = extent;
        self.laid_out = true;

        if self.proportional
            && changed
            && let Some(proportions) = self.proportions.clone()
        {
            for (view, proportion) in self.views.iter_mut().zip(proportions) {
                if let Some(proportion) = proportion
                    && view.visible
                {
                    view.size = view.constraints.clamp(proportion * extent);
                }
            }
        }
        let visible = self.visible_indices();
        if changed && !visible.is_empty() && self.content_size() <= SIZE_EPSILON {
            let share = extent / visible.len() as f64;
            for index in visible {
                let view = &mut self.views[index];
                view.size = view.constraints.clamp(share);
            }
        }
        self.relayout(None);
    }

    /// Put back sizes captured earlier with [`sizes`](Self::sizes). Ignored
    /// when the number of views changed since.
    pub(crate) fn restore_sizes(&mut self, sizes: &[f64]) -> bool {
        if sizes.len() != self.views.len() {
            return false;
        }
        for (view, size) in self.views.iter_mut().zip(sizes) {
            view.size = view.constraints.clamp(*size);
        }
        self.save_proportions();
        true
    }

    /// Show or hide the view at `index`. Returns whether anything changed.
    pub fn set_visible(&mut self, index: usize, visible: bool) -> Result<bool, LayoutError> {
        self.check_index(index)?;
        if self.views[index].visible == visible {
            return Ok(false);
        }
        self.views[index].visible = visible;
        if visible {
            let view = &mut self.views[index];
            view.size = view.constraints.clamp(view.size);
            self.make_room(index, None);
        } else {
            let freed = self.views[index].size;
            self.release(freed, index);
        }
        self.save_proportions();
        Ok(true)
    }

    /// Replace a view's constraints, clamping its size and letting the other
    /// views absorb the difference.
    pub fn set_constraints(
        &mut self,
        index: usize,
        constraints: SizeConstraints,
    ) -> Result<(), LayoutError> {
        self.check_index(index)?;
        constraints.validate()?;
        let view = &mut self.views[index];
        view.constraints = constraints;
        let clamped = constraints.clamp(view.size);
        let delta = clamped - view.size;
        view.size = clamped;
        if view.visible && self.laid_out {
            if delta.abs() > SIZE_EPSILON {
                let _ = self.rebalance(-delta, Some(index), None);
            }
            self.relayout(None);
        }
        self.save_proportions();
        Ok(())
    }

    pub fn set_priority(&mut self, index: usize, priority: LayoutPriority) -> Result<(), LayoutError> {
        self.check_index(index)?;
        self.views[index].priority = priority;
        Ok(())
    }

    /// Give every visible view an equal share of the extent, within
    /// constraints.
    pub fn distribute_view_sizes(&mut self) {
        let visible = self.visible_indices();
        if visible.is_empty() {
            return;
        }
        let share = self.extent / visible.len() as f64;
        for &index in &visible {
            let view = &mut self.views[index];
            view.size = view.constraints.clamp(share);
        }
        self.relayout(None);
        self.save_proportions();
    }
}
