//! Two-dimensional grid of nested splitviews.
//!
//! # Design
//!
//! Nodes live in an arena keyed by [`NodeId`]. A branch owns a
//! [`Splitview<NodeId>`] whose views are its children; a leaf carries the
//! caller's payload plus width/height constraints. A separate child-to-parent
//! map is maintained on every mutation so [`Gridview::locate`] is a walk up
//! the tree instead of a search.
//!
//! # Invariants
//!
//! 1. The root is always a branch. It may have any number of children, but a
//!    single child is never a branch (such a child is promoted to root).
//! 2. Every other branch has at least two children.
//! 3. A child branch's orientation is the orthogonal of its parent's.
//! 4. A branch is visible in its parent iff at least one of its children is
//!    visible.
//! 5. The constraints of each view in a branch are the bounds of the child
//!    along the branch's axis.
//!
//! Every public mutation stages its work on a clone, re-establishes 4 and 5,
//! validates 1 to 3, and only then replaces `self`. A failed operation leaves
//! the grid untouched.
//!
//! Paths (`&[usize]`) are child indices from the root. They are only valid
//! until the next structural change.

use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};

use panedock_core::{Direction, IdAllocator, NodeId, Orientation, Rect};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::LayoutError;
use crate::serial::{SerializedGrid, SerializedGridNode};
use crate::sizing::{LayoutPriority, SizeConstraints};
use crate::splitview::{Sizing, Splitview, View};

/// Width and height constraints of a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LeafConstraints {
    pub width: SizeConstraints,
    pub height: SizeConstraints,
}

impl LeafConstraints {
    #[must_use]
    pub const fn new(width: SizeConstraints, height: SizeConstraints) -> Self {
        Self { width, height }
    }

    /// Constraints along one axis.
    #[must_use]
    pub fn along(&self, orientation: Orientation) -> SizeConstraints {
        match orientation {
            Orientation::Horizontal => self.width,
            Orientation::Vertical => self.height,
        }
    }

    pub fn validate(&self) -> Result<(), LayoutError> {
        self.width.validate()?;
        self.height.validate()
    }
}

/// Payload and constraints of one leaf.
#[derive(Debug, Clone, PartialEq)]
pub struct GridLeaf<T> {
    pub data: T,
    pub constraints: LeafConstraints,
}

impl<T> GridLeaf<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            constraints: LeafConstraints::default(),
        }
    }

    #[must_use]
    pub fn with_constraints(mut self, constraints: LeafConstraints) -> Self {
        self.constraints = constraints;
        self
    }
}

/// Arena node.
#[derive(Debug, Clone, PartialEq)]
pub enum GridNode<T> {
    Branch(Splitview<NodeId>),
    Leaf(GridLeaf<T>),
}

/// Rectangles of every effectively visible node, root included.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GridLayout {
    rects: BTreeMap<NodeId, Rect>,
}

impl GridLayout {
    #[must_use]
    pub fn rect(&self, id: NodeId) -> Option<Rect> {
        self.rects.get(&id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, Rect)> + '_ {
        self.rects.iter().map(|(id, rect)| (*id, *rect))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
struct MaximizedState {
    leaf: NodeId,
    hidden_before: BTreeSet<NodeId>,
    sizes: BTreeMap<NodeId, Vec<f64>>,
}

/// FNV-1a over everything fed through [`Hasher`].
struct StateHasher(u64);

impl StateHasher {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0001_0000_01b3;

    fn new() -> Self {
        Self(Self::OFFSET_BASIS)
    }
}

impl Hasher for StateHasher {
    fn finish(&self) -> u64 {
        self.0
    }

    fn write(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.0 ^= u64::from(*byte);
            self.0 = self.0.wrapping_mul(Self::PRIME);
        }
    }
}

/// Tree of alternating splitviews.
#[derive(Debug, Clone, PartialEq)]
pub struct Gridview<T> {
    root: NodeId,
    nodes: BTreeMap<NodeId, GridNode<T>>,
    parents: FxHashMap<NodeId, NodeId>,
    ids: IdAllocator,
    proportional: bool,
    width: f64,
    height: f64,
    laid_out: bool,
    maximized: Option<MaximizedState>,
}

fn sanitize(extent: f64) -> f64 {
    if extent.is_finite() { extent.max(0.0) } else { 0.0 }
}

fn check_wire_size(size: f64) -> Result<(), LayoutError> {
    if size.is_finite() && size >= 0.0 {
        Ok(())
    } else {
        Err(LayoutError::malformed(format!("invalid node size {size}")))
    }
}

impl<T: Clone + PartialEq> Gridview<T> {
    /// An empty grid whose root is laid out along `orientation`.
    #[must_use]
    pub fn new(orientation: Orientation, proportional: bool) -> Self {
        let root = NodeId::MIN;
        let mut nodes = BTreeMap::new();
        let _ = nodes.insert(
            root,
            GridNode::Branch(Splitview::new(orientation, proportional)),
        );
        Self {
            root,
            nodes,
            parents: FxHashMap::default(),
            ids: IdAllocator::with_next(root.get() + 1),
            proportional,
            width: 0.0,
            height: 0.0,
            laid_out: false,
            maximized: None,
        }
    }

    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Orientation of the root branch.
    #[must_use]
    pub fn orientation(&self) -> Orientation {
        self.branch(self.root)
            .map_or(Orientation::Horizontal, Splitview::orientation)
    }

    #[must_use]
    pub fn is_proportional(&self) -> bool {
        self.proportional
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.height
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&GridNode<T>> {
        self.nodes.get(&id)
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parents.get(&id).copied()
    }

    #[must_use]
    pub fn leaf(&self, id: NodeId) -> Option<&GridLeaf<T>> {
        match self.nodes.get(&id) {
            Some(GridNode::Leaf(leaf)) => Some(leaf),
            _ => None,
        }
    }

    /// Child ids of a branch, in order.
    #[must_use]
    pub fn children(&self, id: NodeId) -> Option<Vec<NodeId>> {
        match self.nodes.get(&id) {
            Some(GridNode::Branch(split)) => Some(split.keys().copied().collect()),
            _ => None,
        }
    }

    /// Splitview of a branch.
    #[must_use]
    pub fn splitview(&self, id: NodeId) -> Option<&Splitview<NodeId>> {
        self.branch(id).ok()
    }

    /// Leaf ids in depth-first, leading-to-trailing order.
    #[must_use]
    pub fn leaves(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            match self.nodes.get(&id) {
                Some(GridNode::Leaf(_)) => out.push(id),
                Some(GridNode::Branch(split)) => {
                    let children: Vec<NodeId> = split.keys().copied().collect();
                    stack.extend(children.into_iter().rev());
                }
                None => {}
            }
        }
        out
    }

    #[must_use]
    pub fn leaf_count(&self) -> usize {
        self.nodes
            .values()
            .filter(|node| matches!(node, GridNode::Leaf(_)))
            .count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// First leaf carrying `data`.
    #[must_use]
    pub fn find_leaf(&self, data: &T) -> Option<NodeId> {
        self.nodes.iter().find_map(|(id, node)| match node {
            GridNode::Leaf(leaf) if leaf.data == *data => Some(*id),
            _ => None,
        })
    }

    /// Whether a node's own view is visible in its parent. The root is
    /// always visible.
    #[must_use]
    pub fn is_visible(&self, id: NodeId) -> bool {
        let Some(parent) = self.parent(id) else {
            return self.nodes.contains_key(&id);
        };
        self.branch(parent)
            .ok()
            .and_then(|split| split.index_of(&id).map(|i| split.views()[i].is_visible()))
            .unwrap_or(false)
    }

    /// Leaf currently maximized, if any.
    #[must_use]
    pub fn maximized_leaf(&self) -> Option<NodeId> {
        self.maximized.as_ref().map(|state| state.leaf)
    }

    /// Leaves that were already hidden when the current maximize started.
    #[must_use]
    pub fn hidden_before_maximize(&self) -> Vec<NodeId> {
        self.maximized
            .as_ref()
            .map(|state| state.hidden_before.iter().copied().collect())
            .unwrap_or_default()
    }

    fn branch(&self, id: NodeId) -> Result<&Splitview<NodeId>, LayoutError> {
        match self.nodes.get(&id) {
            Some(GridNode::Branch(split)) => Ok(split),
            Some(GridNode::Leaf(_)) => Err(LayoutError::malformed(format!("{id} is not a branch"))),
            None => Err(LayoutError::not_found(id.to_string())),
        }
    }

    fn branch_mut(&mut self, id: NodeId) -> Result<&mut Splitview<NodeId>, LayoutError> {
        match self.nodes.get_mut(&id) {
            Some(GridNode::Branch(split)) => Ok(split),
            Some(GridNode::Leaf(_)) => Err(LayoutError::malformed(format!("{id} is not a branch"))),
            None => Err(LayoutError::not_found(id.to_string())),
        }
    }

    fn is_branch(&self, id: NodeId) -> bool {
        matches!(self.nodes.get(&id), Some(GridNode::Branch(_)))
    }

    fn parent_of(&self, id: NodeId) -> Result<NodeId, LayoutError> {
        self.parent(id)
            .ok_or_else(|| LayoutError::not_found(format!("parent of {id}")))
    }

    fn child_index(&self, parent: NodeId, child: NodeId) -> Result<usize, LayoutError> {
        self.branch(parent)?
            .index_of(&child)
            .ok_or_else(|| LayoutError::malformed(format!("{child} missing from {parent}")))
    }

    fn allocate(&mut self) -> Result<NodeId, LayoutError> {
        Ok(self.ids.allocate_node()?)
    }

    /// Path of child indices from the root to `id`.
    pub fn locate(&self, id: NodeId) -> Result<Vec<usize>, LayoutError> {
        if !self.nodes.contains_key(&id) {
            return Err(LayoutError::not_found(id.to_string()));
        }
        let mut path = Vec::new();
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            path.push(self.child_index(parent, current)?);
            current = parent;
        }
        path.reverse();
        Ok(path)
    }

    /// Node at `path` (the root for an empty path).
    pub fn node_at(&self, path: &[usize]) -> Result<NodeId, LayoutError> {
        let mut current = self.root;
        for &index in path {
            let split = match self.nodes.get(&current) {
                Some(GridNode::Branch(split)) => split,
                _ => {
                    return Err(LayoutError::NotALeaf {
                        path: path.to_vec(),
                    });
                }
            };
            current = *split.view(index)?.key();
        }
        Ok(current)
    }

    /// Leaf at `path`.
    pub fn leaf_at(&self, path: &[usize]) -> Result<NodeId, LayoutError> {
        let id = self.node_at(path)?;
        if self.is_branch(id) {
            return Err(LayoutError::NotALeaf {
                path: path.to_vec(),
            });
        }
        Ok(id)
    }

    /// Bounds of a node along `axis`.
    fn bounds_of(&self, id: NodeId, axis: Orientation) -> SizeConstraints {
        match self.nodes.get(&id) {
            Some(GridNode::Leaf(leaf)) => leaf.constraints.along(axis),
            Some(GridNode::Branch(split)) => {
                let visible: Vec<&View<NodeId>> =
                    split.views().iter().filter(|v| v.is_visible()).collect();
                if visible.is_empty() {
                    return SizeConstraints::UNBOUNDED;
                }
                if split.orientation() == axis {
                    return SizeConstraints {
                        minimum: split.minimum_size(),
                        maximum: split.maximum_size(),
                    };
                }
                let mut minimum: f64 = 0.0;
                let mut maximum = f64::INFINITY;
                for view in visible {
                    let child = self.bounds_of(*view.key(), axis);
                    minimum = minimum.max(child.minimum);
                    maximum = maximum.min(child.maximum);
                }
                SizeConstraints {
                    minimum,
                    maximum: maximum.max(minimum),
                }
            }
            None => SizeConstraints::UNBOUNDED,
        }
    }

    /// Current (width, height) of a node.
    fn extent_of(&self, id: NodeId) -> Result<(f64, f64), LayoutError> {
        let path = self.locate(id)?;
        let root = self.branch(self.root)?;
        let (mut width, mut height) = if self.laid_out {
            (self.width, self.height)
        } else {
            match root.orientation() {
                Orientation::Horizontal => (root.content_size(), 0.0),
                Orientation::Vertical => (0.0, root.content_size()),
            }
        };
        let mut current = self.root;
        for index in path {
            let split = self.branch(current)?;
            let view = split.view(index)?;
            match split.orientation() {
                Orientation::Horizontal => width = view.size(),
                Orientation::Vertical => height = view.size(),
            }
            current = *view.key();
        }
        Ok((width, height))
    }

    fn extent_along(&self, id: NodeId, axis: Orientation) -> Result<f64, LayoutError> {
        let (width, height) = self.extent_of(id)?;
        Ok(match axis {
            Orientation::Horizontal => width,
            Orientation::Vertical => height,
        })
    }

    fn transact<R>(
        &mut self,
        operation: &'static str,
        apply: impl FnOnce(&mut Self) -> Result<R, LayoutError>,
    ) -> Result<R, LayoutError> {
        let mut working = self.clone();
        let result = apply(&mut working).and_then(|value| {
            working.normalize()?;
            working.validate()?;
            Ok(value)
        });
        match result {
            Ok(value) => {
                *self = working;
                tracing::trace!(
                    target: "panedock.grid",
                    operation,
                    nodes = self.nodes.len(),
                    "grid operation committed"
                );
                Ok(value)
            }
            Err(err) => {
                tracing::debug!(
                    target: "panedock.grid",
                    operation,
                    error = %err,
                    "grid operation rejected"
                );
                Err(err)
            }
        }
    }

    /// Replace the root with an orthogonal one. Only valid while the root has
    /// at most one child.
    fn flip_root(&mut self) -> Result<(), LayoutError> {
        let orientation = self.orientation().orthogonal();
        let extent = match orientation {
            Orientation::Horizontal => self.width,
            Orientation::Vertical => self.height,
        };
        let laid_out = self.laid_out;
        let proportional = self.proportional;
        let root = self.root;
        let views = self.branch_mut(root)?.take_views();
        let mut flipped = Splitview::from_views(orientation, proportional, views)?;
        if laid_out {
            flipped.layout(extent);
        }
        let _ = self.nodes.insert(root, GridNode::Branch(flipped));
        Ok(())
    }

    /// Wrap `target` in a new branch along `axis`, holding `target` and the
    /// new leaf `id` at `new_index` (0 or 1).
    fn wrap_leaf(
        &mut self,
        target: NodeId,
        axis: Orientation,
        id: NodeId,
        leaf: GridLeaf<T>,
        sizing: Sizing,
        new_index: usize,
    ) -> Result<(), LayoutError> {
        if new_index > 1 {
            return Err(LayoutError::InvalidIndex {
                index: new_index,
                len: 1,
            });
        }
        let parent = self.parent_of(target)?;
        let index = self.child_index(parent, target)?;
        let target_visible = self.is_visible(target);
        let extent = self.extent_along(target, axis)?;
        let target_bounds = self.bounds_of(target, axis);
        let leaf_bounds = leaf.constraints.along(axis);

        let mut split = Splitview::new(axis, self.proportional);
        split.add_view(
            target,
            target_bounds,
            LayoutPriority::Normal,
            Sizing::Exact(extent),
            0,
        )?;
        if extent > 0.0 {
            split.layout(extent);
        }
        if !target_visible {
            let _ = split.set_visible(0, false)?;
        }
        split.add_view(id, leaf_bounds, LayoutPriority::Normal, sizing, new_index)?;

        let wrapper = self.allocate()?;
        let _ = self.branch_mut(parent)?.replace_key(index, wrapper)?;
        let _ = self.nodes.insert(wrapper, GridNode::Branch(split));
        let _ = self.nodes.insert(id, GridNode::Leaf(leaf));
        let _ = self.parents.insert(wrapper, parent);
        let _ = self.parents.insert(target, wrapper);
        let _ = self.parents.insert(id, wrapper);
        Ok(())
    }

    fn insert_child(
        &mut self,
        parent: NodeId,
        id: NodeId,
        leaf: GridLeaf<T>,
        sizing: Sizing,
        index: usize,
    ) -> Result<(), LayoutError> {
        let split = self.branch_mut(parent)?;
        let bounds = leaf.constraints.along(split.orientation());
        split.add_view(id, bounds, LayoutPriority::Normal, sizing, index)?;
        let _ = self.nodes.insert(id, GridNode::Leaf(leaf));
        let _ = self.parents.insert(id, parent);
        Ok(())
    }

    fn split_at(
        &mut self,
        target: NodeId,
        direction: Direction,
        id: NodeId,
        leaf: GridLeaf<T>,
        size: Option<f64>,
    ) -> Result<(), LayoutError> {
        leaf.constraints.validate()?;
        let axis = direction.orientation();
        let offset = usize::from(direction.is_trailing());
        let parent = self.parent_of(target)?;
        if parent == self.root
            && self.orientation() != axis
            && self.branch(parent)?.len() <= 1
        {
            self.flip_root()?;
        }
        let index = self.child_index(parent, target)?;
        if self.branch(parent)?.orientation() == axis {
            let sizing = size.map_or(Sizing::Split(index), Sizing::Exact);
            self.insert_child(parent, id, leaf, sizing, index + offset)
        } else {
            let sizing = size.map_or(Sizing::Split(0), Sizing::Exact);
            self.wrap_leaf(target, axis, id, leaf, sizing, offset)
        }
    }

    fn insert_at_edge(
        &mut self,
        direction: Direction,
        id: NodeId,
        leaf: GridLeaf<T>,
        size: Option<f64>,
    ) -> Result<(), LayoutError> {
        leaf.constraints.validate()?;
        let axis = direction.orientation();
        let sizing = size.map_or(Sizing::Distribute, Sizing::Exact);
        if self.orientation() != axis && self.branch(self.root)?.len() <= 1 {
            self.flip_root()?;
        }
        let root = self.root;
        if self.orientation() == axis {
            let index = if direction.is_trailing() {
                self.branch(root)?.len()
            } else {
                0
            };
            return self.insert_child(root, id, leaf, sizing, index);
        }

        let extent = match axis {
            Orientation::Horizontal => self.width,
            Orientation::Vertical => self.height,
        };
        let mut split = Splitview::new(axis, self.proportional);
        split.add_view(
            root,
            self.bounds_of(root, axis),
            LayoutPriority::Normal,
            Sizing::Exact(extent),
            0,
        )?;
        if self.laid_out && extent > 0.0 {
            split.layout(extent);
        }
        split.add_view(
            id,
            leaf.constraints.along(axis),
            LayoutPriority::Normal,
            sizing,
            usize::from(direction.is_trailing()),
        )?;
        let new_root = self.allocate()?;
        let _ = self.nodes.insert(new_root, GridNode::Branch(split));
        let _ = self.nodes.insert(id, GridNode::Leaf(leaf));
        let _ = self.parents.insert(root, new_root);
        let _ = self.parents.insert(id, new_root);
        self.root = new_root;
        Ok(())
    }

    fn detach_leaf(&mut self, leaf: NodeId) -> Result<GridLeaf<T>, LayoutError> {
        let parent = self.parent_of(leaf)?;
        let index = self.child_index(parent, leaf)?;
        let _ = self.branch_mut(parent)?.remove_view(index)?;
        let _ = self.parents.remove(&leaf);
        let removed = match self.nodes.remove(&leaf) {
            Some(GridNode::Leaf(removed)) => removed,
            _ => return Err(LayoutError::malformed(format!("{leaf} is not a leaf"))),
        };
        self.collapse(parent)?;
        Ok(removed)
    }

    /// Remove redundant single-child branches starting at `id`.
    fn collapse(&mut self, id: NodeId) -> Result<(), LayoutError> {
        let mut current = id;
        loop {
            let children: Vec<NodeId> = self.branch(current)?.keys().copied().collect();
            if current == self.root {
                if let [only] = children.as_slice()
                    && self.is_branch(*only)
                {
                    let only = *only;
                    let _ = self.parents.remove(&only);
                    let _ = self.nodes.remove(&current);
                    self.root = only;
                }
                return Ok(());
            }
            let [only] = children.as_slice() else {
                return Ok(());
            };
            let only = *only;
            let grandparent = self.parent_of(current)?;
            let index = self.child_index(grandparent, current)?;
            if self.is_branch(only) {
                let views = self.branch_mut(only)?.take_views();
                for view in &views {
                    let _ = self.parents.insert(*view.key(), grandparent);
                }
                self.branch_mut(grandparent)?.splice_view(index, views)?;
                let _ = self.nodes.remove(&only);
                let _ = self.parents.remove(&only);
            } else {
                let _ = self.branch_mut(grandparent)?.replace_key(index, only)?;
                let _ = self.parents.insert(only, grandparent);
            }
            let _ = self.nodes.remove(&current);
            let _ = self.parents.remove(&current);
            current = grandparent;
        }
    }

    fn set_visible_inner(&mut self, leaf: NodeId, visible: bool) -> Result<bool, LayoutError> {
        let parent = self.parent_of(leaf)?;
        let index = self.child_index(parent, leaf)?;
        self.branch_mut(parent)?.set_visible(index, visible)
    }

    fn exit_maximized_inner(&mut self) -> Result<bool, LayoutError> {
        let Some(state) = self.maximized.take() else {
            return Ok(false);
        };
        for leaf in self.leaves() {
            let _ = self.set_visible_inner(leaf, !state.hidden_before.contains(&leaf))?;
        }
        self.sync_visibility()?;
        for (branch, sizes) in &state.sizes {
            if let Some(GridNode::Branch(split)) = self.nodes.get_mut(branch) {
                let _ = split.restore_sizes(sizes);
            }
        }
        Ok(true)
    }

    /// Branch ids with every branch listed after all of its descendants.
    fn post_order_branches(&self) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            if let Some(GridNode::Branch(split)) = self.nodes.get(&id) {
                order.push(id);
                stack.extend(split.keys().copied());
            }
        }
        order.reverse();
        order
    }

    fn sync_visibility(&mut self) -> Result<(), LayoutError> {
        for branch in self.post_order_branches() {
            let updates: Vec<(usize, bool)> = {
                let split = self.branch(branch)?;
                split
                    .views()
                    .iter()
                    .enumerate()
                    .filter_map(|(index, view)| {
                        let child = self.branch(*view.key()).ok()?;
                        let any_visible = child.views().iter().any(View::is_visible);
                        (any_visible != view.is_visible()).then_some((index, any_visible))
                    })
                    .collect()
            };
            let split = self.branch_mut(branch)?;
            for (index, visible) in updates {
                let _ = split.set_visible(index, visible)?;
            }
        }
        Ok(())
    }

    fn sync_bounds(&mut self) -> Result<(), LayoutError> {
        for branch in self.post_order_branches() {
            let updates: Vec<(usize, SizeConstraints)> = {
                let split = self.branch(branch)?;
                let orientation = split.orientation();
                split
                    .views()
                    .iter()
                    .enumerate()
                    .filter_map(|(index, view)| {
                        let bounds = self.bounds_of(*view.key(), orientation);
                        (bounds != view.constraints()).then_some((index, bounds))
                    })
                    .collect()
            };
            let split = self.branch_mut(branch)?;
            for (index, bounds) in updates {
                split.set_constraints(index, bounds)?;
            }
        }
        Ok(())
    }

    fn normalize(&mut self) -> Result<(), LayoutError> {
        self.sync_visibility()?;
        self.sync_bounds()?;
        if self.laid_out {
            self.layout_nodes();
        }
        Ok(())
    }

    fn layout_nodes(&mut self) {
        let mut stack = vec![(self.root, self.width, self.height)];
        while let Some((id, width, height)) = stack.pop() {
            let Some(GridNode::Branch(split)) = self.nodes.get_mut(&id) else {
                continue;
            };
            let orientation = split.orientation();
            let (main, cross) = match orientation {
                Orientation::Horizontal => (width, height),
                Orientation::Vertical => (height, width),
            };
            split.layout(main);
            for view in split.views() {
                let size = view.size();
                let child = match orientation {
                    Orientation::Horizontal => (*view.key(), size, cross),
                    Orientation::Vertical => (*view.key(), cross, size),
                };
                stack.push(child);
            }
        }
    }

    /// Insert a leaf at `location` (parent path plus child index).
    ///
    /// When the parent path resolves to a leaf, that leaf is wrapped in a new
    /// orthogonal branch and the new leaf lands at index 0 or 1 next to it.
    /// The root's only child is not wrapped: the root flips orientation and
    /// the new leaf becomes its sibling.
    pub fn insert_leaf(
        &mut self,
        location: &[usize],
        leaf: GridLeaf<T>,
        sizing: Sizing,
    ) -> Result<NodeId, LayoutError> {
        let _span = tracing::debug_span!("gridview.insert_leaf", location = ?location).entered();
        let Some((&index, prefix)) = location.split_last() else {
            return Err(LayoutError::not_found("empty grid location"));
        };
        self.transact("insert_leaf", |grid| {
            let _ = grid.exit_maximized_inner()?;
            leaf.constraints.validate()?;
            let parent = grid.node_at(prefix)?;
            let id = grid.allocate()?;
            if grid.is_branch(parent) {
                grid.insert_child(parent, id, leaf, sizing, index)?;
            } else {
                let grandparent = grid.parent_of(parent)?;
                if grandparent == grid.root && grid.branch(grandparent)?.len() <= 1 {
                    // A lone root child gets a sibling on a flipped root
                    // instead of a wrapper branch.
                    if index > 1 {
                        return Err(LayoutError::InvalidIndex { index, len: 1 });
                    }
                    grid.flip_root()?;
                    let at = grid.child_index(grandparent, parent)? + index;
                    grid.insert_child(grandparent, id, leaf, sizing, at)?;
                } else {
                    let axis = grid.branch(grandparent)?.orientation().orthogonal();
                    grid.wrap_leaf(parent, axis, id, leaf, sizing, index)?;
                }
            }
            Ok(id)
        })
    }

    /// Split the leaf at `path`, placing a new leaf on the `direction` side.
    ///
    /// The new leaf joins the existing run when the parent is already laid
    /// out along `direction`'s axis; otherwise the target is wrapped in an
    /// orthogonal branch. `size` defaults to half of the target.
    pub fn split_leaf(
        &mut self,
        path: &[usize],
        direction: Direction,
        leaf: GridLeaf<T>,
        size: Option<f64>,
    ) -> Result<NodeId, LayoutError> {
        let _span = tracing::debug_span!(
            "gridview.split_leaf",
            path = ?path,
            direction = ?direction
        )
        .entered();
        self.transact("split_leaf", |grid| {
            let _ = grid.exit_maximized_inner()?;
            let target = grid.leaf_at(path)?;
            let id = grid.allocate()?;
            grid.split_at(target, direction, id, leaf, size)?;
            Ok(id)
        })
    }

    /// Add a leaf along one edge of the whole grid.
    pub fn insert_at_root_edge(
        &mut self,
        direction: Direction,
        leaf: GridLeaf<T>,
        size: Option<f64>,
    ) -> Result<NodeId, LayoutError> {
        let _span =
            tracing::debug_span!("gridview.insert_at_root_edge", direction = ?direction).entered();
        self.transact("insert_at_root_edge", |grid| {
            let _ = grid.exit_maximized_inner()?;
            let id = grid.allocate()?;
            grid.insert_at_edge(direction, id, leaf, size)?;
            Ok(id)
        })
    }

    /// Remove the leaf at `path`, collapsing branches left with one child.
    pub fn remove_leaf(&mut self, path: &[usize]) -> Result<GridLeaf<T>, LayoutError> {
        let _span = tracing::debug_span!("gridview.remove_leaf", path = ?path).entered();
        self.transact("remove_leaf", |grid| {
            let _ = grid.exit_maximized_inner()?;
            let target = grid.leaf_at(path)?;
            grid.detach_leaf(target)
        })
    }

    /// Move the leaf at `source` next to the leaf at `target`. The moved leaf
    /// keeps its id.
    pub fn move_leaf(
        &mut self,
        source: &[usize],
        target: &[usize],
        direction: Direction,
    ) -> Result<NodeId, LayoutError> {
        let _span = tracing::debug_span!(
            "gridview.move_leaf",
            source = ?source,
            target = ?target,
            direction = ?direction
        )
        .entered();
        self.transact("move_leaf", |grid| {
            let _ = grid.exit_maximized_inner()?;
            let moving = grid.leaf_at(source)?;
            let anchor = grid.leaf_at(target)?;
            if moving == anchor {
                return Err(LayoutError::SameNode);
            }
            let leaf = grid.detach_leaf(moving)?;
            grid.split_at(anchor, direction, moving, leaf, None)?;
            Ok(moving)
        })
    }

    /// Resize the leaf at `path`. Each requested extent is applied by the
    /// nearest ancestor laid out along that axis.
    pub fn resize_leaf(
        &mut self,
        path: &[usize],
        width: Option<f64>,
        height: Option<f64>,
    ) -> Result<(), LayoutError> {
        let _span = tracing::debug_span!("gridview.resize_leaf", path = ?path).entered();
        self.transact("resize_leaf", |grid| {
            let leaf = grid.leaf_at(path)?;
            for (axis, size) in [
                (Orientation::Horizontal, width),
                (Orientation::Vertical, height),
            ] {
                let Some(size) = size else { continue };
                let mut child = leaf;
                while let Some(parent) = grid.parent(child) {
                    if grid.branch(parent)?.orientation() == axis {
                        let index = grid.child_index(parent, child)?;
                        grid.branch_mut(parent)?.resize_view(index, size)?;
                        break;
                    }
                    child = parent;
                }
            }
            Ok(())
        })
    }

    /// Show or hide the leaf at `path`. Returns whether anything changed.
    pub fn set_leaf_visible(&mut self, path: &[usize], visible: bool) -> Result<bool, LayoutError> {
        let _span =
            tracing::debug_span!("gridview.set_leaf_visible", path = ?path, visible).entered();
        self.transact("set_leaf_visible", |grid| {
            let _ = grid.exit_maximized_inner()?;
            let leaf = grid.leaf_at(path)?;
            grid.set_visible_inner(leaf, visible)
        })
    }

    pub fn set_leaf_constraints(
        &mut self,
        path: &[usize],
        constraints: LeafConstraints,
    ) -> Result<(), LayoutError> {
        let _span = tracing::debug_span!("gridview.set_leaf_constraints", path = ?path).entered();
        self.transact("set_leaf_constraints", |grid| {
            constraints.validate()?;
            let id = grid.leaf_at(path)?;
            if let Some(GridNode::Leaf(leaf)) = grid.nodes.get_mut(&id) {
                leaf.constraints = constraints;
            }
            Ok(())
        })
    }

    /// Hide every leaf but the one at `path`, remembering which leaves were
    /// already hidden and every branch's sizes.
    pub fn maximize_leaf(&mut self, path: &[usize]) -> Result<(), LayoutError> {
        let _span = tracing::debug_span!("gridview.maximize_leaf", path = ?path).entered();
        self.transact("maximize_leaf", |grid| {
            let _ = grid.exit_maximized_inner()?;
            let target = grid.leaf_at(path)?;
            let leaves = grid.leaves();
            let hidden_before: BTreeSet<NodeId> = leaves
                .iter()
                .copied()
                .filter(|leaf| !grid.is_visible(*leaf))
                .collect();
            let sizes: BTreeMap<NodeId, Vec<f64>> = grid
                .nodes
                .iter()
                .filter_map(|(id, node)| match node {
                    GridNode::Branch(split) => Some((*id, split.sizes())),
                    GridNode::Leaf(_) => None,
                })
                .collect();
            for leaf in leaves {
                let _ = grid.set_visible_inner(leaf, leaf == target)?;
            }
            grid.maximized = Some(MaximizedState {
                leaf: target,
                hidden_before,
                sizes,
            });
            Ok(())
        })
    }

    /// Leave the maximized state, restoring exactly the leaves that were
    /// visible before. Returns `false` when nothing was maximized.
    pub fn exit_maximized(&mut self) -> Result<bool, LayoutError> {
        let _span = tracing::debug_span!("gridview.exit_maximized").entered();
        if self.maximized.is_none() {
            return Ok(false);
        }
        self.transact("exit_maximized", Self::exit_maximized_inner)
    }

    /// Lay the grid out in a `width` x `height` area.
    pub fn layout(&mut self, width: f64, height: f64) {
        self.width = sanitize(width);
        self.height = sanitize(height);
        self.laid_out = true;
        self.layout_nodes();
    }

    /// Rectangle of every effectively visible node.
    #[must_use]
    pub fn compute_layout(&self) -> GridLayout {
        let mut rects = BTreeMap::new();
        let mut stack = vec![(self.root, Rect::from_size(self.width, self.height))];
        while let Some((id, rect)) = stack.pop() {
            let _ = rects.insert(id, rect);
            let Some(GridNode::Branch(split)) = self.nodes.get(&id) else {
                continue;
            };
            for (view, offset) in split.views().iter().zip(split.offsets()) {
                if !view.is_visible() {
                    continue;
                }
                let child = match split.orientation() {
                    Orientation::Horizontal => {
                        Rect::new(rect.x + offset, rect.y, view.size(), rect.height)
                    }
                    Orientation::Vertical => {
                        Rect::new(rect.x, rect.y + offset, rect.width, view.size())
                    }
                };
                stack.push((*view.key(), child));
            }
        }
        GridLayout { rects }
    }

    /// Check the structural invariants.
    pub fn validate(&self) -> Result<(), LayoutError> {
        let root = self.branch(self.root)?;
        if self.parents.contains_key(&self.root) {
            return Err(LayoutError::malformed("root has a parent"));
        }
        if let [only] = root.keys().copied().collect::<Vec<_>>().as_slice()
            && self.is_branch(*only)
        {
            return Err(LayoutError::malformed("root wraps a single branch"));
        }

        let mut visited = BTreeSet::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                return Err(LayoutError::malformed(format!("{id} reachable twice")));
            }
            let node = self
                .nodes
                .get(&id)
                .ok_or_else(|| LayoutError::malformed(format!("missing {id}")))?;
            match node {
                GridNode::Leaf(leaf) => leaf.constraints.validate()?,
                GridNode::Branch(split) => {
                    if id != self.root && split.len() < 2 {
                        return Err(LayoutError::malformed(format!(
                            "{id} has {} child(ren)",
                            split.len()
                        )));
                    }
                    for child in split.keys() {
                        if self.parent(*child) != Some(id) {
                            return Err(LayoutError::malformed(format!(
                                "parent of {child} is not {id}"
                            )));
                        }
                        if let Some(GridNode::Branch(nested)) = self.nodes.get(child)
                            && nested.orientation() == split.orientation()
                        {
                            return Err(LayoutError::malformed(format!(
                                "{child} has the same orientation as {id}"
                            )));
                        }
                        stack.push(*child);
                    }
                }
            }
        }
        if visited.len() != self.nodes.len() || self.parents.len() + 1 != self.nodes.len() {
            return Err(LayoutError::malformed("unreachable nodes"));
        }
        Ok(())
    }

    /// Wire form of the grid, mapping every leaf through `leaf`.
    pub fn serialize_with<U>(&self, mut leaf: impl FnMut(&GridLeaf<T>) -> U) -> SerializedGrid<U> {
        let orientation = self.orientation();
        let cross = match orientation {
            Orientation::Horizontal => self.height,
            Orientation::Vertical => self.width,
        };
        SerializedGrid {
            root: self.serialize_node(self.root, cross, true, &mut leaf),
            width: self.width,
            height: self.height,
            orientation,
        }
    }

    fn serialize_node<U, F: FnMut(&GridLeaf<T>) -> U>(
        &self,
        id: NodeId,
        size: f64,
        visible: bool,
        leaf: &mut F,
    ) -> SerializedGridNode<U> {
        match self.nodes.get(&id) {
            Some(GridNode::Leaf(node)) => SerializedGridNode::Leaf {
                data: leaf(node),
                size,
                visible,
            },
            Some(GridNode::Branch(split)) => {
                let mut data = Vec::with_capacity(split.len());
                for view in split.views() {
                    data.push(self.serialize_node(
                        *view.key(),
                        view.size(),
                        view.is_visible(),
                        leaf,
                    ));
                }
                SerializedGridNode::Branch {
                    data,
                    size,
                    visible,
                }
            }
            None => SerializedGridNode::Branch {
                data: Vec::new(),
                size,
                visible,
            },
        }
    }

    /// Serialized form with the payloads cloned as-is. Leaf constraints are
    /// not written; payloads that need them should carry them.
    #[must_use]
    pub fn serialize(&self) -> SerializedGrid<T> {
        self.serialize_with(|leaf| leaf.data.clone())
    }

    /// Rebuild a grid from its wire form, mapping every payload through
    /// `leaf`. Fresh node ids are assigned depth-first.
    pub fn deserialize_with<U>(
        grid: &SerializedGrid<U>,
        proportional: bool,
        mut leaf: impl FnMut(&U) -> Result<GridLeaf<T>, LayoutError>,
    ) -> Result<Self, LayoutError> {
        let SerializedGridNode::Branch { data: children, .. } = &grid.root else {
            return Err(LayoutError::malformed("root must be a branch"));
        };
        check_wire_size(grid.width)?;
        check_wire_size(grid.height)?;

        let mut out = Self::new(grid.orientation, proportional);
        let root = out.root;
        let views = out.build_children(root, grid.orientation, children, &mut leaf)?;
        let _ = out.nodes.insert(
            root,
            GridNode::Branch(Splitview::from_views(grid.orientation, proportional, views)?),
        );
        out.collapse(root)?;
        out.width = grid.width;
        out.height = grid.height;
        out.laid_out = grid.width > 0.0 && grid.height > 0.0;
        out.normalize()?;
        out.validate()?;
        Ok(out)
    }

    fn build_children<U, F>(
        &mut self,
        parent: NodeId,
        orientation: Orientation,
        children: &[SerializedGridNode<U>],
        leaf: &mut F,
    ) -> Result<Vec<View<NodeId>>, LayoutError>
    where
        F: FnMut(&U) -> Result<GridLeaf<T>, LayoutError>,
    {
        let mut views = Vec::with_capacity(children.len());
        for child in children {
            check_wire_size(child.size())?;
            let id = self.allocate()?;
            let bounds = match child {
                SerializedGridNode::Branch { data, .. } => {
                    if data.len() < 2 {
                        return Err(LayoutError::malformed(format!(
                            "nested branch with {} child(ren)",
                            data.len()
                        )));
                    }
                    let nested = orientation.orthogonal();
                    let nested_views = self.build_children(id, nested, data, leaf)?;
                    let split = Splitview::from_views(nested, self.proportional, nested_views)?;
                    let _ = self.nodes.insert(id, GridNode::Branch(split));
                    SizeConstraints::UNBOUNDED
                }
                SerializedGridNode::Leaf { data, .. } => {
                    let built = leaf(data)?;
                    built.constraints.validate()?;
                    let bounds = built.constraints.along(orientation);
                    let _ = self.nodes.insert(id, GridNode::Leaf(built));
                    bounds
                }
            };
            let _ = self.parents.insert(id, parent);
            views.push(View::new(id, child.size(), bounds).with_visible(child.is_visible()));
        }
        Ok(views)
    }

    pub fn deserialize(grid: &SerializedGrid<T>, proportional: bool) -> Result<Self, LayoutError> {
        Self::deserialize_with(grid, proportional, |data| Ok(GridLeaf::new(data.clone())))
    }
}

impl<T: Clone + PartialEq + Hash> Gridview<T> {
    fn hash_state(&self, geometry: bool) -> u64 {
        let mut hasher = StateHasher::new();
        self.root.hash(&mut hasher);
        self.nodes.len().hash(&mut hasher);
        for (id, node) in &self.nodes {
            id.hash(&mut hasher);
            self.parent(*id).hash(&mut hasher);
            match node {
                GridNode::Leaf(leaf) => {
                    hasher.write_u8(1);
                    leaf.data.hash(&mut hasher);
                    if geometry {
                        for bound in [leaf.constraints.width, leaf.constraints.height] {
                            bound.minimum.to_bits().hash(&mut hasher);
                            bound.maximum.to_bits().hash(&mut hasher);
                        }
                    }
                }
                GridNode::Branch(split) => {
                    hasher.write_u8(2);
                    split.orientation().hash(&mut hasher);
                    split.len().hash(&mut hasher);
                    for view in split.views() {
                        view.key().hash(&mut hasher);
                        view.is_visible().hash(&mut hasher);
                        if geometry {
                            view.size().to_bits().hash(&mut hasher);
                        }
                    }
                }
            }
        }
        if geometry {
            self.width.to_bits().hash(&mut hasher);
            self.height.to_bits().hash(&mut hasher);
        }
        self.maximized_leaf().hash(&mut hasher);
        hasher.finish()
    }

    /// Deterministic hash of the whole state, sizes included.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        self.hash_state(true)
    }

    /// Deterministic hash of the tree shape, payloads and visibility only.
    #[must_use]
    pub fn shape_hash(&self) -> u64 {
        self.hash_state(false)
    }
}
