//! The docking model: groups of panels placed in a grid or detached from it.
//!
//! # Design
//!
//! [`DockLayout`] owns a [`Gridview`] whose leaves carry [`GroupId`]s, the
//! group table, the panel registry and a `panel -> group` lookup table. Groups
//! that float or live in a host window are not grid leaves; their location
//! alone records where they are.
//!
//! Every public mutation runs as a transaction: the state is cloned, the
//! operation and a reconciliation pass run on the clone, the result is
//! validated, and only then swapped in. Events and deferred window closes are
//! collected during the transaction and released after commit. On failure any
//! window opened by the transaction is closed again and nothing is emitted.
//!
//! # Invariants
//!
//! 1. A group occupies a grid leaf iff its location is `Grid` or `Maximized`,
//!    and no two leaves carry the same group.
//! 2. At most one group is `Maximized`, and it is the grid's maximized leaf.
//! 3. Every group's active panel is `None` iff it has no panels, otherwise one
//!    of its panels.
//! 4. Each registered panel belongs to exactly one group and the lookup table
//!    agrees.

use std::collections::BTreeMap;

use panedock_core::{
    Direction, EventEmitter, GroupId, IdAllocator, Orientation, PanelId, Rect, Subscription,
};
use panedock_layout::{GridLeaf, Gridview, LeafConstraints};
use rustc_hash::FxHashMap;

use crate::error::DockError;
use crate::event::DockEvent;
use crate::group::{Group, Panel, PanelOptions};
use crate::host::{NoWindowHost, WindowHandle, WindowHost};
use crate::location::{FloatingBox, Location, PopoutWindow, RefusedTransition};
use crate::options::DockOptions;
use crate::position::{DropDirection, DropReference, DropTarget, GroupOptions, PanelPosition};

/// Grid as it was before a group left it, and the grid's state hash right
/// after it left.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RestorePoint {
    pub(crate) grid: Gridview<GroupId>,
    pub(crate) detached_hash: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DockState {
    pub(crate) options: DockOptions,
    pub(crate) grid: Gridview<GroupId>,
    pub(crate) groups: BTreeMap<GroupId, Group>,
    pub(crate) panels: BTreeMap<PanelId, Panel>,
    pub(crate) panel_groups: FxHashMap<PanelId, GroupId>,
    pub(crate) ids: IdAllocator,
    pub(crate) active_group: Option<GroupId>,
    pub(crate) restore_points: BTreeMap<GroupId, RestorePoint>,
}

/// Side effects collected while a transaction runs.
pub(crate) struct Effects<'a> {
    host: &'a mut dyn WindowHost,
    events: Vec<DockEvent>,
    opened: Vec<WindowHandle>,
    closing: Vec<WindowHandle>,
}

impl<'a> Effects<'a> {
    fn new(host: &'a mut dyn WindowHost) -> Self {
        Self {
            host,
            events: Vec::new(),
            opened: Vec::new(),
            closing: Vec::new(),
        }
    }

    pub(crate) fn emit(&mut self, event: DockEvent) {
        self.events.push(event);
    }

    pub(crate) fn open_window(&mut self, group: GroupId) -> Result<WindowHandle, DockError> {
        let handle = self
            .host
            .open_window(group)
            .map_err(|err| DockError::DetachFailed {
                group,
                reason: err.to_string(),
            })?;
        self.opened.push(handle);
        Ok(handle)
    }

    /// Close `handle` once the transaction commits.
    pub(crate) fn close_window(&mut self, handle: WindowHandle) {
        self.closing.push(handle);
    }

    fn rollback(self) {
        for handle in self.opened {
            self.host.close_window(handle);
        }
    }
}

fn refused(group: GroupId, refused: RefusedTransition) -> DockError {
    DockError::InvalidLocation {
        group,
        location: refused.from,
        operation: refused.operation,
    }
}

fn trailing_edge(orientation: Orientation) -> Direction {
    match orientation {
        Orientation::Horizontal => Direction::Right,
        Orientation::Vertical => Direction::Below,
    }
}

impl DockState {
    pub(crate) fn new(options: DockOptions) -> Self {
        let mut grid = Gridview::new(options.orientation, options.proportional_layout);
        if options.width > 0.0 || options.height > 0.0 {
            grid.layout(options.width, options.height);
        }
        Self {
            options,
            grid,
            groups: BTreeMap::new(),
            panels: BTreeMap::new(),
            panel_groups: FxHashMap::default(),
            ids: IdAllocator::default(),
            active_group: None,
            restore_points: BTreeMap::new(),
        }
    }

    pub(crate) fn group(&self, id: GroupId) -> Result<&Group, DockError> {
        self.groups
            .get(&id)
            .ok_or_else(|| DockError::group_not_found(id))
    }

    fn group_mut(&mut self, id: GroupId) -> Result<&mut Group, DockError> {
        self.groups
            .get_mut(&id)
            .ok_or_else(|| DockError::group_not_found(id))
    }

    fn group_of(&self, panel: &PanelId) -> Result<GroupId, DockError> {
        self.panel_groups
            .get(panel)
            .copied()
            .ok_or_else(|| DockError::panel_not_found(panel))
    }

    fn leaf_path(&self, group: GroupId) -> Result<Vec<usize>, DockError> {
        let leaf = self.grid.find_leaf(&group).ok_or_else(|| DockError::NotFound {
            what: format!("grid leaf of group {group}"),
        })?;
        Ok(self.grid.locate(leaf)?)
    }

    fn require_in_grid(&self, group: GroupId, operation: &'static str) -> Result<(), DockError> {
        let location = &self.group(group)?.location;
        if location.is_in_grid() {
            Ok(())
        } else {
            Err(DockError::InvalidLocation {
                group,
                location: location.kind(),
                operation,
            })
        }
    }

    /// Group a reference points at; `None` for the grid root.
    fn resolve(&self, reference: &DropReference) -> Result<Option<GroupId>, DockError> {
        match reference {
            DropReference::Panel(panel) => self.group_of(panel).map(Some),
            DropReference::Group(group) => self.group(*group).map(|g| Some(g.id())),
            DropReference::Root => Ok(None),
        }
    }

    fn resolve_within(&self, reference: &DropReference) -> Result<GroupId, DockError> {
        self.resolve(reference)?.ok_or_else(|| DockError::NotFound {
            what: "a group to drop within at the grid root".into(),
        })
    }

    fn set_active_group(&mut self, group: Option<GroupId>, effects: &mut Effects<'_>) {
        if self.active_group != group {
            self.active_group = group;
            effects.emit(DockEvent::ActiveGroupChanged { group });
        }
    }

    fn create_group(
        &mut self,
        location: Location,
        constraints: Option<LeafConstraints>,
        effects: &mut Effects<'_>,
    ) -> Result<GroupId, DockError> {
        let constraints = constraints.unwrap_or(self.options.group_constraints);
        constraints.validate()?;
        let id = self.ids.allocate_group()?;
        let _ = self.groups.insert(id, Group::new(id, location, constraints));
        effects.emit(DockEvent::GroupAdded { group: id });
        Ok(id)
    }

    /// Put `group` into the grid next to `anchor`, or at the root edge.
    fn place(
        &mut self,
        group: GroupId,
        anchor: Option<GroupId>,
        direction: Direction,
    ) -> Result<(), DockError> {
        let leaf = GridLeaf::new(group).with_constraints(self.group(group)?.constraints);
        match anchor {
            Some(anchor) => {
                self.require_in_grid(anchor, "take a neighbour")?;
                let path = self.leaf_path(anchor)?;
                let _ = self.grid.split_leaf(&path, direction, leaf, None)?;
            }
            None => {
                let _ = self.grid.insert_at_root_edge(direction, leaf, None)?;
            }
        }
        Ok(())
    }

    /// Create a group for new content at `position`.
    fn group_at(
        &mut self,
        position: Option<&PanelPosition>,
        constraints: Option<LeafConstraints>,
        effects: &mut Effects<'_>,
    ) -> Result<GroupId, DockError> {
        match position {
            None => {
                let id = self.create_group(Location::Grid, constraints, effects)?;
                self.place(id, None, trailing_edge(self.grid.orientation()))?;
                Ok(id)
            }
            Some(PanelPosition::Floating(rect)) => {
                let floating = self.floating_box(*rect)?;
                self.create_group(Location::Floating(floating), constraints, effects)
            }
            Some(PanelPosition::Target(target)) => {
                let anchor = self.resolve(&target.reference)?;
                let Some(direction) = target.direction.split() else {
                    let anchor = self.resolve_within(&target.reference)?;
                    return Err(DockError::InvalidLocation {
                        group: anchor,
                        location: self.group(anchor)?.location.kind(),
                        operation: "hold another group",
                    });
                };
                let id = self.create_group(Location::Grid, constraints, effects)?;
                self.place(id, anchor, direction)?;
                Ok(id)
            }
        }
    }

    fn floating_box(&self, rect: Option<Rect>) -> Result<FloatingBox, DockError> {
        let rect = rect.unwrap_or(self.options.floating_default);
        FloatingBox::new(rect).ok_or_else(|| {
            DockError::malformed(format!(
                "floating rectangle {rect:?} must be finite with a positive size"
            ))
        })
    }

    fn attach_panel(
        &mut self,
        panel: PanelId,
        group: GroupId,
        index: Option<usize>,
        effects: &mut Effects<'_>,
    ) -> Result<(), DockError> {
        self.group_mut(group)?.insert_panel(panel.clone(), index)?;
        let _ = self.panel_groups.insert(panel.clone(), group);
        effects.emit(DockEvent::PanelAdded {
            panel: panel.clone(),
            group,
        });
        effects.emit(DockEvent::ActivePanelChanged {
            group,
            panel: Some(panel),
        });
        self.set_active_group(Some(group), effects);
        Ok(())
    }

    /// Take `panel` out of its group without touching the registry.
    fn detach_panel(
        &mut self,
        panel: &PanelId,
        effects: &mut Effects<'_>,
    ) -> Result<GroupId, DockError> {
        let group = self.group_of(panel)?;
        let entry = self.group_mut(group)?;
        let previous = entry.active_panel().cloned();
        let _ = entry.remove_panel(panel)?;
        let active = entry.active_panel().cloned();
        let _ = self.panel_groups.remove(panel);
        effects.emit(DockEvent::PanelRemoved {
            panel: panel.clone(),
            group,
        });
        if previous != active {
            effects.emit(DockEvent::ActivePanelChanged {
                group,
                panel: active,
            });
        }
        Ok(group)
    }

    fn destroy_if_unused(&mut self, group: GroupId, effects: &mut Effects<'_>) -> Result<(), DockError> {
        let entry = self.group(group)?;
        if entry.is_empty() && !entry.is_persistent() {
            self.destroy_group(group, effects)?;
        }
        Ok(())
    }

    fn destroy_group(&mut self, group: GroupId, effects: &mut Effects<'_>) -> Result<(), DockError> {
        let location = self.group(group)?.location;
        let panels = self.group_mut(group)?.drain_panels();
        for panel in panels {
            let _ = self.panels.remove(&panel);
            let _ = self.panel_groups.remove(&panel);
            effects.emit(DockEvent::PanelRemoved { panel, group });
        }
        match location {
            Location::Grid | Location::Maximized => {
                let path = self.leaf_path(group)?;
                let _ = self.grid.remove_leaf(&path)?;
            }
            Location::Popout(window) => effects.close_window(window.handle),
            Location::Floating(_) => {}
        }
        let _ = self.groups.remove(&group);
        let _ = self.restore_points.remove(&group);
        effects.emit(DockEvent::GroupRemoved { group });
        Ok(())
    }

    /// Remove a grid group's leaf, remembering the grid so an untargeted
    /// dock can put it back exactly.
    fn detach_from_grid(&mut self, group: GroupId) -> Result<(), DockError> {
        let _ = self.grid.exit_maximized()?;
        let before = self.grid.clone();
        let path = self.leaf_path(group)?;
        let _ = self.grid.remove_leaf(&path)?;
        let _ = self.restore_points.insert(
            group,
            RestorePoint {
                grid: before,
                detached_hash: self.grid.state_hash(),
            },
        );
        Ok(())
    }

    fn relocate(&mut self, group: GroupId, next: Location, effects: &mut Effects<'_>) -> Result<(), DockError> {
        let entry = self.group_mut(group)?;
        let from = entry.location.kind();
        entry.location = next;
        if from != next.kind() {
            effects.emit(DockEvent::LocationChanged {
                group,
                from,
                to: next.kind(),
            });
        }
        Ok(())
    }

    /// Move every panel of `source` into `target`, starting at `index`, then
    /// drop `source`.
    fn merge_into(
        &mut self,
        source: GroupId,
        target: GroupId,
        index: Option<usize>,
        effects: &mut Effects<'_>,
    ) -> Result<(), DockError> {
        if source == target {
            return Err(DockError::InvalidLocation {
                group: source,
                location: self.group(source)?.location.kind(),
                operation: "merge into itself",
            });
        }
        self.require_in_grid(target, "receive panels")?;
        let active = self.group(source)?.active_panel().cloned();
        let panels: Vec<PanelId> = self.group(source)?.panels().to_vec();
        let mut at = index;
        for panel in panels {
            let _ = self.detach_panel(&panel, effects)?;
            self.attach_panel(panel, target, at, effects)?;
            at = at.map(|i| i + 1);
        }
        if let Some(active) = active
            && self.group_mut(target)?.set_active(&active)?
        {
            effects.emit(DockEvent::ActivePanelChanged {
                group: target,
                panel: Some(active),
            });
        }
        self.destroy_group(source, effects)
    }

    /// Re-derive what follows from the grid after an operation.
    pub(crate) fn reconcile(&mut self, effects: &mut Effects<'_>) -> Result<(), DockError> {
        let maximized = self
            .grid
            .maximized_leaf()
            .and_then(|leaf| self.grid.leaf(leaf))
            .map(|leaf| leaf.data);
        let demoted: Vec<GroupId> = self
            .groups
            .values()
            .filter(|g| g.location == Location::Maximized && Some(g.id()) != maximized)
            .map(Group::id)
            .collect();
        for group in demoted {
            let next = self
                .group(group)?
                .location
                .exit_maximized()
                .map_err(|r| refused(group, r))?;
            self.relocate(group, next, effects)?;
        }

        if let Some(active) = self.active_group
            && !self.groups.contains_key(&active)
        {
            let fallback = self.groups.keys().next_back().copied();
            self.set_active_group(fallback, effects);
        }

        let groups = &self.groups;
        self.restore_points.retain(|id, _| {
            groups
                .get(id)
                .is_some_and(|group| !group.location.is_in_grid())
        });
        Ok(())
    }

    /// Check the model invariants.
    pub(crate) fn validate(&self) -> Result<(), DockError> {
        self.grid.validate()?;

        let mut seen = BTreeMap::new();
        for leaf in self.grid.leaves() {
            let group = self
                .grid
                .leaf(leaf)
                .map(|leaf| leaf.data)
                .ok_or_else(|| DockError::malformed(format!("{leaf} is not a leaf")))?;
            if seen.insert(group, leaf).is_some() {
                return Err(DockError::malformed(format!(
                    "group {group} occupies two grid leaves"
                )));
            }
            if !self.group(group)?.location.is_in_grid() {
                return Err(DockError::malformed(format!(
                    "group {group} is in the grid but not located there"
                )));
            }
        }

        let mut maximized = 0usize;
        let mut panel_count = 0usize;
        for group in self.groups.values() {
            group.check_active()?;
            if group.location.is_in_grid() && !seen.contains_key(&group.id()) {
                return Err(DockError::malformed(format!(
                    "group {} has no grid leaf",
                    group.id()
                )));
            }
            if group.location == Location::Maximized {
                maximized += 1;
                let leaf = seen.get(&group.id()).copied();
                if leaf.is_none() || leaf != self.grid.maximized_leaf() {
                    return Err(DockError::malformed(format!(
                        "group {} is maximized but its leaf is not",
                        group.id()
                    )));
                }
            }
            for panel in group.panels() {
                panel_count += 1;
                if !self.panels.contains_key(panel) {
                    return Err(DockError::malformed(format!("panel {panel} is not registered")));
                }
                if self.panel_groups.get(panel) != Some(&group.id()) {
                    return Err(DockError::malformed(format!(
                        "panel {panel} is not mapped to group {}",
                        group.id()
                    )));
                }
            }
        }
        if maximized > 1 {
            return Err(DockError::malformed("more than one maximized group"));
        }
        if panel_count != self.panels.len() || panel_count != self.panel_groups.len() {
            return Err(DockError::malformed("panel registry out of sync with groups"));
        }
        if let Some(active) = self.active_group
            && !self.groups.contains_key(&active)
        {
            return Err(DockError::group_not_found(active));
        }
        Ok(())
    }

    /// Rectangle of every group that has one in the dock area.
    pub(crate) fn geometries(&self) -> BTreeMap<GroupId, Rect> {
        let mut out = BTreeMap::new();
        let layout = self.grid.compute_layout();
        for leaf in self.grid.leaves() {
            if let (Some(rect), Some(data)) = (layout.rect(leaf), self.grid.leaf(leaf)) {
                let _ = out.insert(data.data, rect);
            }
        }
        for group in self.groups.values() {
            if let Some(rect) = group.location.floating_rect() {
                let _ = out.insert(group.id(), rect);
            }
        }
        out
    }
}

/// A docking layout and its event stream.
pub struct DockLayout<H: WindowHost = NoWindowHost> {
    pub(crate) state: DockState,
    pub(crate) host: H,
    events: EventEmitter<DockEvent>,
}

impl<H: WindowHost> std::fmt::Debug for DockLayout<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DockLayout")
            .field("groups", &self.state.groups.len())
            .field("panels", &self.state.panels.len())
            .field("active_group", &self.state.active_group)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

impl DockLayout<NoWindowHost> {
    /// A layout whose groups can float but never pop out.
    pub fn new(options: DockOptions) -> Result<Self, DockError> {
        Self::with_host(options, NoWindowHost)
    }
}

impl<H: WindowHost> DockLayout<H> {
    pub fn with_host(options: DockOptions, host: H) -> Result<Self, DockError> {
        options.validate()?;
        Ok(Self {
            state: DockState::new(options),
            host,
            events: EventEmitter::new(),
        })
    }

    pub(crate) fn transact<R>(
        &mut self,
        operation: &'static str,
        apply: impl FnOnce(&mut DockState, &mut Effects<'_>) -> Result<R, DockError>,
    ) -> Result<R, DockError> {
        let mut working = self.state.clone();
        let mut effects = Effects::new(&mut self.host);
        let result = apply(&mut working, &mut effects).and_then(|value| {
            working.reconcile(&mut effects)?;
            working.validate()?;
            Ok(value)
        });
        match result {
            Ok(value) => {
                let Effects {
                    mut events,
                    closing,
                    ..
                } = effects;
                for handle in closing {
                    self.host.close_window(handle);
                }
                let before = self.state.geometries();
                self.state = working;
                geometry_events(&before, &self.state.geometries(), &mut events);
                tracing::debug!(
                    target: "panedock.dock",
                    operation,
                    groups = self.state.groups.len(),
                    panels = self.state.panels.len(),
                    events = events.len(),
                    "dock operation committed"
                );
                self.events.emit_all(&events);
                Ok(value)
            }
            Err(err) => {
                effects.rollback();
                tracing::debug!(
                    target: "panedock.dock",
                    operation,
                    error = %err,
                    "dock operation rejected"
                );
                Err(err)
            }
        }
    }

    /// Listen to lifecycle events. Dropping the guard unsubscribes.
    pub fn subscribe(&mut self, listener: impl Fn(&DockEvent) + 'static) -> Subscription {
        self.events.subscribe(listener)
    }

    /// Add a panel. Without a position it gets a new group at the trailing
    /// edge of the grid; `Within` joins the reference group's tabs.
    pub fn add_panel(
        &mut self,
        options: PanelOptions,
        position: Option<PanelPosition>,
    ) -> Result<GroupId, DockError> {
        let _span = tracing::debug_span!("dock.add_panel", panel = %options.id).entered();
        self.transact("add_panel", |state, effects| {
            if state.panels.contains_key(&options.id) {
                return Err(DockError::DuplicatePanel { panel: options.id });
            }
            let within = match &position {
                Some(PanelPosition::Target(target)) if target.direction == DropDirection::Within => {
                    let group = state.resolve_within(&target.reference)?;
                    state.require_in_grid(group, "take a panel within")?;
                    Some((group, target.index))
                }
                _ => None,
            };
            let (group, index) = match within {
                Some(found) => found,
                None => (state.group_at(position.as_ref(), None, effects)?, None),
            };
            let panel = options.into_panel();
            let id = panel.id.clone();
            let _ = state.panels.insert(id.clone(), panel);
            state.attach_panel(id, group, index, effects)?;
            Ok(group)
        })
    }

    /// Create an empty group.
    pub fn add_group(&mut self, options: GroupOptions) -> Result<GroupId, DockError> {
        let _span = tracing::debug_span!("dock.add_group", persistent = options.persistent).entered();
        self.transact("add_group", |state, effects| {
            let group = state.group_at(options.position.as_ref(), options.constraints, effects)?;
            state.group_mut(group)?.persistent = options.persistent;
            state.set_active_group(Some(group), effects);
            Ok(group)
        })
    }

    /// Close a panel. Its group goes too once empty, unless persistent.
    pub fn close_panel(&mut self, panel: &PanelId) -> Result<(), DockError> {
        let _span = tracing::debug_span!("dock.close_panel", panel = %panel).entered();
        self.transact("close_panel", |state, effects| {
            let group = state.detach_panel(panel, effects)?;
            let _ = state.panels.remove(panel);
            state.destroy_if_unused(group, effects)
        })
    }

    /// Remove a group and every panel in it.
    pub fn remove_group(&mut self, group: GroupId) -> Result<(), DockError> {
        let _span = tracing::debug_span!("dock.remove_group", group = %group).entered();
        self.transact("remove_group", |state, effects| {
            state.destroy_group(group, effects)
        })
    }

    pub fn set_active_panel(&mut self, panel: &PanelId) -> Result<(), DockError> {
        let _span = tracing::debug_span!("dock.set_active_panel", panel = %panel).entered();
        self.transact("set_active_panel", |state, effects| {
            let group = state.group_of(panel)?;
            if state.group_mut(group)?.set_active(panel)? {
                effects.emit(DockEvent::ActivePanelChanged {
                    group,
                    panel: Some(panel.clone()),
                });
            }
            state.set_active_group(Some(group), effects);
            Ok(())
        })
    }

    pub fn set_active_group(&mut self, group: GroupId) -> Result<(), DockError> {
        let _span = tracing::debug_span!("dock.set_active_group", group = %group).entered();
        self.transact("set_active_group", |state, effects| {
            let _ = state.group(group)?;
            state.set_active_group(Some(group), effects);
            Ok(())
        })
    }

    /// Move a panel into another group's tabs, or into a new group placed
    /// next to the target.
    pub fn move_panel(&mut self, panel: &PanelId, target: DropTarget) -> Result<(), DockError> {
        let _span = tracing::debug_span!(
            "dock.move_panel",
            panel = %panel,
            direction = ?target.direction
        )
        .entered();
        self.transact("move_panel", |state, effects| {
            let source = state.group_of(panel)?;
            match target.direction.split() {
                None => {
                    let destination = state.resolve_within(&target.reference)?;
                    if destination == source {
                        let last = state.group(source)?.len().saturating_sub(1);
                        let index = target.index.unwrap_or(last);
                        state.group_mut(source)?.move_panel(panel, index)?;
                        if state.group_mut(source)?.set_active(panel)? {
                            effects.emit(DockEvent::ActivePanelChanged {
                                group: source,
                                panel: Some(panel.clone()),
                            });
                        }
                        state.set_active_group(Some(source), effects);
                        return Ok(());
                    }
                    state.require_in_grid(destination, "take a panel within")?;
                    let _ = state.detach_panel(panel, effects)?;
                    state.attach_panel(panel.clone(), destination, target.index, effects)?;
                }
                Some(direction) => {
                    let anchor = state.resolve(&target.reference)?;
                    if anchor == Some(source) && state.group(source)?.len() == 1 {
                        return Err(DockError::InvalidLocation {
                            group: source,
                            location: state.group(source)?.location.kind(),
                            operation: "split its only panel off next to itself",
                        });
                    }
                    let constraints = state.group(source)?.constraints;
                    let group = state.create_group(Location::Grid, Some(constraints), effects)?;
                    state.place(group, anchor, direction)?;
                    let _ = state.detach_panel(panel, effects)?;
                    state.attach_panel(panel.clone(), group, None, effects)?;
                }
            }
            state.destroy_if_unused(source, effects)
        })
    }

    /// Move a whole group: `Within` merges its panels into the target, any
    /// other direction re-docks it next to the target.
    pub fn move_group(&mut self, group: GroupId, target: DropTarget) -> Result<(), DockError> {
        let _span = tracing::debug_span!(
            "dock.move_group",
            group = %group,
            direction = ?target.direction
        )
        .entered();
        self.transact("move_group", |state, effects| {
            let Some(direction) = target.direction.split() else {
                let destination = state.resolve_within(&target.reference)?;
                return state.merge_into(group, destination, target.index, effects);
            };
            let anchor = state.resolve(&target.reference)?;
            let location = state.group(group)?.location;
            if anchor == Some(group) {
                return Err(DockError::InvalidLocation {
                    group,
                    location: location.kind(),
                    operation: "move next to itself",
                });
            }
            if location.is_in_grid() {
                let source = state.leaf_path(group)?;
                match anchor {
                    Some(anchor) => {
                        state.require_in_grid(anchor, "take a neighbour")?;
                        let target = state.leaf_path(anchor)?;
                        let _ = state.grid.move_leaf(&source, &target, direction)?;
                    }
                    None => {
                        let _ = state.grid.remove_leaf(&source)?;
                        state.place(group, None, direction)?;
                    }
                }
                return Ok(());
            }
            if let Some(handle) = location.window() {
                effects.close_window(handle);
            }
            let docked = location.dock().map_err(|r| refused(group, r))?;
            state.relocate(group, docked, effects)?;
            state.place(group, anchor, direction)
        })
    }

    /// Detach a group from the grid (or its window) and float it.
    pub fn float_group(&mut self, group: GroupId, rect: Option<Rect>) -> Result<(), DockError> {
        let _span = tracing::debug_span!("dock.float_group", group = %group).entered();
        self.transact("float_group", |state, effects| {
            let floating = state.floating_box(rect)?;
            let location = state.group(group)?.location;
            let next = location.float(floating).map_err(|r| refused(group, r))?;
            match location {
                Location::Grid => state.detach_from_grid(group)?,
                Location::Popout(window) => effects.close_window(window.handle),
                Location::Floating(_) | Location::Maximized => {}
            }
            state.relocate(group, next, effects)
        })
    }

    /// Move or resize a floating group.
    pub fn set_floating_box(&mut self, group: GroupId, rect: Rect) -> Result<(), DockError> {
        let _span = tracing::debug_span!("dock.set_floating_box", group = %group).entered();
        self.transact("set_floating_box", |state, _effects| {
            let floating = state.floating_box(Some(rect))?;
            let entry = state.group_mut(group)?;
            match entry.location {
                Location::Floating(_) => {
                    entry.location = Location::Floating(floating);
                    Ok(())
                }
                other => Err(DockError::InvalidLocation {
                    group,
                    location: other.kind(),
                    operation: "change its floating box",
                }),
            }
        })
    }

    /// Return a floating or popped-out group to the grid.
    ///
    /// Without a target the grid is put back exactly as it was before the
    /// group left, provided nothing changed it since; otherwise the group
    /// lands on the trailing edge of the root.
    pub fn dock_group(&mut self, group: GroupId, target: Option<DropTarget>) -> Result<(), DockError> {
        let _span = tracing::debug_span!("dock.dock_group", group = %group).entered();
        self.transact("dock_group", |state, effects| {
            let location = state.group(group)?.location;
            let docked = location.dock().map_err(|r| refused(group, r))?;
            if let Some(target) = &target
                && target.direction == DropDirection::Within
            {
                let destination = state.resolve_within(&target.reference)?;
                return state.merge_into(group, destination, target.index, effects);
            }
            if let Some(handle) = location.window() {
                effects.close_window(handle);
            }
            let point = state.restore_points.remove(&group);
            state.relocate(group, docked, effects)?;
            match (target, point) {
                (Some(target), _) => {
                    let anchor = state.resolve(&target.reference)?;
                    let direction = target
                        .direction
                        .split()
                        .unwrap_or_else(|| trailing_edge(state.grid.orientation()));
                    state.place(group, anchor, direction)?;
                }
                (None, Some(point)) if point.detached_hash == state.grid.state_hash() => {
                    tracing::trace!(target: "panedock.dock", group = %group, "restoring grid");
                    state.grid = point.grid;
                    let constraints = state.group(group)?.constraints;
                    let path = state.leaf_path(group)?;
                    state.grid.set_leaf_constraints(&path, constraints)?;
                }
                (None, _) => {
                    let edge = trailing_edge(state.grid.orientation());
                    state.place(group, None, edge)?;
                }
            }
            Ok(())
        })
    }

    /// Render a group in a host window.
    pub fn popout_group(&mut self, group: GroupId) -> Result<WindowHandle, DockError> {
        let _span = tracing::debug_span!("dock.popout_group", group = %group).entered();
        self.transact("popout_group", |state, effects| {
            let location = state.group(group)?.location;
            let placeholder = PopoutWindow {
                handle: WindowHandle::new(0),
            };
            let _ = location.popout(placeholder).map_err(|r| refused(group, r))?;
            let handle = effects.open_window(group)?;
            if location == Location::Grid {
                state.detach_from_grid(group)?;
            }
            state.relocate(group, Location::Popout(PopoutWindow { handle }), effects)?;
            Ok(handle)
        })
    }

    /// Hide every other grid group until [`exit_maximized`](Self::exit_maximized).
    pub fn maximize_group(&mut self, group: GroupId) -> Result<(), DockError> {
        let _span = tracing::debug_span!("dock.maximize_group", group = %group).entered();
        self.transact("maximize_group", |state, effects| {
            let location = state.group(group)?.location;
            let next = location.maximize().map_err(|r| refused(group, r))?;
            let path = state.leaf_path(group)?;
            state.grid.maximize_leaf(&path)?;
            state.relocate(group, next, effects)
        })
    }

    /// Restore the visibility from before the maximize. Returns `false` when
    /// nothing was maximized.
    pub fn exit_maximized(&mut self) -> Result<bool, DockError> {
        let _span = tracing::debug_span!("dock.exit_maximized").entered();
        self.transact("exit_maximized", |state, _effects| {
            Ok(state.grid.exit_maximized()?)
        })
    }

    /// Show or hide a grid group. Returns whether anything changed.
    pub fn set_group_visible(&mut self, group: GroupId, visible: bool) -> Result<bool, DockError> {
        let _span = tracing::debug_span!("dock.set_group_visible", group = %group, visible).entered();
        self.transact("set_group_visible", |state, effects| {
            state.require_in_grid(group, "change visibility")?;
            let path = state.leaf_path(group)?;
            let changed = state.grid.set_leaf_visible(&path, visible)?;
            if changed {
                effects.emit(DockEvent::VisibilityChanged { group, visible });
            }
            Ok(changed)
        })
    }

    pub fn set_group_constraints(
        &mut self,
        group: GroupId,
        constraints: LeafConstraints,
    ) -> Result<(), DockError> {
        let _span = tracing::debug_span!("dock.set_group_constraints", group = %group).entered();
        self.transact("set_group_constraints", |state, effects| {
            constraints.validate()?;
            let entry = state.group_mut(group)?;
            entry.constraints = constraints;
            if entry.location.is_in_grid() {
                let path = state.leaf_path(group)?;
                state.grid.set_leaf_constraints(&path, constraints)?;
            }
            effects.emit(DockEvent::ConstraintsChanged { group });
            Ok(())
        })
    }

    /// Clearing persistence on an empty group removes it.
    pub fn set_group_persistent(&mut self, group: GroupId, persistent: bool) -> Result<(), DockError> {
        let _span =
            tracing::debug_span!("dock.set_group_persistent", group = %group, persistent).entered();
        self.transact("set_group_persistent", |state, effects| {
            state.group_mut(group)?.persistent = persistent;
            state.destroy_if_unused(group, effects)
        })
    }

    /// Resize a grid group through its ancestors, or a floating group's box.
    pub fn resize_group(
        &mut self,
        group: GroupId,
        width: Option<f64>,
        height: Option<f64>,
    ) -> Result<(), DockError> {
        let _span = tracing::debug_span!("dock.resize_group", group = %group).entered();
        self.transact("resize_group", |state, _effects| {
            let location = state.group(group)?.location;
            match location {
                Location::Grid | Location::Maximized => {
                    let path = state.leaf_path(group)?;
                    state.grid.resize_leaf(&path, width, height)?;
                }
                Location::Floating(floating) => {
                    let mut rect = floating.rect;
                    rect.width = width.unwrap_or(rect.width);
                    rect.height = height.unwrap_or(rect.height);
                    let floating = state.floating_box(Some(rect))?;
                    state.group_mut(group)?.location = Location::Floating(floating);
                }
                Location::Popout(_) => {
                    return Err(DockError::InvalidLocation {
                        group,
                        location: location.kind(),
                        operation: "resize",
                    });
                }
            }
            Ok(())
        })
    }

    /// Lay the grid out in a `width` x `height` dock area.
    pub fn layout(&mut self, width: f64, height: f64) {
        let _span = tracing::debug_span!("dock.layout", width, height).entered();
        let before = self.state.geometries();
        self.state.grid.layout(width, height);
        let mut events = Vec::new();
        geometry_events(&before, &self.state.geometries(), &mut events);
        self.events.emit_all(&events);
    }

    /// Remove every group and panel.
    pub fn clear(&mut self) {
        let _span = tracing::debug_span!("dock.clear").entered();
        let before = self.state.geometries();
        let mut events = Vec::new();
        let mut options = self.state.options.clone();
        options.width = self.state.grid.width();
        options.height = self.state.grid.height();
        let old = std::mem::replace(&mut self.state, DockState::new(options));
        for group in old.groups.values() {
            for panel in group.panels() {
                events.push(DockEvent::PanelRemoved {
                    panel: panel.clone(),
                    group: group.id(),
                });
            }
            if let Some(handle) = group.location.window() {
                self.host.close_window(handle);
            }
            events.push(DockEvent::GroupRemoved { group: group.id() });
        }
        if old.active_group.is_some() {
            events.push(DockEvent::ActiveGroupChanged { group: None });
        }
        geometry_events(&before, &self.state.geometries(), &mut events);
        self.events.emit_all(&events);
    }

    #[must_use]
    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.state.groups.get(&id)
    }

    #[must_use]
    pub fn panel(&self, id: &PanelId) -> Option<&Panel> {
        self.state.panels.get(id)
    }

    #[must_use]
    pub fn group_of_panel(&self, id: &PanelId) -> Option<GroupId> {
        self.state.panel_groups.get(id).copied()
    }

    /// Groups in id order.
    pub fn groups(&self) -> impl Iterator<Item = &Group> + '_ {
        self.state.groups.values()
    }

    /// Registered panels in id order.
    pub fn panels(&self) -> impl Iterator<Item = &Panel> + '_ {
        self.state.panels.values()
    }

    #[must_use]
    pub fn active_group(&self) -> Option<GroupId> {
        self.state.active_group
    }

    /// Rectangle of a visible grid group or a floating group.
    #[must_use]
    pub fn group_geometry(&self, id: GroupId) -> Option<Rect> {
        self.state.geometries().get(&id).copied()
    }

    #[must_use]
    pub fn grid(&self) -> &Gridview<GroupId> {
        &self.state.grid
    }

    #[must_use]
    pub fn options(&self) -> &DockOptions {
        &self.state.options
    }

    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }
}

fn geometry_events(
    before: &BTreeMap<GroupId, Rect>,
    after: &BTreeMap<GroupId, Rect>,
    events: &mut Vec<DockEvent>,
) {
    let mut ids: Vec<GroupId> = before.keys().chain(after.keys()).copied().collect();
    ids.sort_unstable();
    ids.dedup();
    for group in ids {
        let (old, new) = (before.get(&group), after.get(&group));
        if old != new {
            events.push(DockEvent::GeometryChanged {
                group,
                rect: new.copied(),
            });
        }
    }
}
