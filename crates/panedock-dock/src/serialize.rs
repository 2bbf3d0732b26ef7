//! Layout documents: the persisted form of a [`DockLayout`].
//!
//! A document carries the grid in its wire form with one [`SerializedGroup`]
//! per leaf, the panel registry, and the detached groups listed separately.
//! Node ids are not persisted. Group ids are, so a restored layout keeps
//! addressing its groups the same way.
//!
//! ```json
//! {
//!   "schemaVersion": 1,
//!   "grid": {
//!     "root": {"type": "branch", "size": 600, "data": [
//!       {"type": "leaf", "size": 1000,
//!        "data": {"id": 1, "views": ["editor"], "activeView": "editor"}}
//!     ]},
//!     "width": 1000, "height": 600, "orientation": "horizontal"
//!   },
//!   "panels": {"editor": {"component": "text"}},
//!   "activeGroup": 1
//! }
//! ```
//!
//! Loading validates the whole document before touching the layout. Any
//! problem is reported as `MalformedLayout` and leaves the layout as it was.

use std::collections::{BTreeMap, BTreeSet};

use panedock_core::{GroupId, IdAllocator, Orientation, PanelId, Rect};
use panedock_layout::{
    GridLeaf, Gridview, LayoutError, LeafConstraints, SerializedGrid, SerializedGridNode,
};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::DockError;
use crate::event::DockEvent;
use crate::group::{Group, Panel};
use crate::host::{WindowHandle, WindowHost};
use crate::location::{FloatingBox, Location, PopoutWindow};
use crate::model::{DockLayout, DockState};
use crate::options::DockOptions;

/// Current layout document version.
pub const DOCK_SCHEMA_VERSION: u16 = 1;

fn default_schema_version() -> u16 {
    DOCK_SCHEMA_VERSION
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn is_unconstrained(value: &LeafConstraints) -> bool {
    *value == LeafConstraints::default()
}

/// One group: its tab list, active tab and leaf constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedGroup {
    pub id: GroupId,
    pub views: Vec<PanelId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_view: Option<PanelId>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub persistent: bool,
    #[serde(default, skip_serializing_if = "is_unconstrained")]
    pub constraints: LeafConstraints,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedPanel {
    pub component: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub params: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedFloatingGroup {
    pub group: SerializedGroup,
    pub rect: Rect,
}

/// A popped-out group. The handle is the one it had when saved; restoring
/// asks the host for a fresh window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedPopoutGroup {
    pub group: SerializedGroup,
    pub window: WindowHandle,
}

/// The maximized group and the grid groups that were hidden before it was
/// maximized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedMaximized {
    pub group: GroupId,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hidden: Vec<GroupId>,
}

/// A whole layout document.
///
/// The grid is stored with the visibility it had before any maximize, so a
/// loader that ignores `maximized` still gets a sensible layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedDock {
    #[serde(default = "default_schema_version")]
    pub schema_version: u16,
    pub grid: SerializedGrid<SerializedGroup>,
    #[serde(default)]
    pub panels: BTreeMap<PanelId, SerializedPanel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_group: Option<GroupId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub floating_groups: Vec<SerializedFloatingGroup>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub popout_groups: Vec<SerializedPopoutGroup>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximized: Option<SerializedMaximized>,
}

fn malformed(err: LayoutError) -> DockError {
    DockError::malformed(err.to_string())
}

fn serialized_group(group: &Group) -> SerializedGroup {
    SerializedGroup {
        id: group.id(),
        views: group.panels().to_vec(),
        active_view: group.active_panel().cloned(),
        persistent: group.is_persistent(),
        constraints: group.constraints(),
    }
}

fn map_node(
    node: SerializedGridNode<GroupId>,
    groups: &BTreeMap<GroupId, Group>,
) -> Result<SerializedGridNode<SerializedGroup>, DockError> {
    Ok(match node {
        SerializedGridNode::Branch {
            data,
            size,
            visible,
        } => SerializedGridNode::Branch {
            data: data
                .into_iter()
                .map(|child| map_node(child, groups))
                .collect::<Result<_, _>>()?,
            size,
            visible,
        },
        SerializedGridNode::Leaf {
            data,
            size,
            visible,
        } => {
            let group = groups
                .get(&data)
                .ok_or_else(|| DockError::group_not_found(data))?;
            SerializedGridNode::Leaf {
                data: serialized_group(group),
                size,
                visible,
            }
        }
    })
}

impl DockState {
    fn to_document(&self) -> Result<SerializedDock, DockError> {
        let mut grid = self.grid.clone();
        let maximized = match grid.maximized_leaf() {
            Some(leaf) => {
                let group_of = |id| grid.leaf(id).map(|leaf| leaf.data);
                let group = group_of(leaf).ok_or_else(|| {
                    DockError::malformed(format!("maximized node {leaf} is not a leaf"))
                })?;
                let hidden = grid
                    .hidden_before_maximize()
                    .into_iter()
                    .filter_map(group_of)
                    .collect();
                Some(SerializedMaximized { group, hidden })
            }
            None => None,
        };
        let _ = grid.exit_maximized()?;

        let wire = grid.serialize();
        let grid = SerializedGrid {
            root: map_node(wire.root, &self.groups)?,
            width: wire.width,
            height: wire.height,
            orientation: wire.orientation,
        };

        let mut floating_groups = Vec::new();
        let mut popout_groups = Vec::new();
        for group in self.groups.values() {
            match group.location {
                Location::Floating(floating) => floating_groups.push(SerializedFloatingGroup {
                    group: serialized_group(group),
                    rect: floating.rect,
                }),
                Location::Popout(window) => popout_groups.push(SerializedPopoutGroup {
                    group: serialized_group(group),
                    window: window.handle,
                }),
                Location::Grid | Location::Maximized => {}
            }
        }

        let panels = self
            .panels
            .values()
            .map(|panel| {
                (
                    panel.id.clone(),
                    SerializedPanel {
                        component: panel.component.clone(),
                        title: panel.title.clone(),
                        params: panel.params.clone(),
                    },
                )
            })
            .collect();

        Ok(SerializedDock {
            schema_version: DOCK_SCHEMA_VERSION,
            grid,
            panels,
            active_group: self.active_group,
            floating_groups,
            popout_groups,
            maximized,
        })
    }
}

/// Checks shared by every group of a document, wherever it lives.
struct GroupCollector<'a> {
    registry: &'a BTreeMap<PanelId, SerializedPanel>,
    groups: BTreeMap<GroupId, Group>,
    panel_groups: FxHashMap<PanelId, GroupId>,
}

impl<'a> GroupCollector<'a> {
    fn new(registry: &'a BTreeMap<PanelId, SerializedPanel>) -> Self {
        Self {
            registry,
            groups: BTreeMap::new(),
            panel_groups: FxHashMap::default(),
        }
    }

    fn add(&mut self, group: &SerializedGroup, location: Location) -> Result<(), DockError> {
        if group.id.get() == 0 {
            return Err(DockError::malformed("group id 0 is reserved"));
        }
        if self.groups.contains_key(&group.id) {
            return Err(DockError::malformed(format!(
                "group {} appears more than once",
                group.id
            )));
        }
        group.constraints.validate().map_err(malformed)?;
        for panel in &group.views {
            if !self.registry.contains_key(panel) {
                return Err(DockError::malformed(format!(
                    "group {} references unknown panel {panel}",
                    group.id
                )));
            }
            if let Some(other) = self.panel_groups.insert(panel.clone(), group.id) {
                return Err(DockError::malformed(format!(
                    "panel {panel} appears in groups {other} and {}",
                    group.id
                )));
            }
        }
        let restored = Group::restore(
            group.id,
            group.views.clone(),
            group.active_view.clone(),
            location,
            group.constraints,
            group.persistent,
        )?;
        let _ = self.groups.insert(group.id, restored);
        Ok(())
    }
}

/// Reject visible leaves without room in a laid-out document. A zero size is
/// accepted only where the leaf's own minimum allows it.
fn check_leaf_sizes(
    node: &SerializedGridNode<SerializedGroup>,
    axis: Orientation,
) -> Result<(), DockError> {
    match node {
        SerializedGridNode::Branch { data, .. } => {
            for child in data {
                check_leaf_sizes(child, axis.orthogonal())?;
            }
        }
        SerializedGridNode::Leaf {
            data,
            size,
            visible,
        } => {
            if *visible && *size <= 0.0 && data.constraints.along(axis).minimum > 0.0 {
                return Err(DockError::malformed(format!(
                    "visible group {} has no size",
                    data.id
                )));
            }
        }
    }
    Ok(())
}

impl DockState {
    /// Build a state from a document. Popout groups keep the saved handle
    /// until the caller opens real windows for them.
    fn from_document(options: &DockOptions, doc: &SerializedDock) -> Result<Self, DockError> {
        if doc.schema_version != DOCK_SCHEMA_VERSION {
            return Err(DockError::malformed(format!(
                "unsupported layout version {} (expected {DOCK_SCHEMA_VERSION})",
                doc.schema_version
            )));
        }

        let mut collector = GroupCollector::new(&doc.panels);
        for group in doc.grid.root.leaves() {
            collector.add(group, Location::Grid)?;
        }
        for floating in &doc.floating_groups {
            let rect = FloatingBox::new(floating.rect).ok_or_else(|| {
                DockError::malformed(format!(
                    "floating group {} has a degenerate rectangle {:?}",
                    floating.group.id, floating.rect
                ))
            })?;
            collector.add(&floating.group, Location::Floating(rect))?;
        }
        for popout in &doc.popout_groups {
            let window = PopoutWindow {
                handle: popout.window,
            };
            collector.add(&popout.group, Location::Popout(window))?;
        }
        if let Some(orphan) = doc
            .panels
            .keys()
            .find(|panel| !collector.panel_groups.contains_key(*panel))
        {
            return Err(DockError::malformed(format!(
                "panel {orphan} belongs to no group"
            )));
        }

        let SerializedGridNode::Branch { data: children, .. } = &doc.grid.root else {
            return Err(DockError::malformed("grid root must be a branch"));
        };
        if doc.grid.width > 0.0 && doc.grid.height > 0.0 {
            for child in children {
                check_leaf_sizes(child, doc.grid.orientation)?;
            }
        }
        let mut grid = Gridview::deserialize_with(&doc.grid, options.proportional_layout, |group| {
            Ok(GridLeaf::new(group.id).with_constraints(group.constraints))
        })
        .map_err(malformed)?;

        let GroupCollector {
            mut groups,
            panel_groups,
            ..
        } = collector;

        if let Some(maximized) = &doc.maximized {
            let leaf = grid.find_leaf(&maximized.group).ok_or_else(|| {
                DockError::malformed(format!(
                    "maximized group {} is not in the grid",
                    maximized.group
                ))
            })?;
            let path = grid.locate(leaf).map_err(malformed)?;
            grid.maximize_leaf(&path).map_err(malformed)?;
            let hidden: BTreeSet<GroupId> = grid
                .hidden_before_maximize()
                .into_iter()
                .filter_map(|id| grid.leaf(id).map(|leaf| leaf.data))
                .collect();
            if hidden != maximized.hidden.iter().copied().collect() {
                return Err(DockError::malformed(
                    "maximized hidden set disagrees with the grid",
                ));
            }
            if let Some(group) = groups.get_mut(&maximized.group) {
                group.location = Location::Maximized;
            }
        }

        if let Some(active) = doc.active_group
            && !groups.contains_key(&active)
        {
            return Err(DockError::malformed(format!(
                "active group {active} does not exist"
            )));
        }

        let mut ids = IdAllocator::default();
        if let Some(last) = groups.keys().next_back() {
            ids.reserve(last.get());
        }
        let panels = doc
            .panels
            .iter()
            .map(|(id, panel)| {
                (
                    id.clone(),
                    Panel {
                        id: id.clone(),
                        component: panel.component.clone(),
                        title: panel.title.clone(),
                        params: panel.params.clone(),
                    },
                )
            })
            .collect();

        let mut options = options.clone();
        options.orientation = doc.grid.orientation;
        options.width = grid.width();
        options.height = grid.height();

        let state = Self {
            options,
            grid,
            groups,
            panels,
            panel_groups,
            ids,
            active_group: doc.active_group,
            restore_points: BTreeMap::new(),
        };
        state.validate()?;
        Ok(state)
    }
}

impl<H: WindowHost> DockLayout<H> {
    /// The layout as a document.
    pub fn to_json(&self) -> Result<SerializedDock, DockError> {
        let _span = tracing::debug_span!("dock.to_json").entered();
        self.state.to_document()
    }

    pub fn to_json_string(&self) -> Result<String, DockError> {
        let doc = self.to_json()?;
        serde_json::to_string(&doc).map_err(|err| DockError::malformed(err.to_string()))
    }

    /// Replace the whole layout with a document.
    ///
    /// Popped-out groups get new windows from the host; windows of the
    /// replaced layout are closed. On any failure the layout and the host are
    /// left as they were.
    pub fn from_json(&mut self, doc: &SerializedDock) -> Result<(), DockError> {
        let _span = tracing::debug_span!(
            "dock.from_json",
            groups = doc.grid.root.leaves().len() + doc.floating_groups.len() + doc.popout_groups.len(),
            panels = doc.panels.len()
        )
        .entered();
        let result = self.transact("from_json", |state, effects| {
            let mut restored = DockState::from_document(&state.options, doc)?;
            for group in state.groups.values() {
                if let Some(handle) = group.location.window() {
                    effects.close_window(handle);
                }
            }
            for popout in &doc.popout_groups {
                let id = popout.group.id;
                let handle = effects.open_window(id)?;
                if let Some(group) = restored.groups.get_mut(&id) {
                    group.location = Location::Popout(PopoutWindow { handle });
                }
            }
            *state = restored;
            effects.emit(DockEvent::LayoutRestored);
            Ok(())
        });
        if let Err(err) = &result {
            tracing::warn!(target: "panedock.dock", error = %err, "layout document rejected");
        }
        result
    }

    pub fn from_json_str(&mut self, raw: &str) -> Result<(), DockError> {
        let doc: SerializedDock = serde_json::from_str(raw).map_err(|err| {
            tracing::warn!(target: "panedock.dock", error = %err, "layout document unparseable");
            DockError::malformed(err.to_string())
        })?;
        self.from_json(&doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DockErrorKind;
    use crate::group::PanelOptions;
    use crate::position::{DropDirection, DropTarget, PanelPosition};
    use panedock_core::Direction;

    fn sample() -> DockLayout {
        let mut dock = DockLayout::new(DockOptions {
            width: 800.0,
            height: 600.0,
            ..DockOptions::default()
        })
        .unwrap();
        let g = dock
            .add_panel(PanelOptions::new("a", "text").with_title("A"), None)
            .unwrap();
        dock.add_panel(
            PanelOptions::new("b", "text"),
            Some(DropTarget::group(g, DropDirection::Within).into()),
        )
        .unwrap();
        dock.add_panel(
            PanelOptions::new("c", "chart").with_params(serde_json::json!({"series": 3})),
            Some(DropTarget::panel("a", Direction::Below).into()),
        )
        .unwrap();
        dock
    }

    #[test]
    fn document_shape_is_camel_case() {
        let dock = sample();
        let json: serde_json::Value =
            serde_json::from_str(&dock.to_json_string().unwrap()).unwrap();
        assert_eq!(json["schemaVersion"], 1);
        // Splitting below the only group turns the root vertical.
        assert_eq!(json["grid"]["orientation"], "vertical");
        assert_eq!(json["grid"]["root"]["type"], "branch");
        assert_eq!(json["panels"]["a"]["title"], "A");
        assert_eq!(json["panels"]["c"]["params"]["series"], 3);
        assert!(json.get("floatingGroups").is_none());
        assert!(json.get("maximized").is_none());
    }

    #[test]
    fn unknown_version_is_rejected() {
        let mut dock = sample();
        let mut doc = dock.to_json().unwrap();
        doc.schema_version = 9;
        let before = dock.to_json().unwrap();
        let err = dock.from_json(&doc).unwrap_err();
        assert_eq!(err.kind(), DockErrorKind::MalformedLayout);
        assert_eq!(dock.to_json().unwrap(), before);
    }

    #[test]
    fn orphan_registry_panels_are_rejected() {
        let mut dock = sample();
        let mut doc = dock.to_json().unwrap();
        let _ = doc.panels.insert(
            PanelId::from("ghost"),
            SerializedPanel {
                component: "text".into(),
                title: None,
                params: serde_json::Value::Null,
            },
        );
        assert_eq!(
            dock.from_json(&doc).unwrap_err().kind(),
            DockErrorKind::MalformedLayout
        );
    }

    #[test]
    fn floating_groups_keep_their_rectangle() {
        let mut dock = sample();
        let g = dock
            .add_panel(
                PanelOptions::new("f", "text"),
                Some(PanelPosition::Floating(Some(Rect::new(10.0, 20.0, 300.0, 200.0)))),
            )
            .unwrap();
        let doc = dock.to_json().unwrap();
        assert_eq!(doc.floating_groups.len(), 1);

        let mut restored = DockLayout::new(DockOptions::default()).unwrap();
        restored.from_json(&doc).unwrap();
        assert_eq!(
            restored.group_geometry(g),
            Some(Rect::new(10.0, 20.0, 300.0, 200.0))
        );
        assert_eq!(restored.to_json().unwrap().floating_groups, doc.floating_groups);
    }

    #[test]
    fn floating_rectangles_survive_the_string_form_bit_for_bit() {
        let mut dock = sample();
        let rect = Rect::new(180.55323492160701, 0.1 + 0.2, 333.333_333_333_333_3, 1.0 / 3.0);
        let g = dock
            .add_panel(PanelOptions::new("f", "text"), Some(PanelPosition::Floating(Some(rect))))
            .unwrap();
        let raw = dock.to_json_string().unwrap();

        let mut restored = DockLayout::new(DockOptions::default()).unwrap();
        restored.from_json_str(&raw).unwrap();
        let back = restored.group_geometry(g).unwrap();
        assert_eq!(back.x.to_bits(), rect.x.to_bits());
        assert_eq!(back.y.to_bits(), rect.y.to_bits());
        assert_eq!(back.width.to_bits(), rect.width.to_bits());
        assert_eq!(back.height.to_bits(), rect.height.to_bits());
        assert_eq!(restored.to_json_string().unwrap(), raw);
    }

    #[test]
    fn degenerate_floating_rect_is_rejected() {
        let mut dock = sample();
        dock.add_panel(PanelOptions::new("f", "text"), Some(PanelPosition::Floating(None)))
            .unwrap();
        let mut doc = dock.to_json().unwrap();
        doc.floating_groups[0].rect.width = 0.0;
        assert_eq!(
            dock.from_json(&doc).unwrap_err().kind(),
            DockErrorKind::MalformedLayout
        );
    }

    #[test]
    fn restored_ids_do_not_collide_with_new_groups() {
        let dock = sample();
        let doc = dock.to_json().unwrap();
        let mut restored = DockLayout::new(DockOptions::default()).unwrap();
        restored.from_json(&doc).unwrap();
        let fresh = restored
            .add_panel(PanelOptions::new("d", "text"), None)
            .unwrap();
        assert!(dock.groups().all(|g| g.id() != fresh));
    }
}
