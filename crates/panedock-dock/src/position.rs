//! Drop targets: where a panel or group should land.

use panedock_core::{Direction, GroupId, PanelId, Rect};
use panedock_layout::LeafConstraints;
use serde::{Deserialize, Serialize};

/// What a drop is relative to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DropReference {
    /// The group currently holding this panel.
    Panel(PanelId),
    Group(GroupId),
    /// The edge of the whole grid.
    Root,
}

/// Side of the reference, or `Within` to join its tab list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DropDirection {
    Left,
    Right,
    Above,
    Below,
    Within,
}

impl DropDirection {
    /// The split direction, or `None` for `Within`.
    #[must_use]
    pub const fn split(self) -> Option<Direction> {
        match self {
            Self::Left => Some(Direction::Left),
            Self::Right => Some(Direction::Right),
            Self::Above => Some(Direction::Above),
            Self::Below => Some(Direction::Below),
            Self::Within => None,
        }
    }
}

impl From<Direction> for DropDirection {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Left => Self::Left,
            Direction::Right => Self::Right,
            Direction::Above => Self::Above,
            Direction::Below => Self::Below,
        }
    }
}

/// A decided drop outcome. `index` is the tab position for `Within` drops
/// and is ignored otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropTarget {
    pub reference: DropReference,
    pub direction: DropDirection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
}

impl DropTarget {
    pub fn panel(panel: impl Into<PanelId>, direction: impl Into<DropDirection>) -> Self {
        Self {
            reference: DropReference::Panel(panel.into()),
            direction: direction.into(),
            index: None,
        }
    }

    pub fn group(group: GroupId, direction: impl Into<DropDirection>) -> Self {
        Self {
            reference: DropReference::Group(group),
            direction: direction.into(),
            index: None,
        }
    }

    #[must_use]
    pub fn root(direction: Direction) -> Self {
        Self {
            reference: DropReference::Root,
            direction: direction.into(),
            index: None,
        }
    }

    #[must_use]
    pub fn at_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }
}

/// Where `add_panel` / `add_group` put new content.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelPosition {
    Target(DropTarget),
    /// Float a new group, at the configured default rectangle when `None`.
    Floating(Option<Rect>),
}

impl From<DropTarget> for PanelPosition {
    fn from(target: DropTarget) -> Self {
        Self::Target(target)
    }
}

/// Options of an explicitly created group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupOptions {
    /// Where the group goes; the trailing edge of the grid root when `None`.
    pub position: Option<PanelPosition>,
    /// Keep the group once its last panel is gone.
    pub persistent: bool,
    /// Overrides the layout's default group constraints.
    pub constraints: Option<LeafConstraints>,
}
