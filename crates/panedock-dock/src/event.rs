//! Lifecycle notifications published by a [`DockLayout`](crate::DockLayout).

use panedock_core::{GroupId, PanelId, Rect};

use crate::location::LocationKind;

/// One observable change. Events of an operation are delivered in order,
/// after the operation has committed.
#[derive(Debug, Clone, PartialEq)]
pub enum DockEvent {
    GroupAdded {
        group: GroupId,
    },
    GroupRemoved {
        group: GroupId,
    },
    PanelAdded {
        panel: PanelId,
        group: GroupId,
    },
    PanelRemoved {
        panel: PanelId,
        group: GroupId,
    },
    ActivePanelChanged {
        group: GroupId,
        panel: Option<PanelId>,
    },
    ActiveGroupChanged {
        group: Option<GroupId>,
    },
    VisibilityChanged {
        group: GroupId,
        visible: bool,
    },
    ConstraintsChanged {
        group: GroupId,
    },
    LocationChanged {
        group: GroupId,
        from: LocationKind,
        to: LocationKind,
    },
    /// New rectangle of a group; `None` once it no longer has one in the
    /// dock area (hidden, popped out, or removed).
    GeometryChanged {
        group: GroupId,
        rect: Option<Rect>,
    },
    /// The whole layout was replaced from a document.
    LayoutRestored,
}

impl DockEvent {
    /// Group the event is about, if any.
    #[must_use]
    pub fn group(&self) -> Option<GroupId> {
        match self {
            Self::GroupAdded { group }
            | Self::GroupRemoved { group }
            | Self::PanelAdded { group, .. }
            | Self::PanelRemoved { group, .. }
            | Self::ActivePanelChanged { group, .. }
            | Self::VisibilityChanged { group, .. }
            | Self::ConstraintsChanged { group }
            | Self::LocationChanged { group, .. }
            | Self::GeometryChanged { group, .. } => Some(*group),
            Self::ActiveGroupChanged { group } => *group,
            Self::LayoutRestored => None,
        }
    }
}
