#![forbid(unsafe_code)]

//! Panedock public facade crate.
//!
//! Re-exports the docking model, the grid and splitview engine, and the shared
//! geometry types behind one dependency, plus a prelude for everyday use.

// --- Core re-exports -------------------------------------------------------

pub use panedock_core::{
    Direction, EventEmitter, GroupId, IdAllocator, IdError, NodeId, Orientation, PanelId, Rect,
    Subscription,
};

#[cfg(feature = "tracing-json")]
pub use panedock_core::logging::{LoggingInitError, init_logging};

// --- Layout re-exports -----------------------------------------------------

pub use panedock_layout::{
    GridLayout, GridLeaf, GridNode, Gridview, LayoutError, LayoutPriority, LeafConstraints,
    SerializedGrid, SerializedGridNode, SizeConstraints, Sizing, Splitview, View,
};

// --- Dock re-exports -------------------------------------------------------

pub use panedock_dock::{
    DOCK_SCHEMA_VERSION, DockError, DockErrorKind, DockEvent, DockLayout, DockOptions,
    DockOptionsError, DropDirection, DropReference, DropTarget, FloatingBox, Group, GroupOptions,
    InMemoryWindowHost, Location, LocationKind, NoWindowHost, Panel, PanelOptions, PanelPosition,
    PopoutWindow, SerializedDock, WindowHandle, WindowHost, WindowHostError,
};

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Direction, DockError, DockErrorKind, DockEvent, DockLayout, DockOptions, DropTarget,
        GroupId, GroupOptions, Location, PanelId, PanelOptions, PanelPosition, Rect, WindowHost,
    };

    pub use crate::{core, dock, layout};
}

pub use panedock_core as core;
pub use panedock_dock as dock;
pub use panedock_layout as layout;
