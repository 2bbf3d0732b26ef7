#![forbid(unsafe_code)]

//! Docking model for panedock.
//!
//! A [`DockLayout`] arranges tabbed [`Group`]s of panels in a
//! [`Gridview`](panedock_layout::Gridview), floats them over it, hands them to
//! host windows, or maximizes one over the rest. Every operation either
//! commits completely or returns a [`DockError`] and changes nothing; the
//! resulting [`DockEvent`]s are delivered after the commit.
//!
//! ```
//! use panedock_core::Direction;
//! use panedock_dock::{DockLayout, DockOptions, DropTarget, PanelOptions};
//!
//! let mut dock = DockLayout::new(DockOptions {
//!     width: 800.0,
//!     height: 600.0,
//!     ..DockOptions::default()
//! })?;
//! let editor = dock.add_panel(PanelOptions::new("editor", "text"), None)?;
//! let terminal = dock.add_panel(
//!     PanelOptions::new("terminal", "shell"),
//!     Some(DropTarget::panel("editor", Direction::Below).into()),
//! )?;
//! assert_ne!(editor, terminal);
//! assert_eq!(dock.group_geometry(terminal).map(|r| r.y), Some(300.0));
//! # Ok::<(), panedock_dock::DockError>(())
//! ```

pub mod error;
pub mod event;
pub mod group;
pub mod host;
pub mod location;
pub mod model;
pub mod options;
pub mod position;
pub mod serialize;

pub use error::{DockError, DockErrorKind};
pub use event::DockEvent;
pub use group::{Group, Panel, PanelOptions};
pub use host::{InMemoryWindowHost, NoWindowHost, WindowHandle, WindowHost, WindowHostError};
pub use location::{FloatingBox, Location, LocationKind, PopoutWindow, RefusedTransition};
pub use model::DockLayout;
pub use options::{DEFAULT_GROUP_MINIMUM, DockOptions, DockOptionsError};
pub use position::{DropDirection, DropReference, DropTarget, GroupOptions, PanelPosition};
pub use serialize::{
    DOCK_SCHEMA_VERSION, SerializedDock, SerializedFloatingGroup, SerializedGroup,
    SerializedMaximized, SerializedPanel, SerializedPopoutGroup,
};
