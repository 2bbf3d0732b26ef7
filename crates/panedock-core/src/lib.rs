#![forbid(unsafe_code)]

//! Core: geometry, identifiers, and change notification for panedock.
//!
//! # Role in panedock
//! `panedock-core` holds the vocabulary every other crate speaks: real-valued
//! rectangles, split orientations and docking directions, stable ids for grid
//! nodes, groups and panels, and the listener registry used to publish
//! lifecycle events to a rendering layer.
//!
//! Nothing in here knows about splitviews or groups. The layout engine lives in
//! `panedock-layout` and the docking model in `panedock-dock`.

pub mod event;
pub mod geometry;
pub mod id;
pub mod logging;

pub use event::{EventEmitter, Subscription};
pub use geometry::{Direction, Orientation, Rect};
pub use id::{GroupId, IdAllocator, IdError, NodeId, PanelId};
