#![forbid(unsafe_code)]

//! Layout engine: sizing resolver, splitviews and the grid tree.
//!
//! The three layers build on each other. [`sizing`] holds pure functions
//! that move size between views under min/max constraints. [`Splitview`]
//! owns one axis worth of views and applies a proportional or priority
//! policy on top of the resolver. [`Gridview`] nests splitviews of
//! alternating orientation into an arbitrary 2D arrangement.

pub mod error;
pub mod gridview;
pub mod serial;
pub mod sizing;
pub mod splitview;

pub use error::LayoutError;
pub use gridview::{GridLayout, GridLeaf, GridNode, Gridview, LeafConstraints};
pub use panedock_core::{Direction, NodeId, Orientation, Rect};
pub use serial::{SerializedGrid, SerializedGridNode};
pub use sizing::{
    DeltaBounds, LayoutPriority, ResizeMode, Resolution, SizeConstraints, SizingItem,
};
pub use splitview::{Sizing, Splitview, View};
