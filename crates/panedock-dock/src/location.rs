//! Where a group lives and how it may move.
//!
//! A group is either embedded in the grid, floating over it, popped out into a
//! host window, or maximized over its grid siblings. Transitions are pure:
//! each returns the next [`Location`] or the kinds involved in a refused move,
//! and the docking model performs the matching grid surgery.
//!
//! ```text
//!            float                 popout
//!   Grid  ---------->  Floating  --------->  Popout
//!    ^  <----------            <---------      |
//!    |      dock                  float        |
//!    |  <--------------------------------------+
//!    |                  dock
//!    |  maximize / exit_maximized
//!    v
//! Maximized
//! ```

use std::fmt;

use panedock_core::Rect;
use serde::{Deserialize, Serialize};

use crate::host::WindowHandle;

/// Discriminant of a [`Location`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationKind {
    Grid,
    Floating,
    Popout,
    Maximized,
}

impl fmt::Display for LocationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Grid => "in the grid",
            Self::Floating => "floating",
            Self::Popout => "popped out",
            Self::Maximized => "maximized",
        };
        f.write_str(name)
    }
}

/// Rectangle of a floating group, in the coordinates of the dock area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FloatingBox {
    pub rect: Rect,
}

impl FloatingBox {
    /// Accepts only finite rectangles with a positive size.
    #[must_use]
    pub fn new(rect: Rect) -> Option<Self> {
        rect.is_finite_positive().then_some(Self { rect })
    }
}

/// A group rendered in a host window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PopoutWindow {
    pub handle: WindowHandle,
}

/// Location state of a group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Location {
    Grid,
    Floating(FloatingBox),
    Popout(PopoutWindow),
    Maximized,
}

/// A transition the current location does not allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefusedTransition {
    pub from: LocationKind,
    pub operation: &'static str,
}

impl Location {
    #[must_use]
    pub const fn kind(&self) -> LocationKind {
        match self {
            Self::Grid => LocationKind::Grid,
            Self::Floating(_) => LocationKind::Floating,
            Self::Popout(_) => LocationKind::Popout,
            Self::Maximized => LocationKind::Maximized,
        }
    }

    /// Whether the group occupies a grid leaf.
    #[must_use]
    pub const fn is_in_grid(&self) -> bool {
        matches!(self, Self::Grid | Self::Maximized)
    }

    fn refuse(&self, operation: &'static str) -> RefusedTransition {
        RefusedTransition {
            from: self.kind(),
            operation,
        }
    }

    /// Grid or popout to floating.
    pub fn float(&self, floating: FloatingBox) -> Result<Self, RefusedTransition> {
        match self {
            Self::Grid | Self::Popout(_) => Ok(Self::Floating(floating)),
            Self::Floating(_) | Self::Maximized => Err(self.refuse("float")),
        }
    }

    /// Grid or floating to a host window.
    pub fn popout(&self, window: PopoutWindow) -> Result<Self, RefusedTransition> {
        match self {
            Self::Grid | Self::Floating(_) => Ok(Self::Popout(window)),
            Self::Popout(_) | Self::Maximized => Err(self.refuse("pop out")),
        }
    }

    /// Floating or popout back into the grid.
    pub fn dock(&self) -> Result<Self, RefusedTransition> {
        match self {
            Self::Floating(_) | Self::Popout(_) => Ok(Self::Grid),
            Self::Grid | Self::Maximized => Err(self.refuse("dock")),
        }
    }

    pub fn maximize(&self) -> Result<Self, RefusedTransition> {
        match self {
            Self::Grid => Ok(Self::Maximized),
            _ => Err(self.refuse("maximize")),
        }
    }

    pub fn exit_maximized(&self) -> Result<Self, RefusedTransition> {
        match self {
            Self::Maximized => Ok(Self::Grid),
            _ => Err(self.refuse("exit maximized")),
        }
    }

    /// Rectangle of a floating group.
    #[must_use]
    pub fn floating_rect(&self) -> Option<Rect> {
        match self {
            Self::Floating(floating) => Some(floating.rect),
            _ => None,
        }
    }

    /// Handle of a popped-out group.
    #[must_use]
    pub fn window(&self) -> Option<WindowHandle> {
        match self {
            Self::Popout(window) => Some(window.handle),
            _ => None,
        }
    }
}
