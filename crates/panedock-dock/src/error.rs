//! Errors of the docking model.

use std::fmt;

use panedock_core::{GroupId, IdError, PanelId};
use panedock_layout::LayoutError;

use crate::location::LocationKind;

/// Coarse classification of a [`DockError`], stable across message changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DockErrorKind {
    InvalidIndex,
    InvalidConstraint,
    NotFound,
    InvalidLocation,
    MalformedLayout,
    DetachFailed,
    DuplicatePanel,
}

impl fmt::Display for DockErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InvalidIndex => "invalid_index",
            Self::InvalidConstraint => "invalid_constraint",
            Self::NotFound => "not_found",
            Self::InvalidLocation => "invalid_location",
            Self::MalformedLayout => "malformed_layout",
            Self::DetachFailed => "detach_failed",
            Self::DuplicatePanel => "duplicate_panel",
        };
        f.write_str(name)
    }
}

/// Failure of a docking operation. The layout is unchanged whenever one of
/// these is returned.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DockError {
    #[error("index {index} out of range for length {len}")]
    InvalidIndex { index: usize, len: usize },
    #[error("invalid constraint: minimum {minimum} > maximum {maximum}")]
    InvalidConstraint { minimum: f64, maximum: f64 },
    #[error("not found: {what}")]
    NotFound { what: String },
    #[error("group {group} cannot {operation} while {location}")]
    InvalidLocation {
        group: GroupId,
        location: LocationKind,
        operation: &'static str,
    },
    #[error("malformed layout: {reason}")]
    MalformedLayout { reason: String },
    #[error("could not detach group {group}: {reason}")]
    DetachFailed { group: GroupId, reason: String },
    #[error("panel {panel} already exists")]
    DuplicatePanel { panel: PanelId },
}

impl DockError {
    #[must_use]
    pub const fn kind(&self) -> DockErrorKind {
        match self {
            Self::InvalidIndex { .. } => DockErrorKind::InvalidIndex,
            Self::InvalidConstraint { .. } => DockErrorKind::InvalidConstraint,
            Self::NotFound { .. } => DockErrorKind::NotFound,
            Self::InvalidLocation { .. } => DockErrorKind::InvalidLocation,
            Self::MalformedLayout { .. } => DockErrorKind::MalformedLayout,
            Self::DetachFailed { .. } => DockErrorKind::DetachFailed,
            Self::DuplicatePanel { .. } => DockErrorKind::DuplicatePanel,
        }
    }

    pub(crate) fn group_not_found(group: GroupId) -> Self {
        Self::NotFound {
            what: format!("group {group}"),
        }
    }

    pub(crate) fn panel_not_found(panel: &PanelId) -> Self {
        Self::NotFound {
            what: format!("panel {panel}"),
        }
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedLayout {
            reason: reason.into(),
        }
    }
}

impl From<LayoutError> for DockError {
    fn from(err: LayoutError) -> Self {
        match err {
            LayoutError::InvalidIndex { index, len } => Self::InvalidIndex { index, len },
            LayoutError::InvalidConstraint { minimum, maximum } => {
                Self::InvalidConstraint { minimum, maximum }
            }
            LayoutError::NotFound { what } => Self::NotFound { what },
            LayoutError::NotALeaf { path } => Self::NotFound {
                what: format!("leaf at {path:?}"),
            },
            LayoutError::SameNode => Self::malformed("a node cannot be moved relative to itself"),
            LayoutError::MalformedGrid { reason } => Self::MalformedLayout { reason },
            LayoutError::Id(err) => Self::from(err),
        }
    }
}

impl From<IdError> for DockError {
    fn from(err: IdError) -> Self {
        Self::malformed(err.to_string())
    }
}
