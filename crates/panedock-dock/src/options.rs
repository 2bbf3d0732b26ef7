//! Construction-time settings of a [`DockLayout`](crate::DockLayout).
//!
//! Options are plain data and can be loaded from JSON, or from TOML with the
//! `toml` feature:
//!
//! ```toml
//! orientation = "vertical"
//! proportionalLayout = false
//! width = 1280.0
//! height = 800.0
//!
//! [groupConstraints.width]
//! minimum = 120.0
//!
//! [floatingDefault]
//! x = 40.0
//! y = 40.0
//! width = 480.0
//! height = 320.0
//! ```

#[cfg(feature = "toml")]
use std::path::Path;

use panedock_core::{Orientation, Rect};
use panedock_layout::{LeafConstraints, SizeConstraints};
use serde::{Deserialize, Serialize};

use crate::error::DockError;

/// Minimum width and height of a group unless configured otherwise.
pub const DEFAULT_GROUP_MINIMUM: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DockOptions {
    /// Orientation of the grid root.
    pub orientation: Orientation,
    /// Rescale every view on container resize instead of letting the
    /// highest-priority view absorb the change.
    pub proportional_layout: bool,
    /// Initial size of the dock area. Zero means "not laid out yet".
    pub width: f64,
    pub height: f64,
    /// Constraints given to new groups.
    pub group_constraints: LeafConstraints,
    /// Rectangle used when a group is floated without an explicit one.
    pub floating_default: Rect,
}

impl Default for DockOptions {
    fn default() -> Self {
        let minimum = SizeConstraints {
            minimum: DEFAULT_GROUP_MINIMUM,
            maximum: f64::INFINITY,
        };
        Self {
            orientation: Orientation::Horizontal,
            proportional_layout: true,
            width: 0.0,
            height: 0.0,
            group_constraints: LeafConstraints::new(minimum, minimum),
            floating_default: Rect::new(100.0, 100.0, 400.0, 300.0),
        }
    }
}

/// Failure to load options from a document.
#[derive(Debug, thiserror::Error)]
pub enum DockOptionsError {
    #[error("could not read options: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "toml")]
    #[error("invalid TOML options: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid JSON options: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] DockError),
}

impl DockOptions {
    /// Check constraints, the initial size and the floating default.
    pub fn validate(&self) -> Result<(), DockError> {
        self.group_constraints.validate()?;
        for extent in [self.width, self.height] {
            if !extent.is_finite() || extent < 0.0 {
                return Err(DockError::malformed(format!(
                    "dock area extent {extent} must be finite and non-negative"
                )));
            }
        }
        if !self.floating_default.is_finite_positive() {
            return Err(DockError::malformed(format!(
                "floating default {:?} must be finite with a positive size",
                self.floating_default
            )));
        }
        Ok(())
    }

    pub fn from_json_str(raw: &str) -> Result<Self, DockOptionsError> {
        let options: Self = serde_json::from_str(raw)?;
        options.validate()?;
        Ok(options)
    }

    #[cfg(feature = "toml")]
    pub fn from_toml_str(raw: &str) -> Result<Self, DockOptionsError> {
        let options: Self = toml::from_str(raw)?;
        options.validate()?;
        Ok(options)
    }

    #[cfg(feature = "toml")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, DockOptionsError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DockErrorKind;

    #[test]
    fn defaults_are_valid() {
        let options = DockOptions::default();
        options.validate().unwrap();
        assert!(options.proportional_layout);
        assert_eq!(options.group_constraints.width.minimum, DEFAULT_GROUP_MINIMUM);
        assert_eq!(options.group_constraints.height.maximum, f64::INFINITY);
    }

    #[test]
    fn json_fills_missing_fields_with_defaults() {
        let options =
            DockOptions::from_json_str(r#"{"orientation":"vertical","width":800}"#).unwrap();
        assert_eq!(options.orientation, Orientation::Vertical);
        assert_eq!(options.width, 800.0);
        assert_eq!(options.height, 0.0);
        assert_eq!(options.floating_default, DockOptions::default().floating_default);
    }

    #[test]
    fn inverted_group_constraints_are_rejected() {
        let raw = r#"{"groupConstraints":{"width":{"minimum":300,"maximum":100},
            "height":{"minimum":0}}}"#;
        match DockOptions::from_json_str(raw) {
            Err(DockOptionsError::Invalid(err)) => {
                assert_eq!(err.kind(), DockErrorKind::InvalidConstraint);
            }
            other => panic!("expected invalid constraint, got {other:?}"),
        }
    }

    #[test]
    fn degenerate_floating_default_is_rejected() {
        let options = DockOptions {
            floating_default: Rect::new(0.0, 0.0, 0.0, 100.0),
            ..DockOptions::default()
        };
        assert_eq!(
            options.validate().unwrap_err().kind(),
            DockErrorKind::MalformedLayout
        );
    }

    #[cfg(feature = "toml")]
    #[test]
    fn toml_options_parse() {
        let raw = r#"
orientation = "vertical"
proportionalLayout = false
width = 1280.0
height = 800.0

[groupConstraints.width]
minimum = 120.0

[groupConstraints.height]
minimum = 80.0

[floatingDefault]
x = 40.0
y = 40.0
width = 480.0
height = 320.0
"#;
        let options = DockOptions::from_toml_str(raw).unwrap();
        assert_eq!(options.orientation, Orientation::Vertical);
        assert!(!options.proportional_layout);
        assert_eq!(options.group_constraints.width.minimum, 120.0);
        assert_eq!(options.group_constraints.width.maximum, f64::INFINITY);
        assert_eq!(options.floating_default.width, 480.0);
    }
}
