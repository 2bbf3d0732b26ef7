//! Wire form of a grid.
//!
//! Nodes are written depth-first as `{"type": "branch" | "leaf", "data",
//! "size", "visible"}`. Branch orientation is implied by depth: the root's
//! orientation is stored once and every level below alternates. Node ids are
//! not part of the wire form; they are reassigned on load.

use panedock_core::Orientation;
use serde::{Deserialize, Serialize};

/// Serde helpers for sizes whose unbounded value is `+inf`.
///
/// `+inf` is written as `null` (or skipped with
/// `skip_serializing_if = "unbounded::is_infinite"`), and a missing or `null`
/// field reads back as `+inf`.
pub mod unbounded {
    use serde::{Deserialize, Deserializer, Serializer};

    #[must_use]
    pub fn infinite() -> f64 {
        f64::INFINITY
    }

    #[must_use]
    pub fn is_infinite(value: &f64) -> bool {
        *value == f64::INFINITY
    }

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if is_infinite(value) {
            serializer.serialize_none()
        } else {
            serializer.serialize_some(value)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
    }
}

fn visible_by_default() -> bool {
    true
}

fn is_true(value: &bool) -> bool {
    *value
}

/// One serialized grid node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SerializedGridNode<T> {
    Branch {
        data: Vec<SerializedGridNode<T>>,
        size: f64,
        #[serde(default = "visible_by_default", skip_serializing_if = "is_true")]
        visible: bool,
    },
    Leaf {
        data: T,
        size: f64,
        #[serde(default = "visible_by_default", skip_serializing_if = "is_true")]
        visible: bool,
    },
}

impl<T> SerializedGridNode<T> {
    /// Size along the parent's axis.
    #[must_use]
    pub fn size(&self) -> f64 {
        match self {
            Self::Branch { size, .. } | Self::Leaf { size, .. } => *size,
        }
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        match self {
            Self::Branch { visible, .. } | Self::Leaf { visible, .. } => *visible,
        }
    }

    /// Leaf payloads in depth-first order.
    #[must_use]
    pub fn leaves(&self) -> Vec<&T> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                Self::Leaf { data, .. } => out.push(data),
                Self::Branch { data, .. } => stack.extend(data.iter().rev()),
            }
        }
        out
    }

    /// Number of levels, counting this node.
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Self::Leaf { .. } => 1,
            Self::Branch { data, .. } => 1 + data.iter().map(Self::depth).max().unwrap_or(0),
        }
    }
}

/// A whole serialized grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedGrid<T> {
    pub root: SerializedGridNode<T>,
    pub width: f64,
    pub height: f64,
    pub orientation: Orientation,
}
