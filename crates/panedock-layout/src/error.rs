//! Layout engine failures.

/// Errors raised by the sizing resolver, splitviews and gridviews.
///
/// Every operation that returns one of these leaves its receiver unchanged.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LayoutError {
    #[error("index {index} out of range for {len} item(s)")]
    InvalidIndex { index: usize, len: usize },
    #[error("invalid constraints: minimum {minimum} exceeds maximum {maximum} or is not a size")]
    InvalidConstraint { minimum: f64, maximum: f64 },
    #[error("{what} not found")]
    NotFound { what: String },
    #[error("node at {path:?} is not a leaf")]
    NotALeaf { path: Vec<usize> },
    #[error("operation requires two distinct leaves")]
    SameNode,
    #[error("malformed grid: {reason}")]
    MalformedGrid { reason: String },
    #[error("id allocation failed: {0}")]
    Id(#[from] panedock_core::IdError),
}

impl LayoutError {
    pub(crate) fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedGrid {
            reason: reason.into(),
        }
    }
}
