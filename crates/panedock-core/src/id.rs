//! Stable identifiers.
//!
//! Grid nodes and groups get non-zero numeric ids handed out by an
//! [`IdAllocator`] that the owning model carries as plain state, so two models
//! never share a counter and replaying the same operations yields the same ids.
//! Panel ids are chosen by the host application.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error raised by identifier construction and allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    #[error("id 0 is reserved")]
    Zero,
    #[error("id space exhausted after {current}")]
    Overflow { current: u64 },
}

/// Stable identifier of a node inside a gridview arena.
///
/// `0` is reserved so ids are always non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u64);

impl NodeId {
    /// Smallest valid node id.
    pub const MIN: Self = Self(1);

    /// Create a node id, rejecting 0.
    pub fn new(raw: u64) -> Result<Self, IdError> {
        if raw == 0 {
            return Err(IdError::Zero);
        }
        Ok(Self(raw))
    }

    /// Raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node-{}", self.0)
    }
}

/// Stable identifier of a docking group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(u64);

impl GroupId {
    pub const MIN: Self = Self(1);

    /// Create a group id, rejecting 0.
    pub fn new(raw: u64) -> Result<Self, IdError> {
        if raw == 0 {
            return Err(IdError::Zero);
        }
        Ok(Self(raw))
    }

    /// Raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Host-chosen panel identifier, unique within one layout.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PanelId(String);

impl PanelId {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PanelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PanelId {
    fn from(raw: &str) -> Self {
        Self(raw.to_owned())
    }
}

impl From<String> for PanelId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

/// Deterministic monotonic allocator for numeric ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    /// Start allocating from a known value (0 is bumped to 1).
    #[must_use]
    pub const fn with_next(next: u64) -> Self {
        Self {
            next: if next == 0 { 1 } else { next },
        }
    }

    /// Peek at the next raw value without consuming it.
    #[must_use]
    pub const fn peek(&self) -> u64 {
        self.next
    }

    /// Make sure future allocations never collide with `used`.
    pub fn reserve(&mut self, used: u64) {
        if used >= self.next {
            self.next = used.saturating_add(1);
        }
    }

    fn advance(&mut self) -> Result<u64, IdError> {
        let current = self.next;
        self.next = current
            .checked_add(1)
            .ok_or(IdError::Overflow { current })?;
        Ok(current)
    }

    /// Allocate the next node id.
    pub fn allocate_node(&mut self) -> Result<NodeId, IdError> {
        NodeId::new(self.advance()?)
    }

    /// Allocate the next group id.
    pub fn allocate_group(&mut self) -> Result<GroupId, IdError> {
        GroupId::new(self.advance()?)
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::with_next(1)
    }
}
