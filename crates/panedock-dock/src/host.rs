//! Window-host collaborator for popped-out groups.
//!
//! The docking model never creates windows itself. It asks a [`WindowHost`]
//! for one and keeps only the opaque [`WindowHandle`] it gets back.

use std::collections::BTreeSet;
use std::fmt;

use panedock_core::GroupId;
use serde::{Deserialize, Serialize};

/// Opaque handle of a host window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowHandle(u64);

impl WindowHandle {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "window-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WindowHostError {
    #[error("this host cannot open windows")]
    Unsupported,
    #[error("window refused: {0}")]
    Refused(String),
}

/// Opens and closes top-level windows on behalf of the docking model.
///
/// `open_window` must answer synchronously. Closing is a notification and
/// cannot fail.
pub trait WindowHost {
    fn open_window(&mut self, group: GroupId) -> Result<WindowHandle, WindowHostError>;

    fn close_window(&mut self, handle: WindowHandle);
}

/// Host without windowing support. Every popout attempt fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoWindowHost;

impl WindowHost for NoWindowHost {
    fn open_window(&mut self, _group: GroupId) -> Result<WindowHandle, WindowHostError> {
        Err(WindowHostError::Unsupported)
    }

    fn close_window(&mut self, _handle: WindowHandle) {}
}

/// Headless host handing out sequential handles, for tests and servers that
/// track windows elsewhere.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWindowHost {
    next: u64,
    open: BTreeSet<WindowHandle>,
    capacity: Option<usize>,
}

impl InMemoryWindowHost {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse to open more than `capacity` windows at once.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn open_windows(&self) -> Vec<WindowHandle> {
        self.open.iter().copied().collect()
    }

    #[must_use]
    pub fn is_open(&self, handle: WindowHandle) -> bool {
        self.open.contains(&handle)
    }
}

impl WindowHost for InMemoryWindowHost {
    fn open_window(&mut self, group: GroupId) -> Result<WindowHandle, WindowHostError> {
        if self.capacity.is_some_and(|limit| self.open.len() >= limit) {
            return Err(WindowHostError::Refused(format!(
                "window limit reached for group {group}"
            )));
        }
        self.next += 1;
        let handle = WindowHandle::new(self.next);
        let _ = self.open.insert(handle);
        Ok(handle)
    }

    fn close_window(&mut self, handle: WindowHandle) {
        let _ = self.open.remove(&handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_window_host_always_refuses() {
        let mut host = NoWindowHost;
        assert_eq!(
            host.open_window(GroupId::MIN),
            Err(WindowHostError::Unsupported)
        );
    }

    #[test]
    fn in_memory_host_tracks_open_windows() {
        let mut host = InMemoryWindowHost::with_capacity(2);
        let a = host.open_window(GroupId::MIN).unwrap();
        let b = host.open_window(GroupId::MIN).unwrap();
        assert_ne!(a, b);
        assert!(matches!(
            host.open_window(GroupId::MIN),
            Err(WindowHostError::Refused(_))
        ));
        host.close_window(a);
        assert!(!host.is_open(a));
        assert_eq!(host.open_windows(), vec![b]);
        assert!(host.open_window(GroupId::MIN).is_ok());
    }
}
