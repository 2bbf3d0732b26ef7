//! Tab groups and the panels they hold.

use panedock_core::{GroupId, PanelId};
use panedock_layout::LeafConstraints;
use serde::{Deserialize, Serialize};

use crate::error::DockError;
use crate::location::Location;

/// Registry entry of a panel. Its group is tracked by the layout, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Panel {
    pub id: PanelId,
    /// Name of the host component that renders this panel.
    pub component: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub params: serde_json::Value,
}

/// What the caller supplies to create a panel.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelOptions {
    pub id: PanelId,
    pub component: String,
    pub title: Option<String>,
    pub params: serde_json::Value,
}

impl PanelOptions {
    pub fn new(id: impl Into<PanelId>, component: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            component: component.into(),
            title: None,
            params: serde_json::Value::Null,
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_params(mut self, params: serde_json::Value) -> Self {
        self.params = params;
        self
    }

    pub(crate) fn into_panel(self) -> Panel {
        Panel {
            id: self.id,
            component: self.component,
            title: self.title,
            params: self.params,
        }
    }
}

/// A tabbed container of panels.
///
/// `active_panel` is `None` exactly when `panels` is empty, and otherwise one
/// of `panels`. Every mutator below keeps that true.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    id: GroupId,
    panels: Vec<PanelId>,
    active_panel: Option<PanelId>,
    pub(crate) location: Location,
    pub(crate) persistent: bool,
    pub(crate) constraints: LeafConstraints,
}

impl Group {
    pub(crate) fn new(id: GroupId, location: Location, constraints: LeafConstraints) -> Self {
        Self {
            id,
            panels: Vec::new(),
            active_panel: None,
            location,
            persistent: false,
            constraints,
        }
    }

    #[must_use]
    pub const fn id(&self) -> GroupId {
        self.id
    }

    /// Panels in tab order.
    #[must_use]
    pub fn panels(&self) -> &[PanelId] {
        &self.panels
    }

    #[must_use]
    pub fn active_panel(&self) -> Option<&PanelId> {
        self.active_panel.as_ref()
    }

    #[must_use]
    pub const fn location(&self) -> &Location {
        &self.location
    }

    /// Persistent groups survive losing their last panel.
    #[must_use]
    pub const fn is_persistent(&self) -> bool {
        self.persistent
    }

    #[must_use]
    pub const fn constraints(&self) -> LeafConstraints {
        self.constraints
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.panels.len()
    }

    #[must_use]
    pub fn contains(&self, panel: &PanelId) -> bool {
        self.panels.contains(panel)
    }

    #[must_use]
    pub fn index_of(&self, panel: &PanelId) -> Option<usize> {
        self.panels.iter().position(|p| p == panel)
    }

    /// Insert `panel` at `index` (appended when `None`) and make it active.
    pub(crate) fn insert_panel(
        &mut self,
        panel: PanelId,
        index: Option<usize>,
    ) -> Result<(), DockError> {
        let index = index.unwrap_or(self.panels.len());
        if index > self.panels.len() {
            return Err(DockError::InvalidIndex {
                index,
                len: self.panels.len(),
            });
        }
        self.panels.insert(index, panel.clone());
        self.active_panel = Some(panel);
        Ok(())
    }

    /// Remove `panel`. When it was active, the tab that slides into its
    /// place becomes active (or the new last tab).
    pub(crate) fn remove_panel(&mut self, panel: &PanelId) -> Result<usize, DockError> {
        let index = self
            .index_of(panel)
            .ok_or_else(|| DockError::panel_not_found(panel))?;
        let _ = self.panels.remove(index);
        if self.active_panel.as_ref() == Some(panel) {
            let next = index.min(self.panels.len().saturating_sub(1));
            self.active_panel = self.panels.get(next).cloned();
        }
        Ok(index)
    }

    /// Reorder `panel` to `index` within this group.
    pub(crate) fn move_panel(&mut self, panel: &PanelId, index: usize) -> Result<(), DockError> {
        let from = self
            .index_of(panel)
            .ok_or_else(|| DockError::panel_not_found(panel))?;
        if index >= self.panels.len() {
            return Err(DockError::InvalidIndex {
                index,
                len: self.panels.len(),
            });
        }
        let moved = self.panels.remove(from);
        self.panels.insert(index, moved);
        Ok(())
    }

    /// Returns whether the active panel changed.
    pub(crate) fn set_active(&mut self, panel: &PanelId) -> Result<bool, DockError> {
        if !self.contains(panel) {
            return Err(DockError::panel_not_found(panel));
        }
        if self.active_panel.as_ref() == Some(panel) {
            return Ok(false);
        }
        self.active_panel = Some(panel.clone());
        Ok(true)
    }

    /// Take every panel out, leaving the group empty.
    pub(crate) fn drain_panels(&mut self) -> Vec<PanelId> {
        self.active_panel = None;
        std::mem::take(&mut self.panels)
    }

    /// Rebuild from stored parts, checking the active-panel rule.
    pub(crate) fn restore(
        id: GroupId,
        panels: Vec<PanelId>,
        active_panel: Option<PanelId>,
        location: Location,
        constraints: LeafConstraints,
        persistent: bool,
    ) -> Result<Self, DockError> {
        let group = Self {
            id,
            panels,
            active_panel,
            location,
            persistent,
            constraints,
        };
        group.check_active()?;
        Ok(group)
    }

    pub(crate) fn check_active(&self) -> Result<(), DockError> {
        let consistent = match &self.active_panel {
            None => self.panels.is_empty(),
            Some(active) => self.panels.contains(active),
        };
        if consistent {
            Ok(())
        } else {
            Err(DockError::malformed(format!(
                "group {} has active panel {:?} outside {:?}",
                self.id, self.active_panel, self.panels
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(panels: &[&str]) -> Group {
        let mut group = Group::new(GroupId::MIN, Location::Grid, LeafConstraints::default());
        for panel in panels {
            group.insert_panel(PanelId::from(*panel), None).unwrap();
        }
        group
    }

    fn ids(panels: &[&str]) -> Vec<PanelId> {
        panels.iter().map(|p| PanelId::from(*p)).collect()
    }

    #[test]
    fn inserting_activates_the_new_panel() {
        let mut g = group(&["a", "b"]);
        assert_eq!(g.active_panel(), Some(&PanelId::from("b")));
        g.insert_panel(PanelId::from("c"), Some(0)).unwrap();
        assert_eq!(g.panels(), ids(&["c", "a", "b"]).as_slice());
        assert_eq!(g.active_panel(), Some(&PanelId::from("c")));
        assert!(g.insert_panel(PanelId::from("d"), Some(9)).is_err());
    }

    #[test]
    fn removing_the_active_panel_activates_its_successor() {
        let mut g = group(&["a", "b", "c"]);
        g.set_active(&PanelId::from("b")).unwrap();
        assert_eq!(g.remove_panel(&PanelId::from("b")).unwrap(), 1);
        assert_eq!(g.active_panel(), Some(&PanelId::from("c")));
        g.remove_panel(&PanelId::from("c")).unwrap();
        assert_eq!(g.active_panel(), Some(&PanelId::from("a")));
        g.remove_panel(&PanelId::from("a")).unwrap();
        assert_eq!(g.active_panel(), None);
        g.check_active().unwrap();
    }

    #[test]
    fn removing_an_inactive_panel_keeps_the_active_one() {
        let mut g = group(&["a", "b", "c"]);
        g.remove_panel(&PanelId::from("a")).unwrap();
        assert_eq!(g.active_panel(), Some(&PanelId::from("c")));
    }

    #[test]
    fn reorder_and_activation() {
        let mut g = group(&["a", "b", "c"]);
        g.move_panel(&PanelId::from("a"), 2).unwrap();
        assert_eq!(g.panels(), ids(&["b", "c", "a"]).as_slice());
        assert!(!g.set_active(&PanelId::from("c")).unwrap());
        assert!(g.set_active(&PanelId::from("b")).unwrap());
        assert!(g.set_active(&PanelId::from("zzz")).is_err());
        assert!(g.move_panel(&PanelId::from("a"), 3).is_err());
    }

    #[test]
    fn restore_rejects_foreign_active_panel() {
        let err = Group::restore(
            GroupId::MIN,
            ids(&["a"]),
            Some(PanelId::from("b")),
            Location::Grid,
            LeafConstraints::default(),
            false,
        )
        .unwrap_err();
        assert_eq!(err.kind(), crate::error::DockErrorKind::MalformedLayout);
        assert!(
            Group::restore(
                GroupId::MIN,
                Vec::new(),
                Some(PanelId::from("a")),
                Location::Grid,
                LeafConstraints::default(),
                false,
            )
            .is_err()
        );
    }
}
