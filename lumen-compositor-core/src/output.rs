//! Monitors and workspaces, as configured by the layout layer.

use lumen_core::types::{PointF, RectF, SizeF};
use tracing::debug;

use crate::arena::Key;
use crate::scene::{Scene, SceneError};
use crate::transform::OutputTransform;

pub type MonitorId = Key<Monitor>;
pub type WorkspaceId = Key<Workspace>;

#[derive(Debug, Clone, PartialEq)]
pub struct Monitor {
    pub name: String,
    pub position: PointF,
    pub size: SizeF,
    pub scale: f64,
    pub transform: OutputTransform,
}

impl Monitor {
    pub fn new(name: impl Into<String>, position: PointF, size: SizeF) -> Self {
        Self {
            name: name.into(),
            position,
            size,
            scale: 1.0,
            transform: OutputTransform::Normal,
        }
    }

    /// Logical box in the global layout.
    pub fn logical_box(&self) -> RectF {
        RectF::new(self.position, self.size)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Workspace {
    pub name: String,
    pub monitor: MonitorId,
    pub visible: bool,
}

impl Scene {
    pub fn add_monitor(&mut self, monitor: Monitor) -> MonitorId {
        debug!("Adding monitor {} at {:?}", monitor.name, monitor.logical_box());
        self.monitors.insert(monitor)
    }

    pub fn monitor(&self, id: MonitorId) -> Option<&Monitor> {
        self.monitors.get(id)
    }

    pub fn monitor_mut(&mut self, id: MonitorId) -> Option<&mut Monitor> {
        self.monitors.get_mut(id)
    }

    pub fn remove_monitor(&mut self, id: MonitorId) -> Option<Monitor> {
        self.monitors.remove(id)
    }

    /// The monitor whose box contains `point`.
    pub fn monitor_at(&self, point: PointF) -> Option<MonitorId> {
        self.monitors
            .iter()
            .find(|(_, monitor)| monitor.logical_box().contains_point(&point))
            .map(|(id, _)| id)
    }

    /// Adds a visible workspace bound to `monitor`.
    pub fn add_workspace(&mut self, name: impl Into<String>, monitor: MonitorId) -> Result<WorkspaceId, SceneError> {
        if !self.monitors.contains(monitor) {
            return Err(SceneError::UnknownMonitor(monitor));
        }
        Ok(self.workspaces.insert(Workspace {
            name: name.into(),
            monitor,
            visible: true,
        }))
    }

    pub fn workspace(&self, id: WorkspaceId) -> Option<&Workspace> {
        self.workspaces.get(id)
    }

    pub fn set_workspace_visible(&mut self, id: WorkspaceId, visible: bool) -> Result<(), SceneError> {
        let workspace = self.workspaces.get_mut(id).ok_or(SceneError::UnknownWorkspace(id))?;
        workspace.visible = visible;
        Ok(())
    }

    pub fn move_workspace_to_monitor(&mut self, id: WorkspaceId, monitor: MonitorId) -> Result<(), SceneError> {
        if !self.monitors.contains(monitor) {
            return Err(SceneError::UnknownMonitor(monitor));
        }
        let workspace = self.workspaces.get_mut(id).ok_or(SceneError::UnknownWorkspace(id))?;
        workspace.monitor = monitor;
        Ok(())
    }

    pub fn remove_workspace(&mut self, id: WorkspaceId) -> Option<Workspace> {
        self.workspaces.remove(id)
    }

    /// A workspace is shown when it is flagged visible and its monitor exists.
    pub(crate) fn workspace_visible(&self, id: WorkspaceId) -> bool {
        self.workspaces
            .get(id)
            .map_or(false, |ws| ws.visible && self.monitors.contains(ws.monitor))
    }
}
