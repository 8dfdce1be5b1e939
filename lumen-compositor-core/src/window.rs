//! Top-level windows.

use lumen_core::types::{PointF, RectF, SizeF};
use tracing::debug;

use crate::arena::Key;
use crate::output::{MonitorId, WorkspaceId};
use crate::popup::{PopupId, PopupOwner};
use crate::protocol::ResourceId;
use crate::scene::{Scene, SceneError};
use crate::signal::Subscription;
use crate::subsurface::{SubsurfaceId, SubsurfaceOwner};
use crate::surface::SurfaceId;
use crate::view::{View, ViewId, ViewType};

pub type WindowId = Key<Window>;

/// Initial placement of a window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowDescriptor {
    pub workspace: WorkspaceId,
    pub position: PointF,
    pub size: SizeF,
}

#[derive(Debug)]
pub struct Window {
    surface: SurfaceId,
    workspace: WorkspaceId,
    /// Animated on-screen position.
    pub real_position: PointF,
    /// Animated on-screen size.
    pub real_size: SizeF,
    /// The size the compositor last asked the client for.
    pub reported_size: SizeF,
    pub hidden: bool,
    pub is_x11: bool,
    /// Factor the X11 compatibility layer scaled this window's surfaces by.
    pub x11_surface_scaled_by: f64,
    subsurface_root: Option<SubsurfaceId>,
    popup_root: Option<PopupId>,
    commit_listener: Option<Subscription>,
}

impl Window {
    pub fn surface_id(&self) -> SurfaceId {
        self.surface
    }

    pub fn workspace(&self) -> WorkspaceId {
        self.workspace
    }

    /// Dummy root of the window's sub-surface tree.
    pub fn subsurface_root(&self) -> Option<SubsurfaceId> {
        self.subsurface_root
    }

    /// Dummy root of the window's popup tree.
    pub fn popup_root(&self) -> Option<PopupId> {
        self.popup_root
    }

    pub(crate) fn is_mapped(&self, scene: &Scene) -> bool {
        self.resource(scene)
            .and_then(|r| scene.resources.get(r))
            .map_or(false, |r| r.is_mapped())
    }

    /// Whether the window would be drawn this frame.
    pub(crate) fn is_drawn(&self, scene: &Scene) -> bool {
        self.is_mapped(scene) && !self.hidden && scene.workspace_visible(self.workspace)
    }

    /// Where the client's content sits: the logical box, or, for an undersized
    /// buffer, the centered box the buffer actually covers.
    pub(crate) fn content_box(&self, scene: &Scene) -> Option<RectF> {
        let logical = RectF::new(self.real_position, self.real_size);
        let surface = scene.surface(self.surface)?;
        if surface.fill_ignore_small() || !surface.small() {
            return Some(logical);
        }
        let corrected = surface.viewporter_corrected_size();
        let (sx, sy) = self.reported_to_logical();
        let size = corrected.scaled(sx, sy);
        Some(RectF::new(self.real_position + surface.correct_small_vec(), size))
    }

    /// Per-axis factor from the client's reported size to the logical size.
    /// An axis the client reported as zero is left unscaled.
    pub(crate) fn reported_to_logical(&self) -> (f64, f64) {
        let axis = |real: f64, reported: f64| if reported > 0.0 { real / reported } else { 1.0 };
        (
            axis(self.real_size.width, self.reported_size.width),
            axis(self.real_size.height, self.reported_size.height),
        )
    }
}

impl View for Window {
    fn view_type(&self) -> ViewType {
        ViewType::Window
    }

    fn surface(&self) -> Option<SurfaceId> {
        Some(self.surface)
    }

    fn visible(&self, scene: &Scene) -> bool {
        self.is_drawn(scene)
    }

    fn logical_box(&self, scene: &Scene) -> Option<RectF> {
        self.alive_and_visible(scene)
            .then(|| RectF::new(self.real_position, self.real_size))
    }

    fn surface_logical_box(&self, scene: &Scene) -> Option<RectF> {
        if !self.alive_and_visible(scene) {
            return None;
        }
        self.content_box(scene)
    }
}

impl Scene {
    /// Wraps `resource` in a window and builds its sub-surface and popup roots.
    pub fn add_window(&mut self, resource: ResourceId, descriptor: WindowDescriptor) -> Result<WindowId, SceneError> {
        self.check_claimable(resource)?;
        if !self.workspaces.contains(descriptor.workspace) {
            return Err(SceneError::UnknownWorkspace(descriptor.workspace));
        }

        let surface = self.create_surface();
        let id = self.windows.insert(Window {
            surface,
            workspace: descriptor.workspace,
            real_position: descriptor.position,
            real_size: descriptor.size,
            reported_size: descriptor.size,
            hidden: false,
            is_x11: false,
            x11_surface_scaled_by: 1.0,
            subsurface_root: None,
            popup_root: None,
            commit_listener: None,
        });
        self.assign_surface_to_view(surface, resource, ViewId::Window(id));
        let commit_listener = self.forward_view_commits(resource, ViewId::Window(id));
        let subsurface_root = self.create_subsurface_root(SubsurfaceOwner::Window(id));
        let popup_root = self.create_popup_root(PopupOwner::Window(id));

        if let Some(window) = self.windows.get_mut(id) {
            window.commit_listener = commit_listener;
            window.subsurface_root = Some(subsurface_root);
            window.popup_root = Some(popup_root);
        }
        self.window_order.push(id);
        debug!("Added window {:?} for resource {:?}", id, resource);
        Ok(id)
    }

    /// Tears down the window's trees and frees it.
    pub fn remove_window(&mut self, id: WindowId) -> Result<(), SceneError> {
        let window = self.windows.get(id).ok_or(SceneError::UnknownWindow(id))?;
        let (surface, subsurface_root, popup_root) = (window.surface, window.subsurface_root, window.popup_root);

        if let Some(root) = popup_root {
            self.free_popup_subtree(root);
        }
        if let Some(root) = subsurface_root {
            self.free_subsurface_subtree(root);
        }
        self.windows.remove(id);
        self.remove_surface(surface);
        self.window_order.retain(|w| *w != id);
        debug!("Removed window {:?}", id);
        Ok(())
    }

    pub fn window(&self, id: WindowId) -> Option<&Window> {
        self.windows.get(id)
    }

    /// Windows bottom to top.
    pub fn windows(&self) -> &[WindowId] {
        &self.window_order
    }

    fn window_mut(&mut self, id: WindowId) -> Result<&mut Window, SceneError> {
        self.windows.get_mut(id).ok_or(SceneError::UnknownWindow(id))
    }

    pub fn set_window_position(&mut self, id: WindowId, position: PointF) -> Result<(), SceneError> {
        self.window_mut(id)?.real_position = position;
        Ok(())
    }

    pub fn set_window_size(&mut self, id: WindowId, size: SizeF) -> Result<(), SceneError> {
        self.window_mut(id)?.real_size = size;
        Ok(())
    }

    /// Records the size the client was asked to take.
    pub fn set_window_reported_size(&mut self, id: WindowId, size: SizeF) -> Result<(), SceneError> {
        self.window_mut(id)?.reported_size = size;
        Ok(())
    }

    pub fn set_window_hidden(&mut self, id: WindowId, hidden: bool) -> Result<(), SceneError> {
        self.window_mut(id)?.hidden = hidden;
        Ok(())
    }

    /// Marks the window as X11-backed with the given surface scale, or as
    /// native with `None`.
    pub fn set_window_x11(&mut self, id: WindowId, scaled_by: Option<f64>) -> Result<(), SceneError> {
        let window = self.window_mut(id)?;
        window.is_x11 = scaled_by.is_some();
        window.x11_surface_scaled_by = scaled_by.unwrap_or(1.0);
        Ok(())
    }

    pub fn move_window_to_workspace(&mut self, id: WindowId, workspace: WorkspaceId) -> Result<(), SceneError> {
        if !self.workspaces.contains(workspace) {
            return Err(SceneError::UnknownWorkspace(workspace));
        }
        self.window_mut(id)?.workspace = workspace;
        self.update_window_scale_transform(id);
        Ok(())
    }

    /// Moves the window to the top of the stacking order.
    pub fn raise_window(&mut self, id: WindowId) -> Result<(), SceneError> {
        if !self.windows.contains(id) {
            return Err(SceneError::UnknownWindow(id));
        }
        self.window_order.retain(|w| *w != id);
        self.window_order.push(id);
        Ok(())
    }

    pub(crate) fn window_monitor(&self, id: WindowId) -> Option<MonitorId> {
        let window = self.windows.get(id)?;
        let monitor = self.workspaces.get(window.workspace)?.monitor;
        self.monitors.contains(monitor).then_some(monitor)
    }

    pub(crate) fn on_window_commit(&mut self, id: WindowId) {
        let Some(window) = self.windows.get(id) else {
            return;
        };
        if !window.is_drawn(self) {
            return;
        }
        let (surface, popup_root) = (window.surface, window.popup_root);
        if let Some(content) = window.content_box(self) {
            self.damage_surface(surface, content.origin, 1.0);
        }
        if let Some(root) = popup_root {
            self.recheck_popup_tree(root);
        }
    }

    /// Sends the window's monitor scale and transform to the window and every
    /// resource of its sub-surface tree.
    pub fn update_window_scale_transform(&mut self, id: WindowId) {
        let Some(monitor) = self.window_monitor(id).and_then(|m| self.monitors.get(m)) else {
            return;
        };
        let (scale, transform) = (monitor.scale, monitor.transform);
        let Some(window) = self.windows.get(id) else {
            return;
        };

        let mut targets: Vec<ResourceId> = window.resource(self).into_iter().collect();
        if let Some(root) = window.subsurface_root {
            targets.extend(
                self.subsurfaces_breadth_first(root)
                    .into_iter()
                    .filter_map(|node| self.subsurface_resource(node)),
            );
        }
        for resource in targets {
            if let Err(e) = self.resources.send_preferred_scale(resource, scale, transform) {
                debug!("Skipping preferred scale for {:?}: {}", resource, e);
            }
        }
    }
}
