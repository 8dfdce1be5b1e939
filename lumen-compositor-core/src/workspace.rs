//! Render-order collection of the views shown on a workspace.

use crate::layer::LockSurfaceId;
use crate::output::{MonitorId, WorkspaceId};
use crate::popup::PopupId;
use crate::scene::Scene;
use crate::view::{View, ViewId};

impl Scene {
    /// Views to draw for `workspace`, bottom to top.
    ///
    /// Each visible window on the workspace comes first, followed by its
    /// visible sub-surfaces and its visible popups, both breadth-first. Then
    /// the layer surfaces of the workspace's monitor, each followed by its
    /// popups, and last the monitor's lock surfaces.
    pub fn views_for_workspace(&self, workspace: WorkspaceId) -> Vec<ViewId> {
        let Some(ws) = self.workspaces.get(workspace) else {
            return Vec::new();
        };
        let mut views = Vec::new();

        for id in &self.window_order {
            let Some(window) = self.windows.get(*id) else {
                continue;
            };
            if window.workspace() != workspace || !window.alive_and_visible(self) {
                continue;
            }
            views.push(ViewId::Window(*id));

            if let Some(root) = window.subsurface_root() {
                views.extend(
                    self.subsurfaces_breadth_first(root)
                        .into_iter()
                        .filter(|node| *node != root)
                        .filter(|node| self.view_alive_and_visible(ViewId::Subsurface(*node)))
                        .map(ViewId::Subsurface),
                );
            }
            if let Some(root) = window.popup_root() {
                self.collect_popups(root, &mut views);
            }
        }

        for id in self.layers_on_monitor(ws.monitor) {
            let Some(layer) = self.layers.get(id) else {
                continue;
            };
            if !layer.alive_and_visible(self) {
                continue;
            }
            views.push(ViewId::Layer(id));
            if let Some(root) = layer.popup_root() {
                self.collect_popups(root, &mut views);
            }
        }

        views.extend(
            self.locks_on_monitor(ws.monitor)
                .into_iter()
                .filter(|id| self.view_alive_and_visible(ViewId::LockScreen(*id)))
                .map(ViewId::LockScreen),
        );
        views
    }

    fn collect_popups(&self, root: PopupId, views: &mut Vec<ViewId>) {
        views.extend(
            self.popups_breadth_first(root)
                .into_iter()
                .filter(|popup| *popup != root)
                .filter(|popup| self.view_alive_and_visible(ViewId::Popup(*popup)))
                .map(ViewId::Popup),
        );
    }

    fn locks_on_monitor(&self, monitor: MonitorId) -> Vec<LockSurfaceId> {
        self.lock_order
            .iter()
            .copied()
            .filter(|id| self.locks.get(*id).map_or(false, |l| l.monitor == monitor))
            .collect()
    }
}
