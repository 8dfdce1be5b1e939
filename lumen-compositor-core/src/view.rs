//! The capability contract shared by everything that can own a [`Surface`](crate::surface::Surface).

use lumen_core::types::RectF;

use crate::layer::{LayerId, LockSurfaceId};
use crate::popup::PopupId;
use crate::protocol::ResourceId;
use crate::scene::{Scene, Work};
use crate::signal::Subscription;
use crate::subsurface::SubsurfaceId;
use crate::surface::SurfaceId;
use crate::window::WindowId;

/// Handle of any view in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewId {
    Window(WindowId),
    Subsurface(SubsurfaceId),
    Popup(PopupId),
    Layer(LayerId),
    LockScreen(LockSurfaceId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewType {
    Window,
    Subsurface,
    Popup,
    LayerSurface,
    LockScreen,
}

impl ViewId {
    pub fn view_type(&self) -> ViewType {
        match self {
            ViewId::Window(_) => ViewType::Window,
            ViewId::Subsurface(_) => ViewType::Subsurface,
            ViewId::Popup(_) => ViewType::Popup,
            ViewId::Layer(_) => ViewType::LayerSurface,
            ViewId::LockScreen(_) => ViewType::LockScreen,
        }
    }
}

/// Read-only queries every view answers. None of them mutate the scene, and
/// all of them tolerate stale handles by answering "nothing" or "not visible".
pub trait View {
    fn view_type(&self) -> ViewType;

    /// The surface this view is bound to, if any.
    fn surface(&self) -> Option<SurfaceId>;

    /// The bound resource, if it still exists.
    fn resource(&self, scene: &Scene) -> Option<ResourceId> {
        scene.surface(self.surface()?)?.resource()
    }

    /// Variant-specific visibility, ignoring whether the resource is mapped.
    fn visible(&self, scene: &Scene) -> bool;

    fn desktop_component(&self) -> bool {
        true
    }

    /// Resource exists, is mapped, and the view is visible.
    fn alive_and_visible(&self, scene: &Scene) -> bool {
        self.resource(scene)
            .and_then(|r| scene.resources.get(r))
            .map_or(false, |r| r.is_mapped())
            && self.visible(scene)
    }

    fn logical_box(&self, scene: &Scene) -> Option<RectF>;

    /// Where the surface content is drawn, which may differ from
    /// [`View::logical_box`] for undersized window buffers.
    fn surface_logical_box(&self, scene: &Scene) -> Option<RectF> {
        self.logical_box(scene)
    }

    fn keyboard_focusable(&self, _scene: &Scene) -> bool {
        true
    }
}

impl Scene {
    /// Resolves a handle; stale handles give `None`.
    pub fn view(&self, id: ViewId) -> Option<&dyn View> {
        match id {
            ViewId::Window(id) => self.windows.get(id).map(|v| v as &dyn View),
            ViewId::Subsurface(id) => self.subsurfaces.get(id).map(|v| v as &dyn View),
            ViewId::Popup(id) => self.popups.get(id).map(|v| v as &dyn View),
            ViewId::Layer(id) => self.layers.get(id).map(|v| v as &dyn View),
            ViewId::LockScreen(id) => self.locks.get(id).map(|v| v as &dyn View),
        }
    }

    pub fn view_alive_and_visible(&self, id: ViewId) -> bool {
        self.view(id).map_or(false, |v| v.alive_and_visible(self))
    }

    /// Queues a [`Work::ViewCommit`] on every commit of `resource`.
    pub(crate) fn forward_view_commits(&self, resource: ResourceId, view: ViewId) -> Option<Subscription> {
        let events = self.resources.get(resource)?.events();
        Some(self.work.forward(&events.commit, move |_| Work::ViewCommit(view)))
    }

    pub(crate) fn on_view_commit(&mut self, view: ViewId) {
        match view {
            ViewId::Window(id) => self.on_window_commit(id),
            ViewId::Layer(id) => self.on_layer_commit(id),
            ViewId::LockScreen(id) => self.on_lock_commit(id),
            // Tree nodes subscribe to their own commits.
            ViewId::Subsurface(_) | ViewId::Popup(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{desktop, mapped_window, recording_scene};
    use lumen_core::types::{PointF, SizeF};

    #[test]
    fn test_window_view_queries() {
        let (mut scene, _, _) = recording_scene();
        let (_, ws) = desktop(&mut scene);
        let (window, resource) = mapped_window(&mut scene, ws, PointF::new(10.0, 20.0), SizeF::new(300.0, 200.0));

        let view = scene.view(ViewId::Window(window)).unwrap();
        assert_eq!(view.view_type(), ViewType::Window);
        assert_eq!(ViewId::Window(window).view_type(), ViewType::Window);
        assert!(view.desktop_component());
        assert!(view.keyboard_focusable(&scene));
        assert_eq!(view.resource(&scene), Some(resource));
        assert!(view.alive_and_visible(&scene));
        assert_eq!(view.logical_box(&scene), Some(RectF::from_coords(10.0, 20.0, 300.0, 200.0)));
    }

    #[test]
    fn test_unmapped_view_is_dead_immediately() {
        let (mut scene, _, _) = recording_scene();
        let (_, ws) = desktop(&mut scene);
        let (window, resource) = mapped_window(&mut scene, ws, PointF::zero(), SizeF::new(100.0, 100.0));

        scene.resources_mut().unmap(resource).unwrap();
        // No dispatch needed: visibility reads the resource directly.
        assert!(!scene.view_alive_and_visible(ViewId::Window(window)));
        assert_eq!(scene.view(ViewId::Window(window)).unwrap().logical_box(&scene), None);
    }

    #[test]
    fn test_stale_view_handle_resolves_to_none() {
        let (mut scene, _, _) = recording_scene();
        let (_, ws) = desktop(&mut scene);
        let (window, _) = mapped_window(&mut scene, ws, PointF::zero(), SizeF::new(100.0, 100.0));
        scene.remove_window(window).unwrap();

        assert!(scene.view(ViewId::Window(window)).is_none());
        assert!(!scene.view_alive_and_visible(ViewId::Window(window)));
    }
}
