//! Layer-shell surfaces and session-lock surfaces.

use lumen_core::types::RectF;
use tracing::debug;

use crate::arena::Key;
use crate::output::MonitorId;
use crate::popup::{PopupId, PopupOwner};
use crate::protocol::ResourceId;
use crate::scene::{Scene, SceneError};
use crate::signal::Subscription;
use crate::surface::SurfaceId;
use crate::view::{View, ViewId, ViewType};

pub type LayerId = Key<LayerSurface>;
pub type LockSurfaceId = Key<LockSurface>;

/// Stacking layer, bottom to top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Layer {
    Background,
    Bottom,
    #[default]
    Top,
    Overlay,
}

impl Layer {
    pub const ALL: [Layer; 4] = [Layer::Background, Layer::Bottom, Layer::Top, Layer::Overlay];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyboardInteractivity {
    #[default]
    None,
    Exclusive,
    OnDemand,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerDescriptor {
    pub monitor: MonitorId,
    /// Arranged box in global logical coordinates.
    pub geometry: RectF,
    pub layer: Layer,
    pub keyboard_interactivity: KeyboardInteractivity,
}

#[derive(Debug)]
pub struct LayerSurface {
    surface: SurfaceId,
    pub monitor: MonitorId,
    pub geometry: RectF,
    pub layer: Layer,
    pub keyboard_interactivity: KeyboardInteractivity,
    popup_root: Option<PopupId>,
    commit_listener: Option<Subscription>,
}

impl LayerSurface {
    pub fn surface_id(&self) -> SurfaceId {
        self.surface
    }

    pub fn popup_root(&self) -> Option<PopupId> {
        self.popup_root
    }
}

impl View for LayerSurface {
    fn view_type(&self) -> ViewType {
        ViewType::LayerSurface
    }

    fn surface(&self) -> Option<SurfaceId> {
        Some(self.surface)
    }

    /// Mapping alone decides.
    fn visible(&self, _scene: &Scene) -> bool {
        true
    }

    fn logical_box(&self, scene: &Scene) -> Option<RectF> {
        self.alive_and_visible(scene).then_some(self.geometry)
    }

    fn keyboard_focusable(&self, _scene: &Scene) -> bool {
        self.keyboard_interactivity != KeyboardInteractivity::None
    }
}

#[derive(Debug)]
pub struct LockSurface {
    surface: SurfaceId,
    pub monitor: MonitorId,
    commit_listener: Option<Subscription>,
}

impl LockSurface {
    pub fn surface_id(&self) -> SurfaceId {
        self.surface
    }
}

impl View for LockSurface {
    fn view_type(&self) -> ViewType {
        ViewType::LockScreen
    }

    fn surface(&self) -> Option<SurfaceId> {
        Some(self.surface)
    }

    fn visible(&self, scene: &Scene) -> bool {
        scene.session_locked
    }

    fn logical_box(&self, scene: &Scene) -> Option<RectF> {
        if !self.alive_and_visible(scene) {
            return None;
        }
        scene.monitors.get(self.monitor).map(|m| m.logical_box())
    }
}

impl Scene {
    pub fn add_layer(&mut self, resource: ResourceId, descriptor: LayerDescriptor) -> Result<LayerId, SceneError> {
        self.check_claimable(resource)?;
        if !self.monitors.contains(descriptor.monitor) {
            return Err(SceneError::UnknownMonitor(descriptor.monitor));
        }

        let surface = self.create_surface();
        let id = self.layers.insert(LayerSurface {
            surface,
            monitor: descriptor.monitor,
            geometry: descriptor.geometry,
            layer: descriptor.layer,
            keyboard_interactivity: descriptor.keyboard_interactivity,
            popup_root: None,
            commit_listener: None,
        });
        self.assign_surface_to_view(surface, resource, ViewId::Layer(id));
        let commit_listener = self.forward_view_commits(resource, ViewId::Layer(id));
        let popup_root = self.create_popup_root(PopupOwner::Layer(id));
        if let Some(layer) = self.layers.get_mut(id) {
            layer.commit_listener = commit_listener;
            layer.popup_root = Some(popup_root);
        }
        self.layer_order.push(id);
        debug!("Added {:?} layer surface {:?} on {:?}", descriptor.layer, id, descriptor.monitor);
        Ok(id)
    }

    pub fn remove_layer(&mut self, id: LayerId) -> Result<(), SceneError> {
        let layer = self.layers.remove(id).ok_or(SceneError::UnknownLayer(id))?;
        if let Some(root) = layer.popup_root {
            self.free_popup_subtree(root);
        }
        self.remove_surface(layer.surface);
        self.layer_order.retain(|l| *l != id);
        Ok(())
    }

    pub fn layer(&self, id: LayerId) -> Option<&LayerSurface> {
        self.layers.get(id)
    }

    pub fn set_layer_geometry(&mut self, id: LayerId, geometry: RectF) -> Result<(), SceneError> {
        self.layers.get_mut(id).ok_or(SceneError::UnknownLayer(id))?.geometry = geometry;
        Ok(())
    }

    pub fn set_layer_keyboard_interactivity(
        &mut self,
        id: LayerId,
        interactivity: KeyboardInteractivity,
    ) -> Result<(), SceneError> {
        self.layers.get_mut(id).ok_or(SceneError::UnknownLayer(id))?.keyboard_interactivity = interactivity;
        Ok(())
    }

    /// Layer surfaces on `monitor`, bottom layer first, creation order within a layer.
    pub fn layers_on_monitor(&self, monitor: MonitorId) -> Vec<LayerId> {
        Layer::ALL
            .iter()
            .flat_map(|level| {
                self.layer_order.iter().copied().filter(move |id| {
                    self.layers
                        .get(*id)
                        .map_or(false, |l| l.monitor == monitor && l.layer == *level)
                })
            })
            .collect()
    }

    pub(crate) fn on_layer_commit(&mut self, id: LayerId) {
        let Some(layer) = self.layers.get(id) else {
            return;
        };
        if !layer.alive_and_visible(self) {
            return;
        }
        let (surface, origin, popup_root) = (layer.surface, layer.geometry.origin, layer.popup_root);
        self.damage_surface(surface, origin, 1.0);
        if let Some(root) = popup_root {
            self.recheck_popup_tree(root);
        }
    }

    pub fn add_lock_surface(&mut self, resource: ResourceId, monitor: MonitorId) -> Result<LockSurfaceId, SceneError> {
        self.check_claimable(resource)?;
        if !self.monitors.contains(monitor) {
            return Err(SceneError::UnknownMonitor(monitor));
        }
        let surface = self.create_surface();
        let id = self.locks.insert(LockSurface {
            surface,
            monitor,
            commit_listener: None,
        });
        self.assign_surface_to_view(surface, resource, ViewId::LockScreen(id));
        let commit_listener = self.forward_view_commits(resource, ViewId::LockScreen(id));
        if let Some(lock) = self.locks.get_mut(id) {
            lock.commit_listener = commit_listener;
        }
        self.lock_order.push(id);
        Ok(id)
    }

    pub fn remove_lock_surface(&mut self, id: LockSurfaceId) -> Result<(), SceneError> {
        let lock = self.locks.remove(id).ok_or(SceneError::UnknownLockSurface(id))?;
        self.remove_surface(lock.surface);
        self.lock_order.retain(|l| *l != id);
        Ok(())
    }

    pub fn lock_surface(&self, id: LockSurfaceId) -> Option<&LockSurface> {
        self.locks.get(id)
    }

    pub fn set_session_locked(&mut self, locked: bool) {
        if self.session_locked != locked {
            debug!("Session lock {}", if locked { "engaged" } else { "released" });
        }
        self.session_locked = locked;
    }

    pub fn session_locked(&self) -> bool {
        self.session_locked
    }

    /// Box of the monitor a lock surface covers.
    pub(crate) fn lock_box(&self, id: LockSurfaceId) -> Option<RectF> {
        let lock = self.locks.get(id)?;
        self.monitors.get(lock.monitor).map(|m| m.logical_box())
    }

    pub(crate) fn on_lock_commit(&mut self, id: LockSurfaceId) {
        let Some(lock) = self.locks.get(id) else {
            return;
        };
        if !lock.alive_and_visible(self) {
            return;
        }
        let surface = lock.surface;
        if let Some(area) = self.lock_box(id) {
            self.damage_surface(surface, area.origin, 1.0);
        }
    }

    pub(crate) fn check_claimable(&self, resource: ResourceId) -> Result<(), SceneError> {
        let res = self.resources.get(resource).ok_or(SceneError::UnknownResource(resource))?;
        if res.owner().is_some() {
            return Err(SceneError::ResourceAlreadyOwned(resource));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{desktop, recording_scene};
    use lumen_core::types::SizeF;

    fn mapped_resource(scene: &mut Scene, size: SizeF) -> ResourceId {
        let resource = scene.resources_mut().create_surface();
        scene.client_request(|store| {
            store.attach_buffer(resource, Some(size)).unwrap();
            store.commit(resource).unwrap();
            store.map(resource).unwrap();
        });
        resource
    }

    #[test]
    fn test_layer_keyboard_focus_follows_interactivity() {
        let (mut scene, _, _) = recording_scene();
        let (monitor, _) = desktop(&mut scene);
        let resource = mapped_resource(&mut scene, SizeF::new(1920.0, 30.0));
        let layer = scene
            .add_layer(
                resource,
                LayerDescriptor {
                    monitor,
                    geometry: RectF::from_coords(0.0, 0.0, 1920.0, 30.0),
                    layer: Layer::Top,
                    keyboard_interactivity: KeyboardInteractivity::None,
                },
            )
            .unwrap();

        let view = ViewId::Layer(layer);
        assert!(!scene.view(view).unwrap().keyboard_focusable(&scene));
        scene
            .set_layer_keyboard_interactivity(layer, KeyboardInteractivity::OnDemand)
            .unwrap();
        assert!(scene.view(view).unwrap().keyboard_focusable(&scene));
        assert_eq!(
            scene.view(view).unwrap().logical_box(&scene),
            Some(RectF::from_coords(0.0, 0.0, 1920.0, 30.0))
        );
    }

    #[test]
    fn test_layers_on_monitor_are_ordered_by_layer() {
        let (mut scene, _, _) = recording_scene();
        let (monitor, _) = desktop(&mut scene);
        let add = |scene: &mut Scene, layer: Layer| {
            let resource = mapped_resource(scene, SizeF::new(10.0, 10.0));
            scene
                .add_layer(
                    resource,
                    LayerDescriptor {
                        monitor,
                        geometry: RectF::from_coords(0.0, 0.0, 10.0, 10.0),
                        layer,
                        keyboard_interactivity: KeyboardInteractivity::None,
                    },
                )
                .unwrap()
        };
        let overlay = add(&mut scene, Layer::Overlay);
        let background = add(&mut scene, Layer::Background);
        let top = add(&mut scene, Layer::Top);

        assert_eq!(scene.layers_on_monitor(monitor), vec![background, top, overlay]);
    }

    #[test]
    fn test_lock_surface_visible_only_while_locked() {
        let (mut scene, _, _) = recording_scene();
        let (monitor, _) = desktop(&mut scene);
        let resource = mapped_resource(&mut scene, SizeF::new(1920.0, 1080.0));
        let lock = scene.add_lock_surface(resource, monitor).unwrap();
        let view = ViewId::LockScreen(lock);

        assert!(!scene.view_alive_and_visible(view));
        scene.set_session_locked(true);
        assert!(scene.view_alive_and_visible(view));
        assert_eq!(
            scene.view(view).unwrap().logical_box(&scene),
            Some(RectF::from_coords(0.0, 0.0, 1920.0, 1080.0))
        );
    }
}
