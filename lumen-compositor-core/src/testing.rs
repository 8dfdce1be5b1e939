//! Recording sinks and scene builders shared by the unit tests.

use std::cell::RefCell;
use std::rc::Rc;

use lumen_core::types::{PointF, RectF, SizeF};

use crate::context::{DamageSink, InputSink, TreeConfig};
use crate::output::{Monitor, MonitorId, WorkspaceId};
use crate::popup::PopupId;
use crate::protocol::{ResourceId, SurfaceRole};
use crate::scene::Scene;
use crate::subsurface::SubsurfaceId;
use crate::view::ViewId;
use crate::window::{WindowDescriptor, WindowId};

#[derive(Debug, Clone, Default)]
pub(crate) struct DamageLog(Rc<RefCell<Vec<RectF>>>);

impl DamageLog {
    pub(crate) fn boxes(&self) -> Vec<RectF> {
        self.0.borrow().clone()
    }

    pub(crate) fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

impl DamageSink for DamageLog {
    fn damage_box(&mut self, rect: RectF) {
        self.0.borrow_mut().push(rect);
    }
}

#[derive(Debug, Default)]
struct InputState {
    focus: Option<ResourceId>,
    releases: usize,
    refocuses: usize,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct InputLog(Rc<RefCell<InputState>>);

impl InputLog {
    pub(crate) fn set_focus(&self, focus: Option<ResourceId>) {
        self.0.borrow_mut().focus = focus;
    }

    pub(crate) fn releases(&self) -> usize {
        self.0.borrow().releases
    }

    pub(crate) fn refocuses(&self) -> usize {
        self.0.borrow().refocuses
    }
}

impl InputSink for InputLog {
    fn pointer_focus(&self) -> Option<ResourceId> {
        self.0.borrow().focus
    }

    fn release_all_buttons(&mut self) {
        self.0.borrow_mut().releases += 1;
    }

    fn refocus_pointer(&mut self) {
        self.0.borrow_mut().refocuses += 1;
    }
}

pub(crate) fn recording_scene() -> (Scene, DamageLog, InputLog) {
    let damage = DamageLog::default();
    let input = InputLog::default();
    let scene = Scene::new(TreeConfig::default(), Box::new(damage.clone()), Box::new(input.clone()));
    (scene, damage, input)
}

/// One 1920x1080 monitor at the origin with one visible workspace.
pub(crate) fn desktop(scene: &mut Scene) -> (MonitorId, WorkspaceId) {
    let monitor = scene.add_monitor(Monitor::new("DP-1", PointF::zero(), SizeF::new(1920.0, 1080.0)));
    let workspace = scene.add_workspace("1", monitor).unwrap();
    (monitor, workspace)
}

/// A mapped toplevel whose buffer matches its size.
pub(crate) fn mapped_window(
    scene: &mut Scene,
    workspace: WorkspaceId,
    position: PointF,
    size: SizeF,
) -> (WindowId, ResourceId) {
    let resource = scene.resources_mut().create_surface();
    scene.client_request(|store| {
        store.set_role(resource, SurfaceRole::Toplevel).unwrap();
        store.attach_buffer(resource, Some(size)).unwrap();
        store.commit(resource).unwrap();
    });
    let window = scene
        .add_window(
            resource,
            WindowDescriptor {
                workspace,
                position,
                size,
            },
        )
        .unwrap();
    scene.client_request(|store| store.map(resource).unwrap());
    (window, resource)
}

/// A mapped sub-surface of `parent` at `position`.
pub(crate) fn attach_subsurface(
    scene: &mut Scene,
    parent: ResourceId,
    position: PointF,
    size: SizeF,
) -> (SubsurfaceId, ResourceId) {
    let child = scene.resources_mut().create_surface();
    scene.client_request(|store| store.create_subsurface(child, parent).unwrap());
    scene.client_request(|store| {
        store.set_subsurface_position(child, position).unwrap();
        store.attach_buffer(child, Some(size)).unwrap();
        store.commit(child).unwrap();
        store.commit(parent).unwrap();
        store.map(child).unwrap();
    });
    match view_of(scene, child) {
        Some(ViewId::Subsurface(node)) => (node, child),
        other => panic!("sub-surface resource {:?} resolved to {:?}", child, other),
    }
}

/// A configured and mapped popup of `parent` placed at `position`.
pub(crate) fn mapped_popup(scene: &mut Scene, parent: ResourceId, position: PointF, size: SizeF) -> (PopupId, ResourceId) {
    let popup = scene.resources_mut().create_surface();
    scene.client_request(|store| store.create_popup(popup, parent, position).unwrap());
    scene.client_request(|store| store.commit(popup).unwrap());
    scene.client_request(|store| {
        store.attach_buffer(popup, Some(size)).unwrap();
        store.commit(popup).unwrap();
        store.map(popup).unwrap();
    });
    match view_of(scene, popup) {
        Some(ViewId::Popup(node)) => (node, popup),
        other => panic!("popup resource {:?} resolved to {:?}", popup, other),
    }
}

fn view_of(scene: &Scene, resource: ResourceId) -> Option<ViewId> {
    let surface = scene.surface_from_resource(resource)?;
    scene.surface(surface)?.view()
}
