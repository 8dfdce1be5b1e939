#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use lumen_compositor_core::{
    DamageSink, InputSink, Monitor, MonitorId, PopupId, ResourceId, Scene, SubsurfaceId, SurfaceRole, TreeConfig,
    ViewId, WindowDescriptor, WindowId, WorkspaceId,
};
use lumen_core::types::{PointF, RectF, SizeF};

#[derive(Debug, Clone, Default)]
pub struct Damage(Rc<RefCell<Vec<RectF>>>);

impl Damage {
    pub fn boxes(&self) -> Vec<RectF> {
        self.0.borrow().clone()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

impl DamageSink for Damage {
    fn damage_box(&mut self, rect: RectF) {
        self.0.borrow_mut().push(rect);
    }
}

#[derive(Debug, Clone, Default)]
pub struct Input {
    focus: Rc<RefCell<Option<ResourceId>>>,
    releases: Rc<RefCell<usize>>,
}

impl Input {
    pub fn focus(&self, resource: ResourceId) {
        *self.focus.borrow_mut() = Some(resource);
    }

    pub fn releases(&self) -> usize {
        *self.releases.borrow()
    }
}

impl InputSink for Input {
    fn pointer_focus(&self) -> Option<ResourceId> {
        *self.focus.borrow()
    }

    fn release_all_buttons(&mut self) {
        *self.releases.borrow_mut() += 1;
    }

    fn refocus_pointer(&mut self) {}
}

pub struct Harness {
    pub scene: Scene,
    pub damage: Damage,
    pub input: Input,
    pub monitor: MonitorId,
    pub workspace: WorkspaceId,
}

impl Harness {
    /// A scene with one 1920x1080 monitor and one workspace on it.
    pub fn new() -> Self {
        Self::with_config(TreeConfig::default())
    }

    pub fn with_config(config: TreeConfig) -> Self {
        let damage = Damage::default();
        let input = Input::default();
        let mut scene = Scene::new(config, Box::new(damage.clone()), Box::new(input.clone()));
        let monitor = scene.add_monitor(Monitor::new("DP-1", PointF::zero(), SizeF::new(1920.0, 1080.0)));
        let workspace = scene.add_workspace("1", monitor).unwrap();
        Self {
            scene,
            damage,
            input,
            monitor,
            workspace,
        }
    }

    /// A mapped toplevel with a buffer of `buffer` pixels.
    pub fn window(&mut self, position: PointF, size: SizeF, buffer: SizeF) -> (WindowId, ResourceId) {
        let resource = self.scene.resources_mut().create_surface();
        self.scene.client_request(|store| {
            store.set_role(resource, SurfaceRole::Toplevel).unwrap();
            store.attach_buffer(resource, Some(buffer)).unwrap();
            store.commit(resource).unwrap();
        });
        let window = self
            .scene
            .add_window(
                resource,
                WindowDescriptor {
                    workspace: self.workspace,
                    position,
                    size,
                },
            )
            .unwrap();
        self.scene.client_request(|store| store.map(resource).unwrap());
        (window, resource)
    }

    pub fn subsurface(&mut self, parent: ResourceId, position: PointF, size: SizeF) -> (SubsurfaceId, ResourceId) {
        let child = self.scene.resources_mut().create_surface();
        self.scene
            .client_request(|store| store.create_subsurface(child, parent).unwrap());
        self.scene.client_request(|store| {
            store.set_subsurface_position(child, position).unwrap();
            store.attach_buffer(child, Some(size)).unwrap();
            store.commit(child).unwrap();
            store.commit(parent).unwrap();
            store.map(child).unwrap();
        });
        match self.view_of(child) {
            Some(ViewId::Subsurface(node)) => (node, child),
            other => panic!("expected a sub-surface view, got {:?}", other),
        }
    }

    pub fn popup(&mut self, parent: ResourceId, position: PointF, size: SizeF) -> (PopupId, ResourceId) {
        let popup = self.scene.resources_mut().create_surface();
        self.scene
            .client_request(|store| store.create_popup(popup, parent, position).unwrap());
        self.scene.client_request(|store| store.commit(popup).unwrap());
        self.scene.client_request(|store| {
            store.attach_buffer(popup, Some(size)).unwrap();
            store.commit(popup).unwrap();
            store.map(popup).unwrap();
        });
        match self.view_of(popup) {
            Some(ViewId::Popup(node)) => (node, popup),
            other => panic!("expected a popup view, got {:?}", other),
        }
    }

    pub fn view_of(&self, resource: ResourceId) -> Option<ViewId> {
        let surface = self.scene.surface_from_resource(resource)?;
        self.scene.surface(surface)?.view()
    }
}
