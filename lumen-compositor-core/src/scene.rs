//! The scene owns every node of the composition tree and the work queue that
//! protocol notifications feed.
//!
//! Listeners registered on [`ResourceEvents`](crate::protocol::ResourceEvents)
//! never touch the scene directly. They push a [`Work`] item naming the node
//! they belong to; [`Scene::dispatch_pending`] drains the queue and runs the
//! matching handler with `&mut Scene`. A handler whose node has been freed in
//! the meantime finds a stale key and does nothing.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use lumen_core::types::RectF;
use thiserror::Error;
use tracing::trace;

use crate::arena::Arena;
use crate::context::{DamageSink, InputSink, TreeConfig};
use crate::layer::{LayerId, LayerSurface, LockSurface, LockSurfaceId};
use crate::output::{Monitor, MonitorId, Workspace, WorkspaceId};
use crate::popup::{PopupId, PopupNode};
use crate::protocol::{ResourceId, ResourceStore};
use crate::signal::{Signal, Subscription};
use crate::subsurface::{SubsurfaceId, SubsurfaceNode};
use crate::surface::{Surface, SurfaceId};
use crate::view::ViewId;
use crate::window::{Window, WindowId};

/// Errors returned to the layout layer for calls naming unknown or unusable objects.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SceneError {
    #[error("unknown monitor {0:?}")]
    UnknownMonitor(MonitorId),
    #[error("unknown workspace {0:?}")]
    UnknownWorkspace(WorkspaceId),
    #[error("unknown window {0:?}")]
    UnknownWindow(WindowId),
    #[error("unknown layer surface {0:?}")]
    UnknownLayer(LayerId),
    #[error("unknown lock surface {0:?}")]
    UnknownLockSurface(LockSurfaceId),
    #[error("resource {0:?} does not exist")]
    UnknownResource(ResourceId),
    #[error("resource {0:?} is already owned by another surface")]
    ResourceAlreadyOwned(ResourceId),
}

/// What happened to a tree node's resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeEvent {
    /// A child sub-surface or popup resource was created.
    NewChild(ResourceId),
    Commit,
    Map,
    Unmap,
    Destroy,
    RepositionRequested,
    Repositioned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Work {
    SurfaceDestroyed(SurfaceId),
    ViewCommit(ViewId),
    Subsurface(SubsurfaceId, NodeEvent),
    Popup(PopupId, NodeEvent),
}

/// Shared FIFO of pending work, cloned into every listener closure.
#[derive(Debug, Clone, Default)]
pub(crate) struct WorkQueue(Rc<RefCell<VecDeque<Work>>>);

impl WorkQueue {
    pub(crate) fn push(&self, work: Work) {
        self.0.borrow_mut().push_back(work);
    }

    fn pop(&self) -> Option<Work> {
        self.0.borrow_mut().pop_front()
    }

    fn len(&self) -> usize {
        self.0.borrow().len()
    }

    /// Subscribes to `signal`, turning each emission into a work item.
    pub(crate) fn forward<T, F>(&self, signal: &Signal<T>, make: F) -> Subscription
    where
        T: 'static,
        F: Fn(&T) -> Work + 'static,
    {
        let queue = self.clone();
        signal.subscribe(move |payload| queue.push(make(payload)))
    }
}

/// Cursor rendering state holding a weak back-reference to a [`Surface`].
#[derive(Debug, Default)]
pub(crate) struct CursorState {
    pub(crate) last_surface: Option<SurfaceId>,
}

/// Root object of the composition tree.
pub struct Scene {
    pub(crate) config: TreeConfig,
    pub(crate) damage: Box<dyn DamageSink>,
    pub(crate) input: Box<dyn InputSink>,
    pub(crate) resources: ResourceStore,
    pub(crate) surfaces: Arena<Surface>,
    pub(crate) monitors: Arena<Monitor>,
    pub(crate) workspaces: Arena<Workspace>,
    pub(crate) windows: Arena<Window>,
    pub(crate) layers: Arena<LayerSurface>,
    pub(crate) locks: Arena<LockSurface>,
    pub(crate) subsurfaces: Arena<SubsurfaceNode>,
    pub(crate) popups: Arena<PopupNode>,
    /// Stacking order, bottom to top.
    pub(crate) window_order: Vec<WindowId>,
    pub(crate) layer_order: Vec<LayerId>,
    pub(crate) lock_order: Vec<LockSurfaceId>,
    pub(crate) session_locked: bool,
    pub(crate) cursor: CursorState,
    pub(crate) work: WorkQueue,
}

impl Scene {
    pub fn new(config: TreeConfig, damage: Box<dyn DamageSink>, input: Box<dyn InputSink>) -> Self {
        Self {
            config,
            damage,
            input,
            resources: ResourceStore::new(),
            surfaces: Arena::new(),
            monitors: Arena::new(),
            workspaces: Arena::new(),
            windows: Arena::new(),
            layers: Arena::new(),
            locks: Arena::new(),
            subsurfaces: Arena::new(),
            popups: Arena::new(),
            window_order: Vec::new(),
            layer_order: Vec::new(),
            lock_order: Vec::new(),
            session_locked: false,
            cursor: CursorState::default(),
            work: WorkQueue::default(),
        }
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: TreeConfig) {
        self.config = config;
    }

    pub fn resources(&self) -> &ResourceStore {
        &self.resources
    }

    /// Direct access to the protocol model. Notifications raised through it are
    /// queued until the next [`Scene::dispatch_pending`].
    pub fn resources_mut(&mut self) -> &mut ResourceStore {
        &mut self.resources
    }

    /// Runs a batch of protocol requests, then dispatches what they raised.
    pub fn client_request<R>(&mut self, request: impl FnOnce(&mut ResourceStore) -> R) -> R {
        let result = request(&mut self.resources);
        self.dispatch_pending();
        result
    }

    pub fn has_pending_work(&self) -> bool {
        self.work.len() > 0
    }

    /// Handles queued notifications, including those raised while handling.
    /// Returns how many items were processed.
    pub fn dispatch_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Some(work) = self.work.pop() {
            handled += 1;
            self.handle_work(work);
        }
        handled
    }

    /// Sends one box to the damage sink. Empty boxes are dropped.
    pub(crate) fn push_damage(&mut self, rect: RectF) {
        if rect.is_empty() {
            return;
        }
        if self.config.log_damage {
            trace!("Damage box {:?}", rect);
        }
        self.damage.damage_box(rect);
    }

    fn handle_work(&mut self, work: Work) {
        trace!("Dispatching {:?}", work);
        match work {
            Work::SurfaceDestroyed(surface) => self.destroy_surface(surface),
            Work::ViewCommit(view) => self.on_view_commit(view),
            Work::Subsurface(node, event) => match event {
                NodeEvent::NewChild(resource) => self.on_new_subsurface(node, resource),
                NodeEvent::Commit => self.on_subsurface_commit(node),
                NodeEvent::Map => self.on_subsurface_map(node),
                NodeEvent::Unmap => self.on_subsurface_unmap(node),
                NodeEvent::Destroy => self.destroy_subsurface_node(node),
                NodeEvent::RepositionRequested | NodeEvent::Repositioned => {}
            },
            Work::Popup(node, event) => match event {
                NodeEvent::NewChild(resource) => self.on_new_popup(node, resource),
                NodeEvent::Commit => self.on_popup_commit(node, false),
                NodeEvent::Map => self.on_popup_map(node),
                NodeEvent::Unmap => self.on_popup_unmap(node),
                NodeEvent::Destroy => self.destroy_popup_node(node),
                NodeEvent::RepositionRequested => self.on_popup_reposition_requested(node),
                NodeEvent::Repositioned => self.on_popup_repositioned(node),
            },
        }
    }
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("config", &self.config)
            .field("surfaces", &self.surfaces.len())
            .field("windows", &self.windows.len())
            .field("layers", &self.layers.len())
            .field("locks", &self.locks.len())
            .field("subsurfaces", &self.subsurfaces.len())
            .field("popups", &self.popups.len())
            .field("session_locked", &self.session_locked)
            .field("pending_work", &self.work.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::recording_scene;

    #[test]
    fn test_client_request_dispatches_raised_work() {
        let (mut scene, _damage, _input) = recording_scene();
        let resource = scene.resources_mut().create_surface();
        let surface = scene.create_surface();
        scene.assign_surface(surface, resource);

        scene.resources_mut().destroy(resource).unwrap();
        assert!(scene.has_pending_work());
        assert_eq!(scene.dispatch_pending(), 1);
        assert!(!scene.surface(surface).unwrap().exists());
    }

    #[test]
    fn test_stale_work_is_skipped() {
        let (mut scene, damage, _input) = recording_scene();
        let resource = scene.resources_mut().create_surface();
        let surface = scene.create_surface();
        scene.assign_surface(surface, resource);

        scene.resources_mut().destroy(resource).unwrap();
        scene.remove_surface(surface);
        scene.dispatch_pending();
        assert!(damage.boxes().is_empty());
    }
}
