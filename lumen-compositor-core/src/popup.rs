//! Popup trees.
//!
//! Windows and layer surfaces each own a dummy popup root that listens for
//! new popups on the owner's resource. Real nodes mirror one popup resource,
//! own a sub-surface tree of their own, and are positioned relative to the
//! owner's anchor by summing placements up the chain.

use lumen_core::types::{PointF, RectF, SizeF};
use tracing::{debug, warn};

use crate::arena::Key;
use crate::layer::LayerId;
use crate::protocol::ResourceId;
use crate::region::Region;
use crate::scene::{NodeEvent, Scene, Work};
use crate::signal::Subscription;
use crate::subsurface::{SubsurfaceId, SubsurfaceOwner};
use crate::surface::SurfaceId;
use crate::view::{View, ViewId, ViewType};
use crate::window::WindowId;

pub type PopupId = Key<PopupNode>;

/// The view a popup tree hangs off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PopupOwner {
    Window(WindowId),
    Layer(LayerId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupLink {
    Root,
    Child {
        parent: PopupId,
        resource: ResourceId,
        surface: SurfaceId,
    },
}

#[derive(Debug)]
pub struct PopupNode {
    owner: PopupOwner,
    link: PopupLink,
    children: Vec<PopupId>,
    subsurface_root: Option<SubsurfaceId>,
    last_size: SizeF,
    /// Offset from the owner anchor at the last handled commit.
    last_position: PointF,
    mapped: bool,
    requested_reposition: bool,
    inert: bool,
    listeners: Vec<Subscription>,
}

impl PopupNode {
    fn new(owner: PopupOwner, link: PopupLink) -> Self {
        Self {
            owner,
            link,
            children: Vec::new(),
            subsurface_root: None,
            last_size: SizeF::zero(),
            last_position: PointF::zero(),
            mapped: false,
            requested_reposition: false,
            inert: false,
            listeners: Vec::new(),
        }
    }

    pub fn owner(&self) -> PopupOwner {
        self.owner
    }

    pub fn link(&self) -> PopupLink {
        self.link
    }

    pub fn is_root(&self) -> bool {
        self.link == PopupLink::Root
    }

    pub fn children(&self) -> &[PopupId] {
        &self.children
    }

    pub fn subsurface_root(&self) -> Option<SubsurfaceId> {
        self.subsurface_root
    }

    pub fn is_mapped(&self) -> bool {
        self.mapped
    }

    pub fn inert(&self) -> bool {
        self.inert
    }

    pub fn requested_reposition(&self) -> bool {
        self.requested_reposition
    }

    pub fn last_position(&self) -> PointF {
        self.last_position
    }

    /// Last committed size.
    pub fn size(&self) -> SizeF {
        self.last_size
    }

    /// Owner origin every popup position is measured from.
    pub fn anchor(&self, scene: &Scene) -> PointF {
        match self.owner {
            PopupOwner::Window(window) => scene
                .windows
                .get(window)
                .map_or(PointF::zero(), |w| w.real_position),
            PopupOwner::Layer(layer) => scene
                .layers
                .get(layer)
                .map_or(PointF::zero(), |l| l.geometry.origin),
        }
    }

    /// Offset of the surface origin from the anchor.
    pub fn coords_relative_to_parent(&self, scene: &Scene) -> PointF {
        let PopupLink::Child { resource, .. } = self.link else {
            return PointF::zero();
        };
        let Some(own) = scene.resources.get(resource) else {
            return self.last_position;
        };
        let mut offset = -own.current().geometry.map_or(PointF::zero(), |g| g.origin);

        let mut link = self.link;
        while let PopupLink::Child { parent, resource, .. } = link {
            if let Some(position) = scene.resources.get(resource).and_then(|r| r.position()) {
                offset = offset + position;
            }
            match scene.popups.get(parent) {
                Some(parent) => link = parent.link,
                None => break,
            }
        }
        offset
    }

    pub fn coords_global(&self, scene: &Scene) -> PointF {
        self.anchor(scene) + self.coords_relative_to_parent(scene)
    }

    /// Global origin of the window geometry; the anchor for roots.
    fn geometry_origin_global(&self, scene: &Scene) -> PointF {
        let PopupLink::Child { resource, .. } = self.link else {
            return self.anchor(scene);
        };
        let geometry = scene
            .resources
            .get(resource)
            .and_then(|r| r.current().geometry)
            .map_or(PointF::zero(), |g| g.origin);
        self.coords_global(scene) + geometry
    }
}

impl View for PopupNode {
    fn view_type(&self) -> ViewType {
        ViewType::Popup
    }

    fn surface(&self) -> Option<SurfaceId> {
        match self.link {
            PopupLink::Child { surface, .. } => Some(surface),
            PopupLink::Root => None,
        }
    }

    fn visible(&self, scene: &Scene) -> bool {
        if let PopupLink::Child { parent, .. } = self.link {
            if let Some(parent) = scene.popups.get(parent).filter(|p| !p.is_root()) {
                return parent.alive_and_visible(scene);
            }
        }
        owner_visible(scene, self.owner)
    }

    fn logical_box(&self, scene: &Scene) -> Option<RectF> {
        self.alive_and_visible(scene)
            .then(|| RectF::new(self.coords_global(scene), self.last_size))
    }
}

fn owner_visible(scene: &Scene, owner: PopupOwner) -> bool {
    match owner {
        PopupOwner::Window(window) => scene.windows.get(window).map_or(false, |w| w.is_drawn(scene)),
        PopupOwner::Layer(layer) => scene.layers.get(layer).map_or(false, |l| l.alive_and_visible(scene)),
    }
}

impl Scene {
    pub fn popup(&self, id: PopupId) -> Option<&PopupNode> {
        self.popups.get(id)
    }

    pub fn popup_resource(&self, id: PopupId) -> Option<ResourceId> {
        match self.popups.get(id)?.link {
            PopupLink::Child { resource, .. } => Some(resource).filter(|r| self.resources.contains(*r)),
            PopupLink::Root => None,
        }
    }

    pub fn popup_coords_global(&self, id: PopupId) -> Option<PointF> {
        self.popups.get(id).map(|node| node.coords_global(self))
    }

    /// Creates the dummy root for `owner`.
    ///
    /// # Panics
    ///
    /// If `owner` is a stale handle.
    pub(crate) fn create_popup_root(&mut self, owner: PopupOwner) -> PopupId {
        let surface = match owner {
            PopupOwner::Window(window) => self.windows.get(window).map(|w| w.surface_id()),
            PopupOwner::Layer(layer) => self.layers.get(layer).map(|l| l.surface_id()),
        };
        let surface = match surface {
            Some(surface) => surface,
            None => panic!("popup root requested for stale owner {:?}", owner),
        };
        let resource = self.surface(surface).and_then(|s| s.resource());

        let id = self.popups.insert(PopupNode::new(owner, PopupLink::Root));
        if let Some(res) = resource.and_then(|r| self.resources.get(r)) {
            let listener = self
                .work
                .forward(&res.events().new_popup, move |child| Work::Popup(id, NodeEvent::NewChild(*child)));
            if let Some(node) = self.popups.get_mut(id) {
                node.listeners.push(listener);
            }
        }
        debug!("Created popup root {:?} for {:?}", id, owner);
        id
    }

    pub(crate) fn on_new_popup(&mut self, parent: PopupId, resource: ResourceId) {
        let Some(owner) = self.popups.get(parent).filter(|p| !p.inert).map(|p| p.owner) else {
            return;
        };
        if self.resources.get(resource).map_or(true, |r| r.owner().is_some()) {
            return;
        }

        let surface = self.create_surface();
        let id = self.popups.insert(PopupNode::new(
            owner,
            PopupLink::Child {
                parent,
                resource,
                surface,
            },
        ));
        self.assign_surface_to_view(surface, resource, ViewId::Popup(id));

        let Some(res) = self.resources.get(resource) else {
            return;
        };
        let events = res.events();
        let listeners = vec![
            self.work
                .forward(&events.reposition_requested, move |_| Work::Popup(id, NodeEvent::RepositionRequested)),
            self.work
                .forward(&events.repositioned, move |_| Work::Popup(id, NodeEvent::Repositioned)),
            self.work.forward(&events.map, move |_| Work::Popup(id, NodeEvent::Map)),
            self.work.forward(&events.unmap, move |_| Work::Popup(id, NodeEvent::Unmap)),
            self.work.forward(&events.destroy, move |_| Work::Popup(id, NodeEvent::Destroy)),
            self.work.forward(&events.commit, move |_| Work::Popup(id, NodeEvent::Commit)),
            self.work
                .forward(&events.new_popup, move |child| Work::Popup(id, NodeEvent::NewChild(*child))),
        ];
        if let Some(node) = self.popups.get_mut(id) {
            node.listeners = listeners;
        }
        if let Some(parent) = self.popups.get_mut(parent) {
            parent.children.push(id);
        }

        let subsurface_root = self.create_subsurface_root(SubsurfaceOwner::Popup(id));
        if let Some(node) = self.popups.get_mut(id) {
            node.subsurface_root = Some(subsurface_root);
        }
        debug!("New popup {:?} under {:?} for {:?}", id, parent, resource);
    }

    pub(crate) fn on_popup_commit(&mut self, id: PopupId, ignore_siblings: bool) {
        let Some(node) = self.popups.get(id) else {
            return;
        };
        let PopupLink::Child { resource, surface, .. } = node.link else {
            return;
        };
        if node.inert {
            return;
        }
        let Some(res) = self.resources.get(resource) else {
            warn!("Popup {:?} committed without a resource, destroying", id);
            self.destroy_popup_node(id);
            return;
        };

        if res.initial_commit() {
            if let Err(e) = self.resources.schedule_configure(resource) {
                debug!("Cannot configure popup {:?}: {}", id, e);
            }
            return;
        }

        let size = res.current().size();
        let position = node.coords_relative_to_parent(self);
        if let PopupOwner::Window(window) = node.owner {
            if !self.windows.get(window).map_or(false, |w| w.is_drawn(self)) {
                if let Some(node) = self.popups.get_mut(id) {
                    node.last_size = size;
                    node.last_position = position;
                }
                return;
            }
        }
        if !node.mapped {
            return;
        }

        let coords = node.coords_global(self);
        let anchor = node.anchor(self);
        let (last_size, last_position, reposition, subsurface_root) =
            (node.last_size, node.last_position, node.requested_reposition, node.subsurface_root);

        if size != last_size || reposition || position != last_position {
            self.push_damage(RectF::new(anchor + last_position, last_size));
            if let Some(node) = self.popups.get_mut(id) {
                node.last_size = size;
                node.last_position = position;
            }
            self.push_damage(RectF::new(coords, size));
        }

        if !ignore_siblings {
            if let Some(root) = subsurface_root {
                self.recheck_damage_for_subsurfaces(root);
            }
        }

        self.damage_surface(surface, coords, 1.0);
        if let Some(node) = self.popups.get_mut(id) {
            node.requested_reposition = false;
        }
    }

    pub(crate) fn on_popup_map(&mut self, id: PopupId) {
        let Some(node) = self.popups.get(id) else {
            return;
        };
        let PopupLink::Child { resource, .. } = node.link else {
            return;
        };
        if node.mapped || node.inert {
            return;
        }
        let Some(size) = self.resources.get(resource).map(|r| r.current().size()) else {
            return;
        };
        let (coords, position, has_root) = (
            node.coords_global(self),
            node.coords_relative_to_parent(self),
            node.subsurface_root.is_some(),
        );

        if let Some(node) = self.popups.get_mut(id) {
            node.mapped = true;
            node.last_size = size;
            node.last_position = position;
        }
        self.push_damage(RectF::new(coords, size));
        self.input.refocus_pointer();

        if !has_root {
            let root = self.create_subsurface_root(SubsurfaceOwner::Popup(id));
            if let Some(node) = self.popups.get_mut(id) {
                node.subsurface_root = Some(root);
            }
        }

        let Some(monitor) = self.monitor_at(coords).and_then(|m| self.monitors.get(m)) else {
            return;
        };
        let (scale, transform) = (monitor.scale, monitor.transform);
        if let Err(e) = self.resources.send_preferred_scale(resource, scale, transform) {
            debug!("Skipping preferred scale for {:?}: {}", resource, e);
        }
        debug!("Mapped popup {:?} at {:?}", id, coords);
    }

    pub(crate) fn on_popup_unmap(&mut self, id: PopupId) {
        let Some(node) = self.popups.get(id) else {
            return;
        };
        let PopupLink::Child { resource, .. } = node.link else {
            return;
        };
        if !node.mapped || node.inert {
            return;
        }
        let Some(size) = self.resources.get(resource).map(|r| r.current().size()) else {
            warn!("Popup {:?} unmapped without a resource, destroying", id);
            self.destroy_popup_node(id);
            return;
        };
        let coords = node.coords_global(self);

        let subsurface_root = match self.popups.get_mut(id) {
            Some(node) => {
                node.mapped = false;
                node.last_size = size;
                node.subsurface_root.take()
            }
            None => None,
        };
        self.push_damage(RectF::new(coords, size));
        if let Some(root) = subsurface_root {
            self.free_subsurface_subtree(root);
        }
        self.input.refocus_pointer();

        self.popup_breadth_first(id, |scene, popup| {
            if popup == id {
                return;
            }
            let Some(node) = scene.popups.get(popup).filter(|n| !n.is_root()) else {
                return;
            };
            let area = RectF::new(node.coords_global(scene), node.size());
            scene.push_damage(area);
        });
        debug!("Unmapped popup {:?}", id);
    }

    pub(crate) fn destroy_popup_node(&mut self, id: PopupId) {
        let Some(node) = self.popups.get_mut(id) else {
            return;
        };
        let PopupLink::Child { parent, .. } = node.link else {
            return;
        };
        node.inert = true;
        node.listeners.clear();

        if let Some(parent) = self.popups.get_mut(parent) {
            parent.children.retain(|c| *c != id);
        }
        self.free_popup_subtree(id);
        debug!("Destroyed popup {:?}", id);
    }

    /// Frees `id`, its descendants and their sub-surface trees. The caller
    /// unlinks `id` from its parent.
    pub(crate) fn free_popup_subtree(&mut self, id: PopupId) {
        let Some(node) = self.popups.remove(id) else {
            return;
        };
        let PopupNode {
            link,
            children,
            subsurface_root,
            listeners,
            ..
        } = node;
        drop(listeners);
        for child in children {
            self.free_popup_subtree(child);
        }
        if let Some(root) = subsurface_root {
            self.free_subsurface_subtree(root);
        }
        if let PopupLink::Child { surface, .. } = link {
            self.remove_surface(surface);
        }
    }

    pub(crate) fn on_popup_reposition_requested(&mut self, id: PopupId) {
        let Some(node) = self.popups.get(id) else {
            return;
        };
        if node.inert || node.is_root() {
            return;
        }
        let position = node.coords_relative_to_parent(self);
        if let Some(node) = self.popups.get_mut(id) {
            node.requested_reposition = true;
            node.last_position = position;
        }
        self.unconstrain_popup(id);
    }

    /// Asks the protocol layer to fit the pending placement onto the monitor
    /// under the owner.
    fn unconstrain_popup(&mut self, id: PopupId) {
        let Some(node) = self.popups.get(id) else {
            return;
        };
        let PopupLink::Child { parent, resource, .. } = node.link else {
            return;
        };
        let anchor = node.anchor(self);
        let Some(monitor) = self.monitor_at(anchor).and_then(|m| self.monitors.get(m)) else {
            debug!("No monitor under popup {:?}, placement left unconstrained", id);
            return;
        };
        let parent_origin = self
            .popups
            .get(parent)
            .map_or(anchor, |p| p.geometry_origin_global(self));
        let bounds = monitor.logical_box().translated(&(-parent_origin));

        if let Err(e) = self.resources.apply_positioning(resource, bounds) {
            debug!("Cannot position popup {:?}: {}", id, e);
        }
    }

    pub(crate) fn on_popup_repositioned(&mut self, id: PopupId) {
        let Some(node) = self.popups.get(id) else {
            return;
        };
        let PopupLink::Child { resource, .. } = node.link else {
            return;
        };
        if node.inert {
            return;
        }
        let Some(size) = self.resources.get(resource).map(|r| r.current().size()) else {
            return;
        };
        let (coords, position, anchor) = (
            node.coords_global(self),
            node.coords_relative_to_parent(self),
            node.anchor(self),
        );
        let drawn = node.mapped && owner_visible(self, node.owner);
        let previous = RectF::new(anchor + node.last_position, node.last_size);

        if drawn {
            self.push_damage(previous);
            self.push_damage(RectF::new(coords, size));
        }
        if let Some(node) = self.popups.get_mut(id) {
            node.last_size = size;
            node.last_position = position;
            node.requested_reposition = false;
        }
    }

    /// Walks to the root of `id`'s tree and re-commits every popup in it.
    pub(crate) fn recheck_popup_tree(&mut self, id: PopupId) {
        let mut root = id;
        while let Some(PopupLink::Child { parent, .. }) = self.popups.get(root).map(|n| n.link) {
            if !self.popups.contains(parent) {
                break;
            }
            root = parent;
        }
        self.recheck_popup_children(root);
    }

    fn recheck_popup_children(&mut self, id: PopupId) {
        let children = self.popups.get(id).map(|n| n.children.clone()).unwrap_or_default();
        for child in children {
            if self.popups.get(child).map_or(true, |n| n.inert) {
                continue;
            }
            self.on_popup_commit(child, true);
            self.recheck_popup_children(child);
        }
    }

    /// Visits `root` and then its descendants level by level. The action may
    /// destroy any node; stale and inert nodes are skipped.
    pub fn popup_breadth_first<F>(&mut self, root: PopupId, mut action: F)
    where
        F: FnMut(&mut Scene, PopupId),
    {
        let mut level = vec![root];
        while !level.is_empty() {
            for id in &level {
                if self.popups.get(*id).map_or(false, |n| !n.inert) {
                    action(self, *id);
                }
            }
            let mut next = Vec::new();
            for id in level {
                if let Some(node) = self.popups.get(id).filter(|n| !n.inert) {
                    next.extend_from_slice(&node.children);
                }
            }
            level = next;
        }
    }

    /// Every live node under `root`, level by level, `root` first.
    pub fn popups_breadth_first(&self, root: PopupId) -> Vec<PopupId> {
        let mut order = Vec::new();
        let mut level = vec![root];
        while !level.is_empty() {
            let mut next = Vec::new();
            for id in level {
                let Some(node) = self.popups.get(id).filter(|n| !n.inert) else {
                    continue;
                };
                order.push(id);
                next.extend_from_slice(&node.children);
            }
            level = next;
        }
        order
    }

    /// Topmost mapped popup under `root` containing `point`.
    pub fn popup_at(&self, root: PopupId, point: PointF, allows_input: bool) -> Option<PopupId> {
        for id in self.popups_breadth_first(root).into_iter().rev() {
            let Some(node) = self.popups.get(id).filter(|n| n.mapped) else {
                continue;
            };
            let PopupLink::Child { resource, .. } = node.link else {
                continue;
            };
            let Some(current) = self.resources.get(resource).map(|r| r.current()) else {
                continue;
            };
            let coords = node.coords_global(self);

            let hit = if allows_input {
                let bounds = RectF::from_size(node.size());
                let mut region = current
                    .input_region
                    .clone()
                    .unwrap_or_else(|| Region::from_rect(bounds));
                region.intersect_rect(bounds).translate(coords);
                region.contains_point(&point)
            } else {
                let geometry = current
                    .geometry
                    .filter(|g| !g.is_empty())
                    .unwrap_or_else(|| RectF::from_size(node.size()));
                RectF::new(coords + geometry.origin, geometry.size).contains_point(&point)
            };
            if hit {
                return Some(id);
            }
        }
        None
    }
}
